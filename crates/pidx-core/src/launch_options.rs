use std::collections::BTreeMap;

/// Prefix that routes an option to the process launcher (`--mpirun.hostfile=...`).
pub const LAUNCHER_PREFIX: &str = "mpirun";

/// Value of a pass-through launcher option.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    /// `--mpirun.oversubscribe`
    Flag,
    /// `--mpirun.hostfile=hosts` or `--mpirun.hostfile hosts`
    Str(String),
}

impl OptionValue {
    pub fn is_flag(&self) -> bool {
        matches!(self, OptionValue::Flag)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            OptionValue::Str(s) => Some(s),
            OptionValue::Flag => None,
        }
    }
}

/// Launcher options pulled off the harness command line, keyed without the prefix.
#[derive(Debug, Clone, Default)]
pub struct LaunchOptions {
    opts: BTreeMap<String, OptionValue>,
}

impl LaunchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: OptionValue) {
        self.opts.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.opts.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.opts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.opts.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Arguments for the launcher program, in key order.
    ///
    /// One-letter keys become short options (`--mpirun.H=a,b` → `-H a,b`),
    /// longer keys become long options (`--mpirun.bind-to core` → `--bind-to core`).
    pub fn launcher_args(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(self.opts.len() * 2);
        for (key, value) in self.iter() {
            let dashes = if key.chars().count() == 1 { "-" } else { "--" };
            args.push(format!("{dashes}{key}"));
            if let Some(v) = value.as_str() {
                args.push(v.to_string());
            }
        }
        args
    }
}

/// Split `--mpirun.KEY[=VALUE]` into `(KEY, VALUE)`. `None` for anything else.
fn split_launch_option(arg: &str) -> Option<(&str, Option<&str>)> {
    let rest = arg.strip_prefix("--")?.strip_prefix(LAUNCHER_PREFIX)?.strip_prefix('.')?;
    let (key, value) = match rest.split_once('=') {
        Some((k, v)) => (k, Some(v)),
        None => (rest, None),
    };
    let valid_key = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-');
    valid_key.then_some((key, value))
}

/// Remove launcher options from `args`, returning the rest for clap.
///
/// A bare `--mpirun.KEY` takes the next argument as its value unless that
/// argument starts with `-` or is missing, in which case it is a flag.
pub fn extract_launch_options(args: Vec<String>) -> (Vec<String>, LaunchOptions) {
    let mut rest = Vec::with_capacity(args.len());
    let mut opts = LaunchOptions::new();
    let mut iter = args.into_iter().peekable();

    while let Some(arg) = iter.next() {
        let Some((key, inline)) = split_launch_option(&arg) else {
            rest.push(arg);
            continue;
        };

        let value = match inline {
            Some(v) => OptionValue::Str(v.to_string()),
            None => match iter.next_if(|next| !next.starts_with('-')) {
                Some(next) => OptionValue::Str(next),
                None => OptionValue::Flag,
            },
        };
        opts.insert(key, value);
    }

    (rest, opts)
}
