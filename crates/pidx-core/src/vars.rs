use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::HarnessError;

/// Variable type in PIDX notation: `<components>*<scalar>`, e.g. `3*float64`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VarType {
    pub components: u32,
    pub scalar: String,
}

impl VarType {
    /// Samples read back per element of the global box.
    pub fn samples_per_element(&self) -> u64 {
        self.components as u64
    }

    /// 8- and 16-wide types blow up memory on anything but small domains.
    pub fn is_small_domain_only(&self) -> bool {
        let text = self.to_string();
        text.contains('8') || text.contains("16")
    }
}

impl fmt::Display for VarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}*{}", self.components, self.scalar)
    }
}

impl FromStr for VarType {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || HarnessError::InvalidVarType(s.to_string());

        let (count, scalar) = s.trim().split_once('*').ok_or_else(invalid)?;
        let components = count.trim().parse::<u32>().map_err(|_| invalid())?;
        let scalar = scalar.trim();
        if components == 0 || scalar.is_empty() || scalar.contains(char::is_whitespace) {
            return Err(invalid());
        }

        Ok(VarType {
            components,
            scalar: scalar.to_string(),
        })
    }
}

impl TryFrom<String> for VarType {
    type Error = HarnessError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<VarType> for String {
    fn from(v: VarType) -> Self {
        v.to_string()
    }
}

/// Render a VARS description: even variables take `even`, odd ones `odd`.
pub fn render_vars(n_vars: u32, even: &VarType, odd: &VarType) -> String {
    let mut out = String::from("(fields)\n");
    for i in 0..n_vars {
        let ty = if i % 2 == 0 { even } else { odd };
        out.push_str(&format!("var_{} {} +\n", i, ty));
    }
    out.push_str("(end)");
    out
}

/// Write the VARS file consumed by the write executable's `-v` option.
pub fn write_vars_file(
    path: &Path,
    n_vars: u32,
    even: &VarType,
    odd: &VarType,
) -> Result<(), HarnessError> {
    fs::write(path, render_vars(n_vars, even, odd)).map_err(|e| HarnessError::file(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_var_type() {
        let v: VarType = "3*float64".parse().unwrap();
        assert_eq!(v.components, 3);
        assert_eq!(v.scalar, "float64");
        assert_eq!(v.samples_per_element(), 3);
        assert_eq!(v.to_string(), "3*float64");

        assert!("float32".parse::<VarType>().is_err());
        assert!("0*float32".parse::<VarType>().is_err());
        assert!("x*float32".parse::<VarType>().is_err());
        assert!("1*".parse::<VarType>().is_err());
    }

    #[test]
    fn test_small_domain_warning() {
        assert!(!"1*float32".parse::<VarType>().unwrap().is_small_domain_only());
        assert!(!"3*float64".parse::<VarType>().unwrap().is_small_domain_only());
        assert!("1*int8".parse::<VarType>().unwrap().is_small_domain_only());
        assert!("16*float32".parse::<VarType>().unwrap().is_small_domain_only());
        assert!("8*int32".parse::<VarType>().unwrap().is_small_domain_only());
    }

    #[test]
    fn test_render_alternating() {
        let a: VarType = "1*float32".parse().unwrap();
        let b: VarType = "1*int32".parse().unwrap();
        assert_eq!(
            render_vars(3, &a, &b),
            "(fields)\nvar_0 1*float32 +\nvar_1 1*int32 +\nvar_2 1*float32 +\n(end)"
        );
        assert_eq!(render_vars(0, &a, &b), "(fields)\n(end)");
    }

    #[test]
    fn test_write_vars_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("VARS");
        let a: VarType = "2*float32".parse().unwrap();
        write_vars_file(&path, 1, &a, &a).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text, "(fields)\nvar_0 2*float32 +\n(end)");
    }
}
