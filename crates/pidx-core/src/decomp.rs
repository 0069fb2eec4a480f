use std::fmt;

use crate::dims::Dims3;

/// A global/local box pair that does not tile the requested process count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidDecomposition {
    pub global: Dims3,
    pub read_local: Dims3,
    pub read_grid: Dims3,
    pub read_procs: u32,
}

impl fmt::Display for InvalidDecomposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "INVALID test configuration g_box {} read l_box {} g_box/l_box != {}",
            self.global, self.read_local, self.read_grid
        )?;
        write!(f, "Try to change the patch size to get an integer value for g_box/l_box")
    }
}

impl std::error::Error for InvalidDecomposition {}

/// Local box the read executable is launched with.
///
/// Same process count on both sides reuses the write-side box; otherwise the
/// global box is cut by the candidate read grid (truncating).
pub fn read_local_box(
    global: Dims3,
    write_local: Dims3,
    write_procs: u32,
    read_procs: u32,
    read_grid: Dims3,
) -> Dims3 {
    if write_procs == read_procs {
        write_local
    } else {
        global.div_floor(read_grid).unwrap_or(Dims3::new(0, 0, 0))
    }
}

/// Check that `local` tiles `global` exactly into `procs` blocks.
pub fn blocks_match(global: Dims3, local: Dims3, procs: u32) -> bool {
    global
        .div_exact(local)
        .and_then(|blocks| blocks.volume())
        .is_some_and(|count| count == u64::from(procs))
}

/// Resolve and validate the read-side decomposition for one candidate grid.
pub fn check_read_decomposition(
    global: Dims3,
    write_local: Dims3,
    write_procs: u32,
    read_procs: u32,
    read_grid: Dims3,
) -> Result<Dims3, InvalidDecomposition> {
    let read_local = read_local_box(global, write_local, write_procs, read_procs, read_grid);

    if blocks_match(global, read_local, read_procs) {
        Ok(read_local)
    } else {
        Err(InvalidDecomposition {
            global,
            read_local,
            read_grid,
            read_procs,
        })
    }
}
