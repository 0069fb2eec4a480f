use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::HarnessError;

/// A 3D extent: global box, per-process box, restructuring box or process grid.
///
/// Text form is `XxYxZ`, the same form the PIDX executables take on `-g`/`-l`/`-r`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Dims3 {
    pub x: u64,
    pub y: u64,
    pub z: u64,
}

impl Dims3 {
    pub const fn new(x: u64, y: u64, z: u64) -> Self {
        Self { x, y, z }
    }

    /// Number of elements covered by the extent, `None` on overflow.
    pub fn volume(&self) -> Option<u64> {
        self.x.checked_mul(self.y)?.checked_mul(self.z)
    }

    /// Component-wise product (e.g. grid * patch size), `None` on overflow.
    pub fn mul(&self, other: Dims3) -> Option<Dims3> {
        Some(Dims3::new(
            self.x.checked_mul(other.x)?,
            self.y.checked_mul(other.y)?,
            self.z.checked_mul(other.z)?,
        ))
    }

    /// Component-wise scale by a scalar, `None` on overflow.
    pub fn scale(&self, factor: u64) -> Option<Dims3> {
        self.mul(Dims3::new(factor, factor, factor))
    }

    /// Component-wise truncating division. Returns `None` if any divisor is zero.
    pub fn div_floor(&self, other: Dims3) -> Option<Dims3> {
        if other.x == 0 || other.y == 0 || other.z == 0 {
            return None;
        }
        Some(Dims3::new(self.x / other.x, self.y / other.y, self.z / other.z))
    }

    /// True if every component of `self` is an exact multiple of `other`.
    pub fn divides_evenly(&self, other: Dims3) -> bool {
        other.x != 0
            && other.y != 0
            && other.z != 0
            && self.x % other.x == 0
            && self.y % other.y == 0
            && self.z % other.z == 0
    }

    /// Exact component-wise division.
    pub fn div_exact(&self, other: Dims3) -> Option<Dims3> {
        if self.divides_evenly(other) {
            self.div_floor(other)
        } else {
            None
        }
    }
}

impl fmt::Display for Dims3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.x, self.y, self.z)
    }
}

impl FromStr for Dims3 {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || HarnessError::InvalidExtent(s.to_string());

        let parts: Vec<&str> = s.trim().split('x').collect();
        if parts.len() != 3 {
            return Err(invalid());
        }

        let mut vals = [0u64; 3];
        for (slot, part) in vals.iter_mut().zip(&parts) {
            *slot = part.trim().parse::<u64>().map_err(|_| invalid())?;
            if *slot == 0 {
                return Err(invalid());
            }
        }

        Ok(Dims3::new(vals[0], vals[1], vals[2]))
    }
}

impl TryFrom<String> for Dims3 {
    type Error = HarnessError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Dims3> for String {
    fn from(d: Dims3) -> Self {
        d.to_string()
    }
}

impl From<(u64, u64, u64)> for Dims3 {
    fn from((x, y, z): (u64, u64, u64)) -> Self {
        Dims3::new(x, y, z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let d: Dims3 = "12x24x36".parse().unwrap();
        assert_eq!(d, Dims3::new(12, 24, 36));
        assert_eq!(d.to_string(), "12x24x36");
        assert_eq!(d.volume(), Some(12 * 24 * 36));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!("12x12".parse::<Dims3>().is_err());
        assert!("12x12x12x12".parse::<Dims3>().is_err());
        assert!("12x0x12".parse::<Dims3>().is_err());
        assert!("ax2x3".parse::<Dims3>().is_err());
        assert!("".parse::<Dims3>().is_err());
    }

    #[test]
    fn test_division() {
        let g = Dims3::new(124, 48, 36);
        let p = Dims3::new(2, 2, 2);
        assert_eq!(g.div_floor(p), Some(Dims3::new(62, 24, 18)));
        assert!(g.divides_evenly(p));

        // 124 / 8 truncates like the executables' own arithmetic
        assert_eq!(g.div_floor(Dims3::new(8, 1, 1)), Some(Dims3::new(15, 48, 36)));
        assert!(!g.divides_evenly(Dims3::new(8, 1, 1)));
        assert_eq!(g.div_exact(Dims3::new(8, 1, 1)), None);

        assert_eq!(g.div_floor(Dims3::new(0, 1, 1)), None);
        assert!(!g.divides_evenly(Dims3::new(0, 1, 1)));
    }

    #[test]
    fn test_products_overflow_to_none() {
        let big = Dims3::new(3_000_000, 3_000_000, 3_000_000);
        assert_eq!(big.volume(), None);
        let doubled = Dims3::new(6_000_000, 6_000_000, 6_000_000);
        assert_eq!(big.mul(Dims3::new(2, 2, 2)), Some(doubled));
        assert_eq!(Dims3::new(u64::MAX, 1, 1).mul(Dims3::new(2, 1, 1)), None);
        assert_eq!(Dims3::new(u64::MAX / 2 + 1, 1, 1).scale(2), None);
        assert_eq!(Dims3::new(62, 24, 18).scale(2), Some(Dims3::new(124, 48, 36)));
    }

    #[test]
    fn test_serde_as_string() {
        let d = Dims3::new(4, 2, 1);
        let json = serde_json::to_string(&d).unwrap();
        assert_eq!(json, "\"4x2x1\"");
        let back: Dims3 = serde_json::from_str(&json).unwrap();
        assert_eq!(back, d);
        assert!(serde_json::from_str::<Dims3>("\"4x2\"").is_err());
    }
}
