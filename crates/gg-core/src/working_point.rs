//! Working points and packed bit words.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Threshold tier of an identification or isolation discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkingPoint {
    /// Very loose.
    VLoose,
    /// Loose.
    Loose,
    /// Medium.
    Medium,
    /// Tight.
    Tight,
    /// Very tight.
    VTight,
}

impl WorkingPoint {
    /// All working points, loosest first.
    pub const ALL: [WorkingPoint; 5] = [
        WorkingPoint::VLoose,
        WorkingPoint::Loose,
        WorkingPoint::Medium,
        WorkingPoint::Tight,
        WorkingPoint::VTight,
    ];

    /// Short lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            WorkingPoint::VLoose => "vloose",
            WorkingPoint::Loose => "loose",
            WorkingPoint::Medium => "medium",
            WorkingPoint::Tight => "tight",
            WorkingPoint::VTight => "vtight",
        }
    }
}

impl fmt::Display for WorkingPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkingPoint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "vloose" => Ok(WorkingPoint::VLoose),
            "loose" => Ok(WorkingPoint::Loose),
            "medium" => Ok(WorkingPoint::Medium),
            "tight" => Ok(WorkingPoint::Tight),
            "vtight" => Ok(WorkingPoint::VTight),
            other => Err(Error::InvalidWorkingPoint(format!("unknown working point '{other}'"))),
        }
    }
}

/// Five boolean flags, one per [`WorkingPoint`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkingPointFlags {
    /// Very loose.
    pub vloose: bool,
    /// Loose.
    pub loose: bool,
    /// Medium.
    pub medium: bool,
    /// Tight.
    pub tight: bool,
    /// Very tight.
    pub vtight: bool,
}

impl WorkingPointFlags {
    /// Flag for `wp`.
    pub fn get(&self, wp: WorkingPoint) -> bool {
        match wp {
            WorkingPoint::VLoose => self.vloose,
            WorkingPoint::Loose => self.loose,
            WorkingPoint::Medium => self.medium,
            WorkingPoint::Tight => self.tight,
            WorkingPoint::VTight => self.vtight,
        }
    }
}

/// Flags for a discriminator that only exists in loose and tight flavours.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LooseTightFlags {
    /// Loose.
    pub loose: bool,
    /// Tight.
    pub tight: bool,
}

impl LooseTightFlags {
    /// Flag for `wp`; other working points are rejected.
    pub fn get(&self, wp: WorkingPoint, what: &str) -> Result<bool> {
        match wp {
            WorkingPoint::Loose => Ok(self.loose),
            WorkingPoint::Tight => Ok(self.tight),
            other => Err(Error::InvalidWorkingPoint(format!(
                "{what} has no '{other}' working point (loose, tight)"
            ))),
        }
    }
}

/// Test bit `bit` of a packed `u64` word.
pub fn test_bit_u64(word: u64, bit: u32, field: &'static str) -> Result<bool> {
    if bit >= u64::BITS {
        return Err(Error::InvalidBit { field, bit, width: u64::BITS });
    }
    Ok((word >> bit) & 1 == 1)
}

/// Test bit `bit` of a packed `i32` word.
pub fn test_bit_i32(word: i32, bit: u32, field: &'static str) -> Result<bool> {
    if bit >= i32::BITS {
        return Err(Error::InvalidBit { field, bit, width: i32::BITS });
    }
    Ok((word >> bit) & 1 == 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_working_points() {
        assert_eq!("Tight".parse::<WorkingPoint>().unwrap(), WorkingPoint::Tight);
        assert_eq!("vloose".parse::<WorkingPoint>().unwrap(), WorkingPoint::VLoose);
        let err = "ultra".parse::<WorkingPoint>().unwrap_err();
        assert!(matches!(err, Error::InvalidWorkingPoint(_)));
    }

    #[test]
    fn loose_tight_rejects_medium() {
        let f = LooseTightFlags { loose: true, tight: false };
        assert!(f.get(WorkingPoint::Loose, "anti-muon").unwrap());
        assert!(!f.get(WorkingPoint::Tight, "anti-muon").unwrap());
        assert!(matches!(
            f.get(WorkingPoint::Medium, "anti-muon"),
            Err(Error::InvalidWorkingPoint(_))
        ));
    }

    #[test]
    fn bits() {
        assert!(test_bit_u64(1 << 40, 40, "HLTJet").unwrap());
        assert!(!test_bit_u64(1 << 40, 39, "HLTJet").unwrap());
        assert!(matches!(test_bit_u64(0, 64, "HLTJet"), Err(Error::InvalidBit { bit: 64, .. })));
        assert!(test_bit_i32(0b100, 2, "muIDbit").unwrap());
        assert!(test_bit_i32(-1, 31, "muIDbit").unwrap());
        assert!(test_bit_i32(0, 32, "muIDbit").is_err());
    }
}
