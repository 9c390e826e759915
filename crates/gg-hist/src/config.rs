//! Histogram declarations loaded from JSON.
//!
//! The document maps each histogram name to an array of 3 numbers
//! `[n, lo, hi]` (1-D) or 6 numbers `[nx, lox, hix, ny, loy, hiy]` (2-D):
//!
//! ```json
//! { "mu_pt": [50, 0, 500], "sf_map": [20, 0, 200, 20, 200, 1200] }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde_json::Value as Json;

use gg_core::{Error, Result};

use crate::histogram::{Axis, Hist1D, Hist2D, Histogram};

/// Binning of one declared histogram.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinSpec {
    /// `[n, lo, hi]`.
    OneD(Axis),
    /// `[nx, lox, hix, ny, loy, hiy]`.
    TwoD(Axis, Axis),
}

impl BinSpec {
    /// 1-D spec.
    pub fn one_d(name: &str, n: usize, lo: f64, hi: f64) -> Result<Self> {
        Ok(BinSpec::OneD(axis(name, n, lo, hi)?))
    }

    /// 2-D spec.
    pub fn two_d(
        name: &str,
        (nx, lox, hix): (usize, f64, f64),
        (ny, loy, hiy): (usize, f64, f64),
    ) -> Result<Self> {
        Ok(BinSpec::TwoD(axis(name, nx, lox, hix)?, axis(name, ny, loy, hiy)?))
    }

    /// Parse the JSON array for histogram `name`.
    pub fn from_json(name: &str, value: &Json) -> Result<Self> {
        let bad = |reason: String| Error::InvalidBinSpec { name: name.to_string(), reason };
        let Some(items) = value.as_array() else {
            return Err(bad(format!("expected an array of 3 or 6 numbers, found {value}")));
        };
        let nums = items
            .iter()
            .map(|v| v.as_f64().ok_or_else(|| bad(format!("non-numeric entry {v}"))))
            .collect::<Result<Vec<f64>>>()?;
        match nums.as_slice() {
            &[n, lo, hi] => Self::one_d(name, bin_count(name, n)?, lo, hi),
            &[nx, lox, hix, ny, loy, hiy] => Self::two_d(
                name,
                (bin_count(name, nx)?, lox, hix),
                (bin_count(name, ny)?, loy, hiy),
            ),
            other => Err(bad(format!("expected 3 or 6 numbers, found {}", other.len()))),
        }
    }

    /// Empty histogram with this binning.
    pub fn build(&self, name: &str) -> Histogram {
        match *self {
            BinSpec::OneD(a) => Histogram::OneD(Hist1D::new(name, a)),
            BinSpec::TwoD(x, y) => Histogram::TwoD(Hist2D::new(name, x, y)),
        }
    }
}

fn bin_count(name: &str, n: f64) -> Result<usize> {
    if n.fract() != 0.0 || n < 1.0 || n > u32::MAX as f64 {
        return Err(Error::InvalidBinSpec {
            name: name.to_string(),
            reason: format!("bin count must be a positive integer, found {n}"),
        });
    }
    Ok(n as usize)
}

fn axis(name: &str, n: usize, lo: f64, hi: f64) -> Result<Axis> {
    Axis::new(n, lo, hi).map_err(|e| Error::InvalidBinSpec {
        name: name.to_string(),
        reason: match e {
            Error::Validation(msg) => msg,
            other => other.to_string(),
        },
    })
}

/// Parsed histogram configuration, ordered by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistConfig {
    specs: BTreeMap<String, BinSpec>,
}

impl HistConfig {
    /// Empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|source| Error::OpenInput { path: path.to_path_buf(), source })?;
        let doc: Json = serde_json::from_str(&text)
            .map_err(|source| Error::ParseConfig { path: path.to_path_buf(), source })?;
        let cfg = Self::from_document(&doc)?;
        tracing::debug!(path = %path.display(), histograms = cfg.len(), "histogram config loaded");
        Ok(cfg)
    }

    /// Parse from a JSON string.
    pub fn from_json_str(text: &str) -> Result<Self> {
        Self::from_document(&serde_json::from_str(text)?)
    }

    fn from_document(doc: &Json) -> Result<Self> {
        let Some(obj) = doc.as_object() else {
            return Err(Error::Validation(
                "histogram config must be a JSON object of name -> bin spec".into(),
            ));
        };
        let mut specs = BTreeMap::new();
        for (name, value) in obj {
            specs.insert(name.clone(), BinSpec::from_json(name, value)?);
        }
        Ok(Self { specs })
    }

    /// Add a declaration; a name may appear once.
    pub fn insert(&mut self, name: impl Into<String>, spec: BinSpec) -> Result<()> {
        let name = name.into();
        if self.specs.contains_key(&name) {
            return Err(Error::DuplicateHistogram(name));
        }
        self.specs.insert(name, spec);
        Ok(())
    }

    /// Spec for `name`.
    pub fn get(&self, name: &str) -> Option<&BinSpec> {
        self.specs.get(name)
    }

    /// Iterate declarations in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BinSpec)> {
        self.specs.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of declarations.
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    /// True when nothing is declared.
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}
