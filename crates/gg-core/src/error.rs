//! Error types for gganalyze

use std::path::PathBuf;

use thiserror::Error;

/// Broad class of an [`Error`], used by front-ends to pick an exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Bad configuration: bin specs, branch bindings, options.
    Config,
    /// Reference to something that was never declared.
    Lookup,
    /// Input data violating a structural expectation.
    Data,
    /// Operation on a manager that was already written out.
    State,
    /// The input store could not be opened.
    Input,
    /// The output store could not be created or written.
    Output,
    /// Any other I/O or serialization failure.
    Io,
}

/// gganalyze error type
///
/// Variants wrapping another error leave it out of their message; print the
/// chain (`{:#}` through `anyhow`, or [`std::error::Error::source`]) to see it.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error
    #[error("I/O error")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error")]
    Json(#[from] serde_json::Error),

    /// Input store could not be opened.
    #[error("cannot open input '{}'", path.display())]
    OpenInput {
        /// Path that failed to open.
        path: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },

    /// Output store could not be created or flushed.
    #[error("cannot write output '{}'", path.display())]
    OpenOutput {
        /// Path that failed to open.
        path: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },

    /// Input store (tree file or histogram file) is not valid JSON of the
    /// expected layout.
    #[error("cannot parse input '{}'", path.display())]
    ParseInput {
        /// Offending file.
        path: PathBuf,
        /// Parser diagnostic.
        source: serde_json::Error,
    },

    /// Configuration file (histograms, run configuration) is not valid JSON.
    #[error("cannot parse configuration '{}'", path.display())]
    ParseConfig {
        /// Offending file.
        path: PathBuf,
        /// Parser diagnostic.
        source: serde_json::Error,
    },

    /// Malformed histogram bin specification.
    #[error("invalid bin spec for histogram '{name}': {reason}")]
    InvalidBinSpec {
        /// Histogram name from the configuration.
        name: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Histogram declared twice.
    #[error("histogram '{0}' declared more than once")]
    DuplicateHistogram(String),

    /// Branch name not present in the tree.
    #[error("unknown branch '{0}'")]
    UnknownBranch(String),

    /// Branch exists but has the wrong shape or element type.
    #[error("branch '{branch}': expected {expected}, found {found}")]
    BranchType {
        /// Branch name.
        branch: String,
        /// What the binding asked for.
        expected: String,
        /// What the tree provides.
        found: String,
    },

    /// Generic validation failure.
    #[error("validation error: {0}")]
    Validation(String),

    /// Fill referencing an undeclared histogram.
    #[error("unknown histogram '{0}'")]
    UnknownHistogram(String),

    /// 1-D fill on a 2-D histogram or the other way around.
    #[error("histogram '{name}' is not {expected}")]
    HistogramDimension {
        /// Histogram name.
        name: String,
        /// Dimension the caller expected (`"1-D"` / `"2-D"`).
        expected: &'static str,
    },

    /// Direct bin fill outside `0..=n_bins + 1`.
    #[error("bin {bin} out of range for histogram '{name}' ({n_bins} bins)")]
    BinOutOfRange {
        /// Histogram name.
        name: String,
        /// Requested bin index.
        bin: usize,
        /// Number of regular bins.
        n_bins: usize,
    },

    /// Tree path not present in the input file.
    #[error("unknown tree '{0}'")]
    UnknownTree(String),

    /// Named auxiliary object not present in the input file.
    #[error("unknown object '{0}'")]
    UnknownObject(String),

    /// Sample name without a cross section.
    #[error("no cross section for sample '{0}'")]
    UnknownSample(String),

    /// Data-taking year without a luminosity.
    #[error("no luminosity for year '{0}'")]
    UnknownYear(String),

    /// Column length disagrees with the per-event object count.
    #[error("column '{column}' has {found} entries in event {event}, expected {expected}")]
    LengthMismatch {
        /// Column name.
        column: String,
        /// Event index.
        event: usize,
        /// Count from the object-count branch.
        expected: usize,
        /// Actual column length.
        found: usize,
    },

    /// Event index beyond the tree.
    #[error("event {event} out of range ({entries} entries)")]
    EventOutOfRange {
        /// Requested event.
        event: usize,
        /// Tree size.
        entries: usize,
    },

    /// Working point not supported by the requested discriminator.
    #[error("invalid working point: {0}")]
    InvalidWorkingPoint(String),

    /// Bit index beyond the width of a packed bit word.
    #[error("bit {bit} out of range for {field} ({width} bits)")]
    InvalidBit {
        /// Name of the packed field.
        field: &'static str,
        /// Requested bit.
        bit: u32,
        /// Width of the word.
        width: u32,
    },

    /// Two histograms with different axes combined.
    #[error("incompatible binning for histogram '{0}'")]
    IncompatibleBinning(String),

    /// Fill or write after the manager has been written out.
    #[error("histogram manager already written; '{0}' rejected")]
    Closed(String),
}

impl Error {
    /// Coarse classification of this error.
    pub fn class(&self) -> ErrorClass {
        match self {
            Error::Io(_) | Error::Json(_) => ErrorClass::Io,
            Error::OpenInput { .. } | Error::ParseInput { .. } => ErrorClass::Input,
            Error::OpenOutput { .. } => ErrorClass::Output,
            Error::ParseConfig { .. }
            | Error::InvalidBinSpec { .. }
            | Error::DuplicateHistogram(_)
            | Error::UnknownBranch(_)
            | Error::BranchType { .. }
            | Error::Validation(_) => ErrorClass::Config,
            Error::UnknownHistogram(_)
            | Error::HistogramDimension { .. }
            | Error::BinOutOfRange { .. }
            | Error::UnknownTree(_)
            | Error::UnknownObject(_)
            | Error::UnknownSample(_)
            | Error::UnknownYear(_) => ErrorClass::Lookup,
            Error::LengthMismatch { .. }
            | Error::EventOutOfRange { .. }
            | Error::InvalidWorkingPoint(_)
            | Error::InvalidBit { .. }
            | Error::IncompatibleBinning(_) => ErrorClass::Data,
            Error::Closed(_) => ErrorClass::State,
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classes() {
        assert_eq!(Error::UnknownHistogram("h".into()).class(), ErrorClass::Lookup);
        assert_eq!(Error::UnknownBranch("muPt".into()).class(), ErrorClass::Config);
        assert_eq!(Error::Closed("h".into()).class(), ErrorClass::State);
        let open = Error::OpenInput {
            path: "missing.json".into(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert_eq!(open.class(), ErrorClass::Input);
    }

    #[test]
    fn parse_failures_name_the_file() {
        let bad = || serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let cfg = Error::ParseConfig { path: "hists.json".into(), source: bad() };
        assert_eq!(cfg.class(), ErrorClass::Config);
        assert!(cfg.to_string().contains("hists.json"));
        let input = Error::ParseInput { path: "ntuple.json".into(), source: bad() };
        assert_eq!(input.class(), ErrorClass::Input);
        assert!(std::error::Error::source(&input).is_some());
    }

    #[test]
    fn wrapped_errors_appear_once_in_the_chain() {
        let e = Error::from(std::io::Error::other("disk full"));
        assert_eq!(e.to_string(), "I/O error");
        let source = std::error::Error::source(&e).map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("disk full"));
    }

    #[test]
    fn messages_name_the_key() {
        let e = Error::InvalidBinSpec { name: "mu_pt".into(), reason: "expected 3 or 6 numbers".into() };
        assert!(e.to_string().contains("'mu_pt'"));
        let e = Error::LengthMismatch { column: "muEta".into(), event: 4, expected: 2, found: 1 };
        assert!(e.to_string().contains("muEta"));
        assert!(e.to_string().contains("event 4"));
    }
}
