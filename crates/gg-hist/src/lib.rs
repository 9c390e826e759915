//! # gg-hist
//!
//! Histograms for gganalyze: fixed-width 1-D/2-D histograms with ROOT bin
//! numbering, a JSON histogram configuration, the [`HistManager`] registry
//! with its fill patterns (plain, 2-D, direct bin, cumulative), the output
//! store, and efficiency / scale-factor helpers.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod efficiency;
pub mod histogram;
pub mod manager;
pub mod output;

pub use config::{BinSpec, HistConfig};
pub use efficiency::{ScaleFactorMap, efficiency_map, turn_on_efficiency};
pub use histogram::{Axis, Hist1D, Hist2D, Histogram};
pub use manager::HistManager;
pub use output::{OutputFile, read_histograms};
