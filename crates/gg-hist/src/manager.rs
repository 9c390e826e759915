//! Name-keyed histogram registry with the fill patterns analyzers use.

use std::collections::BTreeMap;
use std::path::Path;

use gg_core::{Error, Result};

use crate::config::{BinSpec, HistConfig};
use crate::histogram::{Hist1D, Hist2D, Histogram};
use crate::output::OutputFile;

/// Histogram manager.
///
/// Every fill names a histogram that must have been declared, either from a
/// [`HistConfig`] or with [`HistManager::declare`]. [`HistManager::write`]
/// persists everything once; afterwards fills and writes fail with
/// [`Error::Closed`].
///
/// For parallel event loops, each worker fills a [`HistManager::shard`] and
/// the owner merges the shards back before writing.
#[derive(Debug)]
pub struct HistManager {
    output: Option<OutputFile>,
    hists: BTreeMap<String, Histogram>,
    closed: bool,
}

impl HistManager {
    /// Manager writing to `path`. The file is created immediately.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::with_output(Some(OutputFile::create(path)?)))
    }

    /// Manager writing to `path` with every histogram in `config` declared.
    pub fn from_config(path: impl AsRef<Path>, config: &HistConfig) -> Result<Self> {
        let mut m = Self::create(path)?;
        m.declare_all(config)?;
        Ok(m)
    }

    /// Manager without an output target (shards, tests).
    pub fn detached() -> Self {
        Self::with_output(None)
    }

    fn with_output(output: Option<OutputFile>) -> Self {
        Self { output, hists: BTreeMap::new(), closed: false }
    }

    /// Declare one histogram.
    pub fn declare(&mut self, name: impl Into<String>, spec: BinSpec) -> Result<()> {
        let name = name.into();
        self.ensure_open(&name)?;
        if self.hists.contains_key(&name) {
            return Err(Error::DuplicateHistogram(name));
        }
        let hist = spec.build(&name);
        self.hists.insert(name, hist);
        Ok(())
    }

    /// Declare every histogram in `config`.
    pub fn declare_all(&mut self, config: &HistConfig) -> Result<()> {
        for (name, spec) in config.iter() {
            self.declare(name, *spec)?;
        }
        tracing::debug!(declared = config.len(), total = self.hists.len(), "histograms declared");
        Ok(())
    }

    /// Whether `name` is declared.
    pub fn contains(&self, name: &str) -> bool {
        self.hists.contains_key(name)
    }

    /// Declared names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.hists.keys().map(String::as_str).collect()
    }

    /// Number of declared histograms.
    pub fn len(&self) -> usize {
        self.hists.len()
    }

    /// True when nothing is declared.
    pub fn is_empty(&self) -> bool {
        self.hists.is_empty()
    }

    /// Whether [`HistManager::write`] has run.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Look up a declared histogram.
    pub fn get(&self, name: &str) -> Result<&Histogram> {
        self.hists.get(name).ok_or_else(|| Error::UnknownHistogram(name.to_string()))
    }

    /// Look up a declared 1-D histogram.
    pub fn get_1d(&self, name: &str) -> Result<&Hist1D> {
        self.get(name)?.as_1d()
    }

    /// Look up a declared 2-D histogram.
    pub fn get_2d(&self, name: &str) -> Result<&Hist2D> {
        self.get(name)?.as_2d()
    }

    /// `Fill(name, value, weight)`.
    pub fn fill(&mut self, name: &str, value: f64, weight: f64) -> Result<()> {
        self.hist_1d_mut(name)?.fill(value, weight);
        Ok(())
    }

    /// `Fill2D(name, x, y, weight)`.
    pub fn fill_2d(&mut self, name: &str, x: f64, y: f64, weight: f64) -> Result<()> {
        self.ensure_open(name)?;
        let hist = self.hists.get_mut(name).ok_or_else(|| Error::UnknownHistogram(name.into()))?;
        hist.as_2d_mut()?.fill(x, y, weight);
        Ok(())
    }

    /// `FillBin(name, bin, weight)` with ROOT bin numbering.
    pub fn fill_bin(&mut self, name: &str, bin: usize, weight: f64) -> Result<()> {
        self.hist_1d_mut(name)?.fill_bin(bin, weight)
    }

    /// `FillCumulative(name, value, weight)`: turn-on style fill of every bin
    /// up to and including the one containing `value`.
    pub fn fill_cumulative(&mut self, name: &str, value: f64, weight: f64) -> Result<()> {
        self.hist_1d_mut(name)?.fill_cumulative(value, weight);
        Ok(())
    }

    /// Turn-on fill counting the bins whose lower edge `value` strictly
    /// exceeds.
    pub fn fill_thresholds(&mut self, name: &str, value: f64, weight: f64) -> Result<()> {
        self.hist_1d_mut(name)?.fill_thresholds(value, weight);
        Ok(())
    }

    /// Register an already-built histogram (e.g. a derived efficiency).
    pub fn insert(&mut self, hist: Histogram) -> Result<()> {
        let name = hist.name().to_string();
        self.ensure_open(&name)?;
        if self.hists.contains_key(&name) {
            return Err(Error::DuplicateHistogram(name));
        }
        self.hists.insert(name, hist);
        Ok(())
    }

    /// Empty, detached copy with the same declarations.
    pub fn shard(&self) -> Self {
        let hists = self.hists.iter().map(|(k, h)| (k.clone(), h.zeroed())).collect();
        Self { output: None, hists, closed: false }
    }

    /// Add a shard's contents into this manager. Either every histogram of
    /// the shard is added or, on error, none is.
    pub fn merge(&mut self, shard: HistManager) -> Result<()> {
        self.ensure_open("merge")?;
        for (name, hist) in &shard.hists {
            let mine = self.get(name)?;
            if !mine.same_binning(hist) {
                return Err(Error::IncompatibleBinning(name.clone()));
            }
        }
        for (name, hist) in shard.hists {
            let mine = self.hists.get_mut(&name).ok_or(Error::UnknownHistogram(name))?;
            mine.add(&hist)?;
        }
        Ok(())
    }

    /// Persist every histogram and close the output. Runs at most once; the
    /// manager only counts as closed once the file has been written.
    pub fn write(&mut self) -> Result<()> {
        self.ensure_open("write")?;
        let Some(out) = self.output.as_mut() else {
            return Err(Error::Validation("histogram manager has no output target".into()));
        };
        out.write_objects(self.hists.iter().map(|(name, hist)| (name.as_str(), hist)))?;
        let Some(out) = self.output.take() else {
            return Err(Error::Validation("histogram manager has no output target".into()));
        };
        let path = out.path().display().to_string();
        out.close()?;
        self.closed = true;
        tracing::info!(path = %path, histograms = self.hists.len(), "histograms written");
        Ok(())
    }

    fn ensure_open(&self, what: &str) -> Result<()> {
        if self.closed {
            return Err(Error::Closed(what.to_string()));
        }
        Ok(())
    }

    fn hist_1d_mut(&mut self, name: &str) -> Result<&mut Hist1D> {
        self.ensure_open(name)?;
        self.hists
            .get_mut(name)
            .ok_or_else(|| Error::UnknownHistogram(name.to_string()))?
            .as_1d_mut()
    }
}
