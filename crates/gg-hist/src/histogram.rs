//! Fixed-width 1-D and 2-D histograms with ROOT bin numbering.
//!
//! Bin 0 is the underflow, bins `1..=n` are the regular bins and bin `n + 1`
//! is the overflow. Contents and sum of squared weights are stored for every
//! bin including the flows.

use serde::{Deserialize, Serialize};

use gg_core::{Error, Result};

/// A uniform axis: `n_bins` bins of equal width over `[min, max)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Axis {
    /// Number of regular bins.
    pub n_bins: usize,
    /// Lower edge of bin 1.
    pub min: f64,
    /// Upper edge of bin `n_bins`.
    pub max: f64,
}

impl Axis {
    /// Build an axis; requires `n_bins > 0` and `min < max`.
    pub fn new(n_bins: usize, min: f64, max: f64) -> Result<Self> {
        if n_bins == 0 {
            return Err(Error::Validation("axis needs at least one bin".into()));
        }
        if !(min.is_finite() && max.is_finite()) || min >= max {
            return Err(Error::Validation(format!("axis range [{min}, {max}) is empty")));
        }
        Ok(Self { n_bins, min, max })
    }

    /// Bin width.
    pub fn width(&self) -> f64 {
        (self.max - self.min) / self.n_bins as f64
    }

    /// ROOT bin index for `x`. NaN lands in the underflow.
    #[inline]
    pub fn find_bin(&self, x: f64) -> usize {
        if !(x >= self.min) {
            return 0;
        }
        if x >= self.max {
            return self.n_bins + 1;
        }
        let idx = ((x - self.min) / self.width()) as usize;
        // Rounding near the upper edge can push idx to n_bins.
        idx.min(self.n_bins - 1) + 1
    }

    /// Lower edge of ROOT bin `bin` (bin `n_bins + 1` gives `max`).
    pub fn low_edge(&self, bin: usize) -> f64 {
        self.min + (bin as f64 - 1.0) * self.width()
    }

    /// Centre of ROOT bin `bin`.
    pub fn center(&self, bin: usize) -> f64 {
        self.low_edge(bin) + 0.5 * self.width()
    }

    /// Regular bin edges, length `n_bins + 1`.
    pub fn edges(&self) -> Vec<f64> {
        (1..=self.n_bins + 1).map(|b| self.low_edge(b)).collect()
    }

    /// Total number of stored bins including flows.
    fn n_stored(&self) -> usize {
        self.n_bins + 2
    }
}

/// A 1-D histogram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hist1D {
    /// Histogram name.
    pub name: String,
    /// X axis.
    pub axis: Axis,
    /// Bin contents, length `n_bins + 2` (ROOT numbering).
    pub contents: Vec<f64>,
    /// Sum of squared weights, same layout as `contents`.
    pub sumw2: Vec<f64>,
    /// Number of fill calls.
    pub entries: u64,
}

impl Hist1D {
    /// Empty histogram.
    pub fn new(name: impl Into<String>, axis: Axis) -> Self {
        let n = axis.n_stored();
        Self { name: name.into(), axis, contents: vec![0.0; n], sumw2: vec![0.0; n], entries: 0 }
    }

    /// Add `weight` to the bin containing `x`.
    pub fn fill(&mut self, x: f64, weight: f64) {
        let bin = self.axis.find_bin(x);
        self.add_to_bin(bin, weight);
        self.entries += 1;
    }

    /// Add `weight` to ROOT bin `bin` directly.
    pub fn fill_bin(&mut self, bin: usize, weight: f64) -> Result<()> {
        if bin >= self.axis.n_stored() {
            return Err(Error::BinOutOfRange {
                name: self.name.clone(),
                bin,
                n_bins: self.axis.n_bins,
            });
        }
        self.add_to_bin(bin, weight);
        self.entries += 1;
        Ok(())
    }

    /// Add `weight` to every regular bin from bin 1 up to and including the
    /// bin containing `x`.
    ///
    /// An underflow value only touches the underflow bin; an overflow value
    /// adds to every regular bin and the overflow bin.
    pub fn fill_cumulative(&mut self, x: f64, weight: f64) {
        let bin = self.axis.find_bin(x);
        if bin == 0 {
            self.add_to_bin(0, weight);
        } else {
            for b in 1..=bin {
                self.add_to_bin(b, weight);
            }
        }
        self.entries += 1;
    }

    /// Turn-on fill: add `weight` to every regular bin whose lower edge is a
    /// threshold `x` strictly passes. Flow bins are never touched.
    pub fn fill_thresholds(&mut self, x: f64, weight: f64) {
        let bin = self.axis.find_bin(x);
        let last = match bin {
            0 => 0,
            b if b > self.axis.n_bins => self.axis.n_bins,
            b if x <= self.axis.low_edge(b) => b - 1,
            b => b,
        };
        for b in 1..=last {
            self.add_to_bin(b, weight);
        }
        self.entries += 1;
    }

    /// Content of ROOT bin `bin` (0 for indices past the overflow).
    pub fn bin_content(&self, bin: usize) -> f64 {
        self.contents.get(bin).copied().unwrap_or(0.0)
    }

    /// Statistical error of ROOT bin `bin`.
    pub fn bin_error(&self, bin: usize) -> f64 {
        self.sumw2.get(bin).copied().unwrap_or(0.0).sqrt()
    }

    /// Underflow content.
    pub fn underflow(&self) -> f64 {
        self.contents[0]
    }

    /// Overflow content.
    pub fn overflow(&self) -> f64 {
        self.contents[self.axis.n_bins + 1]
    }

    /// Sum of regular-bin contents.
    pub fn integral(&self) -> f64 {
        self.contents[1..=self.axis.n_bins].iter().sum()
    }

    /// Same axis, zero contents.
    pub fn zeroed(&self) -> Self {
        Self::new(self.name.clone(), self.axis)
    }

    /// Add another histogram bin by bin.
    pub fn add(&mut self, other: &Hist1D) -> Result<()> {
        if self.axis != other.axis {
            return Err(Error::IncompatibleBinning(self.name.clone()));
        }
        for (a, b) in self.contents.iter_mut().zip(&other.contents) {
            *a += b;
        }
        for (a, b) in self.sumw2.iter_mut().zip(&other.sumw2) {
            *a += b;
        }
        self.entries += other.entries;
        Ok(())
    }

    /// Bin-by-bin ratio `self / den`; bins with a zero denominator are 0.
    ///
    /// Errors are propagated as for uncorrelated histograms.
    pub fn divide(&self, den: &Hist1D, name: impl Into<String>) -> Result<Hist1D> {
        if self.axis != den.axis {
            return Err(Error::IncompatibleBinning(self.name.clone()));
        }
        let mut out = Hist1D::new(name, self.axis);
        for bin in 0..self.axis.n_stored() {
            let (c1, c2) = (self.contents[bin], den.contents[bin]);
            if c2 == 0.0 {
                continue;
            }
            let (e1, e2) = (self.sumw2[bin], den.sumw2[bin]);
            out.contents[bin] = c1 / c2;
            out.sumw2[bin] = (e1 * c2 * c2 + e2 * c1 * c1) / (c2 * c2 * c2 * c2);
        }
        out.entries = self.entries;
        Ok(out)
    }

    fn add_to_bin(&mut self, bin: usize, weight: f64) {
        self.contents[bin] += weight;
        self.sumw2[bin] += weight * weight;
    }
}

/// A 2-D histogram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hist2D {
    /// Histogram name.
    pub name: String,
    /// X axis.
    pub x: Axis,
    /// Y axis.
    pub y: Axis,
    /// Contents, `(nx + 2) * (ny + 2)`, x fastest.
    pub contents: Vec<f64>,
    /// Sum of squared weights, same layout.
    pub sumw2: Vec<f64>,
    /// Number of fill calls.
    pub entries: u64,
}

impl Hist2D {
    /// Empty histogram.
    pub fn new(name: impl Into<String>, x: Axis, y: Axis) -> Self {
        let n = x.n_stored() * y.n_stored();
        Self { name: name.into(), x, y, contents: vec![0.0; n], sumw2: vec![0.0; n], entries: 0 }
    }

    #[inline]
    fn index(&self, bx: usize, by: usize) -> usize {
        by * self.x.n_stored() + bx
    }

    /// Add `weight` to the bin containing `(x, y)`.
    pub fn fill(&mut self, x: f64, y: f64, weight: f64) {
        let i = self.index(self.x.find_bin(x), self.y.find_bin(y));
        self.contents[i] += weight;
        self.sumw2[i] += weight * weight;
        self.entries += 1;
    }

    /// Content of ROOT bin `(bx, by)` (0 outside the stored range).
    pub fn bin_content(&self, bx: usize, by: usize) -> f64 {
        if bx >= self.x.n_stored() || by >= self.y.n_stored() {
            return 0.0;
        }
        self.contents[self.index(bx, by)]
    }

    /// Overwrite ROOT bin `(bx, by)`.
    pub fn set_bin_content(&mut self, bx: usize, by: usize, value: f64) -> Result<()> {
        if bx >= self.x.n_stored() {
            return Err(Error::BinOutOfRange { name: self.name.clone(), bin: bx, n_bins: self.x.n_bins });
        }
        if by >= self.y.n_stored() {
            return Err(Error::BinOutOfRange { name: self.name.clone(), bin: by, n_bins: self.y.n_bins });
        }
        let i = self.index(bx, by);
        self.contents[i] = value;
        Ok(())
    }

    /// Content of the bin containing `(x, y)`.
    pub fn interpolate_bin(&self, x: f64, y: f64) -> f64 {
        self.bin_content(self.x.find_bin(x), self.y.find_bin(y))
    }

    /// Same axes, zero contents.
    pub fn zeroed(&self) -> Self {
        Self::new(self.name.clone(), self.x, self.y)
    }

    /// Add another histogram bin by bin.
    pub fn add(&mut self, other: &Hist2D) -> Result<()> {
        if self.x != other.x || self.y != other.y {
            return Err(Error::IncompatibleBinning(self.name.clone()));
        }
        for (a, b) in self.contents.iter_mut().zip(&other.contents) {
            *a += b;
        }
        for (a, b) in self.sumw2.iter_mut().zip(&other.sumw2) {
            *a += b;
        }
        self.entries += other.entries;
        Ok(())
    }
}

/// Either kind of histogram, as stored in the manager and the output file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Histogram {
    /// One-dimensional.
    #[serde(rename = "1d")]
    OneD(Hist1D),
    /// Two-dimensional.
    #[serde(rename = "2d")]
    TwoD(Hist2D),
}

impl Histogram {
    /// Histogram name.
    pub fn name(&self) -> &str {
        match self {
            Histogram::OneD(h) => &h.name,
            Histogram::TwoD(h) => &h.name,
        }
    }

    /// Number of fill calls.
    pub fn entries(&self) -> u64 {
        match self {
            Histogram::OneD(h) => h.entries,
            Histogram::TwoD(h) => h.entries,
        }
    }

    /// The 1-D histogram, or `HistogramDimension`.
    pub fn as_1d(&self) -> Result<&Hist1D> {
        match self {
            Histogram::OneD(h) => Ok(h),
            Histogram::TwoD(h) => {
                Err(Error::HistogramDimension { name: h.name.clone(), expected: "1-D" })
            }
        }
    }

    /// The 2-D histogram, or `HistogramDimension`.
    pub fn as_2d(&self) -> Result<&Hist2D> {
        match self {
            Histogram::TwoD(h) => Ok(h),
            Histogram::OneD(h) => {
                Err(Error::HistogramDimension { name: h.name.clone(), expected: "2-D" })
            }
        }
    }

    pub(crate) fn as_1d_mut(&mut self) -> Result<&mut Hist1D> {
        match self {
            Histogram::OneD(h) => Ok(h),
            Histogram::TwoD(h) => {
                Err(Error::HistogramDimension { name: h.name.clone(), expected: "1-D" })
            }
        }
    }

    pub(crate) fn as_2d_mut(&mut self) -> Result<&mut Hist2D> {
        match self {
            Histogram::TwoD(h) => Ok(h),
            Histogram::OneD(h) => {
                Err(Error::HistogramDimension { name: h.name.clone(), expected: "2-D" })
            }
        }
    }

    /// Same binning, zero contents.
    pub fn zeroed(&self) -> Self {
        match self {
            Histogram::OneD(h) => Histogram::OneD(h.zeroed()),
            Histogram::TwoD(h) => Histogram::TwoD(h.zeroed()),
        }
    }

    /// Whether `other` has the same dimension and axes.
    pub fn same_binning(&self, other: &Histogram) -> bool {
        match (self, other) {
            (Histogram::OneD(a), Histogram::OneD(b)) => a.axis == b.axis,
            (Histogram::TwoD(a), Histogram::TwoD(b)) => a.x == b.x && a.y == b.y,
            _ => false,
        }
    }

    /// Add another histogram of the same shape.
    pub fn add(&mut self, other: &Histogram) -> Result<()> {
        match (self, other) {
            (Histogram::OneD(a), Histogram::OneD(b)) => a.add(b),
            (Histogram::TwoD(a), Histogram::TwoD(b)) => a.add(b),
            (a, _) => Err(Error::IncompatibleBinning(a.name().to_string())),
        }
    }
}
