//! Trigger efficiencies and scale-factor lookup.

use std::collections::BTreeMap;
use std::path::Path;

use gg_core::{Error, Result};

use crate::histogram::{Hist1D, Hist2D, Histogram};
use crate::output::read_histograms;

/// Turn-on efficiency `num / den` (zero denominators give 0).
pub fn turn_on_efficiency(num: &Hist1D, den: &Hist1D, name: &str) -> Result<Hist1D> {
    num.divide(den, name)
}

/// 2-D efficiency map whose bin `(i, j)` is `x_eff[i] * y_eff[j]`.
///
/// Bins `0..=n` of each axis are filled; the overflow row and column stay 0.
pub fn efficiency_map(name: &str, x_eff: &Hist1D, y_eff: &Hist1D) -> Result<Hist2D> {
    let mut map = Hist2D::new(name, x_eff.axis, y_eff.axis);
    for bx in 0..=x_eff.axis.n_bins {
        for by in 0..=y_eff.axis.n_bins {
            map.set_bin_content(bx, by, x_eff.bin_content(bx) * y_eff.bin_content(by))?;
        }
    }
    Ok(map)
}

/// 2-D scale factors looked up by (mass, pt).
#[derive(Debug, Clone)]
pub struct ScaleFactorMap {
    hist: Hist2D,
}

impl ScaleFactorMap {
    /// Wrap an existing 2-D histogram.
    pub fn new(hist: Hist2D) -> Self {
        Self { hist }
    }

    /// Load histogram `name` from an output-format file.
    pub fn from_path(path: impl AsRef<Path>, name: &str) -> Result<Self> {
        let path = path.as_ref();
        let mut hists: BTreeMap<String, Histogram> = read_histograms(path)?;
        let hist = hists.remove(name).ok_or_else(|| Error::UnknownObject(name.to_string()))?;
        let Histogram::TwoD(hist) = hist else {
            return Err(Error::HistogramDimension { name: name.to_string(), expected: "2-D" });
        };
        tracing::debug!(path = %path.display(), name, "scale factors loaded");
        Ok(Self { hist })
    }

    /// Scale factor for the bin containing `(mass, pt)`.
    pub fn get(&self, mass: f64, pt: f64) -> f64 {
        self.hist.interpolate_bin(mass, pt)
    }

    /// Underlying histogram.
    pub fn histogram(&self) -> &Hist2D {
        &self.hist
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::histogram::Axis;
    use approx::assert_relative_eq;

    fn hist(name: &str, n: usize, hi: f64) -> Hist1D {
        Hist1D::new(name, Axis::new(n, 0.0, hi).unwrap())
    }

    #[test]
    fn product_map() {
        let mut mass = hist("mass", 2, 200.0);
        mass.contents[1] = 0.5;
        mass.contents[2] = 1.0;
        let mut pt = hist("pt", 3, 900.0);
        pt.contents[1] = 0.2;
        pt.contents[3] = 0.8;
        pt.contents[4] = 9.0;
        let map = efficiency_map("trigger_efficiency", &mass, &pt).unwrap();
        assert_relative_eq!(map.bin_content(1, 1), 0.1);
        assert_relative_eq!(map.bin_content(2, 3), 0.8);
        assert_relative_eq!(map.bin_content(2, 2), 0.0);
        assert_relative_eq!(map.bin_content(2, 4), 0.0);
    }

    #[test]
    fn scale_factor_lookup() {
        let mut h = Hist2D::new(
            "sf",
            Axis::new(2, 0.0, 200.0).unwrap(),
            Axis::new(2, 200.0, 1200.0).unwrap(),
        );
        h.set_bin_content(2, 1, 0.93).unwrap();
        let sf = ScaleFactorMap::new(h);
        assert_relative_eq!(sf.get(150.0, 300.0), 0.93);
        assert_relative_eq!(sf.get(50.0, 300.0), 0.0);
    }
}
