//! Turn the cumulative turn-on histograms into efficiencies and the 2-D map.

use std::collections::BTreeMap;
use std::path::Path;

use gg_core::{Error, Result};
use gg_hist::{Hist1D, Histogram, OutputFile, efficiency_map, read_histograms, turn_on_efficiency};

/// Name of the 2-D map, also what `mutau --trigger-sf` reads.
pub const EFFICIENCY_MAP: &str = "trigger_efficiency";

/// Read `mass_turnon[_den]` and `pt_turnon[_den]` from `input` and write the
/// per-axis efficiencies plus their product map to `output`.
pub fn run(input: &Path, output: &Path) -> Result<()> {
    let hists = read_histograms(input)?;
    let mass_eff = turn_on_efficiency(
        one_d(&hists, "mass_turnon")?,
        one_d(&hists, "mass_turnon_den")?,
        "mass_efficiency",
    )?;
    let pt_eff = turn_on_efficiency(
        one_d(&hists, "pt_turnon")?,
        one_d(&hists, "pt_turnon_den")?,
        "pt_efficiency",
    )?;
    let map = efficiency_map(EFFICIENCY_MAP, &mass_eff, &pt_eff)?;

    let mut out = OutputFile::create(output)?;
    out.write_object(EFFICIENCY_MAP, &Histogram::TwoD(map))?;
    out.write_object("mass_efficiency", &Histogram::OneD(mass_eff))?;
    out.write_object("pt_efficiency", &Histogram::OneD(pt_eff))?;
    out.close()?;
    tracing::info!(input = %input.display(), output = %output.display(), "efficiency map written");
    Ok(())
}

fn one_d<'h>(hists: &'h BTreeMap<String, Histogram>, name: &str) -> Result<&'h Hist1D> {
    hists.get(name).ok_or_else(|| Error::UnknownObject(name.to_string()))?.as_1d()
}
