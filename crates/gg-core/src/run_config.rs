//! Per-job normalization inputs: luminosities, cross sections, sample naming.
//!
//! Loaded once at startup and passed down explicitly.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Luminosity and cross-section tables for weighting simulated samples.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Integrated luminosity per data-taking year, in pb^-1.
    #[serde(default)]
    pub lumi: BTreeMap<String, f64>,
    /// Cross section per sample name, in pb.
    #[serde(default)]
    pub cross_sections: BTreeMap<String, f64>,
    /// Sample-name overrides: if the input path contains the key, the value is
    /// used as sample name.
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
}

impl RunConfig {
    /// Read a run configuration from a JSON file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .map_err(|source| Error::OpenInput { path: path.to_path_buf(), source })?;
        let cfg: RunConfig = serde_json::from_slice(&bytes)
            .map_err(|source| Error::ParseConfig { path: path.to_path_buf(), source })?;
        cfg.validate()?;
        tracing::debug!(
            path = %path.display(),
            years = cfg.lumi.len(),
            samples = cfg.cross_sections.len(),
            "run config loaded"
        );
        Ok(cfg)
    }

    /// Reject negative or non-finite numbers.
    pub fn validate(&self) -> Result<()> {
        for (year, l) in &self.lumi {
            if !l.is_finite() || *l < 0.0 {
                return Err(Error::Validation(format!("lumi['{year}'] must be finite and >= 0")));
            }
        }
        for (sample, xs) in &self.cross_sections {
            if !xs.is_finite() || *xs < 0.0 {
                return Err(Error::Validation(format!(
                    "cross_sections['{sample}'] must be finite and >= 0"
                )));
            }
        }
        Ok(())
    }

    /// Luminosity for `year`.
    pub fn lumi(&self, year: &str) -> Result<f64> {
        self.lumi.get(year).copied().ok_or_else(|| Error::UnknownYear(year.to_string()))
    }

    /// Cross section for `sample`.
    pub fn cross_section(&self, sample: &str) -> Result<f64> {
        self.cross_sections.get(sample).copied().ok_or_else(|| Error::UnknownSample(sample.into()))
    }

    /// Derive the sample name from an input path.
    ///
    /// The file stem is used unless an alias key occurs anywhere in the path.
    pub fn sample_name(&self, input: &Path) -> String {
        let full = input.to_string_lossy();
        for (needle, sample) in &self.aliases {
            if full.contains(needle.as_str()) {
                return sample.clone();
            }
        }
        input.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default()
    }

    /// Per-event weight `lumi * xs / n_generated`; data events weigh 1.
    pub fn event_weight(
        &self,
        sample: &str,
        year: &str,
        n_generated: f64,
        is_data: bool,
    ) -> Result<f64> {
        if is_data {
            return Ok(1.0);
        }
        if n_generated.is_nan() || n_generated <= 0.0 {
            return Err(Error::Validation(format!(
                "sample '{sample}': generated event count must be > 0 (got {n_generated})"
            )));
        }
        Ok(self.lumi(year)? * self.cross_section(sample)? / n_generated)
    }

    /// Built-in 2016-2018 tables.
    pub fn builtin() -> Self {
        let lumi = [("2016", 35900.0), ("2017", 41500.0), ("2018", 63670.0)];
        let cross_sections = [
            ("DYJetsToLL_M-50_HT-100to200", 148.0),
            ("DYJetsToLL_M-50_HT-200to400", 40.94),
            ("DYJetsToLL_M-50_HT-400to600", 5.497),
            ("DYJetsToLL_M-50_HT-600to800", 1.354),
            ("DYJetsToLL_M-50_HT-800to1200", 0.625),
            ("DYJetsToLL_M-50_HT-1200to2500", 0.151),
            ("DYJetsToLL_M-50_HT-2500toInf", 0.003647),
            ("DYJetsToLL_M-50_v1", 0.0),
            ("WJetsToLNu_HT-100To200", 148.0),
            ("WJetsToLNu_HT-200To400", 40.94),
            ("WJetsToLNu_HT-400To600", 5.497),
            ("WJetsToLNu_HT-600To800", 1.354),
            ("WJetsToLNu_HT-800To1200", 0.625),
            ("WJetsToLNu_HT-1200To2500", 0.151),
            ("WJetsToLNu_HT-2500ToInf", 0.003647),
            ("WJetsToLNu_Inc", 0.0),
            ("ST_s-channel_4f_leptonDecays", 3.36),
            ("ST_t-channel_antitop_4f_inclusiveDecays", 26.23),
            ("ST_t-channel_top_4f_inclusiveDecays", 44.07),
            ("ST_tW_antitop_5f_inclusiveDecays", 35.6),
            ("ST_tW_top_5f_inclusiveDecays", 35.6),
            ("TTTo2L2Nu", 88.29),
            ("TTToHadronic", 377.96),
            ("TTToSemiLeptonic", 365.35),
            ("WWTo1L1Nu2Q_13TeV_amcatnloFXFX_madspin", 49.997),
            ("WWTo2L2Nu_NNPDF31_TuneCP5_13TeV-powheg", 12.178),
            ("WWTo4Q_NNPDF31_TuneCP5_13TeV-powheg", 51.723),
            ("WWToLNuQQ_NNPDF31_TuneCP5_13TeV-powheg", 49.997),
            ("WZTo1L1Nu2Q_13TeV_amcatnloFXFX_madspin", 10.71),
            ("WZTo1L3Nu_13TeV_amcatnloFXFX", 3.05),
            ("WZTo2L2Q_13TeV_amcatnloFXFX_madspin", 5.595),
            ("WZTo3LNu_TuneCP5_13TeV-amcatnloFXFX", 4.708),
            ("ZZTo2L2Nu_13TeV_powheg", 0.564),
            ("ZZTo2L2Q_13TeV_amcatnloFXFX_madspin", 3.22),
            ("ZZTo4L_13TeV_powheg", 1.212),
            ("JetHT_Run2017B-31Mar2018", 1.0),
            ("JetHT_Run2017C-31Mar2018", 1.0),
            ("JetHT_Run2017D-31Mar2018", 1.0),
            ("JetHT_Run2017E-31Mar2018", 1.0),
            ("JetHT_Run2017F-31Mar2018", 1.0),
        ];
        let aliases = ["WJetsToLNu_HT-2500ToInf", "WJetsToLNu_HT-800To1200"];

        Self {
            lumi: lumi.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            cross_sections: cross_sections.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            aliases: aliases.iter().map(|k| (k.to_string(), k.to_string())).collect(),
        }
    }
}
