//! Boosted Z -> mu tau_h selection with same-sign / anti-isolated control regions.

use gg_core::{FourMomentum, Result, WorkingPoint, transverse_mass};
use gg_hist::{HistManager, ScaleFactorMap};
use gg_objects::{
    Ak8Jets, EventInfoFactory, Jets, Muon, Muons, ObjectFactory, PhysicsObject, Tau, Taus, ht, mht,
};
use gg_tree::Tree;

use crate::job::Analysis;

/// Jet trigger bits accepted by the selection.
const JET_TRIGGERS: [u32; 2] = [39, 40];

/// Medium muon ID bit in `muIDbit`.
pub(crate) const MUON_MEDIUM_ID: u32 = 2;

/// Histogram suffixes filled in every region.
pub const OBSERVABLES: [&str; 9] =
    ["ht", "mht", "met", "mu_pt", "tau_pt", "Z_mass", "Z_pt", "mu_tau_dr", "mt_mutau"];

/// The `mutau` analyzer.
#[derive(Debug, Default)]
pub struct MuTau {
    trigger_sf: Option<ScaleFactorMap>,
}

impl MuTau {
    /// Analyzer without trigger scale factors.
    pub fn new() -> Self {
        Self::default()
    }

    /// Weight events by the scale factor of the leading AK8 jet (soft-drop mass, pt).
    pub fn with_trigger_sf(mut self, sf: ScaleFactorMap) -> Self {
        self.trigger_sf = Some(sf);
        self
    }
}

/// Factories bound for one worker.
pub struct MuTauWorker<'t> {
    event: EventInfoFactory<'t>,
    muons: ObjectFactory<'t, Muons>,
    taus: ObjectFactory<'t, Taus>,
    jets: ObjectFactory<'t, Jets>,
    ak8: Option<ObjectFactory<'t, Ak8Jets>>,
}

struct Candidate<'e> {
    muon: &'e Muon,
    tau: &'e Tau,
    z: FourMomentum,
}

impl Candidate<'_> {
    fn same_sign(&self) -> bool {
        self.muon.charge() == self.tau.charge()
    }
}

/// First muon/tau pair with `0.02 <= dR < 0.8`, muons in pt order.
fn pick_pair<'e>(muons: &'e [Muon], taus: &'e [Tau]) -> Option<Candidate<'e>> {
    muons.iter().find_map(|muon| {
        taus.iter()
            .find(|tau| (0.02..0.8).contains(&muon.delta_r(*tau)))
            .map(|tau| Candidate { muon, tau, z: *muon.p4() + *tau.p4() })
    })
}

impl Analysis for MuTau {
    type Worker<'t> = MuTauWorker<'t>;

    fn name(&self) -> &'static str {
        "mutau"
    }

    fn bind<'t>(&self, tree: &'t Tree, is_data: bool) -> Result<MuTauWorker<'t>> {
        let ak8 = match self.trigger_sf {
            Some(_) => Some(ObjectFactory::new(Ak8Jets, tree, is_data)?),
            None => None,
        };
        Ok(MuTauWorker {
            event: EventInfoFactory::new(tree, is_data)?,
            muons: ObjectFactory::new(Muons, tree, is_data)?,
            taus: ObjectFactory::new(Taus::boosted(), tree, is_data)?,
            jets: ObjectFactory::new(Jets, tree, is_data)?,
            ak8,
        })
    }

    fn process(
        &self,
        w: &mut MuTauWorker<'_>,
        event: usize,
        weight: f64,
        hists: &mut HistManager,
    ) -> Result<()> {
        w.event.run(event)?;
        w.muons.run(event)?;
        w.taus.run(event)?;
        w.jets.run(event)?;

        let mut weight = weight;
        if let (Some(sf), Some(ak8)) = (&self.trigger_sf, w.ak8.as_mut()) {
            ak8.run(event)?;
            if let Some(jet) = ak8.leading() {
                weight *= sf.get(f64::from(jet.soft_drop_mass()), jet.pt());
            }
        }

        hists.fill_bin("cutflow", 1, weight)?;

        let info = w.event.info();
        let mut fired = false;
        for bit in JET_TRIGGERS {
            fired |= info.jet_trigger(bit)?;
        }
        if !fired {
            return Ok(());
        }
        hists.fill_bin("cutflow", 2, weight)?;

        if w.muons.n_good() != 1 {
            return Ok(());
        }
        hists.fill_bin("cutflow", 3, weight)?;

        if w.taus.n_good() < 2 {
            return Ok(());
        }
        hists.fill_bin("cutflow", 4, weight)?;

        let Some(pair) = pick_pair(w.muons.objects(), w.taus.objects()) else {
            return Ok(());
        };

        if !pair.tau.passes_muon_rejection(WorkingPoint::Tight)? {
            return Ok(());
        }
        hists.fill_bin("cutflow", 5, weight)?;

        // Z recoils against the leading jet.
        let Some(lead_jet) = w.jets.leading() else {
            return Ok(());
        };
        if lead_jet.p4().delta_r(&pair.z) < 2.0 {
            return Ok(());
        }
        hists.fill_bin("cutflow", 6, weight)?;

        let met = info.met();
        if met.pt() < 100.0 {
            return Ok(());
        }
        hists.fill_bin("cutflow", 7, weight)?;

        let jets = w.jets.objects();
        let values = [
            ht(jets),
            mht(jets).pt(),
            met.pt(),
            pair.muon.pt(),
            pair.tau.pt(),
            pair.z.mass(),
            pair.z.pt(),
            pair.tau.delta_r(pair.muon),
            transverse_mass(pair.muon.p4(), pair.tau.p4()),
        ];

        let loose_iso = pair.tau.passes_isolation(WorkingPoint::Loose);
        let muon_id = pair.muon.passes_id(MUON_MEDIUM_ID)?;
        let sign = if pair.same_sign() { "SS" } else { "OS" };
        let region = match (loose_iso, muon_id) {
            (false, _) => Some(format!("{sign}_antiiso_")),
            (true, false) => Some(format!("{sign}_antiid_")),
            (true, true) if pair.same_sign() => Some("SS_id_".to_string()),
            (true, true) => None,
        };
        if let Some(prefix) = region {
            fill_observables(hists, &prefix, &values, weight)?;
        }

        if !muon_id {
            return Ok(());
        }
        hists.fill_bin("cutflow", 8, weight)?;

        if pair.muon.charge() * pair.tau.charge() > 0 {
            return Ok(());
        }
        hists.fill_bin("cutflow", 9, weight)?;

        if !loose_iso {
            return Ok(());
        }
        hists.fill_bin("cutflow", 10, weight)?;

        fill_observables(hists, "", &values, weight)
    }
}

fn fill_observables(
    hists: &mut HistManager,
    prefix: &str,
    values: &[f64; 9],
    weight: f64,
) -> Result<()> {
    for (suffix, value) in OBSERVABLES.iter().zip(values) {
        hists.fill(&format!("{prefix}{suffix}"), *value, weight)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gg_hist::{BinSpec, HistConfig};
    use gg_tree::TreeBuilder;

    #[test]
    fn shipped_config_declares_every_region() {
        let config = HistConfig::from_json_str(include_str!("../configs/mutau.json")).unwrap();
        let regions = ["SS_antiiso_", "OS_antiiso_", "SS_antiid_", "OS_antiid_", "SS_id_"];
        for prefix in std::iter::once("").chain(regions) {
            for suffix in OBSERVABLES {
                let name = format!("{prefix}{suffix}");
                assert!(config.get(&name).is_some(), "{name} missing");
            }
        }
        assert!(config.get("cutflow").is_some());
    }

    #[test]
    fn missing_config_entry_is_lookup_error() {
        let mut config = HistConfig::new();
        config.insert("cutflow", BinSpec::one_d("cutflow", 10, 0.5, 10.5).unwrap()).unwrap();
        let mut hists = HistManager::detached();
        hists.declare_all(&config).unwrap();
        let err = fill_observables(&mut hists, "SS_id_", &[0.0; 9], 1.0).unwrap_err();
        assert!(matches!(err, gg_core::Error::UnknownHistogram(name) if name == "SS_id_ht"));
    }

    #[test]
    fn binding_requires_boosted_tau_branches() {
        let tree = TreeBuilder::new("t", 0).build().unwrap();
        assert!(MuTau::new().bind(&tree, true).is_err());
    }
}
