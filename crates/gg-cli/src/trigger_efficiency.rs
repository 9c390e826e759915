//! Jet-trigger turn-on measurement in a muon-triggered boosted tau sample.

use gg_core::{Result, WorkingPoint};
use gg_hist::HistManager;
use gg_objects::{Ak8Jets, EventInfoFactory, Muons, ObjectFactory, PhysicsObject, Taus};
use gg_tree::Tree;

use crate::job::Analysis;

/// Trigger bit whose efficiency is measured.
const MEASURED_TRIGGER: u32 = 40;

/// Matching cone between the muon and a jet or tau.
const MATCH_DR: f64 = 0.8;

/// Minimum jet mass for the pt turn-on.
const PT_TURNON_MIN_MASS: f64 = 30.0;

/// Minimum jet pt for the mass turn-on.
const MASS_TURNON_MIN_PT: f64 = 400.0;

/// The `trigger-efficiency` analyzer.
#[derive(Debug, Default)]
pub struct TriggerEfficiency;

/// Factories bound for one worker.
pub struct TriggerWorker<'t> {
    event: EventInfoFactory<'t>,
    jets: ObjectFactory<'t, Ak8Jets>,
    muons: ObjectFactory<'t, Muons>,
    taus: ObjectFactory<'t, Taus>,
}

impl Analysis for TriggerEfficiency {
    type Worker<'t> = TriggerWorker<'t>;

    fn name(&self) -> &'static str {
        "trigger-efficiency"
    }

    fn bind<'t>(&self, tree: &'t Tree, is_data: bool) -> Result<TriggerWorker<'t>> {
        Ok(TriggerWorker {
            event: EventInfoFactory::new(tree, is_data)?,
            jets: ObjectFactory::new(Ak8Jets, tree, is_data)?,
            muons: ObjectFactory::new(Muons, tree, is_data)?,
            taus: ObjectFactory::new(Taus::boosted(), tree, is_data)?,
        })
    }

    fn process(
        &self,
        w: &mut TriggerWorker<'_>,
        event: usize,
        weight: f64,
        hists: &mut HistManager,
    ) -> Result<()> {
        w.event.run(event)?;
        w.jets.run(event)?;
        w.muons.run(event)?;
        w.taus.run(event)?;

        let jets = w.jets.objects();
        let taus = w.taus.objects();
        let [muon] = w.muons.objects() else {
            return Ok(());
        };
        if jets.is_empty() || taus.len() < 2 {
            return Ok(());
        }

        // Measurement sample: no tau passes loose isolation, one sits on the muon.
        if taus.iter().any(|t| t.passes_isolation(WorkingPoint::Loose)) {
            return Ok(());
        }
        if !taus.iter().any(|t| t.delta_r(muon) < MATCH_DR) {
            return Ok(());
        }

        for jet in jets {
            let soft_drop = f64::from(jet.soft_drop_mass());
            hists.fill("pt", jet.pt(), weight)?;
            hists.fill("mass", soft_drop, weight)?;
            if jet.delta_r(muon) < MATCH_DR {
                hists.fill("matched_pt", jet.pt(), weight)?;
                hists.fill("matched_pr_mass", f64::from(jet.pruned_mass()), weight)?;
                hists.fill("matched_sd_mass", soft_drop, weight)?;
            }
        }
        hists.fill("cutflow", 1.0, weight)?;

        let fired = w.event.info().jet_trigger(MEASURED_TRIGGER)?;
        for jet in jets.iter().filter(|j| j.delta_r(muon) < MATCH_DR) {
            if jet.mass() > PT_TURNON_MIN_MASS {
                hists.fill_thresholds("pt_turnon_den", jet.pt(), weight)?;
                if fired {
                    hists.fill_thresholds("pt_turnon", jet.pt(), weight)?;
                }
            }
            if jet.pt() > MASS_TURNON_MIN_PT {
                let soft_drop = f64::from(jet.soft_drop_mass());
                hists.fill_thresholds("mass_turnon_den", soft_drop, weight)?;
                if fired {
                    hists.fill_thresholds("mass_turnon", soft_drop, weight)?;
                }
            }
        }
        Ok(())
    }
}
