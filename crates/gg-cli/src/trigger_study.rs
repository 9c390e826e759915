//! Which jet triggers, alone or OR-ed together, catch gen-matched boosted
//! Z -> mu tau_h events. Simulation only.

use gg_core::{FourMomentum, Result};
use gg_hist::HistManager;
use gg_objects::{
    EventInfoFactory, GenParticles, Jets, Muon, Muons, ObjectFactory, PhysicsObject, Tau, Taus,
};
use gg_tree::Tree;

use crate::job::Analysis;

/// Jet trigger bits whose combinations are counted.
pub const STUDIED_TRIGGERS: [u32; 4] = [37, 38, 39, 40];

/// Pairs at or above this visible mass are not Z candidates.
const MAX_PAIR_MASS: f64 = 65.0;

/// Minimum separation between the leading jet and the Z candidate.
const MIN_JET_Z_DR: f64 = 2.5;

/// Gen-matching cone.
const GEN_MATCH_DR: f64 = 0.5;

const MUON_PID: i32 = 13;
const TAU_PID: i32 = 15;

/// Every non-empty subset of `0..n`: by size, then in lexicographic order.
pub fn trigger_groups(n: usize) -> Vec<Vec<usize>> {
    fn extend(
        start: usize,
        n: usize,
        size: usize,
        current: &mut Vec<usize>,
        out: &mut Vec<Vec<usize>>,
    ) {
        if current.len() == size {
            out.push(current.clone());
            return;
        }
        for i in start..n {
            current.push(i);
            extend(i + 1, n, size, current, out);
            current.pop();
        }
    }

    let mut groups = Vec::new();
    for size in 1..=n {
        extend(0, n, size, &mut Vec::new(), &mut groups);
    }
    groups
}

/// Opposite-sign muon/tau pair with `0.02 <= dR < 1` and the largest visible
/// mass below [`MAX_PAIR_MASS`]. Ties keep the first pair found.
fn best_pair<'e>(
    muons: &'e [Muon],
    taus: &'e [Tau],
) -> Option<(&'e Muon, &'e Tau, FourMomentum)> {
    let mut best: Option<(&Muon, &Tau, FourMomentum)> = None;
    for muon in muons {
        for tau in taus {
            if muon.charge() * tau.charge() > 0 || !(0.02..1.0).contains(&muon.delta_r(tau)) {
                continue;
            }
            let z = *muon.p4() + *tau.p4();
            let mass = z.mass();
            if mass < MAX_PAIR_MASS && best.as_ref().is_none_or(|(_, _, b)| mass > b.mass()) {
                best = Some((muon, tau, z));
            }
        }
    }
    best
}

/// The `trigger-study` analyzer.
#[derive(Debug, Default)]
pub struct TriggerStudy;

/// Factories bound for one worker.
pub struct TriggerStudyWorker<'t> {
    event: EventInfoFactory<'t>,
    gens: ObjectFactory<'t, GenParticles>,
    muons: ObjectFactory<'t, Muons>,
    taus: ObjectFactory<'t, Taus>,
    jets: ObjectFactory<'t, Jets>,
}

impl Analysis for TriggerStudy {
    type Worker<'t> = TriggerStudyWorker<'t>;

    fn name(&self) -> &'static str {
        "trigger-study"
    }

    fn bind<'t>(&self, tree: &'t Tree, is_data: bool) -> Result<TriggerStudyWorker<'t>> {
        Ok(TriggerStudyWorker {
            gens: ObjectFactory::new(GenParticles, tree, is_data)?,
            event: EventInfoFactory::new(tree, is_data)?,
            muons: ObjectFactory::new(Muons, tree, is_data)?,
            taus: ObjectFactory::new(Taus::boosted(), tree, is_data)?,
            jets: ObjectFactory::new(Jets, tree, is_data)?,
        })
    }

    fn process(
        &self,
        w: &mut TriggerStudyWorker<'_>,
        event: usize,
        weight: f64,
        hists: &mut HistManager,
    ) -> Result<()> {
        w.event.run(event)?;
        w.gens.run(event)?;
        w.muons.run(event)?;
        w.taus.run(event)?;
        w.jets.run(event)?;

        // mu tau_h final state: exactly one muon from a tau decay.
        let gens = w.gens.objects();
        let muons_from_taus = gens
            .iter()
            .filter(|g| g.pid().abs() == MUON_PID && g.mom_pid().abs() == TAU_PID)
            .count();
        if muons_from_taus != 1 || w.taus.n_good() < 2 {
            return Ok(());
        }

        let Some((muon, tau, z)) = best_pair(w.muons.objects(), w.taus.objects()) else {
            return Ok(());
        };
        let Some(lead_jet) = w.jets.leading() else {
            return Ok(());
        };
        if lead_jet.p4().delta_r(&z) < MIN_JET_Z_DR {
            return Ok(());
        }

        let real_muon =
            gens.iter().any(|g| g.pid().abs() == MUON_PID && g.delta_r(muon) < GEN_MATCH_DR);
        let real_tau =
            gens.iter().any(|g| g.pid().abs() == TAU_PID && g.delta_r(tau) < GEN_MATCH_DR);
        if !real_muon || !real_tau {
            return Ok(());
        }

        hists.fill_bin("triggers", 1, weight)?;
        let info = w.event.info();
        let mut fired = [false; STUDIED_TRIGGERS.len()];
        for (slot, bit) in fired.iter_mut().zip(STUDIED_TRIGGERS) {
            *slot = info.jet_trigger(bit)?;
        }
        for (k, group) in trigger_groups(STUDIED_TRIGGERS.len()).iter().enumerate() {
            if group.iter().any(|&i| fired[i]) {
                hists.fill_bin("triggers", k + 2, weight)?;
            }
        }
        Ok(())
    }
}
