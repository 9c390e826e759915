//! Tau ID scale-factor measurement: lepton + boosted tau pass/fail regions
//! (`mt-sf`, `et-sf`) and the Z -> mu mu control region (`mm-sf`).
//!
//! All three share the preselection: lepton trigger, b-jet veto, HT of central
//! jets above 200 GeV and no extra lepton of the other flavour. The tau
//! channels then pair the lepton with a boosted tau at `0.4 < dR < 0.8` and
//! split events by sign, lepton isolation and tau isolation
//! (`{OS|SS}_{anti_}{pass|fail}/Z_mass`).

use gg_core::{FourMomentum, Result, WorkingPoint};
use gg_hist::HistManager;
use gg_objects::{
    Electron, Electrons, EventInfoFactory, Jets, Muon, Muons, ObjectFactory, PhysicsObject,
    Preselection, Tau, Taus, count_btags,
};
use gg_tree::Tree;

use crate::job::Analysis;
use crate::mutau::MUON_MEDIUM_ID;

/// Minimum HT of central jets.
const MIN_HT: f64 = 200.0;

/// Jets entering HT.
const HT_MAX_ABS_ETA: f64 = 2.4;

/// Relative PF isolation of an isolated muon.
const MUON_ISO: f64 = 0.2;

/// Histograms filled per region.
pub const OBSERVABLES: [&str; 2] = ["Z_mass", "Z_pt"];

/// Final state of the measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// Muon + boosted tau.
    MuTau,
    /// Electron + boosted tau.
    ETau,
    /// Two muons, the Z -> mu mu control region.
    MuMu,
}

impl Channel {
    /// Lepton trigger bits, any of which fires the selection.
    fn triggers(self) -> &'static [u32] {
        match self {
            Channel::MuTau | Channel::MuMu => &[19],
            Channel::ETau => &[3, 4],
        }
    }

    /// Muons kept by the factory: signal muons, or the veto set in `ETau`.
    fn muon_selection(self) -> Preselection<Muon> {
        match self {
            Channel::MuTau => good_muons(60.0),
            Channel::MuMu => {
                good_muons(10.0).and("isolated", |m: &Muon| m.rel_pf_iso() < MUON_ISO)
            }
            Channel::ETau => Preselection::none().pt_above(10.0).abs_eta_below(2.5),
        }
    }

    /// Electrons kept by the factory: signal electrons in `ETau`, otherwise
    /// the veto set.
    fn electron_selection(self) -> Preselection<Electron> {
        match self {
            Channel::ETau => Preselection::none().pt_above(40.0).abs_eta_below(2.5),
            Channel::MuTau | Channel::MuMu => {
                Preselection::none().pt_above(10.0).abs_eta_below(2.4)
            }
        }
    }

    /// Anti-muon and anti-electron working points required of the tau.
    fn tau_rejection(self) -> (WorkingPoint, WorkingPoint) {
        match self {
            Channel::ETau => (WorkingPoint::Loose, WorkingPoint::Tight),
            Channel::MuTau | Channel::MuMu => (WorkingPoint::Tight, WorkingPoint::VLoose),
        }
    }
}

fn good_muons(min_pt: f64) -> Preselection<Muon> {
    Preselection::none()
        .pt_above(min_pt)
        .abs_eta_below(2.4)
        .and("medium id", |m: &Muon| matches!(m.passes_id(MUON_MEDIUM_ID), Ok(true)))
        .and("|d0| < 0.045", |m: &Muon| m.d0().abs() < 0.045)
        .and("|dz| < 0.2", |m: &Muon| m.dz().abs() < 0.2)
}

fn good_taus(anti_muon: WorkingPoint, anti_electron: WorkingPoint) -> Preselection<Tau> {
    Preselection::none()
        .pt_above(20.0)
        .abs_eta_below(2.3)
        .and(format!("anti-muon {anti_muon}"), move |t: &Tau| {
            matches!(t.passes_muon_rejection(anti_muon), Ok(true))
        })
        .and(format!("anti-electron {anti_electron}"), move |t: &Tau| {
            t.passes_electron_rejection(anti_electron)
        })
        .and("decay mode finding", Tau::decay_mode_finding)
}

/// MVA isolation with thresholds by supercluster |eta|. The barrel/endcap
/// boundaries themselves fail.
fn electron_isolated(sc_eta: f32, mva_iso: f32) -> bool {
    let sc_eta = sc_eta.abs();
    if sc_eta < 0.8 {
        mva_iso > 0.941
    } else if sc_eta > 0.8 && sc_eta < 1.5 {
        mva_iso > 0.899
    } else if sc_eta > 1.5 {
        mva_iso > 0.758
    } else {
        false
    }
}

/// The light lepton of a tau channel.
#[derive(Debug, Clone, Copy)]
struct Lepton {
    p4: FourMomentum,
    charge: i32,
    isolated: bool,
}

impl Lepton {
    fn from_muon(m: &Muon) -> Self {
        Self { p4: *m.p4(), charge: m.charge(), isolated: m.rel_pf_iso() < MUON_ISO }
    }

    fn from_electron(e: &Electron) -> Self {
        Self { p4: *e.p4(), charge: e.charge(), isolated: electron_isolated(e.sc_eta(), e.id_mva_iso()) }
    }
}

/// First tau (pt order) with a lepton at `0.4 < dR < 0.8`.
fn pick_pair<'e>(taus: &'e [Tau], leptons: &'e [Lepton]) -> Option<(&'e Tau, &'e Lepton)> {
    taus.iter().find_map(|tau| {
        leptons
            .iter()
            .find(|l| {
                let dr = l.p4.delta_r(tau.p4());
                dr > 0.4 && dr < 0.8
            })
            .map(|l| (tau, l))
    })
}

/// Region name, e.g. `OS_anti_pass`. `None` when the tau fails even the
/// very-loose isolation.
fn region(tau: &Tau, lepton: &Lepton) -> Option<String> {
    let tau_iso = if tau.passes_isolation(WorkingPoint::Medium) {
        "pass"
    } else if tau.passes_isolation(WorkingPoint::VLoose) {
        "fail"
    } else {
        return None;
    };
    let sign = if lepton.charge * tau.charge() < 0 { "OS" } else { "SS" };
    let anti = if lepton.isolated { "" } else { "anti_" };
    Some(format!("{sign}_{anti}{tau_iso}"))
}

fn fill_z(hists: &mut HistManager, region: &str, z: &FourMomentum, weight: f64) -> Result<()> {
    for (suffix, value) in OBSERVABLES.iter().zip([z.mass(), z.pt()]) {
        hists.fill(&format!("{region}/{suffix}"), value, weight)?;
    }
    Ok(())
}

/// The `mt-sf`, `et-sf` and `mm-sf` analyzers.
#[derive(Debug, Clone, Copy)]
pub struct SfMeasurement {
    channel: Channel,
}

impl SfMeasurement {
    /// Analyzer for `channel`.
    pub fn new(channel: Channel) -> Self {
        Self { channel }
    }
}

/// Factories bound for one worker.
pub struct SfWorker<'t> {
    event: EventInfoFactory<'t>,
    jets: ObjectFactory<'t, Jets>,
    muons: ObjectFactory<'t, Muons>,
    electrons: ObjectFactory<'t, Electrons>,
    taus: Option<ObjectFactory<'t, Taus>>,
}

impl SfMeasurement {
    /// Bins 1 to 4 of the cutflow. Returns whether the event survives.
    fn preselect(&self, w: &SfWorker<'_>, weight: f64, hists: &mut HistManager) -> Result<bool> {
        let info = w.event.info();
        let mut fired = false;
        for &bit in self.channel.triggers() {
            fired |= info.lep_trigger(bit)?;
        }
        if !fired {
            return Ok(false);
        }
        hists.fill_bin("cutflow", 1, weight)?;

        let jets = w.jets.objects();
        if count_btags(jets) > 0 {
            return Ok(false);
        }
        hists.fill_bin("cutflow", 2, weight)?;

        let ht: f64 =
            jets.iter().filter(|j| j.eta().abs() < HT_MAX_ABS_ETA).map(PhysicsObject::pt).sum();
        if ht <= MIN_HT {
            return Ok(false);
        }
        hists.fill_bin("cutflow", 3, weight)?;

        let vetoed = match self.channel {
            Channel::ETau => w.muons.n_good(),
            Channel::MuTau | Channel::MuMu => w.electrons.n_good(),
        };
        if vetoed > 0 {
            return Ok(false);
        }
        hists.fill_bin("cutflow", 4, weight)?;
        Ok(true)
    }

    fn tau_regions(&self, w: &SfWorker<'_>, weight: f64, hists: &mut HistManager) -> Result<()> {
        let leptons: Vec<Lepton> = match self.channel {
            Channel::ETau => w.electrons.objects().iter().map(Lepton::from_electron).collect(),
            Channel::MuTau | Channel::MuMu => {
                w.muons.objects().iter().map(Lepton::from_muon).collect()
            }
        };
        let taus: &[Tau] = match &w.taus {
            Some(taus) => taus.objects(),
            None => &[],
        };

        if leptons.len() >= 2 {
            return Ok(());
        }
        hists.fill_bin("cutflow", 5, weight)?;

        if taus.is_empty() {
            return Ok(());
        }
        hists.fill_bin("cutflow", 7, weight)?;

        if leptons.is_empty() {
            return Ok(());
        }
        hists.fill_bin("cutflow", 8, weight)?;

        let Some((tau, lepton)) = pick_pair(taus, &leptons) else {
            return Ok(());
        };
        hists.fill_bin("cutflow", 9, weight)?;
        hists.fill_bin("cutflow", 10, weight)?;
        if tau.passes_isolation(WorkingPoint::Medium) {
            hists.fill_bin("cutflow", 11, weight)?;
        }

        match region(tau, lepton) {
            Some(name) => fill_z(hists, &name, &(lepton.p4 + *tau.p4()), weight),
            None => Ok(()),
        }
    }

    fn dimuon(&self, w: &SfWorker<'_>, weight: f64, hists: &mut HistManager) -> Result<()> {
        let [lead, sub] = w.muons.objects() else {
            return Ok(());
        };
        hists.fill_bin("cutflow", 5, weight)?;

        if lead.pt() <= 30.0 {
            return Ok(());
        }
        hists.fill_bin("cutflow", 6, weight)?;

        if lead.delta_r(sub) >= 1.0 {
            return Ok(());
        }
        hists.fill_bin("cutflow", 7, weight)?;

        let z = *lead.p4() + *sub.p4();
        if z.pt() <= 40.0 {
            return Ok(());
        }
        hists.fill_bin("cutflow", 8, weight)?;

        let sign = if lead.charge() * sub.charge() < 0 { "OS" } else { "SS" };
        fill_z(hists, &format!("{sign}_pass"), &z, weight)
    }
}

impl Analysis for SfMeasurement {
    type Worker<'t> = SfWorker<'t>;

    fn name(&self) -> &'static str {
        match self.channel {
            Channel::MuTau => "mt-sf",
            Channel::ETau => "et-sf",
            Channel::MuMu => "mm-sf",
        }
    }

    fn bind<'t>(&self, tree: &'t Tree, is_data: bool) -> Result<SfWorker<'t>> {
        let taus = match self.channel {
            Channel::MuMu => None,
            Channel::MuTau | Channel::ETau => {
                let (anti_muon, anti_electron) = self.channel.tau_rejection();
                let taus = ObjectFactory::new(Taus::boosted(), tree, is_data)?;
                Some(taus.with_preselection(good_taus(anti_muon, anti_electron)))
            }
        };
        Ok(SfWorker {
            event: EventInfoFactory::new(tree, is_data)?,
            jets: ObjectFactory::new(Jets, tree, is_data)?,
            muons: ObjectFactory::new(Muons, tree, is_data)?
                .with_preselection(self.channel.muon_selection()),
            electrons: ObjectFactory::new(Electrons, tree, is_data)?
                .with_preselection(self.channel.electron_selection()),
            taus,
        })
    }

    fn process(
        &self,
        w: &mut SfWorker<'_>,
        event: usize,
        weight: f64,
        hists: &mut HistManager,
    ) -> Result<()> {
        w.event.run(event)?;
        w.jets.run(event)?;
        w.muons.run(event)?;
        w.electrons.run(event)?;
        if let Some(taus) = w.taus.as_mut() {
            taus.run(event)?;
        }

        if !self.preselect(w, weight, hists)? {
            return Ok(());
        }
        match self.channel {
            Channel::MuMu => self.dimuon(w, weight, hists),
            Channel::MuTau | Channel::ETau => self.tau_regions(w, weight, hists),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gg_hist::HistConfig;

    fn regions_in(config: &str) -> Vec<String> {
        let config = HistConfig::from_json_str(config).unwrap();
        let mut names: Vec<String> = config
            .iter()
            .filter_map(|(n, _)| n.strip_suffix("/Z_mass").map(str::to_string))
            .collect();
        names.sort();
        names
    }

    #[test]
    fn shipped_configs_declare_every_region() {
        let mut expected = Vec::new();
        for sign in ["OS", "SS"] {
            for anti in ["", "anti_"] {
                for iso in ["pass", "fail"] {
                    expected.push(format!("{sign}_{anti}{iso}"));
                }
            }
        }
        expected.sort();
        assert_eq!(regions_in(include_str!("../configs/mt_sf.json")), expected);
        assert_eq!(regions_in(include_str!("../configs/et_sf.json")), expected);
        assert_eq!(regions_in(include_str!("../configs/mm_sf.json")), vec!["OS_pass", "SS_pass"]);
        for text in [
            include_str!("../configs/mt_sf.json"),
            include_str!("../configs/et_sf.json"),
            include_str!("../configs/mm_sf.json"),
        ] {
            let config = HistConfig::from_json_str(text).unwrap();
            assert!(config.get("cutflow").is_some());
            for name in regions_in(text) {
                assert!(config.get(&format!("{name}/Z_pt")).is_some(), "{name}/Z_pt missing");
            }
        }
    }

    #[test]
    fn electron_isolation_by_supercluster_eta() {
        assert!(electron_isolated(0.3, 0.95));
        assert!(!electron_isolated(-0.3, 0.93));
        assert!(electron_isolated(-1.2, 0.9));
        assert!(!electron_isolated(1.2, 0.89));
        assert!(electron_isolated(2.0, 0.76));
        assert!(!electron_isolated(0.8, 0.99));
        assert!(!electron_isolated(1.5, 0.99));
    }

    #[test]
    fn channel_settings() {
        let lepton = Lepton {
            p4: FourMomentum::from_pt_eta_phi_e(50.0, 0.0, 0.0, 50.0),
            charge: 1,
            isolated: true,
        };
        assert!(pick_pair(&[], &[lepton]).is_none());
        assert_eq!(SfMeasurement::new(Channel::ETau).name(), "et-sf");
        assert_eq!(Channel::ETau.triggers(), &[3, 4]);
        assert_eq!(Channel::MuMu.triggers(), &[19]);
        assert_eq!(Channel::MuTau.tau_rejection(), (WorkingPoint::Tight, WorkingPoint::VLoose));
    }

    #[test]
    fn selections_are_labelled() {
        assert_eq!(
            Channel::MuTau.muon_selection().labels(),
            vec!["pt > 60", "|eta| < 2.4", "medium id", "|d0| < 0.045", "|dz| < 0.2"]
        );
        assert_eq!(Channel::MuMu.muon_selection().labels().last(), Some(&"isolated"));
        assert_eq!(Channel::ETau.electron_selection().labels(), vec!["pt > 40", "|eta| < 2.5"]);
        let (mu, ele) = Channel::ETau.tau_rejection();
        assert_eq!(
            good_taus(mu, ele).labels(),
            vec!["pt > 20", "|eta| < 2.3", "anti-muon loose", "anti-electron tight", "decay mode finding"]
        );
    }

    #[test]
    fn binding_requires_electron_branches() {
        let tree = gg_tree::TreeBuilder::new("t", 0).build().unwrap();
        assert!(SfMeasurement::new(Channel::MuMu).bind(&tree, true).is_err());
    }
}
