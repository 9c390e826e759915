//! Hadronic taus: the standard collection (`tau*`) and the boosted one
//! reconstructed inside large-radius jets (`boostedTau*`).
//!
//! Both share the [`Tau`] record. The isolation discriminator family is a
//! runtime choice because its name is part of the branch names
//! (`tauByLooseIsolationMVArun2v2DBoldDMwLT`, ...).

use gg_core::{Kinematics, LooseTightFlags, Param, Result, WorkingPoint, WorkingPointFlags};

use crate::binding::Binding;
use crate::factory::{ObjectKind, PhysicsObject, Preselection};

/// Default isolation family for standard taus.
pub const TAU_ISOLATION: &str = "IsolationMVArun2v2DBoldDMwLT";
/// Default isolation family for boosted taus.
pub const BOOSTED_TAU_ISOLATION: &str = "IsolationMVArun2v1DBoldDMwLT";

/// One hadronic tau candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct Tau {
    kin: Kinematics,
    f: TauFields,
}

/// Auxiliary tau fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TauFields {
    iso_raw: f32,
    iso: WorkingPointFlags,
    anti_electron: WorkingPointFlags,
    anti_muon: LooseTightFlags,
    decay_mode_finding: bool,
    decay_mode_finding_new_dms: bool,
    lead_charged_hadron_exists: bool,
    decay_mode: i32,
    n_signal_charged: i32,
    n_signal_neutral: i32,
    n_signal_gamma: i32,
    charge: f32,
    dz: f32,
    dxy: f32,
}

impl Tau {
    /// Passes the isolation discriminator at `wp`.
    pub fn passes_isolation(&self, wp: WorkingPoint) -> bool {
        self.f.iso.get(wp)
    }

    /// Raw isolation MVA score.
    pub fn isolation_raw(&self) -> f32 {
        self.f.iso_raw
    }

    /// Passes the anti-muon discriminator; only loose and tight exist.
    pub fn passes_muon_rejection(&self, wp: WorkingPoint) -> Result<bool> {
        self.f.anti_muon.get(wp, "anti-muon discriminator")
    }

    /// Passes the anti-electron MVA at `wp`.
    pub fn passes_electron_rejection(&self, wp: WorkingPoint) -> bool {
        self.f.anti_electron.get(wp)
    }

    /// Old decay-mode finding.
    pub fn decay_mode_finding(&self) -> bool {
        self.f.decay_mode_finding
    }

    /// Decay-mode finding including the new modes.
    pub fn decay_mode_finding_new_dms(&self) -> bool {
        self.f.decay_mode_finding_new_dms
    }

    /// Leading charged hadron present.
    pub fn lead_charged_hadron_exists(&self) -> bool {
        self.f.lead_charged_hadron_exists
    }

    /// Reconstructed decay mode.
    pub fn decay_mode(&self) -> i32 {
        self.f.decay_mode
    }

    /// Signal-cone constituent counts: (charged hadrons, neutral hadrons, photons).
    pub fn signal_constituents(&self) -> (i32, i32, i32) {
        (self.f.n_signal_charged, self.f.n_signal_neutral, self.f.n_signal_gamma)
    }

    /// Electric charge (stored as a float in the ntuple).
    pub fn charge(&self) -> i32 {
        self.f.charge.round() as i32
    }

    /// Longitudinal impact parameter.
    pub fn dz(&self) -> f32 {
        self.f.dz
    }

    /// Transverse impact parameter.
    pub fn dxy(&self) -> f32 {
        self.f.dxy
    }
}

impl PhysicsObject for Tau {
    fn kinematics(&self) -> &Kinematics {
        &self.kin
    }
}

/// Tau collection description.
#[derive(Debug, Clone)]
pub struct Taus {
    prefix: &'static str,
    count: &'static str,
    isolation: String,
    boosted: bool,
}

impl Taus {
    /// Standard taus. Default preselection: `pt > 20`, `|eta| < 2.3`,
    /// very-loose isolation.
    pub fn standard() -> Self {
        Self { prefix: "tau", count: "nTau", isolation: TAU_ISOLATION.into(), boosted: false }
    }

    /// Boosted taus. Default preselection: `pt > 30`, `|eta| < 2.3`.
    pub fn boosted() -> Self {
        Self {
            prefix: "boostedTau",
            count: "nBoostedTau",
            isolation: BOOSTED_TAU_ISOLATION.into(),
            boosted: true,
        }
    }

    /// Use a different isolation discriminator family.
    pub fn with_isolation(mut self, family: impl Into<String>) -> Self {
        self.isolation = family.into();
        self
    }

    fn branch(&self, suffix: &str) -> String {
        format!("{}{suffix}", self.prefix)
    }

    fn iso_branch(&self, wp: &str) -> String {
        format!("{}By{wp}{}", self.prefix, self.isolation)
    }
}

impl ObjectKind for Taus {
    type Record = Tau;
    type Builder = TauFields;

    fn name(&self) -> &str {
        if self.boosted { "boosted tau" } else { "tau" }
    }

    fn count_branch(&self) -> Option<&str> {
        Some(self.count)
    }

    fn p4_branches(&self) -> [&str; 4] {
        if self.boosted {
            ["boostedTauPt", "boostedTauEta", "boostedTauPhi", "boostedTauMass"]
        } else {
            ["tauPt", "tauEta", "tauPhi", "tauMass"]
        }
    }

    fn param(&self) -> Param {
        Param::Mass
    }

    fn bindings(&self) -> Vec<Binding<TauFields>> {
        vec![
            Binding::f32(self.iso_branch("") + "raw", |b, v| b.iso_raw = v),
            Binding::bool(self.iso_branch("VLoose"), |b, v| b.iso.vloose = v),
            Binding::bool(self.iso_branch("Loose"), |b, v| b.iso.loose = v),
            Binding::bool(self.iso_branch("Medium"), |b, v| b.iso.medium = v),
            Binding::bool(self.iso_branch("Tight"), |b, v| b.iso.tight = v),
            Binding::bool(self.iso_branch("VTight"), |b, v| b.iso.vtight = v),
            Binding::bool(self.branch("ByMVA6VLooseElectronRejection"), |b, v| {
                b.anti_electron.vloose = v
            }),
            Binding::bool(self.branch("ByMVA6LooseElectronRejection"), |b, v| {
                b.anti_electron.loose = v
            }),
            Binding::bool(self.branch("ByMVA6MediumElectronRejection"), |b, v| {
                b.anti_electron.medium = v
            }),
            Binding::bool(self.branch("ByMVA6TightElectronRejection"), |b, v| {
                b.anti_electron.tight = v
            }),
            Binding::bool(self.branch("ByMVA6VTightElectronRejection"), |b, v| {
                b.anti_electron.vtight = v
            }),
            Binding::bool(self.branch("ByLooseMuonRejection3"), |b, v| b.anti_muon.loose = v),
            Binding::bool(self.branch("ByTightMuonRejection3"), |b, v| b.anti_muon.tight = v),
            Binding::bool(self.branch("pfTausDiscriminationByDecayModeFinding"), |b, v| {
                b.decay_mode_finding = v
            }),
            Binding::bool(self.branch("pfTausDiscriminationByDecayModeFindingNewDMs"), |b, v| {
                b.decay_mode_finding_new_dms = v
            }),
            Binding::bool(self.branch("LeadChargedHadronExists"), |b, v| {
                b.lead_charged_hadron_exists = v
            }),
            Binding::i32(self.branch("DecayMode"), |b, v| b.decay_mode = v),
            Binding::i32(self.branch("NumSignalPFChargedHadrCands"), |b, v| {
                b.n_signal_charged = v
            }),
            Binding::i32(self.branch("NumSignalPFNeutrHadrCands"), |b, v| b.n_signal_neutral = v),
            Binding::i32(self.branch("NumSignalPFGammaCands"), |b, v| b.n_signal_gamma = v),
            Binding::f32(self.branch("Charge"), |b, v| b.charge = v),
            Binding::f32(self.branch("dz"), |b, v| b.dz = v),
            Binding::f32(self.branch("dxy"), |b, v| b.dxy = v),
        ]
    }

    fn default_preselection(&self) -> Preselection<Tau> {
        if self.boosted {
            Preselection::none().pt_above(30.0).abs_eta_below(2.3)
        } else {
            Preselection::none()
                .pt_above(20.0)
                .abs_eta_below(2.3)
                .and("vloose isolation", |t: &Tau| t.passes_isolation(WorkingPoint::VLoose))
        }
    }

    fn finish(&self, kin: Kinematics, f: TauFields) -> Tau {
        Tau { kin, f }
    }
}
