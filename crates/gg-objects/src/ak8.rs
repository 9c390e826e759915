//! Large-radius (AK8) jets.

use gg_core::{Kinematics, Param};

use crate::binding::Binding;
use crate::factory::{ObjectKind, PhysicsObject, Preselection};

/// One AK8 jet.
#[derive(Debug, Clone, PartialEq)]
pub struct Ak8Jet {
    kin: Kinematics,
    f: Ak8Fields,
}

/// Auxiliary AK8 fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ak8Fields {
    raw_pt: f32,
    raw_en: f32,
    parton_id: i32,
    hadron_flavour: i32,
    smear: f32,
    smear_up: f32,
    smear_down: f32,
    pf_loose_id: bool,
    jec_unc: f32,
    chf: f32,
    nhf: f32,
    cef: f32,
    nef: f32,
    nch: i32,
    nnp: i32,
    muf: f32,
    pruned_mass: f32,
    soft_drop_mass: f32,
}

impl Ak8Jet {
    /// Pruned jet mass.
    pub fn pruned_mass(&self) -> f32 {
        self.f.pruned_mass
    }

    /// Soft-drop groomed mass.
    pub fn soft_drop_mass(&self) -> f32 {
        self.f.soft_drop_mass
    }

    /// Uncorrected pt.
    pub fn raw_pt(&self) -> f32 {
        self.f.raw_pt
    }

    /// Uncorrected energy.
    pub fn raw_energy(&self) -> f32 {
        self.f.raw_en
    }

    /// Parton flavour (simulation only).
    pub fn parton_id(&self) -> i32 {
        self.f.parton_id
    }

    /// Hadron flavour (simulation only).
    pub fn hadron_flavour(&self) -> i32 {
        self.f.hadron_flavour
    }

    /// Resolution smearing factors `(nominal, up, down)` (simulation only).
    pub fn smearing(&self) -> (f32, f32, f32) {
        (self.f.smear, self.f.smear_up, self.f.smear_down)
    }

    /// PF loose jet ID.
    pub fn pf_loose_id(&self) -> bool {
        self.f.pf_loose_id
    }

    /// Jet energy correction uncertainty.
    pub fn jec_uncertainty(&self) -> f32 {
        self.f.jec_unc
    }

    /// Energy fractions `(charged hadron, neutral hadron, charged EM, neutral EM, muon)`.
    pub fn energy_fractions(&self) -> (f32, f32, f32, f32, f32) {
        (self.f.chf, self.f.nhf, self.f.cef, self.f.nef, self.f.muf)
    }

    /// Charged and neutral constituent multiplicities.
    pub fn multiplicities(&self) -> (i32, i32) {
        (self.f.nch, self.f.nnp)
    }
}

impl PhysicsObject for Ak8Jet {
    fn kinematics(&self) -> &Kinematics {
        &self.kin
    }
}

/// AK8 jet collection. Default preselection: `pt >= 30`, `|eta| <= 3`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ak8Jets;

impl ObjectKind for Ak8Jets {
    type Record = Ak8Jet;
    type Builder = Ak8Fields;

    fn name(&self) -> &str {
        "ak8 jet"
    }

    fn count_branch(&self) -> Option<&str> {
        Some("nAK8Jet")
    }

    fn p4_branches(&self) -> [&str; 4] {
        ["AK8JetPt", "AK8JetEta", "AK8JetPhi", "AK8JetEn"]
    }

    fn param(&self) -> Param {
        Param::Energy
    }

    fn bindings(&self) -> Vec<Binding<Ak8Fields>> {
        vec![
            Binding::f32("AK8JetRawPt", |b, v| b.raw_pt = v),
            Binding::f32("AK8JetRawEn", |b, v| b.raw_en = v),
            Binding::i32("AK8JetPartonID", |b: &mut Ak8Fields, v| b.parton_id = v).mc_only(),
            Binding::i32("AK8JetHadFlvr", |b: &mut Ak8Fields, v| b.hadron_flavour = v).mc_only(),
            Binding::f32("AK8JetP4Smear", |b: &mut Ak8Fields, v| b.smear = v).mc_only(),
            Binding::f32("AK8JetP4SmearUp", |b: &mut Ak8Fields, v| b.smear_up = v).mc_only(),
            Binding::f32("AK8JetP4SmearDo", |b: &mut Ak8Fields, v| b.smear_down = v).mc_only(),
            Binding::bool("AK8JetPFLooseId", |b, v| b.pf_loose_id = v),
            Binding::f32("AK8JetJECUnc", |b, v| b.jec_unc = v),
            Binding::f32("AK8JetCHF", |b, v| b.chf = v),
            Binding::f32("AK8JetNHF", |b, v| b.nhf = v),
            Binding::f32("AK8JetCEF", |b, v| b.cef = v),
            Binding::f32("AK8JetNEF", |b, v| b.nef = v),
            Binding::i32("AK8JetNCH", |b, v| b.nch = v),
            Binding::i32("AK8JetNNP", |b, v| b.nnp = v),
            Binding::f32("AK8JetMUF", |b, v| b.muf = v),
            Binding::f32("AK8JetPrunedMass", |b, v| b.pruned_mass = v),
            Binding::f32("AK8JetSoftDropMass", |b, v| b.soft_drop_mass = v),
        ]
    }

    fn default_preselection(&self) -> Preselection<Ak8Jet> {
        Preselection::none().min_pt(30.0).max_abs_eta(3.0)
    }

    fn finish(&self, kin: Kinematics, f: Ak8Fields) -> Ak8Jet {
        Ak8Jet { kin, f }
    }
}
