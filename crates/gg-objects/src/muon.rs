//! Reconstructed muons.

use gg_core::{Kinematics, Param, Result, test_bit_i32};

use crate::binding::Binding;
use crate::factory::{ObjectKind, PhysicsObject, Preselection};

/// One muon.
#[derive(Debug, Clone, PartialEq)]
pub struct Muon {
    kin: Kinematics,
    f: MuonFields,
}

/// Auxiliary muon fields, filled from the `mu*` branches.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MuonFields {
    fired_trgs: u64,
    fired_l1_trgs: u64,
    charge: i32,
    kind: i32,
    id_bits: i32,
    muon_hits: i32,
    stations: i32,
    matches: i32,
    trk_quality: i32,
    d0: f32,
    dz: f32,
    sip: f32,
    chi2_ndf: f32,
    inner_d0: f32,
    inner_dz: f32,
    iso_trk: f32,
    pf_ch_iso: f32,
    pf_pho_iso: f32,
    pf_neu_iso: f32,
    pf_pu_iso: f32,
}

impl Muon {
    /// Electric charge.
    pub fn charge(&self) -> i32 {
        self.f.charge
    }

    /// Bit `bit` of the packed ID word (`muIDbit`). Bit 2 is the medium ID.
    pub fn passes_id(&self, bit: u32) -> Result<bool> {
        test_bit_i32(self.f.id_bits, bit, "muIDbit")
    }

    /// Raw packed ID word.
    pub fn id_bits(&self) -> i32 {
        self.f.id_bits
    }

    /// HLT filter bits matched to this muon.
    pub fn fired_triggers(&self) -> u64 {
        self.f.fired_trgs
    }

    /// L1 seed bits matched to this muon.
    pub fn fired_l1_triggers(&self) -> u64 {
        self.f.fired_l1_trgs
    }

    /// Reconstruction type bits.
    pub fn muon_type(&self) -> i32 {
        self.f.kind
    }

    /// Hits in the muon system.
    pub fn muon_hits(&self) -> i32 {
        self.f.muon_hits
    }

    /// Matched muon stations.
    pub fn stations(&self) -> i32 {
        self.f.stations
    }

    /// Matched segments.
    pub fn matches(&self) -> i32 {
        self.f.matches
    }

    /// Inner-track quality flag.
    pub fn track_quality(&self) -> i32 {
        self.f.trk_quality
    }

    /// Transverse impact parameter.
    pub fn d0(&self) -> f32 {
        self.f.d0
    }

    /// Longitudinal impact parameter.
    pub fn dz(&self) -> f32 {
        self.f.dz
    }

    /// 3-D impact parameter significance.
    pub fn sip(&self) -> f32 {
        self.f.sip
    }

    /// Global-track fit quality.
    pub fn chi2_ndf(&self) -> f32 {
        self.f.chi2_ndf
    }

    /// Inner-track d0.
    pub fn inner_d0(&self) -> f32 {
        self.f.inner_d0
    }

    /// Inner-track dz.
    pub fn inner_dz(&self) -> f32 {
        self.f.inner_dz
    }

    /// Tracker isolation.
    pub fn iso_trk(&self) -> f32 {
        self.f.iso_trk
    }

    /// Delta-beta corrected relative PF isolation.
    pub fn rel_pf_iso(&self) -> f64 {
        let f = &self.f;
        let neutral = f64::from(f.pf_neu_iso) + f64::from(f.pf_pho_iso) - 0.5 * f64::from(f.pf_pu_iso);
        (f64::from(f.pf_ch_iso) + neutral.max(0.0)) / self.pt()
    }
}

impl PhysicsObject for Muon {
    fn kinematics(&self) -> &Kinematics {
        &self.kin
    }
}

/// Muon collection (`nMu`, `muPt`, ...).
///
/// Default preselection: `pt >= 30`, `|eta| <= 2.3`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Muons;

impl ObjectKind for Muons {
    type Record = Muon;
    type Builder = MuonFields;

    fn name(&self) -> &str {
        "muon"
    }

    fn count_branch(&self) -> Option<&str> {
        Some("nMu")
    }

    fn p4_branches(&self) -> [&str; 4] {
        ["muPt", "muEta", "muPhi", "muEn"]
    }

    fn param(&self) -> Param {
        Param::Energy
    }

    fn bindings(&self) -> Vec<Binding<MuonFields>> {
        vec![
            Binding::u64("muFiredTrgs", |b, v| b.fired_trgs = v),
            Binding::u64("muFiredL1Trgs", |b, v| b.fired_l1_trgs = v),
            Binding::i32("muCharge", |b, v| b.charge = v),
            Binding::i32("muType", |b, v| b.kind = v),
            Binding::i32("muIDbit", |b, v| b.id_bits = v),
            Binding::i32("muMuonHits", |b, v| b.muon_hits = v),
            Binding::i32("muStations", |b, v| b.stations = v),
            Binding::i32("muMatches", |b, v| b.matches = v),
            Binding::i32("muTrkQuality", |b, v| b.trk_quality = v),
            Binding::f32("muD0", |b, v| b.d0 = v),
            Binding::f32("muDz", |b, v| b.dz = v),
            Binding::f32("muSIP", |b, v| b.sip = v),
            Binding::f32("muChi2NDF", |b, v| b.chi2_ndf = v),
            Binding::f32("muInnerD0", |b, v| b.inner_d0 = v),
            Binding::f32("muInnerDz", |b, v| b.inner_dz = v),
            Binding::f32("muIsoTrk", |b, v| b.iso_trk = v),
            Binding::f32("muPFChIso", |b, v| b.pf_ch_iso = v),
            Binding::f32("muPFPhoIso", |b, v| b.pf_pho_iso = v),
            Binding::f32("muPFNeuIso", |b, v| b.pf_neu_iso = v),
            Binding::f32("muPFPUIso", |b, v| b.pf_pu_iso = v),
        ]
    }

    fn default_preselection(&self) -> Preselection<Muon> {
        Preselection::none().min_pt(30.0).max_abs_eta(2.3)
    }

    fn finish(&self, kin: Kinematics, f: MuonFields) -> Muon {
        Muon { kin, f }
    }
}
