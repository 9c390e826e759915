//! Small-radius (AK4) jets and event-level jet sums.

use gg_core::{FourMomentum, Kinematics, Param};

use crate::binding::Binding;
use crate::factory::{ObjectKind, PhysicsObject, Preselection};

/// CSVv2 medium working point.
pub const CSV2_MEDIUM: f32 = 0.4941;

/// One AK4 jet.
#[derive(Debug, Clone, PartialEq)]
pub struct Jet {
    kin: Kinematics,
    f: JetFields,
}

/// Auxiliary jet fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JetFields {
    raw_pt: f32,
    raw_en: f32,
    mt: f32,
    area: f32,
    lead_track_pt: f32,
    csv2: f32,
    deep_csv_b: f32,
    deep_csv_bb: f32,
    deep_csv_c: f32,
    deep_csv_udsg: f32,
    parton_id: i32,
    hadron_flavour: i32,
    pf_loose_id: bool,
    id: i32,
    pu_id: f32,
    pu_full_id: i32,
    jec_unc: f32,
    fired_trgs: u64,
    chf: f32,
    nhf: f32,
    cef: f32,
    nef: f32,
    nch: i32,
    nnp: i32,
    muf: f32,
}

impl Jet {
    /// CSVv2 b-tag discriminator.
    pub fn csv2(&self) -> f32 {
        self.f.csv2
    }

    /// Passes the CSVv2 medium working point.
    pub fn is_btagged(&self) -> bool {
        self.f.csv2 > CSV2_MEDIUM
    }

    /// DeepCSV probabilities `(b, bb, c, udsg)`.
    pub fn deep_csv(&self) -> (f32, f32, f32, f32) {
        (self.f.deep_csv_b, self.f.deep_csv_bb, self.f.deep_csv_c, self.f.deep_csv_udsg)
    }

    /// Uncorrected pt.
    pub fn raw_pt(&self) -> f32 {
        self.f.raw_pt
    }

    /// Uncorrected energy.
    pub fn raw_energy(&self) -> f32 {
        self.f.raw_en
    }

    /// Transverse mass.
    pub fn mt(&self) -> f32 {
        self.f.mt
    }

    /// Catchment area.
    pub fn area(&self) -> f32 {
        self.f.area
    }

    /// Leading track pt.
    pub fn lead_track_pt(&self) -> f32 {
        self.f.lead_track_pt
    }

    /// Parton flavour (simulation only, 0 on data).
    pub fn parton_id(&self) -> i32 {
        self.f.parton_id
    }

    /// Hadron flavour (simulation only, 0 on data).
    pub fn hadron_flavour(&self) -> i32 {
        self.f.hadron_flavour
    }

    /// PF loose jet ID.
    pub fn pf_loose_id(&self) -> bool {
        self.f.pf_loose_id
    }

    /// Packed jet ID word.
    pub fn id(&self) -> i32 {
        self.f.id
    }

    /// Pileup ID MVA.
    pub fn pu_id(&self) -> f32 {
        self.f.pu_id
    }

    /// Packed pileup ID flags.
    pub fn pu_full_id(&self) -> i32 {
        self.f.pu_full_id
    }

    /// Jet energy correction uncertainty.
    pub fn jec_uncertainty(&self) -> f32 {
        self.f.jec_unc
    }

    /// HLT filter bits matched to this jet.
    pub fn fired_triggers(&self) -> u64 {
        self.f.fired_trgs
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

impl PhysicsObject for Jet {
    fn kinematics(&self) -> &Kinematics {
        &self.kin
    }
}

/// AK4 jet collection. Default preselection: `pt >= 30`, `|eta| <= 3`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Jets;

impl ObjectKind for Jets {
    type Record = Jet;
    type Builder = JetFields;

    fn name(&self) -> &str {
        "jet"
    }

    fn count_branch(&self) -> Option<&str> {
        Some("nJet")
    }

    fn p4_branches(&self) -> [&str; 4] {
        ["jetPt", "jetEta", "jetPhi", "jetEn"]
    }

    fn param(&self) -> Param {
        Param::Energy
    }

    fn bindings(&self) -> Vec<Binding<JetFields>> {
        vec![
            Binding::f32("jetRawPt", |b, v| b.raw_pt = v),
            Binding::f32("jetRawEn", |b, v| b.raw_en = v),
            Binding::f32("jetMt", |b, v| b.mt = v),
            Binding::f32("jetArea", |b, v| b.area = v),
            Binding::f32("jetLeadTrackPt", |b, v| b.lead_track_pt = v),
            Binding::f32("jetCSV2BJetTags", |b, v| b.csv2 = v),
            Binding::f32("jetDeepCSVTags_b", |b, v| b.deep_csv_b = v),
            Binding::f32("jetDeepCSVTags_bb", |b, v| b.deep_csv_bb = v),
            Binding::f32("jetDeepCSVTags_c", |b, v| b.deep_csv_c = v),
            Binding::f32("jetDeepCSVTags_udsg", |b, v| b.deep_csv_udsg = v),
            Binding::i32("jetPartonID", |b: &mut JetFields, v| b.parton_id = v).mc_only(),
            Binding::i32("jetHadFlvr", |b: &mut JetFields, v| b.hadron_flavour = v).mc_only(),
            Binding::bool("jetPFLooseId", |b, v| b.pf_loose_id = v),
            Binding::i32("jetID", |b, v| b.id = v),
            Binding::f32("jetPUID", |b, v| b.pu_id = v),
            Binding::i32("jetPUFullID", |b, v| b.pu_full_id = v),
            Binding::f32("jetJECUnc", |b, v| b.jec_unc = v),
            Binding::u64("jetFiredTrgs", |b, v| b.fired_trgs = v),
            Binding::f32("jetCHF", |b, v| b.chf = v),
            Binding::f32("jetNHF", |b, v| b.nhf = v),
            Binding::f32("jetCEF", |b, v| b.cef = v),
            Binding::f32("jetNEF", |b, v| b.nef = v),
            Binding::i32("jetNCH", |b, v| b.nch = v),
            Binding::i32("jetNNP", |b, v| b.nnp = v),
            Binding::f32("jetMUF", |b, v| b.muf = v),
        ]
    }

    fn default_preselection(&self) -> Preselection<Jet> {
        Preselection::none().min_pt(30.0).max_abs_eta(3.0)
    }

    fn finish(&self, kin: Kinematics, f: JetFields) -> Jet {
        Jet { kin, f }
    }
}

/// Number of b-tagged jets.
pub fn count_btags(jets: &[Jet]) -> usize {
    jets.iter().filter(|j| j.is_btagged()).count()
}

/// Scalar sum of jet pt.
pub fn ht<O: PhysicsObject>(objects: &[O]) -> f64 {
    objects.iter().map(PhysicsObject::pt).sum()
}

/// Vector sum of jet four-momenta; its pt is the MHT.
pub fn mht<O: PhysicsObject>(objects: &[O]) -> FourMomentum {
    objects.iter().map(PhysicsObject::p4).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn jet(pt: f64, phi: f64, csv2: f32) -> Jet {
        Jets.finish(
            Kinematics::from_pt_eta_phi_e(pt, 0.0, phi, pt),
            JetFields { csv2, ..Default::default() },
        )
    }

    #[test]
    fn btag_threshold_is_strict() {
        let jets = [jet(50.0, 0.0, 0.9), jet(40.0, 1.0, CSV2_MEDIUM), jet(35.0, 2.0, 0.1)];
        assert_eq!(count_btags(&jets), 1);
    }

    #[test]
    fn ht_and_mht() {
        let jets = [jet(100.0, 0.0, 0.0), jet(100.0, std::f64::consts::PI, 0.0)];
        assert_relative_eq!(ht(&jets), 200.0);
        assert!(mht(&jets).pt() < 1e-9);
        assert_relative_eq!(ht::<Jet>(&[]), 0.0);
    }

    #[test]
    fn mc_only_bindings() {
        let mc: Vec<_> = Jets.bindings().into_iter().filter(|b| b.is_mc_only()).collect();
        let names: Vec<&str> = mc.iter().map(|b| b.branch()).collect();
        assert_eq!(names, vec!["jetPartonID", "jetHadFlvr"]);
    }
}
