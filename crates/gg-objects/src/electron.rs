//! Reconstructed electrons.

use gg_core::{Kinematics, Param, Result, test_bit_i32};

use crate::binding::Binding;
use crate::factory::{ObjectKind, PhysicsObject};

/// One electron.
#[derive(Debug, Clone, PartialEq)]
pub struct Electron {
    kin: Kinematics,
    f: ElectronFields,
}

/// Auxiliary electron fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElectronFields {
    charge: i32,
    id_bits: i32,
    sc_eta: f32,
    mva_iso: f32,
    mva_no_iso: f32,
    d0: f32,
    dz: f32,
    sip: f32,
    pf_ch_iso: f32,
    pf_pho_iso: f32,
    pf_neu_iso: f32,
    pf_pu_iso: f32,
}

impl Electron {
    /// Electric charge.
    pub fn charge(&self) -> i32 {
        self.f.charge
    }

    /// Bit `bit` of the packed ID word (`eleIDbit`).
    pub fn passes_id(&self, bit: u32) -> Result<bool> {
        test_bit_i32(self.f.id_bits, bit, "eleIDbit")
    }

    /// Supercluster pseudorapidity.
    pub fn sc_eta(&self) -> f32 {
        self.f.sc_eta
    }

    /// ID MVA score trained with isolation inputs.
    pub fn id_mva_iso(&self) -> f32 {
        self.f.mva_iso
    }

    /// ID MVA score without isolation inputs.
    pub fn id_mva_no_iso(&self) -> f32 {
        self.f.mva_no_iso
    }

    /// Impact parameters `(d0, dz, sip)`.
    pub fn impact(&self) -> (f32, f32, f32) {
        (self.f.d0, self.f.dz, self.f.sip)
    }

    /// Delta-beta corrected relative PF isolation.
    pub fn rel_pf_iso(&self) -> f64 {
        let f = &self.f;
        let neutral = f64::from(f.pf_neu_iso) + f64::from(f.pf_pho_iso) - 0.5 * f64::from(f.pf_pu_iso);
        (f64::from(f.pf_ch_iso) + neutral.max(0.0)) / self.pt()
    }
}

impl PhysicsObject for Electron {
    fn kinematics(&self) -> &Kinematics {
        &self.kin
    }
}

/// Electron collection (`nEle`, `elePt`, ...). No default preselection.
#[derive(Debug, Clone, Copy, Default)]
pub struct Electrons;

impl ObjectKind for Electrons {
    type Record = Electron;
    type Builder = ElectronFields;

    fn name(&self) -> &str {
        "electron"
    }

    fn count_branch(&self) -> Option<&str> {
        Some("nEle")
    }

    fn p4_branches(&self) -> [&str; 4] {
        ["elePt", "eleEta", "elePhi", "eleEn"]
    }

    fn param(&self) -> Param {
        Param::Energy
    }

    fn bindings(&self) -> Vec<Binding<ElectronFields>> {
        vec![
            Binding::i32("eleCharge", |b, v| b.charge = v),
            Binding::i32("eleIDbit", |b, v| b.id_bits = v),
            Binding::f32("eleSCEta", |b, v| b.sc_eta = v),
            Binding::f32("eleIDMVAIso", |b, v| b.mva_iso = v),
            Binding::f32("eleIDMVANoIso", |b, v| b.mva_no_iso = v),
            Binding::f32("eleD0", |b, v| b.d0 = v),
            Binding::f32("eleDz", |b, v| b.dz = v),
            Binding::f32("eleSIP", |b, v| b.sip = v),
            Binding::f32("elePFChIso", |b, v| b.pf_ch_iso = v),
            Binding::f32("elePFPhoIso", |b, v| b.pf_pho_iso = v),
            Binding::f32("elePFNeuIso", |b, v| b.pf_neu_iso = v),
            Binding::f32("elePFPUIso", |b, v| b.pf_pu_iso = v),
        ]
    }

    fn finish(&self, kin: Kinematics, f: ElectronFields) -> Electron {
        Electron { kin, f }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gg_core::Error;

    #[test]
    fn id_bit_range() {
        let e = Electrons.finish(
            Kinematics::from_pt_eta_phi_e(30.0, 0.0, 0.0, 30.0),
            ElectronFields { id_bits: 1 << 31, ..Default::default() },
        );
        assert!(e.passes_id(31).unwrap());
        assert!(matches!(e.passes_id(40), Err(Error::InvalidBit { field: "eleIDbit", .. })));
    }
}
