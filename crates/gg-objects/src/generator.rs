//! Generator-level particles and jets (simulation only).

use gg_core::{FourMomentum, Kinematics, Param};

use crate::binding::Binding;
use crate::factory::{ObjectKind, PhysicsObject};

/// One generator particle.
#[derive(Debug, Clone, PartialEq)]
pub struct GenParticle {
    kin: Kinematics,
    f: GenFields,
}

/// Auxiliary generator-particle fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenFields {
    pid: i32,
    mom_pid: i32,
    gmom_pid: i32,
    status: i32,
    parentage: i32,
    mom_pt: f32,
    mom_eta: f32,
    mom_phi: f32,
    mom_mass: f32,
    vtx: f32,
    vty: f32,
    vtz: f32,
}

impl GenParticle {
    /// PDG id.
    pub fn pid(&self) -> i32 {
        self.f.pid
    }

    /// Mother PDG id.
    pub fn mom_pid(&self) -> i32 {
        self.f.mom_pid
    }

    /// Grandmother PDG id.
    pub fn gmom_pid(&self) -> i32 {
        self.f.gmom_pid
    }

    /// Generator status code.
    pub fn status(&self) -> i32 {
        self.f.status
    }

    /// Parentage flags.
    pub fn parentage(&self) -> i32 {
        self.f.parentage
    }

    /// Production vertex.
    pub fn vertex(&self) -> (f32, f32, f32) {
        (self.f.vtx, self.f.vty, self.f.vtz)
    }

    /// Mother four-momentum, built from `(pt, eta, phi, mass)`.
    pub fn mom_p4(&self) -> FourMomentum {
        let f = &self.f;
        FourMomentum::from_pt_eta_phi_m(
            f64::from(f.mom_pt),
            f64::from(f.mom_eta),
            f64::from(f.mom_phi),
            f64::from(f.mom_mass),
        )
    }
}

impl PhysicsObject for GenParticle {
    fn kinematics(&self) -> &Kinematics {
        &self.kin
    }
}

/// Generator particles (`nMC`, `mcPt`, ...), mass parameterization.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenParticles;

impl ObjectKind for GenParticles {
    type Record = GenParticle;
    type Builder = GenFields;

    fn name(&self) -> &str {
        "gen particle"
    }

    fn count_branch(&self) -> Option<&str> {
        Some("nMC")
    }

    fn p4_branches(&self) -> [&str; 4] {
        ["mcPt", "mcEta", "mcPhi", "mcMass"]
    }

    fn param(&self) -> Param {
        Param::Mass
    }

    fn bindings(&self) -> Vec<Binding<GenFields>> {
        vec![
            Binding::i32("mcPID", |b, v| b.pid = v),
            Binding::i32("mcMomPID", |b, v| b.mom_pid = v),
            Binding::i32("mcGMomPID", |b, v| b.gmom_pid = v),
            Binding::i32("mcStatus", |b, v| b.status = v),
            Binding::i32("mcParentage", |b, v| b.parentage = v),
            Binding::f32("mcMomPt", |b, v| b.mom_pt = v),
            Binding::f32("mcMomEta", |b, v| b.mom_eta = v),
            Binding::f32("mcMomPhi", |b, v| b.mom_phi = v),
            Binding::f32("mcMomMass", |b, v| b.mom_mass = v),
            Binding::f32("mcVtx", |b, v| b.vtx = v),
            Binding::f32("mcVty", |b, v| b.vty = v),
            Binding::f32("mcVtz", |b, v| b.vtz = v),
        ]
    }

    fn finish(&self, kin: Kinematics, f: GenFields) -> GenParticle {
        GenParticle { kin, f }
    }

    fn mc_only(&self) -> bool {
        true
    }
}

/// Generator jets matched to reco jets (`jetGenJet*`), energy
/// parameterization. The collection has no count branch of its own.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenJets;

impl ObjectKind for GenJets {
    type Record = Kinematics;
    type Builder = ();

    fn name(&self) -> &str {
        "gen jet"
    }

    fn count_branch(&self) -> Option<&str> {
        None
    }

    fn p4_branches(&self) -> [&str; 4] {
        ["jetGenJetPt", "jetGenJetEta", "jetGenJetPhi", "jetGenJetEn"]
    }

    fn param(&self) -> Param {
        Param::Energy
    }

    fn bindings(&self) -> Vec<Binding<()>> {
        Vec::new()
    }

    fn finish(&self, kin: Kinematics, _: ()) -> Kinematics {
        kin
    }

    fn mc_only(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn mother_uses_mass() {
        let g = GenParticles.finish(
            Kinematics::from_pt_eta_phi_m(20.0, 0.0, 0.0, 0.1),
            GenFields { mom_pt: 40.0, mom_mass: 91.2, mom_pid: 23, ..Default::default() },
        );
        assert_relative_eq!(g.mom_p4().mass(), 91.2, epsilon = 1e-4);
        assert_eq!(g.mom_pid(), 23);
    }
}
