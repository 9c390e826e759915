//! Four-momenta and angular helpers.
//!
//! Ntuple branches store objects in collider coordinates `(pt, eta, phi, X)`
//! where `X` is either the energy or the invariant mass depending on the
//! object kind. Feeding a mass into the energy slot (or the reverse) gives a
//! different vector.

use std::f64::consts::PI;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};

/// Which quantity the fourth collider coordinate holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Param {
    /// `(pt, eta, phi, E)`.
    Energy,
    /// `(pt, eta, phi, m)`.
    Mass,
}

/// Cartesian four-momentum `(px, py, pz, E)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FourMomentum {
    /// x component.
    pub px: f64,
    /// y component.
    pub py: f64,
    /// z component.
    pub pz: f64,
    /// Energy.
    pub e: f64,
}

impl FourMomentum {
    /// Construct from Cartesian components.
    pub fn new(px: f64, py: f64, pz: f64, e: f64) -> Self {
        Self { px, py, pz, e }
    }

    /// Construct from `(pt, eta, phi, E)`.
    pub fn from_pt_eta_phi_e(pt: f64, eta: f64, phi: f64, e: f64) -> Self {
        let pt = pt.abs();
        Self { px: pt * phi.cos(), py: pt * phi.sin(), pz: pt * eta.sinh(), e }
    }

    /// Construct from `(pt, eta, phi, m)`.
    ///
    /// A negative mass is treated as space-like, matching `TLorentzVector`.
    pub fn from_pt_eta_phi_m(pt: f64, eta: f64, phi: f64, m: f64) -> Self {
        let pt = pt.abs();
        let (px, py, pz) = (pt * phi.cos(), pt * phi.sin(), pt * eta.sinh());
        let p2 = px * px + py * py + pz * pz;
        let e = if m >= 0.0 { (p2 + m * m).sqrt() } else { (p2 - m * m).max(0.0).sqrt() };
        Self { px, py, pz, e }
    }

    /// Construct from collider coordinates with an explicit parameterization.
    pub fn from_collider(pt: f64, eta: f64, phi: f64, fourth: f64, param: Param) -> Self {
        match param {
            Param::Energy => Self::from_pt_eta_phi_e(pt, eta, phi, fourth),
            Param::Mass => Self::from_pt_eta_phi_m(pt, eta, phi, fourth),
        }
    }

    /// Transverse momentum.
    #[inline]
    pub fn pt(&self) -> f64 {
        self.px.hypot(self.py)
    }

    /// Magnitude of the three-momentum.
    #[inline]
    pub fn p(&self) -> f64 {
        (self.px * self.px + self.py * self.py + self.pz * self.pz).sqrt()
    }

    /// Pseudorapidity. Vectors along the beam axis return `±1e10`.
    pub fn eta(&self) -> f64 {
        let pt = self.pt();
        if pt > 0.0 {
            (self.pz / pt).asinh()
        } else if self.pz == 0.0 {
            0.0
        } else {
            1e10_f64.copysign(self.pz)
        }
    }

    /// Azimuthal angle in `(-pi, pi]`.
    #[inline]
    pub fn phi(&self) -> f64 {
        if self.px == 0.0 && self.py == 0.0 { 0.0 } else { self.py.atan2(self.px) }
    }

    /// Squared invariant mass.
    #[inline]
    pub fn m2(&self) -> f64 {
        self.e * self.e - self.p() * self.p()
    }

    /// Invariant mass; space-like vectors return `-sqrt(-m2)`.
    pub fn mass(&self) -> f64 {
        let m2 = self.m2();
        if m2 < 0.0 { -(-m2).sqrt() } else { m2.sqrt() }
    }

    /// Energy.
    #[inline]
    pub fn energy(&self) -> f64 {
        self.e
    }

    /// Transverse energy `E * pt / p`.
    pub fn et(&self) -> f64 {
        let p = self.p();
        if p == 0.0 { 0.0 } else { self.e * self.pt() / p }
    }

    /// Azimuthal separation wrapped into `[-pi, pi]`.
    pub fn delta_phi(&self, other: &FourMomentum) -> f64 {
        delta_phi(self.phi(), other.phi())
    }

    /// `sqrt(deta^2 + dphi^2)`.
    pub fn delta_r(&self, other: &FourMomentum) -> f64 {
        let deta = self.eta() - other.eta();
        let dphi = self.delta_phi(other);
        (deta * deta + dphi * dphi).sqrt()
    }
}

impl Add for FourMomentum {
    type Output = FourMomentum;

    fn add(self, rhs: FourMomentum) -> FourMomentum {
        FourMomentum {
            px: self.px + rhs.px,
            py: self.py + rhs.py,
            pz: self.pz + rhs.pz,
            e: self.e + rhs.e,
        }
    }
}

impl AddAssign for FourMomentum {
    fn add_assign(&mut self, rhs: FourMomentum) {
        *self = *self + rhs;
    }
}

impl Sum for FourMomentum {
    fn sum<I: Iterator<Item = FourMomentum>>(iter: I) -> Self {
        iter.fold(FourMomentum::default(), Add::add)
    }
}

impl<'a> Sum<&'a FourMomentum> for FourMomentum {
    fn sum<I: Iterator<Item = &'a FourMomentum>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

/// An object as stored in the ntuple: the `(pt, eta, phi)` branch values
/// together with the four-momentum built from them.
///
/// Cuts and orderings read the stored values. Recomputing pt or eta from the
/// Cartesian components rounds differently and moves objects that sit exactly
/// on a threshold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Kinematics {
    pt: f64,
    eta: f64,
    phi: f64,
    p4: FourMomentum,
}

impl Kinematics {
    /// Build from collider coordinates with an explicit parameterization.
    pub fn from_collider(pt: f64, eta: f64, phi: f64, fourth: f64, param: Param) -> Self {
        Self { pt, eta, phi, p4: FourMomentum::from_collider(pt, eta, phi, fourth, param) }
    }

    /// Build from `(pt, eta, phi, E)`.
    pub fn from_pt_eta_phi_e(pt: f64, eta: f64, phi: f64, e: f64) -> Self {
        Self::from_collider(pt, eta, phi, e, Param::Energy)
    }

    /// Build from `(pt, eta, phi, m)`.
    pub fn from_pt_eta_phi_m(pt: f64, eta: f64, phi: f64, m: f64) -> Self {
        Self::from_collider(pt, eta, phi, m, Param::Mass)
    }

    /// Stored transverse momentum.
    #[inline]
    pub fn pt(&self) -> f64 {
        self.pt
    }

    /// Stored pseudorapidity.
    #[inline]
    pub fn eta(&self) -> f64 {
        self.eta
    }

    /// Stored azimuth.
    #[inline]
    pub fn phi(&self) -> f64 {
        self.phi
    }

    /// Four-momentum.
    #[inline]
    pub fn p4(&self) -> &FourMomentum {
        &self.p4
    }
}

/// Difference of two azimuthal angles wrapped into `[-pi, pi]`.
pub fn delta_phi(phi1: f64, phi2: f64) -> f64 {
    let mut d = phi1 - phi2;
    while d > PI {
        d -= 2.0 * PI;
    }
    while d < -PI {
        d += 2.0 * PI;
    }
    d
}

/// Transverse mass of a two-body system, `sqrt((pt1+pt2)^2 - |pT1+pT2|^2)`.
///
/// Rounding can push the radicand slightly below zero for collinear inputs;
/// it is clamped to zero.
pub fn transverse_mass(a: &FourMomentum, b: &FourMomentum) -> f64 {
    let et = a.pt() + b.pt();
    let px = a.px + b.px;
    let py = a.py + b.py;
    (et * et - px * px - py * py).max(0.0).sqrt()
}
