//! # gg-core
//!
//! Core types shared by the gganalyze crates: the error taxonomy, four-momenta
//! and angular helpers, discriminator working points, and the run
//! configuration used to normalize simulated samples.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod kinematics;
pub mod run_config;
pub mod working_point;

pub use error::{Error, ErrorClass, Result};
pub use kinematics::{FourMomentum, Kinematics, Param, delta_phi, transverse_mass};
pub use run_config::RunConfig;
pub use working_point::{
    LooseTightFlags, WorkingPoint, WorkingPointFlags, test_bit_i32, test_bit_u64,
};
