//! # gg-objects
//!
//! Physics-object factories. Each collection in a ggNtuplizer tree (muons,
//! jets, boosted taus, ...) is described by an [`ObjectKind`]: its count and
//! four-momentum branches plus a table of auxiliary field bindings. An
//! [`ObjectFactory`] binds those branches once, then rebuilds the records of
//! each event, applies the kind's preselection and sorts by descending pt.
//!
//! ```no_run
//! use gg_objects::{Muons, ObjectFactory, PhysicsObject};
//! use gg_tree::TreeFile;
//!
//! let file = TreeFile::open("ntuple.json").unwrap();
//! let tree = file.get_tree("ggNtuplizer/EventTree").unwrap();
//! let mut muons = ObjectFactory::new(Muons, tree, false).unwrap();
//! muons.run(0).unwrap();
//! for mu in muons.objects() {
//!     println!("{:.1} {:+}", mu.pt(), mu.charge());
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ak8;
pub mod binding;
pub mod electron;
pub mod event;
pub mod factory;
pub mod generator;
pub mod jet;
pub mod muon;
pub mod tau;

pub use ak8::{Ak8Jet, Ak8Jets};
pub use binding::Binding;
pub use electron::{Electron, Electrons};
pub use event::{EventInfo, EventInfoFactory};
pub use factory::{ObjectFactory, ObjectKind, PhysicsObject, Preselection};
pub use generator::{GenJets, GenParticle, GenParticles};
pub use jet::{Jet, Jets, count_btags, ht, mht};
pub use muon::{Muon, Muons};
pub use tau::{Tau, Taus};
