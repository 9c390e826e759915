//! # gg-tree
//!
//! Columnar input store for gganalyze. A tree has a fixed number of events
//! and named branches that are either scalar (one value per event) or jagged
//! (a variable-length array per event, like `std::vector<float>` branches in
//! ggNtuplizer output).
//!
//! ## Example
//!
//! ```no_run
//! use gg_tree::{EventSource, TreeFile};
//!
//! let f = TreeFile::open("ntuple.json").unwrap();
//! let tree = f.get_tree("ggNtuplizer/EventTree").unwrap();
//! let pt = tree.column("muPt").unwrap();
//! for event in 0..tree.entries() {
//!     println!("{} muons", pt.entry_len(event).unwrap());
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod column;
pub mod file;
pub mod tree;

pub use column::{Column, ColumnData, ColumnType, Value};
pub use file::TreeFile;
pub use tree::{EventSource, Tree, TreeBuilder};
