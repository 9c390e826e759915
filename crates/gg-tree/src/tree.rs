//! Event trees: a fixed number of entries and a set of named columns.

use std::collections::BTreeMap;

use gg_core::{Error, Result};

use crate::column::{Column, ColumnData};

/// Read access to a columnar per-event store.
///
/// Factories bind to columns by name once, then read them by event index.
pub trait EventSource {
    /// Tree name (e.g. `ggNtuplizer/EventTree`).
    fn name(&self) -> &str;

    /// Number of events.
    fn entries(&self) -> usize;

    /// Look up a column by name.
    fn column(&self, name: &str) -> Result<&Column>;

    /// Whether a column exists.
    fn has_column(&self, name: &str) -> bool {
        self.column(name).is_ok()
    }
}

/// An in-memory event tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    name: String,
    entries: usize,
    columns: BTreeMap<String, Column>,
}

impl Tree {
    /// Create an empty tree with a fixed entry count.
    pub fn new(name: impl Into<String>, entries: usize) -> Self {
        Self { name: name.into(), entries, columns: BTreeMap::new() }
    }

    /// Add a column; its entry count must match the tree.
    pub fn insert(&mut self, column: Column) -> Result<()> {
        if column.n_entries() != self.entries {
            return Err(Error::Validation(format!(
                "tree '{}': column '{}' has {} entries, tree has {}",
                self.name,
                column.name(),
                column.n_entries(),
                self.entries
            )));
        }
        if self.columns.contains_key(column.name()) {
            return Err(Error::Validation(format!(
                "tree '{}': duplicate column '{}'",
                self.name,
                column.name()
            )));
        }
        self.columns.insert(column.name().to_string(), column);
        Ok(())
    }

    /// All column names, sorted.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.keys().map(String::as_str).collect()
    }
}

impl EventSource for Tree {
    fn name(&self) -> &str {
        &self.name
    }

    fn entries(&self) -> usize {
        self.entries
    }

    fn column(&self, name: &str) -> Result<&Column> {
        self.columns.get(name).ok_or_else(|| Error::UnknownBranch(name.to_string()))
    }
}

/// Convenience builder for synthetic trees (tests, fixtures).
///
/// ```
/// use gg_tree::{EventSource, TreeBuilder};
///
/// let tree = TreeBuilder::new("ggNtuplizer/EventTree", 2)
///     .counts("nMu", &[1, 0])
///     .jagged_f32("muPt", &[vec![31.0], vec![]])
///     .build()
///     .unwrap();
/// assert_eq!(tree.entries(), 2);
/// ```
pub struct TreeBuilder {
    tree: Tree,
    pending: Vec<Result<Column>>,
}

impl TreeBuilder {
    /// Start a tree with `entries` events.
    pub fn new(name: impl Into<String>, entries: usize) -> Self {
        Self { tree: Tree::new(name, entries), pending: Vec::new() }
    }

    /// Add any prebuilt column.
    pub fn column(mut self, column: Column) -> Self {
        self.pending.push(Ok(column));
        self
    }

    /// Scalar `i32` branch, typically an object count like `nMu`.
    pub fn counts(self, name: &str, values: &[i32]) -> Self {
        self.column(Column::scalar(name, ColumnData::I32(values.to_vec())))
    }

    /// Scalar `f32` branch.
    pub fn scalar_f32(self, name: &str, values: &[f32]) -> Self {
        self.column(Column::scalar(name, ColumnData::F32(values.to_vec())))
    }

    /// Scalar `i64` branch.
    pub fn scalar_i64(self, name: &str, values: &[i64]) -> Self {
        self.column(Column::scalar(name, ColumnData::I64(values.to_vec())))
    }

    /// Scalar `u64` branch.
    pub fn scalar_u64(self, name: &str, values: &[u64]) -> Self {
        self.column(Column::scalar(name, ColumnData::U64(values.to_vec())))
    }

    /// Jagged `f32` branch.
    pub fn jagged_f32(self, name: &str, rows: &[Vec<f32>]) -> Self {
        let (flat, offsets) = flatten(rows);
        self.push_jagged(name, ColumnData::F32(flat), offsets)
    }

    /// Jagged `i32` branch.
    pub fn jagged_i32(self, name: &str, rows: &[Vec<i32>]) -> Self {
        let (flat, offsets) = flatten(rows);
        self.push_jagged(name, ColumnData::I32(flat), offsets)
    }

    /// Jagged `u64` branch.
    pub fn jagged_u64(self, name: &str, rows: &[Vec<u64>]) -> Self {
        let (flat, offsets) = flatten(rows);
        self.push_jagged(name, ColumnData::U64(flat), offsets)
    }

    /// Jagged `bool` branch.
    pub fn jagged_bool(self, name: &str, rows: &[Vec<bool>]) -> Self {
        let (flat, offsets) = flatten(rows);
        self.push_jagged(name, ColumnData::Bool(flat), offsets)
    }

    /// Finish, validating every column.
    pub fn build(self) -> Result<Tree> {
        let mut tree = self.tree;
        for col in self.pending {
            tree.insert(col?)?;
        }
        Ok(tree)
    }

    fn push_jagged(mut self, name: &str, data: ColumnData, offsets: Vec<usize>) -> Self {
        self.pending.push(Column::jagged(name, data, offsets));
        self
    }
}

fn flatten<T: Copy>(rows: &[Vec<T>]) -> (Vec<T>, Vec<usize>) {
    let mut flat = Vec::with_capacity(rows.iter().map(Vec::len).sum());
    let mut offsets = Vec::with_capacity(rows.len() + 1);
    offsets.push(0);
    for row in rows {
        flat.extend_from_slice(row);
        offsets.push(flat.len());
    }
    (flat, offsets)
}
