//! JSON-backed input files holding event trees and auxiliary named objects.
//!
//! Layout:
//!
//! ```json
//! {
//!   "trees": {
//!     "ggNtuplizer/EventTree": {
//!       "entries": 2,
//!       "branches": {
//!         "nMu":  { "type": "i32", "data": [1, 0] },
//!         "muPt": { "type": "f32", "data": [[31.5], []] }
//!       }
//!     }
//!   },
//!   "objects": { "hcount": { "...": "..." } }
//! }
//! ```
//!
//! A branch whose `data` holds arrays is jagged (one array per entry).

use std::collections::BTreeMap;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use gg_core::{Error, Result};

use crate::column::{Column, ColumnData, ColumnType, Value};
use crate::tree::{EventSource, Tree};

#[derive(Debug, Default, Serialize, Deserialize)]
struct RawFile {
    #[serde(default)]
    trees: BTreeMap<String, RawTree>,
    #[serde(default)]
    objects: BTreeMap<String, Json>,
}

#[derive(Debug, Serialize, Deserialize)]
struct RawTree {
    entries: usize,
    #[serde(default)]
    branches: BTreeMap<String, RawBranch>,
}

#[derive(Debug, Serialize, Deserialize)]
struct RawBranch {
    #[serde(rename = "type")]
    dtype: ColumnType,
    data: Vec<Json>,
}

/// An opened input file.
#[derive(Debug, Default)]
pub struct TreeFile {
    trees: BTreeMap<String, Tree>,
    objects: BTreeMap<String, Json>,
}

impl TreeFile {
    /// Empty file (for building fixtures).
    pub fn new() -> Self {
        Self::default()
    }

    /// Open and fully decode an input file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|source| Error::OpenInput { path: path.to_path_buf(), source })?;
        let raw: RawFile = serde_json::from_slice(&bytes)
            .map_err(|source| Error::ParseInput { path: path.to_path_buf(), source })?;
        let f = Self::from_raw(raw)?;
        tracing::debug!(
            path = %path.display(),
            trees = f.trees.len(),
            objects = f.objects.len(),
            "input file opened"
        );
        Ok(f)
    }

    /// Decode from in-memory JSON.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        Self::from_raw(serde_json::from_slice(bytes)?)
    }

    fn from_raw(raw: RawFile) -> Result<Self> {
        let mut trees = BTreeMap::new();
        for (name, rt) in raw.trees {
            let mut tree = Tree::new(name.clone(), rt.entries);
            for (bname, rb) in rt.branches {
                tree.insert(decode_branch(&bname, rb)?)?;
            }
            trees.insert(name, tree);
        }
        Ok(Self { trees, objects: raw.objects })
    }

    /// Tree paths in this file.
    pub fn tree_names(&self) -> Vec<&str> {
        self.trees.keys().map(String::as_str).collect()
    }

    /// Look up a tree by path.
    pub fn get_tree(&self, name: &str) -> Result<&Tree> {
        self.trees.get(name).ok_or_else(|| Error::UnknownTree(name.to_string()))
    }

    /// Deserialize a named auxiliary object.
    pub fn get_object<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let v = self.objects.get(name).ok_or_else(|| Error::UnknownObject(name.to_string()))?;
        Ok(T::deserialize(v)?)
    }

    /// Add (or replace) a tree.
    pub fn insert_tree(&mut self, tree: Tree) {
        self.trees.insert(tree.name().to_string(), tree);
    }

    /// Add (or replace) an auxiliary object.
    pub fn insert_object<T: Serialize>(&mut self, name: &str, object: &T) -> Result<()> {
        self.objects.insert(name.to_string(), serde_json::to_value(object)?);
        Ok(())
    }

    /// Serialize to `path`.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut raw = RawFile { trees: BTreeMap::new(), objects: self.objects.clone() };
        for (name, tree) in &self.trees {
            let mut branches = BTreeMap::new();
            for cname in tree.column_names() {
                let col = tree.column(cname)?;
                branches.insert(cname.to_string(), encode_branch(col)?);
            }
            raw.trees.insert(name.clone(), RawTree { entries: tree.entries(), branches });
        }
        let text = serde_json::to_string(&raw)?;
        std::fs::write(path, text)
            .map_err(|source| Error::OpenOutput { path: path.to_path_buf(), source })
    }
}

fn decode_branch(name: &str, rb: RawBranch) -> Result<Column> {
    let jagged = rb.data.first().is_some_and(Json::is_array);
    if !jagged {
        let data = decode_values(name, rb.dtype, &rb.data)?;
        return Ok(Column::scalar(name, data));
    }

    let mut flat = Vec::new();
    let mut offsets = Vec::with_capacity(rb.data.len() + 1);
    offsets.push(0);
    for (i, row) in rb.data.iter().enumerate() {
        let Some(items) = row.as_array() else {
            return Err(Error::BranchType {
                branch: name.to_string(),
                expected: "array for every entry of a jagged branch".into(),
                found: format!("{row} at entry {i}"),
            });
        };
        flat.extend(items.iter().cloned());
        offsets.push(flat.len());
    }
    let data = decode_values(name, rb.dtype, &flat)?;
    Column::jagged(name, data, offsets)
}

fn decode_values(name: &str, dtype: ColumnType, values: &[Json]) -> Result<ColumnData> {
    let bad = |v: &Json| Error::BranchType {
        branch: name.to_string(),
        expected: dtype.to_string(),
        found: v.to_string(),
    };
    Ok(match dtype {
        ColumnType::F32 => ColumnData::F32(
            values.iter().map(|v| v.as_f64().map(|x| x as f32).ok_or_else(|| bad(v))).collect::<Result<_>>()?,
        ),
        ColumnType::F64 => ColumnData::F64(
            values.iter().map(|v| v.as_f64().ok_or_else(|| bad(v))).collect::<Result<_>>()?,
        ),
        ColumnType::I32 => ColumnData::I32(
            values
                .iter()
                .map(|v| v.as_i64().and_then(|x| i32::try_from(x).ok()).ok_or_else(|| bad(v)))
                .collect::<Result<_>>()?,
        ),
        ColumnType::I64 => ColumnData::I64(
            values.iter().map(|v| v.as_i64().ok_or_else(|| bad(v))).collect::<Result<_>>()?,
        ),
        ColumnType::U64 => ColumnData::U64(
            values.iter().map(|v| v.as_u64().ok_or_else(|| bad(v))).collect::<Result<_>>()?,
        ),
        ColumnType::Bool => ColumnData::Bool(
            values
                .iter()
                .map(|v| match v {
                    Json::Bool(b) => Ok(*b),
                    Json::Number(n) if n.as_u64() == Some(0) => Ok(false),
                    Json::Number(n) if n.as_u64() == Some(1) => Ok(true),
                    other => Err(bad(other)),
                })
                .collect::<Result<_>>()?,
        ),
    })
}

fn encode_value(v: Value) -> Json {
    match v {
        Value::Float(x) => serde_json::Number::from_f64(x).map(Json::Number).unwrap_or(Json::Null),
        Value::Int(x) => Json::from(x),
        Value::UInt(x) => Json::from(x),
        Value::Bool(x) => Json::Bool(x),
    }
}

fn encode_branch(col: &Column) -> Result<RawBranch> {
    let mut data = Vec::with_capacity(col.n_entries());
    for event in 0..col.n_entries() {
        if col.is_jagged() {
            let n = col.entry_len(event)?;
            let row = (0..n).map(|i| col.get(event, i).map(encode_value)).collect::<Result<_>>()?;
            data.push(Json::Array(row));
        } else {
            data.push(encode_value(col.scalar_at(event)?));
        }
    }
    Ok(RawBranch { dtype: col.column_type(), data })
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"{
        "trees": {
            "ggNtuplizer/EventTree": {
                "entries": 2,
                "branches": {
                    "nMu": { "type": "i32", "data": [2, 0] },
                    "muPt": { "type": "f32", "data": [[31.5, 12.0], []] },
                    "HLTJet": { "type": "u64", "data": [1099511627776, 0] },
                    "pass": { "type": "bool", "data": [[true, 0], []] }
                }
            }
        },
        "objects": { "nevents": 1234 }
    }"#;

    #[test]
    fn decode_document() {
        let f = TreeFile::from_slice(DOC.as_bytes()).unwrap();
        let t = f.get_tree("ggNtuplizer/EventTree").unwrap();
        assert_eq!(t.entries(), 2);
        let pt = t.column("muPt").unwrap();
        assert!(pt.is_jagged());
        assert_eq!(pt.get(0, 0).unwrap(), Value::Float(31.5));
        assert_eq!(t.column("HLTJet").unwrap().scalar_at(0).unwrap(), Value::UInt(1 << 40));
        assert_eq!(t.column("pass").unwrap().get(0, 1).unwrap(), Value::Bool(false));
        assert_eq!(f.get_object::<u32>("nevents").unwrap(), 1234);
    }

    #[test]
    fn missing_tree_and_object() {
        let f = TreeFile::from_slice(DOC.as_bytes()).unwrap();
        assert!(matches!(f.get_tree("Events"), Err(Error::UnknownTree(_))));
        assert!(matches!(f.get_object::<u32>("hcount"), Err(Error::UnknownObject(_))));
    }

    #[test]
    fn type_errors_name_the_branch() {
        let doc = r#"{"trees": {"t": {"entries": 1, "branches": {"nMu": {"type": "i32", "data": [1.5]}}}}}"#;
        let err = TreeFile::from_slice(doc.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("nMu"));
    }

    #[test]
    fn open_missing_file_is_input_error() {
        let err = TreeFile::open("/nonexistent/input.json").unwrap_err();
        assert_eq!(err.class(), gg_core::ErrorClass::Input);
    }
}
