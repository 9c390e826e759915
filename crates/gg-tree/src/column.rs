//! Typed branch storage: scalar and jagged (variable-length per event) columns.

use std::fmt;

use serde::{Deserialize, Serialize};

use gg_core::{Error, Result};

/// Element type of a branch (mirrors the ROOT leaf types ntuples use).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    /// `Float_t`.
    F32,
    /// `Double_t`.
    F64,
    /// `Int_t`.
    I32,
    /// `Long64_t`.
    I64,
    /// `ULong64_t` (packed trigger words).
    U64,
    /// `Bool_t`.
    Bool,
}

impl ColumnType {
    /// True for integer and boolean types.
    pub fn is_integral(self) -> bool {
        !matches!(self, ColumnType::F32 | ColumnType::F64)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ColumnType::F32 => "f32",
            ColumnType::F64 => "f64",
            ColumnType::I32 => "i32",
            ColumnType::I64 => "i64",
            ColumnType::U64 => "u64",
            ColumnType::Bool => "bool",
        };
        f.write_str(s)
    }
}

/// A single cell read from a column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    /// Floating point (f32 branches are widened).
    Float(f64),
    /// Signed integer.
    Int(i64),
    /// Unsigned integer.
    UInt(u64),
    /// Boolean.
    Bool(bool),
}

impl Value {
    /// Numeric value as `f64`.
    pub fn to_f64(self) -> f64 {
        match self {
            Value::Float(v) => v,
            Value::Int(v) => v as f64,
            Value::UInt(v) => v as f64,
            Value::Bool(v) => f64::from(u8::from(v)),
        }
    }

    /// Value as `i64`; floats truncate toward zero.
    pub fn to_i64(self) -> i64 {
        match self {
            Value::Float(v) => v as i64,
            Value::Int(v) => v,
            Value::UInt(v) => v as i64,
            Value::Bool(v) => i64::from(v),
        }
    }

    /// Value as `u64`; the bit pattern of signed integers is kept.
    pub fn to_u64(self) -> u64 {
        match self {
            Value::Float(v) => v as u64,
            Value::Int(v) => v as u64,
            Value::UInt(v) => v,
            Value::Bool(v) => u64::from(v),
        }
    }

    /// Non-zero is `true`.
    pub fn to_bool(self) -> bool {
        match self {
            Value::Float(v) => v != 0.0,
            Value::Int(v) => v != 0,
            Value::UInt(v) => v != 0,
            Value::Bool(v) => v,
        }
    }
}

/// Flat typed storage for one column.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    /// `f32` values.
    F32(Vec<f32>),
    /// `f64` values.
    F64(Vec<f64>),
    /// `i32` values.
    I32(Vec<i32>),
    /// `i64` values.
    I64(Vec<i64>),
    /// `u64` values.
    U64(Vec<u64>),
    /// `bool` values.
    Bool(Vec<bool>),
}

impl ColumnData {
    /// Element type.
    pub fn column_type(&self) -> ColumnType {
        match self {
            ColumnData::F32(_) => ColumnType::F32,
            ColumnData::F64(_) => ColumnType::F64,
            ColumnData::I32(_) => ColumnType::I32,
            ColumnData::I64(_) => ColumnType::I64,
            ColumnData::U64(_) => ColumnType::U64,
            ColumnData::Bool(_) => ColumnType::Bool,
        }
    }

    /// Number of flat values.
    pub fn len(&self) -> usize {
        match self {
            ColumnData::F32(v) => v.len(),
            ColumnData::F64(v) => v.len(),
            ColumnData::I32(v) => v.len(),
            ColumnData::I64(v) => v.len(),
            ColumnData::U64(v) => v.len(),
            ColumnData::Bool(v) => v.len(),
        }
    }

    /// True when there are no values.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    fn value(&self, i: usize) -> Value {
        match self {
            ColumnData::F32(v) => Value::Float(f64::from(v[i])),
            ColumnData::F64(v) => Value::Float(v[i]),
            ColumnData::I32(v) => Value::Int(i64::from(v[i])),
            ColumnData::I64(v) => Value::Int(v[i]),
            ColumnData::U64(v) => Value::UInt(v[i]),
            ColumnData::Bool(v) => Value::Bool(v[i]),
        }
    }
}

/// One named branch.
///
/// Jagged columns carry `offsets` of length `n_entries + 1`; entry `i` has
/// values `data[offsets[i]..offsets[i+1]]`. Scalar columns hold one value per
/// entry and no offsets.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    data: ColumnData,
    offsets: Option<Vec<usize>>,
}

impl Column {
    /// One value per entry.
    pub fn scalar(name: impl Into<String>, data: ColumnData) -> Self {
        Self { name: name.into(), data, offsets: None }
    }

    /// Variable-length column from flat values and entry offsets.
    pub fn jagged(name: impl Into<String>, data: ColumnData, offsets: Vec<usize>) -> Result<Self> {
        let name = name.into();
        if offsets.first() != Some(&0) {
            return Err(Error::Validation(format!("column '{name}': offsets must start at 0")));
        }
        if offsets.windows(2).any(|w| w[1] < w[0]) {
            return Err(Error::Validation(format!("column '{name}': offsets must be non-decreasing")));
        }
        let last = offsets.last().copied().unwrap_or(0);
        if last != data.len() {
            return Err(Error::Validation(format!(
                "column '{name}': last offset {last} != {} values",
                data.len()
            )));
        }
        Ok(Self { name, data, offsets: Some(offsets) })
    }

    /// Branch name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Element type.
    pub fn column_type(&self) -> ColumnType {
        self.data.column_type()
    }

    /// Whether the column is variable-length per entry.
    pub fn is_jagged(&self) -> bool {
        self.offsets.is_some()
    }

    /// Number of entries (events).
    pub fn n_entries(&self) -> usize {
        match &self.offsets {
            Some(o) => o.len().saturating_sub(1),
            None => self.data.len(),
        }
    }

    /// Number of values stored for `event` (1 for scalar columns).
    pub fn entry_len(&self, event: usize) -> Result<usize> {
        self.check_event(event)?;
        Ok(match &self.offsets {
            Some(o) => o[event + 1] - o[event],
            None => 1,
        })
    }

    /// Scalar value for `event`.
    pub fn scalar_at(&self, event: usize) -> Result<Value> {
        self.check_event(event)?;
        if self.offsets.is_some() {
            return Err(Error::BranchType {
                branch: self.name.clone(),
                expected: "scalar".into(),
                found: format!("jagged {}", self.column_type()),
            });
        }
        Ok(self.data.value(event))
    }

    /// Element `index` of `event`. Scalar columns accept only index 0.
    pub fn get(&self, event: usize, index: usize) -> Result<Value> {
        let len = self.entry_len(event)?;
        if index >= len {
            return Err(Error::LengthMismatch {
                column: self.name.clone(),
                event,
                expected: index + 1,
                found: len,
            });
        }
        let start = self.offsets.as_ref().map(|o| o[event]).unwrap_or(event);
        Ok(self.data.value(start + index))
    }

    fn check_event(&self, event: usize) -> Result<()> {
        let entries = self.n_entries();
        if event >= entries {
            return Err(Error::EventOutOfRange { event, entries });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jagged_pt() -> Column {
        Column::jagged("muPt", ColumnData::F32(vec![50.0, 20.0, 80.0]), vec![0, 2, 2, 3]).unwrap()
    }

    #[test]
    fn jagged_access() {
        let c = jagged_pt();
        assert!(c.is_jagged());
        assert_eq!(c.n_entries(), 3);
        assert_eq!(c.entry_len(0).unwrap(), 2);
        assert_eq!(c.entry_len(1).unwrap(), 0);
        assert_eq!(c.get(0, 1).unwrap(), Value::Float(20.0));
        assert_eq!(c.get(2, 0).unwrap(), Value::Float(80.0));
        assert!(matches!(c.get(1, 0), Err(Error::LengthMismatch { event: 1, .. })));
        assert!(matches!(c.get(3, 0), Err(Error::EventOutOfRange { event: 3, entries: 3 })));
    }

    #[test]
    fn scalar_access() {
        let c = Column::scalar("nMu", ColumnData::I32(vec![2, 0, 1]));
        assert_eq!(c.scalar_at(2).unwrap(), Value::Int(1));
        assert_eq!(c.entry_len(0).unwrap(), 1);
        assert!(jagged_pt().scalar_at(0).is_err());
    }

    #[test]
    fn bad_offsets_rejected() {
        let data = ColumnData::F64(vec![1.0, 2.0]);
        assert!(Column::jagged("x", data.clone(), vec![1, 2]).is_err());
        assert!(Column::jagged("x", data.clone(), vec![0, 2, 1]).is_err());
        assert!(Column::jagged("x", data, vec![0, 1]).is_err());
    }

    #[test]
    fn value_conversions() {
        assert_eq!(Value::Bool(true).to_f64(), 1.0);
        assert_eq!(Value::Float(2.9).to_i64(), 2);
        assert_eq!(Value::UInt(u64::MAX).to_u64(), u64::MAX);
        assert!(!Value::Int(0).to_bool());
        assert!(ColumnType::U64.is_integral());
        assert!(!ColumnType::F32.is_integral());
    }
}
