//! Field-binding tables: which branch feeds which builder field.

use gg_core::{Error, Result};
use gg_tree::{Column, ColumnType, EventSource, Value};

/// Typed setter for one builder field.
pub enum Setter<B> {
    /// Floating-point field.
    F32(fn(&mut B, f32)),
    /// Signed integer field (charges, ID bit words, counts).
    I32(fn(&mut B, i32)),
    /// Packed 64-bit trigger word.
    U64(fn(&mut B, u64)),
    /// Boolean discriminator.
    Bool(fn(&mut B, bool)),
}

impl<B> Clone for Setter<B> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<B> Copy for Setter<B> {}

impl<B> Setter<B> {
    fn accepts(&self, t: ColumnType) -> bool {
        match self {
            Setter::F32(_) => matches!(t, ColumnType::F32 | ColumnType::F64),
            Setter::I32(_) => matches!(t, ColumnType::I32 | ColumnType::I64),
            Setter::U64(_) => matches!(t, ColumnType::U64 | ColumnType::I64),
            Setter::Bool(_) => matches!(t, ColumnType::Bool | ColumnType::I32),
        }
    }

    fn expected(&self) -> &'static str {
        match self {
            Setter::F32(_) => "jagged f32",
            Setter::I32(_) => "jagged i32",
            Setter::U64(_) => "jagged u64",
            Setter::Bool(_) => "jagged bool",
        }
    }

    fn apply(&self, builder: &mut B, v: Value) {
        match self {
            Setter::F32(f) => f(builder, v.to_f64() as f32),
            Setter::I32(f) => f(builder, v.to_i64() as i32),
            Setter::U64(f) => f(builder, v.to_u64()),
            Setter::Bool(f) => f(builder, v.to_bool()),
        }
    }
}

/// One row of a binding table.
pub struct Binding<B> {
    branch: String,
    setter: Setter<B>,
    mc_only: bool,
}

impl<B> Binding<B> {
    /// `f32` branch.
    pub fn f32(branch: impl Into<String>, set: fn(&mut B, f32)) -> Self {
        Self { branch: branch.into(), setter: Setter::F32(set), mc_only: false }
    }

    /// `i32` branch.
    pub fn i32(branch: impl Into<String>, set: fn(&mut B, i32)) -> Self {
        Self { branch: branch.into(), setter: Setter::I32(set), mc_only: false }
    }

    /// `u64` branch.
    pub fn u64(branch: impl Into<String>, set: fn(&mut B, u64)) -> Self {
        Self { branch: branch.into(), setter: Setter::U64(set), mc_only: false }
    }

    /// `bool` branch.
    pub fn bool(branch: impl Into<String>, set: fn(&mut B, bool)) -> Self {
        Self { branch: branch.into(), setter: Setter::Bool(set), mc_only: false }
    }

    /// Only present in simulation; skipped when running on data.
    pub fn mc_only(mut self) -> Self {
        self.mc_only = true;
        self
    }

    /// Branch name.
    pub fn branch(&self) -> &str {
        &self.branch
    }

    /// Whether the binding is simulation-only.
    pub fn is_mc_only(&self) -> bool {
        self.mc_only
    }

    /// Native element type of the branch as written by ggNtuplizer.
    pub fn column_type(&self) -> ColumnType {
        match self.setter {
            Setter::F32(_) => ColumnType::F32,
            Setter::I32(_) => ColumnType::I32,
            Setter::U64(_) => ColumnType::U64,
            Setter::Bool(_) => ColumnType::Bool,
        }
    }

    /// Resolve against `source`, checking that the branch exists, is jagged
    /// and has a compatible element type.
    pub fn bind<'a, S>(&self, source: &'a S) -> Result<BoundField<'a, B>>
    where
        S: EventSource + ?Sized,
    {
        let column = source.column(&self.branch)?;
        check_jagged(column, self.setter.expected(), |t| self.setter.accepts(t))?;
        Ok(BoundField { column, setter: self.setter })
    }
}

/// A binding resolved to a concrete column.
pub struct BoundField<'a, B> {
    column: &'a Column,
    setter: Setter<B>,
}

impl<B> BoundField<'_, B> {
    /// The bound column.
    pub fn column(&self) -> &Column {
        self.column
    }

    /// Copy element `index` of `event` into the builder.
    #[inline]
    pub fn apply(&self, builder: &mut B, event: usize, index: usize) -> Result<()> {
        let v = self.column.get(event, index)?;
        self.setter.apply(builder, v);
        Ok(())
    }
}

/// Resolve a jagged floating-point column (the four-momentum components).
pub fn bind_p4_column<'a, S>(source: &'a S, branch: &str) -> Result<&'a Column>
where
    S: EventSource + ?Sized,
{
    let column = source.column(branch)?;
    check_jagged(column, "jagged f32", |t| matches!(t, ColumnType::F32 | ColumnType::F64))?;
    Ok(column)
}

/// Resolve a scalar integer column (object counts such as `nMu`).
pub fn bind_count_column<'a, S>(source: &'a S, branch: &str) -> Result<&'a Column>
where
    S: EventSource + ?Sized,
{
    let column = source.column(branch)?;
    if column.is_jagged() || !column.column_type().is_integral() {
        return Err(type_error(column, "scalar integer"));
    }
    Ok(column)
}

fn check_jagged(column: &Column, expected: &str, ok: impl Fn(ColumnType) -> bool) -> Result<()> {
    if !column.is_jagged() || !ok(column.column_type()) {
        return Err(type_error(column, expected));
    }
    Ok(())
}

fn type_error(column: &Column, expected: &str) -> Error {
    let shape = if column.is_jagged() { "jagged" } else { "scalar" };
    Error::BranchType {
        branch: column.name().to_string(),
        expected: expected.to_string(),
        found: format!("{shape} {}", column.column_type()),
    }
}
