//! The generic object factory.
//!
//! An [`ObjectKind`] describes one collection in the tree: the count branch,
//! the four-momentum branches and how to read them, a table of auxiliary
//! field bindings, and how to turn a filled builder into a record. An
//! [`ObjectFactory`] binds those branches once and then, per event, builds
//! every record, keeps those passing its [`Preselection`], and orders them
//! by descending sort key (pt unless overridden).

use std::fmt;

use gg_core::{Error, FourMomentum, Kinematics, Param, Result};
use gg_tree::{Column, EventSource};

use crate::binding::{Binding, BoundField, bind_count_column, bind_p4_column};

/// Anything with stored kinematics.
pub trait PhysicsObject {
    /// Stored collider coordinates and four-momentum.
    fn kinematics(&self) -> &Kinematics;

    /// Four-momentum.
    fn p4(&self) -> &FourMomentum {
        self.kinematics().p4()
    }

    /// Transverse momentum as stored.
    fn pt(&self) -> f64 {
        self.kinematics().pt()
    }

    /// Pseudorapidity as stored.
    fn eta(&self) -> f64 {
        self.kinematics().eta()
    }

    /// Azimuth as stored.
    fn phi(&self) -> f64 {
        self.kinematics().phi()
    }

    /// Invariant mass.
    fn mass(&self) -> f64 {
        self.p4().mass()
    }

    /// Angular separation from another object.
    fn delta_r(&self, other: &impl PhysicsObject) -> f64 {
        self.p4().delta_r(other.p4())
    }
}

impl PhysicsObject for Kinematics {
    fn kinematics(&self) -> &Kinematics {
        self
    }
}

/// Description of one object collection.
pub trait ObjectKind {
    /// Finished, immutable record.
    type Record: PhysicsObject;
    /// Mutable accumulator for auxiliary fields.
    type Builder: Default;

    /// Collection name used in logs.
    fn name(&self) -> &str;

    /// Scalar branch holding the per-event count. `None` takes the length of
    /// the pt branch instead.
    fn count_branch(&self) -> Option<&str>;

    /// Branches for `(pt, eta, phi, fourth)`.
    fn p4_branches(&self) -> [&str; 4];

    /// Meaning of the fourth four-momentum component.
    fn param(&self) -> Param;

    /// Auxiliary field bindings.
    fn bindings(&self) -> Vec<Binding<Self::Builder>>;

    /// Cuts applied when no explicit preselection is configured.
    fn default_preselection(&self) -> Preselection<Self::Record> {
        Preselection::none()
    }

    /// Build the record.
    fn finish(&self, kin: Kinematics, builder: Self::Builder) -> Self::Record;

    /// Whether the whole collection only exists in simulation.
    fn mc_only(&self) -> bool {
        false
    }
}

type Predicate<R> = Box<dyn Fn(&R) -> bool + Send + Sync>;

/// A conjunction of static cuts.
pub struct Preselection<R> {
    cuts: Vec<(String, Predicate<R>)>,
}

impl<R> Default for Preselection<R> {
    fn default() -> Self {
        Self::none()
    }
}

impl<R> fmt::Debug for Preselection<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.cuts.iter().map(|(label, _)| label)).finish()
    }
}

impl<R> Preselection<R> {
    /// Accept everything.
    pub fn none() -> Self {
        Self { cuts: Vec::new() }
    }

    /// Add a named predicate.
    pub fn and(
        mut self,
        label: impl Into<String>,
        f: impl Fn(&R) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.cuts.push((label.into(), Box::new(f)));
        self
    }

    /// Whether `record` passes every cut.
    pub fn accepts(&self, record: &R) -> bool {
        self.cuts.iter().all(|(_, f)| f(record))
    }

    /// Cut labels, in order.
    pub fn labels(&self) -> Vec<&str> {
        self.cuts.iter().map(|(l, _)| l.as_str()).collect()
    }
}

impl<R: PhysicsObject> Preselection<R> {
    /// `pt >= min`.
    pub fn min_pt(self, min: f64) -> Self {
        self.and(format!("pt >= {min}"), move |r: &R| r.pt() >= min)
    }

    /// `pt > min`.
    pub fn pt_above(self, min: f64) -> Self {
        self.and(format!("pt > {min}"), move |r: &R| r.pt() > min)
    }

    /// `|eta| <= max`.
    pub fn max_abs_eta(self, max: f64) -> Self {
        self.and(format!("|eta| <= {max}"), move |r: &R| r.eta().abs() <= max)
    }

    /// `|eta| < max`.
    pub fn abs_eta_below(self, max: f64) -> Self {
        self.and(format!("|eta| < {max}"), move |r: &R| r.eta().abs() < max)
    }
}

/// Per-event record builder for one [`ObjectKind`].
pub struct ObjectFactory<'a, K: ObjectKind> {
    kind: K,
    count: Option<&'a Column>,
    p4: [&'a Column; 4],
    fields: Vec<BoundField<'a, K::Builder>>,
    preselection: Preselection<K::Record>,
    sort_key: fn(&K::Record) -> f64,
    objects: Vec<K::Record>,
    n_total: usize,
}

impl<'a, K: ObjectKind> ObjectFactory<'a, K> {
    /// Bind every branch `kind` needs. Simulation-only bindings are skipped
    /// when `is_data` is set.
    pub fn new<S>(kind: K, source: &'a S, is_data: bool) -> Result<Self>
    where
        S: EventSource + ?Sized,
    {
        if is_data && kind.mc_only() {
            return Err(Error::Validation(format!(
                "'{}' objects only exist in simulation",
                kind.name()
            )));
        }
        let count = kind.count_branch().map(|b| bind_count_column(source, b)).transpose()?;
        let [pt, eta, phi, fourth] = kind.p4_branches();
        let p4 = [
            bind_p4_column(source, pt)?,
            bind_p4_column(source, eta)?,
            bind_p4_column(source, phi)?,
            bind_p4_column(source, fourth)?,
        ];
        let bindings = kind.bindings();
        let mut fields = Vec::with_capacity(bindings.len());
        for b in bindings.iter().filter(|b| !(is_data && b.is_mc_only())) {
            fields.push(b.bind(source)?);
        }
        tracing::debug!(
            kind = kind.name(),
            fields = fields.len(),
            skipped = bindings.len() - fields.len(),
            "object factory bound"
        );
        let preselection = kind.default_preselection();
        Ok(Self {
            kind,
            count,
            p4,
            fields,
            preselection,
            sort_key: |r: &K::Record| r.pt(),
            objects: Vec::new(),
            n_total: 0,
        })
    }

    /// Replace the preselection.
    pub fn with_preselection(mut self, preselection: Preselection<K::Record>) -> Self {
        self.preselection = preselection;
        self
    }

    /// Add one cut on top of the current preselection.
    pub fn with_cut(
        mut self,
        label: impl Into<String>,
        f: impl Fn(&K::Record) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.preselection = self.preselection.and(label, f);
        self
    }

    /// Order by a key other than pt (still descending).
    pub fn sort_by(mut self, key: fn(&K::Record) -> f64) -> Self {
        self.sort_key = key;
        self
    }

    /// The object kind.
    pub fn kind(&self) -> &K {
        &self.kind
    }

    /// Active preselection.
    pub fn preselection(&self) -> &Preselection<K::Record> {
        &self.preselection
    }

    /// Rebuild the records for `event`.
    pub fn run(&mut self, event: usize) -> Result<()> {
        self.objects.clear();
        let n = self.entry_count(event)?;
        self.n_total = n;

        for column in self.p4.iter().copied().chain(self.fields.iter().map(BoundField::column)) {
            let found = column.entry_len(event)?;
            if found != n {
                return Err(Error::LengthMismatch {
                    column: column.name().to_string(),
                    event,
                    expected: n,
                    found,
                });
            }
        }

        let param = self.kind.param();
        for i in 0..n {
            let [pt, eta, phi, fourth] =
                [0, 1, 2, 3].map(|c| self.p4[c].get(event, i).map(|v| v.to_f64()));
            let kin = Kinematics::from_collider(pt?, eta?, phi?, fourth?, param);
            let mut builder = K::Builder::default();
            for field in &self.fields {
                field.apply(&mut builder, event, i)?;
            }
            let record = self.kind.finish(kin, builder);
            if self.preselection.accepts(&record) {
                self.objects.push(record);
            }
        }

        let key = self.sort_key;
        self.objects.sort_by(|a, b| key(b).total_cmp(&key(a)));
        Ok(())
    }

    /// Records of the last event, highest sort key first.
    pub fn objects(&self) -> &[K::Record] {
        &self.objects
    }

    /// Leading record, if any.
    pub fn leading(&self) -> Option<&K::Record> {
        self.objects.first()
    }

    /// Entries in the input for the last event.
    pub fn n_total(&self) -> usize {
        self.n_total
    }

    /// Records that survived preselection in the last event.
    pub fn n_good(&self) -> usize {
        self.objects.len()
    }

    fn entry_count(&self, event: usize) -> Result<usize> {
        let Some(count) = self.count else {
            return self.p4[0].entry_len(event);
        };
        let n = count.scalar_at(event)?.to_i64();
        usize::try_from(n).map_err(|_| {
            Error::Validation(format!("{}: negative count {n} in event {event}", count.name()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gg_tree::TreeBuilder;

    struct Simple;

    #[derive(Default)]
    struct SimpleBuilder {
        q: i32,
    }

    struct SimpleRecord {
        kin: Kinematics,
        q: i32,
    }

    impl PhysicsObject for SimpleRecord {
        fn kinematics(&self) -> &Kinematics {
            &self.kin
        }
    }

    impl ObjectKind for Simple {
        type Record = SimpleRecord;
        type Builder = SimpleBuilder;

        fn name(&self) -> &str {
            "simple"
        }
        fn count_branch(&self) -> Option<&str> {
            Some("nX")
        }
        fn p4_branches(&self) -> [&str; 4] {
            ["xPt", "xEta", "xPhi", "xEn"]
        }
        fn param(&self) -> Param {
            Param::Energy
        }
        fn bindings(&self) -> Vec<Binding<SimpleBuilder>> {
            vec![Binding::i32("xQ", |b, v| b.q = v)]
        }
        fn finish(&self, kin: Kinematics, b: SimpleBuilder) -> SimpleRecord {
            SimpleRecord { kin, q: b.q }
        }
    }

    fn tree(counts: &[i32]) -> gg_tree::Tree {
        TreeBuilder::new("t", 2)
            .counts("nX", counts)
            .jagged_f32("xPt", &[vec![10.0, 40.0, 25.0], vec![]])
            .jagged_f32("xEta", &[vec![0.1, 0.2, 2.9], vec![]])
            .jagged_f32("xPhi", &[vec![0.0, 1.0, 2.0], vec![]])
            .jagged_f32("xEn", &[vec![20.0, 60.0, 200.0], vec![]])
            .jagged_i32("xQ", &[vec![1, -1, 1], vec![]])
            .build()
            .unwrap()
    }

    #[test]
    fn sorted_descending_and_counted() {
        let t = tree(&[3, 0]);
        let mut f = ObjectFactory::new(Simple, &t, false).unwrap();
        f.run(0).unwrap();
        let pts: Vec<f64> = f.objects().iter().map(|o| o.pt().round()).collect();
        assert_eq!(pts, vec![40.0, 25.0, 10.0]);
        assert_eq!(f.objects()[0].q, -1);
        assert_eq!((f.n_total(), f.n_good()), (3, 3));

        f.run(1).unwrap();
        assert!(f.objects().is_empty());
        assert_eq!(f.n_total(), 0);
        assert!(f.leading().is_none());
    }

    #[test]
    fn preselection_filters() {
        let t = tree(&[3, 0]);
        let mut f = ObjectFactory::new(Simple, &t, false)
            .unwrap()
            .with_preselection(Preselection::none().min_pt(20.0).max_abs_eta(2.5));
        f.run(0).unwrap();
        assert_eq!(f.n_good(), 1);
        assert_eq!(f.n_total(), 3);
        assert_eq!(f.preselection().labels(), vec!["pt >= 20", "|eta| <= 2.5"]);
    }

    #[test]
    fn custom_sort_key() {
        let t = tree(&[3, 0]);
        let mut f = ObjectFactory::new(Simple, &t, false).unwrap().sort_by(|r| r.p4().energy());
        f.run(0).unwrap();
        assert!((f.objects()[0].p4().energy() - 200.0).abs() < 1e-3);
    }

    #[test]
    fn cuts_read_stored_values_on_thresholds() {
        let phis: Vec<f32> = (0..200).map(|i| -3.1 + 0.031 * i as f32).collect();
        let n = phis.len();
        let t = TreeBuilder::new("t", n)
            .counts("nX", &vec![1; n])
            .jagged_f32("xPt", &vec![vec![20.0]; n])
            .jagged_f32("xEta", &vec![vec![2.5]; n])
            .jagged_f32("xPhi", &phis.iter().map(|&p| vec![p]).collect::<Vec<_>>())
            .jagged_f32("xEn", &vec![vec![150.0]; n])
            .jagged_i32("xQ", &vec![vec![1]; n])
            .build()
            .unwrap();
        let mut inclusive = ObjectFactory::new(Simple, &t, false)
            .unwrap()
            .with_preselection(Preselection::none().min_pt(20.0).max_abs_eta(2.5));
        let mut strict = ObjectFactory::new(Simple, &t, false)
            .unwrap()
            .with_preselection(Preselection::none().pt_above(20.0));
        for event in 0..n {
            inclusive.run(event).unwrap();
            strict.run(event).unwrap();
            assert_eq!(inclusive.n_good(), 1, "phi = {}", phis[event]);
            assert_eq!(inclusive.objects()[0].pt(), 20.0);
            assert_eq!(strict.n_good(), 0, "phi = {}", phis[event]);
        }
    }

    #[test]
    fn count_disagreeing_with_columns() {
        let t = tree(&[2, 0]);
        let mut f = ObjectFactory::new(Simple, &t, false).unwrap();
        let err = f.run(0).err().unwrap();
        assert!(matches!(
            err,
            Error::LengthMismatch { ref column, event: 0, expected: 2, found: 3 } if column == "xPt"
        ));
    }
}
