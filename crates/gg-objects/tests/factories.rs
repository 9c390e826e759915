//! Factories driven by synthetic trees.

use approx::assert_relative_eq;
use gg_core::{Error, WorkingPoint};
use gg_objects::{
    Ak8Jets, Electrons, GenJets, GenParticles, Jets, Muons, ObjectFactory, ObjectKind,
    PhysicsObject, Preselection, Taus,
};
use gg_tree::{ColumnType, Tree, TreeBuilder};

/// Branch overrides for one object; unlisted branches read as zero.
type Obj = Vec<(&'static str, f64)>;

fn value(obj: &Obj, branch: &str) -> f64 {
    obj.iter().find(|(k, _)| *k == branch).map_or(0.0, |(_, v)| *v)
}

/// Add every branch `kind` binds, filled from `events`.
fn add_collection<K: ObjectKind>(mut b: TreeBuilder, kind: &K, events: &[Vec<Obj>]) -> TreeBuilder {
    let rows = |branch: &str| -> Vec<Vec<f64>> {
        events.iter().map(|objs| objs.iter().map(|o| value(o, branch)).collect()).collect()
    };
    let cast = |rows: Vec<Vec<f64>>, f: fn(f64) -> f32| -> Vec<Vec<f32>> {
        rows.into_iter().map(|r| r.into_iter().map(f).collect()).collect()
    };
    if let Some(count) = kind.count_branch() {
        let counts: Vec<i32> = events.iter().map(|o| o.len() as i32).collect();
        b = b.counts(count, &counts);
    }
    for branch in kind.p4_branches() {
        b = b.jagged_f32(branch, &cast(rows(branch), |v| v as f32));
    }
    for binding in kind.bindings() {
        let name = binding.branch();
        let r = rows(name);
        b = match binding.column_type() {
            ColumnType::I32 => b.jagged_i32(
                name,
                &r.into_iter().map(|v| v.into_iter().map(|x| x as i32).collect()).collect::<Vec<_>>(),
            ),
            ColumnType::U64 => b.jagged_u64(
                name,
                &r.into_iter().map(|v| v.into_iter().map(|x| x as u64).collect()).collect::<Vec<_>>(),
            ),
            ColumnType::Bool => b.jagged_bool(
                name,
                &r.into_iter().map(|v| v.into_iter().map(|x| x != 0.0).collect()).collect::<Vec<_>>(),
            ),
            _ => b.jagged_f32(name, &cast(r, |v| v as f32)),
        };
    }
    b
}

fn muon_tree(pts: &[Vec<f32>]) -> Tree {
    let n = pts.len();
    let counts: Vec<i32> = pts.iter().map(|v| v.len() as i32).collect();
    let zeros_f: Vec<Vec<f32>> = pts.iter().map(|v| vec![0.0; v.len()]).collect();
    let zeros_i: Vec<Vec<i32>> = pts.iter().map(|v| vec![0; v.len()]).collect();
    let zeros_u: Vec<Vec<u64>> = pts.iter().map(|v| vec![0; v.len()]).collect();

    let mut b = TreeBuilder::new("ggNtuplizer/EventTree", n)
        .counts("nMu", &counts)
        .jagged_f32("muPt", pts)
        .jagged_f32("muEta", &zeros_f)
        .jagged_f32("muPhi", &zeros_f)
        .jagged_f32("muEn", pts)
        .jagged_u64("muFiredTrgs", &zeros_u)
        .jagged_u64("muFiredL1Trgs", &zeros_u);
    for name in
        ["muCharge", "muType", "muIDbit", "muMuonHits", "muStations", "muMatches", "muTrkQuality"]
    {
        b = b.jagged_i32(name, &zeros_i);
    }
    for name in [
        "muD0", "muDz", "muSIP", "muChi2NDF", "muInnerD0", "muInnerDz", "muIsoTrk", "muPFChIso",
        "muPFPhoIso", "muPFNeuIso", "muPFPUIso",
    ] {
        b = b.jagged_f32(name, &zeros_f);
    }
    b.build().unwrap()
}

#[test]
fn leading_muon_survives_strict_cut() {
    let tree = muon_tree(&[vec![50.0, 20.0], vec![5.0, 5.0], vec![80.0, 10.0]]);
    let mut muons = ObjectFactory::new(Muons, &tree, true)
        .unwrap()
        .with_preselection(Preselection::none().pt_above(20.0));

    let mut lengths = Vec::new();
    let mut leading = Vec::new();
    for event in 0..3 {
        muons.run(event).unwrap();
        assert_eq!(muons.n_total(), 2);
        lengths.push(muons.n_good());
        leading.extend(muons.objects().iter().map(|m| m.pt().round()));
    }
    assert_eq!(lengths, vec![1, 0, 1]);
    assert_eq!(leading, vec![50.0, 80.0]);
}

#[test]
fn output_is_bounded_filtered_and_sorted() {
    let tree = muon_tree(&[
        vec![12.0, 95.0, 31.0, 30.0, 200.0],
        vec![],
        vec![29.9, 45.0, 45.0],
    ]);
    let mut muons = ObjectFactory::new(Muons, &tree, true).unwrap();
    let cut = Muons.default_preselection();
    for event in 0..3 {
        muons.run(event).unwrap();
        let objs = muons.objects();
        assert!(objs.len() <= muons.n_total());
        assert!(objs.iter().all(|m| cut.accepts(m)));
        assert!(objs.windows(2).all(|w| w[0].pt() >= w[1].pt()));
    }
    muons.run(0).unwrap();
    let pts: Vec<f64> = muons.objects().iter().map(|m| m.pt().round()).collect();
    assert_eq!(pts, vec![200.0, 95.0, 31.0, 30.0]);
}

#[test]
fn missing_branch_fails_at_bind_time() {
    let tree = TreeBuilder::new("t", 1)
        .counts("nMu", &[0])
        .jagged_f32("muPt", &[vec![]])
        .build()
        .unwrap();
    let err = ObjectFactory::new(Muons, &tree, true).err().unwrap();
    assert!(matches!(err, Error::UnknownBranch(name) if name == "muEta"));
}

#[test]
fn simulation_only_collections_rejected_on_data() {
    let tree = TreeBuilder::new("t", 0).build().unwrap();
    assert!(matches!(ObjectFactory::new(GenParticles, &tree, true), Err(Error::Validation(_))));
    assert!(matches!(ObjectFactory::new(GenJets, &tree, true), Err(Error::Validation(_))));
}

#[test]
fn gen_jets_take_length_from_pt_branch() {
    let tree = TreeBuilder::new("t", 2)
        .jagged_f32("jetGenJetPt", &[vec![10.0, 30.0], vec![]])
        .jagged_f32("jetGenJetEta", &[vec![0.0, 0.0], vec![]])
        .jagged_f32("jetGenJetPhi", &[vec![0.0, 0.0], vec![]])
        .jagged_f32("jetGenJetEn", &[vec![10.0, 30.0], vec![]])
        .build()
        .unwrap();
    let mut gen_jets = ObjectFactory::new(GenJets, &tree, false).unwrap();
    gen_jets.run(0).unwrap();
    assert_eq!(gen_jets.n_good(), 2);
    assert!(gen_jets.objects()[0].pt() > gen_jets.objects()[1].pt());
    gen_jets.run(1).unwrap();
    assert_eq!(gen_jets.n_good(), 0);
}

#[test]
fn data_jobs_skip_simulation_bindings() {
    let float_names = [
        "jetRawPt", "jetRawEn", "jetMt", "jetArea", "jetLeadTrackPt", "jetCSV2BJetTags",
        "jetDeepCSVTags_b", "jetDeepCSVTags_bb", "jetDeepCSVTags_c", "jetDeepCSVTags_udsg",
        "jetPUID", "jetJECUnc", "jetCHF", "jetNHF", "jetCEF", "jetNEF", "jetMUF",
    ];
    let mut b = TreeBuilder::new("t", 1)
        .counts("nJet", &[1])
        .jagged_f32("jetPt", &[vec![45.0]])
        .jagged_f32("jetEta", &[vec![0.5]])
        .jagged_f32("jetPhi", &[vec![0.1]])
        .jagged_f32("jetEn", &[vec![60.0]])
        .jagged_bool("jetPFLooseId", &[vec![true]])
        .jagged_u64("jetFiredTrgs", &[vec![0]]);
    for name in float_names {
        b = b.jagged_f32(name, &[vec![0.9]]);
    }
    for name in ["jetID", "jetPUFullID", "jetNCH", "jetNNP"] {
        b = b.jagged_i32(name, &[vec![1]]);
    }
    let tree = b.build().unwrap();

    let mut jets = ObjectFactory::new(Jets, &tree, true).unwrap();
    jets.run(0).unwrap();
    assert_eq!(jets.n_good(), 1);
    assert!(jets.objects()[0].is_btagged());
    assert_eq!(jets.objects()[0].parton_id(), 0);

    let err = ObjectFactory::new(Jets, &tree, false).err().unwrap();
    assert!(matches!(err, Error::UnknownBranch(name) if name == "jetPartonID"));
}

#[test]
fn ak8_and_boosted_taus_need_their_own_branches() {
    let tree = TreeBuilder::new("t", 1).counts("nAK8Jet", &[0]).build().unwrap();
    assert!(ObjectFactory::new(Ak8Jets, &tree, true).is_err());
    assert!(ObjectFactory::new(Taus::boosted(), &tree, true).is_err());
}

#[test]
fn electrons_count_from_their_own_branch() {
    let electron = |pt: f64, phi: f64, charge: f64, id_bits: f64| -> Obj {
        vec![
            ("elePt", pt),
            ("elePhi", phi),
            ("eleEn", pt),
            ("eleCharge", charge),
            ("eleIDbit", id_bits),
            ("eleIDMVAIso", 0.95),
            ("eleSCEta", -1.2),
        ]
    };
    let events = vec![
        vec![electron(25.0, 0.1, -1.0, 0.0), electron(80.0, 2.0, 1.0, 4.0)],
        vec![],
    ];
    // A neighbouring collection with a different count must not leak in.
    let tree = add_collection(TreeBuilder::new("t", 2), &Electrons, &events)
        .counts("nTau", &[3, 1])
        .build()
        .unwrap();

    let mut electrons = ObjectFactory::new(Electrons, &tree, true).unwrap();
    electrons.run(0).unwrap();
    assert_eq!(electrons.n_total(), 2);
    let objs = electrons.objects();
    assert_eq!(objs.len(), 2);
    assert_eq!(objs[0].pt(), 80.0);
    assert_eq!(objs[0].charge(), 1);
    assert!(objs[0].passes_id(2).unwrap());
    assert!(!objs[1].passes_id(2).unwrap());
    assert_relative_eq!(objs[1].id_mva_iso(), 0.95);
    assert_relative_eq!(objs[1].sc_eta(), -1.2);

    electrons.run(1).unwrap();
    assert_eq!(electrons.n_total(), 0);
    assert!(electrons.leading().is_none());
}

#[test]
fn gen_particles_use_mass_and_keep_ancestry() {
    let events = vec![vec![
        vec![
            ("mcPt", 40.0),
            ("mcEta", 0.5),
            ("mcPhi", -1.0),
            ("mcMass", 0.105),
            ("mcPID", -13.0),
            ("mcMomPID", 15.0),
            ("mcMomPt", 120.0),
            ("mcMomMass", 1.777),
        ],
        vec![("mcPt", 120.0), ("mcMass", 1.777), ("mcPID", 15.0), ("mcMomPID", 23.0)],
    ]];
    let tree = add_collection(TreeBuilder::new("t", 1), &GenParticles, &events).build().unwrap();

    let mut gens = ObjectFactory::new(GenParticles, &tree, false).unwrap();
    gens.run(0).unwrap();
    let [tau, muon] = gens.objects() else {
        panic!("expected two particles, got {}", gens.n_good());
    };
    assert_eq!((tau.pid(), tau.mom_pid()), (15, 23));
    assert_eq!((muon.pid(), muon.mom_pid()), (-13, 15));
    assert_relative_eq!(tau.mass(), 1.777, epsilon = 1e-4);
    assert_relative_eq!(muon.mass(), 0.105, epsilon = 1e-3);
    assert_relative_eq!(muon.eta(), 0.5);
    assert_relative_eq!(muon.mom_p4().mass(), 1.777, epsilon = 1e-4);
    assert_relative_eq!(muon.mom_p4().pt(), 120.0, epsilon = 1e-6);
}

#[test]
fn standard_taus_apply_isolation_preselection() {
    let tau = |pt: f64, eta: f64, vloose: f64, medium: f64| -> Obj {
        vec![
            ("tauPt", pt),
            ("tauEta", eta),
            ("tauMass", 1.2),
            ("tauByVLooseIsolationMVArun2v2DBoldDMwLT", vloose),
            ("tauByMediumIsolationMVArun2v2DBoldDMwLT", medium),
            ("tauByTightMuonRejection3", 1.0),
            ("tauCharge", -1.0),
        ]
    };
    let events = vec![vec![
        tau(45.0, 0.3, 1.0, 1.0),
        tau(60.0, 0.0, 0.0, 0.0),
        tau(20.0, 0.0, 1.0, 0.0),
        tau(25.0, 2.4, 1.0, 0.0),
        tau(30.0, -1.0, 1.0, 0.0),
    ]];
    let tree = add_collection(TreeBuilder::new("t", 1), &Taus::standard(), &events).build().unwrap();

    let mut taus = ObjectFactory::new(Taus::standard(), &tree, true).unwrap();
    taus.run(0).unwrap();
    assert_eq!(taus.n_total(), 5);
    let pts: Vec<f64> = taus.objects().iter().map(PhysicsObject::pt).collect();
    assert_eq!(pts, vec![45.0, 30.0]);
    let lead = &taus.objects()[0];
    assert!(lead.passes_isolation(WorkingPoint::Medium));
    assert!(lead.passes_muon_rejection(WorkingPoint::Tight).unwrap());
    assert_eq!(lead.charge(), -1);
    assert!(!taus.objects()[1].passes_isolation(WorkingPoint::Medium));
}

#[test]
fn muon_thresholds_hold_off_axis() {
    let events: Vec<Vec<Obj>> = (0..40i32)
        .map(|i| {
            let phi = -3.0 + 0.15 * f64::from(i);
            vec![vec![("muPt", 30.0), ("muEta", 2.3), ("muPhi", phi), ("muEn", 30.0 * 2.3f64.cosh())]]
        })
        .collect();
    let tree = add_collection(TreeBuilder::new("t", events.len()), &Muons, &events).build().unwrap();

    let mut muons = ObjectFactory::new(Muons, &tree, true).unwrap();
    for event in 0..events.len() {
        muons.run(event).unwrap();
        assert_eq!(muons.n_good(), 1, "event {event}");
    }
}
