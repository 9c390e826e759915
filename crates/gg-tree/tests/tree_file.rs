//! Integration tests: write a synthetic ntuple to disk and read it back.

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use gg_core::{Error, ErrorClass};
use gg_tree::{EventSource, TreeBuilder, TreeFile, Value};

fn tmp_path(name: &str) -> PathBuf {
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos();
    std::env::temp_dir().join(format!("gg_tree_{}_{}_{}", std::process::id(), nanos, name))
}

#[test]
fn written_file_reopens_with_same_columns() {
    let tree = TreeBuilder::new("ggNtuplizer/EventTree", 3)
        .counts("nMu", &[2, 0, 1])
        .jagged_f32("muPt", &[vec![50.0, 20.0], vec![], vec![80.0]])
        .jagged_bool("muIsLoose", &[vec![true, false], vec![], vec![true]])
        .scalar_u64("HLTJet", &[1 << 40, 0, (1 << 39) | (1 << 40)])
        .build()
        .unwrap();

    let mut f = TreeFile::new();
    f.insert_tree(tree);
    f.insert_object("nevents", &3_u32).unwrap();

    let path = tmp_path("roundtrip.json");
    f.write(&path).unwrap();

    let back = TreeFile::open(&path).unwrap();
    assert_eq!(back.tree_names(), vec!["ggNtuplizer/EventTree"]);
    let t = back.get_tree("ggNtuplizer/EventTree").unwrap();
    assert_eq!(t.entries(), 3);

    let pt = t.column("muPt").unwrap();
    assert_eq!(pt.entry_len(1).unwrap(), 0);
    assert_eq!(pt.get(0, 1).unwrap(), Value::Float(20.0));
    assert_eq!(t.column("nMu").unwrap().scalar_at(2).unwrap(), Value::Int(1));
    assert_eq!(t.column("HLTJet").unwrap().scalar_at(2).unwrap().to_u64(), (1 << 39) | (1 << 40));
    assert_eq!(t.column("muIsLoose").unwrap().get(0, 1).unwrap(), Value::Bool(false));
    assert_eq!(back.get_object::<u32>("nevents").unwrap(), 3);

    let _ = std::fs::remove_file(&path);
}

#[test]
fn unknown_branch_is_reported_by_name() {
    let tree = TreeBuilder::new("t", 1).counts("nJet", &[0]).build().unwrap();
    let err = tree.column("jetPt").unwrap_err();
    assert_eq!(err.to_string(), "unknown branch 'jetPt'");
}

#[test]
fn corrupt_input_is_an_input_error() {
    let path = tmp_path("corrupt.json");
    std::fs::write(&path, r#"{"trees": {"t": {"entries": 2, "#).unwrap();
    let err = TreeFile::open(&path).unwrap_err();
    assert!(matches!(&err, Error::ParseInput { path: p, .. } if *p == path));
    assert_eq!(err.class(), ErrorClass::Input);
    assert!(err.to_string().contains("corrupt.json"));

    let _ = std::fs::remove_file(&path);
}
