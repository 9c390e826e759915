//! Integration tests: declare from a config file, fill, write, read back.

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use approx::assert_relative_eq;
use gg_core::{Error, ErrorClass};
use gg_hist::{HistConfig, HistManager, read_histograms};

fn tmp_path(name: &str) -> PathBuf {
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos();
    std::env::temp_dir().join(format!("gg_hist_{}_{}_{}", std::process::id(), nanos, name))
}

#[test]
fn write_once_then_closed() {
    let cfg_path = tmp_path("hists.json");
    std::fs::write(&cfg_path, r#"{"mu_pt": [10, 0, 100], "turnon": [10, 0, 10]}"#).unwrap();
    let out_path = tmp_path("out.json");

    let cfg = HistConfig::from_path(&cfg_path).unwrap();
    let mut m = HistManager::from_config(&out_path, &cfg).unwrap();
    m.fill("mu_pt", 55.0, 2.5).unwrap();
    for x in [1.0, 5.0, 9.0] {
        m.fill_cumulative("turnon", x, 1.0).unwrap();
    }
    m.write().unwrap();
    assert!(m.is_closed());

    let err = m.fill("mu_pt", 10.0, 1.0).unwrap_err();
    assert!(matches!(err, Error::Closed(_)));
    assert_eq!(err.class(), ErrorClass::State);
    assert!(matches!(m.write(), Err(Error::Closed(_))));

    let back = read_histograms(&out_path).unwrap();
    let names: Vec<&str> = back.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["mu_pt", "turnon"]);
    let pt = back["mu_pt"].as_1d().unwrap();
    assert_relative_eq!(pt.bin_content(6), 2.5);
    let turnon = back["turnon"].as_1d().unwrap();
    let got: Vec<f64> = (1..=10).map(|b| turnon.bin_content(b)).collect();
    assert_eq!(got, vec![3.0, 3.0, 2.0, 2.0, 2.0, 2.0, 1.0, 1.0, 1.0, 1.0]);

    let _ = std::fs::remove_file(&cfg_path);
    let _ = std::fs::remove_file(&out_path);
}

#[test]
fn missing_config_is_input_error() {
    let err = HistConfig::from_path(tmp_path("does-not-exist.json")).unwrap_err();
    assert_eq!(err.class(), ErrorClass::Input);
}

#[test]
fn corrupt_files_name_the_path() {
    let cfg_path = tmp_path("truncated_hists.json");
    std::fs::write(&cfg_path, r#"{"mu_pt": [10, 0, "#).unwrap();
    let err = HistConfig::from_path(&cfg_path).unwrap_err();
    assert!(matches!(&err, Error::ParseConfig { path, .. } if *path == cfg_path));
    assert_eq!(err.class(), ErrorClass::Config);

    let out_path = tmp_path("truncated_out.json");
    std::fs::write(&out_path, r#"{"objects": {"#).unwrap();
    let err = read_histograms(&out_path).unwrap_err();
    assert!(matches!(&err, Error::ParseInput { path, .. } if *path == out_path));
    assert_eq!(err.class(), ErrorClass::Input);

    let _ = std::fs::remove_file(&cfg_path);
    let _ = std::fs::remove_file(&out_path);
}
