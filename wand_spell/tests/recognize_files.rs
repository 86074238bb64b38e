//! Recognition driven from model files on disk.

use std::fs;
use std::path::{Path, PathBuf};

use approx::assert_relative_eq;
use tempfile::{tempdir, TempDir};

use wand_spell::{read_trace, Recognizer, RecognizerConfig, Sample, Shape, SpellError};

const CODEBOOK: &str = "\
NumClusters: 2
Clusters:
0 0 0
1 1 1
";

const ENSEMBLE: &str = "\
UseNullRejection: 0
NumClasses: 2
NullRejectionThresholds: 0 0
ClassLabels: 1 2
Model_ID: 1
NumStates: 1
A:
1
B:
0.9 0.1
Pi:
1
Model_ID: 2
NumStates: 1
A:
1
B:
0.1 0.9
Pi:
1
";

struct Fixture {
    dir:      TempDir,
    codebook: PathBuf,
    ensemble: PathBuf,
}

fn fixture(ensemble: &str) -> Fixture {
    let dir = tempdir().unwrap();
    let codebook = dir.path().join("wf_hmm_quantizer.txt");
    let ensemble_path = dir.path().join("wf_hmm_model.txt");
    fs::write(&codebook, CODEBOOK).unwrap();
    fs::write(&ensemble_path, ensemble).unwrap();
    Fixture { dir, codebook, ensemble: ensemble_path }
}

fn near_one() -> Vec<Sample> {
    (0..5)
        .map(|i| Sample::new(0.97 + 0.01 * i as f64, 1.02, 0.99))
        .collect()
}

fn write_trace(dir: &Path, name: &str, samples: &[Sample]) -> PathBuf {
    let path = dir.join(name);
    let text: String = samples
        .iter()
        .map(|s| format!("{} {} {}\n", s.x, s.y, s.z))
        .collect();
    fs::write(&path, text).unwrap();
    path
}

#[test]
fn trace_near_second_centroid_is_clock() {
    let f = fixture(ENSEMBLE);
    let recognizer = Recognizer::new();
    recognizer.initialize(&f.codebook, &f.ensemble).unwrap();

    let detail = recognizer.recognize_detailed(&near_one()).unwrap();
    assert_eq!(detail.symbols, vec![1; 5]);
    assert_eq!(detail.result.predicted_label, 2);
    assert_eq!(detail.shape, Shape::Clock);
    assert_relative_eq!(detail.result.likelihoods.iter().sum::<f64>(), 1.0, epsilon = 1e-9);
}

#[test]
fn misnamed_class_count_header_fails_load() {
    let broken = ENSEMBLE.replacen("NumClasses: 2", "Classes: 3", 1);
    let f = fixture(&broken);
    let recognizer = Recognizer::new();

    let err = recognizer.initialize(&f.codebook, &f.ensemble).unwrap_err();
    match err {
        SpellError::Model(m) => assert!(m.is_parse(), "{m}"),
        other => panic!("unexpected {other:?}"),
    }
    assert!(!recognizer.is_initialized());
    assert!(recognizer.models().is_none());
}

#[test]
fn failed_reload_keeps_previous_models() {
    let good = fixture(ENSEMBLE);
    let recognizer = Recognizer::new();
    recognizer.initialize(&good.codebook, &good.ensemble).unwrap();

    let bad = fixture(&ENSEMBLE.replacen("Model_ID: 2", "Model_ID: 3", 1));
    assert!(recognizer.initialize(&bad.codebook, &bad.ensemble).is_err());
    assert_eq!(recognizer.recognize(&near_one()).unwrap(), Shape::Clock);
}

#[test]
fn recognize_before_initialize_fails() {
    let recognizer = Recognizer::new();
    assert!(matches!(recognizer.recognize(&near_one()), Err(SpellError::NotInitialized)));
}

#[test]
fn snapshot_serves_same_answers() {
    let f = fixture(ENSEMBLE);
    let text = Recognizer::from_config(&RecognizerConfig::text(&f.codebook, &f.ensemble)).unwrap();

    let snap_path = f.dir.path().join("models.wnds");
    text.write_snapshot(&snap_path).unwrap();

    let snap = Recognizer::from_config(&RecognizerConfig::snapshot(&snap_path)).unwrap();
    assert_eq!(*snap.models().unwrap(), *text.models().unwrap());

    let zeros = vec![Sample::new(0.1, -0.1, 0.05); 3];
    assert_eq!(snap.recognize(&zeros).unwrap(), Shape::Circle);
    assert_eq!(snap.recognize(&near_one()).unwrap(), Shape::Clock);
}

#[test]
fn snapshot_with_future_version_is_rejected() {
    let f = fixture(ENSEMBLE);
    let recognizer = Recognizer::new();
    recognizer.initialize(&f.codebook, &f.ensemble).unwrap();

    let snap_path = f.dir.path().join("models.wnds");
    recognizer.write_snapshot(&snap_path).unwrap();
    let mut bytes = fs::read(&snap_path).unwrap();
    bytes[4] = 9;
    fs::write(&snap_path, bytes).unwrap();

    let fresh = Recognizer::new();
    let err = fresh.initialize_from_snapshot(&snap_path).unwrap_err();
    assert!(matches!(
        err,
        SpellError::Model(wand_models::ModelError::UnsupportedVersion { found: 9, expected: 1 })
    ));
    assert!(!fresh.is_initialized());
}

#[test]
fn trace_files_feed_recognition() {
    let f = fixture(ENSEMBLE);
    let recognizer = Recognizer::new();
    recognizer.initialize(&f.codebook, &f.ensemble).unwrap();

    let path = write_trace(f.dir.path(), "clock.txt", &near_one());
    let samples = read_trace(&path).unwrap();
    assert_eq!(samples.len(), 5);
    assert_eq!(recognizer.recognize(&samples).unwrap(), Shape::Clock);

    let empty = f.dir.path().join("empty.txt");
    fs::write(&empty, "\n").unwrap();
    let samples = read_trace(&empty).unwrap();
    assert!(matches!(recognizer.recognize(&samples), Err(SpellError::EmptyInput)));
}

#[test]
fn null_rejection_maps_to_fail() {
    let strict = ENSEMBLE
        .replacen("UseNullRejection: 0", "UseNullRejection: 1", 1)
        .replacen("NullRejectionThresholds: 0 0", "NullRejectionThresholds: 1 1", 1);
    let f = fixture(&strict);
    let recognizer = Recognizer::new();
    recognizer.initialize(&f.codebook, &f.ensemble).unwrap();

    let detail = recognizer.recognize_detailed(&near_one()).unwrap();
    assert_eq!(detail.result.predicted_label, 0);
    assert_eq!(detail.shape, Shape::Fail);
}
