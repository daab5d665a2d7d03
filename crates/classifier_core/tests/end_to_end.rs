//! End-to-end tests: train, predict, persist and reload a classifier

use anyhow::Result;
use roiclass_core::deterministic::LcgRng;
use roiclass_core::{Classifier, ClassifierConfig, ClassifierError, DescriptorRecord, Model};
use tempfile::tempdir;

fn keys() -> Vec<String> {
    vec!["signal".to_string(), "noise".to_string()]
}

/// 200 objects: descriptor 0 decides the label, descriptor 1 is noise
fn synthetic_training_set(seed: i64) -> (Vec<Vec<f64>>, Vec<f64>) {
    let mut rng = LcgRng::new(seed);
    let matrix: Vec<Vec<f64>> = (0..200)
        .map(|_| vec![rng.next_f64() * 4.0 - 2.0, rng.next_f64() * 6.0 - 3.0])
        .collect();
    let labels = matrix
        .iter()
        .map(|row| if row[0] > 0.0 { 1.0 } else { 0.0 })
        .collect();
    (matrix, labels)
}

fn record(signal: f64, noise: f64) -> DescriptorRecord {
    [("signal".to_string(), signal), ("noise".to_string(), noise)]
        .into_iter()
        .collect()
}

#[test]
fn test_informative_descriptor_dominates() -> Result<()> {
    let (matrix, labels) = synthetic_training_set(42);
    let mut classifier = Classifier::new(ClassifierConfig::default());
    classifier.train(&matrix, &labels, &keys())?;

    for noise in [-50.0, -3.0, -0.7, 0.0, 1.3, 3.0, 50.0] {
        let predictions = classifier.predict(&[record(1.0, noise), record(-1.0, noise)])?;
        assert!(
            predictions[0].probability > 0.9,
            "signal=+1 noise={noise} gave {}",
            predictions[0].probability
        );
        assert!(predictions[0].is_cell);
        assert!(
            predictions[1].probability < 0.1,
            "signal=-1 noise={noise} gave {}",
            predictions[1].probability
        );
        assert!(!predictions[1].is_cell);
    }

    let model = classifier.model().expect("trained");
    assert!(model.calibration.weights[0] > model.calibration.weights[1].abs());
    Ok(())
}

#[test]
fn test_probabilities_stay_in_unit_interval() -> Result<()> {
    let (matrix, labels) = synthetic_training_set(7);
    let mut classifier = Classifier::new(ClassifierConfig::default());
    classifier.train(&matrix, &labels, &keys())?;

    let records: Vec<DescriptorRecord> = [
        (f64::MIN, f64::MAX),
        (-1e12, 1e12),
        (0.0, 0.0),
        (f64::INFINITY, f64::NEG_INFINITY),
        (2.0, -3.0),
    ]
    .iter()
    .map(|&(s, n)| record(s, n))
    .collect();

    for prediction in classifier.predict(&records)? {
        assert!((0.0..=1.0).contains(&prediction.probability));
        assert_eq!(prediction.is_cell, prediction.probability > 0.5);
    }
    Ok(())
}

#[test]
fn test_save_load_reproduces_predictions() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("classifier.json");

    let (matrix, labels) = synthetic_training_set(3);
    let mut trained = Classifier::new(ClassifierConfig::default());
    trained.train(&matrix, &labels, &keys())?;
    trained.save(&path)?;

    let (loaded, outcome) = Classifier::from_file(ClassifierConfig::default(), &path);
    outcome?;
    assert!(loaded.is_trained());
    assert_eq!(loaded.keys(), trained.keys());

    let (reference, _) = synthetic_training_set(99);
    let before = trained.predict_matrix(&reference)?;
    let after = loaded.predict_matrix(&reference)?;
    assert_eq!(before, after);

    Ok(())
}

#[test]
fn test_missing_descriptor_reported_at_predict() -> Result<()> {
    let (matrix, labels) = synthetic_training_set(5);
    let mut classifier = Classifier::new(ClassifierConfig::default());
    classifier.train(&matrix, &labels, &keys())?;

    let partial: DescriptorRecord = [("signal".to_string(), 1.0)].into_iter().collect();
    let err = classifier
        .predict(&[record(0.5, 0.5), partial])
        .expect_err("noise descriptor is missing");

    match err {
        ClassifierError::MissingDescriptor { object, key } => {
            assert_eq!(object, 1);
            assert_eq!(key, "noise");
        }
        other => panic!("unexpected error: {other}"),
    }
    Ok(())
}

#[test]
fn test_corrupt_model_file_leaves_classifier_untrained() -> Result<()> {
    let dir = tempdir()?;
    let good = dir.path().join("good.json");
    let bad = dir.path().join("bad.json");

    let (matrix, labels) = synthetic_training_set(8);
    let mut classifier = Classifier::new(ClassifierConfig::default());
    classifier.train(&matrix, &labels, &keys())?;
    classifier.save(&good)?;

    std::fs::write(&bad, b"{\"keys\": [\"signal\"], \"version\": 1")?;
    let err = classifier.load(&bad).expect_err("truncated file");
    assert!(matches!(err, ClassifierError::LoadFailure { .. }));
    assert!(!classifier.is_trained());

    let (_, outcome) = Classifier::from_file(ClassifierConfig::default(), dir.path().join("absent.json"));
    assert!(matches!(outcome, Err(ClassifierError::LoadFailure { .. })));

    classifier.load(&good)?;
    assert!(classifier.is_trained());
    Ok(())
}

#[test]
fn test_model_file_is_canonical_and_stable() -> Result<()> {
    let dir = tempdir()?;
    let (matrix, labels) = synthetic_training_set(21);

    let first = roiclass_core::train_model(&matrix, &labels, &keys(), &ClassifierConfig::default())?;
    let second = roiclass_core::train_model(&matrix, &labels, &keys(), &ClassifierConfig::default())?;
    assert_eq!(first.model_hash, second.model_hash);

    let path = dir.path().join("model.json");
    first.save(&path)?;
    let reloaded = Model::load(&path)?;
    assert_eq!(std::fs::read_to_string(&path)?, reloaded.to_canonical_json()?);
    Ok(())
}
