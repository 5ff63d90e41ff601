mod common;

use aspire::{ClassifierError, Predictor, Profile, Subject, CAREER_LABELS};
use env_logger::{Builder, Env};

fn init() {
    let _ = Builder::from_env(Env::default().default_filter_or("warn"))
        .is_test(true)
        .try_init();
}

#[test]
fn test_onnx_pipeline_end_to_end() -> Result<(), Box<dyn std::error::Error>> {
    init();
    let dir = tempfile::tempdir()?;
    let scaler = common::write(dir.path(), "scaler.onnx", &common::identity_scaler(14))?;
    let model = common::write(dir.path(), "model.onnx", &common::softmax_classifier(14, 17))?;

    let predictor = Predictor::builder()
        .with_scaler_path(&scaler)
        .with_model_path(&model)
        .build()?;

    // Class count comes from the zero-row check at load, and the `probabilities`
    // output is picked over the leading `label` output
    let info = predictor.info();
    assert_eq!(info.num_features, 14);
    assert_eq!(info.num_classes, CAREER_LABELS.len());
    assert!(!info.placeholder);

    let profile = Profile::default().with_score(Subject::Physics, 95);
    let predictions = predictor.predict_profile(&profile)?;
    assert_eq!(predictions.len(), 5);
    for pair in predictions.windows(2) {
        assert!(pair[0].probability >= pair[1].probability);
    }
    assert!(predictions.iter().all(|p| p.probability.is_finite()));
    assert_eq!(predictions, predictor.predict_profile(&profile)?);
    Ok(())
}

#[test]
fn test_onnx_class_count_mismatch() -> Result<(), Box<dyn std::error::Error>> {
    init();
    let dir = tempfile::tempdir()?;
    let scaler = common::write(dir.path(), "scaler.onnx", &common::identity_scaler(14))?;
    let model = common::write(dir.path(), "model.onnx", &common::softmax_classifier(14, 16))?;

    let err = Predictor::builder()
        .with_scaler_path(&scaler)
        .with_model_path(&model)
        .build()
        .unwrap_err();
    assert!(matches!(
        err,
        ClassifierError::LabelMismatch {
            labels: 17,
            classes: 16
        }
    ));
    Ok(())
}

#[test]
fn test_onnx_scaler_wrong_width() -> Result<(), Box<dyn std::error::Error>> {
    init();
    let dir = tempfile::tempdir()?;
    let scaler = common::write(dir.path(), "scaler.onnx", &common::projection_scaler(14, 10))?;
    let model = common::write(dir.path(), "model.onnx", &common::softmax_classifier(14, 17))?;

    let err = Predictor::builder()
        .with_scaler_path(&scaler)
        .with_model_path(&model)
        .build()
        .unwrap_err();
    assert!(matches!(
        err,
        ClassifierError::FeatureMismatch {
            expected: 14,
            actual: 10
        }
    ));
    Ok(())
}

#[test]
fn test_onnx_rejected_zero_row_is_load_error() -> Result<(), Box<dyn std::error::Error>> {
    init();
    let dir = tempfile::tempdir()?;
    let scaler = common::write(dir.path(), "scaler.onnx", &common::identity_scaler(14))?;
    // Declares 10 input columns, so a 14-column row is rejected by the runtime
    let model = common::write(dir.path(), "model.onnx", &common::softmax_classifier(10, 17))?;

    let err = Predictor::builder()
        .with_scaler_path(&scaler)
        .with_model_path(&model)
        .build()
        .unwrap_err();
    assert!(matches!(err, ClassifierError::ArtifactLoad(_)));
    assert!(err.to_string().contains("Zero-row check"));
    Ok(())
}

#[test]
fn test_onnx_garbage_file_is_load_error() -> Result<(), Box<dyn std::error::Error>> {
    init();
    let dir = tempfile::tempdir()?;
    let scaler = common::write(dir.path(), "scaler.onnx", b"not a protobuf")?;
    let model = common::write(dir.path(), "model.onnx", &common::softmax_classifier(14, 17))?;

    let err = Predictor::builder()
        .with_scaler_path(&scaler)
        .with_model_path(&model)
        .build()
        .unwrap_err();
    assert!(matches!(err, ClassifierError::ArtifactLoad(_)));
    assert!(err.is_startup_fatal());
    Ok(())
}
