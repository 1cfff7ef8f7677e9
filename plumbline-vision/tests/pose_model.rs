use anyhow::Result;
use plumbline_vision::{plumb, LandmarkSource, PoseDetector};
use std::path::Path;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

const MODEL: &str = "models/pose_landmark_full.onnx";

#[test]
#[ignore]
fn test_detector_on_side_view() -> Result<()> {
    init_logging();
    let mut detector = PoseDetector::new(Path::new(MODEL))?;

    let img_path = "test_images/side_left.jpg";
    let img = image::open(img_path)?;
    println!("\n=== {} ({}x{}) ===", img_path, img.width(), img.height());

    let landmarks = detector.detect(&img)?;
    assert!(!landmarks.is_empty(), "No body detected in {}", img_path);
    for (lm, (x, y)) in landmarks.iter() {
        println!("  {:?}: ({}, {})", lm, x, y);
        assert!(x < img.width() && y < img.height());
    }

    let plumb_line = plumb::analyze(img.width(), img.height(), &landmarks)?;
    println!("deviations: {:?}", plumb_line.deviations);

    let annotated = plumb::annotate(&img, &plumb_line, &landmarks);
    annotated.save("side_left_annotated.png")?;
    println!("Saved annotated image to side_left_annotated.png");
    Ok(())
}

#[test]
fn test_missing_model_is_reported() {
    init_logging();
    let err = match PoseDetector::new(Path::new("models/does_not_exist.onnx")) {
        Ok(_) => panic!("detector built without a model"),
        Err(e) => e,
    };
    assert!(err.to_string().contains("does_not_exist.onnx"));
}
