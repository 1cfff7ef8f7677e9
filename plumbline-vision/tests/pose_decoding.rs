use anyhow::Result;
use image::DynamicImage;
use plumbline_vision::{blazepose, pose, PoseLandmark};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Build a flat `[1, 39*5]` landmark tensor placing every point at one canvas pixel
fn tensor_at(px: f32, py: f32) -> Vec<f32> {
    (0..39).flat_map(|_| [px, py, 0.0, 3.0, 3.0]).collect()
}

#[test]
fn test_canvas_points_map_back_to_original_pixels() -> Result<()> {
    init_logging();
    // 300x600 portrait on a 256 canvas: scale 256/600, image spans x in [64, 192)
    let img = DynamicImage::new_rgb8(300, 600);
    let (canvas, placement) = pose::letterbox(&img, 256);
    assert_eq!(canvas.dimensions(), (256, 256));
    println!("placement: {:?}", placement);

    let data = tensor_at(128.0, 64.0);
    let flag = [4.0f32];
    let outputs = [(&[1i64, 195][..], data.as_slice()), (&[1i64, 1][..], &flag[..])];

    let (table, presence) = blazepose::parse_pose_outputs(&outputs)?;
    assert!(blazepose::sigmoid(presence) > 0.9);

    let raw = blazepose::decode_landmarks(&table, 256);
    let (x, y) = placement.to_original(raw[0].x, raw[0].y);
    assert!((x - 150.0).abs() < 1.0, "x={}", x);
    assert!((y - 150.0).abs() < 1.0, "y={}", y);
    assert!(raw[0].visibility > 0.9);
    Ok(())
}

#[test]
fn test_landmark_rows_follow_vocabulary() -> Result<()> {
    init_logging();
    let data: Vec<f32> = (0..39)
        .flat_map(|i| [i as f32, 0.0, 0.0, 0.0, 0.0])
        .collect();
    let flag = [0.0f32];
    let outputs = [(&[1i64, 39, 5][..], data.as_slice()), (&[1i64, 1][..], &flag[..])];

    let (table, _) = blazepose::parse_pose_outputs(&outputs)?;
    let raw = blazepose::decode_landmarks(&table, 256);

    let ankle = PoseLandmark::LeftAnkle.index();
    assert!((raw[ankle].x * 256.0 - ankle as f32).abs() < 1e-4);
    assert_eq!(raw.len(), PoseLandmark::all().len());
    Ok(())
}
