//! End-to-end blood-curve resampling through a typed step.

use serde_json::json;

use pet_adapters::ops::resample_blood_tac;
use pet_adapters::presets::step_fn;
use pet_bids::{load_tsv_simple, save_json, save_tsv_simple};
use pet_core::ResampleBloodTacStep;

#[test]
fn resamples_a_raw_curve_onto_reference_frame_times() {
    let dir = tempfile::tempdir().expect("tempdir");
    let blood_path = dir.path().join("sub-02_ses-01_blood.tsv");
    let reference = dir.path().join("sub-02_ses-01_pet.nii.gz");
    let out_path = dir.path().join("resampled_blood.tsv");

    // Early samples lie exactly on the line a = 0.01 * t; late samples form
    // a descending tail for interpolation.
    let rows: Vec<Vec<String>> = [
        ("time", "activity"),
        ("0", "0"),
        ("300", "3"),
        ("600", "6"),
        ("1200", "12"),
        ("2400", "10"),
        ("3600", "5"),
    ]
    .iter()
    .map(|(t, a)| vec![t.to_string(), a.to_string()])
    .collect();
    save_tsv_simple(&blood_path, &rows).expect("save raw curve");
    save_json(
        &json!({"FrameReferenceTime": [150.0, 3000.0]}),
        &dir.path().join("sub-02_ses-01_pet.json").to_string_lossy(),
    )
    .expect("save sidecar");

    let step = ResampleBloodTacStep::new(
        step_fn(resample_blood_tac),
        blood_path.to_string_lossy(),
        reference.to_string_lossy(),
        out_path.to_string_lossy(),
        30.0,
        2.0,
    );
    assert!(step.can_potentially_run());
    step.execute().expect("resampling succeeds");

    let written = load_tsv_simple(&out_path).expect("load output");
    assert_eq!(written[0], vec!["time".to_string(), "activity".to_string()]);
    let parse = |row: &[String]| -> (f64, f64) {
        (row[0].parse().expect("time"), row[1].parse().expect("activity"))
    };
    // t=150 sits inside the fit window: 0.01 * 150 * rescale 2 = 3.
    let (t, a) = parse(&written[1]);
    assert_eq!(t, 150.0);
    assert!((a - 3.0).abs() < 1e-9);
    // t=3000 interpolates between (2400, 10) and (3600, 5): 7.5 * 2 = 15.
    let (t, a) = parse(&written[2]);
    assert_eq!(t, 3000.0);
    assert!((a - 15.0).abs() < 1e-9);
}

#[test]
fn missing_reference_sidecar_is_an_execution_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let blood_path = dir.path().join("sub-02_ses-01_blood.tsv");
    save_tsv_simple(&blood_path, &[vec!["0".to_string(), "0".to_string()]]).expect("save");

    let step = ResampleBloodTacStep::new(
        step_fn(resample_blood_tac),
        blood_path.to_string_lossy(),
        dir.path().join("no_such_pet.nii.gz").to_string_lossy(),
        dir.path().join("out.tsv").to_string_lossy(),
        30.0,
        37000.0,
    );
    let err = step.execute().expect_err("no frame timing available");
    assert!(err.to_string().contains("resample_PTAC_on_scanner"));
}
