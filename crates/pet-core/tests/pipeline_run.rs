//! Filesystem-backed pipeline runs: readiness gating, metadata propagation,
//! and error surfacing.

use std::fs;
use std::sync::Arc;

use serde_json::json;

use pet_bids::{load_sidecar, save_json, sidecar_path_for};
use pet_core::{CallArgs, FunctionStep, ImageToImageStep, Pipeline, StepError, StepFn};

/// Stand-in image transform: copies the input file to the output path.
fn copy_file() -> StepFn {
    Arc::new(|args: &CallArgs| {
        let input = args.str_at(0).ok_or("missing input path")?;
        let output = args.str_at(1).ok_or("missing output path")?;
        fs::copy(input, output)?;
        Ok(())
    })
}

#[test]
fn linked_image_steps_run_in_sequence_and_propagate_metadata() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("sub-01_ses-01_pet.nii.gz");
    fs::write(&input, b"pixels").expect("write image");
    save_json(
        &json!({"FrameReferenceTime": [30.0, 90.0, 210.0]}),
        &dir.path().join("sub-01_ses-01_pet.json").to_string_lossy(),
    )
    .expect("write sidecar");

    let crop_out = dir.path().join("sub-01_ses-01_desc-Crop_pet.nii.gz");
    let moco_out = dir.path().join("sub-01_ses-01_desc-Moco_pet.nii.gz");

    let crop = ImageToImageStep::new(
        "crop", copy_file(), input.to_string_lossy(), crop_out.to_string_lossy(), CallArgs::new(),
    );
    let moco = ImageToImageStep::new(
        "moco", copy_file(), "", moco_out.to_string_lossy(), CallArgs::new(),
    );

    let mut pipeline = Pipeline::new("preproc");
    pipeline.add_step(crop).expect("add crop");
    pipeline.add_step(moco).expect("add moco");
    pipeline.link("crop", "moco").expect("link crop -> moco");

    let report = pipeline.run().expect("pipeline runs");
    assert_eq!(report.steps_run, vec!["crop", "moco"]);
    assert!(moco_out.exists());

    // Acquisition metadata followed the image through both hops.
    for image in [&crop_out, &moco_out] {
        let meta = load_sidecar(&image.to_string_lossy()).expect("load").expect("sidecar present");
        assert_eq!(meta["FrameReferenceTime"], json!([30.0, 90.0, 210.0]));
    }
}

#[test]
fn metadata_copy_can_be_skipped_on_the_concrete_step() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("sub-01_ses-01_pet.nii.gz");
    let output = dir.path().join("out_pet.nii.gz");
    fs::write(&input, b"pixels").expect("write image");
    save_json(&json!({"TracerName": "PIB"}),
              &dir.path().join("sub-01_ses-01_pet.json").to_string_lossy())
        .expect("write sidecar");

    let step = ImageToImageStep::new(
        "crop", copy_file(), input.to_string_lossy(), output.to_string_lossy(), CallArgs::new(),
    );
    step.execute(false).expect("runs without meta copy");
    assert!(output.exists());
    assert!(!sidecar_path_for(&output.to_string_lossy()).exists());
}

#[test]
fn run_refuses_steps_with_empty_required_slots() {
    let mut pipeline = Pipeline::new("preproc");
    let step = ImageToImageStep::new("crop", copy_file(), "", "", CallArgs::new());
    pipeline.add_step(step).expect("add");

    let err = pipeline.run().expect_err("empty slots block the run");
    match err {
        StepError::NotReady { step, missing } => {
            assert_eq!(step, "crop");
            assert!(missing.contains(&"input_image_path".to_string()));
            assert!(missing.contains(&"output_image_path".to_string()));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn execution_failures_surface_unmodified_and_abort_the_run() {
    let mut pipeline = Pipeline::new("failing");
    pipeline
        .add_step(FunctionStep::new(
            "boom",
            Arc::new(|_: &CallArgs| Err("bad input data".into())),
            CallArgs::new(),
        ))
        .expect("add boom");
    let ran = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let flag = ran.clone();
    pipeline
        .add_step(FunctionStep::new(
            "never_reached",
            Arc::new(move |_: &CallArgs| {
                flag.store(true, std::sync::atomic::Ordering::SeqCst);
                Ok(())
            }),
            CallArgs::new(),
        ))
        .expect("add follower");

    let err = pipeline.run().expect_err("first step fails");
    match err {
        StepError::Execution { step, source } => {
            assert_eq!(step, "boom");
            assert_eq!(source.to_string(), "bad input data");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!ran.load(std::sync::atomic::Ordering::SeqCst));
}

#[test]
fn duplicate_step_names_are_rejected() {
    let mut pipeline = Pipeline::new("preproc");
    pipeline
        .add_step(FunctionStep::new("crop", copy_file(), CallArgs::new()))
        .expect("first crop");
    let err = pipeline
        .add_step(FunctionStep::new("crop", copy_file(), CallArgs::new()))
        .expect_err("second crop rejected");
    assert!(matches!(err, StepError::DuplicateStepName { .. }));
}

#[test]
fn linking_unknown_names_reports_which_step_is_missing() {
    let mut pipeline = Pipeline::new("preproc");
    pipeline
        .add_step(FunctionStep::new("crop", copy_file(), CallArgs::new()))
        .expect("add");
    let err = pipeline.link("crop", "moco").expect_err("no moco yet");
    assert!(matches!(err, StepError::UnknownStep { name, .. } if name == "moco"));
}
