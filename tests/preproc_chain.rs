//! Cross-crate smoke test: preset steps wired into a pipeline, output
//! locations inferred from subject/session identifiers, and the native
//! blood-curve resample actually executed.

use std::fs;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::json;

use pet_adapters::ops::resample_blood_tac;
use pet_adapters::presets::{default_threshold_cropping, default_windowed_moco, step_fn};
use pet_bids::{load_sidecar, save_json, save_tsv_simple};
use pet_core::{CallArgs, ImageToImageStep, Pipeline, ResampleBloodTacStep, StepFn};

fn copy_image_fn() -> StepFn {
    Arc::new(|args: &CallArgs| {
        let input = args.str_at(0).unwrap_or_default();
        let output = args.str_at(1).unwrap_or_default();
        fs::copy(input, output)?;
        Ok(())
    })
}

#[test]
fn presets_infer_derivative_paths_from_the_input_image() {
    let mut crop = default_threshold_cropping(None);
    crop.set_input_image_path("/data/sub-01/ses-01/pet/sub-01_ses-01_pet.nii.gz");
    crop.infer_outputs_from_inputs("/out", "preproc", None, None, &IndexMap::new());
    assert_eq!(
        crop.output_image_path(),
        "/out/sub-01/ses-01/preproc/sub-01_ses-01_desc-ThreshCrop_pet.nii.gz"
    );

    let mut moco = default_windowed_moco(None);
    moco.set_input_image_path(crop.output_image_path());
    moco.infer_outputs_from_inputs("/out", "preproc", None, None, &IndexMap::new());
    assert_eq!(
        moco.output_image_path(),
        "/out/sub-01/ses-01/preproc/sub-01_ses-01_desc-WindowedMoco_pet.nii.gz"
    );
}

#[test]
fn linked_chain_runs_and_carries_metadata_into_the_blood_resample() {
    let dir = tempfile::tempdir().expect("tempdir");
    let raw = dir.path().join("raw");
    fs::create_dir_all(&raw).expect("raw dir");
    let out = dir.path().join("derivatives").to_string_lossy().into_owned();

    let pet = raw.join("sub-02_ses-01_pet.nii.gz");
    fs::write(&pet, b"img").expect("write image");
    save_json(
        &json!({"FrameReferenceTime": [60.0, 180.0]}),
        &raw.join("sub-02_ses-01_pet.json").to_string_lossy(),
    )
    .expect("write sidecar");

    let blood = raw.join("sub-02_ses-01_blood.tsv");
    save_tsv_simple(
        &blood,
        &[
            vec!["0".to_string(), "0".to_string()],
            vec!["120".to_string(), "12".to_string()],
            vec!["240".to_string(), "24".to_string()],
        ],
    )
    .expect("write blood curve");

    let mut crop = ImageToImageStep::new(
        "thresh_crop",
        copy_image_fn(),
        pet.to_string_lossy(),
        "",
        CallArgs::new(),
    );
    crop.infer_outputs_from_inputs(&out, "preproc", None, None, &IndexMap::new());
    let cropped = crop.output_image_path().to_string();
    fs::create_dir_all(std::path::Path::new(&cropped).parent().expect("parent"))
        .expect("out dir");

    let resample = ResampleBloodTacStep::new(
        step_fn(resample_blood_tac),
        blood.to_string_lossy(),
        "",
        "",
        30.0,
        1.0,
    );

    let mut pipeline = Pipeline::new("chain");
    pipeline.add_step(crop).expect("add crop");
    pipeline.add_step(resample).expect("add resample");
    pipeline.link("thresh_crop", "resample_PTAC_on_scanner").expect("link");
    pipeline
        .step_mut("resample_PTAC_on_scanner")
        .expect("present")
        .infer_outputs_from_inputs(&out, "preproc", None, None, &IndexMap::new())
        .expect("infer");
    let resampled_path = pipeline
        .step("resample_PTAC_on_scanner")
        .expect("present")
        .call_args()
        .get_str("out_tac_path")
        .expect("inferred")
        .to_string();
    assert!(resampled_path
        .ends_with("sub-02/ses-01/preproc/sub-02_ses-01_desc-OnScannerFrameTimes_blood.tsv"));
    fs::create_dir_all(std::path::Path::new(&resampled_path).parent().expect("parent"))
        .expect("out dir");

    let report = pipeline.run().expect("chain runs");
    assert_eq!(report.steps_run, vec!["thresh_crop", "resample_PTAC_on_scanner"]);

    // The image step copied the sidecar forward, and the resample read its
    // frame times through that copy.
    let copied = load_sidecar(&cropped).expect("load").expect("sidecar copied");
    assert_eq!(copied["FrameReferenceTime"], json!([60.0, 180.0]));
    assert!(std::path::Path::new(&resampled_path).exists());
}
