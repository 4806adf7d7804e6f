//! Self-contained demo of the composition engine.
//!
//! Builds a scratch dataset under the system temp directory, wires a small
//! preprocessing chain with closure-backed image transforms (so the demo
//! runs without any imaging toolkit installed), and finishes with a real
//! blood-curve resample against the scanner frame times.

use std::fs;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::json;
use tracing_subscriber::EnvFilter;

use pet_adapters::ops::resample_blood_tac;
use pet_adapters::presets::step_fn;
use pet_bids::{load_tsv_simple, save_json, save_tsv_simple};
use pet_core::{CallArgs, ImageToImageStep, Pipeline, ResampleBloodTacStep, StepFn};

/// Stand-in image transform: copies the input file to the output location.
fn copy_image_fn() -> StepFn {
    Arc::new(|args: &CallArgs| {
        let input = args.str_at(0).unwrap_or_default();
        let output = args.str_at(1).unwrap_or_default();
        fs::copy(input, output)?;
        Ok(())
    })
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let root = std::env::temp_dir().join(format!("petflow-demo-{}", std::process::id()));
    let raw_dir = root.join("raw");
    let out_dir = root.join("derivatives");
    fs::create_dir_all(&raw_dir).expect("create raw dir");

    // Scratch inputs: a fake 4D PET image with a frame-timing sidecar, plus
    // a raw arterial blood curve.
    let pet_path = raw_dir.join("sub-01_ses-01_pet.nii.gz");
    fs::write(&pet_path, b"not really pixel data").expect("write image");
    save_json(
        &json!({
            "FrameReferenceTime": [30.0, 90.0, 150.0, 300.0],
            "TracerName": "demo"
        }),
        &raw_dir.join("sub-01_ses-01_pet.json").to_string_lossy(),
    )
    .expect("write sidecar");

    let blood_path = raw_dir.join("sub-01_ses-01_blood.tsv");
    let blood_rows: Vec<Vec<String>> = [("time", "activity"), ("0", "0"), ("60", "6"),
                                        ("120", "12"), ("240", "18"), ("360", "15")]
        .iter()
        .map(|(t, a)| vec![t.to_string(), a.to_string()])
        .collect();
    save_tsv_simple(&blood_path, &blood_rows).expect("write blood curve");

    // Two image steps with inferred outputs, then the blood resample hung
    // off the second step's output image.
    let no_extra = IndexMap::new();
    let out = out_dir.to_string_lossy().into_owned();

    let mut crop = ImageToImageStep::new(
        "thresh_crop",
        copy_image_fn(),
        pet_path.to_string_lossy(),
        "",
        CallArgs::new(),
    );
    crop.infer_outputs_from_inputs(&out, "preproc", None, None, &no_extra);
    println!("{crop}");

    let moco = ImageToImageStep::new("windowed_moco", copy_image_fn(), "", "", CallArgs::new());

    let mut pipeline = Pipeline::new("demo_preproc");
    pipeline.add_step(crop).expect("unique step name");
    pipeline.add_step(moco).expect("unique step name");
    pipeline.link("thresh_crop", "windowed_moco").expect("image steps link");
    pipeline
        .step_mut("windowed_moco")
        .expect("step present")
        .infer_outputs_from_inputs(&out, "preproc", None, None, &no_extra)
        .expect("image steps infer outputs");

    let resample = ResampleBloodTacStep::new(
        step_fn(resample_blood_tac),
        blood_path.to_string_lossy(),
        "",
        "",
        30.0,
        1.0,
    );
    println!("standalone blood step ready? {}", resample.can_potentially_run());
    pipeline.add_step(resample).expect("unique step name");
    pipeline.link("windowed_moco", "resample_PTAC_on_scanner").expect("reference image links");
    pipeline
        .step_mut("resample_PTAC_on_scanner")
        .expect("step present")
        .infer_outputs_from_inputs(&out, "preproc", None, None, &no_extra)
        .expect("blood step infers outputs");

    for step in pipeline.steps() {
        for slot in step.missing_slots() {
            println!("{}: slot `{slot}` still empty", step.name());
        }
    }

    // Output directories exist before any step writes into them.
    for step in pipeline.steps() {
        let args = step.call_args();
        if let Some(parent) = args
            .str_at(1)
            .or_else(|| args.get_str("out_tac_path"))
            .map(std::path::Path::new)
            .and_then(std::path::Path::parent)
        {
            fs::create_dir_all(parent).expect("create output dir");
        }
    }

    let report = pipeline.run().expect("demo pipeline runs");
    println!("{}", serde_json::to_string_pretty(&report).expect("report serializes"));

    let resampled = pipeline
        .step("resample_PTAC_on_scanner")
        .expect("step present")
        .call_args()
        .get_str("out_tac_path")
        .expect("path inferred")
        .to_string();
    println!("resampled curve at {resampled}:");
    for row in load_tsv_simple(std::path::Path::new(&resampled)).expect("read resampled curve") {
        println!("  {}", row.join("\t"));
    }
}
