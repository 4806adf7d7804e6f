//! Command-line front end for the preprocessing pipeline.
//!
//! `petflow preproc --pet <4D PET> --t1 <anatomical> --out <derivatives dir>
//! [--seg <dseg image> --labels <dseg.tsv>] [--blood <raw blood TSV>]
//! [--verbose]`
//!
//! Builds the standard chain crop -> motion correction -> registration, and
//! optionally hangs TAC extraction and blood-curve resampling off the
//! registered image. All output locations are inferred from the PET file's
//! subject/session identifiers.

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde_json::json;
use tracing_subscriber::EnvFilter;

use pet_adapters::presets::{
    default_moco_frames_above_mean, default_register_pet_to_t1,
    default_resample_blood_tac_on_scanner_times, default_threshold_cropping,
    default_write_tacs_from_segmentation_rois, ParamMap,
};
use pet_core::Pipeline;

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn usage() -> ! {
    eprintln!(
        "Usage: petflow preproc --pet <PATH> --t1 <PATH> --out <DIR> \
         [--seg <PATH> --labels <PATH>] [--blood <PATH>] [--verbose]"
    );
    std::process::exit(2);
}

struct PreprocArgs {
    pet: String,
    t1: String,
    out: String,
    seg: Option<String>,
    labels: Option<String>,
    blood: Option<String>,
    verbose: bool,
}

fn parse_preproc_args(args: &[String]) -> PreprocArgs {
    let mut pet = None;
    let mut t1 = None;
    let mut out = None;
    let mut seg = None;
    let mut labels = None;
    let mut blood = None;
    let mut verbose = false;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--pet" => {
                i += 1;
                pet = args.get(i).cloned();
            }
            "--t1" => {
                i += 1;
                t1 = args.get(i).cloned();
            }
            "--out" => {
                i += 1;
                out = args.get(i).cloned();
            }
            "--seg" => {
                i += 1;
                seg = args.get(i).cloned();
            }
            "--labels" => {
                i += 1;
                labels = args.get(i).cloned();
            }
            "--blood" => {
                i += 1;
                blood = args.get(i).cloned();
            }
            "--verbose" => verbose = true,
            other => {
                eprintln!("unknown option: {other}");
                usage();
            }
        }
        i += 1;
    }
    let (Some(pet), Some(t1), Some(out)) = (pet, t1, out) else {
        usage();
    };
    if seg.is_some() != labels.is_some() {
        eprintln!("--seg and --labels must be given together");
        usage();
    }
    PreprocArgs { pet, t1, out, seg, labels, blood, verbose }
}

fn ensure_parent_dir(path: &str) -> Result<(), String> {
    if let Some(parent) = Path::new(path).parent() {
        fs::create_dir_all(parent).map_err(|e| format!("cannot create {}: {e}", parent.display()))?;
    }
    Ok(())
}

fn run_preproc(args: &PreprocArgs) -> Result<(), String> {
    let no_extra = IndexMap::new();

    let mut crop = default_threshold_cropping(None);
    crop.set_input_image_path(&args.pet);
    crop.infer_outputs_from_inputs(&args.out, "preproc", None, None, &no_extra);

    let mut moco = default_moco_frames_above_mean(None);
    moco.set_input_image_path(crop.output_image_path());
    moco.infer_outputs_from_inputs(&args.out, "preproc", None, None, &no_extra);

    let mut reg_overrides = ParamMap::new();
    reg_overrides.insert("reference_image_path".to_string(), json!(args.t1.as_str()));
    if args.verbose {
        reg_overrides.insert("verbose".to_string(), json!(true));
    }
    let mut register = default_register_pet_to_t1(Some(&reg_overrides));
    register.set_input_image_path(moco.output_image_path());
    register.infer_outputs_from_inputs(&args.out, "preproc", None, None, &no_extra);

    for path in [crop.output_image_path(), moco.output_image_path(), register.output_image_path()]
    {
        ensure_parent_dir(path)?;
    }
    let registered = register.output_image_path().to_string();

    let mut pipeline = Pipeline::new("preproc");
    pipeline.add_step(crop).map_err(|e| e.to_string())?;
    pipeline.add_step(moco).map_err(|e| e.to_string())?;
    pipeline.add_step(register).map_err(|e| e.to_string())?;

    if let (Some(seg), Some(labels)) = (&args.seg, &args.labels) {
        let mut tacs = default_write_tacs_from_segmentation_rois();
        tacs.set_input_image_path(&registered);
        tacs.set_segmentation_image_path(seg);
        tacs.set_segmentation_label_map_path(labels);
        tacs.infer_outputs_from_inputs(&args.out);
        pipeline.add_step(tacs).map_err(|e| e.to_string())?;
    }

    if let Some(blood) = &args.blood {
        let mut resample = default_resample_blood_tac_on_scanner_times();
        resample.set_raw_blood_tac_path(blood);
        resample.set_input_image_path(&registered);
        resample.infer_outputs_from_inputs(&args.out, None, None, &no_extra);
        ensure_parent_dir(resample.resampled_tac_path())?;
        pipeline.add_step(resample).map_err(|e| e.to_string())?;
    }

    let report = pipeline.run().map_err(|e| e.to_string())?;
    println!(
        "run {} finished: {} step(s): {}",
        report.run_id,
        report.steps_run.len(),
        report.steps_run.join(", ")
    );
    Ok(())
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 || args[1] != "preproc" {
        eprintln!("petflow: use the 'preproc' subcommand");
        usage();
    }
    let parsed = parse_preproc_args(&args[2..]);
    init_tracing(parsed.verbose);
    if let Err(e) = run_preproc(&parsed) {
        eprintln!("petflow preproc failed: {e}");
        std::process::exit(1);
    }
}
