//! JSON sidecar handling.
//!
//! An image `x.nii.gz` (or `x.nii`) may travel with a companion metadata
//! record `x.json` describing acquisition (frame timing, tracer, units).
//! Image transforms only touch pixel data, so the sidecar must be carried
//! forward explicitly or downstream time-series analysis silently loses its
//! timing information.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::BidsError;

/// Companion metadata path for an image: extensions are replaced by `.json`.
pub fn sidecar_path_for(image_path: &str) -> PathBuf {
    let path = Path::new(image_path);
    let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    let stem = if let Some(stripped) = name.strip_suffix(".nii.gz") {
        stripped.to_string()
    } else {
        Path::new(&name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or(name)
    };
    path.with_file_name(format!("{stem}.json"))
}

/// Loads the sidecar record for `image_path`, `None` when there is none.
pub fn load_sidecar(image_path: &str) -> Result<Option<Value>, BidsError> {
    let sidecar = sidecar_path_for(image_path);
    if !sidecar.exists() {
        return Ok(None);
    }
    let text = fs::read_to_string(&sidecar).map_err(|source| BidsError::Io {
        path: sidecar.to_string_lossy().into_owned(),
        source,
    })?;
    let value = serde_json::from_str(&text).map_err(|source| BidsError::Json {
        path: sidecar.to_string_lossy().into_owned(),
        source,
    })?;
    Ok(Some(value))
}

/// Copies the input image's sidecar next to the output image.
///
/// A missing input sidecar is a no-op, not an error.
pub fn safe_copy_meta(input_image_path: &str, out_image_path: &str) -> Result<(), BidsError> {
    let meta = match load_sidecar(input_image_path)? {
        Some(meta) => meta,
        None => {
            debug!(image = input_image_path, "no sidecar to copy");
            return Ok(());
        }
    };
    let out_sidecar = sidecar_path_for(out_image_path);
    save_json(&meta, &out_sidecar.to_string_lossy())
}

/// Writes `value` as indented JSON; appends `.json` when the path lacks it.
pub fn save_json(value: &Value, filepath: &str) -> Result<(), BidsError> {
    let path = if filepath.ends_with(".json") {
        filepath.to_string()
    } else {
        format!("{filepath}.json")
    };
    let mut text = serde_json::to_string_pretty(value).map_err(|source| BidsError::Json {
        path: path.clone(),
        source,
    })?;
    text.push('\n');
    fs::write(&path, text).map_err(|source| BidsError::Io { path, source })
}

/// Reads the frame-timing array stored under `keyword` (seconds per frame)
/// from the image's sidecar.
pub fn frame_times_from_sidecar(image_path: &str, keyword: &str) -> Result<Vec<f64>, BidsError> {
    let missing = || BidsError::MissingFrameTiming {
        image: image_path.to_string(),
        keyword: keyword.to_string(),
    };
    let meta = load_sidecar(image_path)?.ok_or_else(missing)?;
    let frames = meta.get(keyword).and_then(Value::as_array).ok_or_else(missing)?;
    let times: Option<Vec<f64>> = frames.iter().map(Value::as_f64).collect();
    times.filter(|t| !t.is_empty()).ok_or_else(missing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sidecar_path_strips_double_extension() {
        assert_eq!(sidecar_path_for("/d/sub-01_ses-01_pet.nii.gz"),
                   PathBuf::from("/d/sub-01_ses-01_pet.json"));
        assert_eq!(sidecar_path_for("/d/sub-01_ses-01_pet.nii"),
                   PathBuf::from("/d/sub-01_ses-01_pet.json"));
    }

    #[test]
    fn copy_meta_is_noop_without_input_sidecar() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("in_pet.nii.gz");
        let output = dir.path().join("out_pet.nii.gz");
        fs::write(&input, b"img").expect("write");
        safe_copy_meta(&input.to_string_lossy(), &output.to_string_lossy()).expect("no-op copy");
        assert!(!sidecar_path_for(&output.to_string_lossy()).exists());
    }

    #[test]
    fn copy_meta_carries_sidecar_forward() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("in_pet.nii.gz");
        let output = dir.path().join("out_pet.nii.gz");
        fs::write(&input, b"img").expect("write");
        let meta = json!({"FrameReferenceTime": [30.0, 90.0], "TracerName": "PIB"});
        save_json(&meta, &dir.path().join("in_pet.json").to_string_lossy()).expect("save");

        safe_copy_meta(&input.to_string_lossy(), &output.to_string_lossy()).expect("copy");
        let copied = load_sidecar(&output.to_string_lossy()).expect("load").expect("present");
        assert_eq!(copied, meta);
    }

    #[test]
    fn frame_times_require_the_keyword_array() {
        let dir = tempfile::tempdir().expect("tempdir");
        let image = dir.path().join("sub-01_ses-01_pet.nii.gz");
        save_json(&json!({"FrameReferenceTime": [15.0, 45.0, 105.0]}),
                  &dir.path().join("sub-01_ses-01_pet.json").to_string_lossy())
            .expect("save");

        let times = frame_times_from_sidecar(&image.to_string_lossy(), "FrameReferenceTime")
            .expect("frame times");
        assert_eq!(times, vec![15.0, 45.0, 105.0]);

        let err = frame_times_from_sidecar(&image.to_string_lossy(), "FrameTimesStart");
        assert!(matches!(err, Err(BidsError::MissingFrameTiming { .. })));
    }
}
