//! Region time-activity-curve extraction.
//!
//! Samples the mean activity of every labeled region across frames via
//! `3dmaskave` and writes one curve file per region, named from the step's
//! inferred output prefix.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use pet_bids::{frame_times_from_sidecar, load_tsv_simple, save_tsv_simple};
use pet_core::CallArgs;

use super::process::ToolInvocation;
use super::require_str;
use crate::errors::OpError;

/// One row of a segmentation label map: integer label and region name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoiLabel {
    pub index: i64,
    pub name: String,
}

/// Parses a BIDS-style `dseg.tsv` label map. Rows whose first cell is not
/// an integer (headers, comments) are skipped; a missing name falls back to
/// `roi<index>`.
pub fn parse_label_map(path: &Path) -> Result<Vec<RoiLabel>, OpError> {
    let rows = load_tsv_simple(path)?;
    let mut labels = Vec::new();
    for row in rows {
        let Some(index) = row.first().and_then(|c| c.trim().parse::<i64>().ok()) else {
            continue;
        };
        let name = row
            .get(1)
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| format!("roi{index}"));
        labels.push(RoiLabel { index, name });
    }
    Ok(labels)
}

/// Region name as a filename-safe CamelCase token, e.g.
/// `left cerebellum-cortex` -> `LeftCerebellumCortex`.
pub fn sanitize_region_name(name: &str) -> String {
    name.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

/// Curve file location: `<dir>/<prefix>_seg-<Region>_tac.tsv`.
pub fn tac_output_path(out_dir: &str, prefix: &str, region: &str) -> PathBuf {
    Path::new(out_dir).join(format!("{prefix}_seg-{region}_tac.tsv"))
}

/// Per-frame mean over one labeled region via `3dmaskave`.
pub fn maskave_invocation(input: &str, segmentation: &str, label: i64) -> ToolInvocation {
    ToolInvocation::new("3dmaskave")
        .arg("-quiet")
        .arg("-mask")
        .arg(segmentation)
        .arg("-mrange")
        .arg(label.to_string())
        .arg(label.to_string())
        .arg(input)
}

fn parse_sampled_values(stdout: &[u8], source: &str) -> Result<Vec<f64>, OpError> {
    let text = String::from_utf8_lossy(stdout);
    let mut values = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let value = line
            .split_whitespace()
            .next()
            .and_then(|v| v.parse::<f64>().ok())
            .ok_or_else(|| OpError::MalformedCurve { path: source.to_string(), line: idx + 1 })?;
        values.push(value);
    }
    Ok(values)
}

/// Writes one TAC file per region of the segmentation.
///
/// Expected keywords: `input_image_path`, `segmentation_image_path`,
/// `label_map_path`, `out_tac_dir`, `out_tac_prefix`, plus
/// `time_frame_keyword` and `verbose`.
pub fn write_roi_tacs(args: &CallArgs) -> Result<(), OpError> {
    let input = require_str(args, "input_image_path")?;
    let segmentation = require_str(args, "segmentation_image_path")?;
    let label_map = require_str(args, "label_map_path")?;
    let out_dir = require_str(args, "out_tac_dir")?;
    let prefix = require_str(args, "out_tac_prefix")?;
    let time_keyword = args.get_str("time_frame_keyword").unwrap_or("FrameReferenceTime");
    let verbose = args.get_bool("verbose").unwrap_or(false);

    fs::create_dir_all(out_dir)
        .map_err(|source| OpError::Io { path: out_dir.to_string(), source })?;
    let frame_times = frame_times_from_sidecar(input, time_keyword)?;
    let labels = parse_label_map(Path::new(label_map))?;

    for label in &labels {
        let stdout = maskave_invocation(input, segmentation, label.index).run()?;
        let values = parse_sampled_values(&stdout, input)?;
        if values.len() != frame_times.len() {
            return Err(OpError::FrameCountMismatch {
                region: label.name.clone(),
                expected: frame_times.len(),
                got: values.len(),
            });
        }
        let mut rows = vec![vec![time_keyword.to_string(), "activity".to_string()]];
        rows.extend(
            frame_times
                .iter()
                .zip(&values)
                .map(|(t, v)| vec![t.to_string(), v.to_string()]),
        );
        let out_path = tac_output_path(out_dir, prefix, &sanitize_region_name(&label.name));
        save_tsv_simple(&out_path, &rows)?;
        if verbose {
            info!(region = %label.name, path = %out_path.display(), "wrote TAC");
        } else {
            debug!(region = %label.name, "wrote TAC");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_map_skips_header_rows() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("dseg.tsv");
        let rows = vec![
            vec!["index".to_string(), "name".to_string()],
            vec!["1".to_string(), "left cerebellum-cortex".to_string()],
            vec!["8".to_string(), "brainstem".to_string()],
            vec!["12".to_string(), "".to_string()],
        ];
        save_tsv_simple(&path, &rows).expect("save");

        let labels = parse_label_map(&path).expect("parse");
        assert_eq!(labels,
                   vec![RoiLabel { index: 1, name: "left cerebellum-cortex".to_string() },
                        RoiLabel { index: 8, name: "brainstem".to_string() },
                        RoiLabel { index: 12, name: "roi12".to_string() }]);
    }

    #[test]
    fn region_names_become_filename_safe_tokens() {
        assert_eq!(sanitize_region_name("left cerebellum-cortex"), "LeftCerebellumCortex");
        assert_eq!(sanitize_region_name("brainstem"), "Brainstem");
        assert_eq!(sanitize_region_name("CTX_lh_S_front-sup"), "CTXLhSFrontSup");
    }

    #[test]
    fn tac_paths_embed_prefix_and_region() {
        let path = tac_output_path("/out/sub-01/ses-01/tacs",
                                   "sub-01_ses-01_desc-WriteRoiTacs",
                                   "Brainstem");
        assert_eq!(path,
                   PathBuf::from(
                       "/out/sub-01/ses-01/tacs/sub-01_ses-01_desc-WriteRoiTacs_seg-Brainstem_tac.tsv"
                   ));
    }

    #[test]
    fn maskave_command_line() {
        let inv = maskave_invocation("/d/pet.nii.gz", "/d/seg.nii.gz", 8);
        assert_eq!(
            inv.command_line(),
            "3dmaskave -quiet -mask /d/seg.nii.gz -mrange 8 8 /d/pet.nii.gz"
        );
    }

    #[test]
    fn sampled_values_parse_one_number_per_line() {
        let values = parse_sampled_values(b"1.5\n2.25\n 3.0 \n", "pet.nii.gz").expect("parse");
        assert_eq!(values, vec![1.5, 2.25, 3.0]);
        assert!(parse_sampled_values(b"abc\n", "pet.nii.gz").is_err());
    }
}
