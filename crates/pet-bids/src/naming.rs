//! Subject/session naming convention: parsing and path synthesis.
//!
//! File names are expected to start with two underscore-delimited tokens
//! `sub-<id>_ses-<id>`. Parsing never fails: names that do not follow the
//! convention yield the placeholder pair (`XXXX`, `XX`) so callers can keep
//! going with a clearly-marked anomaly instead of aborting.

use std::path::Path;

use indexmap::IndexMap;

/// Subject id used when a file name carries no `sub-` token.
pub const PLACEHOLDER_SUB: &str = "XXXX";
/// Session id used when a file name carries no `ses-` token.
pub const PLACEHOLDER_SES: &str = "XX";

/// Extracts `(subject_id, session_id)` from the file name of `path`.
///
/// The first two underscore-delimited tokens must be `sub-<id>` and
/// `ses-<id>`; anything else returns the placeholder pair.
pub fn parse_subject_and_session(path: &str) -> (String, String) {
    let filename = Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut tokens = filename.split('_');
    let sub = tokens.next().and_then(|t| t.strip_prefix("sub-"));
    let ses = tokens.next().and_then(|t| t.strip_prefix("ses-"));
    match (sub, ses) {
        (Some(sub), Some(ses)) if !sub.is_empty() && !ses.is_empty() => {
            (sub.to_string(), ses.to_string())
        }
        _ => (PLACEHOLDER_SUB.to_string(), PLACEHOLDER_SES.to_string()),
    }
}

/// Converts a snake_case step name into a CamelCase descriptor token,
/// e.g. `thresh_crop` -> `ThreshCrop`.
pub fn snake_to_camel_case(snake: &str) -> String {
    snake
        .to_lowercase()
        .split('_')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

/// Generates a BIDS-like file name:
/// `sub-<id>_ses-<id>_<key>-<value>..._<suffix><ext>`.
///
/// Descriptor order in the name follows insertion order of `extra_desc`.
pub fn gen_bids_like_filename(
    sub_id: &str,
    ses_id: &str,
    suffix: &str,
    ext: &str,
    extra_desc: &IndexMap<String, String>,
) -> String {
    let mut parts = vec![format!("sub-{sub_id}_ses-{ses_id}")];
    for (name, val) in extra_desc {
        parts.push(format!("{name}-{val}"));
    }
    parts.push(format!("{suffix}{ext}"));
    parts.join("_")
}

/// Generates a BIDS-like directory path:
/// `<sup_dir>/sub-<id>/ses-<id>/<modality>`.
pub fn gen_bids_like_dir_path(sub_id: &str, ses_id: &str, modality: &str, sup_dir: &str) -> String {
    Path::new(sup_dir)
        .join(format!("sub-{sub_id}"))
        .join(format!("ses-{ses_id}"))
        .join(modality)
        .to_string_lossy()
        .into_owned()
}

/// Full file path combining [`gen_bids_like_dir_path`] and
/// [`gen_bids_like_filename`].
pub fn gen_bids_like_filepath(
    sub_id: &str,
    ses_id: &str,
    bids_dir: &str,
    modality: &str,
    suffix: &str,
    ext: &str,
    extra_desc: &IndexMap<String, String>,
) -> String {
    let filename = gen_bids_like_filename(sub_id, ses_id, suffix, ext, extra_desc);
    let dir = gen_bids_like_dir_path(sub_id, ses_id, modality, bids_dir);
    Path::new(&dir).join(filename).to_string_lossy().into_owned()
}
