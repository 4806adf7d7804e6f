//! pet-bids: naming-convention and sidecar utilities for PET pipelines.
//!
//! Everything in here is plain string/file plumbing consumed by the step
//! engine in `pet-core`:
//! - `naming`: parse `sub-`/`ses-` identifiers out of file names and
//!   synthesize BIDS-like output paths from them.
//! - `sidecar`: locate and copy the JSON metadata record that travels next
//!   to an image, and read frame-timing arrays from it.
//! - `tsv`: simple tab-separated persistence for curves and label maps.

pub mod errors;
pub mod naming;
pub mod sidecar;
pub mod tsv;

pub use errors::BidsError;
pub use naming::{
    gen_bids_like_dir_path, gen_bids_like_filename, gen_bids_like_filepath,
    parse_subject_and_session, snake_to_camel_case, PLACEHOLDER_SES, PLACEHOLDER_SUB,
};
pub use sidecar::{frame_times_from_sidecar, load_sidecar, safe_copy_meta, save_json, sidecar_path_for};
pub use tsv::{load_tsv_simple, save_tsv_simple};
