//! Filename reconciliation: sanitize candidates, extract names from URIs and backend temp
//! names, and resolve one canonical filename per media item.

mod extract;
mod resolve;
mod sanitize;

pub use extract::{extract_from_uri, extract_from_uri_at, extract_original_from_temp};
pub use resolve::{FilenameResolver, Resolution, TEMP_MARKER};
pub use sanitize::{fallback_filename, sanitize_filename, sanitize_filename_at, MAX_FILENAME_LEN};
