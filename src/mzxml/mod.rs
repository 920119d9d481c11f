//! # mzXML input and aligned output
//!
//! Streaming pull-parser for mzXML runs and the retention-time rewriter used
//! by alignment.
//!
//! ## mzXML Structure
//!
//! ```text
//! mzXML
//! └── msRun
//!     └── scan* (retentionTime="PT…S", may nest for MSn)
//!         └── peaks (precision, byteOrder, compressionType)
//!             └── base64 m/z-intensity pairs
//! ```

mod binary;
mod error;
mod reader;
mod writer;

pub use binary::{encode_peaks, BinaryDecodeError, BinaryDecoder, ByteOrder, CompressionType, Precision};
pub use error::MzXmlError;
pub use reader::{parse_retention_time, MzXmlReader, MzXmlRun, Scan};
pub use writer::{
    prefixed_path, rewrite_retention_times, write_aligned, write_unaligned_marker, ALIGNED_PREFIX,
    UNALIGNED_PREFIX,
};

use std::path::{Path, PathBuf};

/// `.mzXML` files in `dir` (case-insensitive extension), sorted by name
pub fn list_mzxml_files<P: AsRef<Path>>(dir: P) -> std::io::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .map(|ext| ext.eq_ignore_ascii_case("mzxml"))
                    .unwrap_or(false)
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Whether `path`'s file name starts with `prefix`
pub fn has_prefix(path: &Path, prefix: &str) -> bool {
    path.file_name()
        .map(|n| n.to_string_lossy().starts_with(prefix))
        .unwrap_or(false)
}
