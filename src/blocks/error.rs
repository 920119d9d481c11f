use std::path::PathBuf;

/// Errors that can occur while reading block files
#[derive(Debug, thiserror::Error)]
pub enum BlockError {
    /// I/O error reading a block file or listing the directory
    #[error("Failed to read block file: {0}")]
    IoError(#[from] std::io::Error),

    /// Key that is neither `mass`, `charge` nor a plural element name
    #[error("Block '{block}' contains an unknown element '{key}'")]
    UnknownKey { block: String, key: String },

    /// Value that cannot be read as the number its key requires
    #[error("'{key}' in block '{block}' is not a valid number: '{value}'")]
    InvalidValue {
        block: String,
        key: String,
        value: String,
    },

    /// Line without a `key: value` separator
    #[error("Block '{block}' has a malformed line: '{line}'")]
    MalformedLine { block: String, line: String },

    /// Block without the required `mass` entry
    #[error("Block '{0}' contains no mass")]
    MissingMass(String),

    /// Directory holds no usable `.block` file
    #[error("The blocks directory '{0}' does not contain any usable '.block' files")]
    EmptyDirectory(PathBuf),

    /// Path is not a directory
    #[error("'{0}' is not a directory")]
    NotADirectory(PathBuf),
}
