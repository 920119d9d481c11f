/// Errors that can occur during mzXML parsing and rewriting
#[derive(Debug, thiserror::Error)]
pub enum MzXmlError {
    /// Error parsing XML
    #[error("XML parsing error: {0}")]
    XmlError(#[from] quick_xml::Error),

    /// I/O error during file operations
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error decoding a peak list
    #[error("Binary decode error: {0}")]
    BinaryError(#[from] super::binary::BinaryDecodeError),

    /// Document structure does not match mzXML
    #[error("Invalid mzXML structure: {0}")]
    InvalidStructure(String),

    /// Missing required attribute
    #[error("Missing required attribute: {0}")]
    MissingAttribute(String),

    /// Attribute value could not be parsed
    #[error("Invalid attribute value: {0}")]
    InvalidAttributeValue(String),

    /// Invalid UTF-8 in attribute or element name
    #[error("UTF-8 encoding error: {0}")]
    Utf8Error(#[from] std::str::Utf8Error),
}
