use crate::analyte::AnalyteError;
use crate::mzxml::MzXmlError;
use crate::report::ReportError;

use super::{BatchState, Notification, Severity};

/// Reasons a batch stops early
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    /// Missing or unusable batch input; the affected step never starts
    #[error("{title}: {message}")]
    Configuration {
        title: String,
        message: String,
        detail: String,
    },

    /// Analyte names, blocks or reference order are invalid
    #[error("Invalid analyte data during {step}: {source}")]
    DataFormat {
        step: BatchState,
        #[source]
        source: AnalyteError,
    },

    /// A run could not be read or rewritten
    #[error("mzXML error during {step}: {source}")]
    MzXml {
        step: BatchState,
        #[source]
        source: MzXmlError,
    },

    /// Writing results failed
    #[error("Output error during {step}: {source}")]
    Report {
        step: BatchState,
        #[source]
        source: ReportError,
    },

    /// Filesystem failure outside mzXML handling
    #[error("I/O error during {step}: {source}")]
    Io {
        step: BatchState,
        #[source]
        source: std::io::Error,
    },
}

impl BatchError {
    pub fn configuration(title: &str, message: &str, detail: &str) -> Self {
        BatchError::Configuration {
            title: title.to_string(),
            message: message.to_string(),
            detail: detail.to_string(),
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            BatchError::Configuration { .. } => Severity::Warning,
            _ => Severity::Critical,
        }
    }

    /// Structured message for the caller
    pub fn notification(&self) -> Notification {
        match self {
            BatchError::Configuration {
                title,
                message,
                detail,
            } => Notification {
                title: title.clone(),
                message: message.clone(),
                detail: detail.clone(),
                severity: self.severity(),
            },
            BatchError::DataFormat { step, source } => Self::processing(*step, source),
            BatchError::MzXml { step, source } => Self::processing(*step, source),
            BatchError::Report { step, source } => Self::processing(*step, source),
            BatchError::Io { step, source } => Self::processing(*step, source),
        }
    }

    fn processing(step: BatchState, source: &dyn std::error::Error) -> Notification {
        Notification {
            title: "Processing error".to_string(),
            message: format!("Unexpected error during {}:", step),
            detail: source.to_string(),
            severity: Severity::Critical,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notifications() {
        let warning = BatchError::configuration("Empty directory", "No mzXML files.", "");
        let n = warning.notification();
        assert_eq!(n.title, "Empty directory");
        assert_eq!(n.severity, Severity::Warning);

        let critical = BatchError::DataFormat {
            step: BatchState::GeneratingReference,
            source: AnalyteError::MissingChargeCarrier("sodium".to_string()),
        };
        let n = critical.notification();
        assert_eq!(n.title, "Processing error");
        assert_eq!(n.message, "Unexpected error during reference generation:");
        assert!(n.detail.contains("sodium"));
        assert_eq!(n.severity, Severity::Critical);
    }
}
