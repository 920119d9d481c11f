/// Errors raised while building isotopologue references
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnalyteError {
    /// Analyte name refers to a block that was not loaded
    #[error("Analyte '{analyte}' uses unknown block '{unit}'")]
    UnknownBlock { analyte: String, unit: String },

    /// Analyte name does not follow the `unit,count` token grammar
    #[error("Invalid analyte name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    /// Charge carrier block is absent
    #[error("Charge carrier '{0}' is not among the loaded blocks")]
    MissingChargeCarrier(String),

    /// Charge range or carrier charge cannot produce ions
    #[error("Invalid charge for '{analyte}': {reason}")]
    InvalidCharge { analyte: String, reason: String },

    /// Reference rows are not grouped by analyte and charge in isotopologue order
    #[error("Reference rows out of order: '{current}' follows '{previous}'")]
    UnsortedReference { previous: String, current: String },
}
