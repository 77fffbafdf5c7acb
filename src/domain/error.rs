//! Domain error types.

/// Top-level error type for keibalog.
///
/// Engine-level absences (no profile, unrecognized ticket kind, underivable
/// odds ratio) are not errors; they surface as default or empty values. The
/// variants here cover the adapter boundary: I/O, configuration, storage.
#[derive(Debug, thiserror::Error)]
pub enum KeibalogError {
    #[error("store error: {reason}")]
    Store { reason: String },

    #[error("store query error: {reason}")]
    StoreQuery { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("invalid profile field {field}: {reason}")]
    ProfileInvalid { field: String, reason: String },

    #[error("export error: {reason}")]
    Export { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&KeibalogError> for std::process::ExitCode {
    fn from(err: &KeibalogError) -> Self {
        let code: u8 = match err {
            KeibalogError::Io(_) => 1,
            KeibalogError::ConfigParse { .. }
            | KeibalogError::ConfigMissing { .. }
            | KeibalogError::ConfigInvalid { .. } => 2,
            KeibalogError::Store { .. } | KeibalogError::StoreQuery { .. } => 3,
            KeibalogError::ProfileInvalid { .. } => 4,
            KeibalogError::Export { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
