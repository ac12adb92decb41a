use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("--cert is required")]
    MissingCert,

    #[error(transparent)]
    Config(#[from] datawave_core::ConfigError),

    #[error(transparent)]
    Validation(#[from] datawave_core::ValidationError),

    #[error("could not set up the client: {0}")]
    Client(datawave_core::HttpError),

    #[error(transparent)]
    Session(#[from] datawave_core::SessionError),

    #[error(transparent)]
    Filter(#[from] datawave_core::NormalizeError),

    #[error(transparent)]
    Output(#[from] datawave_core::OutputError),

    #[error(transparent)]
    Dictionary(#[from] datawave_core::DictionaryError),

    #[error(transparent)]
    Admin(#[from] datawave_core::AdminError),

    #[error("request failed: {0}")]
    Request(#[from] datawave_core::HttpError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::MissingCert | Self::Config(_) | Self::Validation(_) => 2,
            Self::Client(_) => 3,
            Self::Session(_) | Self::Admin(_) | Self::Request(_) => 4,
            Self::Filter(_) => 5,
            Self::Output(_) | Self::Io(_) => 10,
            Self::Dictionary(_) => 6,
        }
    }
}

#[cfg(test)]
mod tests {
    use datawave_core::{AdminError, NormalizeError, SessionError};

    use super::*;

    #[test]
    fn error_categories_have_distinct_codes() {
        let session = CliError::from(SessionError::SessionCreateFailed {
            status: 500,
            body: String::new(),
        });
        let filter = CliError::from(NormalizeError::UnknownFilterKey {
            missing: vec![String::from("X")],
        });

        assert_eq!(CliError::MissingCert.exit_code(), 2);
        assert_eq!(session.exit_code(), 4);
        assert_eq!(filter.exit_code(), 5);
        assert_eq!(filter.to_string(), r#"["X"] not found in any results"#);

        let admin = CliError::from(AdminError::WhoamiFailed {
            reason: String::from("status 403: Forbidden"),
        });
        assert_eq!(admin.exit_code(), 4);
    }
}
