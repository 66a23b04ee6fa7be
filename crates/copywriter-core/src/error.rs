use crate::provider::Provider;

/// Failures that stop a generation before any request is sent.
///
/// Network, extraction and log failures have their own types because they
/// never block the rest of the session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerateError {
    #[error(
        "{} API key not found. Set {} or run `copywriter config --api-key <KEY>`",
        .0.display_name(),
        .0.api_key_env()
    )]
    MissingCredential(Provider),

    #[error("{0}")]
    InvalidInput(String),
}
