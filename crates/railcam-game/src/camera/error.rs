use thiserror::Error;

/// Errors raised while loading camera assets.
///
/// Runtime camera updates never fail; only asset loading reports errors.
#[derive(Debug, Error)]
pub enum CameraError {
    #[error("failed to parse camera profiles: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("camera profile '{0}' has non-finite or negative values")]
    InvalidProfile(String),

    #[error("unknown camera profile '{0}'")]
    UnknownProfile(String),
}
