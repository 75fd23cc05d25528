//! Environment-driven CHPP credentials.

use secrecy::SecretString;
use thiserror::Error;

/// An environment variable required by the application is not set.
#[derive(Debug, Error)]
#[error("missing environment variable: {0}")]
pub struct MissingEnvVar(pub String);

/// Configuration problems surfaced while building a [`ChppConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required variable is absent from the environment.
    #[error(transparent)]
    MissingVar(#[from] MissingEnvVar),
    /// `CHPP_TEAM_ID` is present but not a number.
    #[error("CHPP_TEAM_ID is not a valid team id: {0:?}")]
    InvalidTeamId(String),
}

fn env_var(name: &str) -> Result<String, MissingEnvVar> {
    std::env::var(name).map_err(|_| MissingEnvVar(name.to_string()))
}

/// OAuth consumer + access credentials and the team to sync.
///
/// The consumer key and access token travel in every request header and are
/// kept as plain strings; the two signing secrets never leave
/// [`SecretString`] except inside the signature computation.
pub struct ChppConfig {
    /// CHPP application (consumer) key.
    pub consumer_key: String,
    /// CHPP application (consumer) secret.
    pub consumer_secret: SecretString,
    /// Per-user OAuth access token.
    pub access_token: String,
    /// Per-user OAuth access token secret.
    pub access_token_secret: SecretString,
    /// The Hattrick team this installation tracks.
    pub team_id: i64,
}

impl ChppConfig {
    /// Read the configuration from `CHPP_CONSUMER_KEY`, `CHPP_CONSUMER_SECRET`,
    /// `CHPP_ACCESS_TOKEN`, `CHPP_ACCESS_TOKEN_SECRET` and `CHPP_TEAM_ID`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let team_id_raw = env_var("CHPP_TEAM_ID")?;
        let team_id = team_id_raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidTeamId(team_id_raw.clone()))?;

        Ok(Self {
            consumer_key: env_var("CHPP_CONSUMER_KEY")?,
            consumer_secret: SecretString::new(env_var("CHPP_CONSUMER_SECRET")?.into()),
            access_token: env_var("CHPP_ACCESS_TOKEN")?,
            access_token_secret: SecretString::new(env_var("CHPP_ACCESS_TOKEN_SECRET")?.into()),
            team_id,
        })
    }
}
