//! Credentials taken from the loaded settings
//!
//! Blank secrets load fine; they only fail here, when a component asks for
//! them.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::domain::errors::CredentialError;
use crate::domain::models::{GitSettings, JamfProEnvironment, SecretString, SlackSettings, JAMF_PRO_PREFIX};

/// Username and password for a Jamf Pro account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiCredentials {
    pub username: String,
    pub password: SecretString,
}

impl ApiCredentials {
    /// `Authorization` header value for HTTP basic auth.
    pub fn basic_auth_header(&self) -> String {
        let raw = format!("{}:{}", self.username, self.password.expose());
        format!("Basic {}", STANDARD.encode(raw))
    }
}

fn require_user(scope: &str, field: &'static str, value: &str) -> Result<String, CredentialError> {
    if value.trim().is_empty() {
        return Err(CredentialError::missing(scope, field));
    }
    Ok(value.to_string())
}

fn require_secret(
    scope: &str,
    field: &'static str,
    value: &SecretString,
) -> Result<SecretString, CredentialError> {
    if value.is_blank() {
        return Err(CredentialError::missing(scope, field));
    }
    Ok(value.clone())
}

/// API account of the environment named `env_name`.
pub fn jamf_api(env_name: &str, env: &JamfProEnvironment) -> Result<ApiCredentials, CredentialError> {
    let scope = format!("{JAMF_PRO_PREFIX}{env_name}");
    Ok(ApiCredentials {
        username: require_user(&scope, "api_user", &env.api_user)?,
        password: require_secret(&scope, "api_password", &env.api_password)?,
    })
}

/// Distribution point account of the environment named `env_name`.
pub fn distribution_point(
    env_name: &str,
    env: &JamfProEnvironment,
) -> Result<ApiCredentials, CredentialError> {
    let scope = format!("{JAMF_PRO_PREFIX}{env_name}");
    Ok(ApiCredentials {
        username: require_user(&scope, "dp1_user", &env.dp1_user)?,
        password: require_secret(&scope, "dp1_password", &env.dp1_password)?,
    })
}

pub fn slack_bot_token(slack: &SlackSettings) -> Result<SecretString, CredentialError> {
    require_secret("Slack", "bot_token", &slack.bot_token)
}

pub fn slack_signing_secret(slack: &SlackSettings) -> Result<SecretString, CredentialError> {
    require_secret("Slack", "signing_secret", &slack.signing_secret)
}

pub fn git_private_key(git: &GitSettings) -> Result<SecretString, CredentialError> {
    require_secret("Git", "ssh_private_key", &git.ssh_private_key)
}
