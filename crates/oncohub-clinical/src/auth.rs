//! OAuth2 password-grant exchange.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{info, instrument, warn};
use url::Url;

use oncohub_common::{AuthToken, OncohubError, Result};
use oncohub_config::FhirConfig;

use crate::transport::ClinicalTransport;

/// Token endpoint reply. Only `access_token` is required.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// Client identity taken from configuration, checked before any request is made.
pub struct ClientCredentials<'a> {
    pub client_id: &'a str,
    pub client_secret: &'a SecretString,
}

impl<'a> ClientCredentials<'a> {
    pub fn from_config(config: &'a FhirConfig) -> Result<Self> {
        match (config.client_id.as_deref(), config.client_secret.as_ref()) {
            (Some(id), Some(secret)) if !id.is_empty() && !secret.expose_secret().is_empty() => {
                Ok(Self { client_id: id, client_secret: secret })
            }
            _ => Err(OncohubError::Authentication("missing client configuration".to_string())),
        }
    }
}

/// POST the password grant and turn a 200 reply into a token. Any other
/// status is an authentication failure.
#[instrument(skip(transport, config, password))]
pub async fn password_grant<T: ClinicalTransport + ?Sized>(
    transport: &T,
    config: &FhirConfig,
    username: &str,
    password: &SecretString,
) -> Result<AuthToken> {
    let creds = ClientCredentials::from_config(config)?;
    let token_url = Url::parse(&config.token_url)
        .map_err(|e| OncohubError::Config(format!("invalid token_url: {}", e)))?;

    let form = [
        ("grant_type", "password"),
        ("username", username),
        ("password", password.expose_secret()),
        ("client_id", creds.client_id),
        ("client_secret", creds.client_secret.expose_secret()),
    ];

    let resp = transport.post_form(&token_url, &form).await?;
    if !resp.is_success() {
        warn!(status = resp.status, "Token endpoint rejected credentials");
        return Err(OncohubError::Authentication(format!(
            "token endpoint rejected credentials (HTTP {})",
            resp.status
        )));
    }

    let parsed: TokenResponse = serde_json::from_str(&resp.body).map_err(|e| {
        OncohubError::Authentication(format!("unreadable token response: {}", e))
    })?;
    let access_token = parsed
        .access_token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| OncohubError::Authentication("token response has no access_token".to_string()))?;

    info!(token_type = parsed.token_type.as_deref().unwrap_or("bearer"), expires_in = ?parsed.expires_in, "Access token issued");
    Ok(AuthToken::new(access_token, username))
}
