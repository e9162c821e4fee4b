//! Login handshake against the vendor API.
//!
//! Auth state is a plain immutable value (`AuthSession`) handed to every
//! subsequent call; there is no mutable auth singleton to invalidate.

use sha2::{Digest, Sha256};
use ureq::Agent;

use crate::ApiError;
use crate::wire::{ConnectionsResponse, LoginResponse};

/// Account credentials, sourced from the environment.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

pub const EMAIL_ENV: &str = "GLUVIEW_EMAIL";
pub const PASSWORD_ENV: &str = "GLUVIEW_PASSWORD";

impl Credentials {
    pub fn from_env() -> Result<Self, ApiError> {
        let email = std::env::var(EMAIL_ENV).unwrap_or_default();
        let password = std::env::var(PASSWORD_ENV).unwrap_or_default();
        if email.is_empty() || password.is_empty() {
            return Err(ApiError::MissingCredentials);
        }
        Ok(Self { email, password })
    }
}

/// Everything one authenticated fetch needs; immutable once issued.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub token: String,
    /// SHA-256 digest of the account id as a 64-char hex string, sent as the
    /// `account-id` header.
    pub account_id_hash: String,
    pub patient_id: String,
}

fn sha256_hex(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

pub(crate) fn map_transport_error(e: ureq::Error) -> ApiError {
    match e {
        ureq::Error::Status(401, _) => ApiError::Unauthorized,
        ureq::Error::Status(code, _) => ApiError::Status(code),
        ureq::Error::Transport(t) => {
            let msg = t.to_string();
            if msg.to_lowercase().contains("timed out") || msg.to_lowercase().contains("timeout") {
                ApiError::Timeout
            } else {
                ApiError::Transport(msg)
            }
        }
    }
}

/// Perform the login + connections handshake and return a fresh session.
pub fn authenticate(
    agent: &Agent,
    cfg: &gluview_config::ApiCfg,
    creds: &Credentials,
) -> Result<AuthSession, ApiError> {
    tracing::info!("authenticating against the vendor API");

    let login: LoginResponse = agent
        .post(&format!("{}/llu/auth/login", cfg.base_url))
        .set("product", &cfg.product)
        .set("version", &cfg.version)
        .set("cache-control", "no-cache")
        .send_json(serde_json::json!({
            "email": creds.email,
            "password": creds.password,
        }))
        .map_err(map_transport_error)?
        .into_json()
        .map_err(|e| ApiError::MalformedResponse(e.to_string()))?;

    let token = login
        .token()
        .ok_or_else(|| ApiError::LoginRejected("no auth ticket in response".to_string()))?;
    let account_id = login
        .account_id()
        .ok_or_else(|| ApiError::LoginRejected("no account id in response".to_string()))?;
    let account_id_hash = sha256_hex(&account_id);

    let connections: ConnectionsResponse = agent
        .get(&format!("{}/llu/connections", cfg.base_url))
        .set("product", &cfg.product)
        .set("version", &cfg.version)
        .set("authorization", &format!("Bearer {token}"))
        .set("account-id", &account_id_hash)
        .call()
        .map_err(map_transport_error)?
        .into_json()
        .map_err(|e| ApiError::MalformedResponse(e.to_string()))?;

    let patient_id = connections
        .first_patient_id()
        .ok_or_else(|| ApiError::MalformedResponse("no patient id in connections".to_string()))?;

    tracing::debug!(%patient_id, "session established");
    Ok(AuthSession {
        token,
        account_id_hash,
        patient_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_hex_matches_known_digest() {
        // SHA-256 of the empty string.
        assert_eq!(
            sha256_hex(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(sha256_hex("abc").len(), 64);
    }
}
