//! Authenticated graph fetches with a bounded re-auth retry.

use std::time::Duration;

use gluview_traits::{GlucoseSource, Sample};
use ureq::Agent;

use crate::ApiError;
use crate::auth::{AuthSession, Credentials, authenticate, map_transport_error};
use crate::wire::GraphResponse;

/// Explicit retry budget for token-rejection recovery. The default allows
/// exactly one re-authentication per fetch, which terminates by
/// construction (no recursive self-calls).
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_reauths: u8,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_reauths: 1 }
    }
}

/// Fetch the reading graph for the session's patient.
pub fn fetch_graph(
    agent: &Agent,
    cfg: &gluview_config::ApiCfg,
    session: &AuthSession,
) -> Result<Vec<Sample>, ApiError> {
    let response: GraphResponse = agent
        .get(&format!(
            "{}/llu/connections/{}/graph",
            cfg.base_url, session.patient_id
        ))
        .set("product", &cfg.product)
        .set("version", &cfg.version)
        .set("authorization", &format!("Bearer {}", session.token))
        .set("account-id", &session.account_id_hash)
        .call()
        .map_err(map_transport_error)?
        .into_json()
        .map_err(|e| ApiError::MalformedResponse(e.to_string()))?;
    Ok(response.samples())
}

/// Run a fetch, re-authenticating on `Unauthorized` until the retry budget
/// is spent. The cached session is taken out of `session`, so a rejected
/// token can never be reused.
pub fn fetch_with_reauth(
    retry: RetryPolicy,
    session: &mut Option<AuthSession>,
    mut authenticate: impl FnMut() -> Result<AuthSession, ApiError>,
    mut fetch: impl FnMut(&AuthSession) -> Result<Vec<Sample>, ApiError>,
) -> Result<Vec<Sample>, ApiError> {
    let mut reauths_left = retry.max_reauths;
    loop {
        let current = match session.take() {
            Some(s) => s,
            None => authenticate()?,
        };
        match fetch(&current) {
            Ok(samples) => {
                *session = Some(current);
                return Ok(samples);
            }
            Err(ApiError::Unauthorized) if reauths_left > 0 => {
                reauths_left -= 1;
                tracing::warn!("vendor token rejected; re-authenticating");
            }
            Err(e) => {
                // A rejected token is never cached; other failures keep the
                // session for the next attempt.
                if !matches!(e, ApiError::Unauthorized) {
                    *session = Some(current);
                }
                return Err(e);
            }
        }
    }
}

/// Live ingestion source backed by the vendor cloud.
pub struct LibreSource {
    agent: Agent,
    cfg: gluview_config::ApiCfg,
    credentials: Credentials,
    session: Option<AuthSession>,
    retry: RetryPolicy,
}

impl LibreSource {
    pub fn new(cfg: gluview_config::ApiCfg, credentials: Credentials) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_millis(cfg.timeout_ms))
            .build();
        Self {
            agent,
            cfg,
            credentials,
            session: None,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

impl GlucoseSource for LibreSource {
    fn fetch_recent(
        &mut self,
    ) -> Result<Vec<Sample>, Box<dyn std::error::Error + Send + Sync>> {
        let agent = &self.agent;
        let cfg = &self.cfg;
        let credentials = &self.credentials;
        let samples = fetch_with_reauth(
            self.retry,
            &mut self.session,
            || authenticate(agent, cfg, credentials),
            |session| fetch_graph(agent, cfg, session),
        )?;
        tracing::debug!(count = samples.len(), "graph fetch complete");
        Ok(samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(tag: &str) -> AuthSession {
        AuthSession {
            token: format!("token-{tag}"),
            account_id_hash: "hash".to_string(),
            patient_id: "patient".to_string(),
        }
    }

    #[test]
    fn reauth_budget_is_spent_exactly_once() {
        let mut cached = None;
        let mut auth_calls = 0;
        let err = fetch_with_reauth(
            RetryPolicy::default(),
            &mut cached,
            || {
                auth_calls += 1;
                Ok(session(&auth_calls.to_string()))
            },
            |_| Err(ApiError::Unauthorized),
        )
        .expect_err("persistent 401 must fail");
        assert!(matches!(err, ApiError::Unauthorized));
        assert_eq!(auth_calls, 2, "initial auth plus one retry");
        assert!(cached.is_none(), "rejected session is not cached");
    }

    #[test]
    fn successful_retry_caches_the_fresh_session() {
        let mut cached = Some(session("stale"));
        let mut auth_calls = 0;
        let samples = fetch_with_reauth(
            RetryPolicy::default(),
            &mut cached,
            || {
                auth_calls += 1;
                Ok(session("fresh"))
            },
            |s| {
                if s.token == "token-stale" {
                    Err(ApiError::Unauthorized)
                } else {
                    Ok(vec![Sample::reading(0, 100)])
                }
            },
        )
        .expect("retry succeeds");
        assert_eq!(samples.len(), 1);
        assert_eq!(auth_calls, 1);
        assert_eq!(cached.unwrap().token, "token-fresh");
    }

    #[test]
    fn non_auth_errors_keep_the_session() {
        let mut cached = Some(session("live"));
        let err = fetch_with_reauth(
            RetryPolicy::default(),
            &mut cached,
            || unreachable!("no re-auth for transport errors"),
            |_| Err(ApiError::Timeout),
        )
        .expect_err("timeout propagates");
        assert!(matches!(err, ApiError::Timeout));
        assert_eq!(cached.unwrap().token, "token-live");
    }

    #[test]
    fn zero_budget_fails_without_reauth() {
        let mut cached = Some(session("live"));
        let mut auth_calls = 0;
        let err = fetch_with_reauth(
            RetryPolicy { max_reauths: 0 },
            &mut cached,
            || {
                auth_calls += 1;
                Ok(session("fresh"))
            },
            |_| Err(ApiError::Unauthorized),
        )
        .expect_err("401 with no budget fails");
        assert!(matches!(err, ApiError::Unauthorized));
        assert_eq!(auth_calls, 0);
    }
}
