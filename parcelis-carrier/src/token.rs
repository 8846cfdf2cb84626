use async_trait::async_trait;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::info;

use crate::client::CarrierError;
use crate::config::OauthConfig;

/// Do not hand out tokens closer than this to their expiry.
const EXPIRY_MARGIN: Duration = Duration::from_secs(30);

/// Successful response from the OAuth token endpoint.
#[derive(Debug, Clone)]
pub struct TokenGrant {
    pub access_token: String,
    pub expires_in: Option<u64>,
}

/// Fetches a fresh access token from the carrier's OAuth endpoint.
#[async_trait]
pub trait TokenFetch: Send + Sync {
    async fn fetch(&self) -> Result<TokenGrant, CarrierError>;
}

/// Client-credentials grant against the configured token URL.
pub struct OauthTokenFetcher {
    http: reqwest::Client,
    oauth: OauthConfig,
}

impl OauthTokenFetcher {
    pub fn new(http: reqwest::Client, oauth: OauthConfig) -> Self {
        Self { http, oauth }
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<u64>,
}

#[async_trait]
impl TokenFetch for OauthTokenFetcher {
    async fn fetch(&self) -> Result<TokenGrant, CarrierError> {
        let mut form = vec![
            ("grant_type", "client_credentials"),
            ("client_id", self.oauth.client_id.as_str()),
            ("client_secret", self.oauth.client_secret.as_str()),
        ];
        if let Some(scope) = self.oauth.scope.as_deref() {
            if !scope.trim().is_empty() {
                form.push(("scope", scope));
            }
        }

        let resp = self
            .http
            .post(&self.oauth.token_url)
            .form(&form)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(CarrierError::Auth(format!(
                "token endpoint returned {}: {}",
                status, body
            )));
        }

        let body: TokenResponse = resp.json().await?;
        let access_token = body
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| CarrierError::Auth("token response missing access_token".to_string()))?;

        Ok(TokenGrant {
            access_token,
            expires_in: body.expires_in,
        })
    }
}

struct CacheEntry {
    token: String,
    expires_at: Instant,
}

/// Process-wide bearer token cache.
///
/// The single mutex serializes refreshes, so concurrent callers hitting an
/// expired cache trigger exactly one fetch. A failed fetch propagates to the
/// caller and leaves the cache empty.
pub struct TokenCache {
    fetcher: Box<dyn TokenFetch>,
    slot: Mutex<Option<CacheEntry>>,
}

impl TokenCache {
    pub fn new(fetcher: Box<dyn TokenFetch>) -> Self {
        Self {
            fetcher,
            slot: Mutex::new(None),
        }
    }

    /// Return the cached token while its expiry is comfortably in the
    /// future, otherwise fetch a new one.
    pub async fn token(&self) -> Result<String, CarrierError> {
        let mut slot = self.slot.lock().await;
        if let Some(entry) = slot.as_ref() {
            if entry.expires_at > Instant::now() + EXPIRY_MARGIN {
                return Ok(entry.token.clone());
            }
        }
        self.refresh_locked(&mut slot).await
    }

    /// Unconditionally discard the cache and fetch anew. Used after the
    /// carrier rejects a token mid-flight.
    pub async fn force_refresh(&self) -> Result<String, CarrierError> {
        let mut slot = self.slot.lock().await;
        *slot = None;
        self.refresh_locked(&mut slot).await
    }

    async fn refresh_locked(
        &self,
        slot: &mut Option<CacheEntry>,
    ) -> Result<String, CarrierError> {
        *slot = None;
        let grant = self.fetcher.fetch().await?;
        let reported = grant.expires_in.unwrap_or(300);
        // Refresh headroom: treat the token as expiring 30s early, but never
        // sooner than 60s from now.
        let ttl = reported.saturating_sub(30).max(60);
        info!("carrier oauth token acquired, ttl ~{}s", reported);
        *slot = Some(CacheEntry {
            token: grant.access_token.clone(),
            expires_at: Instant::now() + Duration::from_secs(ttl),
        });
        Ok(grant.access_token)
    }
}
