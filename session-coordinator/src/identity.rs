// session-coordinator/src/identity.rs
use async_trait::async_trait;
use common::{decode_profile, DecodeError, IdentityConfig, UserProfile};
use reqwest::Client;
use url::Url;

use crate::error::IdentityError;

/// Exchanges a bearer credential for the profile it belongs to
#[async_trait]
pub trait IdentityService: Send + Sync {
    async fn verify_identity(&self, credential: &str) -> Result<UserProfile, IdentityError>;
}

/// Calls the whoami endpoint over HTTP
#[derive(Debug, Clone)]
pub struct HttpIdentityClient {
    client: Client,
    endpoint: Url,
}

impl HttpIdentityClient {
    pub fn new(config: &IdentityConfig) -> Result<Self, IdentityError> {
        let endpoint = Url::parse(&config.base_url)
            .and_then(|base| base.join(&config.whoami_path))
            .map_err(|e| IdentityError::Client(format!("invalid identity endpoint: {}", e)))?;

        // The timeout bounds every call; expiry surfaces as a transient failure
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| IdentityError::Client(e.to_string()))?;

        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl From<reqwest::Error> for IdentityError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            IdentityError::Timeout
        } else if e.is_decode() {
            IdentityError::Decode(DecodeError::Body(e.to_string()))
        } else if e.is_builder() {
            IdentityError::Client(e.to_string())
        } else {
            IdentityError::Network(e.to_string())
        }
    }
}

#[async_trait]
impl IdentityService for HttpIdentityClient {
    async fn verify_identity(&self, credential: &str) -> Result<UserProfile, IdentityError> {
        let response = self
            .client
            .get(self.endpoint.clone())
            .bearer_auth(credential)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!("Identity service returned {}", status);
            return Err(IdentityError::Status { code: status.as_u16() });
        }

        let body: serde_json::Value = response.json().await?;
        Ok(decode_profile(body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_whoami_path() {
        let config = IdentityConfig {
            base_url: "http://identity.test:5001".to_string(),
            ..IdentityConfig::default()
        };
        let client = HttpIdentityClient::new(&config).unwrap();
        assert_eq!(client.endpoint().as_str(), "http://identity.test:5001/api/auth/me");
    }

    #[test]
    fn test_rejects_bad_base_url() {
        let config = IdentityConfig {
            base_url: "not a url".to_string(),
            ..IdentityConfig::default()
        };
        assert!(matches!(HttpIdentityClient::new(&config), Err(IdentityError::Client(_))));
    }
}
