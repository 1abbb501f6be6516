use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CsrfError {
    #[error("The form token is missing")]
    Missing,

    #[error("The form token is malformed")]
    Malformed,

    #[error("The form token has expired")]
    Expired,

    #[error("The form token is invalid")]
    InvalidSignature,

    #[error("The signing key is unusable")]
    InvalidKey,
}

/// Stateless form tokens: `<unix-seconds>.<hex HMAC-SHA256(secret, seconds)>`
#[derive(Clone)]
pub struct CsrfGuard {
    mac: HmacSha256,
    time_limit: Duration,
}

impl std::fmt::Debug for CsrfGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CsrfGuard")
            .field("time_limit", &self.time_limit)
            .finish()
    }
}

impl CsrfGuard {
    pub fn new(secret_key: &str, time_limit: Duration) -> Result<Self, CsrfError> {
        let mac = HmacSha256::new_from_slice(secret_key.as_bytes())
            .map_err(|_| CsrfError::InvalidKey)?;
        Ok(Self { mac, time_limit })
    }

    /// Issue a token for the current time
    pub fn generate(&self) -> String {
        self.generate_at(Utc::now().timestamp())
    }

    pub fn generate_at(&self, issued_at: i64) -> String {
        let signature = hex::encode(self.mac(issued_at).finalize().into_bytes());
        format!("{}.{}", issued_at, signature)
    }

    /// Check a submitted token against the current time
    pub fn verify(&self, token: &str) -> Result<(), CsrfError> {
        self.verify_at(token, Utc::now().timestamp())
    }

    pub fn verify_at(&self, token: &str, now: i64) -> Result<(), CsrfError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(CsrfError::Missing);
        }

        let (issued_at, signature) = token.split_once('.').ok_or(CsrfError::Malformed)?;
        let issued_at: i64 = issued_at.parse().map_err(|_| CsrfError::Malformed)?;
        let signature = hex::decode(signature).map_err(|_| CsrfError::Malformed)?;

        self.mac(issued_at).verify_slice(&signature).map_err(|_| {
            warn!("Rejected form token with a bad signature");
            CsrfError::InvalidSignature
        })?;

        let age = now.saturating_sub(issued_at);
        let limit = i64::try_from(self.time_limit.as_secs()).unwrap_or(i64::MAX);
        if age < 0 || age > limit {
            debug!(age, "Rejected expired form token");
            return Err(CsrfError::Expired);
        }

        Ok(())
    }

    fn mac(&self, issued_at: i64) -> HmacSha256 {
        let mut mac = self.mac.clone();
        mac.update(issued_at.to_string().as_bytes());
        mac
    }
}
