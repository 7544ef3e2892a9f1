//! Bearer-token session with exactly-once revocation.

use crate::application::ports::VendorApi;
use crate::domain::Credentials;

/// Holds the run's session token until it is revoked.
///
/// `revoke` takes the token out, so calling it again (the runner's
/// unconditional teardown after an early revocation) does nothing.
/// Revocation failures are logged and swallowed: the token expires on its
/// own and a failed revoke must never change the run outcome.
#[derive(Default)]
pub struct Session {
    token: Option<String>,
}

impl Session {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start holding `token`. Any token already held is replaced.
    pub fn hold(&mut self, token: &str) {
        if self.token.is_some() {
            tracing::warn!("replacing a session token that was never revoked");
        }
        self.token = Some(token.to_string());
    }

    /// Whether a token is currently held (acquired and not yet revoked).
    #[must_use]
    pub fn is_held(&self) -> bool {
        self.token.is_some()
    }

    /// Revoke the held token, if any.
    pub async fn revoke(&mut self, api: &impl VendorApi, creds: &Credentials) {
        let Some(token) = self.token.take() else {
            return;
        };
        match api.revoke_token(creds, &token).await {
            Ok(()) => tracing::info!("session token revoked"),
            Err(e) => tracing::warn!(error = %format!("{e:#}"), "session token revocation failed"),
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.token.is_some() {
            tracing::error!("session dropped while still holding an unrevoked token");
        }
    }
}
