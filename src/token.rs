//! Confirmation tokens guarding state-changing actions.
//!
//! A token is an HMAC-SHA256 over the operator session, the action scope and
//! a time tick. Ticks are half a lifetime long and the previous tick is still
//! accepted, so a token stays valid for between one half and one full
//! lifetime after it was minted.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;

use crate::db::Database;
use crate::error::AppError;

type HmacSha256 = Hmac<Sha256>;

const SECRET_OPTION: &str = "token_secret";

/// What a token authorizes: one action against one collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenScope {
    pub action: &'static str,
    pub collection: &'static str,
}

impl TokenScope {
    pub const fn new(action: &'static str, collection: &'static str) -> Self {
        Self { action, collection }
    }

    fn label(&self) -> String {
        format!("{}-{}", self.action, self.collection)
    }
}

#[derive(Clone)]
pub struct TokenKeeper {
    secret: Vec<u8>,
    lifetime_secs: u64,
}

impl TokenKeeper {
    pub fn new(secret: impl Into<Vec<u8>>, lifetime_secs: u64) -> Self {
        Self {
            secret: secret.into(),
            lifetime_secs: lifetime_secs.max(2),
        }
    }

    /// Use the configured secret, or the one persisted in the database,
    /// generating and storing a fresh one on first use.
    pub fn from_settings(
        db: &Database,
        configured: Option<&str>,
        lifetime_secs: u64,
    ) -> anyhow::Result<Self> {
        if let Some(secret) = configured.filter(|s| !s.is_empty()) {
            return Ok(Self::new(secret.as_bytes(), lifetime_secs));
        }

        if let Some(stored) = db.get_option(SECRET_OPTION)? {
            let secret = URL_SAFE_NO_PAD
                .decode(stored.as_bytes())
                .map_err(|e| AppError::Config(format!("stored token secret is corrupt: {e}")))?;
            return Ok(Self::new(secret, lifetime_secs));
        }

        let mut secret = vec![0u8; 32];
        rand::thread_rng().fill_bytes(&mut secret);
        db.set_option(SECRET_OPTION, &URL_SAFE_NO_PAD.encode(&secret))?;
        tracing::info!("Generated a new token secret");
        Ok(Self::new(secret, lifetime_secs))
    }

    pub fn mint(&self, session: &str, scope: TokenScope) -> Result<String, AppError> {
        self.mint_at(session, scope, now_secs())
    }

    pub fn verify(
        &self,
        token: Option<&str>,
        session: &str,
        scope: TokenScope,
    ) -> Result<(), AppError> {
        self.verify_at(token, session, scope, now_secs())
    }

    fn tick(&self, now: u64) -> u64 {
        now.div_ceil(self.lifetime_secs / 2)
    }

    fn mac(&self, session: &str, scope: TokenScope, tick: u64) -> Result<HmacSha256, AppError> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| AppError::Config(format!("invalid token secret: {e}")))?;
        mac.update(session.as_bytes());
        mac.update(b"|");
        mac.update(scope.label().as_bytes());
        mac.update(b"|");
        mac.update(&tick.to_be_bytes());
        Ok(mac)
    }

    fn mint_at(&self, session: &str, scope: TokenScope, now: u64) -> Result<String, AppError> {
        let tag = self.mac(session, scope, self.tick(now))?.finalize().into_bytes();
        Ok(URL_SAFE_NO_PAD.encode(tag))
    }

    fn verify_at(
        &self,
        token: Option<&str>,
        session: &str,
        scope: TokenScope,
        now: u64,
    ) -> Result<(), AppError> {
        let rejected = || {
            tracing::warn!(
                "Rejected confirmation token for '{}' on {}",
                session,
                scope.label()
            );
            AppError::SecurityCheckFailed
        };

        let token = token.filter(|t| !t.is_empty()).ok_or_else(rejected)?;
        let tag = URL_SAFE_NO_PAD
            .decode(token.as_bytes())
            .map_err(|_| rejected())?;

        let tick = self.tick(now);
        for t in [tick, tick.saturating_sub(1)] {
            if self.mac(session, scope, t)?.verify_slice(&tag).is_ok() {
                return Ok(());
            }
        }
        Err(rejected())
    }
}

fn now_secs() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELETE: TokenScope = TokenScope::new("delete", "submissions");
    const BULK: TokenScope = TokenScope::new("bulk-delete", "submissions");

    fn keeper() -> TokenKeeper {
        TokenKeeper::new(b"test-secret".to_vec(), 3600)
    }

    #[test]
    fn test_mint_then_verify() {
        let k = keeper();
        let token = k.mint_at("admin", DELETE, 10_000).unwrap();
        assert!(k.verify_at(Some(&token), "admin", DELETE, 10_000).is_ok());
    }

    #[test]
    fn test_rejects_other_scope_session_and_garbage() {
        let k = keeper();
        let token = k.mint_at("admin", DELETE, 10_000).unwrap();

        assert!(k.verify_at(Some(&token), "admin", BULK, 10_000).is_err());
        assert!(k.verify_at(Some(&token), "viewer", DELETE, 10_000).is_err());
        assert!(k.verify_at(None, "admin", DELETE, 10_000).is_err());
        assert!(k.verify_at(Some(""), "admin", DELETE, 10_000).is_err());
        assert!(k.verify_at(Some("not base64!"), "admin", DELETE, 10_000).is_err());
        assert!(
            matches!(
                k.verify_at(Some("AAAA"), "admin", DELETE, 10_000),
                Err(AppError::SecurityCheckFailed)
            )
        );

        let other = TokenKeeper::new(b"other-secret".to_vec(), 3600);
        assert!(other.verify_at(Some(&token), "admin", DELETE, 10_000).is_err());
    }

    #[test]
    fn test_expiry_window() {
        let k = keeper();
        // Half lifetime is 1800s; minted at the start of a tick
        let minted = 1800 * 10 + 1;
        let token = k.mint_at("admin", DELETE, minted).unwrap();

        assert!(k.verify_at(Some(&token), "admin", DELETE, minted + 1799).is_ok());
        assert!(k.verify_at(Some(&token), "admin", DELETE, minted + 3599).is_ok());
        assert!(k.verify_at(Some(&token), "admin", DELETE, minted + 3600).is_err());
    }

    #[test]
    fn test_secret_is_generated_once_and_persisted() {
        let db = Database::open_in_memory().unwrap();
        let first = TokenKeeper::from_settings(&db, None, 3600).unwrap();
        let second = TokenKeeper::from_settings(&db, None, 3600).unwrap();
        assert_eq!(first.secret.len(), 32);
        assert_eq!(first.secret, second.secret);

        let token = first.mint("admin", DELETE).unwrap();
        assert!(second.verify(Some(&token), "admin", DELETE).is_ok());

        let configured = TokenKeeper::from_settings(&db, Some("fixed"), 3600).unwrap();
        assert_eq!(configured.secret, b"fixed".to_vec());
    }
}
