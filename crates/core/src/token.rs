//! Capability tokens and the per-token paint cooldown

use crate::identity::{IdentityVerifier, ProofError};
use crate::store::BoardStore;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Random bytes behind every token string
const TOKEN_BYTES: usize = 32;

/// Paint rights granted to one identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Identity echoed from the proof check, never interpreted here
    pub identity: String,
    /// Opaque token string (64 hex chars)
    pub token: String,
    /// Unix milliseconds of the last successful validation (`None` = never)
    #[serde(default)]
    pub last_paint_ms: Option<u64>,
}

/// Paint-time token check failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Unknown token")]
    InvalidToken,

    #[error("Token is cooling down ({retry_after:?} left)")]
    Cooling { retry_after: Duration },
}

/// Token table keyed by token string
pub struct TokenRegistry {
    tokens: DashMap<String, Token>,
    paint_delay: Duration,
    verifier: Arc<dyn IdentityVerifier>,
    store: Option<Arc<dyn BoardStore>>,
}

impl TokenRegistry {
    pub fn new(
        paint_delay: Duration,
        verifier: Arc<dyn IdentityVerifier>,
        store: Option<Arc<dyn BoardStore>>,
    ) -> Self {
        Self {
            tokens: DashMap::new(),
            paint_delay,
            verifier,
            store,
        }
    }

    /// Seed the table with previously issued tokens
    pub fn load(&self, tokens: HashMap<String, Token>) {
        for (key, token) in tokens {
            self.tokens.insert(key, token);
        }
        info!("Loaded {} tokens", self.tokens.len());
    }

    /// Verify the identity proof and mint a token for it
    ///
    /// Nothing is registered unless the proof succeeds. Persisting the new
    /// token is best effort; a storage failure still returns a usable token.
    pub async fn issue(&self, identity: &str, proof: &str) -> Result<Token, ProofError> {
        if let Err(e) = self.verifier.verify(identity, proof).await {
            debug!("Identity proof rejected for {}: {}", identity, e);
            return Err(e);
        }

        let token = self.mint(identity);
        info!("Issued token for {}", identity);

        if let Some(store) = &self.store {
            if let Err(e) = store.save_token(&token) {
                warn!("Failed to persist token for {}: {:#}", identity, e);
            }
        }

        Ok(token)
    }

    /// Charge the cooldown for one paint
    ///
    /// On success the token is stamped with `now_ms`, so the cooldown is
    /// consumed even if the paint is later rejected or never committed.
    pub fn check_and_reserve(&self, token: &str, now_ms: u64) -> Result<(), TokenError> {
        let mut entry = self.tokens.get_mut(token).ok_or(TokenError::InvalidToken)?;

        if let Some(last) = entry.last_paint_ms {
            let elapsed = now_ms.saturating_sub(last);
            let delay = u64::try_from(self.paint_delay.as_millis()).unwrap_or(u64::MAX);
            if elapsed < delay {
                return Err(TokenError::Cooling {
                    retry_after: Duration::from_millis(delay - elapsed),
                });
            }
        }

        entry.last_paint_ms = Some(now_ms);
        Ok(())
    }

    /// Look up a token by its string
    pub fn get(&self, token: &str) -> Option<Token> {
        self.tokens.get(token).map(|t| t.clone())
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn paint_delay(&self) -> Duration {
        self.paint_delay
    }

    fn mint(&self, identity: &str) -> Token {
        loop {
            let mut bytes = [0u8; TOKEN_BYTES];
            OsRng.fill_bytes(&mut bytes);
            let key = hex::encode(bytes);

            // Retry on collision; token strings must be unique
            if let Entry::Vacant(slot) = self.tokens.entry(key.clone()) {
                let token = Token {
                    identity: identity.to_string(),
                    token: key,
                    last_paint_ms: None,
                };
                slot.insert(token.clone());
                return token;
            }
        }
    }
}

impl std::fmt::Debug for TokenRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenRegistry")
            .field("tokens", &self.tokens.len())
            .field("paint_delay", &self.paint_delay)
            .finish()
    }
}
