//! Paste-based identity proofs over HTTP
//!
//! A user proves control of an account by publishing a paste holding the
//! configured phrase, then hands us the paste id. The paste service reports
//! who authored it.

use anyhow::{Context, Result};
use async_trait::async_trait;
use canvas::{IdentityVerifier, ProofError};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Paste document as returned by the paste service
#[derive(Debug, Deserialize)]
struct Paste {
    uid: Value,
    content: String,
}

/// Looks up `{base_url}/{proof}` and checks author and content
pub struct PasteVerifier {
    client: reqwest::Client,
    base_url: String,
    expected_content: String,
}

impl PasteVerifier {
    pub fn new(
        base_url: impl Into<String>,
        expected_content: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            expected_content: expected_content.into(),
        })
    }
}

#[async_trait]
impl IdentityVerifier for PasteVerifier {
    async fn verify(&self, identity: &str, proof: &str) -> Result<(), ProofError> {
        // Paste ids are plain slugs; anything else cannot name a paste
        if !is_paste_id(proof) {
            return Err(ProofError::PasteNotFound);
        }

        let url = format!("{}/{}", self.base_url, proof);
        debug!("Fetching identity proof {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ProofError::Failed(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| ProofError::Failed(e.to_string()))?;

        check_paste(status, &body, identity, &self.expected_content)
    }
}

fn is_paste_id(proof: &str) -> bool {
    !proof.is_empty()
        && proof.len() <= 128
        && proof
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Classify a paste service response
pub fn check_paste(
    status: u16,
    body: &str,
    identity: &str,
    expected_content: &str,
) -> Result<(), ProofError> {
    match status {
        200 => {}
        404 => return Err(ProofError::PasteNotFound),
        other => return Err(ProofError::Failed(format!("unexpected status {}", other))),
    }

    let paste: Paste = serde_json::from_str(body)
        .map_err(|e| ProofError::Failed(format!("unexpected response: {}", e)))?;

    let uid = match &paste.uid {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        other => {
            return Err(ProofError::Failed(format!("unexpected uid {}", other)));
        }
    };

    if uid != identity {
        return Err(ProofError::UidMismatch);
    }

    if paste.content.trim() != expected_content.trim() {
        return Err(ProofError::ContentMismatch);
    }

    Ok(())
}
