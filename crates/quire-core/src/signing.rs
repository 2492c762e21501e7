//! Draft preview URL signing
//!
//! A preview token is `salt:signature` carried in the edit query parameter.
//! The signature is an HMAC-SHA256 over the URL path, keyed by
//! SHA-256(salt || secret). The secret is generated on first use and kept
//! in a `SecretStore`; rotating it invalidates every outstanding link.
//!
//! Tokens cover the path only, so a valid link for one page cannot be
//! replayed against another.

use std::collections::HashMap;
use std::sync::Mutex;

use hmac::{Hmac, Mac};
use quire_core_types::Sensitive;
use rand::distributions::Alphanumeric;
use rand::Rng;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use url::{form_urlencoded, Position, Url};

use crate::config::PublishingConfig;
use crate::errors::{QuireError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Base used to parse path-only URLs; never appears in output
const RELATIVE_BASE: &str = "http://quire.invalid/";

/// Durable storage for named secrets
pub trait SecretStore {
    /// # Errors
    ///
    /// Returns `SecretStore` if the backing storage fails.
    fn get(&self, name: &str) -> Result<Option<String>>;

    /// Insert or replace a secret
    ///
    /// # Errors
    ///
    /// Returns `SecretStore` if the backing storage fails.
    fn put(&self, name: &str, value: &str) -> Result<()>;

    /// # Errors
    ///
    /// Returns `SecretStore` if the backing storage fails.
    fn delete(&self, name: &str) -> Result<()>;
}

/// Process-local secret store
#[derive(Debug, Default)]
pub struct MemorySecretStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned() -> QuireError {
        QuireError::SecretStore {
            reason: "secret store lock poisoned".to_string(),
        }
    }
}

impl SecretStore for MemorySecretStore {
    fn get(&self, name: &str) -> Result<Option<String>> {
        let values = self.values.lock().map_err(|_| Self::poisoned())?;
        Ok(values.get(name).cloned())
    }

    fn put(&self, name: &str, value: &str) -> Result<()> {
        let mut values = self.values.lock().map_err(|_| Self::poisoned())?;
        values.insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, name: &str) -> Result<()> {
        let mut values = self.values.lock().map_err(|_| Self::poisoned())?;
        values.remove(name);
        Ok(())
    }
}

/// Signs and verifies draft preview URLs
pub struct DraftUrlSigner<'a> {
    secrets: &'a dyn SecretStore,
    config: PublishingConfig,
}

impl<'a> DraftUrlSigner<'a> {
    pub fn new(secrets: &'a dyn SecretStore, config: PublishingConfig) -> Self {
        Self { secrets, config }
    }

    pub fn config(&self) -> &PublishingConfig {
        &self.config
    }

    /// The signing secret, generated and stored on first use
    ///
    /// # Errors
    ///
    /// Returns `SecretStore` if the secret cannot be read or stored.
    pub fn secret_key(&self) -> Result<Sensitive<String>> {
        if let Some(existing) = self.secrets.get(&self.config.secret_key_name)? {
            return Ok(Sensitive::new(existing));
        }
        let generated = random_string(self.config.secret_key_length);
        self.secrets.put(&self.config.secret_key_name, &generated)?;
        tracing::info!(
            secret_key_name = %self.config.secret_key_name,
            "generated draft secret key"
        );
        Ok(Sensitive::new(generated))
    }

    /// Replace the secret; every previously signed URL stops verifying
    ///
    /// # Errors
    ///
    /// Returns `SecretStore` if the old secret cannot be removed or the new
    /// one stored.
    pub fn rotate_secret(&self) -> Result<()> {
        self.secrets.delete(&self.config.secret_key_name)?;
        self.secret_key()?;
        tracing::info!(
            secret_key_name = %self.config.secret_key_name,
            "rotated draft secret key"
        );
        Ok(())
    }

    /// Hex HMAC-SHA256 of `path`, keyed by the salted secret
    ///
    /// # Errors
    ///
    /// Returns `SecretStore` if the secret is unavailable.
    pub fn compute_signature(&self, salt: &str, path: &str) -> Result<String> {
        let secret = self.secret_key()?;
        let key = Sha256::new()
            .chain_update(salt.as_bytes())
            .chain_update(secret.expose().as_bytes())
            .finalize();
        let mut mac = HmacSha256::new_from_slice(&key).map_err(|e| QuireError::Internal {
            message: format!("hmac key rejected: {}", e),
        })?;
        mac.update(path.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Attach a fresh preview token to `url`
    ///
    /// A URL that already carries a valid token is returned unchanged. Other
    /// query parameters are kept; a stale token is replaced. Path-only input
    /// gives path-only output.
    ///
    /// # Errors
    ///
    /// Returns `InvalidUrl` if `url` cannot be parsed, or `SecretStore` if the
    /// secret is unavailable.
    pub fn sign(&self, url: &str) -> Result<String> {
        if self.verify(url) {
            return Ok(url.to_string());
        }

        let (mut parsed, relative) = parse_url(url)?;
        let salt = random_string(self.config.salt_length);
        let signature = self.compute_signature(&salt, parsed.path())?;

        let edit_param = self.config.edit_param.as_str();
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in parsed.query_pairs().filter(|(k, _)| k != edit_param) {
            serializer.append_pair(&key, &value);
        }
        let mut query = serializer.finish();
        if !query.is_empty() {
            query.push('&');
        }
        // ':' is left literal in the token
        query.extend(form_urlencoded::byte_serialize(edit_param.as_bytes()));
        query.push('=');
        query.push_str(&salt);
        query.push(':');
        query.push_str(&signature);
        parsed.set_query(Some(&query));

        if relative {
            Ok(parsed[Position::BeforePath..].to_string())
        } else {
            Ok(parsed.to_string())
        }
    }

    /// Whether `url` carries a valid preview token for its own path
    ///
    /// Never fails: a missing or malformed token is simply not valid.
    pub fn verify(&self, url: &str) -> bool {
        let Ok((parsed, _)) = parse_url(url) else {
            return false;
        };
        let edit_param = self.config.edit_param.as_str();
        let Some(token) = parsed
            .query_pairs()
            .filter(|(k, _)| k == edit_param)
            .map(|(_, v)| v.into_owned())
            .last()
        else {
            return false;
        };

        let parts: Vec<&str> = token.split(':').collect();
        if parts.len() != 2 || parts[0].is_empty() {
            tracing::debug!(path = parsed.path(), "malformed draft token");
            return false;
        }
        let (salt, signature) = (parts[0], parts[1]);

        match self.compute_signature(salt, parsed.path()) {
            Ok(expected) => {
                let valid: bool = expected.as_bytes().ct_eq(signature.as_bytes()).into();
                if !valid {
                    tracing::debug!(path = parsed.path(), "draft token signature mismatch");
                }
                valid
            }
            Err(err) => {
                tracing::warn!(error = %err, "draft token could not be checked");
                false
            }
        }
    }
}

/// Parse absolute or path-only URLs; the flag is true for path-only input
fn parse_url(url: &str) -> Result<(Url, bool)> {
    let invalid = |reason: String| QuireError::InvalidUrl {
        url: url.to_string(),
        reason,
    };
    match Url::parse(url) {
        Ok(parsed) => Ok((parsed, false)),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let base = Url::parse(RELATIVE_BASE).map_err(|e| invalid(e.to_string()))?;
            let joined = base.join(url).map_err(|e| invalid(e.to_string()))?;
            Ok((joined, true))
        }
        Err(e) => Err(invalid(e.to_string())),
    }
}

fn random_string(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer(secrets: &MemorySecretStore) -> DraftUrlSigner<'_> {
        DraftUrlSigner::new(secrets, PublishingConfig::default())
    }

    #[test]
    fn test_secret_generated_once() {
        let secrets = MemorySecretStore::new();
        let signer = signer(&secrets);
        let first = signer.secret_key().unwrap();
        let second = signer.secret_key().unwrap();
        assert_eq!(first.expose().len(), 50);
        assert_eq!(first, second);
    }

    #[test]
    fn test_sign_then_verify_non_ascii() {
        let secrets = MemorySecretStore::new();
        let signer = signer(&secrets);
        let signed = signer.sign("/search/?q=Eugène").unwrap();
        assert!(signed.starts_with("/search/?"));
        assert!(signer.verify(&signed));
    }

    #[test]
    fn test_sign_is_idempotent_on_valid_url() {
        let secrets = MemorySecretStore::new();
        let signer = signer(&secrets);
        let signed = signer.sign("/about/").unwrap();
        assert_eq!(signer.sign(&signed).unwrap(), signed);
    }

    #[test]
    fn test_sign_replaces_empty_edit_and_keeps_params() {
        let secrets = MemorySecretStore::new();
        let signer = signer(&secrets);
        let signed = signer.sign("/about/?edit=&page=2").unwrap();
        assert!(signed.contains("page=2"));
        assert_eq!(signed.matches("edit=").count(), 1);
        assert!(signer.verify(&signed));
    }

    #[test]
    fn test_absolute_url_stays_absolute() {
        let secrets = MemorySecretStore::new();
        let signer = signer(&secrets);
        let signed = signer.sign("https://example.com/about/").unwrap();
        assert!(signed.starts_with("https://example.com/about/?edit="));
        assert!(signer.verify(&signed));
    }

    #[test]
    fn test_verify_rejects_malformed_tokens() {
        let secrets = MemorySecretStore::new();
        let signer = signer(&secrets);
        assert!(!signer.verify("/about/"));
        assert!(!signer.verify("/about/?edit="));
        assert!(!signer.verify("/about/?edit=nocolon"));
        assert!(!signer.verify("/about/?edit=a:b:c"));
        assert!(!signer.verify("/about/?edit=abcde:deadbeef"));
    }

    #[test]
    fn test_token_does_not_transfer_between_paths() {
        let secrets = MemorySecretStore::new();
        let signer = signer(&secrets);
        let signed = signer.sign("/about/").unwrap();
        let query = signed.split_once('?').map(|(_, q)| q).unwrap();
        assert!(!signer.verify(&format!("/contact/?{}", query)));
    }

    #[test]
    fn test_rotation_invalidates_links() {
        let secrets = MemorySecretStore::new();
        let signer = signer(&secrets);
        let signed = signer.sign("/about/").unwrap();
        signer.rotate_secret().unwrap();
        assert!(!signer.verify(&signed));
    }
}
