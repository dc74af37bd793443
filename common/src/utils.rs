// common/src/utils.rs
use sha2::{Digest, Sha256};
use tracing_subscriber::EnvFilter;

/// Setup tracing for consistent logging across crates
///
/// `RUST_LOG` overrides the `info` default. Safe to call more than once.
pub fn setup_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if tracing_subscriber::fmt().with_env_filter(filter).try_init().is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}

/// Hash a string using SHA-256
pub fn hash_string(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Short stable identifier for a credential, safe to put in logs
pub fn credential_fingerprint(credential: &str) -> String {
    let mut digest = hash_string(credential);
    digest.truncate(12);
    digest
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_string() {
        let hash = hash_string("test string");
        assert_eq!(hash.len(), 64); // SHA-256 produces 64 hex characters
    }

    #[test]
    fn test_fingerprint_is_short_and_stable() {
        let a = credential_fingerprint("secret-token");
        assert_eq!(a.len(), 12);
        assert_eq!(a, credential_fingerprint("secret-token"));
        assert_ne!(a, credential_fingerprint("other-token"));
        assert!(!a.contains("secret"));
    }
}
