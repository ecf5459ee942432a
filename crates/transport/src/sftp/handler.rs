use std::sync::{Arc, Mutex};

use logging::targets;
use russh::client;
use russh::keys::{HashAlg, PublicKey};
use tracing::{debug, warn};

/// Fingerprints recorded when the server key did not match the pinned one.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(super) struct HostKeyRejection {
    pub(super) expected: String,
    pub(super) actual: String,
}

/// Server key policy for one connection attempt.
///
/// With a pinned fingerprint the key must match exactly. Without one the key
/// is accepted and its fingerprint logged so it can be pinned later.
pub(super) struct HostKeyPolicy {
    address: String,
    pinned: Option<String>,
    rejection: Arc<Mutex<Option<HostKeyRejection>>>,
}

impl HostKeyPolicy {
    pub(super) fn new(
        address: String,
        pinned: Option<String>,
        rejection: Arc<Mutex<Option<HostKeyRejection>>>,
    ) -> Self {
        Self {
            address,
            pinned,
            rejection,
        }
    }

    fn evaluate(&self, actual: String) -> bool {
        match self.pinned.as_deref() {
            Some(expected) if fingerprints_match(expected, &actual) => {
                debug!(target: targets::CONNECT, address = %self.address, fingerprint = %actual, "host key matches pinned fingerprint");
                true
            }
            Some(expected) => {
                if let Ok(mut slot) = self.rejection.lock() {
                    *slot = Some(HostKeyRejection {
                        expected: expected.to_owned(),
                        actual,
                    });
                }
                false
            }
            None => {
                warn!(target: targets::CONNECT, address = %self.address, fingerprint = %actual, "accepting unpinned host key; set SFTP_PULL_HOST_KEY to pin it");
                true
            }
        }
    }
}

impl client::Handler for HostKeyPolicy {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> Result<bool, Self::Error> {
        let actual = server_public_key.fingerprint(HashAlg::Sha256).to_string();
        Ok(self.evaluate(actual))
    }
}

/// Compares fingerprints, tolerating a missing `SHA256:` prefix on the pinned value.
fn fingerprints_match(expected: &str, actual: &str) -> bool {
    let expected = expected.trim();
    expected == actual
        || actual
            .strip_prefix("SHA256:")
            .is_some_and(|bare| bare == expected)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(pinned: Option<&str>) -> (HostKeyPolicy, Arc<Mutex<Option<HostKeyRejection>>>) {
        let slot = Arc::new(Mutex::new(None));
        let policy = HostKeyPolicy::new(
            "sftp.example.net:22".to_owned(),
            pinned.map(str::to_owned),
            Arc::clone(&slot),
        );
        (policy, slot)
    }

    #[test]
    fn unpinned_key_is_accepted() {
        let (policy, slot) = policy(None);
        assert!(policy.evaluate("SHA256:abc".to_owned()));
        assert!(slot.lock().unwrap().is_none());
    }

    #[test]
    fn matching_pin_is_accepted_with_or_without_prefix() {
        let (with_prefix, _) = policy(Some("SHA256:abc"));
        assert!(with_prefix.evaluate("SHA256:abc".to_owned()));

        let (bare, _) = policy(Some("abc"));
        assert!(bare.evaluate("SHA256:abc".to_owned()));
    }

    #[test]
    fn mismatched_pin_is_rejected_and_recorded() {
        let (policy, slot) = policy(Some("SHA256:expected"));
        assert!(!policy.evaluate("SHA256:offered".to_owned()));
        assert_eq!(
            slot.lock().unwrap().clone(),
            Some(HostKeyRejection {
                expected: "SHA256:expected".to_owned(),
                actual: "SHA256:offered".to_owned(),
            })
        );
    }
}
