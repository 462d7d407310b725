//! Password hashing.
//!
//! The only place that looks inside a [`PasswordHash`]. Hashes are Argon2id
//! PHC strings with a random 16-byte salt.

use argon2::password_hash::{
    Error as PhcError, PasswordHash as PhcHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::{Algorithm, Argon2, Params, Version};
use flow_db::PasswordHash;

use crate::error::{CredentialError, CredentialResult};

/// Salted, slow password hashing.
#[derive(Clone)]
pub struct CredentialStore {
    argon2: Argon2<'static>,
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self {
            argon2: Argon2::default(),
        }
    }
}

impl CredentialStore {
    /// Use custom Argon2id costs: memory in KiB, iterations, parallelism.
    pub fn with_cost(m_cost: u32, t_cost: u32, p_cost: u32) -> CredentialResult<Self> {
        let params = Params::new(m_cost, t_cost, p_cost, None)
            .map_err(|e| CredentialError::Hash(e.to_string()))?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Hash a password with a fresh random salt.
    pub fn hash(&self, password: &str) -> CredentialResult<PasswordHash> {
        let salt_bytes: [u8; 16] = rand::random();
        let salt =
            SaltString::encode_b64(&salt_bytes).map_err(|e| CredentialError::Hash(e.to_string()))?;

        let phc = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| CredentialError::Hash(e.to_string()))?;

        Ok(PasswordHash::from_bytes(phc.to_string().into_bytes()))
    }

    /// Check a password against a stored hash.
    ///
    /// `Ok(false)` means the comparison ran and the password did not match.
    /// An `Err` means the comparison could not run at all.
    pub fn verify(&self, hash: &PasswordHash, password: &str) -> CredentialResult<bool> {
        let encoded = std::str::from_utf8(hash.as_bytes())
            .map_err(|e| CredentialError::CorruptHash(e.to_string()))?;
        let parsed = PhcHash::new(encoded).map_err(|e| CredentialError::CorruptHash(e.to_string()))?;

        match self.argon2.verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(PhcError::Password) => Ok(false),
            Err(e) => Err(CredentialError::CorruptHash(e.to_string())),
        }
    }

    /// [`hash`](Self::hash) on the blocking thread pool.
    pub async fn hash_blocking(&self, password: &str) -> CredentialResult<PasswordHash> {
        let store = self.clone();
        let password = password.to_string();
        tokio::task::spawn_blocking(move || store.hash(&password))
            .await
            .map_err(|e| CredentialError::Task(e.to_string()))?
    }

    /// [`verify`](Self::verify) on the blocking thread pool.
    pub async fn verify_blocking(
        &self,
        hash: &PasswordHash,
        password: &str,
    ) -> CredentialResult<bool> {
        let store = self.clone();
        let hash = hash.clone();
        let password = password.to_string();
        tokio::task::spawn_blocking(move || store.verify(&hash, &password))
            .await
            .map_err(|e| CredentialError::Task(e.to_string()))?
    }
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore").finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) fn test_store() -> CredentialStore {
    // Minimal cost keeps the test suite fast; production uses the defaults.
    CredentialStore::with_cost(8, 1, 1).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_verifies_only_original_password() {
        let store = test_store();
        let hash = store.hash("pw1234").unwrap();

        assert!(store.verify(&hash, "pw1234").unwrap());
        assert!(!store.verify(&hash, "pw12345").unwrap());
        assert!(!store.verify(&hash, "").unwrap());
        assert!(!store.verify(&hash, "PW1234").unwrap());
    }

    #[test]
    fn test_hashes_are_salted() {
        let store = test_store();
        let first = store.hash("same").unwrap();
        let second = store.hash("same").unwrap();
        assert_ne!(first, second);
        assert!(store.verify(&first, "same").unwrap());
        assert!(store.verify(&second, "same").unwrap());
    }

    #[test]
    fn test_default_store_verifies_low_cost_hash() {
        // Parameters travel inside the PHC string.
        let hash = test_store().hash("pw").unwrap();
        assert!(CredentialStore::default().verify(&hash, "pw").unwrap());
    }

    #[test]
    fn test_rejects_impossible_cost() {
        assert!(CredentialStore::with_cost(0, 0, 0).is_err());
    }

    #[test]
    fn test_corrupt_hash_is_an_error_not_a_mismatch() {
        let store = test_store();

        let garbage = PasswordHash::from_bytes(b"not-a-phc-string".to_vec());
        assert!(matches!(
            store.verify(&garbage, "pw"),
            Err(CredentialError::CorruptHash(_))
        ));

        let not_utf8 = PasswordHash::from_bytes(vec![0xff, 0xfe, 0xfd]);
        assert!(matches!(
            store.verify(&not_utf8, "pw"),
            Err(CredentialError::CorruptHash(_))
        ));
    }

    #[tokio::test]
    async fn test_blocking_variants() {
        let store = test_store();
        let hash = store.hash_blocking("pw1234").await.unwrap();
        assert!(store.verify_blocking(&hash, "pw1234").await.unwrap());
        assert!(!store.verify_blocking(&hash, "nope").await.unwrap());
    }
}
