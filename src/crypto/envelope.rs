use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use aes_gcm::aead::rand_core::RngCore;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::error::{AppError, Result};

/// The size of the AES-256 key in bytes.
pub const KEY_SIZE: usize = 32;
/// The size of the AES-GCM nonce in bytes.
pub const NONCE_SIZE: usize = 12;

/// The persisted form of an encrypted payload: a hex-encoded nonce and
/// hex-encoded ciphertext (integrity tag included). This is the only shape
/// tariff data ever takes at rest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CipherBlob {
    /// The 96-bit nonce, hex-encoded.
    pub nonce: String,
    /// The ciphertext plus GCM tag, hex-encoded.
    pub ct: String,
}

/// Authenticated encryption of structured payloads under a fixed symmetric
/// key. Stateless apart from the key it is constructed with; safe to share
/// across requests.
#[derive(Clone)]
pub struct EnvelopeCipher {
    cipher: Aes256Gcm,
}

impl EnvelopeCipher {
    /// Creates a new `EnvelopeCipher` from a 32-byte key. Key sizing is
    /// enforced at configuration load, so construction cannot fail.
    pub fn new(key: &[u8; KEY_SIZE]) -> Self {
        Self {
            cipher: Aes256Gcm::new(key.into()),
        }
    }

    /// Encrypts a serializable payload under a fresh random nonce.
    ///
    /// The nonce is drawn from the OS CSPRNG on every call, which is what
    /// keeps nonces unique for the lifetime of a key.
    pub fn encrypt<T: Serialize>(&self, payload: &T) -> Result<CipherBlob> {
        let plaintext = sonic_rs::to_vec(payload)
            .map_err(|e| AppError::Encryption(format!("Payload serialization failed: {}", e)))?;

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from(nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext.as_slice())
            .map_err(|e| AppError::Encryption(format!("Encryption failed: {}", e)))?;

        Ok(CipherBlob {
            nonce: hex::encode(nonce_bytes),
            ct: hex::encode(ciphertext),
        })
    }

    /// Decrypts a `CipherBlob` back into its payload.
    ///
    /// Any malformed hex, wrong nonce length, tag mismatch, or wrong key
    /// yields `AppError::Decrypt`; partial plaintext is never returned.
    pub fn decrypt<T: DeserializeOwned>(&self, blob: &CipherBlob) -> Result<T> {
        let nonce_bytes = hex::decode(&blob.nonce)
            .map_err(|_| AppError::Decrypt("Malformed nonce encoding".to_string()))?;
        let nonce_bytes: [u8; NONCE_SIZE] = nonce_bytes
            .as_slice()
            .try_into()
            .map_err(|_| AppError::Decrypt("Invalid nonce length".to_string()))?;

        let ciphertext = hex::decode(&blob.ct)
            .map_err(|_| AppError::Decrypt("Malformed ciphertext encoding".to_string()))?;

        let plaintext = self
            .cipher
            .decrypt(&Nonce::from(nonce_bytes), ciphertext.as_slice())
            .map_err(|_| AppError::Decrypt("Ciphertext failed authentication".to_string()))?;

        sonic_rs::from_slice(&plaintext)
            .map_err(|e| AppError::Decrypt(format!("Payload deserialization failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Payload {
        label: String,
        values: Vec<f64>,
    }

    fn test_key() -> [u8; KEY_SIZE] {
        [7u8; KEY_SIZE]
    }

    fn sample() -> Payload {
        Payload {
            label: "night rate".to_string(),
            values: vec![0.2, 0.45],
        }
    }

    #[test]
    fn encrypt_decrypt_roundtrip() {
        let cipher = EnvelopeCipher::new(&test_key());

        let blob = cipher.encrypt(&sample()).unwrap();
        let decrypted: Payload = cipher.decrypt(&blob).unwrap();

        assert_eq!(decrypted, sample());
    }

    #[test]
    fn fresh_nonce_per_call() {
        let cipher = EnvelopeCipher::new(&test_key());

        let first = cipher.encrypt(&sample()).unwrap();
        let second = cipher.encrypt(&sample()).unwrap();

        assert_ne!(first.nonce, second.nonce);
        assert_ne!(first.ct, second.ct);
    }

    #[test]
    fn wrong_key_fails() {
        let cipher = EnvelopeCipher::new(&test_key());
        let other = EnvelopeCipher::new(&[8u8; KEY_SIZE]);

        let blob = cipher.encrypt(&sample()).unwrap();
        let result: Result<Payload> = other.decrypt(&blob);

        assert!(matches!(result, Err(AppError::Decrypt(_))));
    }

    #[test]
    fn tampered_ciphertext_fails() {
        let cipher = EnvelopeCipher::new(&test_key());

        let mut blob = cipher.encrypt(&sample()).unwrap();
        let mut raw = hex::decode(&blob.ct).unwrap();
        raw[0] ^= 0x01;
        blob.ct = hex::encode(raw);

        let result: Result<Payload> = cipher.decrypt(&blob);
        assert!(matches!(result, Err(AppError::Decrypt(_))));
    }

    #[test]
    fn malformed_blob_fails() {
        let cipher = EnvelopeCipher::new(&test_key());

        let bad_hex = CipherBlob {
            nonce: "not hex".to_string(),
            ct: "00".to_string(),
        };
        assert!(matches!(
            cipher.decrypt::<Payload>(&bad_hex),
            Err(AppError::Decrypt(_))
        ));

        let short_nonce = CipherBlob {
            nonce: "0011".to_string(),
            ct: "00".to_string(),
        };
        assert!(matches!(
            cipher.decrypt::<Payload>(&short_nonce),
            Err(AppError::Decrypt(_))
        ));
    }
}
