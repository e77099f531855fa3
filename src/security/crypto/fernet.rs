//! Fernet tokens.
//!
//! Implements AES-128-CBC encryption with HMAC-SHA256 authentication in the
//! Fernet token format: `0x80 | timestamp | iv | ciphertext | hmac`, encoded
//! as URL-safe base64 with padding.

use crate::config::{Result, SessionError};
use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use base64::{Engine as _, engine::general_purpose::URL_SAFE};
use hmac::{Hmac, Mac};
use rand::Rng;
use sha2::Sha256;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

type HmacSha256 = Hmac<Sha256>;
type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;

const VERSION: u8 = 0x80;
const KEY_LEN: usize = 32;
const HALF_KEY_LEN: usize = 16;
const TIMESTAMP_LEN: usize = 8;
const IV_LEN: usize = 16;
const HMAC_LEN: usize = 32;
const HEADER_LEN: usize = 1 + TIMESTAMP_LEN;
const MAX_CLOCK_SKEW: u64 = 60;

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs())
}

#[derive(Clone)]
pub struct Fernet {
    signing_key: [u8; HALF_KEY_LEN],
    encryption_key: [u8; HALF_KEY_LEN],
}

impl fmt::Debug for Fernet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fernet").finish_non_exhaustive()
    }
}

impl Fernet {
    /// Generates a fresh random key, URL-safe base64 encoded.
    #[must_use]
    pub fn generate_key() -> String {
        let key: [u8; KEY_LEN] = rand::rng().random();
        URL_SAFE.encode(key)
    }

    /// Creates a new `Fernet` instance from a URL-safe base64 encoded 32-byte key.
    ///
    /// The key is taken verbatim; surrounding whitespace is not stripped.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidKey` if the key is not valid base64 or
    /// does not decode to exactly 32 bytes.
    pub fn new(key: &str) -> Result<Self> {
        let decoded = URL_SAFE
            .decode(key)
            .map_err(|e| SessionError::InvalidKey(e.to_string()))?;

        if decoded.len() != KEY_LEN {
            return Err(SessionError::InvalidKey(format!(
                "expected {KEY_LEN} bytes, got {}",
                decoded.len()
            )));
        }

        let mut signing_key = [0u8; HALF_KEY_LEN];
        let mut encryption_key = [0u8; HALF_KEY_LEN];
        signing_key.copy_from_slice(&decoded[..HALF_KEY_LEN]);
        encryption_key.copy_from_slice(&decoded[HALF_KEY_LEN..]);

        Ok(Self {
            signing_key,
            encryption_key,
        })
    }

    /// Encrypts data into a token stamped with the current time.
    #[must_use]
    pub fn encrypt(&self, data: &[u8]) -> String {
        self.encrypt_at_time(data, now_secs())
    }

    /// Encrypts data into a token stamped with `timestamp`.
    #[must_use]
    pub fn encrypt_at_time(&self, data: &[u8], timestamp: u64) -> String {
        let iv: [u8; IV_LEN] = rand::rng().random();
        self.encrypt_with_iv(data, timestamp, &iv)
    }

    pub(crate) fn encrypt_with_iv(
        &self,
        data: &[u8],
        timestamp: u64,
        iv: &[u8; IV_LEN],
    ) -> String {
        let ciphertext = Aes128CbcEnc::new(&self.encryption_key.into(), &(*iv).into())
            .encrypt_padded_vec_mut::<Pkcs7>(data);

        let mut token = Vec::with_capacity(HEADER_LEN + IV_LEN + ciphertext.len() + HMAC_LEN);
        token.push(VERSION);
        token.extend_from_slice(&timestamp.to_be_bytes());
        token.extend_from_slice(iv);
        token.extend_from_slice(&ciphertext);

        let mut mac = self.mac();
        mac.update(&token);
        token.extend_from_slice(&mac.finalize().into_bytes());

        URL_SAFE.encode(&token)
    }

    /// Verifies and decrypts a token.
    ///
    /// With `ttl` set, tokens older than `ttl` seconds are rejected.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::TokenExpired` if the token is older than `ttl`,
    /// and `SessionError::InvalidToken` for any other failure.
    pub fn decrypt(&self, token: &str, ttl: Option<u64>) -> Result<Vec<u8>> {
        self.decrypt_at_time(token, ttl, now_secs())
    }

    /// Verifies and decrypts a token as if the current time were `current_time`.
    ///
    /// # Errors
    ///
    /// See [`Fernet::decrypt`].
    pub fn decrypt_at_time(
        &self,
        token: &str,
        ttl: Option<u64>,
        current_time: u64,
    ) -> Result<Vec<u8>> {
        let (data, timestamp) = Self::unverified_token_data(token)?;

        if let Some(ttl) = ttl {
            if timestamp.saturating_add(ttl) < current_time {
                return Err(SessionError::TokenExpired);
            }
            if current_time.saturating_add(MAX_CLOCK_SKEW) < timestamp {
                return Err(SessionError::InvalidToken);
            }
        }

        self.verify_signature(&data)?;

        let iv = &data[HEADER_LEN..HEADER_LEN + IV_LEN];
        let ciphertext = &data[HEADER_LEN + IV_LEN..data.len() - HMAC_LEN];

        Aes128CbcDec::new_from_slices(&self.encryption_key, iv)
            .map_err(|_| SessionError::InvalidToken)?
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .map_err(|_| SessionError::InvalidToken)
    }

    /// Returns the timestamp embedded in an authentic token.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidToken` if the token is malformed or its
    /// signature does not verify.
    pub fn extract_timestamp(&self, token: &str) -> Result<u64> {
        let (data, timestamp) = Self::unverified_token_data(token)?;
        self.verify_signature(&data)?;
        Ok(timestamp)
    }

    fn unverified_token_data(token: &str) -> Result<(Vec<u8>, u64)> {
        let data = URL_SAFE
            .decode(token)
            .map_err(|_| SessionError::InvalidToken)?;

        if data.first() != Some(&VERSION) || data.len() < HEADER_LEN {
            return Err(SessionError::InvalidToken);
        }

        let mut ts = [0u8; TIMESTAMP_LEN];
        ts.copy_from_slice(&data[1..HEADER_LEN]);
        Ok((data, u64::from_be_bytes(ts)))
    }

    fn verify_signature(&self, data: &[u8]) -> Result<()> {
        if data.len() < HEADER_LEN + IV_LEN + HMAC_LEN {
            return Err(SessionError::InvalidToken);
        }

        let (signed, tag) = data.split_at(data.len() - HMAC_LEN);
        let mut mac = self.mac();
        mac.update(signed);
        mac.verify_slice(tag).map_err(|_| SessionError::InvalidToken)
    }

    /// # Panics
    ///
    /// Panics if HMAC initialization fails, which the fixed key size prevents.
    fn mac(&self) -> HmacSha256 {
        <HmacSha256 as Mac>::new_from_slice(&self.signing_key)
            .expect("HMAC accepts any key size")
    }
}
