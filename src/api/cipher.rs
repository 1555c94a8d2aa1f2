//! Login password encryption
//!
//! The login endpoint does not accept the plain password: it expects the
//! password encrypted with key material derived from the account email and the
//! per-session `encryptionSalt` published on the home page. The server checks
//! the result byte for byte, so the transform must be deterministic.
//!
//! The transform sits behind [`PasswordCipher`] so it can be replaced and
//! verified against the live site independently of the rest of the client.

use aes::cipher::{block_padding::Pkcs7, BlockEncryptMut, KeyIvInit};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use sha2::Sha256;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;

/// PBKDF2 rounds used to stretch the salt
pub const PBKDF2_ROUNDS: u32 = 1000;

const KEY_LEN: usize = 32;
const IV_LEN: usize = 16;

/// Turns `(username, password, salt)` into the value posted as `Password`
pub trait PasswordCipher: Send + Sync {
    /// `None` when the salt is unusable
    fn encrypt(&self, username: &str, password: &str, salt: &str) -> Option<String>;
}

/// AES-256-CBC over the password.
///
/// Key and IV are the 48 bytes of PBKDF2-HMAC-SHA256 with the username as
/// secret and the session salt as salt; the ciphertext is base64 encoded.
#[derive(Debug, Clone, Copy, Default)]
pub struct SaltedAesCipher;

impl PasswordCipher for SaltedAesCipher {
    fn encrypt(&self, username: &str, password: &str, salt: &str) -> Option<String> {
        if !is_valid_salt(salt) {
            return None;
        }

        let mut material = [0u8; KEY_LEN + IV_LEN];
        pbkdf2::pbkdf2_hmac::<Sha256>(
            username.as_bytes(),
            salt.as_bytes(),
            PBKDF2_ROUNDS,
            &mut material,
        );
        let (key, iv) = material.split_at(KEY_LEN);

        let cipher = Aes256CbcEnc::new_from_slices(key, iv).ok()?;
        let encrypted = cipher.encrypt_padded_vec_mut::<Pkcs7>(password.as_bytes());
        Some(STANDARD.encode(encrypted))
    }
}

/// Salts are printable ASCII tokens lifted from a quoted script literal
fn is_valid_salt(salt: &str) -> bool {
    !salt.is_empty()
        && salt
            .chars()
            .all(|c| c.is_ascii_graphic() && c != '\'' && c != '"')
}
