//! Salted PBKDF2-HMAC-SHA512 password records.
//!
//! A record is `salt:derived`, both lowercase hex. The salt is used as its
//! hex text, not the decoded bytes, so records written by earlier versions of
//! the service keep verifying.

use pbkdf2::pbkdf2_hmac;
use rand::{rngs::OsRng, RngCore};
use sha2::Sha512;
use subtle::ConstantTimeEq;
use tracing::warn;

const SALT_BYTES: usize = 16;
const ITERATIONS: u32 = 10_000;
const KEY_BYTES: usize = 64;
const SEPARATOR: char = ':';

pub fn hash_password(plain: &str) -> String {
    let mut salt = [0u8; SALT_BYTES];
    OsRng.fill_bytes(&mut salt);
    let salt = hex::encode(salt);
    let derived = derive(plain, &salt);
    format!("{salt}{SEPARATOR}{}", hex::encode(derived))
}

/// Returns `false` for a wrong password and for any malformed record.
pub fn verify_password(plain: &str, record: &str) -> bool {
    let Some((salt, stored_hex)) = record.split_once(SEPARATOR) else {
        warn!("password record without separator");
        return false;
    };
    if salt.is_empty() {
        warn!("password record with empty salt");
        return false;
    }
    let stored = match hex::decode(stored_hex) {
        Ok(bytes) if bytes.len() == KEY_BYTES => bytes,
        _ => {
            warn!("password record with malformed digest");
            return false;
        }
    };
    let derived = derive(plain, salt);
    derived[..].ct_eq(&stored[..]).into()
}

fn derive(plain: &str, salt: &str) -> [u8; KEY_BYTES] {
    let mut out = [0u8; KEY_BYTES];
    pbkdf2_hmac::<Sha512>(plain.as_bytes(), salt.as_bytes(), ITERATIONS, &mut out);
    out
}
