//! RC4 stream transform over a whole fragment
//!
//! Single pass, no re-keying. Output length always equals input length.

use rc4::{consts::U20, KeyInit, Rc4, StreamCipher};

use crate::kdf::DerivedKey;

/// Decrypt one fragment. The key is consumed so it cannot be reused for
/// another object.
pub fn decrypt(key: DerivedKey, ciphertext: &[u8]) -> Vec<u8> {
    apply(key, ciphertext)
}

/// Encrypt one fragment. RC4 is symmetric, so this is the same keystream XOR;
/// it exists for building catalog fixtures.
pub fn encrypt(key: DerivedKey, plaintext: &[u8]) -> Vec<u8> {
    apply(key, plaintext)
}

fn apply(key: DerivedKey, input: &[u8]) -> Vec<u8> {
    let mut cipher = Rc4::<U20>::new(key.as_bytes().into());
    let mut buf = input.to_vec();
    cipher.apply_keystream(&mut buf);
    tracing::trace!(bytes = buf.len(), "applied RC4 keystream");
    buf
}
