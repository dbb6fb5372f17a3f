//! sqlunwrap-crypto: decryption of `WITH ENCRYPTION` module bodies
//!
//! Pipeline: ciphertext (`sys.sysobjvalues.imageval`) → RC4 → UTF-16 → String
//!
//! Key schedule:
//! ```text
//! key_material = family_guid (16 bytes, verbatim)
//!             || object_id   (u32, little-endian)
//!             || subobjid    (u16, little-endian)
//! rc4_key      = SHA1(key_material)            (20 bytes)
//! ```
//!
//! There is no authentication tag. A wrong key yields same-length garbage;
//! the only signal is that the result usually fails UTF-16 decoding.

pub mod kdf;
pub mod stream;
pub mod text;

pub use kdf::{derive_key, key_material, DerivedKey};
pub use stream::{decrypt, encrypt};
pub use text::{decode_utf16, encode_utf16le, DecodeMode};

/// Size of the RC4 key (a SHA-1 digest)
pub const KEY_SIZE: usize = 20;

/// Size of the buffer hashed into the key
pub const KEY_MATERIAL_SIZE: usize = 16 + 4 + 2;
