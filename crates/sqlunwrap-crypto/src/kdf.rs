//! Key derivation: family GUID + object id + subobjid → SHA-1 → RC4 key

use sha1::{Digest, Sha1};
use zeroize::Zeroize;

use sqlunwrap_core::{FamilyId, ObjectId, SubObjectId};

use crate::{KEY_MATERIAL_SIZE, KEY_SIZE};

/// A 160-bit RC4 key for one fragment.
///
/// Not `Clone`: each key is consumed by exactly one decrypt call.
/// Zeroized on drop.
pub struct DerivedKey {
    bytes: [u8; KEY_SIZE],
}

impl DerivedKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl Drop for DerivedKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Build the 22-byte buffer that is hashed into the key:
/// family (16 bytes as stored) || object_id (4 bytes LE) || subobjid (2 bytes LE)
pub fn key_material(family: &FamilyId, id: ObjectId, sub: SubObjectId) -> [u8; KEY_MATERIAL_SIZE] {
    let mut buf = [0u8; KEY_MATERIAL_SIZE];
    buf[..16].copy_from_slice(family.as_bytes());
    buf[16..20].copy_from_slice(&id.0.to_le_bytes());
    buf[20..22].copy_from_slice(&sub.0.to_le_bytes());
    buf
}

/// Derive the RC4 key for one fragment. Pure and deterministic.
pub fn derive_key(family: &FamilyId, id: ObjectId, sub: SubObjectId) -> DerivedKey {
    let mut material = key_material(family, id, sub);
    let digest: [u8; KEY_SIZE] = Sha1::digest(&material).into();
    material.zeroize();
    DerivedKey::from_bytes(digest)
}
