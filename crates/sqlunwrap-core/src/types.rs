use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{UnwrapError, UnwrapResult};

/// Length of the database family GUID in its `binary(16)` form
pub const FAMILY_ID_LEN: usize = 16;

/// Numeric object id as returned by `OBJECT_ID()`.
///
/// Only meaningful inside the database that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(pub u32);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Discriminator of one encrypted fragment (`sys.sysobjvalues.subobjid`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubObjectId(pub u16);

impl fmt::Display for SubObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The 16-byte database family GUID, kept in the exact byte order the
/// catalog returned it. Shared read-only by every key derivation against
/// the same database.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct FamilyId([u8; FAMILY_ID_LEN]);

impl FamilyId {
    pub fn from_bytes(bytes: [u8; FAMILY_ID_LEN]) -> Self {
        Self(bytes)
    }

    /// Validate a catalog value. Anything but exactly 16 bytes is a catalog
    /// read failure since the key layout depends on the width.
    pub fn from_slice(bytes: &[u8]) -> UnwrapResult<Self> {
        let arr: [u8; FAMILY_ID_LEN] = bytes.try_into().map_err(|_| {
            UnwrapError::CatalogRead(format!(
                "family GUID must be {FAMILY_ID_LEN} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; FAMILY_ID_LEN] {
        &self.0
    }
}

impl fmt::Debug for FamilyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FamilyId(0x")?;
        for b in self.0 {
            write!(f, "{b:02x}")?;
        }
        write!(f, ")")
    }
}

/// One ciphertext row exactly as stored, with its discriminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedPayload {
    pub ciphertext: Vec<u8>,
    pub subobjid: SubObjectId,
}

impl EncryptedPayload {
    pub fn new(ciphertext: Vec<u8>, subobjid: u16) -> Self {
        Self {
            ciphertext,
            subobjid: SubObjectId(subobjid),
        }
    }
}
