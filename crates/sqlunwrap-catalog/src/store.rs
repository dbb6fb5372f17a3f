//! Catalog store contract

use anyhow::Result;

/// One `sys.sysobjvalues` row: (imageval, subobjid)
pub type PayloadRow = (Vec<u8>, u16);

/// A single catalog session.
///
/// Methods take `&mut self`: an administrative session serves one query at a
/// time. `Ok(None)` means "no such row"; `Err` means the lookup itself failed.
pub trait CatalogStore {
    /// `SELECT OBJECT_ID(@name)`
    fn lookup_object_id(&mut self, name: &str) -> Result<Option<u32>>;

    /// Family GUID of the database the session is bound to, as `binary(16)`.
    /// Returned unvalidated; callers check the width.
    fn lookup_family_id(&mut self) -> Result<Option<Vec<u8>>>;

    /// The first ciphertext row for `id`.
    fn lookup_encrypted_payload(&mut self, id: u32) -> Result<Option<PayloadRow>>;

    /// Every ciphertext row for `id`. Stores that cannot enumerate fragments
    /// fall back to the single row.
    fn lookup_encrypted_payloads(&mut self, id: u32) -> Result<Vec<PayloadRow>> {
        Ok(self.lookup_encrypted_payload(id)?.into_iter().collect())
    }
}

impl<S: CatalogStore + ?Sized> CatalogStore for &mut S {
    fn lookup_object_id(&mut self, name: &str) -> Result<Option<u32>> {
        (**self).lookup_object_id(name)
    }

    fn lookup_family_id(&mut self) -> Result<Option<Vec<u8>>> {
        (**self).lookup_family_id()
    }

    fn lookup_encrypted_payload(&mut self, id: u32) -> Result<Option<PayloadRow>> {
        (**self).lookup_encrypted_payload(id)
    }

    fn lookup_encrypted_payloads(&mut self, id: u32) -> Result<Vec<PayloadRow>> {
        (**self).lookup_encrypted_payloads(id)
    }
}

/// Opens independent sessions against the same database, so several objects
/// can be recovered concurrently without sharing one session.
pub trait SessionSource: Sync {
    type Session: CatalogStore + Send;

    fn open_session(&self) -> Result<Self::Session>;
}
