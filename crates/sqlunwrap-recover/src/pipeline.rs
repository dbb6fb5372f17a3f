//! Per-object recovery pipeline

use serde::Serialize;
use tracing::debug;

use sqlunwrap_catalog::CatalogStore;
use sqlunwrap_core::{EncryptedPayload, FamilyId, ObjectId, SubObjectId, UnwrapError, UnwrapResult};
use sqlunwrap_crypto::{decode_utf16, decrypt, derive_key, DecodeMode};

/// Knobs for a single recovery.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecoverOptions {
    /// Decrypt every fragment row and join them in subobjid order
    pub all_fragments: bool,
    pub decode_mode: DecodeMode,
}

/// Plaintext of one object.
#[derive(Debug, Clone, Serialize)]
pub struct RecoveredObject {
    pub name: String,
    pub object_id: ObjectId,
    /// Discriminators of the fragments that make up `text`, in order
    pub fragments: Vec<SubObjectId>,
    pub text: String,
}

/// Map an object name to its id.
pub fn resolve<S: CatalogStore + ?Sized>(store: &mut S, name: &str) -> UnwrapResult<ObjectId> {
    if name.trim().is_empty() {
        return Err(UnwrapError::Resolution {
            name: name.to_string(),
            reason: "object name is empty".into(),
        });
    }
    match store.lookup_object_id(name) {
        Ok(Some(id)) => {
            debug!(name, object_id = id, "resolved object");
            Ok(ObjectId(id))
        }
        Ok(None) => Err(UnwrapError::Resolution {
            name: name.to_string(),
            reason: "object name invalid or not found".into(),
        }),
        Err(e) => Err(UnwrapError::Resolution {
            name: name.to_string(),
            reason: format!("{e:#}"),
        }),
    }
}

/// Read and validate the family GUID of the session's database.
pub fn fetch_family_id<S: CatalogStore + ?Sized>(store: &mut S) -> UnwrapResult<FamilyId> {
    let bytes = store
        .lookup_family_id()
        .map_err(|e| UnwrapError::CatalogRead(format!("reading family GUID: {e:#}")))?
        .ok_or_else(|| {
            UnwrapError::CatalogRead("no family GUID row for the current database".into())
        })?;
    FamilyId::from_slice(&bytes)
}

/// The single ciphertext row the store returns for `id`, unchanged.
pub fn fetch_payload<S: CatalogStore + ?Sized>(
    store: &mut S,
    id: ObjectId,
) -> UnwrapResult<EncryptedPayload> {
    let (ciphertext, subobjid) = store
        .lookup_encrypted_payload(id.0)
        .map_err(|e| UnwrapError::CatalogRead(format!("reading object {id} body: {e:#}")))?
        .ok_or_else(|| no_body(id))?;
    Ok(EncryptedPayload::new(ciphertext, subobjid))
}

/// Every ciphertext row for `id`, sorted by discriminator.
pub fn fetch_payloads<S: CatalogStore + ?Sized>(
    store: &mut S,
    id: ObjectId,
) -> UnwrapResult<Vec<EncryptedPayload>> {
    let rows = store
        .lookup_encrypted_payloads(id.0)
        .map_err(|e| UnwrapError::CatalogRead(format!("reading object {id} body: {e:#}")))?;
    if rows.is_empty() {
        return Err(no_body(id));
    }
    let mut payloads: Vec<_> = rows
        .into_iter()
        .map(|(ciphertext, subobjid)| EncryptedPayload::new(ciphertext, subobjid))
        .collect();
    payloads.sort_by_key(|p| p.subobjid);
    Ok(payloads)
}

fn no_body(id: ObjectId) -> UnwrapError {
    UnwrapError::CatalogRead(format!(
        "no encrypted body for object {id} (not encrypted, or not visible on this connection)"
    ))
}

/// Derive the fragment key, decrypt, and decode one payload.
pub fn decrypt_payload(
    family: &FamilyId,
    id: ObjectId,
    payload: &EncryptedPayload,
    mode: DecodeMode,
) -> UnwrapResult<String> {
    let key = derive_key(family, id, payload.subobjid);
    let plain = decrypt(key, &payload.ciphertext);
    debug!(
        object_id = %id,
        subobjid = %payload.subobjid,
        bytes = plain.len(),
        "decrypted fragment"
    );
    Ok(decode_utf16(&plain, mode)?)
}

/// Full pipeline for one object name.
///
/// Resolution runs first, so an unknown name fails before any other catalog
/// read or key derivation.
pub fn recover_object<S: CatalogStore + ?Sized>(
    store: &mut S,
    name: &str,
    opts: RecoverOptions,
) -> UnwrapResult<RecoveredObject> {
    let id = resolve(store, name)?;
    let family = fetch_family_id(store)?;
    recover_resolved(store, &family, name, id, opts)
}

/// Pipeline for one object with a family GUID fetched earlier.
pub fn recover_with_family<S: CatalogStore + ?Sized>(
    store: &mut S,
    family: &FamilyId,
    name: &str,
    opts: RecoverOptions,
) -> UnwrapResult<RecoveredObject> {
    let id = resolve(store, name)?;
    recover_resolved(store, family, name, id, opts)
}

/// Fetch, decrypt and decode an object whose id is already resolved.
pub fn recover_resolved<S: CatalogStore + ?Sized>(
    store: &mut S,
    family: &FamilyId,
    name: &str,
    id: ObjectId,
    opts: RecoverOptions,
) -> UnwrapResult<RecoveredObject> {
    let payloads = if opts.all_fragments {
        fetch_payloads(store, id)?
    } else {
        vec![fetch_payload(store, id)?]
    };

    let mut text = String::new();
    let mut fragments = Vec::with_capacity(payloads.len());
    for payload in &payloads {
        text.push_str(&decrypt_payload(family, id, payload, opts.decode_mode)?);
        fragments.push(payload.subobjid);
    }

    Ok(RecoveredObject {
        name: name.to_string(),
        object_id: id,
        fragments,
        text,
    })
}
