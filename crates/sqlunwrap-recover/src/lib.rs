//! sqlunwrap-recover: end-to-end recovery of encrypted module text
//!
//! Single linear pass per object:
//!   resolve name → fetch family GUID → fetch ciphertext row(s)
//!   → derive key → RC4 → UTF-16 decode
//!
//! The catalog lookups are the only I/O. Nothing is retried: a missing row
//! is permanent and every other stage is deterministic.

pub mod batch;
pub mod pipeline;

pub use batch::{recover_batch, BatchReport, ObjectOutcome, OutcomeSummary, Parallelism};
pub use pipeline::{
    decrypt_payload, fetch_family_id, fetch_payload, fetch_payloads, recover_object,
    recover_resolved, recover_with_family, resolve, RecoverOptions, RecoveredObject,
};
