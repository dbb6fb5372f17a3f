//! sqlunwrap-catalog: the three catalog lookups the decryptor needs
//!
//!   - `OBJECT_ID(name)`                                      → object id
//!   - `sys.database_recovery_status.family_guid`             → 16-byte family id
//!   - `sys.sysobjvalues (imageval, subobjid) WHERE objid=@id` → ciphertext rows
//!
//! Any source that answers them implements [`CatalogStore`]. This crate ships
//! an in-memory catalog and a TOML snapshot format that loads into it.

pub mod memory;
pub mod names;
pub mod snapshot;
pub mod store;

pub use memory::{MemoryCatalog, MemoryCatalogBuilder};
pub use snapshot::{decode_bytes, load_snapshot, parse_family_guid, parse_snapshot, CatalogSnapshot};
pub use store::{CatalogStore, PayloadRow, SessionSource};
