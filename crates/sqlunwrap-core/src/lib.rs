pub mod config;
pub mod error;
pub mod types;

pub use error::{DecodeFailure, UnwrapError, UnwrapResult};
pub use types::{EncryptedPayload, FamilyId, ObjectId, SubObjectId};
