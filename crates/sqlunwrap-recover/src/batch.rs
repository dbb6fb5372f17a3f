//! Recovering several objects from one database
//!
//! Every object gets its own catalog session, which is what makes the
//! parallel mode safe, and one object's failure never stops the rest. The
//! family GUID is read once, on the session of the first object that
//! resolves, and shared read-only after that.

use std::sync::OnceLock;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use sqlunwrap_catalog::{CatalogStore, SessionSource};
use sqlunwrap_core::{FamilyId, ObjectId, SubObjectId, UnwrapError, UnwrapResult};

use crate::pipeline::{fetch_family_id, recover_resolved, resolve, RecoverOptions, RecoveredObject};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Parallelism {
    /// One object at a time, in input order
    #[default]
    Sequential,
    /// Rayon pool; one session per object
    Parallel,
}

#[derive(Debug)]
pub struct ObjectOutcome {
    pub name: String,
    pub result: UnwrapResult<RecoveredObject>,
}

/// Outcomes in the same order as the requested names.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<ObjectOutcome>,
}

/// Serializable view of one outcome.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OutcomeSummary<'a> {
    Recovered {
        name: &'a str,
        object_id: ObjectId,
        fragments: &'a [SubObjectId],
        text: &'a str,
    },
    Failed {
        name: &'a str,
        kind: &'static str,
        error: String,
    },
}

impl BatchReport {
    pub fn succeeded(&self) -> impl Iterator<Item = &RecoveredObject> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().ok())
    }

    pub fn failed(&self) -> impl Iterator<Item = (&str, &UnwrapError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.name.as_str(), e)))
    }

    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok())
    }

    pub fn summary(&self) -> Vec<OutcomeSummary<'_>> {
        self.outcomes
            .iter()
            .map(|o| match &o.result {
                Ok(obj) => OutcomeSummary::Recovered {
                    name: &o.name,
                    object_id: obj.object_id,
                    fragments: &obj.fragments,
                    text: &obj.text,
                },
                Err(e) => OutcomeSummary::Failed {
                    name: &o.name,
                    kind: e.kind(),
                    error: e.to_string(),
                },
            })
            .collect()
    }
}

/// Recover every named object.
pub fn recover_batch<S: SessionSource>(
    source: &S,
    names: &[String],
    opts: RecoverOptions,
    parallelism: Parallelism,
) -> BatchReport {
    info!(objects = names.len(), ?parallelism, "starting recovery");

    let family = FamilyCache::default();
    let run = |name: &String| {
        let result = recover_one(source, &family, name, opts);
        if let Err(e) = &result {
            warn!(object = %name, kind = e.kind(), error = %e, "recovery failed");
        }
        ObjectOutcome {
            name: name.clone(),
            result,
        }
    };

    let outcomes = match parallelism {
        Parallelism::Sequential => names.iter().map(run).collect(),
        Parallelism::Parallel => names.par_iter().map(run).collect(),
    };
    BatchReport { outcomes }
}

/// Family GUID read on the first resolved object and reused by the rest.
///
/// A failed read is cached too; `UnwrapError` is not `Clone`, so the message
/// is kept and every later object gets its own `CatalogRead` copy.
#[derive(Default)]
struct FamilyCache {
    cell: OnceLock<Result<FamilyId, String>>,
}

impl FamilyCache {
    fn get<C: CatalogStore + ?Sized>(&self, session: &mut C) -> UnwrapResult<FamilyId> {
        let cached = self.cell.get_or_init(|| match fetch_family_id(session) {
            Ok(family) => Ok(family),
            Err(e) => {
                warn!(error = %e, "family GUID unavailable; resolved objects cannot be decrypted");
                Err(match e {
                    UnwrapError::CatalogRead(msg) => msg,
                    other => other.to_string(),
                })
            }
        });
        cached.clone().map_err(UnwrapError::CatalogRead)
    }
}

/// Resolve first so an unknown name fails as `Resolution` whatever the
/// state of the family row.
fn recover_one<S: SessionSource>(
    source: &S,
    family: &FamilyCache,
    name: &str,
    opts: RecoverOptions,
) -> UnwrapResult<RecoveredObject> {
    let mut session = open(source)?;
    let id = resolve(&mut session, name)?;
    let family = family.get(&mut session)?;
    recover_resolved(&mut session, &family, name, id, opts)
}

fn open<S: SessionSource>(source: &S) -> UnwrapResult<S::Session> {
    source
        .open_session()
        .map_err(|e| UnwrapError::CatalogRead(format!("opening catalog session: {e:#}")))
}
