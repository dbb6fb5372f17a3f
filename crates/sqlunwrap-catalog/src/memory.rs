//! In-memory catalog
//!
//! Immutable tables behind an `Arc`. Each clone is an independent session,
//! so a `MemoryCatalog` is also its own [`SessionSource`].

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::sync::Arc;

use crate::names;
use crate::store::{CatalogStore, PayloadRow, SessionSource};

#[derive(Debug)]
struct Tables {
    database: String,
    default_schema: String,
    family_id: Option<Vec<u8>>,
    /// `schema.object` (lowercase) → object id
    objects: HashMap<String, u32>,
    /// object id → rows in storage order
    rows: HashMap<u32, Vec<PayloadRow>>,
}

/// Catalog held entirely in memory.
#[derive(Debug, Clone)]
pub struct MemoryCatalog {
    tables: Arc<Tables>,
}

impl MemoryCatalog {
    pub fn builder() -> MemoryCatalogBuilder {
        MemoryCatalogBuilder::default()
    }

    pub fn database(&self) -> &str {
        &self.tables.database
    }

    pub fn object_count(&self) -> usize {
        self.tables.objects.len()
    }
}

impl CatalogStore for MemoryCatalog {
    fn lookup_object_id(&mut self, name: &str) -> Result<Option<u32>> {
        let Some(parsed) = names::parse(name) else {
            return Ok(None);
        };
        if let Some(db) = &parsed.database {
            if !db.eq_ignore_ascii_case(&self.tables.database) {
                return Ok(None);
            }
        }
        let key = parsed.key(&self.tables.default_schema);
        Ok(self.tables.objects.get(&key).copied())
    }

    fn lookup_family_id(&mut self) -> Result<Option<Vec<u8>>> {
        Ok(self.tables.family_id.clone())
    }

    fn lookup_encrypted_payload(&mut self, id: u32) -> Result<Option<PayloadRow>> {
        Ok(self
            .tables
            .rows
            .get(&id)
            .and_then(|rows| rows.first())
            .cloned())
    }

    fn lookup_encrypted_payloads(&mut self, id: u32) -> Result<Vec<PayloadRow>> {
        Ok(self.tables.rows.get(&id).cloned().unwrap_or_default())
    }
}

impl SessionSource for MemoryCatalog {
    type Session = MemoryCatalog;

    fn open_session(&self) -> Result<Self::Session> {
        Ok(self.clone())
    }
}

/// Builder for [`MemoryCatalog`].
#[derive(Debug, Default)]
pub struct MemoryCatalogBuilder {
    database: Option<String>,
    default_schema: Option<String>,
    family_id: Option<Vec<u8>>,
    objects: Vec<(String, u32)>,
    rows: Vec<(u32, PayloadRow)>,
}

impl MemoryCatalogBuilder {
    pub fn database(mut self, name: impl Into<String>) -> Self {
        self.database = Some(name.into());
        self
    }

    pub fn default_schema(mut self, schema: impl Into<String>) -> Self {
        self.default_schema = Some(schema.into());
        self
    }

    /// Raw family GUID bytes. Any length is accepted here.
    pub fn family_id(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.family_id = Some(bytes.into());
        self
    }

    pub fn object(mut self, name: impl Into<String>, id: u32) -> Self {
        self.objects.push((name.into(), id));
        self
    }

    /// Add one ciphertext row. Rows for the same id keep insertion order.
    pub fn fragment(mut self, id: u32, ciphertext: impl Into<Vec<u8>>, subobjid: u16) -> Self {
        self.rows.push((id, (ciphertext.into(), subobjid)));
        self
    }

    pub fn build(self) -> Result<MemoryCatalog> {
        let default_schema = self.default_schema.unwrap_or_else(|| "dbo".into());

        let mut objects = HashMap::with_capacity(self.objects.len());
        for (name, id) in self.objects {
            let parsed = names::parse(&name)
                .with_context(|| format!("invalid object name '{name}'"))?;
            let key = parsed.key(&default_schema);
            if let Some(prev) = objects.insert(key, id) {
                anyhow::bail!("duplicate object name '{name}' (ids {prev} and {id})");
            }
        }

        let mut rows: HashMap<u32, Vec<PayloadRow>> = HashMap::new();
        for (id, row) in self.rows {
            rows.entry(id).or_default().push(row);
        }

        tracing::debug!(
            objects = objects.len(),
            fragments = rows.values().map(Vec::len).sum::<usize>(),
            "built in-memory catalog"
        );

        Ok(MemoryCatalog {
            tables: Arc::new(Tables {
                database: self.database.unwrap_or_else(|| "master".into()),
                default_schema,
                family_id: self.family_id,
                objects,
                rows,
            }),
        })
    }
}
