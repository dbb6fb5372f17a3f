//! Catalog snapshot files (TOML)
//!
//! A snapshot records the answers to the three catalog lookups for one
//! database so decryption can be replayed without a live connection:
//!
//! ```toml
//! database = "master"
//! default_schema = "dbo"
//! family_guid = "01020304-0506-0708-090a-0b0c0d0e0f10"
//!
//! [[objects]]
//! name = "dbo.usp_secret"
//! id = 245575913
//!
//! [[objects.fragments]]
//! subobjid = 0
//! imageval = "0x8116..."
//! ```
//!
//! `family_guid` is either GUID text (converted to the `binary(16)` layout,
//! first three groups little-endian) or `0x` hex of the raw bytes.
//! `imageval` is `0x` hex or standard base64.

use anyhow::{Context, Result};
use base64::Engine;
use serde::Deserialize;
use std::path::Path;

use sqlunwrap_core::{UnwrapError, UnwrapResult};

use crate::memory::MemoryCatalog;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogSnapshot {
    #[serde(default = "default_database")]
    pub database: String,
    #[serde(default = "default_schema")]
    pub default_schema: String,
    /// Absent when the capture had no `sys.database_recovery_status` row
    pub family_guid: Option<String>,
    #[serde(default)]
    pub objects: Vec<SnapshotObject>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SnapshotObject {
    pub name: String,
    /// `sys.objects.object_id` as captured. Negative ids (signed `int`
    /// columns) are taken as their two's-complement `u32` value.
    pub id: i64,
    #[serde(default)]
    pub fragments: Vec<SnapshotFragment>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SnapshotFragment {
    #[serde(default)]
    pub subobjid: u16,
    pub imageval: String,
}

fn default_database() -> String {
    "master".into()
}

fn default_schema() -> String {
    "dbo".into()
}

impl CatalogSnapshot {
    /// Decode every byte field and build the in-memory catalog.
    pub fn into_catalog(self) -> Result<MemoryCatalog> {
        let mut builder = MemoryCatalog::builder()
            .database(self.database)
            .default_schema(self.default_schema);

        if let Some(guid) = &self.family_guid {
            builder = builder.family_id(parse_family_guid(guid).context("family_guid")?);
        }

        for object in self.objects {
            let id = object.object_id()?;
            builder = builder.object(object.name.clone(), id);
            for (i, fragment) in object.fragments.into_iter().enumerate() {
                let bytes = decode_bytes(&fragment.imageval).with_context(|| {
                    format!("object '{}' fragment {i}: imageval", object.name)
                })?;
                builder = builder.fragment(id, bytes, fragment.subobjid);
            }
        }

        builder.build()
    }
}

impl SnapshotObject {
    /// The id as the key-derivation input: `int` range wraps, anything
    /// outside `i32::MIN..=u32::MAX` is rejected.
    pub fn object_id(&self) -> Result<u32> {
        if self.id < i64::from(i32::MIN) || self.id > i64::from(u32::MAX) {
            anyhow::bail!("object '{}': id {} is out of range", self.name, self.id);
        }
        Ok(self.id as u32)
    }
}

/// Parse snapshot TOML into a catalog.
pub fn parse_snapshot(content: &str) -> UnwrapResult<MemoryCatalog> {
    let snapshot: CatalogSnapshot = toml::from_str(content)
        .map_err(|e| UnwrapError::Config(format!("invalid catalog snapshot: {e}")))?;
    snapshot
        .into_catalog()
        .map_err(|e| UnwrapError::Config(format!("invalid catalog snapshot: {e:#}")))
}

/// Read and parse a snapshot file.
pub fn load_snapshot(path: &Path) -> UnwrapResult<MemoryCatalog> {
    let content = std::fs::read_to_string(path)?;
    let catalog = parse_snapshot(&content).map_err(|e| match e {
        UnwrapError::Config(msg) => UnwrapError::Config(format!("{}: {msg}", path.display())),
        other => other,
    })?;
    tracing::info!(
        path = %path.display(),
        database = catalog.database(),
        objects = catalog.object_count(),
        "loaded catalog snapshot"
    );
    Ok(catalog)
}

/// Family GUID as text (`xxxxxxxx-xxxx-...`, braced or urn forms too) or
/// `0x` hex of the raw `binary(16)` value.
pub fn parse_family_guid(value: &str) -> Result<Vec<u8>> {
    let value = value.trim();
    if has_hex_prefix(value) {
        return decode_bytes(value);
    }
    let guid = uuid::Uuid::parse_str(value)
        .with_context(|| format!("not a GUID or 0x-hex value: '{value}'"))?;
    Ok(guid.to_bytes_le().to_vec())
}

/// `0x`-prefixed hex or standard base64.
pub fn decode_bytes(value: &str) -> Result<Vec<u8>> {
    let value = value.trim();
    if has_hex_prefix(value) {
        hex::decode(&value[2..]).context("invalid hex")
    } else {
        base64::engine::general_purpose::STANDARD
            .decode(value)
            .context("invalid base64")
    }
}

fn has_hex_prefix(value: &str) -> bool {
    value.starts_with("0x") || value.starts_with("0X")
}
