//! Reference input files.
//!
//! Four files live in a team directory (`/upc_references` by default):
//!
//! | File | Shape |
//! |------|-------|
//! | `upc_ref_url.json` | `{ upc: [url, ...] }` |
//! | `res_upc_batches.json` | `{ batch_id: [upc, ...] }` |
//! | `res_user_upc_batches.json` | `{ login: [batch_id, ...] }` |
//! | catalog | table with a `UPC CODE` column |
//!
//! They are downloaded once; UPC codes keep their text and are joined by key.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde_json::{Map, Value};

use super::{CatalogError, CatalogSheet};
use crate::config::InputConfig;
use crate::model::{TeamId, Upc};
use crate::services::FileService;

/// Batch identifier. Batch ids are JSON object keys in one file and list
/// values (often numbers) in another, so both are reduced to text.
pub type BatchId = String;

/// Download every input file into `local_dir`, creating it if needed.
///
/// Fails before any download if a file is missing remotely.
pub fn download_remote_files(
    files: &dyn FileService,
    team_id: TeamId,
    inputs: &InputConfig,
    local_dir: &Path,
) -> Result<(), CatalogError> {
    std::fs::create_dir_all(local_dir).map_err(|source| CatalogError::Io {
        path: local_dir.to_path_buf(),
        source,
    })?;

    let names = inputs.file_names();
    for name in names {
        let remote_path = inputs.remote_path(name);
        if !files.exists(team_id, &remote_path)? {
            return Err(CatalogError::MissingRemoteFile { path: remote_path });
        }
    }

    for name in names {
        let remote_path = inputs.remote_path(name);
        let local_path = local_dir.join(name);
        files.download(team_id, &remote_path, &local_path)?;
        log::debug!("Downloaded {} to {:?}", remote_path, local_path);
    }

    log::info!("Downloaded {} reference files to {:?}", names.len(), local_dir);
    Ok(())
}

/// Parsed reference inputs with canonical keys.
#[derive(Debug, Clone, Default)]
pub struct CatalogInputs {
    /// UPC -> reference image URLs, in file order
    pub upc_urls: HashMap<Upc, Vec<String>>,
    /// Batch -> UPCs, in batch order
    pub upc_batches: HashMap<BatchId, Vec<Upc>>,
    /// Login -> assigned batches, logins in file order
    pub user_batches: Vec<(String, Vec<BatchId>)>,
    /// Product catalog table
    pub sheet: CatalogSheet,
}

impl CatalogInputs {
    /// Load the four files from a local directory.
    pub fn load(local_dir: &Path, inputs: &InputConfig) -> Result<Self, CatalogError> {
        let upc_urls = read_json(local_dir, &inputs.upc_urls)?;
        let upc_batches = read_json(local_dir, &inputs.upc_batches)?;
        let user_batches = read_json(local_dir, &inputs.user_batches)?;
        let sheet = CatalogSheet::load(&local_dir.join(&inputs.catalog))?;

        let loaded = Self::from_json_values(upc_urls, upc_batches, user_batches, sheet)?;
        log::info!(
            "Loaded {} UPC url lists, {} batches, {} user assignments, {} catalog rows",
            loaded.upc_urls.len(),
            loaded.upc_batches.len(),
            loaded.user_batches.len(),
            loaded.sheet.len()
        );
        Ok(loaded)
    }

    /// Build from already parsed JSON documents.
    pub fn from_json_values(
        upc_urls: Value,
        upc_batches: Value,
        user_batches: Value,
        sheet: CatalogSheet,
    ) -> Result<Self, CatalogError> {
        Ok(Self {
            upc_urls: parse_upc_urls(upc_urls)?,
            upc_batches: parse_upc_batches(upc_batches)?,
            user_batches: parse_user_batches(user_batches)?,
            sheet,
        })
    }
}

fn read_json(dir: &Path, name: &str) -> Result<Value, CatalogError> {
    let path = dir.join(name);
    let text = std::fs::read_to_string(&path).map_err(|source| CatalogError::Io {
        path: path.clone(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| CatalogError::Json {
        file: name.to_string(),
        source,
    })
}

fn decode<T: serde::de::DeserializeOwned>(value: Value, file: &str) -> Result<T, CatalogError> {
    serde_json::from_value(value).map_err(|source| CatalogError::Json {
        file: file.to_string(),
        source,
    })
}

fn parse_upc_urls(value: Value) -> Result<HashMap<Upc, Vec<String>>, CatalogError> {
    let raw: BTreeMap<String, Vec<String>> = decode(value, "UPC url map")?;
    let mut urls: HashMap<Upc, Vec<String>> = HashMap::with_capacity(raw.len());
    for (key, list) in raw {
        let upc = Upc::parse(&key).ok_or_else(|| CatalogError::InvalidKey {
            what: "UPC code",
            file: "UPC url map".to_string(),
            value: key.clone(),
        })?;
        // "0123" and "123" are the same product.
        urls.entry(upc).or_default().extend(list);
    }
    Ok(urls)
}

fn parse_upc_batches(value: Value) -> Result<HashMap<BatchId, Vec<Upc>>, CatalogError> {
    let raw: BTreeMap<String, Vec<Upc>> = decode(value, "batch map")?;
    Ok(raw
        .into_iter()
        .map(|(batch, upcs)| (batch.trim().to_string(), upcs))
        .collect())
}

fn parse_user_batches(value: Value) -> Result<Vec<(String, Vec<BatchId>)>, CatalogError> {
    let raw: Map<String, Value> = decode(value, "user batch map")?;
    raw.into_iter()
        .map(|(login, batches)| -> Result<(String, Vec<BatchId>), CatalogError> {
            let batches: Vec<Value> = decode(batches, "user batch map")?;
            let ids = batches
                .iter()
                .map(|batch| {
                    batch_id(batch).ok_or_else(|| CatalogError::InvalidKey {
                        what: "batch id",
                        file: "user batch map".to_string(),
                        value: batch.to_string(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok((login, ids))
        })
        .collect()
}

/// Text form of a batch id: `3` and `"3"` name the same batch.
fn batch_id(value: &Value) -> Option<BatchId> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
