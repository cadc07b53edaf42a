//! Reference catalog and per-user worklists.
//!
//! Built once at startup from four inputs stored in the team's files:
//!
//! - UPC -> reference image URLs
//! - batch id -> UPC codes
//! - user login -> batch ids
//! - the product catalog table
//!
//! ## Usage
//!
//! ```rust,ignore
//! use upcat::catalog;
//!
//! let index = catalog::prepare(files.as_ref(), members.as_ref(), &config)?;
//! let worklist = index.worklist(user_id);
//! ```

mod indexer;
mod inputs;
mod sheet;
mod ui_data;
mod workbook;

use std::path::PathBuf;

use thiserror::Error;

use crate::config::AppConfig;
use crate::services::{FileService, MembershipService, ServiceError};

pub use indexer::{Attributes, Catalog, CatalogIndex, CatalogIndexer, CatalogRow, WorklistEntry};
pub use inputs::{BatchId, CatalogInputs, download_remote_files};
pub use sheet::CatalogSheet;
pub use ui_data::{HostData, HostState};

/// Errors raised while loading the reference inputs. All of them abort startup.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Service failure while downloading or resolving users
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// I/O error on a local input file
    #[error("IO error on {path:?}: {source}")]
    Io {
        /// File being read or created
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// Malformed JSON input
    #[error("JSON error in {file}: {source}")]
    Json {
        /// Input file name
        file: String,
        /// Underlying error
        source: serde_json::Error,
    },

    /// Malformed CSV catalog
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// xlsx catalog that is not a readable archive
    #[error("Workbook archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Malformed XML inside an xlsx catalog
    #[error("Workbook XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// xlsx parts that do not fit together
    #[error("Malformed workbook: {reason}")]
    MalformedWorkbook {
        /// What is wrong
        reason: String,
    },

    /// Required input missing from team files
    #[error("File {path:?} does not exist")]
    MissingRemoteFile {
        /// Remote path checked
        path: String,
    },

    /// Login listed in the assignments is not a member of the team
    #[error("User {login:?} not found in team {team:?}")]
    UserNotFound {
        /// Login from the assignment file
        login: String,
        /// Team display name
        team: String,
    },

    /// Assignment references a batch that does not exist
    #[error("Batch {batch:?} assigned to {login:?} does not exist")]
    UnknownBatch {
        /// Missing batch id
        batch: BatchId,
        /// Login the batch is assigned to
        login: String,
    },

    /// Batch member without reference URLs
    #[error("UPC {upc} in batch {batch:?} has no reference URLs")]
    MissingUrls {
        /// UPC code
        upc: String,
        /// Batch containing it
        batch: BatchId,
    },

    /// Value that cannot be a UPC code or batch id
    #[error("Invalid {what} in {file}: {value}")]
    InvalidKey {
        /// "UPC code" or "batch id"
        what: &'static str,
        /// Input file name
        file: String,
        /// Offending value
        value: String,
    },

    /// Catalog table without the UPC column
    #[error("Catalog has no {column:?} column")]
    MissingColumn {
        /// Expected column name
        column: String,
    },

    /// Catalog file with an unsupported extension
    #[error("Unsupported catalog format: {path:?}")]
    UnsupportedFormat {
        /// Catalog file path
        path: PathBuf,
    },
}

/// Download the inputs, load them and build the index.
pub fn prepare(
    files: &dyn FileService,
    members: &dyn MembershipService,
    config: &AppConfig,
) -> Result<CatalogIndex, CatalogError> {
    let local_dir = config.inputs.local_dir();
    download_remote_files(files, config.team_id, &config.inputs, &local_dir)?;
    let inputs = CatalogInputs::load(&local_dir, &config.inputs)?;
    CatalogIndexer::new(members, config.team_id)
        .with_full_marker(&config.tagging.full_marker)
        .with_upc_column(&config.tagging.catalog_upc_column)
        .build(&inputs)
}
