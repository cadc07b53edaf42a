//! Initial data and state trees handed to the host UI.
//!
//! The host renders worklists, per-item catalog info and galleries from
//! `data`, and keeps per-user selections in `state`. Field names follow the
//! host templates.

use std::collections::BTreeMap;

use serde::Serialize;

use super::{Attributes, CatalogIndex, CatalogRow, WorklistEntry};
use crate::constants;
use crate::model::UserId;

/// Rows per catalog page.
pub const DEFAULT_PER_PAGE: usize = 10;
/// Selectable catalog page sizes.
pub const PAGE_SIZES: [usize; 3] = [5, 10, 20];

/// Gallery item as the host gallery widget expects it.
pub type GalleryItem = [String; 1];

/// Read-only `data` tree.
#[derive(Debug, Clone, Serialize)]
pub struct HostData {
    /// Worklist per user
    #[serde(rename = "user2upc")]
    pub user2upc: BTreeMap<UserId, Vec<WorklistEntry>>,
    /// Catalog attributes per user and worklist index
    #[serde(rename = "user2upcIndex2Info")]
    pub user2upc_index2info: BTreeMap<UserId, BTreeMap<usize, Attributes>>,
    /// Gallery per user and worklist index
    #[serde(rename = "user2upcIndex2upcGallery")]
    pub user2upc_index2gallery: BTreeMap<UserId, BTreeMap<usize, Vec<GalleryItem>>>,
    /// Sample gallery for the preview widget
    #[serde(rename = "demoGallery")]
    pub demo_gallery: Vec<GalleryItem>,
    /// Searchable catalog
    #[serde(rename = "fullCatalog")]
    pub full_catalog: Vec<CatalogRow>,
    /// Gallery per UPC
    #[serde(rename = "upcGallery")]
    pub upc_gallery: BTreeMap<String, Vec<GalleryItem>>,
}

fn gallery_items(urls: &[String]) -> Vec<GalleryItem> {
    urls.iter().map(|url| [url.clone()]).collect()
}

impl HostData {
    /// Project an index into the host data tree.
    pub fn from_index(index: &CatalogIndex) -> Self {
        let mut user2upc_index2info = BTreeMap::new();
        let mut user2upc_index2gallery = BTreeMap::new();

        for (&user_id, worklist) in index.worklists() {
            let info: BTreeMap<usize, Attributes> = worklist
                .iter()
                .enumerate()
                .map(|(i, entry)| (i, index.attributes(&entry.upc).cloned().unwrap_or_default()))
                .collect();
            let gallery: BTreeMap<usize, Vec<GalleryItem>> = worklist
                .iter()
                .enumerate()
                .map(|(i, entry)| (i, gallery_items(index.gallery(&entry.upc))))
                .collect();
            user2upc_index2info.insert(user_id, info);
            user2upc_index2gallery.insert(user_id, gallery);
        }

        Self {
            user2upc: index.worklists().clone(),
            user2upc_index2info,
            user2upc_index2gallery,
            demo_gallery: vec![[constants::DEMO_GALLERY_URL.to_string()]],
            full_catalog: index.full_catalog().to_vec(),
            upc_gallery: index
                .galleries()
                .iter()
                .map(|(upc, urls)| (upc.to_string(), gallery_items(urls)))
                .collect(),
        }
    }
}

/// Mutable `state` tree at startup.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HostState {
    /// "No more products" dialog
    pub dialog_visible: bool,
    /// Selected worklist index per user
    #[serde(rename = "user2selectedUpc")]
    pub user2selected_upc: BTreeMap<UserId, usize>,
    /// Catalog search keywords
    pub selected_keywords: Vec<String>,
    /// Search in progress
    pub searching: bool,
    /// Catalog page size
    pub per_page: usize,
    /// Page size choices
    pub page_sizes: Vec<usize>,
    /// Selected catalog row per user
    #[serde(rename = "user2selectedRowData")]
    pub user2selected_row_data: BTreeMap<UserId, Option<CatalogRow>>,
}

impl HostState {
    /// Every user starts at worklist index 0 with the first catalog row selected.
    pub fn initial(index: &CatalogIndex) -> Self {
        let first_row = index.full_catalog().first().cloned();
        let users = index.worklists().keys().copied();

        Self {
            dialog_visible: false,
            user2selected_upc: users.clone().map(|user| (user, 0)).collect(),
            selected_keywords: Vec::new(),
            searching: false,
            per_page: DEFAULT_PER_PAGE,
            page_sizes: PAGE_SIZES.to_vec(),
            user2selected_row_data: users.map(|user| (user, first_row.clone())).collect(),
        }
    }
}
