//! Worklist, catalog and gallery index.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use serde_json::{Map, Value};

use super::{CatalogError, CatalogInputs, CatalogSheet};
use crate::constants;
use crate::model::{TeamId, Upc, UserId};
use crate::services::MembershipService;

/// Catalog attributes of one product (column name -> cell value).
pub type Attributes = Map<String, Value>;

/// One item to review: a UPC and its thumbnail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorklistEntry {
    /// Product code
    pub upc: Upc,
    /// First reference image that is not a full-size shot
    pub image_url: String,
}

/// A full-catalog row: the sheet row plus an HTML thumbnail.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogRow {
    /// Sheet columns
    #[serde(flatten)]
    pub attributes: Attributes,
    /// `<img>` tag for the first gallery URL, empty when there is none
    pub image: String,
}

/// UPC -> attributes in sheet order.
///
/// Products whose code matches several sheet rows keep an empty entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    entries: Vec<(Upc, Attributes)>,
    positions: HashMap<Upc, usize>,
}

impl Catalog {
    fn push(&mut self, upc: Upc, attributes: Attributes) {
        if self.positions.contains_key(&upc) {
            return;
        }
        self.positions.insert(upc.clone(), self.entries.len());
        self.entries.push((upc, attributes));
    }

    /// Attributes of a product.
    pub fn get(&self, upc: &Upc) -> Option<&Attributes> {
        self.positions.get(upc).map(|&i| &self.entries[i].1)
    }

    /// Entries in sheet order.
    pub fn iter(&self) -> impl Iterator<Item = (&Upc, &Attributes)> {
        self.entries.iter().map(|(upc, attributes)| (upc, attributes))
    }

    /// Number of distinct products.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the catalog has no products.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Read-only lookups built once at startup.
#[derive(Debug, Clone, Default)]
pub struct CatalogIndex {
    worklists: BTreeMap<UserId, Vec<WorklistEntry>>,
    catalog: Catalog,
    gallery: BTreeMap<Upc, Vec<String>>,
    full_catalog: Vec<CatalogRow>,
}

impl CatalogIndex {
    /// Worklists of every known user.
    pub fn worklists(&self) -> &BTreeMap<UserId, Vec<WorklistEntry>> {
        &self.worklists
    }

    /// Worklist of one user; empty for unknown users.
    pub fn worklist(&self, user_id: UserId) -> &[WorklistEntry] {
        self.worklists
            .get(&user_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Entry at a worklist position.
    pub fn worklist_entry(&self, user_id: UserId, index: usize) -> Option<&WorklistEntry> {
        self.worklist(user_id).get(index)
    }

    /// First position of a UPC in a user's worklist.
    pub fn position_in_worklist(&self, user_id: UserId, upc: &Upc) -> Option<usize> {
        self.worklist(user_id)
            .iter()
            .position(|entry| &entry.upc == upc)
    }

    /// Catalog attributes of a product.
    pub fn attributes(&self, upc: &Upc) -> Option<&Attributes> {
        self.catalog.get(upc)
    }

    /// The UPC -> attributes catalog.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Reference URLs of a product; empty when unknown.
    pub fn gallery(&self, upc: &Upc) -> &[String] {
        self.gallery.get(upc).map(Vec::as_slice).unwrap_or_default()
    }

    /// All gallery lists.
    pub fn galleries(&self) -> &BTreeMap<Upc, Vec<String>> {
        &self.gallery
    }

    /// Searchable catalog rows in sheet order.
    pub fn full_catalog(&self) -> &[CatalogRow] {
        &self.full_catalog
    }
}

/// Builds a [`CatalogIndex`] from loaded inputs.
pub struct CatalogIndexer<'a> {
    members: &'a dyn MembershipService,
    team_id: TeamId,
    full_marker: String,
    upc_column: String,
}

impl<'a> CatalogIndexer<'a> {
    /// Create an indexer resolving logins in `team_id`.
    pub fn new(members: &'a dyn MembershipService, team_id: TeamId) -> Self {
        Self {
            members,
            team_id,
            full_marker: constants::FULL_SIZE_MARKER.to_string(),
            upc_column: constants::CATALOG_UPC_COLUMN.to_string(),
        }
    }

    /// Substring marking full-size reference images.
    pub fn with_full_marker(mut self, marker: &str) -> Self {
        self.full_marker = marker.to_string();
        self
    }

    /// Catalog column holding product codes.
    pub fn with_upc_column(mut self, column: &str) -> Self {
        self.upc_column = column.to_string();
        self
    }

    /// Build worklists, catalog and gallery.
    pub fn build(&self, inputs: &CatalogInputs) -> Result<CatalogIndex, CatalogError> {
        let mut worklists = self.seed_members()?;
        let mut gallery = BTreeMap::new();
        self.build_worklists(inputs, &mut worklists, &mut gallery)?;

        let catalog = self.load_catalog(&inputs.sheet)?;
        let full_catalog = project_full_catalog(&catalog, &mut gallery);

        log::info!(
            "Indexed {} worklists, {} catalog products, {} gallery entries",
            worklists.len(),
            catalog.len(),
            gallery.len()
        );

        Ok(CatalogIndex {
            worklists,
            catalog,
            gallery,
            full_catalog,
        })
    }

    /// Empty worklist for every team member.
    fn seed_members(&self) -> Result<BTreeMap<UserId, Vec<WorklistEntry>>, CatalogError> {
        let members = self.members.list_team_members(self.team_id)?;
        log::debug!("Team {} has {} members", self.team_id, members.len());
        Ok(members
            .into_iter()
            .map(|member| (member.id, Vec::new()))
            .collect())
    }

    fn resolve_user(&self, login: &str) -> Result<UserId, CatalogError> {
        match self.members.resolve_user(self.team_id, login)? {
            Some(id) => Ok(id),
            None => Err(CatalogError::UserNotFound {
                login: login.to_string(),
                team: self.members.team_name(self.team_id)?,
            }),
        }
    }

    fn build_worklists(
        &self,
        inputs: &CatalogInputs,
        worklists: &mut BTreeMap<UserId, Vec<WorklistEntry>>,
        gallery: &mut BTreeMap<Upc, Vec<String>>,
    ) -> Result<(), CatalogError> {
        for (login, batches) in &inputs.user_batches {
            let user_id = self.resolve_user(login)?;
            let worklist = worklists.entry(user_id).or_default();

            for batch in batches {
                let upcs = inputs
                    .upc_batches
                    .get(batch)
                    .ok_or_else(|| CatalogError::UnknownBatch {
                        batch: batch.clone(),
                        login: login.clone(),
                    })?;

                for upc in upcs {
                    let urls = inputs
                        .upc_urls
                        .get(upc)
                        .ok_or_else(|| CatalogError::MissingUrls {
                            upc: upc.to_string(),
                            batch: batch.clone(),
                        })?;

                    gallery.entry(upc.clone()).or_default().extend_from_slice(urls);

                    match urls.iter().find(|url| !url.contains(&self.full_marker)) {
                        Some(url) => worklist.push(WorklistEntry {
                            upc: upc.clone(),
                            image_url: url.clone(),
                        }),
                        None => log::warn!("UPC {} has only full-size references", upc),
                    }
                }
            }

            log::debug!("User {} ({}) has {} worklist entries", login, user_id, worklist.len());
        }
        Ok(())
    }

    /// Group sheet rows by UPC. A product maps to its row only when exactly
    /// one row carries its code.
    fn load_catalog(&self, sheet: &CatalogSheet) -> Result<Catalog, CatalogError> {
        if !sheet.has_column(&self.upc_column) {
            return Err(CatalogError::MissingColumn {
                column: self.upc_column.clone(),
            });
        }

        let mut order: Vec<Upc> = Vec::new();
        let mut rows: HashMap<Upc, Vec<&Attributes>> = HashMap::new();
        for row in &sheet.rows {
            let Some(upc) = row.get(&self.upc_column).and_then(Upc::from_value) else {
                continue;
            };
            let matches = rows.entry(upc.clone()).or_default();
            if matches.is_empty() {
                order.push(upc);
            }
            matches.push(row);
        }

        let mut catalog = Catalog::default();
        for upc in order {
            let attributes = match rows.get(&upc).map(Vec::as_slice) {
                Some([row]) => (*row).clone(),
                _ => {
                    log::debug!("UPC {} is ambiguous in the catalog", upc);
                    Attributes::new()
                }
            };
            catalog.push(upc, attributes);
        }
        Ok(catalog)
    }
}

/// Attach thumbnails and make sure every catalog product has a gallery list.
fn project_full_catalog(
    catalog: &Catalog,
    gallery: &mut BTreeMap<Upc, Vec<String>>,
) -> Vec<CatalogRow> {
    catalog
        .iter()
        .map(|(upc, attributes)| {
            let urls = gallery.entry(upc.clone()).or_default();
            let image = urls.first().map(|url| thumbnail(url)).unwrap_or_default();
            CatalogRow {
                attributes: attributes.clone(),
                image,
            }
        })
        .collect()
}

fn thumbnail(url: &str) -> String {
    let mut src = String::with_capacity(url.len());
    for c in url.chars() {
        match c {
            '&' => src.push_str("&amp;"),
            '"' => src.push_str("&quot;"),
            '<' => src.push_str("&lt;"),
            '>' => src.push_str("&gt;"),
            c => src.push(c),
        }
    }
    format!(r#"<img style="height:80px; width:auto;" src="{src}"/>"#)
}
