//! Default names and markers of the UPC tagging workflow

/// Remote team directory holding the reference inputs
pub const REMOTE_DIRECTORY: &str = "/upc_references";

/// UPC code -> list of reference image URLs
pub const FILE_UPC_URLS: &str = "upc_ref_url.json";

/// Batch id -> list of UPC codes
pub const FILE_UPC_BATCHES: &str = "res_upc_batches.json";

/// User login -> list of batch ids
pub const FILE_USER_BATCHES: &str = "res_user_upc_batches.json";

/// Product catalog table
pub const FILE_CATALOG: &str = "product_catalog.xlsx";

/// Tag holding the assigned UPC code
pub const UPC_TAG_NAME: &str = "UPC CODE";

/// Marker tag flagging a label as erroneous
pub const ERROR_TAG_NAME: &str = "error";

/// Catalog column holding the UPC code
pub const CATALOG_UPC_COLUMN: &str = "UPC CODE";

/// Object class the navigator walks through
pub const PRODUCT_CLASS_NAME: &str = "Product";

/// URLs containing this marker are full-size images, never thumbnails
pub const FULL_SIZE_MARKER: &str = "_full";

/// Sample image shown by the host's gallery preview
pub const DEMO_GALLERY_URL: &str = "https://i.imgur.com/llPpFm0.jpeg";

/// Zoom factor applied when focusing a label
pub const DEFAULT_ZOOM_SCALE: f64 = 2.0;
