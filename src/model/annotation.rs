//! Annotation data model: the labels of one image with their geometry.
//!
//! Annotations arrive from the annotation service as JSON documents. Only the
//! parts the tagging workflow reads are modelled: label id, object class and
//! the geometry needed to derive a bounding box (point lists for vector
//! shapes, origin and mask for bitmaps).

use std::io::{Cursor, Read};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use flate2::read::ZlibDecoder;
use image::{ImageFormat, ImageReader};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{ImageId, LabelId};

// ============================================================================
// Geometry
// ============================================================================

/// An axis-aligned bounding box in image pixel coordinates.
///
/// Edges are inclusive: two boxes sharing only an edge or a corner overlap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left edge X coordinate
    pub left: f64,
    /// Top edge Y coordinate
    pub top: f64,
    /// Right edge X coordinate
    pub right: f64,
    /// Bottom edge Y coordinate
    pub bottom: f64,
}

impl BoundingBox {
    /// Create a normalized bounding box from two corner points.
    pub fn from_corners(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            left: x1.min(x2),
            top: y1.min(y2),
            right: x1.max(x2),
            bottom: y1.max(y2),
        }
    }

    /// Smallest box enclosing all points. Returns None for an empty slice.
    pub fn enclosing(points: &[[f64; 2]]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let start = Self::from_corners(first[0], first[1], first[0], first[1]);
        Some(rest.iter().fold(start, |bbox, [x, y]| Self {
            left: bbox.left.min(*x),
            top: bbox.top.min(*y),
            right: bbox.right.max(*x),
            bottom: bbox.bottom.max(*y),
        }))
    }

    /// Width of the box.
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    /// Height of the box.
    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    /// Check whether two boxes overlap (touching edges count).
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        !(self.left > other.right
            || self.right < other.left
            || self.top > other.bottom
            || self.bottom < other.top)
    }
}

/// Point lists of a label geometry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Points {
    /// Outer contour (two corners for rectangles, vertices for polygons).
    #[serde(default)]
    pub exterior: Vec<[f64; 2]>,
    /// Holes, irrelevant for the bounding box.
    #[serde(default)]
    pub interior: Vec<Vec<[f64; 2]>>,
}

/// Errors decoding a bitmap mask.
#[derive(Error, Debug)]
pub enum BitmapError {
    /// Mask data is not base64
    #[error("Invalid base64 mask data: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Mask data is not zlib compressed
    #[error("Cannot inflate mask data: {0}")]
    Inflate(#[source] std::io::Error),

    /// Inflated mask is not a PNG image
    #[error("Cannot read mask image: {0}")]
    Image(#[from] image::ImageError),
}

/// Raster geometry: a PNG mask placed at `origin`.
///
/// `data` is the base64 text of the zlib-compressed PNG bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bitmap {
    /// Top-left pixel `[x, y]` of the mask
    pub origin: [f64; 2],
    /// Encoded mask
    pub data: String,
}

impl Bitmap {
    /// Mask `(width, height)` in pixels, read from the PNG header.
    pub fn size(&self) -> Result<(u32, u32), BitmapError> {
        let compressed = STANDARD.decode(self.data.trim())?;
        let mut png = Vec::new();
        ZlibDecoder::new(compressed.as_slice())
            .read_to_end(&mut png)
            .map_err(BitmapError::Inflate)?;
        Ok(ImageReader::with_format(Cursor::new(png), ImageFormat::Png).into_dimensions()?)
    }

    /// Pixels covered by the mask, edges inclusive like rectangle corners.
    pub fn bounding_box(&self) -> Result<BoundingBox, BitmapError> {
        let (width, height) = self.size()?;
        let [x, y] = self.origin;
        Ok(BoundingBox::from_corners(
            x,
            y,
            x + f64::from(width.saturating_sub(1)),
            y + f64::from(height.saturating_sub(1)),
        ))
    }
}

// ============================================================================
// Labels
// ============================================================================

/// One annotated region of an image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Label {
    /// Stable label (figure) identifier.
    pub id: LabelId,
    /// Object class name, e.g. "Product".
    pub class_title: String,
    /// Geometry kind as reported by the annotation tool ("rectangle", "polygon", ...).
    #[serde(default)]
    pub geometry_type: String,
    /// Geometry points. Absent for raster geometries.
    #[serde(default)]
    pub points: Option<Points>,
    /// Raster mask, for bitmap geometries.
    #[serde(default)]
    pub bitmap: Option<Bitmap>,
}

impl Label {
    /// Create a rectangle label; used when building annotations in code.
    pub fn rectangle(id: LabelId, class_title: &str, bbox: BoundingBox) -> Self {
        Self {
            id,
            class_title: class_title.to_string(),
            geometry_type: "rectangle".to_string(),
            points: Some(Points {
                exterior: vec![[bbox.left, bbox.top], [bbox.right, bbox.bottom]],
                interior: Vec::new(),
            }),
            bitmap: None,
        }
    }

    /// Bounding box of the label geometry: the enclosing box of the exterior
    /// points, or the mask area of a bitmap. None when neither is usable.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        if let Some(bbox) = self
            .points
            .as_ref()
            .and_then(|points| BoundingBox::enclosing(&points.exterior))
        {
            return Some(bbox);
        }
        match self.bitmap.as_ref()?.bounding_box() {
            Ok(bbox) => Some(bbox),
            Err(e) => {
                log::warn!("Label {} has an unreadable bitmap: {}", self.id, e);
                None
            }
        }
    }
}

/// Wire shape of an annotation document.
#[derive(Deserialize)]
struct AnnotationDocument {
    #[serde(default)]
    objects: Vec<Label>,
}

/// The labels of one image, in the order the annotation tool reports them.
///
/// An annotation is immutable once built; a refresh replaces it wholesale.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    image_id: ImageId,
    labels: Vec<Label>,
}

impl Annotation {
    /// Create an annotation from an ordered list of labels.
    pub fn new(image_id: ImageId, labels: Vec<Label>) -> Self {
        Self { image_id, labels }
    }

    /// Parse the annotation document returned by the annotation service.
    pub fn from_json(
        image_id: ImageId,
        json: serde_json::Value,
    ) -> Result<Self, serde_json::Error> {
        let document: AnnotationDocument = serde_json::from_value(json)?;
        Ok(Self::new(image_id, document.objects))
    }

    /// Image this annotation belongs to.
    pub fn image_id(&self) -> ImageId {
        self.image_id
    }

    /// All labels in order.
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// Find a label by id.
    pub fn label(&self, id: LabelId) -> Option<&Label> {
        self.labels.iter().find(|label| label.id == id)
    }

    /// Check whether a label id is part of this annotation.
    pub fn contains_label(&self, id: LabelId) -> bool {
        self.label(id).is_some()
    }

    /// Number of labels.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Check if the annotation has no labels.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
