//! Rust models matching the database schema.

use chrono::{DateTime, Utc};
use plcimages_common::{CapturedImageId, ProductId};
use serde::{Deserialize, Serialize};

/// A catalog product. Products are looked up by their part number when
/// fetching captured images.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub part_number: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// The part number, if set and non-empty.
    pub fn part_number(&self) -> Option<&str> {
        self.part_number.as_deref().filter(|p| !p.is_empty())
    }
}

/// One previously captured image of a product, with its provenance.
///
/// Rows are owned by exactly one product and are removed with it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CapturedImage {
    pub id: CapturedImageId,
    pub product_id: ProductId,
    pub image_url: String,
    pub file_name: String,
    /// MIME type
    pub file_type: Option<String>,
    /// Size in bytes
    pub image_size: Option<i64>,
    pub captured_at: Option<DateTime<Utc>>,
    pub part_name: Option<String>,
    pub part_number: Option<String>,
    pub camera_model: Option<String>,
    pub camera_location: Option<String>,
    pub resolution: Option<String>,
    pub capture_mode: Option<String>,
    pub notes: Option<String>,
}

impl CapturedImage {
    /// Display value for the image: the stored URL, passed through.
    pub fn preview(&self) -> &str {
        &self.image_url
    }
}

/// Field values for a captured image that has not been stored yet.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NewCapturedImage {
    pub image_url: String,
    pub file_name: String,
    pub file_type: Option<String>,
    pub image_size: Option<i64>,
    pub captured_at: Option<DateTime<Utc>>,
    pub part_name: Option<String>,
    pub part_number: Option<String>,
    pub camera_model: Option<String>,
    pub camera_location: Option<String>,
    pub resolution: Option<String>,
    pub capture_mode: Option<String>,
    pub notes: Option<String>,
}

impl NewCapturedImage {
    /// Attach identity and ownership, producing the stored form.
    pub fn into_captured(self, product_id: ProductId) -> CapturedImage {
        CapturedImage {
            id: CapturedImageId::new(),
            product_id,
            image_url: self.image_url,
            file_name: self.file_name,
            file_type: self.file_type,
            image_size: self.image_size,
            captured_at: self.captured_at,
            part_name: self.part_name,
            part_number: self.part_number,
            camera_model: self.camera_model,
            camera_location: self.camera_location,
            resolution: self.resolution,
            capture_mode: self.capture_mode,
            notes: self.notes,
        }
    }
}
