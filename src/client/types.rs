use chrono::{DateTime, Utc};
use plcimages_db::models::NewCapturedImage;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One element of the image service's `/images` response.
///
/// The service returns images for every part, built with outer joins, so a
/// record for some other part may be missing its storage location or carry a
/// timestamp we cannot read. Only the part number is looked at until a record
/// is known to belong to the product; [`ImageRecord::into_new_image`] then
/// reads the rest.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct ImageRecord(Value);

/// The fields of a matching record, as stored.
///
/// Everything except the storage location may be null. Extra fields are
/// ignored.
#[derive(Debug, Deserialize)]
struct ImageDetails {
    bucket_name: String,
    file_name: String,
    #[serde(default)]
    part_number: Option<String>,
    #[serde(default)]
    file_type: Option<String>,
    #[serde(default)]
    image_size: Option<i64>,
    #[serde(default)]
    captured_at: Option<DateTime<Utc>>,
    #[serde(default)]
    part_name: Option<String>,
    #[serde(default)]
    device_model: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    resolution: Option<String>,
    #[serde(default)]
    capture_mode: Option<String>,
    #[serde(default)]
    notes: Option<String>,
}

impl ImageRecord {
    /// The record's part number, if it is a string.
    pub fn part_number(&self) -> Option<&str> {
        self.0.get("part_number").and_then(Value::as_str)
    }

    /// Whether this record belongs to `part_number` (exact match).
    pub fn matches_part(&self, part_number: &str) -> bool {
        self.part_number() == Some(part_number)
    }

    /// Map the wire record onto the stored captured-image fields.
    ///
    /// Fails if the storage location is missing or a field has the wrong
    /// type.
    pub fn into_new_image(self, public_url: &str) -> Result<NewCapturedImage, serde_json::Error> {
        let details: ImageDetails = serde_json::from_value(self.0)?;

        Ok(NewCapturedImage {
            image_url: image_url(public_url, &details.bucket_name, &details.file_name),
            file_name: details.file_name,
            file_type: details.file_type,
            image_size: details.image_size,
            captured_at: details.captured_at,
            part_name: details.part_name,
            part_number: details.part_number,
            camera_model: details.device_model,
            camera_location: details.location,
            resolution: details.resolution,
            capture_mode: details.capture_mode,
            notes: details.notes,
        })
    }
}

/// Build the public URL of a stored image file.
pub fn image_url(public_url: &str, bucket_name: &str, file_name: &str) -> String {
    format!("{}/{}/{}", public_url, bucket_name, file_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    const FULL_RECORD: &str = r#"{
        "image_id": 7,
        "file_path": "/data/captures/f1.jpg",
        "file_name": "f1.jpg",
        "file_type": "image/jpeg",
        "image_size": 48213,
        "captured_at": "2024-05-01T10:15:00.000Z",
        "bucket_name": "b1",
        "part_name": "Bracket",
        "part_number": "P-100",
        "device_model": "Basler acA1920",
        "location": "Line 3",
        "serial_number": "SN-1",
        "resolution": "1920x1080",
        "capture_mode": "Auto",
        "notes": "Manual upload"
    }"#;

    fn record(value: Value) -> ImageRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_full_record_ignores_extras() {
        let record: ImageRecord = serde_json::from_str(FULL_RECORD).unwrap();
        let image = record.into_new_image("http://localhost:9000").unwrap();

        assert_eq!(image.image_size, Some(48213));
        assert_eq!(
            image.captured_at,
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 10, 15, 0).unwrap())
        );
    }

    #[test]
    fn test_nulls_and_missing_fields() {
        let image = record(json!({
            "bucket_name": "b1",
            "file_name": "f1.jpg",
            "part_name": null,
            "captured_at": null
        }))
        .into_new_image("http://localhost:9000")
        .unwrap();

        assert!(image.part_number.is_none());
        assert!(image.part_name.is_none());
        assert!(image.captured_at.is_none());
    }

    #[test]
    fn test_incomplete_records_still_decode() {
        let records: Vec<ImageRecord> = serde_json::from_str(
            r#"[
                {"part_number": "P-200", "bucket_name": null, "file_name": "f2.jpg"},
                {"part_number": "P-300", "captured_at": "yesterday"},
                {"part_number": 42},
                {}
            ]"#,
        )
        .unwrap();

        assert_eq!(records.len(), 4);
        assert_eq!(records[0].part_number(), Some("P-200"));
        assert_eq!(records[2].part_number(), None);
        assert_eq!(records[3].part_number(), None);
    }

    #[test]
    fn test_missing_location_fails_mapping() {
        let result = record(json!({"part_number": "P-100", "file_name": "f1.jpg"}))
            .into_new_image("http://localhost:9000");
        assert!(result.is_err());

        let result = record(json!({
            "part_number": "P-100",
            "bucket_name": null,
            "file_name": "f1.jpg"
        }))
        .into_new_image("http://localhost:9000");
        assert!(result.is_err());
    }

    #[test]
    fn test_unreadable_timestamp_fails_mapping() {
        let result = record(json!({
            "part_number": "P-100",
            "bucket_name": "b1",
            "file_name": "f1.jpg",
            "captured_at": "yesterday"
        }))
        .into_new_image("http://localhost:9000");
        assert!(result.is_err());
    }

    #[test]
    fn test_matches_part_is_exact() {
        let record: ImageRecord = serde_json::from_str(FULL_RECORD).unwrap();
        assert!(record.matches_part("P-100"));
        assert!(!record.matches_part("p-100"));
        assert!(!record.matches_part("P-10"));
        assert!(!record.matches_part("P-100 "));
    }

    #[test]
    fn test_into_new_image_maps_fields() {
        let record: ImageRecord = serde_json::from_str(FULL_RECORD).unwrap();
        let image = record.into_new_image("http://localhost:9000").unwrap();

        assert_eq!(image.image_url, "http://localhost:9000/b1/f1.jpg");
        assert_eq!(image.file_name, "f1.jpg");
        assert_eq!(image.camera_model.as_deref(), Some("Basler acA1920"));
        assert_eq!(image.camera_location.as_deref(), Some("Line 3"));
        assert_eq!(image.part_number.as_deref(), Some("P-100"));
        assert_eq!(image.notes.as_deref(), Some("Manual upload"));
    }
}
