//! Captured image database queries.
//!
//! Captured images are never edited in place: a product's set is listed,
//! counted, cleared, or replaced wholesale.

use plcimages_common::{CapturedImageId, Error, ProductId, Result};
use rusqlite::Connection;

use super::{format_timestamp, parse_timestamp, parse_uuid};
use crate::models::{CapturedImage, NewCapturedImage};

const SELECT_COLUMNS: &str = "SELECT id, product_id, image_url, file_name, file_type, image_size,
        captured_at, part_name, part_number, camera_model, camera_location,
        resolution, capture_mode, notes
 FROM captured_images";

/// Parse a captured image from a database row, in `SELECT_COLUMNS` order.
fn parse_captured_image_row(row: &rusqlite::Row) -> rusqlite::Result<CapturedImage> {
    let captured_at = match row.get::<_, Option<String>>(6)? {
        Some(ts) => Some(parse_timestamp(6, &ts)?),
        None => None,
    };

    Ok(CapturedImage {
        id: CapturedImageId::from(parse_uuid(0, &row.get::<_, String>(0)?)?),
        product_id: ProductId::from(parse_uuid(1, &row.get::<_, String>(1)?)?),
        image_url: row.get(2)?,
        file_name: row.get(3)?,
        file_type: row.get(4)?,
        image_size: row.get(5)?,
        captured_at,
        part_name: row.get(7)?,
        part_number: row.get(8)?,
        camera_model: row.get(9)?,
        camera_location: row.get(10)?,
        resolution: row.get(11)?,
        capture_mode: row.get(12)?,
        notes: row.get(13)?,
    })
}

/// Insert a captured image record.
///
/// # Returns
///
/// * `Ok(CapturedImageId)` - The ID of the inserted row
/// * `Err(Error)` - If a database error occurs, including an unknown product
pub fn insert_captured_image(conn: &Connection, image: &CapturedImage) -> Result<CapturedImageId> {
    conn.execute(
        "INSERT INTO captured_images (
            id, product_id, image_url, file_name, file_type, image_size, captured_at,
            part_name, part_number, camera_model, camera_location, resolution,
            capture_mode, notes
         ) VALUES (
            :id, :product_id, :image_url, :file_name, :file_type, :image_size, :captured_at,
            :part_name, :part_number, :camera_model, :camera_location, :resolution,
            :capture_mode, :notes
         )",
        rusqlite::named_params! {
            ":id": image.id.to_string(),
            ":product_id": image.product_id.to_string(),
            ":image_url": &image.image_url,
            ":file_name": &image.file_name,
            ":file_type": &image.file_type,
            ":image_size": image.image_size,
            ":captured_at": image.captured_at.as_ref().map(format_timestamp),
            ":part_name": &image.part_name,
            ":part_number": &image.part_number,
            ":camera_model": &image.camera_model,
            ":camera_location": &image.camera_location,
            ":resolution": &image.resolution,
            ":capture_mode": &image.capture_mode,
            ":notes": &image.notes,
        },
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(image.id)
}

/// List the captured images of a product, newest capture first.
///
/// Images without a capture timestamp come last.
pub fn list_for_product(conn: &Connection, product_id: ProductId) -> Result<Vec<CapturedImage>> {
    let mut stmt = conn
        .prepare(&format!(
            "{SELECT_COLUMNS}
             WHERE product_id = :product_id
             ORDER BY captured_at IS NULL, captured_at DESC, file_name"
        ))
        .map_err(|e| Error::database(e.to_string()))?;

    let images = stmt
        .query_map(
            rusqlite::named_params! { ":product_id": product_id.to_string() },
            parse_captured_image_row,
        )
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(images)
}

/// Count the captured images of a product.
pub fn count_for_product(conn: &Connection, product_id: ProductId) -> Result<u64> {
    conn.query_row(
        "SELECT COUNT(*) FROM captured_images WHERE product_id = :product_id",
        rusqlite::named_params! { ":product_id": product_id.to_string() },
        |row| row.get::<_, i64>(0),
    )
    .map(|count| count as u64)
    .map_err(|e| Error::database(e.to_string()))
}

/// Delete all captured images of a product.
///
/// # Returns
///
/// * `Ok(u64)` - Number of rows deleted
pub fn delete_for_product(conn: &Connection, product_id: ProductId) -> Result<u64> {
    let rows_affected = conn
        .execute(
            "DELETE FROM captured_images WHERE product_id = :product_id",
            rusqlite::named_params! { ":product_id": product_id.to_string() },
        )
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(rows_affected as u64)
}

/// Replace all captured images of a product with `images`.
///
/// The delete and the inserts run in one transaction: readers see either
/// the previous set or the new one. No merging or deduplication is done.
///
/// # Returns
///
/// * `Ok(Vec<CapturedImage>)` - The stored rows, in the order given
/// * `Err(Error)` - If any statement fails; the previous set is kept
pub fn replace_for_product(
    conn: &Connection,
    product_id: ProductId,
    images: Vec<NewCapturedImage>,
) -> Result<Vec<CapturedImage>> {
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| Error::database(e.to_string()))?;

    delete_for_product(&tx, product_id)?;

    let stored = images
        .into_iter()
        .map(|image| {
            let image = image.into_captured(product_id);
            insert_captured_image(&tx, &image).map(|_| image)
        })
        .collect::<Result<Vec<_>>>()?;

    tx.commit().map_err(|e| Error::database(e.to_string()))?;

    Ok(stored)
}
