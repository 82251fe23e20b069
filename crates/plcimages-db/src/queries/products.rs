//! Product database queries.

use chrono::Utc;
use plcimages_common::{Error, ProductId, Result};
use rusqlite::{Connection, ErrorCode};

use super::{format_timestamp, parse_timestamp, parse_uuid};
use crate::models::Product;

/// Parse a product from a database row.
///
/// Expects columns in order: id, name, part_number, created_at.
fn parse_product_row(row: &rusqlite::Row) -> rusqlite::Result<Product> {
    Ok(Product {
        id: ProductId::from(parse_uuid(0, &row.get::<_, String>(0)?)?),
        name: row.get(1)?,
        part_number: row.get(2)?,
        created_at: parse_timestamp(3, &row.get::<_, String>(3)?)?,
    })
}

/// Map a write error, reporting a duplicate part number as invalid input.
fn map_write_error(e: rusqlite::Error, part_number: Option<&str>) -> Error {
    match &e {
        rusqlite::Error::SqliteFailure(err, _) if err.code == ErrorCode::ConstraintViolation => {
            Error::invalid_input(format!(
                "part number already in use: {}",
                part_number.unwrap_or_default()
            ))
        }
        _ => Error::database(e.to_string()),
    }
}

/// Blank means unset. Anything else is stored exactly as entered, since the
/// image service matches part numbers byte for byte.
fn normalize_part_number(part_number: Option<&str>) -> Option<&str> {
    part_number.filter(|p| !p.trim().is_empty())
}

/// Create a new product.
///
/// # Returns
///
/// * `Ok(Product)` - The created product
/// * `Err(Error::InvalidInput)` - If the name is blank or the part number is taken
/// * `Err(Error)` - If a database error occurs
pub fn create_product(conn: &Connection, name: &str, part_number: Option<&str>) -> Result<Product> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::invalid_input("product name must not be empty"));
    }

    let product = Product {
        id: ProductId::new(),
        name: name.to_string(),
        part_number: normalize_part_number(part_number).map(String::from),
        created_at: Utc::now(),
    };

    conn.execute(
        "INSERT INTO products (id, name, part_number, created_at)
         VALUES (:id, :name, :part_number, :created_at)",
        rusqlite::named_params! {
            ":id": product.id.to_string(),
            ":name": &product.name,
            ":part_number": &product.part_number,
            ":created_at": format_timestamp(&product.created_at),
        },
    )
    .map_err(|e| map_write_error(e, product.part_number.as_deref()))?;

    Ok(product)
}

/// Get a product by ID.
pub fn get_product(conn: &Connection, id: ProductId) -> Result<Option<Product>> {
    let result = conn.query_row(
        "SELECT id, name, part_number, created_at FROM products WHERE id = :id",
        rusqlite::named_params! { ":id": id.to_string() },
        parse_product_row,
    );

    match result {
        Ok(product) => Ok(Some(product)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// Get a product by its part number.
pub fn get_product_by_part_number(conn: &Connection, part_number: &str) -> Result<Option<Product>> {
    let result = conn.query_row(
        "SELECT id, name, part_number, created_at FROM products WHERE part_number = :part_number",
        rusqlite::named_params! { ":part_number": part_number },
        parse_product_row,
    );

    match result {
        Ok(product) => Ok(Some(product)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// List all products ordered by name.
pub fn list_products(conn: &Connection) -> Result<Vec<Product>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, name, part_number, created_at
             FROM products
             ORDER BY name, created_at",
        )
        .map_err(|e| Error::database(e.to_string()))?;

    let products = stmt
        .query_map([], parse_product_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(products)
}

/// Set or clear the part number of a product.
///
/// # Returns
///
/// * `Ok(true)` - If the product was updated
/// * `Ok(false)` - If the product does not exist
/// * `Err(Error::InvalidInput)` - If the part number is taken by another product
pub fn set_part_number(conn: &Connection, id: ProductId, part_number: Option<&str>) -> Result<bool> {
    let part_number = normalize_part_number(part_number);

    let rows_affected = conn
        .execute(
            "UPDATE products SET part_number = :part_number WHERE id = :id",
            rusqlite::named_params! {
                ":id": id.to_string(),
                ":part_number": part_number,
            },
        )
        .map_err(|e| map_write_error(e, part_number))?;

    Ok(rows_affected > 0)
}

/// Delete a product. Its captured images are removed by the cascade.
///
/// # Returns
///
/// * `Ok(true)` - If the product was deleted
/// * `Ok(false)` - If the product did not exist
pub fn delete_product(conn: &Connection, id: ProductId) -> Result<bool> {
    let rows_affected = conn
        .execute(
            "DELETE FROM products WHERE id = :id",
            rusqlite::named_params! { ":id": id.to_string() },
        )
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(rows_affected > 0)
}
