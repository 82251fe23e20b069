//! Plcimages-DB: Database schema, migrations, and query operations
//!
//! SQLite storage for products and the images captured for them, using
//! rusqlite with r2d2 connection pooling.
//!
//! # Modules
//!
//! - `migrations` - Database schema migrations
//! - `pool` - Connection pool management
//! - `models` - Rust models matching database schema
//! - `queries` - Database query operations
//!
//! # Example
//!
//! ```no_run
//! use plcimages_db::pool::{init_pool, get_conn};
//! use plcimages_db::queries::products;
//!
//! let pool = init_pool("/var/lib/plcimages/plcimages.db").unwrap();
//! let conn = get_conn(&pool).unwrap();
//!
//! let product = products::create_product(&conn, "Bracket", Some("P-100")).unwrap();
//! println!("Created product: {}", product.id);
//! ```

pub mod migrations;
pub mod models;
pub mod pool;
pub mod queries;
