//! Plcimages-Common: Shared IDs and error types.
//!
//! - **Typed IDs**: Type-safe UUID wrappers for products and captured images
//! - **Error Handling**: Common error type and result alias
//!
//! # Examples
//!
//! ```
//! use plcimages_common::{Error, ProductId, Result};
//!
//! let product_id = ProductId::new();
//!
//! fn example(id: ProductId) -> Result<()> {
//!     Err(Error::not_found(format!("product {}", id)))
//! }
//!
//! assert!(example(product_id).is_err());
//! ```

pub mod error;
pub mod ids;

pub use error::{Error, Result};
pub use ids::*;
