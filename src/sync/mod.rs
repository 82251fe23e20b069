//! Refresh of a product's captured images from the image service.
//!
//! [`SyncService::sync_product`] asks the configured [`ImageSource`] for the
//! product's part number, keeps the records that really belong to that part,
//! and replaces the product's stored images with them. It never fails: every
//! outcome, including transport and storage errors, is logged and returned as
//! a [`SyncOutcome`] value.

use std::fmt;
use std::sync::Arc;

use plcimages_common::{Error, ProductId, Result};
use plcimages_db::models::{NewCapturedImage, Product};
use plcimages_db::pool::{get_conn, DbPool};
use plcimages_db::queries::{captured_images, products};
use serde::Serialize;
use tracing::{debug, error, info};

use crate::client::{ClientError, HttpImageSource, ImageSource};
use crate::config::Config;

/// Result of one refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum SyncOutcome {
    /// Stored images now mirror the service. `skipped` counts records
    /// returned for other part numbers.
    Synced { stored: usize, skipped: usize },
    /// The product has no part number; nothing was touched.
    MissingPartNumber,
    /// The service could not be reached or the request timed out.
    FetchFailed { message: String },
    /// The service answered with a non-success status.
    Rejected { status: u16 },
    /// The response body was not a list of image records.
    ParseFailed { message: String },
    /// Writing the new images failed; the previous set is kept.
    StoreFailed { message: String },
}

impl SyncOutcome {
    pub fn is_synced(&self) -> bool {
        matches!(self, Self::Synced { .. })
    }
}

impl From<ClientError> for SyncOutcome {
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::Status { status } => Self::Rejected { status },
            ClientError::Decode(e) => Self::ParseFailed {
                message: e.to_string(),
            },
            e @ (ClientError::Build(_) | ClientError::Transport { .. }) => Self::FetchFailed {
                message: e.to_string(),
            },
        }
    }
}

impl fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Synced { stored, skipped } => {
                write!(f, "synced {} image(s)", stored)?;
                if *skipped > 0 {
                    write!(f, ", ignored {} for other parts", skipped)?;
                }
                Ok(())
            }
            Self::MissingPartNumber => write!(f, "product has no part number"),
            Self::FetchFailed { message } => write!(f, "fetch failed: {}", message),
            Self::Rejected { status } => write!(f, "image service returned HTTP {}", status),
            Self::ParseFailed { message } => write!(f, "unreadable response: {}", message),
            Self::StoreFailed { message } => write!(f, "storing images failed: {}", message),
        }
    }
}

/// Refreshes products' captured images from an [`ImageSource`].
pub struct SyncService {
    source: Arc<dyn ImageSource>,
    pool: DbPool,
    public_url: String,
    clear_on_failure: bool,
}

impl SyncService {
    /// Create a new `SyncService`.
    ///
    /// # Arguments
    ///
    /// * `source` - Where image records come from
    /// * `pool` - Database connection pool
    /// * `public_url` - Object storage base used to build image URLs
    /// * `clear_on_failure` - Whether a failed fetch still removes stored images
    pub fn new(
        source: Arc<dyn ImageSource>,
        pool: DbPool,
        public_url: impl Into<String>,
        clear_on_failure: bool,
    ) -> Self {
        Self {
            source,
            pool,
            public_url: public_url.into().trim_end_matches('/').to_string(),
            clear_on_failure,
        }
    }

    /// Build a service talking to the configured image service over HTTP.
    pub fn from_config(config: &Config, pool: DbPool) -> std::result::Result<Self, ClientError> {
        let source = HttpImageSource::from_config(&config.image_api)?;
        Ok(Self::new(
            Arc::new(source),
            pool,
            config.storage.public_url.clone(),
            config.sync.clear_on_failure,
        ))
    }

    /// Replace `product`'s captured images with what the image service has
    /// for its part number.
    ///
    /// A product without a part number loses its stored images and the
    /// service is not asked. Records whose part number differs from the
    /// product's are dropped before anything else in them is read; a matching
    /// record that cannot be mapped fails the whole refresh. On a fetch,
    /// status or parse failure the stored images are cleared when
    /// `clear_on_failure` is set and kept otherwise.
    pub async fn sync_product(&self, product: &Product) -> SyncOutcome {
        let Some(part_number) = product.part_number() else {
            debug!(product_id = %product.id, "Product has no part number; skipping image fetch");
            self.clear(product.id);
            return SyncOutcome::MissingPartNumber;
        };

        info!(product_id = %product.id, part_number, "Fetching captured images");

        let records = match self.source.fetch_images(part_number).await {
            Ok(records) => records,
            Err(e) => {
                error!(
                    product_id = %product.id,
                    part_number,
                    error = %e,
                    "Error fetching captured images"
                );
                self.abandon(product.id);
                return SyncOutcome::from(e);
            }
        };

        let total = records.len();
        let new_images = match records
            .into_iter()
            .filter(|record| record.matches_part(part_number))
            .map(|record| record.into_new_image(&self.public_url))
            .collect::<std::result::Result<Vec<NewCapturedImage>, _>>()
        {
            Ok(new_images) => new_images,
            Err(e) => {
                error!(
                    product_id = %product.id,
                    part_number,
                    error = %e,
                    "Error reading captured image record"
                );
                self.abandon(product.id);
                return SyncOutcome::ParseFailed {
                    message: e.to_string(),
                };
            }
        };
        let skipped = total - new_images.len();

        if skipped > 0 {
            debug!(
                product_id = %product.id,
                part_number,
                skipped,
                "Ignored records for other parts"
            );
        }

        match self.replace(product.id, new_images) {
            Ok(stored) => {
                info!(product_id = %product.id, part_number, stored, "Captured images synced");
                SyncOutcome::Synced { stored, skipped }
            }
            Err(e) => {
                error!(
                    product_id = %product.id,
                    part_number,
                    error = %e,
                    "Error storing captured images"
                );
                SyncOutcome::StoreFailed {
                    message: e.to_string(),
                }
            }
        }
    }

    /// Look up a product and sync it.
    ///
    /// Lookup errors are returned; the sync itself never fails.
    pub async fn sync_product_by_id(&self, product_id: ProductId) -> Result<SyncOutcome> {
        let product = {
            let conn = get_conn(&self.pool)?;
            products::get_product(&conn, product_id)?
                .ok_or_else(|| Error::not_found(format!("product {}", product_id)))?
        };

        Ok(self.sync_product(&product).await)
    }

    fn replace(&self, product_id: ProductId, images: Vec<NewCapturedImage>) -> Result<usize> {
        let conn = get_conn(&self.pool)?;
        let stored = captured_images::replace_for_product(&conn, product_id, images)?;
        Ok(stored.len())
    }

    fn abandon(&self, product_id: ProductId) {
        if self.clear_on_failure {
            self.clear(product_id);
        }
    }

    fn clear(&self, product_id: ProductId) {
        let result = get_conn(&self.pool)
            .and_then(|conn| captured_images::delete_for_product(&conn, product_id));

        match result {
            Ok(removed) => debug!(product_id = %product_id, removed, "Cleared captured images"),
            Err(e) => error!(
                product_id = %product_id,
                error = %e,
                "Error clearing captured images"
            ),
        }
    }
}
