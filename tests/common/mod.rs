//! Shared helpers for integration tests.
//!
//! Builds an in-memory database, a `SyncService` pointed at a wiremock
//! server standing in for the image service, and a log capture for asserting
//! on tracing output.

#![allow(dead_code)]

use std::io::Write;
use std::sync::{Arc, Mutex};

use plcimages::config::Config;
use plcimages::server::AppContext;
use plcimages::sync::SyncService;
use plcimages_db::models::{CapturedImage, Product};
use plcimages_db::pool::{init_memory_pool, DbPool};
use plcimages_db::queries::{captured_images, products};
use serde_json::{json, Value};

pub fn config_for(image_api_url: &str) -> Config {
    let mut config = Config::default();
    config.image_api.base_url = image_api_url.to_string();
    config
}

pub fn sync_service(config: &Config, db: &DbPool) -> SyncService {
    SyncService::from_config(config, db.clone()).expect("failed to build sync service")
}

pub fn app_context(config: Config) -> AppContext {
    let db = init_memory_pool().expect("failed to create in-memory pool");
    AppContext::from_config(config, db).expect("failed to build app context")
}

pub fn create_product(db: &DbPool, name: &str, part_number: Option<&str>) -> Product {
    let conn = db.get().unwrap();
    products::create_product(&conn, name, part_number).unwrap()
}

pub fn stored_images(db: &DbPool, product: &Product) -> Vec<CapturedImage> {
    let conn = db.get().unwrap();
    captured_images::list_for_product(&conn, product.id).unwrap()
}

/// A response element as the image service sends it.
pub fn image_json(part_number: &str, bucket: &str, file: &str, captured_at: &str) -> Value {
    json!({
        "image_id": 1,
        "file_path": format!("/captures/{}", file),
        "file_name": file,
        "file_type": "image/jpeg",
        "image_size": 20480,
        "captured_at": captured_at,
        "bucket_name": bucket,
        "part_name": "Bracket",
        "part_number": part_number,
        "device_model": "Basler acA1920",
        "location": "Line 3",
        "serial_number": "SN-42",
        "resolution": "1920x1080",
        "capture_mode": "Auto",
        "notes": "Manual upload"
    })
}

/// Captured log output, installed as the thread's default subscriber.
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let writer = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
