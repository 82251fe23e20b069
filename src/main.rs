mod cli;

use plcimages::{config, server, sync::SyncService};
use plcimages_db::models::{CapturedImage, Product};
use plcimages_db::pool::{get_conn, init_pool, DbPool};
use plcimages_db::queries::{captured_images, products};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands, ProductCommands};
use plcimages_common::ProductId;
use std::path::Path;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "plcimages=trace,plcimages_db=debug,tower_http=debug".to_string()
        } else {
            "plcimages=info,plcimages_db=info,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt().with_env_filter(&env_filter).init();

    match cli.command {
        Commands::Start { host, port } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(cli.config.as_deref(), host, port))
        }
        Commands::Product { command } => run_product_command(cli.config.as_deref(), command),
        Commands::Fetch { product } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(fetch_images(cli.config.as_deref(), &product))
        }
        Commands::Images { product, json } => show_images(cli.config.as_deref(), &product, json),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("plcimages {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn open_database(config: &config::Config) -> Result<DbPool> {
    let db_path = config.database.path.to_string_lossy();
    tracing::debug!("Opening database at {}", db_path);
    init_pool(&db_path).with_context(|| format!("Failed to open database at {}", db_path))
}

async fn start_server(
    config_path: Option<&Path>,
    host: Option<String>,
    port: Option<u16>,
) -> Result<()> {
    let mut config = config::load_config_or_default(config_path)?;

    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    tracing::info!("Starting plcimages server");
    tracing::info!("Image service: {}", config.image_api.base_url);

    let db = open_database(&config)?;
    let ctx = server::AppContext::from_config(config, db)?;

    server::start_server(ctx).await
}

/// Resolve a product by ID, falling back to part number.
fn find_product(db: &DbPool, reference: &str) -> Result<Product> {
    let conn = get_conn(db)?;

    let by_id = match reference.parse::<ProductId>() {
        Ok(id) => products::get_product(&conn, id)?,
        Err(_) => None,
    };

    match by_id {
        Some(product) => Ok(product),
        None => products::get_product_by_part_number(&conn, reference)?
            .with_context(|| format!("No product with ID or part number {:?}", reference)),
    }
}

fn run_product_command(config_path: Option<&Path>, command: ProductCommands) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let db = open_database(&config)?;
    let conn = get_conn(&db)?;

    match command {
        ProductCommands::Add { name, part_number } => {
            let product = products::create_product(&conn, &name, part_number.as_deref())?;
            println!("{}", product.id);
        }
        ProductCommands::List => {
            for product in products::list_products(&conn)? {
                println!(
                    "{}  {:<20} {}",
                    product.id,
                    product.part_number.as_deref().unwrap_or("-"),
                    product.name
                );
            }
        }
        ProductCommands::SetPartNumber { id, part_number } => {
            let id: ProductId = id.parse().context("Invalid product ID")?;
            if !products::set_part_number(&conn, id, part_number.as_deref())? {
                anyhow::bail!("Product not found: {}", id);
            }
        }
        ProductCommands::Remove { id } => {
            let id: ProductId = id.parse().context("Invalid product ID")?;
            if !products::delete_product(&conn, id)? {
                anyhow::bail!("Product not found: {}", id);
            }
        }
    }

    Ok(())
}

async fn fetch_images(config_path: Option<&Path>, reference: &str) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let db = open_database(&config)?;
    let product = find_product(&db, reference)?;

    let service = SyncService::from_config(&config, db.clone())
        .context("Failed to create image service client")?;
    let outcome = service.sync_product(&product).await;

    println!("{}: {}", product.name, outcome);
    print_images(&list_images(&db, product.id)?);

    if !outcome.is_synced() {
        anyhow::bail!("Image fetch for {} did not complete", product.name);
    }

    Ok(())
}

fn show_images(config_path: Option<&Path>, reference: &str, json: bool) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let db = open_database(&config)?;
    let product = find_product(&db, reference)?;
    let images = list_images(&db, product.id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&images)?);
    } else {
        print_images(&images);
    }

    Ok(())
}

fn list_images(db: &DbPool, product_id: ProductId) -> Result<Vec<CapturedImage>> {
    let conn = get_conn(db)?;
    Ok(captured_images::list_for_product(&conn, product_id)?)
}

fn print_images(images: &[CapturedImage]) {
    if images.is_empty() {
        println!("No captured images.");
        return;
    }

    for image in images {
        let captured = image
            .captured_at
            .map(|ts| ts.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string());

        println!("{}  {}", captured, image.preview());
        if let Some(ref camera) = image.camera_model {
            print!("      camera: {}", camera);
            if let Some(ref location) = image.camera_location {
                print!(" @ {}", location);
            }
            println!();
        }
        if let (Some(resolution), Some(mode)) = (&image.resolution, &image.capture_mode) {
            println!("      {} {}", resolution, mode);
        }
        if let Some(ref notes) = image.notes {
            println!("      {}", notes);
        }
    }
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            println!("  Server: {}:{}", config.server.host, config.server.port);
            println!("  Database: {}", config.database.path.display());
            println!(
                "  Image service: {} (timeout {}s)",
                config.image_api.base_url, config.image_api.timeout_secs
            );
            println!("  Storage: {}", config.storage.public_url);
            println!("  Clear on failure: {}", config.sync.clear_on_failure);
        }
        None => {
            println!("No config file specified, using defaults");
            let config = config::Config::default();
            println!("Default config:");
            println!("  Server: {}:{}", config.server.host, config.server.port);
            println!("  Image service: {}", config.image_api.base_url);
        }
    }

    Ok(())
}
