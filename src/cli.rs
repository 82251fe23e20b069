use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "plcimages")]
#[command(author, version, about = "Captured image metadata for catalog products")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API
    Start {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Manage products
    Product {
        #[command(subcommand)]
        command: ProductCommands,
    },

    /// Refresh a product's captured images from the image service
    Fetch {
        /// Product ID or part number
        #[arg(required = true)]
        product: String,
    },

    /// Show a product's stored captured images
    Images {
        /// Product ID or part number
        #[arg(required = true)]
        product: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}

#[derive(Subcommand)]
pub enum ProductCommands {
    /// Add a product
    Add {
        /// Display name
        name: String,

        /// Part number used to look up captured images
        #[arg(long)]
        part_number: Option<String>,
    },

    /// List products
    List,

    /// Set or clear a product's part number
    SetPartNumber {
        /// Product ID
        id: String,

        /// New part number; omit to clear
        part_number: Option<String>,
    },

    /// Remove a product and its captured images
    Remove {
        /// Product ID
        id: String,
    },
}
