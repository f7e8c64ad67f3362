//! Verity Router CLI
//!
//! Starts the HTTP server for claims, consensus reports and playful signals.

use std::env;
use std::process;
use verity_router::{config::RouterConfig, start_server, RouterError};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run() -> Result<(), RouterError> {
    let args: Vec<String> = env::args().collect();

    let config = if args.len() > 2 && args[1] == "--config" {
        RouterConfig::from_file(&args[2])?
    } else if args.len() > 1 && args[1] == "--help" {
        print_help();
        process::exit(0);
    } else {
        eprintln!("Warning: No config file specified, using default test configuration");
        eprintln!("Usage: verity-router --config <path-to-config.toml>");
        eprintln!();
        RouterConfig::default_test_config()
    };

    start_server(config).await?;

    Ok(())
}

fn print_help() {
    println!("Verity Router - Claim Provenance & Consensus Engine");
    println!();
    println!("USAGE:");
    println!("    verity-router --config <path-to-config.toml>");
    println!();
    println!("OPTIONS:");
    println!("    --config <file>    Load configuration from TOML file");
    println!("    --help             Print this help message");
    println!();
    println!("CONFIGURATION:");
    println!("    The TOML config file should contain:");
    println!("    - bind_address, bind_port: listen address");
    println!("    - database_path: SQLite file (default: verity.db)");
    println!("    - jwt_secret: Secret key for JWT token signing");
    println!("    - admin_secret: Secret that grants the admin role");
    println!("    - signing_key_hex: Engine Ed25519 key (optional, ephemeral if absent)");
    println!("    - validation_preset: default | permissive | strict");
    println!("    - [consensus] and [ingestor] sections (optional)");
    println!();
    println!("LOGGING:");
    println!("    Set RUST_LOG to adjust verbosity (default: info)");
    println!();
}
