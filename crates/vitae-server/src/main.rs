//! Vitae server binary
//!
//! Starts the HTTP upload service.

use anyhow::Context;
use std::env;
use std::process;
use vitae_server::{config::ServerConfig, start_server};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();

    let config = if args.len() > 2 && args[1] == "--config" {
        let config_path = &args[2];
        ServerConfig::from_file(config_path)
            .with_context(|| format!("loading {}", config_path))?
    } else if args.len() > 1 && args[1] == "--help" {
        print_help();
        return Ok(());
    } else {
        eprintln!("Warning: No config file specified, using the mock backend");
        eprintln!("Usage: vitae-server --config <path-to-config.toml>");
        eprintln!();
        ServerConfig::default_test_config()
    };

    start_server(config).await?;
    Ok(())
}

fn print_help() {
    println!("Vitae Server - résumé upload and extraction service");
    println!();
    println!("USAGE:");
    println!("    vitae-server --config <path-to-config.toml>");
    println!();
    println!("OPTIONS:");
    println!("    --config <file>    Load configuration from TOML file");
    println!("    --help             Print this help message");
    println!();
    println!("ENDPOINTS:");
    println!("    POST /api/parse    multipart upload, field 'file' (.pdf or .docx)");
    println!("    GET  /health       pool status");
    println!();
    println!("CONFIGURATION:");
    println!("    bind_address, bind_port, max_upload_bytes");
    println!("    [completion]           backend (ollama | llamacpp | mock), model, endpoints");
    println!("    [completion.pool]      timeout_secs, retry_backoff_ms");
    println!("    [extractor]            context_window_tokens, reserved_completion_tokens,");
    println!("                           truncation (head | tail), max_document_bytes");
    println!("    [extractor.generation] max_tokens, temperature, top_p, repeat_penalty");
    println!();
    println!("Set RUST_LOG to adjust logging (default: info).");
}
