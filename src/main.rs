//! FaceLock Vault - CLI
//!
//! Command-line sender and receiver for face-gated vaults.

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use facelock_vault::render::VideoSource;
use facelock_vault::{
    ClientConfig, FileCapture, FixedPicker, HttpVaultService, PathPicker, RenderInstruction,
    Screen, SecretBundle, SecretFile, VaultAccessTerminal, VaultCreationFlow, VaultLocator,
};

#[derive(Parser)]
#[command(name = "facelock")]
#[command(author = "Karen Tonoyan")]
#[command(version = facelock_vault::VERSION)]
#[command(about = "FaceLock Vault - face-gated secret vaults")]
struct Cli {
    /// Config file (JSON)
    #[arg(short, long, default_value = "./facelock.json")]
    config: PathBuf,

    /// Vault service API endpoint (overrides config and FACELOCK_ENDPOINT)
    #[arg(short, long)]
    endpoint: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pick a directory through the service's folder dialog
    Browse,

    /// Create a vault
    Create {
        /// Reference face image
        #[arg(short, long)]
        face: PathBuf,

        /// Target directory (asks the folder dialog when omitted)
        #[arg(short, long)]
        dir: Option<String>,

        /// Secret message
        #[arg(short, long)]
        text: Option<String>,

        /// Secret file (repeatable)
        #[arg(long = "file")]
        files: Vec<PathBuf>,
    },

    /// Open a vault with a face capture
    Unlock {
        /// Image file standing in for the camera; re-read on every attempt
        #[arg(short, long)]
        capture: PathBuf,

        /// Vault directory (asks the folder dialog when omitted)
        #[arg(short, long)]
        dir: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> Result<bool> {
    let mut config = ClientConfig::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?
        .with_env_overrides();
    if let Some(endpoint) = cli.endpoint {
        config.endpoint = endpoint;
    }
    config.validate()?;

    let service = Arc::new(HttpVaultService::new(&config)?);

    match cli.command {
        Commands::Browse => {
            match VaultLocator::pick(service.as_ref()).await? {
                Some(locator) => println!("{}", locator),
                None => println!("📭 Selection cancelled"),
            }
            Ok(true)
        }

        Commands::Create { face, dir, text, files } => {
            let picker = picker_for(dir, &service);
            let Some(target) = VaultLocator::pick(picker.as_ref()).await? else {
                println!("📭 No target directory selected");
                return Ok(false);
            };

            let reference = std::fs::read(&face)
                .with_context(|| format!("reading face image {}", face.display()))?;
            let mut bundle = SecretBundle::new()
                .with_reference_face(reference)
                .with_target(target);
            if let Some(text) = text {
                bundle = bundle.with_text(text);
            }
            for path in &files {
                let file = SecretFile::from_path(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                bundle = bundle.with_file(file);
            }

            println!("🔐 Creating vault...");
            let flow = VaultCreationFlow::new(Arc::clone(&service));
            let outcome = flow.create_vault(&bundle).await;

            if outcome.success {
                println!("✅ {}", outcome.message);
            } else {
                println!("❌ {}", outcome.message);
            }
            Ok(outcome.success)
        }

        Commands::Unlock { capture, dir } => {
            let picker = picker_for(dir, &service);
            let terminal = VaultAccessTerminal::new(Arc::clone(&service), &config);

            let Some(locator) = terminal.select_locator(picker.as_ref()).await? else {
                println!("📭 No vault directory selected");
                return Ok(false);
            };

            println!("🔒 Vault Access Terminal - {}", locator);
            let mut camera = FileCapture::new(&capture);
            let stdin = std::io::stdin();

            loop {
                print!("📷 Press Enter to capture (q to quit): ");
                std::io::stdout().flush()?;

                let mut line = String::new();
                if stdin.lock().read_line(&mut line)? == 0 || line.trim() == "q" {
                    return Ok(false);
                }

                println!("🔄 Verifying...");
                let screen = terminal.unlock(&mut camera).await?;

                if let Some(notice) = terminal.notice() {
                    println!("⚠️ {}", notice);
                }

                match screen {
                    Screen::Idle | Screen::Verifying => {}
                    Screen::Failed { failures, remaining, reason } => {
                        println!(
                            "❌ {} ({}/{}, {} left)",
                            reason,
                            failures,
                            config.lockout_threshold,
                            remaining
                        );
                    }
                    Screen::Destroyed { reason } => {
                        println!("💥 VAULT DESTROYED");
                        println!("   {}", reason);
                        println!("   Secure files have been overwritten and deleted.");
                        return Ok(false);
                    }
                    Screen::Authenticated { items } => {
                        println!("✅ Authenticated - {} item(s)", items.len());
                        for item in items {
                            println!("{:-<60}", "");
                            println!("📄 {} [{}]", item.filename, item.kind.as_str());
                            match item.result {
                                Ok(instruction) => print_instruction(&instruction),
                                Err(e) => println!("   ⚠️ {}", e),
                            }
                        }
                        return Ok(true);
                    }
                }
            }
        }
    }
}

/// Use the directory given on the command line, else the service's dialog
fn picker_for(dir: Option<String>, service: &Arc<HttpVaultService>) -> Arc<dyn PathPicker> {
    match dir {
        Some(dir) => Arc::new(FixedPicker::new(dir)),
        None => Arc::clone(service) as Arc<dyn PathPicker>,
    }
}

fn print_instruction(instruction: &RenderInstruction) {
    match instruction {
        RenderInstruction::Text { body } => println!("{}", printable(body)),
        RenderInstruction::Image { media_type, width, height, preview, .. } => {
            let note = if preview.is_some() { ", preview available" } else { "" };
            println!("   🖼️ {} {}x{}{}", media_type, width, height, note);
        }
        RenderInstruction::Video { source, .. } => match source {
            VideoSource::Stream { url } => println!("   🎬 stream: {}", url),
            VideoSource::Embedded { media_type, data } => {
                println!("   🎬 {} ({} bytes embedded)", media_type, data.len())
            }
        },
        RenderInstruction::Opaque { media_type, size } => match size {
            Some(size) => println!("   📦 {} ({} bytes)", media_type, size),
            None => println!("   📦 {}", media_type),
        },
    }
}

/// Escape terminal control sequences so decrypted text is shown, not obeyed
fn printable(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    for c in body.chars() {
        if c.is_control() && c != '\n' && c != '\t' {
            out.extend(c.escape_default());
        } else {
            out.push(c);
        }
    }
    out
}
