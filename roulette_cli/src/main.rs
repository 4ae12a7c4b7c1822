use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod client;
mod spin;

use client::ApiClient;
use spin::SpinArgs;

#[derive(Parser)]
#[command(name = "roulette-cli", about = "Operator CLI for the roulette image store")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Store base URL, default http://127.0.0.1:8080
    #[arg(long, env = "ROULETTE_SERVER", default_value = "http://127.0.0.1:8080")]
    server: String,
}

#[derive(Subcommand)]
enum Commands {
    /// List folders, newest first
    Folders,
    /// Create a folder
    CreateFolder { name: String },
    /// Delete a folder and all of its images
    DeleteFolder { id: String },
    /// List images in a folder
    Images { folder_id: String },
    /// Upload image files into a folder
    Upload {
        folder_id: String,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Delete a single image
    DeleteImage { id: String },
    /// Run spins headlessly and print the winners
    Spin(SpinArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let cli = Cli::parse();
    let client = ApiClient::new(cli.server);

    match cli.command {
        Commands::Folders => {
            for f in client.folders().await? {
                println!("{}  {}  created={}", f.id, f.name, f.created_at);
            }
        }
        Commands::CreateFolder { name } => {
            let folder = client.create_folder(&name).await?;
            println!("Created folder {} ({})", folder.name, folder.id);
        }
        Commands::DeleteFolder { id } => {
            client.delete_folder(&id).await?;
            println!("Deleted folder {id}");
        }
        Commands::Images { folder_id } => {
            let images = client.images(&folder_id).await?;
            for img in &images {
                println!("{}  {}", img.id, img.url);
            }
            println!("{} images", images.len());
        }
        Commands::Upload { folder_id, files } => {
            let uploaded = client.add_images(&folder_id, &files).await?;
            for img in &uploaded {
                println!("{}  {}", img.id, img.url);
            }
            println!("Uploaded {} of {} files", uploaded.len(), files.len());
        }
        Commands::DeleteImage { id } => {
            client.delete_image(&id).await?;
            println!("Deleted image {id}");
        }
        Commands::Spin(args) => {
            let records = spin::run(client, &args).await?;
            for r in &records {
                println!(
                    "#{:>3} source={} nonce={} hash={} ticks={} frame={} winner={}",
                    r.round, r.source, r.nonce, r.server_seed_hash, r.ticks, r.frame_index, r.item_key
                );
            }
        }
    }

    Ok(())
}
