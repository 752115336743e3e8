use clap::Subcommand;
use color_eyre::{Section, eyre};
use ipfspod::{KeyStore, Settings};
use tracing::info;

#[derive(Subcommand)]
pub enum KeyCommands {
    /// List the keys known to ipfs
    List,
    /// Remove a key, e.g. one generated for a channel that was deleted
    Rm {
        /// Key name (the channel's directory name)
        name: String,
    },
}

pub async fn run(command: KeyCommands, settings: &Settings) -> eyre::Result<()> {
    let ipfs = settings.ipfs_cli();
    match command {
        KeyCommands::List => {
            let keys = ipfs.list_keys().await.note("Failed to list keys")?;
            for key in keys {
                println!("{} {}", key.id, key.name);
            }
        }
        KeyCommands::Rm { name } => {
            ipfs.remove_key(&name).await.note("Failed to remove key")?;
            info!(%name, "Key removed");
        }
    }
    Ok(())
}
