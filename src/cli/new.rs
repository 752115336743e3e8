use std::path::PathBuf;

use clap::Args;
use color_eyre::{Section, eyre};
use ipfspod::{Channel, NewChannel, Settings};

#[derive(Args)]
pub struct NewArgs {
    /// Short channel name with no special characters
    channel_name: PathBuf,
    /// Longer, human readable channel title
    #[arg(long)]
    title: Option<String>,
    /// Detailed channel description, optionally in HTML
    #[arg(long)]
    description: Option<String>,
    /// Link to the podcast home page
    #[arg(long)]
    link: Option<String>,
    /// Copyright information (peer-to-peer; not every license makes sense)
    #[arg(long)]
    copyright: Option<String>,
    /// Language as a two character code, plus optional variant (e.g. 'en', 'en-US')
    #[arg(long)]
    language: Option<String>,
    /// Channel's managing editor: in most cases also the sole author
    #[arg(long, visible_alias = "author")]
    managing_editor: Option<String>,
    /// Recommended time between client refreshes, in seconds
    #[arg(long)]
    ttl: Option<u32>,
    /// Don't create a key for this channel: use this key instead
    #[arg(long)]
    key: Option<String>,
}

impl From<NewArgs> for NewChannel {
    fn from(args: NewArgs) -> Self {
        Self {
            path: args.channel_name,
            title: args.title,
            description: args.description,
            link: args.link,
            copyright: args.copyright,
            language: args.language,
            managing_editor: args.managing_editor,
            ttl: args.ttl,
            key: args.key,
        }
    }
}

pub async fn run(args: NewArgs, settings: &Settings) -> eyre::Result<()> {
    let ipfs = settings.ipfs_cli();
    let channel = Channel::create(args.into(), &ipfs, settings)
        .await
        .note("Failed to create channel")?;
    println!("{}", channel.metadata_path().display());
    Ok(())
}
