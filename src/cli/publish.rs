use std::path::PathBuf;

use clap::Args;
use color_eyre::{Section, eyre};
use ipfspod::{Channel, Settings};

use crate::long_task;

#[derive(Args)]
pub struct PublishArgs {
    /// Channel directory (containing channel.json)
    channel: PathBuf,
    /// Generate RSS but don't publish it
    #[arg(short = 'n', long)]
    dry_run: bool,
}

pub async fn run(args: PublishArgs, settings: &Settings) -> eyre::Result<()> {
    let channel = Channel::open(&args.channel)
        .await
        .note("Can't open channel")?;
    let ipfs = settings.ipfs_cli();

    let publication = if args.dry_run {
        channel.publish(&ipfs, true).await
    } else {
        long_task(
            "Publishing feed...",
            channel.publish(&ipfs, false),
            "Feed published",
        )
        .await
    }
    .note("Failed to publish feed")?;

    match publication.content {
        Some(content) => println!("{content}"),
        None => println!("{}", publication.feed.display()),
    }
    Ok(())
}
