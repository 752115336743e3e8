use std::path::PathBuf;

use clap::Args;
use color_eyre::{Section, eyre};
use ipfspod::{Channel, NewEpisode, Settings, metadata::Enclosure};

use crate::long_task;

#[derive(Args)]
#[command(after_help = "The channel must be initialized by `ipfspod new`")]
pub struct AddArgs {
    /// Directory for the channel to append to
    channel: PathBuf,
    /// Longer, human readable episode title
    title: String,
    /// Detailed episode description, optionally in HTML
    #[arg(short, long)]
    description: Option<String>,
    /// Link to a copy of this post, if applicable
    #[arg(short, long)]
    link: Option<String>,
    /// Author, if different from managing editor
    #[arg(short, long)]
    author: Option<String>,
    /// Category or tag for this post. Conventionally nested with '/', like
    /// 'tech/linux/admin'. You can also specify multiple, e.g.
    /// '-c health/fitness health/weight-loss'
    #[arg(short, long = "category", num_args = 1..)]
    categories: Vec<String>,
    /// Attach a file to this post. Requires ipfs installed in $PATH
    #[arg(short, long = "file")]
    files: Vec<PathBuf>,
    /// Attach a file specifying details directly instead of calling ipfs
    #[arg(
        short,
        long = "enclosure",
        num_args = 3,
        value_names = ["HASH", "LENGTH_IN_BYTES", "MIMETYPE"]
    )]
    enclosures: Vec<String>,
    /// Link to the feed this was forwarded from, if any
    #[arg(short, long)]
    source: Option<String>,
}

impl AddArgs {
    fn into_episode(self) -> eyre::Result<NewEpisode> {
        let enclosures = self
            .enclosures
            .chunks_exact(3)
            .map(|triple| {
                let len = triple[1].parse::<u64>().map_err(|err| {
                    eyre::eyre!("Invalid enclosure length `{}`: {err}", triple[1])
                })?;
                Ok(Enclosure::new(&triple[0], len, &triple[2]))
            })
            .collect::<eyre::Result<Vec<_>>>()?;

        Ok(NewEpisode {
            title: self.title,
            description: self.description,
            link: self.link,
            author: self.author,
            categories: self.categories,
            files: self.files,
            enclosures,
            source: self.source,
        })
    }
}

pub async fn run(args: AddArgs, settings: &Settings) -> eyre::Result<()> {
    let channel = Channel::open(&args.channel)
        .await
        .note("Can't open channel")?;
    let uploads = !args.files.is_empty();
    let episode = args.into_episode()?;
    let ipfs = settings.ipfs_cli();

    let episode = if uploads {
        long_task(
            "Uploading files...",
            channel.add_episode(episode, &ipfs),
            "Files uploaded",
        )
        .await
    } else {
        channel.add_episode(episode, &ipfs).await
    }
    .note("Failed to add episode")?;

    println!("{}", episode.hash());
    Ok(())
}
