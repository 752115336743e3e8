use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs::{self as async_fs, create_dir};
use tracing::{debug, info};

use crate::{
    config::Settings,
    episodes::{EpisodeLog, FailToAppendEpisode, FailToReadEpisodes},
    feed::{DEFAULT_TEMPLATE, FailToRenderTemplate, FeedTemplate},
    media::{FailToAttachFile, attach_file},
    metadata::{
        ChannelMetadata, DEFAULT_COPYRIGHT, DEFAULT_LANGUAGE, DEFAULT_MANAGING_EDITOR,
        DEFAULT_TTL, Enclosure, Episode, FailToOpenMetadata, MetadataExt, now_utc_seconds,
    },
    store::{ContentId, ContentStore, KeyStore, StoreError},
    utils::{title_case, write},
};

pub const CHANNEL_FILE: &str = "channel.json";
pub const EPISODES_FILE: &str = "episodes.json";
pub const TEMPLATE_FILE: &str = "feed_template.xml.tera";
pub const FEED_FILE: &str = "latest_feed.xml";

/// structure of a channel is as follows:
/// ```text
/// /my_show
/// ├── channel.json            metadata, written once by `new`
/// ├── episodes.json           one episode per line, append-only
/// ├── feed_template.xml.tera  template for the feed
/// └── latest_feed.xml         last rendered feed
/// ```
#[derive(Debug, Clone)]
pub struct Channel {
    path: PathBuf,
    metadata: ChannelMetadata,
}

/// Everything needed to create a channel. Unset fields fall back to defaults.
#[derive(Debug, Clone, Default)]
pub struct NewChannel {
    /// Directory to create; its final component also names the publishing key
    pub path: PathBuf,
    pub title: Option<String>,
    pub description: Option<String>,
    pub link: Option<String>,
    pub copyright: Option<String>,
    pub language: Option<String>,
    pub managing_editor: Option<String>,
    pub ttl: Option<u32>,
    /// Existing key to publish with instead of generating one
    pub key: Option<String>,
}

/// Everything needed to append an episode.
#[derive(Debug, Clone, Default)]
pub struct NewEpisode {
    pub title: String,
    pub description: Option<String>,
    pub link: Option<String>,
    pub author: Option<String>,
    pub categories: Vec<String>,
    /// Local files to upload, in order
    pub files: Vec<PathBuf>,
    /// Enclosures that are already on the network, in order
    pub enclosures: Vec<Enclosure>,
    pub source: Option<String>,
}

/// Result of a publish run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Publication {
    /// Where the rendered feed was written
    pub feed: PathBuf,
    /// Content identifier of the feed, when it was uploaded
    pub content: Option<ContentId>,
}

#[derive(Debug, Error)]
pub enum FailToCreateChannel {
    #[error("Channel name must end in a directory name")]
    InvalidName,
    #[error("{} already exists", .0.display())]
    AlreadyExists(PathBuf),
    #[error("Cannot generate publishing key: {0}")]
    Key(#[from] StoreError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum FailToOpenChannel {
    #[error("{} is not a channel directory (no readable channel.json)", .0.display())]
    NotFound(PathBuf),
    #[error("Invalid channel.json: {0}")]
    Metadata(#[from] FailToOpenMetadata),
}

#[derive(Debug, Error)]
pub enum FailToAddEpisode {
    #[error("Cannot attach file: {0}")]
    Attach(#[from] FailToAttachFile),
    #[error("{0}")]
    Append(#[from] FailToAppendEpisode),
}

#[derive(Debug, Error)]
pub enum FailToPublish {
    #[error("{0}")]
    Episodes(#[from] FailToReadEpisodes),
    #[error("{0}")]
    Template(#[from] FailToRenderTemplate),
    #[error("Cannot write feed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Cannot publish feed: {0}")]
    Store(#[from] StoreError),
}

impl NewChannel {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Fill every unset field with its default.
    fn resolve(self, name: &str, key: String, settings: &Settings) -> ChannelMetadata {
        let title = self.title.unwrap_or_else(|| title_case(name));
        let description = self.description.unwrap_or_else(|| title.clone());
        let link = self.link.unwrap_or_else(|| settings.ipns_link(&key));
        ChannelMetadata::new(
            title,
            description,
            link,
            self.copyright
                .unwrap_or_else(|| DEFAULT_COPYRIGHT.to_string()),
            self.language
                .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
            self.managing_editor
                .unwrap_or_else(|| DEFAULT_MANAGING_EDITOR.to_string()),
            self.ttl.unwrap_or(DEFAULT_TTL),
            key,
        )
    }
}

impl NewEpisode {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Build the record. Explicit enclosures come before uploaded ones.
    fn resolve(self, channel: &ChannelMetadata, uploaded: Vec<Enclosure>) -> Episode {
        let description = self.description.unwrap_or_else(|| self.title.clone());
        let author = self
            .author
            .unwrap_or_else(|| channel.managing_editor().to_string());
        let mut episode = Episode::new(self.title, description, author);
        if let Some(link) = self.link {
            episode.set_link(link);
        }
        if let Some(source) = self.source {
            episode.set_source(source);
        }
        for category in self.categories {
            episode.add_category(category);
        }
        for enclosure in self.enclosures.into_iter().chain(uploaded) {
            episode.add_enclosure(enclosure);
        }
        episode
    }
}

impl Channel {
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, FailToOpenChannel> {
        let path = path.as_ref();
        let metadata_path = path.join(CHANNEL_FILE);
        if async_fs::metadata(&metadata_path).await.is_err() {
            return Err(FailToOpenChannel::NotFound(path.to_path_buf()));
        }
        let metadata = ChannelMetadata::open(metadata_path).await?;
        Ok(Self::new(path, metadata))
    }

    pub fn new(path: impl AsRef<Path>, metadata: ChannelMetadata) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            metadata,
        }
    }

    /// Create a channel directory with its metadata, template and an empty episode log.
    ///
    /// Never touches an existing directory. A key is generated through `keys` unless
    /// one was given.
    pub async fn create<K: KeyStore>(
        options: NewChannel,
        keys: &K,
        settings: &Settings,
    ) -> Result<Self, FailToCreateChannel> {
        let root = std::path::absolute(&options.path)?;
        let name = root
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or(FailToCreateChannel::InvalidName)?
            .to_string();

        create_dir(&root).await.map_err(|err| {
            if err.kind() == std::io::ErrorKind::AlreadyExists {
                FailToCreateChannel::AlreadyExists(root.clone())
            } else {
                err.into()
            }
        })?;

        let key = match options.key.clone() {
            Some(key) => key,
            None => {
                debug!(%name, "generating publishing key");
                keys.generate_key(&name).await?.into()
            }
        };

        let metadata = options.resolve(&name, key, settings);
        info!(
            title = metadata.title(),
            path = %root.display(),
            key = metadata.key(),
            link = metadata.link(),
            language = metadata.language(),
            managing_editor = metadata.managing_editor(),
            ttl = metadata.ttl(),
            "Generating a new channel"
        );

        metadata.save_to_file(root.join(CHANNEL_FILE)).await?;
        write(root.join(TEMPLATE_FILE), DEFAULT_TEMPLATE).await?;
        write(root.join(EPISODES_FILE), b"").await?;

        Ok(Self::new(root, metadata))
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub const fn metadata(&self) -> &ChannelMetadata {
        &self.metadata
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.root().join(CHANNEL_FILE)
    }

    pub fn template_path(&self) -> PathBuf {
        self.root().join(TEMPLATE_FILE)
    }

    pub fn feed_path(&self) -> PathBuf {
        self.root().join(FEED_FILE)
    }

    pub fn episode_log(&self) -> EpisodeLog {
        EpisodeLog::new(self.root().join(EPISODES_FILE))
    }

    /// Upload any files, then append the episode to the log.
    pub async fn add_episode<S: ContentStore>(
        &self,
        options: NewEpisode,
        store: &S,
    ) -> Result<Episode, FailToAddEpisode> {
        let mut uploaded = Vec::with_capacity(options.files.len());
        for file in &options.files {
            let enclosure = attach_file(store, file).await?;
            debug!(
                file = %file.display(),
                hash = enclosure.hash(),
                len = enclosure.len(),
                mime_type = enclosure.mime_type(),
                "file uploaded"
            );
            uploaded.push(enclosure);
        }

        let episode = options.resolve(&self.metadata, uploaded);
        self.episode_log().append(&episode).await?;
        info!(title = episode.title(), hash = episode.hash(), "Episode added");
        Ok(episode)
    }

    /// Every episode, oldest first.
    pub async fn episodes(&self) -> Result<Vec<Episode>, FailToReadEpisodes> {
        self.episode_log().read_all().await
    }

    /// Render the channel's template into `latest_feed.xml` and return the path.
    pub async fn render_feed(&self) -> Result<PathBuf, FailToPublish> {
        let episodes = self.episodes().await?;
        let template = FeedTemplate::from_file(self.template_path())?;
        let feed = template.render(&self.metadata, &episodes, now_utc_seconds())?;

        let feed_path = self.feed_path();
        write(&feed_path, feed.as_bytes()).await?;
        info!(
            episodes = episodes.len(),
            path = %feed_path.display(),
            "Feed rendered"
        );
        Ok(feed_path)
    }

    /// Render the feed and, unless `dry_run`, upload it and point the channel's name at it.
    pub async fn publish<S: ContentStore>(
        &self,
        store: &S,
        dry_run: bool,
    ) -> Result<Publication, FailToPublish> {
        let feed = self.render_feed().await?;
        if dry_run {
            return Ok(Publication {
                feed,
                content: None,
            });
        }

        let content = store.upload(&feed).await?;
        store.publish(self.metadata.key(), &content).await?;
        info!(key = self.metadata.key(), %content, "Feed published");
        Ok(Publication {
            feed,
            content: Some(content),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> ChannelMetadata {
        ChannelMetadata::new("Demo", "Demo", "link", "c", "en", "editor", 1800, "k51")
    }

    #[test]
    fn channel_defaults() {
        let resolved = NewChannel::new("my_show").resolve(
            "my_show",
            "k51".to_string(),
            &Settings::default(),
        );
        assert_eq!(resolved.title(), "My Show");
        assert_eq!(resolved.description(), "My Show");
        assert_eq!(resolved.link(), "http://localhost:8080/ipns/k51");
        assert_eq!(resolved.copyright(), "CC-BY 4.0 Intl.");
        assert_eq!(resolved.language(), "en");
        assert_eq!(resolved.managing_editor(), "anonymous");
        assert_eq!(resolved.ttl(), 1800);
        assert_eq!(resolved.key(), "k51");
    }

    #[test]
    fn description_follows_explicit_title() {
        let options = NewChannel {
            title: Some("Late Night Rust".to_string()),
            ..NewChannel::new("lnr")
        };
        let resolved = options.resolve("lnr", "k51".to_string(), &Settings::default());
        assert_eq!(resolved.description(), "Late Night Rust");
    }

    #[test]
    fn episode_falls_back_to_title_and_editor() {
        let episode = NewEpisode::new("Ep1").resolve(&metadata(), Vec::new());
        assert_eq!(episode.description(), "Ep1");
        assert_eq!(episode.author(), "editor");
        assert_eq!(episode.link(), None);
        assert_eq!(episode.source(), None);
    }

    #[test]
    fn explicit_enclosures_precede_uploaded_ones() {
        let options = NewEpisode {
            enclosures: vec![
                Enclosure::new("first", 1, "audio/mpeg"),
                Enclosure::new("second", 2, "audio/ogg"),
            ],
            ..NewEpisode::new("Ep")
        };
        let episode = options.resolve(
            &metadata(),
            vec![Enclosure::new("uploaded", 3, "video/mp4")],
        );
        let hashes: Vec<_> = episode.enclosures().iter().map(Enclosure::hash).collect();
        assert_eq!(hashes, ["first", "second", "uploaded"]);
    }

    #[test]
    fn categories_keep_their_order() {
        let options = NewEpisode {
            categories: vec!["health/fitness".to_string(), "health/weight-loss".to_string()],
            ..NewEpisode::new("Ep")
        };
        let episode = options.resolve(&metadata(), Vec::new());
        assert_eq!(episode.categories(), ["health/fitness", "health/weight-loss"]);
    }
}
