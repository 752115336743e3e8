//! Metadata structures and utilities
//! This module provides the data structures for channel descriptors, episode records and their enclosures.

use std::path::Path;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use rand::RngCore;
use serde::{Deserialize, Deserializer, Serialize, de::DeserializeOwned};
use time::{
    OffsetDateTime, PrimitiveDateTime, format_description::well_known::Rfc2822,
    macros::format_description,
};

use crate::{
    media::FALLBACK_MIME_TYPE,
    utils::{read_to_string, write},
};

/// Language used when none is given at channel creation
pub const DEFAULT_LANGUAGE: &str = "en";
/// Managing editor used when none is given at channel creation
pub const DEFAULT_MANAGING_EDITOR: &str = "anonymous";
/// Copyright notice used when none is given at channel creation
pub const DEFAULT_COPYRIGHT: &str = "CC-BY 4.0 Intl.";
/// Recommended refresh interval, in seconds
pub const DEFAULT_TTL: u32 = 1800;

/// Metadata for a channel (your entire podcast)
///
/// It always locates in a `channel.json` file at the root of the channel directory.
/// ```plain
/// /my_show
///     channel.json  <--- Channel metadata file
///     episodes.json
///     feed_template.xml.tera
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelMetadata {
    title: String,
    description: String,
    link: String,
    copyright: String,
    language: String,
    managing_editor: String,
    ttl: u32,
    key: String,
}

impl ChannelMetadata {
    /// Create channel metadata from fully resolved fields
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        link: impl Into<String>,
        copyright: impl Into<String>,
        language: impl Into<String>,
        managing_editor: impl Into<String>,
        ttl: u32,
        key: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            link: link.into(),
            copyright: copyright.into(),
            language: language.into(),
            managing_editor: managing_editor.into(),
            ttl,
            key: key.into(),
        }
    }

    /// Get the title of the channel
    #[must_use]
    pub const fn title(&self) -> &str {
        self.title.as_str()
    }

    /// Get the description of the channel
    #[must_use]
    pub const fn description(&self) -> &str {
        self.description.as_str()
    }

    /// Get the home page link of the channel
    #[must_use]
    pub const fn link(&self) -> &str {
        self.link.as_str()
    }

    /// Get the copyright notice of the channel
    #[must_use]
    pub const fn copyright(&self) -> &str {
        self.copyright.as_str()
    }

    /// Get the language code of the channel
    #[must_use]
    pub const fn language(&self) -> &str {
        self.language.as_str()
    }

    /// Get the managing editor, the default author of new episodes
    #[must_use]
    pub const fn managing_editor(&self) -> &str {
        self.managing_editor.as_str()
    }

    /// Get the recommended refresh interval in seconds
    #[must_use]
    pub const fn ttl(&self) -> u32 {
        self.ttl
    }

    /// Get the publishing key identifier
    #[must_use]
    pub const fn key(&self) -> &str {
        self.key.as_str()
    }
}

/// A media file attached to an episode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enclosure {
    hash: String,
    #[serde(deserialize_with = "length_from_number_or_string")]
    len: u64,
    #[serde(rename = "type", deserialize_with = "mime_type_or_fallback")]
    mime_type: String,
}

impl Enclosure {
    /// Create an enclosure from a content identifier, byte length and MIME type
    pub fn new(hash: impl Into<String>, len: u64, mime_type: impl Into<String>) -> Self {
        Self {
            hash: hash.into(),
            len,
            mime_type: mime_type.into(),
        }
    }

    /// Get the content identifier
    #[must_use]
    pub const fn hash(&self) -> &str {
        self.hash.as_str()
    }

    /// Get the length in bytes
    #[must_use]
    pub const fn len(&self) -> u64 {
        self.len
    }

    /// Whether the attached file is empty
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Get the MIME type
    #[must_use]
    pub const fn mime_type(&self) -> &str {
        self.mime_type.as_str()
    }
}

// Hand-edited logs sometimes carry the length as a string of digits.
fn length_from_number_or_string<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Length {
        Number(u64),
        Text(String),
    }

    match Length::deserialize(deserializer)? {
        Length::Number(len) => Ok(len),
        Length::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}

// Older logs store `null` for files whose type could not be recognised.
fn mime_type_or_fallback<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?
        .unwrap_or_else(|| FALLBACK_MIME_TYPE.to_string()))
}

// RFC 2822, or the `Fri, 16 Oct 2026 12:00:00Z` form older logs were written with.
fn date_from_rfc2822_or_legacy<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    OffsetDateTime::parse(&text, &Rfc2822)
        .or_else(|_| {
            PrimitiveDateTime::parse(
                &text,
                format_description!(
                    "[weekday repr:short], [day] [month repr:short] [year] [hour]:[minute]:[second]Z"
                ),
            )
            .map(PrimitiveDateTime::assume_utc)
        })
        .map_err(|err| serde::de::Error::custom(format!("invalid date {text:?}: {err}")))
}

/// One episode record, stored as a single line of `episodes.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Episode {
    title: String,
    description: String,
    link: Option<String>,
    author: String,
    #[serde(default)]
    categories: Vec<String>,
    #[serde(
        serialize_with = "time::serde::rfc2822::serialize",
        deserialize_with = "date_from_rfc2822_or_legacy"
    )]
    date: OffsetDateTime,
    #[serde(default)]
    enclosures: Vec<Enclosure>,
    hash: String,
    source: Option<String>,
}

impl Episode {
    /// Create an episode dated now with a fresh random identifier
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        author: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            link: None,
            author: author.into(),
            categories: Vec::new(),
            date: now_utc_seconds(),
            enclosures: Vec::new(),
            hash: random_identifier(),
            source: None,
        }
    }

    /// Get the title of the episode
    #[must_use]
    pub const fn title(&self) -> &str {
        self.title.as_str()
    }

    /// Get the description of the episode
    #[must_use]
    pub const fn description(&self) -> &str {
        self.description.as_str()
    }

    /// Get the link to a copy of this episode, if any
    #[must_use]
    pub fn link(&self) -> Option<&str> {
        self.link.as_deref()
    }

    /// Set the link to a copy of this episode
    pub fn set_link(&mut self, link: impl Into<String>) {
        self.link = Some(link.into());
    }

    /// Get the author of the episode
    #[must_use]
    pub const fn author(&self) -> &str {
        self.author.as_str()
    }

    /// Get the categories of the episode, in the order they were given
    #[must_use]
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Add a category to the episode
    pub fn add_category(&mut self, category: impl Into<String>) {
        self.categories.push(category.into());
    }

    /// Get the publication date
    #[must_use]
    pub const fn date(&self) -> OffsetDateTime {
        self.date
    }

    /// Get the attached media
    #[must_use]
    pub fn enclosures(&self) -> &[Enclosure] {
        &self.enclosures
    }

    /// Attach a media file
    pub fn add_enclosure(&mut self, enclosure: Enclosure) {
        self.enclosures.push(enclosure);
    }

    /// Get the random identifier of the episode
    #[must_use]
    pub const fn hash(&self) -> &str {
        self.hash.as_str()
    }

    /// Get the link to the feed this episode was forwarded from, if any
    #[must_use]
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Set the link to the feed this episode was forwarded from
    pub fn set_source(&mut self, source: impl Into<String>) {
        self.source = Some(source.into());
    }
}

/// Current UTC time truncated to whole seconds, since RFC 2822 cannot carry fractions.
#[must_use]
pub fn now_utc_seconds() -> OffsetDateTime {
    let now = OffsetDateTime::now_utc();
    now.replace_nanosecond(0).unwrap_or(now)
}

/// 256 random bits, base64-encoded.
#[must_use]
pub fn random_identifier() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    STANDARD.encode(bytes)
}

/// Errors that can occur when opening metadata files
#[derive(Debug, thiserror::Error)]
pub enum FailToOpenMetadata {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// JSON parse error
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

/// Extension trait for metadata serialization and file operations
pub trait MetadataExt: Serialize + DeserializeOwned {
    /// Read and parse the metadata from a JSON file
    ///
    /// # Errors
    /// Returns `FailToOpenMetadata` if the file cannot be read or parsed
    fn open(
        path: impl AsRef<Path>,
    ) -> impl Future<Output = Result<Self, FailToOpenMetadata>> + Send + Sync {
        let path = path.as_ref().to_path_buf();
        async move {
            let content = read_to_string(&path).await?;
            let metadata = serde_json::from_str(&content)?;
            Ok(metadata)
        }
    }

    /// Export the metadata to a pretty JSON string
    ///
    /// # Errors
    /// Returns a `serde_json::Error` if serialization fails
    fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Save the metadata to a file at the given path
    /// # Errors
    /// Returns an `std::io::Error` if the file cannot be written
    fn save_to_file(
        &self,
        path: impl AsRef<Path>,
    ) -> impl Future<Output = Result<(), std::io::Error>> + Send + Sync {
        let path = path.as_ref().to_path_buf();
        let json = self.to_json().map_err(std::io::Error::other);
        async move { write(path, json?.as_bytes()).await }
    }
}

impl MetadataExt for ChannelMetadata {}
