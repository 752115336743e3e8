//! The append-only episode log.
//!
//! Each line of `episodes.json` holds one [`Episode`] as single-line JSON, oldest first,
//! written as `{"title": "Ep1", "description": "First", ...}`.

use std::{
    io,
    path::{Path, PathBuf},
};

use serde::Serialize;
use serde_json::ser::Formatter;
use thiserror::Error;
use tracing::debug;

use crate::{
    metadata::Episode,
    utils::{append_line, read_to_string},
};

#[derive(Debug, Error)]
pub enum FailToReadEpisodes {
    #[error("Cannot read episode log {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Malformed episode on line {line} of {}: {source}", path.display())]
    Malformed {
        path: PathBuf,
        line: usize,
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum FailToAppendEpisode {
    #[error("Cannot serialize episode: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Cannot append to episode log: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct EpisodeLog {
    path: PathBuf,
}

impl EpisodeLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one episode as a new line. Existing lines are left untouched.
    pub async fn append(&self, episode: &Episode) -> Result<(), FailToAppendEpisode> {
        let line = to_log_line(episode)?;
        append_line(&self.path, &line).await?;
        debug!(path = %self.path.display(), "episode appended");
        Ok(())
    }

    /// Read every episode in file order.
    pub async fn read_all(&self) -> Result<Vec<Episode>, FailToReadEpisodes> {
        let content = read_to_string(&self.path)
            .await
            .map_err(|source| FailToReadEpisodes::Io {
                path: self.path.clone(),
                source,
            })?;
        parse_log(&content).map_err(|(line, source)| FailToReadEpisodes::Malformed {
            path: self.path.clone(),
            line,
            source,
        })
    }
}

/// Single-line JSON with a space after every `:` and `,`.
#[derive(Debug, Clone, Copy, Default)]
struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }
}

fn to_log_line(episode: &Episode) -> Result<String, serde_json::Error> {
    let mut line = Vec::new();
    episode.serialize(&mut serde_json::Serializer::with_formatter(
        &mut line,
        SpacedFormatter,
    ))?;
    Ok(String::from_utf8_lossy(&line).into_owned())
}

// Blank lines are skipped; anything else must be a complete episode.
fn parse_log(content: &str) -> Result<Vec<Episode>, (usize, serde_json::Error)> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| serde_json::from_str(line).map_err(|err| (index + 1, err)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINE: &str = r#"{"title":"Ep1","description":"First","link":null,"author":"anonymous","categories":[],"date":"Fri, 16 Oct 2026 12:00:00 +0000","enclosures":[],"hash":"abc=","source":null}"#;

    // As older releases wrote it: zulu date, string length, unknown type.
    const LEGACY_LINE: &str = r#"{"title": "Ep1", "description": "First", "link": null, "author": "anonymous", "categories": [], "date": "Fri, 16 Oct 2026 12:00:00Z", "enclosures": [{"hash": "QmX", "len": "27", "type": null}], "hash": "abc=", "source": null}"#;

    #[test]
    fn legacy_lines_are_readable() {
        let episodes = parse_log(&format!("{LEGACY_LINE}\n{LINE}\n")).unwrap();
        assert_eq!(episodes.len(), 2);
        assert_eq!(episodes[0].date(), episodes[1].date());
        let enclosure = &episodes[0].enclosures()[0];
        assert_eq!(enclosure.len(), 27);
        assert_eq!(enclosure.mime_type(), "application/octet-stream");
    }

    #[test]
    fn log_lines_space_their_separators() {
        let mut episode = Episode::new("Ep1", "First", "anonymous");
        episode.add_category("tech/linux");
        episode.add_category("tech/admin");
        let line = to_log_line(&episode).unwrap();
        assert!(line.starts_with(r#"{"title": "Ep1", "description": "First", "link": null"#));
        assert!(line.contains(r#""categories": ["tech/linux", "tech/admin"]"#));
        assert!(!line.contains('\n'));
        assert_eq!(serde_json::from_str::<Episode>(&line).unwrap(), episode);
    }

    #[test]
    fn empty_log_has_no_episodes() {
        assert!(parse_log("").unwrap().is_empty());
    }

    #[test]
    fn blank_lines_are_skipped() {
        let content = format!("{LINE}\n\n   \n{LINE}\n");
        assert_eq!(parse_log(&content).unwrap().len(), 2);
    }

    #[test]
    fn malformed_line_reports_its_number() {
        let content = format!("{LINE}\n{{not json\n{LINE}\n");
        let (line, _) = parse_log(&content).unwrap_err();
        assert_eq!(line, 2);
    }

    #[test]
    fn missing_required_field_is_malformed() {
        let (line, _) = parse_log(r#"{"title":"only a title"}"#).unwrap_err();
        assert_eq!(line, 1);
    }

    #[tokio::test]
    async fn appends_are_read_back_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let log = EpisodeLog::new(dir.path().join("episodes.json"));
        for title in ["one", "two", "three"] {
            log.append(&Episode::new(title, title, "me")).await.unwrap();
        }
        let titles: Vec<_> = log
            .read_all()
            .await
            .unwrap()
            .iter()
            .map(|episode| episode.title().to_string())
            .collect();
        assert_eq!(titles, ["one", "two", "three"]);
    }

    #[tokio::test]
    async fn missing_log_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let log = EpisodeLog::new(dir.path().join("episodes.json"));
        assert!(matches!(
            log.read_all().await,
            Err(FailToReadEpisodes::Io { .. })
        ));
    }
}
