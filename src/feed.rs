use std::path::Path;

use serde::Serialize;
use tera::{Context, Tera};
use time::{OffsetDateTime, format_description::well_known::Rfc2822};

use crate::metadata::{ChannelMetadata, Episode};

/// Template shipped with every new channel
pub const DEFAULT_TEMPLATE: &str = include_str!("templates/feed_template.xml.tera");

// Registered under an `.xml` name so tera autoescapes it.
const TEMPLATE_NAME: &str = "feed.xml";

#[derive(Debug, Serialize)]
struct FeedContext<'a> {
    channel: &'a ChannelMetadata,
    episodes: &'a [Episode],
    now: String,
}

#[derive(Debug, thiserror::Error)]
pub enum FailToRenderTemplate {
    #[error("Cannot load feed template: {0}")]
    Load(#[source] tera::Error),
    #[error("Cannot render feed: {0}")]
    Render(#[source] tera::Error),
    #[error("Cannot format timestamp: {0}")]
    Timestamp(#[from] time::error::Format),
}

/// A feed template, ready to render.
#[derive(Debug)]
pub struct FeedTemplate {
    engine: Tera,
}

impl FeedTemplate {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, FailToRenderTemplate> {
        let mut engine = Self::engine();
        engine
            .add_template_file(path.as_ref(), Some(TEMPLATE_NAME))
            .map_err(FailToRenderTemplate::Load)?;
        Ok(Self { engine })
    }

    pub fn from_source(source: &str) -> Result<Self, FailToRenderTemplate> {
        let mut engine = Self::engine();
        engine
            .add_raw_template(TEMPLATE_NAME, source)
            .map_err(FailToRenderTemplate::Load)?;
        Ok(Self { engine })
    }

    fn engine() -> Tera {
        let mut engine = Tera::default();
        engine.autoescape_on(vec![".xml"]);
        engine.set_escape_fn(escape_xml);
        engine
    }

    /// Render the feed. The output depends only on the arguments.
    pub fn render(
        &self,
        channel: &ChannelMetadata,
        episodes: &[Episode],
        now: OffsetDateTime,
    ) -> Result<String, FailToRenderTemplate> {
        let context = FeedContext {
            channel,
            episodes,
            now: now.format(&Rfc2822)?,
        };
        let context = Context::from_serialize(context).map_err(FailToRenderTemplate::Render)?;
        self.engine
            .render(TEMPLATE_NAME, &context)
            .map_err(FailToRenderTemplate::Render)
    }
}

/// Escape text for XML content and attribute values.
///
/// Unlike HTML escaping, `/` is left alone so content identifiers and MIME types
/// survive unchanged.
pub fn escape_xml(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            '"' => output.push_str("&quot;"),
            '\'' => output.push_str("&apos;"),
            _ => output.push(ch),
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;
    use crate::metadata::{Enclosure, Episode};

    fn channel() -> ChannelMetadata {
        ChannelMetadata::new(
            "Demo & Friends",
            "A <b>demo</b>",
            "http://localhost:8080/ipns/k51",
            "CC-BY 4.0 Intl.",
            "en",
            "anonymous",
            1800,
            "k51",
        )
    }

    #[test]
    fn escapes_markup_but_not_slashes() {
        assert_eq!(
            escape_xml(r#"<a href="x">R&D's</a> audio/mpeg"#),
            "&lt;a href=&quot;x&quot;&gt;R&amp;D&apos;s&lt;/a&gt; audio/mpeg"
        );
    }

    #[test]
    fn default_template_renders_every_episode() {
        let mut first = Episode::new("CIRCLE", "CIRCLE", "anonymous");
        first.add_enclosure(Enclosure::new("ELLIPSE", 192, "application/x-helix"));
        let mut second = Episode::new("OVAL", "DISK", "SPHERE");
        second.set_link("POINT");
        second.add_category("tech/linux");

        let template = FeedTemplate::from_source(DEFAULT_TEMPLATE).unwrap();
        let feed = template
            .render(
                &channel(),
                &[first, second],
                datetime!(2026-10-16 12:00:00 UTC),
            )
            .unwrap();

        for needle in [
            "CIRCLE",
            "OVAL",
            "DISK",
            "SPHERE",
            "<link>POINT</link>",
            "ELLIPSE",
            r#"length="192""#,
            r#"type="application/x-helix""#,
            "<category>tech/linux</category>",
            "Fri, 16 Oct 2026 12:00:00 +0000",
        ] {
            assert!(feed.contains(needle), "feed lacks {needle}: {feed}");
        }
        assert!(feed.find("CIRCLE") < feed.find("OVAL"));
    }

    #[test]
    fn default_template_escapes_channel_fields() {
        let template = FeedTemplate::from_source(DEFAULT_TEMPLATE).unwrap();
        let feed = template
            .render(&channel(), &[], datetime!(2026-10-16 12:00:00 UTC))
            .unwrap();
        assert!(feed.contains("<title>Demo &amp; Friends</title>"));
        assert!(feed.contains("A &lt;b&gt;demo&lt;/b&gt;"));
        assert!(!feed.contains("<item>"));
    }

    #[test]
    fn enclosures_link_through_the_public_gateway() {
        let mut episode = Episode::new("Ep1", "First", "anonymous");
        episode.add_enclosure(Enclosure::new("QmAudio", 27, "audio/mpeg"));
        let feed = FeedTemplate::from_source(DEFAULT_TEMPLATE)
            .unwrap()
            .render(&channel(), &[episode], datetime!(2026-10-16 12:00:00 UTC))
            .unwrap();
        assert!(feed.contains(r#"url="https://ipfs.io/ipfs/QmAudio""#), "{feed}");
        assert!(!feed.contains("localhost"));
    }

    #[test]
    fn default_template_is_substantial() {
        assert!(DEFAULT_TEMPLATE.len() > 1000);
    }
}
