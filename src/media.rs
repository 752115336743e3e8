use std::path::Path;

use tokio::{fs as async_fs, io::AsyncReadExt};

use crate::{
    metadata::Enclosure,
    store::{ContentStore, StoreError},
};

/// MIME type recorded when the content is not recognized
pub const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

// Enough for every signature `infer` knows about.
const SNIFF_LEN: u64 = 8192;

#[derive(Debug, thiserror::Error)]
pub enum FailToAttachFile {
    #[error("Cannot read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Upload failed: {0}")]
    Store(#[from] StoreError),
}

/// Upload a local file and describe it as an enclosure.
///
/// The MIME type comes from the file's content, never from its name.
pub async fn attach_file<S: ContentStore>(
    store: &S,
    path: &Path,
) -> Result<Enclosure, FailToAttachFile> {
    let io_error = |source| FailToAttachFile::Io {
        path: path.display().to_string(),
        source,
    };

    let hash = store.upload(path).await?;
    let len = async_fs::metadata(path).await.map_err(io_error)?.len();
    let mime_type = sniff_mime_type(path).await.map_err(io_error)?;

    Ok(Enclosure::new(hash, len, mime_type))
}

pub async fn sniff_mime_type(path: &Path) -> std::io::Result<String> {
    let file = async_fs::File::open(path).await?;
    let mut head = Vec::new();
    file.take(SNIFF_LEN).read_to_end(&mut head).await?;
    Ok(mime_from_bytes(&head).to_string())
}

fn mime_from_bytes(bytes: &[u8]) -> &'static str {
    infer::get(bytes).map_or(FALLBACK_MIME_TYPE, |kind| kind.mime_type())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_common_podcast_media() {
        assert_eq!(mime_from_bytes(b"ID3\x04\x00\x00\x00\x00\x00\x00"), "audio/mpeg");
        assert_eq!(mime_from_bytes(b"GIF89a\x01\x00\x01\x00"), "image/gif");
    }

    #[test]
    fn unknown_content_falls_back() {
        assert_eq!(mime_from_bytes(b"just some text"), FALLBACK_MIME_TYPE);
        assert_eq!(mime_from_bytes(&[]), FALLBACK_MIME_TYPE);
    }

    #[tokio::test]
    async fn file_name_does_not_decide_the_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("episode.mp3");
        tokio::fs::write(&path, b"%PDF-1.5\n%rest").await.unwrap();
        assert_eq!(sniff_mime_type(&path).await.unwrap(), "application/pdf");
    }
}
