use std::path::Path;

use tokio::{
    fs::{self as async_fs, OpenOptions},
    io::AsyncWriteExt,
};

pub async fn read_to_string(path: impl AsRef<Path>) -> std::io::Result<String> {
    async_fs::read_to_string(path).await
}

pub async fn write(path: impl AsRef<Path>, content: impl AsRef<[u8]>) -> std::io::Result<()> {
    async_fs::write(path, content).await
}

/// Append a single line to the file, creating it if needed. Earlier content is never touched.
pub async fn append_line(path: impl AsRef<Path>, line: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    let mut buf = Vec::with_capacity(line.len() + 1);
    buf.extend_from_slice(line.as_bytes());
    buf.push(b'\n');
    file.write_all(&buf).await?;
    file.flush().await
}

/// Title-case a channel name: underscores become spaces, each word gets an upper-case
/// first letter and lower-case remainder.
pub fn title_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut at_word_start = true;
    for ch in name.chars() {
        let ch = if ch == '_' { ' ' } else { ch };
        if ch.is_alphabetic() {
            if at_word_start {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(ch);
            at_word_start = true;
        }
    }
    out
}
