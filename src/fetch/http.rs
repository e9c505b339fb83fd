//! HTTP media source over a shared blocking agent.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use super::MediaSource;
use crate::types::{MediaFormat, StagedMedia};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const READ_TIMEOUT: Duration = Duration::from_secs(60);
const WRITE_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_MEDIA_BYTES: usize = 256 * 1024 * 1024;

/// Shared HTTP agent with consistent timeouts.
fn agent() -> &'static ureq::Agent {
    static AGENT: OnceLock<ureq::Agent> = OnceLock::new();
    AGENT.get_or_init(|| {
        ureq::AgentBuilder::new()
            .timeout_connect(CONNECT_TIMEOUT)
            .timeout_read(READ_TIMEOUT)
            .timeout_write(WRITE_TIMEOUT)
            .build()
    })
}

/// Fetches best-available audio for a source id from a catalog media
/// endpoint of the form `<base>/<id>?quality=bestaudio`.
pub struct HttpMediaSource {
    base_url: String,
}

impl HttpMediaSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { base_url }
    }

    fn media_url(&self, source_id: &str) -> String {
        format!("{}/{}?quality=bestaudio", self.base_url, source_id)
    }
}

impl MediaSource for HttpMediaSource {
    fn fetch_audio(&self, source_id: &str, staging_dir: &Path) -> Result<StagedMedia> {
        let url = self.media_url(source_id);
        let response = agent()
            .get(&url)
            .call()
            .with_context(|| format!("Failed to fetch {url}"))?;
        if response.status() >= 400 {
            bail!("Failed to fetch {url}: HTTP {}", response.status());
        }

        let extension = extension_for(response.header("Content-Type"), &url);
        let path = staging_dir.join(format!("{source_id}.{extension}"));
        let mut file = File::create(&path)
            .with_context(|| format!("Failed to create staged file {:?}", path))?;
        copy_response_to_writer(response, &mut file, MAX_MEDIA_BYTES)
            .with_context(|| format!("Failed to write staged file {:?}", path))?;
        file.flush()
            .with_context(|| format!("Failed to flush staged file {:?}", path))?;

        Ok(StagedMedia {
            format: MediaFormat::from_extension(&extension),
            path,
        })
    }
}

/// Pick the staged file extension from the Content-Type header, falling
/// back to the URL path and finally to an opaque `bin`.
fn extension_for(content_type: Option<&str>, url: &str) -> String {
    if let Some(raw) = content_type {
        let media_type = raw.split(';').next().unwrap_or("").trim();
        match media_type {
            "audio/mp4" | "audio/x-m4a" | "video/mp4" => return "m4a".to_string(),
            "audio/opus" | "audio/ogg" => return "opus".to_string(),
            "audio/webm" | "video/webm" => return "webm".to_string(),
            _ => {}
        }
    }
    url_extension(url).unwrap_or_else(|| "bin".to_string())
}

fn url_extension(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next()?;
    let name = path.rsplit('/').next()?;
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Stream a response to the writer, enforcing a maximum byte size.
fn copy_response_to_writer(
    response: ureq::Response,
    writer: &mut impl Write,
    max_bytes: usize,
) -> Result<()> {
    let reader = response.into_reader();
    let mut limited = reader.take(max_bytes as u64 + 1);
    let mut total = 0usize;
    let mut buf = [0u8; 64 * 1024];
    loop {
        let read = limited.read(&mut buf)?;
        if read == 0 {
            break;
        }
        total += read;
        if total > max_bytes {
            bail!("Response exceeded {max_bytes} bytes");
        }
        writer.write_all(&buf[..read])?;
    }
    Ok(())
}
