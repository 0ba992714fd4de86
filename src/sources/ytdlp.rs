use async_trait::async_trait;
use tokio::process::Command;
use tracing::{info, warn};
use url::Url;

use super::{TrackMetadata, TrackResolver};
use crate::error::ResolveError;

/// Campos pedidos a yt-dlp en una sola invocación. El título puede contener
/// `|`, así que va al final y el parseo usa `splitn`.
const PRINT_TEMPLATE: &str = "%(webpage_url)s|%(url)s|%(duration)s|%(uploader)s|%(thumbnail)s|%(title)s";

/// Resolver de tracks sobre el binario yt-dlp, con streaming directo.
pub struct YtDlpResolver;

impl YtDlpResolver {
    pub fn new() -> Self {
        Self
    }

    /// Verifica que yt-dlp y ffmpeg estén disponibles en el PATH.
    pub async fn verify_dependencies() -> Result<(), ResolveError> {
        for (binary, arg) in [("yt-dlp", "--version"), ("ffmpeg", "-version")] {
            let check = Command::new(binary).arg(arg).output().await;
            match check {
                Ok(output) if output.status.success() => {
                    if binary == "yt-dlp" {
                        let version = String::from_utf8_lossy(&output.stdout);
                        info!("✅ yt-dlp versión: {}", version.trim());
                    }
                }
                _ => {
                    return Err(ResolveError::Extractor(format!(
                        "`{binary}` no está disponible en el PATH"
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn is_url(reference: &str) -> bool {
        Url::parse(reference)
            .map(|url| matches!(url.scheme(), "http" | "https"))
            .unwrap_or(false)
    }

    /// Una URL pasa tal cual; todo lo demás es una búsqueda de un resultado.
    fn request_target(reference: &str) -> String {
        if Self::is_url(reference) {
            reference.to_string()
        } else {
            format!("ytsearch1:{reference}")
        }
    }

    fn parse_line(line: &str) -> Result<TrackMetadata, ResolveError> {
        let parts: Vec<&str> = line.splitn(6, '|').collect();
        if parts.len() != 6 {
            return Err(ResolveError::Metadata(line.to_string()));
        }

        // yt-dlp imprime "NA" para los campos que no conoce
        let duration_secs = parts[2]
            .parse::<f64>()
            .ok()
            .filter(|secs| *secs >= 0.0)
            .map(|secs| secs as u64)
            .unwrap_or(0);
        let thumbnail = (parts[4] != "NA" && !parts[4].is_empty()).then(|| parts[4].to_string());
        let uploader = if parts[3] == "NA" { "Unknown" } else { parts[3] };

        Ok(TrackMetadata {
            source_url: parts[0].to_string(),
            stream_url: parts[1].to_string(),
            duration_secs,
            uploader: uploader.to_string(),
            thumbnail,
            title: parts[5].to_string(),
        })
    }
}

#[async_trait]
impl TrackResolver for YtDlpResolver {
    async fn resolve(&self, reference: &str) -> Result<TrackMetadata, ResolveError> {
        let target = Self::request_target(reference);
        info!("🔍 Resolviendo: {}", target);

        let output = Command::new("yt-dlp")
            .args([
                "--print",
                PRINT_TEMPLATE,
                "--format",
                "bestaudio/best",
                "--default-search",
                "ytsearch",
                "--no-playlist",
                "--quiet",
                "--no-warnings",
                "--socket-timeout",
                "30",
                "--retries",
                "3",
            ])
            .arg(&target)
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!("❌ yt-dlp falló para `{}`: {}", reference, stderr.trim());
            return Err(ResolveError::Extractor(stderr.trim().to_string()));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let line = stdout
            .lines()
            .find(|line| !line.trim().is_empty())
            .ok_or_else(|| ResolveError::NoResults(reference.to_string()))?;

        Self::parse_line(line)
    }
}
