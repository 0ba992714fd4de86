pub mod ytdlp;

use async_trait::async_trait;

use crate::error::ResolveError;

pub use ytdlp::YtDlpResolver;

/// Metadatos de un track ya resuelto. Inmutables una vez creados; cada
/// entrada de la cola que los contiene es su única dueña.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackMetadata {
    pub title: String,
    /// URL canónica de la página del track (la que se re-resuelve en loop).
    pub source_url: String,
    /// Localizador directo del stream de audio, listo para reproducir.
    pub stream_url: String,
    /// 0 si la fuente no conoce la duración (streams en vivo).
    pub duration_secs: u64,
    pub uploader: String,
    pub thumbnail: Option<String>,
}

/// Convierte una referencia (búsqueda o URL) en metadatos reproducibles.
/// Los fallos son valores: la cola los reporta y avanza.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TrackResolver: Send + Sync {
    async fn resolve(&self, reference: &str) -> Result<TrackMetadata, ResolveError>;
}
