use thiserror::Error;

/// Errores de las operaciones de reproducción por guild.
#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("user is not connected to a voice channel")]
    NoVoiceChannel,

    #[error("the bot is not connected to a voice channel")]
    NotConnected,

    #[error("volume {0} is outside the 0-100 range")]
    VolumeOutOfRange(i64),

    #[error("nothing is playing right now")]
    NothingPlaying,

    #[error("playback is not paused")]
    NotPaused,

    #[error("could not join the voice channel: {0}")]
    Connection(String),

    #[error(transparent)]
    Resolution(#[from] ResolveError),

    #[error("audio playback failed: {0}")]
    Playback(String),
}

/// Fallos del resolver de tracks. Siempre valores, nunca panics: la cola
/// los consume y sigue con la siguiente entrada.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no results for `{0}`")]
    NoResults(String),

    #[error("could not spawn yt-dlp: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("yt-dlp failed: {0}")]
    Extractor(String),

    #[error("unexpected yt-dlp output: {0}")]
    Metadata(String),
}

/// Errores del controlador de ciclo de vida del bot.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("bot token is not configured")]
    MissingToken,

    #[error("the bot is already running")]
    AlreadyRunning,

    #[error("the bot is not running")]
    NotRunning,

    #[error("Discord rejected the configured token")]
    InvalidToken,

    #[error("startup failed: {0}")]
    StartupFailed(String),

    #[error("no text channel named `{0}` was found")]
    ChannelNotFound(String),

    #[error("Discord request failed: {0}")]
    Http(String),
}

/// Carga parcial de extensiones: se reporta y el arranque continúa.
#[derive(Debug, Error)]
#[error("extension `{name}` failed to load: {reason}")]
pub struct ExtensionLoadFailed {
    pub name: &'static str,
    pub reason: String,
}
