//! Handler del gateway y carga de extensiones.
//!
//! Las extensiones (música, administración) se cargan en secuencia al abrir
//! la sesión; el fallo de una se reporta y no impide cargar las demás. Los
//! comandos llegan como mensajes con prefijo y se despachan por tabla.

pub mod admin;
pub mod commands;
pub mod embed_builder;
pub mod music;
pub mod util;

use serenity::{
    all::{ActivityData, Context, EventHandler, Message, OnlineStatus, Ready, VoiceState},
    async_trait,
    builder::CreateMessage,
};
use songbird::Songbird;
use std::sync::{Arc, OnceLock};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::{PresenceMode, Settings};
use crate::error::ExtensionLoadFailed;
use crate::lifecycle::SessionSignals;
use crate::locale::Lang;
use crate::player::{PlayerRegistry, SongbirdBackend};
use crate::sources::YtDlpResolver;
use crate::ui::embeds;

/// Extensión de música: registro de reproducción por guild más su driver de
/// eventos de fin de track.
pub struct MusicExtension {
    pub registry: Arc<PlayerRegistry>,
}

impl MusicExtension {
    async fn load(
        settings: &Settings,
        manager: Arc<Songbird>,
        http: Arc<serenity::http::Http>,
        shutdown: CancellationToken,
    ) -> Result<Self, String> {
        // sin yt-dlp/ffmpeg no hay música; el resto del bot arranca igual
        YtDlpResolver::verify_dependencies()
            .await
            .map_err(|e| e.to_string())?;

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let backend = Arc::new(SongbirdBackend::new(manager, events_tx));
        let notifier = Arc::new(music::ChannelNotifier::new(http, settings.lang));
        let registry = Arc::new(PlayerRegistry::new(
            Arc::new(YtDlpResolver::new()),
            backend,
            notifier,
        ));
        registry.spawn_event_driver(events_rx, shutdown);

        Ok(Self { registry })
    }
}

/// Moderación, utilidades y constructor de embeds. Sin estado propio.
pub struct AdminExtension;

impl AdminExtension {
    fn load() -> Result<Self, String> {
        Ok(Self)
    }
}

pub struct Extensions {
    pub music: Option<MusicExtension>,
    pub admin: Option<AdminExtension>,
}

fn record_load<T>(
    name: &'static str,
    result: Result<T, String>,
    failures: &mut Vec<ExtensionLoadFailed>,
) -> Option<T> {
    match result {
        Ok(extension) => {
            info!("📦 Extensión `{name}` cargada");
            Some(extension)
        }
        Err(reason) => {
            warn!("⚠️ Extensión `{name}` no cargada: {reason}");
            failures.push(ExtensionLoadFailed { name, reason });
            None
        }
    }
}

/// Carga el conjunto declarado en secuencia, con semántica de fallo parcial.
pub async fn load_extensions(
    settings: &Settings,
    manager: Arc<Songbird>,
    http: Arc<serenity::http::Http>,
    shutdown: CancellationToken,
) -> (Arc<Extensions>, Vec<ExtensionLoadFailed>) {
    let mut failures = Vec::new();

    let music = record_load(
        "music",
        MusicExtension::load(settings, manager, http, shutdown).await,
        &mut failures,
    );
    let admin = record_load("admin", AdminExtension::load(), &mut failures);

    (Arc::new(Extensions { music, admin }), failures)
}

/// Handler principal del gateway: presencia al conectar, comandos con
/// prefijo y limpieza tras expulsiones del canal de voz.
pub struct DashBot {
    pub(crate) settings: Settings,
    extensions: Arc<OnceLock<Arc<Extensions>>>,
    signals: SessionSignals,
}

impl DashBot {
    pub fn new(
        settings: Settings,
        extensions: Arc<OnceLock<Arc<Extensions>>>,
        signals: SessionSignals,
    ) -> Self {
        Self {
            settings,
            extensions,
            signals,
        }
    }

    pub(crate) fn lang(&self) -> Lang {
        self.settings.lang
    }

    fn presence(&self) -> (ActivityData, OnlineStatus) {
        let status = match self.settings.status {
            PresenceMode::Online => OnlineStatus::Online,
            PresenceMode::Idle => OnlineStatus::Idle,
            PresenceMode::Dnd => OnlineStatus::DoNotDisturb,
        };
        (ActivityData::playing(self.settings.activity_text()), status)
    }
}

#[async_trait]
impl EventHandler for DashBot {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!(
            "🤖 {} está en línea! ({} servidores)",
            ready.user.name,
            ready.guilds.len()
        );
        let (activity, status) = self.presence();
        ctx.set_presence(Some(activity), status);
        self.signals.mark_running();
    }

    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        }
        let Some(guild_id) = msg.guild_id else {
            return;
        };
        let Some((name, args)) = commands::parse(&msg.content, &self.settings.prefix) else {
            return;
        };
        // extensiones aún cargando: el comando se ignora
        let Some(extensions) = self.extensions.get().cloned() else {
            return;
        };
        let Some(command) = commands::lookup(name) else {
            debug!("Comando desconocido `{name}` ignorado");
            return;
        };

        let result =
            commands::dispatch(self, &ctx, &msg, guild_id, &extensions, command, args).await;
        if let Err(e) = result {
            warn!("[cmd:{name}] {e}");
            let embed = embeds::error(self.lang(), "footer_admin", &e.to_string());
            if let Err(send_err) = msg
                .channel_id
                .send_message(&ctx.http, CreateMessage::new().embed(embed))
                .await
            {
                error!("No se pudo reportar el error del comando: {send_err}");
            }
        }
    }

    async fn voice_state_update(&self, ctx: Context, old: Option<VoiceState>, new: VoiceState) {
        // solo interesa la desconexión forzada del propio bot
        let current_user = ctx.cache.current_user().id;
        if new.user_id != current_user || old.is_none() || new.channel_id.is_some() {
            return;
        }
        let Some(guild_id) = new.guild_id else {
            return;
        };
        let Some(extensions) = self.extensions.get() else {
            return;
        };
        if let Some(music) = &extensions.music {
            info!("🔌 Bot desconectado del canal de voz en guild {guild_id}");
            music.registry.handle_forced_disconnect(guild_id).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn one_failing_extension_does_not_block_the_rest() {
        let mut failures = Vec::new();

        let music: Option<AdminExtension> =
            record_load("music", Err("yt-dlp missing".to_string()), &mut failures);
        let admin = record_load("admin", AdminExtension::load(), &mut failures);

        assert!(music.is_none());
        assert!(admin.is_some());
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].name, "music");
        assert!(failures[0].to_string().contains("yt-dlp missing"));
    }
}
