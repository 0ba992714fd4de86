//! Controlador de ciclo de vida del bot.
//!
//! Una sesión por vez: `start()` valida, pasa a `Starting` y lanza la tarea
//! de fondo que carga extensiones, construye el cliente de Discord y corre su
//! gateway; el handler marca `Running` al recibir `ready`. Cualquier error
//! dentro de la tarea se captura en su borde exterior y colapsa el
//! controlador a `Stopped` — nunca queda en un estado ambiguo y nunca se
//! reintenta solo.

use parking_lot::RwLock;
use serenity::{
    all::{ChannelType, GatewayError, GatewayIntents, ShardManager},
    builder::CreateMessage,
    model::id::ChannelId,
    Client,
};
use std::fmt;
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::bot::{self, DashBot, Extensions};
use crate::config::Settings;
use crate::error::LifecycleError;
use crate::player::PlayerRegistry;
use crate::ui::embeds::EmbedSpec;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Stopped,
    Starting,
    Running,
    Stopping,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LifecycleState::Stopped => "stopped",
            LifecycleState::Starting => "starting",
            LifecycleState::Running => "running",
            LifecycleState::Stopping => "stopping",
        };
        f.write_str(label)
    }
}

/// Foto de solo lectura para el sondeo del panel (cada 2 s). CPU y RAM son
/// del colector de métricas del sistema, no de este controlador.
#[derive(Debug, Clone)]
pub struct StatusSnapshot {
    pub state: LifecycleState,
    pub latency: Option<Duration>,
    pub guilds: usize,
    pub users: u64,
    pub uptime: Option<Duration>,
}

impl fmt::Display for StatusSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "estado {}", self.state)?;
        match self.latency {
            Some(latency) => write!(f, " | ping {} ms", latency.as_millis())?,
            None => write!(f, " | ping —")?,
        }
        write!(f, " | {} servidores | {} usuarios", self.guilds, self.users)?;
        match self.uptime {
            Some(uptime) => {
                let rounded = Duration::from_secs(uptime.as_secs());
                write!(f, " | uptime {}", humantime::format_duration(rounded))
            }
            None => write!(f, " | uptime —"),
        }
    }
}

/// Estado compartido entre el controlador, la tarea de sesión y el handler.
struct Shared {
    state: RwLock<LifecycleState>,
    started_at: RwLock<Option<Instant>>,
}

impl Shared {
    fn collapse(&self) {
        *self.state.write() = LifecycleState::Stopped;
        *self.started_at.write() = None;
    }
}

/// Señales que el handler del gateway devuelve al controlador.
#[derive(Clone)]
pub struct SessionSignals {
    shared: Arc<Shared>,
}

impl SessionSignals {
    /// El transporte reportó login correcto: `Starting` → `Running`.
    /// Un `ready` repetido (reconexión) no reinicia el uptime.
    pub fn mark_running(&self) {
        let mut state = self.shared.state.write();
        if *state == LifecycleState::Starting {
            *state = LifecycleState::Running;
            *self.shared.started_at.write() = Some(Instant::now());
            info!("🟢 Bot en línea");
        }
    }
}

/// Handles vivos de la sesión en curso, publicados por la tarea de fondo.
struct SessionHandles {
    shard_manager: Arc<ShardManager>,
    cache: Arc<serenity::cache::Cache>,
    http: Arc<serenity::http::Http>,
    registry: Option<Arc<PlayerRegistry>>,
    shutdown: CancellationToken,
}

pub struct LifecycleController {
    settings: Settings,
    shared: Arc<Shared>,
    session: Arc<Mutex<Option<SessionHandles>>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl LifecycleController {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            shared: Arc::new(Shared {
                state: RwLock::new(LifecycleState::Stopped),
                started_at: RwLock::new(None),
            }),
            session: Arc::new(Mutex::new(None)),
            task: Mutex::new(None),
        }
    }

    pub fn state(&self) -> LifecycleState {
        *self.shared.state.read()
    }

    /// Arranca una sesión nueva. Solo válido desde `Stopped`; un token vacío
    /// falla rápido sin salir de `Stopped`.
    pub async fn start(&self) -> Result<(), LifecycleError> {
        {
            let mut state = self.shared.state.write();
            if *state != LifecycleState::Stopped {
                return Err(LifecycleError::AlreadyRunning);
            }
            if self.settings.token.trim().is_empty() {
                return Err(LifecycleError::MissingToken);
            }
            *state = LifecycleState::Starting;
        }

        info!("🤖 Iniciando sesión del bot `{}`...", self.settings.bot_name);

        let settings = self.settings.clone();
        let shared = Arc::clone(&self.shared);
        let session_slot = Arc::clone(&self.session);
        let task = tokio::spawn(async move {
            // borde exterior del contexto de fondo: todo error (pánicos
            // incluidos) acaba aquí, se registra y el controlador colapsa a
            // Stopped; el rearranque siempre es manual
            let session = tokio::spawn(run_session(
                settings,
                Arc::clone(&shared),
                Arc::clone(&session_slot),
            ));
            match session.await {
                Ok(Ok(())) => info!("🛑 Sesión del bot finalizada"),
                Ok(Err(LifecycleError::InvalidToken)) => {
                    error!("❌ Discord rechazó el token configurado");
                }
                Ok(Err(e)) => error!("❌ La sesión del bot terminó con error: {e}"),
                Err(panic) => error!("❌ El contexto de fondo del bot cayó: {panic}"),
            }
            session_slot.lock().await.take();
            shared.collapse();
        });
        *self.task.lock().await = Some(task);

        Ok(())
    }

    /// Detiene la sesión en curso y espera a que el contexto de fondo salga
    /// del todo. Idempotente desde `Stopped`.
    pub async fn stop(&self) -> Result<(), LifecycleError> {
        {
            let mut state = self.shared.state.write();
            match *state {
                LifecycleState::Stopped | LifecycleState::Stopping => return Ok(()),
                _ => *state = LifecycleState::Stopping,
            }
        }
        info!("🛑 Deteniendo el bot...");

        if let Some(session) = self.session.lock().await.take() {
            // mejor esfuerzo: desconectar voz y vaciar colas antes de cortar
            if let Some(registry) = &session.registry {
                registry.shutdown().await;
            }
            session.shutdown.cancel();
            session.shard_manager.shutdown_all().await;
        }
        match self.task.lock().await.take() {
            Some(task) => {
                let _ = task.await;
            }
            // sin tarea de fondo no hay nadie que colapse el estado
            None => self.shared.collapse(),
        }
        Ok(())
    }

    /// Superficie de observación: segura de sondear desde el primer plano.
    pub async fn status(&self) -> StatusSnapshot {
        let state = self.state();
        let uptime = self.shared.started_at.read().map(|started| started.elapsed());
        let mut snapshot = StatusSnapshot {
            state,
            latency: None,
            guilds: 0,
            users: 0,
            uptime,
        };

        if let Some(session) = self.session.lock().await.as_ref() {
            let runners = session.shard_manager.runners.lock().await;
            snapshot.latency = runners.values().find_map(|runner| runner.latency);
            drop(runners);

            snapshot.guilds = session.cache.guild_count();
            snapshot.users = session
                .cache
                .guilds()
                .into_iter()
                .filter_map(|guild_id| session.cache.guild(guild_id).map(|guild| guild.member_count))
                .sum();
        }

        snapshot
    }

    /// Acción "enviar embed" del panel: busca el canal por nombre entre las
    /// guilds conectadas y publica el embed construido.
    pub async fn send_embed(&self, spec: &EmbedSpec) -> Result<(), LifecycleError> {
        if self.state() != LifecycleState::Running {
            return Err(LifecycleError::NotRunning);
        }
        let session = self.session.lock().await;
        let session = session.as_ref().ok_or(LifecycleError::NotRunning)?;

        let channel = find_text_channel(&session.cache, &spec.channel)
            .ok_or_else(|| LifecycleError::ChannelNotFound(spec.channel.clone()))?;
        channel
            .send_message(&session.http, CreateMessage::new().embed(spec.build()))
            .await
            .map_err(|e| LifecycleError::Http(e.to_string()))?;
        info!("📨 Embed enviado a #{}", spec.channel);
        Ok(())
    }

    pub(crate) fn signals(&self) -> SessionSignals {
        SessionSignals {
            shared: Arc::clone(&self.shared),
        }
    }
}

/// Cuerpo de la sesión: extensiones en secuencia (fallo parcial permitido),
/// cliente de Discord con songbird y el event loop del gateway hasta que el
/// stop o un error lo corten.
async fn run_session(
    settings: Settings,
    shared: Arc<Shared>,
    session_slot: Arc<Mutex<Option<SessionHandles>>>,
) -> Result<(), LifecycleError> {
    let manager = songbird::Songbird::serenity();
    let extensions_slot: Arc<OnceLock<Arc<Extensions>>> = Arc::new(OnceLock::new());
    let signals = SessionSignals { shared };
    let handler = DashBot::new(settings.clone(), Arc::clone(&extensions_slot), signals);

    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MEMBERS
        | GatewayIntents::GUILD_VOICE_STATES
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let voice_manager: Arc<dyn serenity::gateway::VoiceGatewayManager> = manager.clone();
    let mut client = Client::builder(&settings.token, intents)
        .event_handler(handler)
        .voice_manager_arc(voice_manager)
        .await
        .map_err(|e| LifecycleError::StartupFailed(e.to_string()))?;

    let shutdown = CancellationToken::new();
    let (extensions, failures) =
        bot::load_extensions(&settings, manager, client.http.clone(), shutdown.clone()).await;
    for failure in &failures {
        error!("⚠️ {failure}");
    }
    let _ = extensions_slot.set(Arc::clone(&extensions));

    *session_slot.lock().await = Some(SessionHandles {
        shard_manager: Arc::clone(&client.shard_manager),
        cache: Arc::clone(&client.cache),
        http: Arc::clone(&client.http),
        registry: extensions.music.as_ref().map(|music| Arc::clone(&music.registry)),
        shutdown: shutdown.clone(),
    });

    info!("🚀 Conectando a Discord...");
    let result = client.start().await;
    shutdown.cancel();

    match result {
        Ok(()) => Ok(()),
        Err(serenity::Error::Gateway(GatewayError::InvalidAuthentication)) => {
            Err(LifecycleError::InvalidToken)
        }
        Err(e) => Err(LifecycleError::StartupFailed(e.to_string())),
    }
}

fn find_text_channel(cache: &serenity::cache::Cache, name: &str) -> Option<ChannelId> {
    let target = name.trim().trim_start_matches('#');
    for guild_id in cache.guilds() {
        let Some(guild) = cache.guild(guild_id) else {
            continue;
        };
        if let Some(channel) = guild
            .channels
            .values()
            .find(|channel| channel.kind == ChannelType::Text && channel.name == target)
        {
            return Some(channel.id);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn controller_with_token(token: &str) -> LifecycleController {
        let mut settings = Settings::default();
        settings.token = token.to_string();
        LifecycleController::new(settings)
    }

    #[tokio::test]
    async fn empty_token_never_leaves_stopped() {
        let controller = controller_with_token("   ");
        let result = controller.start().await;
        assert!(matches!(result, Err(LifecycleError::MissingToken)));
        assert_eq!(controller.state(), LifecycleState::Stopped);
    }

    #[tokio::test]
    async fn start_is_rejected_unless_stopped() {
        let controller = controller_with_token("token");
        *controller.shared.state.write() = LifecycleState::Running;
        assert!(matches!(
            controller.start().await,
            Err(LifecycleError::AlreadyRunning)
        ));
    }

    #[tokio::test]
    async fn stop_is_idempotent_from_stopped() {
        let controller = controller_with_token("token");
        controller.stop().await.unwrap();
        controller.stop().await.unwrap();
        assert_eq!(controller.state(), LifecycleState::Stopped);
    }

    #[tokio::test]
    async fn snapshot_defaults_while_stopped() {
        let controller = controller_with_token("token");
        let snapshot = controller.status().await;
        assert_eq!(snapshot.state, LifecycleState::Stopped);
        assert_eq!(snapshot.guilds, 0);
        assert_eq!(snapshot.users, 0);
        assert_eq!(snapshot.latency, None);
        assert_eq!(snapshot.uptime, None);
    }

    #[tokio::test]
    async fn ready_signal_moves_starting_to_running() {
        let controller = controller_with_token("token");
        *controller.shared.state.write() = LifecycleState::Starting;

        controller.signals().mark_running();

        assert_eq!(controller.state(), LifecycleState::Running);
        assert!(controller.status().await.uptime.is_some());
    }

    #[tokio::test]
    async fn ready_signal_is_ignored_outside_starting() {
        let controller = controller_with_token("token");
        controller.signals().mark_running();
        assert_eq!(controller.state(), LifecycleState::Stopped);
        assert_eq!(controller.status().await.uptime, None);
    }

    #[tokio::test]
    async fn send_embed_requires_a_running_session() {
        let controller = controller_with_token("token");
        let spec = EmbedSpec {
            title: "hola".into(),
            channel: "general".into(),
            ..Default::default()
        };
        assert!(matches!(
            controller.send_embed(&spec).await,
            Err(LifecycleError::NotRunning)
        ));
    }

    #[test]
    fn snapshot_display_is_log_friendly() {
        let snapshot = StatusSnapshot {
            state: LifecycleState::Running,
            latency: Some(Duration::from_millis(42)),
            guilds: 3,
            users: 1204,
            uptime: Some(Duration::from_secs(3725)),
        };
        let line = snapshot.to_string();
        assert!(line.contains("running"));
        assert!(line.contains("42 ms"));
        assert!(line.contains("3 servidores"));
        assert!(line.contains("1204 usuarios"));
    }
}
