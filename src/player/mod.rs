//! Cola de reproducción por guild.
//!
//! El registro es un mapa explícito guild → estado con get-or-create, y la
//! continuación "al terminar, suena lo siguiente" es un evento
//! [`PlayerEvent::Finished`] entregado por canal y consumido por un driver,
//! no un callback recursivo: la tabla de transiciones queda auditable y se
//! prueba sin transporte de audio real.

pub mod backend;
pub mod queue;

use async_trait::async_trait;
use dashmap::DashMap;
use serenity::model::id::{ChannelId, GuildId};
use std::sync::Arc;
use tokio::sync::{mpsc::UnboundedReceiver, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::PlayerError;
use crate::sources::{TrackMetadata, TrackResolver};

pub use backend::{AudioBackend, PlayerEvent, SongbirdBackend};
pub use queue::{CurrentTrack, GuildPlayerState, PlaybackPhase, TrackRequest};

/// Canal de respuesta hacia el chat: anuncios de arranque y de fallo por
/// track. En producción publica embeds; en tests registra llamadas.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlaybackNotifier: Send + Sync {
    async fn track_started(&self, channel: ChannelId, track: &TrackMetadata);
    async fn track_failed(&self, channel: ChannelId, reference: &str, error: &PlayerError);
}

/// Resultado de un `enqueue`: arrancó de inmediato (vía rápida del primer
/// track) o quedó en la cola pendiente.
#[derive(Debug, Clone)]
pub enum EnqueueOutcome {
    Started(TrackMetadata),
    Queued { position: usize },
}

/// Foto de la cola de una guild para los comandos de consulta.
#[derive(Debug, Clone)]
pub struct QueueSnapshot {
    pub current: Option<CurrentTrack>,
    pub pending: Vec<TrackRequest>,
    pub loop_enabled: bool,
    pub paused: bool,
    pub volume: f32,
}

/// Registro explícito de estados de reproducción, uno por guild.
pub struct PlayerRegistry {
    states: DashMap<GuildId, Arc<Mutex<GuildPlayerState>>>,
    resolver: Arc<dyn TrackResolver>,
    backend: Arc<dyn AudioBackend>,
    notifier: Arc<dyn PlaybackNotifier>,
}

impl PlayerRegistry {
    pub fn new(
        resolver: Arc<dyn TrackResolver>,
        backend: Arc<dyn AudioBackend>,
        notifier: Arc<dyn PlaybackNotifier>,
    ) -> Self {
        Self {
            states: DashMap::new(),
            resolver,
            backend,
            notifier,
        }
    }

    /// Estado de la guild, creado perezosamente en la primera interacción.
    fn state(&self, guild: GuildId) -> Arc<Mutex<GuildPlayerState>> {
        self.states
            .entry(guild)
            .or_insert_with(|| Arc::new(Mutex::new(GuildPlayerState::new())))
            .clone()
    }

    /// Consume eventos del transporte. Cada evento avanza en su propia tarea
    /// para que un resolve lento en una guild no frene a las demás.
    pub fn spawn_event_driver(
        self: &Arc<Self>,
        mut events: UnboundedReceiver<PlayerEvent>,
        shutdown: CancellationToken,
    ) -> tokio::task::JoinHandle<()> {
        let registry = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    event = events.recv() => {
                        let Some(PlayerEvent::Finished(guild)) = event else { break };
                        let registry = Arc::clone(&registry);
                        tokio::spawn(async move { registry.advance(guild).await });
                    }
                }
            }
            debug!("Driver de eventos de reproducción detenido");
        })
    }

    /// Encola una referencia. Primer track con la guild ociosa: conecta,
    /// resuelve ya y suena de inmediato. Con algo sonando (o en pausa), la
    /// referencia se añade sin resolver al final de la cola FIFO.
    pub async fn enqueue(
        &self,
        guild: GuildId,
        voice_channel: ChannelId,
        request: TrackRequest,
    ) -> Result<EnqueueOutcome, PlayerError> {
        let state = self.state(guild);
        let mut state = state.lock().await;

        if state.current.is_some() {
            let position = state.push_pending(request);
            return Ok(EnqueueOutcome::Queued { position });
        }

        if !state.connected {
            self.backend.connect(guild, voice_channel).await?;
            state.connected = true;
        }

        let track = self.resolver.resolve(&request.reference).await?;
        self.backend.play(guild, &track, state.volume).await?;
        state.begin(CurrentTrack {
            track: track.clone(),
            requested_by: request.requested_by,
            reply_channel: request.reply_channel,
        });

        Ok(EnqueueOutcome::Started(track))
    }

    /// Transición al terminar un track. El loop activo tiene prioridad sobre
    /// la cola pendiente y se re-resuelve desde la URL original en cada
    /// vuelta; un fallo del loop se registra y se traga. Las entradas
    /// pendientes que fallan al resolver se reportan y se saltan: la cola
    /// nunca se queda atascada.
    pub async fn advance(&self, guild: GuildId) {
        let state = self.state(guild);
        let mut state = state.lock().await;

        if !state.connected {
            // evento tardío tras stop() o expulsión de voz
            state.current = None;
            state.paused = false;
            return;
        }

        if state.loop_enabled {
            if let Some(current) = state.current.clone() {
                match self.resolver.resolve(&current.track.source_url).await {
                    Ok(track) => match self.backend.play(guild, &track, state.volume).await {
                        Ok(()) => {
                            state.begin(CurrentTrack { track, ..current });
                        }
                        Err(e) => {
                            error!("🔁 Loop en guild {}: fallo reproduciendo: {}", guild, e);
                        }
                    },
                    Err(e) => {
                        error!(
                            "🔁 Loop en guild {}: fallo re-resolviendo `{}`: {}",
                            guild, current.track.source_url, e
                        );
                    }
                }
                return;
            }
        }

        while let Some(request) = state.pending.pop_front() {
            match self.resolver.resolve(&request.reference).await {
                Ok(track) => match self.backend.play(guild, &track, state.volume).await {
                    Ok(()) => {
                        info!("🎵 Reproduciendo en guild {}: {}", guild, track.title);
                        state.begin(CurrentTrack {
                            track: track.clone(),
                            requested_by: request.requested_by,
                            reply_channel: request.reply_channel,
                        });
                        self.notifier
                            .track_started(request.reply_channel, &track)
                            .await;
                        return;
                    }
                    Err(e) => {
                        warn!("⏭️ Track `{}` no reproducible, saltando: {}", request.reference, e);
                        self.notifier
                            .track_failed(request.reply_channel, &request.reference, &e)
                            .await;
                    }
                },
                Err(e) => {
                    let e = PlayerError::from(e);
                    warn!("⏭️ Track `{}` no resuelto, saltando: {}", request.reference, e);
                    self.notifier
                        .track_failed(request.reply_channel, &request.reference, &e)
                        .await;
                }
            }
        }

        // cola agotada: conectados, sin nada sonando
        state.finish();
        debug!("📭 Cola vacía en guild {}", guild);
    }

    pub async fn pause(&self, guild: GuildId) -> Result<(), PlayerError> {
        let state = self.state(guild);
        let mut state = state.lock().await;
        if state.phase() != PlaybackPhase::Playing {
            return Err(PlayerError::NothingPlaying);
        }
        self.backend.pause(guild);
        state.paused = true;
        Ok(())
    }

    pub async fn resume(&self, guild: GuildId) -> Result<(), PlayerError> {
        let state = self.state(guild);
        let mut state = state.lock().await;
        if state.phase() != PlaybackPhase::Paused {
            return Err(PlayerError::NotPaused);
        }
        self.backend.resume(guild);
        state.paused = false;
        Ok(())
    }

    /// Detiene el track vivo; el mismo evento de fin que usa el final
    /// natural dispara `advance`.
    pub async fn skip(&self, guild: GuildId) -> Result<(), PlayerError> {
        let state = self.state(guild);
        let state = state.lock().await;
        if state.phase() != PlaybackPhase::Playing {
            return Err(PlayerError::NothingPlaying);
        }
        self.backend.stop(guild);
        Ok(())
    }

    /// Corta todo y vuelve a `Idle`: cola y loop fuera, voz desconectada.
    /// Idempotente; el único primitivo de cancelación junto al stop del
    /// controlador.
    pub async fn stop(&self, guild: GuildId) {
        let state = self.state(guild);
        let mut state = state.lock().await;
        if state.current.is_some() {
            self.backend.stop(guild);
        }
        if state.connected {
            self.backend.disconnect(guild).await;
        }
        state.reset();
    }

    /// Valida el porcentaje, lo guarda como default de la guild y lo aplica
    /// de inmediato al stream vivo si lo hay.
    pub async fn set_volume(&self, guild: GuildId, percent: i64) -> Result<(), PlayerError> {
        if !(0..=100).contains(&percent) {
            return Err(PlayerError::VolumeOutOfRange(percent));
        }
        let state = self.state(guild);
        let mut state = state.lock().await;
        state.volume = percent as f32 / 100.0;
        if state.current.is_some() {
            self.backend.set_volume(guild, state.volume);
        }
        Ok(())
    }

    /// Sin efecto sobre la reproducción hasta el fin natural del track.
    pub async fn toggle_loop(&self, guild: GuildId) -> bool {
        let state = self.state(guild);
        let mut state = state.lock().await;
        state.toggle_loop()
    }

    pub async fn clear_pending(&self, guild: GuildId) -> usize {
        let state = self.state(guild);
        let mut state = state.lock().await;
        state.clear_pending()
    }

    pub async fn join(&self, guild: GuildId, voice_channel: ChannelId) -> Result<(), PlayerError> {
        let state = self.state(guild);
        let mut state = state.lock().await;
        self.backend.connect(guild, voice_channel).await?;
        state.connected = true;
        Ok(())
    }

    /// Desconecta la voz. La cola pendiente se conserva.
    pub async fn leave(&self, guild: GuildId) -> Result<(), PlayerError> {
        let state = self.state(guild);
        let mut state = state.lock().await;
        if !state.connected {
            return Err(PlayerError::NotConnected);
        }
        self.backend.disconnect(guild).await;
        state.mark_disconnected();
        Ok(())
    }

    /// Limpieza tras una desconexión forzada (el bot fue expulsado de voz).
    pub async fn handle_forced_disconnect(&self, guild: GuildId) {
        let state = self.state(guild);
        let mut state = state.lock().await;
        self.backend.disconnect(guild).await;
        state.mark_disconnected();
    }

    pub async fn snapshot(&self, guild: GuildId) -> QueueSnapshot {
        let state = self.state(guild);
        let state = state.lock().await;
        QueueSnapshot {
            current: state.current.clone(),
            pending: state.pending.iter().cloned().collect(),
            loop_enabled: state.loop_enabled,
            paused: state.paused,
            volume: state.volume,
        }
    }

    /// Teardown de mejor esfuerzo al detener la sesión: desconecta todas las
    /// guilds y vacía sus colas sin dejar estado corrupto.
    pub async fn shutdown(&self) {
        let guilds: Vec<GuildId> = self.states.iter().map(|entry| *entry.key()).collect();
        for guild in guilds {
            self.stop(guild).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ResolveError;
    use parking_lot::Mutex as SyncMutex;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn meta(reference: &str) -> TrackMetadata {
        TrackMetadata {
            title: format!("track {reference}"),
            source_url: format!("https://yt.example/{reference}"),
            stream_url: format!("https://cdn.example/{reference}"),
            duration_secs: 180,
            uploader: "uploader".to_string(),
            thumbnail: None,
        }
    }

    fn request(reference: &str) -> TrackRequest {
        TrackRequest {
            reference: reference.to_string(),
            requested_by: serenity::model::id::UserId::new(7),
            reply_channel: ChannelId::new(11),
        }
    }

    const GUILD: GuildId = GuildId::new(1);
    const VOICE: ChannelId = ChannelId::new(2);

    /// Resolver programable: falla para las referencias listadas y registra
    /// cada llamada.
    struct FakeResolver {
        failing: SyncMutex<HashSet<String>>,
        calls: SyncMutex<Vec<String>>,
    }

    impl FakeResolver {
        fn new(failing: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                failing: SyncMutex::new(failing.iter().map(|s| s.to_string()).collect()),
                calls: SyncMutex::new(Vec::new()),
            })
        }

        fn fail_also(&self, reference: &str) {
            self.failing.lock().insert(reference.to_string());
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().clone()
        }
    }

    #[async_trait]
    impl TrackResolver for FakeResolver {
        async fn resolve(&self, reference: &str) -> Result<TrackMetadata, ResolveError> {
            self.calls.lock().push(reference.to_string());
            if self.failing.lock().contains(reference) {
                Err(ResolveError::NoResults(reference.to_string()))
            } else {
                // el "resolve" de una URL de loop devuelve el mismo track
                let key = reference
                    .strip_prefix("https://yt.example/")
                    .unwrap_or(reference);
                Ok(meta(key))
            }
        }
    }

    /// Transporte falso: registra operaciones en orden y simula conexión.
    struct FakeBackend {
        ops: SyncMutex<Vec<String>>,
    }

    impl FakeBackend {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                ops: SyncMutex::new(Vec::new()),
            })
        }

        fn ops(&self) -> Vec<String> {
            self.ops.lock().clone()
        }
    }

    #[async_trait]
    impl AudioBackend for FakeBackend {
        async fn connect(&self, _guild: GuildId, channel: ChannelId) -> Result<(), PlayerError> {
            self.ops.lock().push(format!("connect:{channel}"));
            Ok(())
        }

        async fn disconnect(&self, _guild: GuildId) {
            self.ops.lock().push("disconnect".to_string());
        }

        async fn play(
            &self,
            _guild: GuildId,
            track: &TrackMetadata,
            volume: f32,
        ) -> Result<(), PlayerError> {
            self.ops.lock().push(format!("play:{}@{volume}", track.title));
            Ok(())
        }

        fn pause(&self, _guild: GuildId) {
            self.ops.lock().push("pause".to_string());
        }

        fn resume(&self, _guild: GuildId) {
            self.ops.lock().push("resume".to_string());
        }

        fn stop(&self, _guild: GuildId) {
            self.ops.lock().push("stop".to_string());
        }

        fn set_volume(&self, _guild: GuildId, volume: f32) {
            self.ops.lock().push(format!("set_volume:{volume}"));
        }
    }

    /// Notifier que solo cuenta; para expectativas finas está el mock.
    struct RecordingNotifier {
        started: SyncMutex<Vec<String>>,
        failed: SyncMutex<Vec<String>>,
    }

    impl RecordingNotifier {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                started: SyncMutex::new(Vec::new()),
                failed: SyncMutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl PlaybackNotifier for RecordingNotifier {
        async fn track_started(&self, _channel: ChannelId, track: &TrackMetadata) {
            self.started.lock().push(track.title.clone());
        }

        async fn track_failed(&self, _channel: ChannelId, reference: &str, _error: &PlayerError) {
            self.failed.lock().push(reference.to_string());
        }
    }

    struct Harness {
        registry: Arc<PlayerRegistry>,
        resolver: Arc<FakeResolver>,
        backend: Arc<FakeBackend>,
        notifier: Arc<RecordingNotifier>,
    }

    fn harness(failing: &[&str]) -> Harness {
        let resolver = FakeResolver::new(failing);
        let backend = FakeBackend::new();
        let notifier = RecordingNotifier::new();
        let registry = Arc::new(PlayerRegistry::new(
            resolver.clone(),
            backend.clone(),
            notifier.clone(),
        ));
        Harness {
            registry,
            resolver,
            backend,
            notifier,
        }
    }

    async fn phase(registry: &PlayerRegistry, guild: GuildId) -> PlaybackPhase {
        let state = registry.state(guild);
        let state = state.lock().await;
        state.phase()
    }

    #[tokio::test]
    async fn first_enqueue_connects_and_plays_immediately() {
        let h = harness(&[]);

        let outcome = h.registry.enqueue(GUILD, VOICE, request("a")).await.unwrap();

        assert!(matches!(outcome, EnqueueOutcome::Started(ref t) if t.title == "track a"));
        assert_eq!(h.backend.ops(), ["connect:2", "play:track a@0.5"]);
        assert_eq!(phase(&h.registry, GUILD).await, PlaybackPhase::Playing);
        assert!(h.registry.snapshot(GUILD).await.pending.is_empty());
    }

    #[tokio::test]
    async fn later_enqueues_append_unresolved_in_fifo_order() {
        let h = harness(&[]);
        h.registry.enqueue(GUILD, VOICE, request("a")).await.unwrap();

        let b = h.registry.enqueue(GUILD, VOICE, request("b")).await.unwrap();
        let c = h.registry.enqueue(GUILD, VOICE, request("c")).await.unwrap();

        assert!(matches!(b, EnqueueOutcome::Queued { position: 1 }));
        assert!(matches!(c, EnqueueOutcome::Queued { position: 2 }));
        // encolar no resuelve: solo `a` pasó por el resolver
        assert_eq!(h.resolver.calls(), ["a"]);

        // termina `a`: suena `b`, queda [c]
        h.registry.advance(GUILD).await;
        let snapshot = h.registry.snapshot(GUILD).await;
        assert_eq!(snapshot.current.unwrap().track.title, "track b");
        let pending: Vec<&str> = snapshot.pending.iter().map(|r| r.reference.as_str()).collect();
        assert_eq!(pending, ["c"]);
    }

    #[tokio::test]
    async fn advance_skips_failing_entries_and_keeps_going() {
        let h = harness(&["bad1", "bad2"]);
        h.registry.enqueue(GUILD, VOICE, request("a")).await.unwrap();
        for reference in ["bad1", "bad2", "good"] {
            h.registry.enqueue(GUILD, VOICE, request(reference)).await.unwrap();
        }

        h.registry.advance(GUILD).await;

        let snapshot = h.registry.snapshot(GUILD).await;
        assert_eq!(snapshot.current.unwrap().track.title, "track good");
        assert_eq!(*h.notifier.failed.lock(), ["bad1", "bad2"]);
        assert_eq!(*h.notifier.started.lock(), ["track good"]);
    }

    #[tokio::test]
    async fn failure_reports_go_through_the_notifier_trait() {
        // misma propiedad que arriba, con expectativas de mockall
        let resolver = FakeResolver::new(&["bad"]);
        let backend = FakeBackend::new();
        let mut mock = MockPlaybackNotifier::new();
        mock.expect_track_failed()
            .withf(|_, reference, _| reference == "bad")
            .times(1)
            .returning(|_, _, _| ());
        mock.expect_track_started().times(1).returning(|_, _| ());

        let registry = Arc::new(PlayerRegistry::new(resolver, backend, Arc::new(mock)));
        registry.enqueue(GUILD, VOICE, request("a")).await.unwrap();
        registry.enqueue(GUILD, VOICE, request("bad")).await.unwrap();
        registry.enqueue(GUILD, VOICE, request("ok")).await.unwrap();

        registry.advance(GUILD).await;
    }

    #[tokio::test]
    async fn exhausted_queue_reaches_connected_empty() {
        let h = harness(&["bad"]);
        h.registry.enqueue(GUILD, VOICE, request("a")).await.unwrap();
        h.registry.enqueue(GUILD, VOICE, request("bad")).await.unwrap();

        h.registry.advance(GUILD).await;

        assert_eq!(phase(&h.registry, GUILD).await, PlaybackPhase::ConnectedIdle);
        // sigue conectado: un enqueue posterior no reconecta
        h.registry.enqueue(GUILD, VOICE, request("z")).await.unwrap();
        let connects = h
            .backend
            .ops()
            .iter()
            .filter(|op| op.starts_with("connect"))
            .count();
        assert_eq!(connects, 1);
    }

    #[tokio::test]
    async fn loop_replay_takes_precedence_over_pending() {
        let h = harness(&[]);
        h.registry.enqueue(GUILD, VOICE, request("x")).await.unwrap();
        h.registry.enqueue(GUILD, VOICE, request("y")).await.unwrap();
        assert!(h.registry.toggle_loop(GUILD).await);

        // fin de `x` con loop activo: se re-resuelve su URL y repite
        h.registry.advance(GUILD).await;

        let snapshot = h.registry.snapshot(GUILD).await;
        assert_eq!(snapshot.current.unwrap().track.title, "track x");
        assert_eq!(snapshot.pending.len(), 1);
        assert!(h.resolver.calls().contains(&"https://yt.example/x".to_string()));

        // loop fuera: el siguiente fin drena la cola
        assert!(!h.registry.toggle_loop(GUILD).await);
        h.registry.advance(GUILD).await;
        let snapshot = h.registry.snapshot(GUILD).await;
        assert_eq!(snapshot.current.unwrap().track.title, "track y");
        assert!(snapshot.pending.is_empty());
    }

    #[tokio::test]
    async fn loop_reresolve_failure_is_swallowed() {
        let h = harness(&[]);
        h.registry.enqueue(GUILD, VOICE, request("x")).await.unwrap();
        h.registry.toggle_loop(GUILD).await;
        h.resolver.fail_also("https://yt.example/x");

        h.registry.advance(GUILD).await;

        // sin reintento, sin reporte por chat, estado intacto
        let snapshot = h.registry.snapshot(GUILD).await;
        assert_eq!(snapshot.current.unwrap().track.title, "track x");
        assert!(h.notifier.failed.lock().is_empty());
        let plays = h.backend.ops().iter().filter(|op| op.starts_with("play")).count();
        assert_eq!(plays, 1);
    }

    #[tokio::test]
    async fn stop_resets_to_idle_and_is_idempotent() {
        let h = harness(&[]);
        h.registry.enqueue(GUILD, VOICE, request("a")).await.unwrap();
        h.registry.enqueue(GUILD, VOICE, request("b")).await.unwrap();
        h.registry.set_volume(GUILD, 80).await.unwrap();
        h.registry.toggle_loop(GUILD).await;

        h.registry.stop(GUILD).await;
        h.registry.stop(GUILD).await;

        let snapshot = h.registry.snapshot(GUILD).await;
        assert_eq!(phase(&h.registry, GUILD).await, PlaybackPhase::Idle);
        assert!(snapshot.pending.is_empty());
        assert!(!snapshot.loop_enabled);
        // el volumen de la guild sobrevive al stop
        assert_eq!(snapshot.volume, 0.8);
        let disconnects = h.backend.ops().iter().filter(|op| *op == "disconnect").count();
        assert_eq!(disconnects, 1);
    }

    #[tokio::test]
    async fn stale_finished_event_after_stop_is_ignored() {
        let h = harness(&[]);
        h.registry.enqueue(GUILD, VOICE, request("a")).await.unwrap();
        h.registry.enqueue(GUILD, VOICE, request("b")).await.unwrap();
        h.registry.stop(GUILD).await;

        // el End del track parado llega después del stop()
        h.registry.advance(GUILD).await;

        assert_eq!(phase(&h.registry, GUILD).await, PlaybackPhase::Idle);
        let plays = h.backend.ops().iter().filter(|op| op.starts_with("play")).count();
        assert_eq!(plays, 1);
    }

    #[tokio::test]
    async fn volume_is_validated_applied_and_retained() {
        let h = harness(&[]);

        assert!(matches!(
            h.registry.set_volume(GUILD, -1).await,
            Err(PlayerError::VolumeOutOfRange(-1))
        ));
        assert!(matches!(
            h.registry.set_volume(GUILD, 101).await,
            Err(PlayerError::VolumeOutOfRange(101))
        ));

        // sin nada sonando: se guarda pero no toca el transporte
        h.registry.set_volume(GUILD, 30).await.unwrap();
        assert!(h.backend.ops().is_empty());

        // el primer play usa el volumen guardado de la guild
        h.registry.enqueue(GUILD, VOICE, request("a")).await.unwrap();
        assert!(h.backend.ops().contains(&"play:track a@0.3".to_string()));

        // con stream vivo se aplica de inmediato
        h.registry.set_volume(GUILD, 60).await.unwrap();
        assert!(h.backend.ops().contains(&"set_volume:0.6".to_string()));
    }

    #[tokio::test]
    async fn pause_and_resume_are_phase_guarded() {
        let h = harness(&[]);

        assert!(matches!(
            h.registry.pause(GUILD).await,
            Err(PlayerError::NothingPlaying)
        ));
        assert!(matches!(
            h.registry.resume(GUILD).await,
            Err(PlayerError::NotPaused)
        ));

        h.registry.enqueue(GUILD, VOICE, request("a")).await.unwrap();
        h.registry.pause(GUILD).await.unwrap();
        assert_eq!(phase(&h.registry, GUILD).await, PlaybackPhase::Paused);

        // pausar dos veces se reporta, no es fatal
        assert!(h.registry.pause(GUILD).await.is_err());

        h.registry.resume(GUILD).await.unwrap();
        assert_eq!(phase(&h.registry, GUILD).await, PlaybackPhase::Playing);
    }

    #[tokio::test]
    async fn skip_stops_the_live_track_only_while_playing() {
        let h = harness(&[]);

        assert!(matches!(
            h.registry.skip(GUILD).await,
            Err(PlayerError::NothingPlaying)
        ));

        h.registry.enqueue(GUILD, VOICE, request("a")).await.unwrap();
        h.registry.skip(GUILD).await.unwrap();
        assert!(h.backend.ops().contains(&"stop".to_string()));
    }

    #[tokio::test]
    async fn leave_keeps_pending_and_join_reconnects() {
        let h = harness(&[]);
        h.registry.enqueue(GUILD, VOICE, request("a")).await.unwrap();
        h.registry.enqueue(GUILD, VOICE, request("b")).await.unwrap();

        h.registry.leave(GUILD).await.unwrap();
        assert_eq!(phase(&h.registry, GUILD).await, PlaybackPhase::Idle);
        assert_eq!(h.registry.snapshot(GUILD).await.pending.len(), 1);
        assert!(matches!(
            h.registry.leave(GUILD).await,
            Err(PlayerError::NotConnected)
        ));

        h.registry.join(GUILD, VOICE).await.unwrap();
        assert_eq!(phase(&h.registry, GUILD).await, PlaybackPhase::ConnectedIdle);
    }

    #[tokio::test]
    async fn clear_pending_reports_how_many_were_dropped() {
        let h = harness(&[]);
        h.registry.enqueue(GUILD, VOICE, request("a")).await.unwrap();
        h.registry.enqueue(GUILD, VOICE, request("b")).await.unwrap();
        h.registry.enqueue(GUILD, VOICE, request("c")).await.unwrap();

        assert_eq!(h.registry.clear_pending(GUILD).await, 2);
        assert_eq!(h.registry.clear_pending(GUILD).await, 0);
        // el track vivo no se toca
        assert_eq!(phase(&h.registry, GUILD).await, PlaybackPhase::Playing);
    }

    #[tokio::test]
    async fn event_driver_advances_on_finished_events() {
        let h = harness(&[]);
        let (tx, rx) = mpsc::unbounded_channel();
        let shutdown = CancellationToken::new();
        let driver = h.registry.spawn_event_driver(rx, shutdown.clone());

        h.registry.enqueue(GUILD, VOICE, request("a")).await.unwrap();
        h.registry.enqueue(GUILD, VOICE, request("b")).await.unwrap();

        tx.send(PlayerEvent::Finished(GUILD)).unwrap();

        let deadline = tokio::time::Instant::now() + Duration::from_secs(1);
        loop {
            let snapshot = h.registry.snapshot(GUILD).await;
            if snapshot.current.as_ref().map(|c| c.track.title.as_str()) == Some("track b") {
                break;
            }
            assert!(tokio::time::Instant::now() < deadline, "driver never advanced");
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        shutdown.cancel();
        let _ = driver.await;
    }

    #[tokio::test]
    async fn shutdown_stops_every_guild() {
        let h = harness(&[]);
        let other = GuildId::new(99);
        h.registry.enqueue(GUILD, VOICE, request("a")).await.unwrap();
        h.registry.enqueue(other, VOICE, request("b")).await.unwrap();

        h.registry.shutdown().await;

        assert_eq!(phase(&h.registry, GUILD).await, PlaybackPhase::Idle);
        assert_eq!(phase(&h.registry, other).await, PlaybackPhase::Idle);
    }
}
