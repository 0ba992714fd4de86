use async_trait::async_trait;
use dashmap::DashMap;
use serenity::model::id::{ChannelId, GuildId};
use songbird::{
    input::HttpRequest, Event, EventContext, EventHandler as VoiceEventHandler, Songbird,
    TrackEvent,
};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, info};

use crate::{error::PlayerError, sources::TrackMetadata};

/// Evento del transporte hacia el registro de reproducción, entregado por
/// el canal de la sesión en vez de re-entrar por callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerEvent {
    Finished(GuildId),
}

/// Transporte de voz visto desde la máquina de estados: conectar, reproducir
/// un stream ya resuelto y controlar el track vivo.
#[async_trait]
pub trait AudioBackend: Send + Sync {
    async fn connect(&self, guild: GuildId, channel: ChannelId) -> Result<(), PlayerError>;
    async fn disconnect(&self, guild: GuildId);
    async fn play(
        &self,
        guild: GuildId,
        track: &TrackMetadata,
        volume: f32,
    ) -> Result<(), PlayerError>;
    fn pause(&self, guild: GuildId);
    fn resume(&self, guild: GuildId);
    fn stop(&self, guild: GuildId);
    fn set_volume(&self, guild: GuildId, volume: f32);
}

/// Implementación sobre songbird: una `Call` por guild y el `TrackHandle`
/// vivo para pausar, reanudar y ajustar volumen.
pub struct SongbirdBackend {
    manager: Arc<Songbird>,
    http: reqwest::Client,
    events: UnboundedSender<PlayerEvent>,
    handles: DashMap<GuildId, songbird::tracks::TrackHandle>,
}

impl SongbirdBackend {
    pub fn new(manager: Arc<Songbird>, events: UnboundedSender<PlayerEvent>) -> Self {
        Self {
            manager,
            http: reqwest::Client::new(),
            events,
            handles: DashMap::new(),
        }
    }
}

#[async_trait]
impl AudioBackend for SongbirdBackend {
    async fn connect(&self, guild: GuildId, channel: ChannelId) -> Result<(), PlayerError> {
        // unirse estando ya conectado mueve la Call de canal
        self.manager
            .join(guild, channel)
            .await
            .map_err(|e| PlayerError::Connection(e.to_string()))?;
        info!("🔊 Conectado al canal de voz en guild {}", guild);
        Ok(())
    }

    async fn disconnect(&self, guild: GuildId) {
        self.handles.remove(&guild);
        match self.manager.remove(guild).await {
            Ok(()) => info!("👋 Desconectado del canal de voz en guild {}", guild),
            Err(e) => debug!("Desconexión de voz ignorada en guild {}: {}", guild, e),
        }
    }

    async fn play(
        &self,
        guild: GuildId,
        track: &TrackMetadata,
        volume: f32,
    ) -> Result<(), PlayerError> {
        let call = self
            .manager
            .get(guild)
            .ok_or(PlayerError::NotConnected)?;

        let input = HttpRequest::new(self.http.clone(), track.stream_url.clone());

        let mut call = call.lock().await;
        let handle = call.play_input(input.into());
        let _ = handle.set_volume(volume);
        handle
            .add_event(
                Event::Track(TrackEvent::End),
                TrackEndNotifier {
                    guild,
                    events: self.events.clone(),
                },
            )
            .map_err(|e| PlayerError::Playback(e.to_string()))?;

        self.handles.insert(guild, handle);
        Ok(())
    }

    fn pause(&self, guild: GuildId) {
        if let Some(handle) = self.handles.get(&guild) {
            let _ = handle.pause();
        }
    }

    fn resume(&self, guild: GuildId) {
        if let Some(handle) = self.handles.get(&guild) {
            let _ = handle.play();
        }
    }

    fn stop(&self, guild: GuildId) {
        if let Some(handle) = self.handles.get(&guild) {
            let _ = handle.stop();
        }
    }

    fn set_volume(&self, guild: GuildId, volume: f32) {
        if let Some(handle) = self.handles.get(&guild) {
            let _ = handle.set_volume(volume);
        }
    }
}

/// Al terminar un track (fin natural o `stop`) reinyecta el evento en el
/// canal del registro; el driver decide la siguiente transición.
struct TrackEndNotifier {
    guild: GuildId,
    events: UnboundedSender<PlayerEvent>,
}

#[async_trait]
impl VoiceEventHandler for TrackEndNotifier {
    async fn act(&self, _ctx: &EventContext<'_>) -> Option<Event> {
        if self.events.send(PlayerEvent::Finished(self.guild)).is_err() {
            error!(
                "Canal de eventos cerrado; fin de track descartado en guild {}",
                self.guild
            );
        }
        None
    }
}
