use serenity::model::id::{ChannelId, UserId};
use std::collections::VecDeque;

use crate::sources::TrackMetadata;

pub const DEFAULT_VOLUME: f32 = 0.5;

/// Referencia sin resolver encolada por un usuario. La resolución ocurre al
/// desencolar, no al encolar: encolar es gratis, desencolar paga un resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackRequest {
    pub reference: String,
    pub requested_by: UserId,
    /// Canal de texto donde anunciar el arranque o el fallo del track.
    pub reply_channel: ChannelId,
}

/// Track sonando (o en pausa) en una guild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentTrack {
    pub track: TrackMetadata,
    pub requested_by: UserId,
    pub reply_channel: ChannelId,
}

/// Fase observable de la máquina de estados por guild.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackPhase {
    Idle,
    Playing,
    Paused,
    /// Conectado a voz sin nada sonando (transitorio, cola agotada).
    ConnectedIdle,
}

/// Estado de reproducción de una guild. Se crea perezosamente en la primera
/// interacción y vive hasta el fin del proceso. Invariante: `current` solo
/// puede existir mientras `connected` sea true.
#[derive(Debug)]
pub struct GuildPlayerState {
    pub pending: VecDeque<TrackRequest>,
    pub current: Option<CurrentTrack>,
    pub connected: bool,
    pub paused: bool,
    /// Fracción en [0.0, 1.0]; persiste entre tracks de la misma guild.
    pub volume: f32,
    pub loop_enabled: bool,
}

impl Default for GuildPlayerState {
    fn default() -> Self {
        Self {
            pending: VecDeque::new(),
            current: None,
            connected: false,
            paused: false,
            volume: DEFAULT_VOLUME,
            loop_enabled: false,
        }
    }
}

impl GuildPlayerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> PlaybackPhase {
        if !self.connected {
            PlaybackPhase::Idle
        } else if self.current.is_some() {
            if self.paused {
                PlaybackPhase::Paused
            } else {
                PlaybackPhase::Playing
            }
        } else {
            PlaybackPhase::ConnectedIdle
        }
    }

    /// Añade al final de la cola FIFO y devuelve la posición (1-based).
    pub fn push_pending(&mut self, request: TrackRequest) -> usize {
        self.pending.push_back(request);
        self.pending.len()
    }

    pub fn begin(&mut self, current: CurrentTrack) {
        self.current = Some(current);
        self.paused = false;
    }

    pub fn finish(&mut self) -> Option<CurrentTrack> {
        self.paused = false;
        self.current.take()
    }

    /// Vuelta a `Idle`: cola y loop fuera, desconectado. El volumen de la
    /// guild se conserva.
    pub fn reset(&mut self) {
        self.pending.clear();
        self.loop_enabled = false;
        self.current = None;
        self.paused = false;
        self.connected = false;
    }

    /// Desconexión sin vaciar la cola (p. ej. expulsión del canal de voz).
    pub fn mark_disconnected(&mut self) {
        self.current = None;
        self.paused = false;
        self.connected = false;
    }

    pub fn clear_pending(&mut self) -> usize {
        let removed = self.pending.len();
        self.pending.clear();
        removed
    }

    pub fn toggle_loop(&mut self) -> bool {
        self.loop_enabled = !self.loop_enabled;
        self.loop_enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn request(reference: &str) -> TrackRequest {
        TrackRequest {
            reference: reference.to_string(),
            requested_by: UserId::new(7),
            reply_channel: ChannelId::new(11),
        }
    }

    fn track(reference: &str) -> CurrentTrack {
        CurrentTrack {
            track: TrackMetadata {
                title: reference.to_string(),
                source_url: format!("https://yt.example/{reference}"),
                stream_url: format!("https://cdn.example/{reference}"),
                duration_secs: 180,
                uploader: "uploader".to_string(),
                thumbnail: None,
            },
            requested_by: UserId::new(7),
            reply_channel: ChannelId::new(11),
        }
    }

    #[test]
    fn phases_follow_connection_and_current() {
        let mut state = GuildPlayerState::new();
        assert_eq!(state.phase(), PlaybackPhase::Idle);

        state.connected = true;
        assert_eq!(state.phase(), PlaybackPhase::ConnectedIdle);

        state.begin(track("a"));
        assert_eq!(state.phase(), PlaybackPhase::Playing);

        state.paused = true;
        assert_eq!(state.phase(), PlaybackPhase::Paused);

        state.finish();
        assert_eq!(state.phase(), PlaybackPhase::ConnectedIdle);
    }

    #[test]
    fn pending_is_strict_fifo() {
        let mut state = GuildPlayerState::new();
        assert_eq!(state.push_pending(request("a")), 1);
        assert_eq!(state.push_pending(request("b")), 2);
        assert_eq!(state.push_pending(request("c")), 3);

        let order: Vec<String> = std::iter::from_fn(|| state.pending.pop_front())
            .map(|request| request.reference)
            .collect();
        assert_eq!(order, ["a", "b", "c"]);
    }

    #[test]
    fn reset_returns_to_idle_but_keeps_volume() {
        let mut state = GuildPlayerState::new();
        state.connected = true;
        state.volume = 0.8;
        state.loop_enabled = true;
        state.begin(track("a"));
        state.push_pending(request("b"));

        state.reset();

        assert_eq!(state.phase(), PlaybackPhase::Idle);
        assert!(state.pending.is_empty());
        assert!(!state.loop_enabled);
        assert_eq!(state.current, None);
        assert_eq!(state.volume, 0.8);
    }

    #[test]
    fn forced_disconnect_keeps_pending() {
        let mut state = GuildPlayerState::new();
        state.connected = true;
        state.begin(track("a"));
        state.push_pending(request("b"));

        state.mark_disconnected();

        assert_eq!(state.phase(), PlaybackPhase::Idle);
        assert_eq!(state.current, None);
        assert_eq!(state.pending.len(), 1);
    }
}
