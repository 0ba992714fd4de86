//! Comandos de música: cuerpos finos sobre el registro de reproducción.
//! La comprobación de canal de voz vive aquí (el registro recibe el canal
//! ya verificado) y cada condición reportada vuelve como embed localizado.

use anyhow::Result;
use async_trait::async_trait;
use serenity::{
    all::{ChannelId, Colour, Context, GuildId, Message},
    builder::{CreateEmbed, CreateMessage},
    http::Http,
};
use std::sync::Arc;
use tracing::warn;

use crate::error::PlayerError;
use crate::locale::{tr, Lang};
use crate::player::{EnqueueOutcome, PlaybackNotifier, PlayerRegistry, TrackRequest};
use crate::sources::TrackMetadata;
use crate::ui::embeds::{self, colors};

fn status_embed(lang: Lang, title_key: &str, text_key: &str, colour: Colour) -> CreateEmbed {
    embeds::base(
        tr(lang, title_key),
        Some(tr(lang, text_key)),
        colour,
        tr(lang, "footer_music"),
    )
}

fn music_error(lang: Lang, text: &str) -> CreateEmbed {
    embeds::error(lang, "footer_music", text)
}

async fn reply(ctx: &Context, msg: &Message, embed: CreateEmbed) -> Result<()> {
    msg.channel_id
        .send_message(&ctx.http, CreateMessage::new().embed(embed))
        .await?;
    Ok(())
}

/// Texto localizado para las condiciones reportadas de la cola.
fn describe(lang: Lang, error: &PlayerError) -> String {
    match error {
        PlayerError::NothingPlaying => tr(lang, "err_no_song").to_string(),
        PlayerError::NotPaused => tr(lang, "err_not_paused").to_string(),
        PlayerError::VolumeOutOfRange(_) => tr(lang, "err_vol_range").to_string(),
        PlayerError::NoVoiceChannel => tr(lang, "err_voice").to_string(),
        other => other.to_string(),
    }
}

/// Canal de voz del autor, leído de la caché del gateway.
fn author_voice_channel(ctx: &Context, guild_id: GuildId, msg: &Message) -> Option<ChannelId> {
    let guild = ctx.cache.guild(guild_id)?;
    guild
        .voice_states
        .get(&msg.author.id)
        .and_then(|voice_state| voice_state.channel_id)
}

pub async fn play(
    ctx: &Context,
    msg: &Message,
    guild_id: GuildId,
    registry: &Arc<PlayerRegistry>,
    lang: Lang,
    args: &str,
) -> Result<()> {
    let reference = args.trim();
    if reference.is_empty() {
        return reply(ctx, msg, music_error(lang, tr(lang, "err_play_usage"))).await;
    }
    let Some(voice_channel) = author_voice_channel(ctx, guild_id, msg) else {
        let e = PlayerError::NoVoiceChannel;
        return reply(ctx, msg, music_error(lang, &describe(lang, &e))).await;
    };

    // la resolución del primer track puede tardar
    let _typing = msg.channel_id.start_typing(&ctx.http);

    let request = TrackRequest {
        reference: reference.to_string(),
        requested_by: msg.author.id,
        reply_channel: msg.channel_id,
    };
    match registry.enqueue(guild_id, voice_channel, request).await {
        Ok(EnqueueOutcome::Started(track)) => {
            reply(ctx, msg, embeds::now_playing(lang, &track)).await
        }
        Ok(EnqueueOutcome::Queued { position }) => {
            reply(ctx, msg, embeds::track_queued(lang, reference, position)).await
        }
        Err(e) => reply(ctx, msg, music_error(lang, &describe(lang, &e))).await,
    }
}

pub async fn pause(
    ctx: &Context,
    msg: &Message,
    guild_id: GuildId,
    registry: &Arc<PlayerRegistry>,
    lang: Lang,
) -> Result<()> {
    match registry.pause(guild_id).await {
        Ok(()) => {
            reply(
                ctx,
                msg,
                status_embed(lang, "paused_t", "playback_paused", colors::YELLOW),
            )
            .await
        }
        Err(e) => reply(ctx, msg, music_error(lang, &describe(lang, &e))).await,
    }
}

pub async fn resume(
    ctx: &Context,
    msg: &Message,
    guild_id: GuildId,
    registry: &Arc<PlayerRegistry>,
    lang: Lang,
) -> Result<()> {
    match registry.resume(guild_id).await {
        Ok(()) => {
            reply(
                ctx,
                msg,
                status_embed(lang, "resumed_t", "playback_resumed", colors::GREEN),
            )
            .await
        }
        Err(e) => reply(ctx, msg, music_error(lang, &describe(lang, &e))).await,
    }
}

pub async fn skip(
    ctx: &Context,
    msg: &Message,
    guild_id: GuildId,
    registry: &Arc<PlayerRegistry>,
    lang: Lang,
) -> Result<()> {
    match registry.skip(guild_id).await {
        Ok(()) => {
            reply(
                ctx,
                msg,
                status_embed(lang, "skipped_t", "song_skipped", colors::ACCENT),
            )
            .await
        }
        Err(e) => reply(ctx, msg, music_error(lang, &describe(lang, &e))).await,
    }
}

pub async fn stop(
    ctx: &Context,
    msg: &Message,
    guild_id: GuildId,
    registry: &Arc<PlayerRegistry>,
    lang: Lang,
) -> Result<()> {
    registry.stop(guild_id).await;
    reply(
        ctx,
        msg,
        status_embed(lang, "stopped_t", "stop_msg", colors::RED),
    )
    .await
}

pub async fn queue(
    ctx: &Context,
    msg: &Message,
    guild_id: GuildId,
    registry: &Arc<PlayerRegistry>,
    lang: Lang,
) -> Result<()> {
    let snapshot = registry.snapshot(guild_id).await;
    reply(ctx, msg, embeds::queue_overview(lang, &snapshot)).await
}

pub async fn volume(
    ctx: &Context,
    msg: &Message,
    guild_id: GuildId,
    registry: &Arc<PlayerRegistry>,
    lang: Lang,
    args: &str,
) -> Result<()> {
    let Ok(percent) = args.trim().parse::<i64>() else {
        return reply(ctx, msg, music_error(lang, tr(lang, "err_vol_range"))).await;
    };
    match registry.set_volume(guild_id, percent).await {
        Ok(()) => {
            let text = tr(lang, "vol_set").replace("{vol}", &percent.to_string());
            let embed = embeds::base(
                tr(lang, "vol_title"),
                Some(&text),
                colors::GREEN,
                tr(lang, "footer_music"),
            );
            reply(ctx, msg, embed).await
        }
        Err(e) => reply(ctx, msg, music_error(lang, &describe(lang, &e))).await,
    }
}

pub async fn toggle_loop(
    ctx: &Context,
    msg: &Message,
    guild_id: GuildId,
    registry: &Arc<PlayerRegistry>,
    lang: Lang,
) -> Result<()> {
    let enabled = registry.toggle_loop(guild_id).await;
    let (text_key, colour) = if enabled {
        ("loop_status_on", colors::GREEN)
    } else {
        ("loop_status_off", colors::RED)
    };
    reply(ctx, msg, status_embed(lang, "loop_title", text_key, colour)).await
}

pub async fn now_playing(
    ctx: &Context,
    msg: &Message,
    guild_id: GuildId,
    registry: &Arc<PlayerRegistry>,
    lang: Lang,
) -> Result<()> {
    let snapshot = registry.snapshot(guild_id).await;
    let Some(current) = &snapshot.current else {
        return reply(ctx, msg, music_error(lang, tr(lang, "err_no_song"))).await;
    };

    let embed = embeds::now_playing(lang, &current.track)
        .field(
            tr(lang, "volume_lbl"),
            format!("`{}%`", (snapshot.volume * 100.0).round() as u8),
            true,
        )
        .field(
            tr(lang, "loop_lbl"),
            tr(lang, if snapshot.loop_enabled { "loop_on" } else { "loop_off" }),
            true,
        );
    reply(ctx, msg, embed).await
}

pub async fn clear_queue(
    ctx: &Context,
    msg: &Message,
    guild_id: GuildId,
    registry: &Arc<PlayerRegistry>,
    lang: Lang,
) -> Result<()> {
    let removed = registry.clear_pending(guild_id).await;
    let text = tr(lang, "queue_cleared").replace("{n}", &removed.to_string());
    let embed = embeds::base(
        tr(lang, "queue_clear_t"),
        Some(&text),
        colors::YELLOW,
        tr(lang, "footer_music"),
    );
    reply(ctx, msg, embed).await
}

pub async fn join(
    ctx: &Context,
    msg: &Message,
    guild_id: GuildId,
    registry: &Arc<PlayerRegistry>,
    lang: Lang,
) -> Result<()> {
    let Some(voice_channel) = author_voice_channel(ctx, guild_id, msg) else {
        let e = PlayerError::NoVoiceChannel;
        return reply(ctx, msg, music_error(lang, &describe(lang, &e))).await;
    };
    match registry.join(guild_id, voice_channel).await {
        Ok(()) => {
            reply(
                ctx,
                msg,
                status_embed(lang, "connected_t", "connected_to", colors::GREEN),
            )
            .await
        }
        Err(e) => reply(ctx, msg, music_error(lang, &describe(lang, &e))).await,
    }
}

pub async fn leave(
    ctx: &Context,
    msg: &Message,
    guild_id: GuildId,
    registry: &Arc<PlayerRegistry>,
    lang: Lang,
) -> Result<()> {
    match registry.leave(guild_id).await {
        Ok(()) => {
            reply(
                ctx,
                msg,
                status_embed(lang, "disconnected_t", "disconnected_msg", colors::YELLOW),
            )
            .await
        }
        // sin conexión no hay nada que dejar; silencio, como el resto de
        // comandos sobre una guild inactiva
        Err(PlayerError::NotConnected) => Ok(()),
        Err(e) => reply(ctx, msg, music_error(lang, &describe(lang, &e))).await,
    }
}

/// Publica anuncios de la cola (arranques y fallos) en el canal de texto del
/// pedido, con los embeds localizados de siempre.
pub struct ChannelNotifier {
    http: Arc<Http>,
    lang: Lang,
}

impl ChannelNotifier {
    pub fn new(http: Arc<Http>, lang: Lang) -> Self {
        Self { http, lang }
    }
}

#[async_trait]
impl PlaybackNotifier for ChannelNotifier {
    async fn track_started(&self, channel: ChannelId, track: &TrackMetadata) {
        let embed = embeds::now_playing(self.lang, track);
        if let Err(e) = channel
            .send_message(&self.http, CreateMessage::new().embed(embed))
            .await
        {
            warn!("No se pudo anunciar el track: {e}");
        }
    }

    async fn track_failed(&self, channel: ChannelId, reference: &str, error: &PlayerError) {
        let text = tr(self.lang, "err_track")
            .replace("{ref}", reference)
            .replace("{err}", &error.to_string());
        let embed = music_error(self.lang, &text);
        if let Err(e) = channel
            .send_message(&self.http, CreateMessage::new().embed(embed))
            .await
        {
            warn!("No se pudo reportar el fallo del track: {e}");
        }
    }
}
