//! Comandos de moderación: comprobación de permiso de una línea y respuesta
//! formateada; las acciones las ejecuta la API de Discord.

use anyhow::Result;
use chrono::{Duration as ChronoDuration, Utc};
use serenity::{
    all::{Colour, Context, GuildId, Message, Permissions, Timestamp},
    builder::{CreateEmbed, CreateMessage, GetMessages},
};
use std::time::Duration;
use tracing::debug;

use crate::locale::{tr, Lang};
use crate::ui::embeds::{self, colors};

/// Límite del timeout de Discord: 28 días, en minutos.
const MAX_TIMEOUT_MINUTES: i64 = 28 * 24 * 60;

fn admin_embed(lang: Lang, title: &str, colour: Colour) -> CreateEmbed {
    embeds::base(title, None, colour, tr(lang, "footer_admin"))
}

fn admin_error(lang: Lang, text: &str) -> CreateEmbed {
    embeds::error(lang, "footer_admin", text)
}

async fn reply(ctx: &Context, msg: &Message, embed: CreateEmbed) -> Result<()> {
    msg.channel_id
        .send_message(&ctx.http, CreateMessage::new().embed(embed))
        .await?;
    Ok(())
}

/// Permisos del autor sobre la guild cacheada.
async fn author_has(ctx: &Context, guild_id: GuildId, msg: &Message, required: Permissions) -> bool {
    let Ok(member) = guild_id.member(ctx, msg.author.id).await else {
        return false;
    };
    let Some(guild) = ctx.cache.guild(guild_id) else {
        return false;
    };
    guild.member_permissions(&member).contains(required)
}

/// Corta con el embed `no_perms` si falta el permiso. Devuelve si se puede
/// seguir.
pub(crate) async fn require(
    ctx: &Context,
    msg: &Message,
    guild_id: GuildId,
    lang: Lang,
    required: Permissions,
) -> Result<bool> {
    if author_has(ctx, guild_id, msg, required).await {
        Ok(true)
    } else {
        reply(ctx, msg, admin_error(lang, tr(lang, "no_perms"))).await?;
        Ok(false)
    }
}

fn reason_from(args: &str, lang: Lang) -> String {
    args.split_once(char::is_whitespace)
        .map(|(_, rest)| rest.trim())
        .filter(|rest| !rest.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| tr(lang, "no_reason").to_string())
}

/// `mute @m [minutos] [motivo]` — minutos opcional, 10 por defecto.
fn mute_args(args: &str, lang: Lang) -> (i64, String) {
    let mut rest = args
        .split_once(char::is_whitespace)
        .map(|(_, rest)| rest.trim())
        .unwrap_or("");

    let minutes = rest.split_whitespace().next().and_then(|token| token.parse::<i64>().ok());
    if minutes.is_some() {
        rest = rest
            .split_once(char::is_whitespace)
            .map(|(_, rest)| rest.trim())
            .unwrap_or("");
    }

    let reason = if rest.is_empty() {
        tr(lang, "no_reason").to_string()
    } else {
        rest.to_string()
    };
    (minutes.unwrap_or(10).clamp(1, MAX_TIMEOUT_MINUTES), reason)
}

pub async fn kick(
    ctx: &Context,
    msg: &Message,
    guild_id: GuildId,
    lang: Lang,
    args: &str,
) -> Result<()> {
    if !require(ctx, msg, guild_id, lang, Permissions::KICK_MEMBERS).await? {
        return Ok(());
    }
    let Some(target) = msg.mentions.first() else {
        return reply(ctx, msg, admin_error(lang, tr(lang, "member_nf"))).await;
    };
    let reason = reason_from(args, lang);

    guild_id.kick_with_reason(&ctx.http, target.id, &reason).await?;

    let embed = admin_embed(lang, tr(lang, "kicked"), colors::YELLOW)
        .field(tr(lang, "member"), format!("<@{}>", target.id), true)
        .field(tr(lang, "reason"), reason, true)
        .field(tr(lang, "moderator"), format!("<@{}>", msg.author.id), true);
    reply(ctx, msg, embed).await
}

pub async fn ban(
    ctx: &Context,
    msg: &Message,
    guild_id: GuildId,
    lang: Lang,
    args: &str,
) -> Result<()> {
    if !require(ctx, msg, guild_id, lang, Permissions::BAN_MEMBERS).await? {
        return Ok(());
    }
    let Some(target) = msg.mentions.first() else {
        return reply(ctx, msg, admin_error(lang, tr(lang, "member_nf"))).await;
    };
    let reason = reason_from(args, lang);

    guild_id
        .ban_with_reason(&ctx.http, target.id, 0, &reason)
        .await?;

    let embed = admin_embed(lang, tr(lang, "banned"), colors::RED)
        .field(tr(lang, "member"), format!("<@{}>", target.id), true)
        .field(tr(lang, "reason"), reason, true)
        .field(tr(lang, "moderator"), format!("<@{}>", msg.author.id), true);
    reply(ctx, msg, embed).await
}

/// `unban <tag|id>` — busca en la lista de bans por tag, nombre o id.
pub async fn unban(
    ctx: &Context,
    msg: &Message,
    guild_id: GuildId,
    lang: Lang,
    args: &str,
) -> Result<()> {
    if !require(ctx, msg, guild_id, lang, Permissions::BAN_MEMBERS).await? {
        return Ok(());
    }
    let needle = args.trim();
    if needle.is_empty() {
        return reply(ctx, msg, admin_error(lang, tr(lang, "member_nf"))).await;
    }

    let bans = guild_id.bans(&ctx.http, None, None).await?;
    let Some(entry) = bans.iter().find(|ban| {
        ban.user.tag() == needle || ban.user.name == needle || ban.user.id.to_string() == needle
    }) else {
        return reply(ctx, msg, admin_error(lang, tr(lang, "user_nf"))).await;
    };

    guild_id.unban(&ctx.http, entry.user.id).await?;

    let embed = admin_embed(lang, tr(lang, "unbanned"), colors::GREEN)
        .field(tr(lang, "member"), format!("`{}`", entry.user.tag()), true)
        .field(tr(lang, "moderator"), format!("<@{}>", msg.author.id), true);
    reply(ctx, msg, embed).await
}

pub async fn mute(
    ctx: &Context,
    msg: &Message,
    guild_id: GuildId,
    lang: Lang,
    args: &str,
) -> Result<()> {
    if !require(ctx, msg, guild_id, lang, Permissions::MODERATE_MEMBERS).await? {
        return Ok(());
    }
    let Some(target) = msg.mentions.first() else {
        return reply(ctx, msg, admin_error(lang, tr(lang, "member_nf"))).await;
    };
    let (minutes, reason) = mute_args(args, lang);

    let until = Utc::now() + ChronoDuration::minutes(minutes);
    let timestamp = Timestamp::from_unix_timestamp(until.timestamp())
        .map_err(|e| anyhow::anyhow!("invalid timeout timestamp: {e}"))?;

    let mut member = guild_id.member(ctx, target.id).await?;
    member
        .disable_communication_until_datetime(&ctx.http, timestamp)
        .await?;

    let embed = admin_embed(lang, tr(lang, "muted"), colors::YELLOW)
        .field(tr(lang, "member"), format!("<@{}>", target.id), true)
        .field(
            tr(lang, "duration_lbl"),
            format!("`{} {}`", minutes, tr(lang, "minutes")),
            true,
        )
        .field(tr(lang, "reason"), reason, true)
        .field(tr(lang, "moderator"), format!("<@{}>", msg.author.id), true);
    reply(ctx, msg, embed).await
}

pub async fn unmute(ctx: &Context, msg: &Message, guild_id: GuildId, lang: Lang) -> Result<()> {
    if !require(ctx, msg, guild_id, lang, Permissions::MODERATE_MEMBERS).await? {
        return Ok(());
    }
    let Some(target) = msg.mentions.first() else {
        return reply(ctx, msg, admin_error(lang, tr(lang, "member_nf"))).await;
    };

    let mut member = guild_id.member(ctx, target.id).await?;
    member.enable_communication(&ctx.http).await?;

    let embed = admin_embed(lang, tr(lang, "unmuted"), colors::GREEN)
        .field(tr(lang, "member"), format!("<@{}>", target.id), true)
        .field(tr(lang, "moderator"), format!("<@{}>", msg.author.id), true);
    reply(ctx, msg, embed).await
}

/// `purge [n]` — borra los últimos n mensajes más el que invoca; la
/// confirmación se borra sola a los 3 segundos.
pub async fn purge(
    ctx: &Context,
    msg: &Message,
    guild_id: GuildId,
    lang: Lang,
    args: &str,
) -> Result<()> {
    if !require(ctx, msg, guild_id, lang, Permissions::MANAGE_MESSAGES).await? {
        return Ok(());
    }
    let amount: u8 = args.trim().parse().unwrap_or(10).clamp(1, 99);

    let messages = msg
        .channel_id
        .messages(&ctx.http, GetMessages::new().limit(amount + 1))
        .await?;
    let ids: Vec<_> = messages.iter().map(|message| message.id).collect();
    msg.channel_id.delete_messages(&ctx.http, ids).await?;

    let text = tr(lang, "purge_msg").replace("{n}", &amount.to_string());
    let embed = embeds::base(
        tr(lang, "purge_done"),
        Some(&text),
        colors::GREEN,
        tr(lang, "footer_admin"),
    );
    let confirmation = msg
        .channel_id
        .send_message(&ctx.http, CreateMessage::new().embed(embed))
        .await?;

    let http = ctx.http.clone();
    let channel = msg.channel_id;
    let confirmation_id = confirmation.id;
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(3)).await;
        let _ = channel.delete_message(&http, confirmation_id).await;
    });
    Ok(())
}

/// `warn @m [motivo]` — avisa en el canal y por DM (mejor esfuerzo).
pub async fn warn(
    ctx: &Context,
    msg: &Message,
    guild_id: GuildId,
    lang: Lang,
    args: &str,
) -> Result<()> {
    if !require(ctx, msg, guild_id, lang, Permissions::MANAGE_MESSAGES).await? {
        return Ok(());
    }
    let Some(target) = msg.mentions.first() else {
        return reply(ctx, msg, admin_error(lang, tr(lang, "member_nf"))).await;
    };
    let reason = reason_from(args, lang);

    let embed = admin_embed(lang, tr(lang, "warned"), colors::YELLOW)
        .field(tr(lang, "member"), format!("<@{}>", target.id), true)
        .field(tr(lang, "reason"), reason.clone(), true)
        .field(tr(lang, "moderator"), format!("<@{}>", msg.author.id), true);
    reply(ctx, msg, embed).await?;

    let guild_name = ctx
        .cache
        .guild(guild_id)
        .map(|guild| guild.name.clone())
        .unwrap_or_default();
    let dm_title = format!("{} — {}", tr(lang, "warned"), guild_name);
    let dm = embeds::base(
        &dm_title,
        Some(&reason),
        colors::YELLOW,
        tr(lang, "footer_admin"),
    );
    if let Err(e) = target.dm(&ctx.http, CreateMessage::new().embed(dm)).await {
        debug!("DM de aviso no entregado: {e}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn reason_defaults_when_only_the_mention_is_present() {
        assert_eq!(reason_from("<@123>", Lang::En), "No reason given");
        assert_eq!(reason_from("<@123> spamming", Lang::En), "spamming");
        assert_eq!(reason_from("<@123>   ", Lang::It), "Nessun motivo indicato");
    }

    #[test]
    fn mute_args_parse_minutes_and_reason() {
        assert_eq!(mute_args("<@1>", Lang::En), (10, "No reason given".to_string()));
        assert_eq!(mute_args("<@1> 30", Lang::En), (30, "No reason given".to_string()));
        assert_eq!(
            mute_args("<@1> 5 flooding the chat", Lang::En),
            (5, "flooding the chat".to_string())
        );
        // sin número: todo lo que sigue a la mención es el motivo
        assert_eq!(
            mute_args("<@1> being rude", Lang::En),
            (10, "being rude".to_string())
        );
    }

    #[test]
    fn mute_minutes_are_clamped_to_discord_limits() {
        assert_eq!(mute_args("<@1> 0", Lang::En).0, 1);
        assert_eq!(mute_args("<@1> 999999", Lang::En).0, MAX_TIMEOUT_MINUTES);
    }
}
