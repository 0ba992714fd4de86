//! Comandos informativos: ping, fichas de servidor/usuario/bot y anuncios.

use anyhow::Result;
use num_format::{Locale, ToFormattedString};
use serenity::{
    all::{ChannelType, Context, GuildId, Message, Permissions, User},
    builder::{CreateEmbed, CreateEmbedAuthor, CreateMessage, EditMessage},
    model::id::ChannelId,
};
use std::time::Instant;

use super::{admin, commands};
use crate::locale::{tr, Lang};
use crate::ui::embeds::{self, colors};

async fn reply(ctx: &Context, msg: &Message, embed: CreateEmbed) -> Result<()> {
    msg.channel_id
        .send_message(&ctx.http, CreateMessage::new().embed(embed))
        .await?;
    Ok(())
}

fn discord_date(unix: i64) -> String {
    format!("<t:{unix}:D>")
}

/// Latencia medida sobre el viaje del propio mensaje: se envía y se edita
/// con el tiempo transcurrido.
pub async fn ping(ctx: &Context, msg: &Message, lang: Lang) -> Result<()> {
    let started = Instant::now();
    let probe = embeds::base(
        tr(lang, "pong"),
        None,
        colors::ACCENT,
        tr(lang, "footer_admin"),
    );
    let mut sent = msg
        .channel_id
        .send_message(&ctx.http, CreateMessage::new().embed(probe))
        .await?;

    let ms = started.elapsed().as_millis();
    let colour = if ms < 100 {
        colors::GREEN
    } else if ms < 200 {
        colors::YELLOW
    } else {
        colors::RED
    };
    let text = tr(lang, "latency").replace("{ms}", &ms.to_string());
    let embed = embeds::base(tr(lang, "pong"), Some(&text), colour, tr(lang, "footer_admin"));
    sent.edit(ctx, EditMessage::new().embed(embed)).await?;
    Ok(())
}

pub async fn server_info(ctx: &Context, msg: &Message, guild_id: GuildId, lang: Lang) -> Result<()> {
    struct GuildFacts {
        name: String,
        owner: u64,
        members: u64,
        text_channels: usize,
        voice_channels: usize,
        roles: usize,
        emojis: usize,
        verification: String,
        icon: Option<String>,
    }

    let facts = {
        let Some(guild) = ctx.cache.guild(guild_id) else {
            return Ok(());
        };
        GuildFacts {
            name: guild.name.clone(),
            owner: guild.owner_id.get(),
            members: guild.member_count,
            text_channels: guild
                .channels
                .values()
                .filter(|channel| channel.kind == ChannelType::Text)
                .count(),
            voice_channels: guild
                .channels
                .values()
                .filter(|channel| channel.kind == ChannelType::Voice)
                .count(),
            roles: guild.roles.len(),
            emojis: guild.emojis.len(),
            verification: format!("{:?}", guild.verification_level),
            icon: guild.icon_url(),
        }
    };

    let title = format!("{} — {}", tr(lang, "server_info_t"), facts.name);
    let mut embed = embeds::base(&title, None, colors::ACCENT, tr(lang, "footer_admin"))
        .field(tr(lang, "owner"), format!("<@{}>", facts.owner), true)
        .field(
            tr(lang, "members"),
            facts.members.to_formatted_string(&Locale::en),
            true,
        )
        .field(
            tr(lang, "created"),
            discord_date(guild_id.created_at().unix_timestamp()),
            true,
        )
        .field(tr(lang, "text_ch"), facts.text_channels.to_string(), true)
        .field(tr(lang, "voice_ch"), facts.voice_channels.to_string(), true)
        .field(tr(lang, "roles"), facts.roles.to_string(), true)
        .field(tr(lang, "emojis"), facts.emojis.to_string(), true)
        .field(tr(lang, "verification"), facts.verification, true)
        .field(tr(lang, "server_id"), format!("`{guild_id}`"), true);
    if let Some(icon) = facts.icon {
        embed = embed.thumbnail(icon);
    }
    reply(ctx, msg, embed).await
}

pub async fn user_info(ctx: &Context, msg: &Message, guild_id: GuildId, lang: Lang) -> Result<()> {
    let target: User = msg
        .mentions
        .first()
        .cloned()
        .unwrap_or_else(|| msg.author.clone());
    let member = guild_id.member(ctx, target.id).await?;

    let joined = member
        .joined_at
        .map(|at| discord_date(at.unix_timestamp()))
        .unwrap_or_else(|| "—".to_string());

    let (top_role, role_mentions) = {
        match ctx.cache.guild(guild_id) {
            Some(guild) => {
                let mut roles: Vec<_> = member
                    .roles
                    .iter()
                    .filter_map(|role_id| guild.roles.get(role_id))
                    .collect();
                roles.sort_by_key(|role| std::cmp::Reverse(role.position));
                let top = roles
                    .first()
                    .map(|role| format!("<@&{}>", role.id))
                    .unwrap_or_else(|| "—".to_string());
                let mentions: Vec<String> = roles
                    .iter()
                    .take(10)
                    .map(|role| format!("<@&{}>", role.id))
                    .collect();
                (top, mentions)
            }
            None => ("—".to_string(), Vec::new()),
        }
    };

    let roles_value = if role_mentions.is_empty() {
        "—".to_string()
    } else {
        role_mentions.join(" ")
    };
    let roles_title = format!("{} ({})", tr(lang, "roles"), member.roles.len());

    let embed = embeds::base(
        tr(lang, "user_info_t"),
        None,
        colors::ACCENT,
        tr(lang, "footer_admin"),
    )
    .thumbnail(target.face())
    .field("ID", format!("`{}`", target.id), true)
    .field(
        tr(lang, "account_created"),
        discord_date(target.id.created_at().unix_timestamp()),
        true,
    )
    .field(tr(lang, "joined"), joined, true)
    .field(tr(lang, "top_role"), top_role, true)
    .field(roles_title, roles_value, false);
    reply(ctx, msg, embed).await
}

pub async fn bot_info(ctx: &Context, msg: &Message, lang: Lang) -> Result<()> {
    let (bot_id, face) = {
        let user = ctx.cache.current_user();
        (user.id, user.face())
    };
    let guilds = ctx.cache.guild_count();
    let users: u64 = ctx
        .cache
        .guilds()
        .into_iter()
        .filter_map(|guild_id| ctx.cache.guild(guild_id).map(|guild| guild.member_count))
        .sum();

    let embed = embeds::base(
        tr(lang, "bot_info_t"),
        None,
        colors::ACCENT,
        tr(lang, "footer_admin"),
    )
    .thumbnail(face)
    .field(tr(lang, "servers"), guilds.to_string(), true)
    .field(
        tr(lang, "users"),
        users.to_formatted_string(&Locale::en),
        true,
    )
    .field(
        tr(lang, "commands_lbl"),
        commands::COMMAND_COUNT.to_string(),
        true,
    )
    .field("ID", format!("`{bot_id}`"), true);
    reply(ctx, msg, embed).await
}

/// Canal de texto por nombre dentro de una guild; acepta `#nombre`.
pub(crate) fn text_channel_by_name(
    ctx: &Context,
    guild_id: GuildId,
    name: &str,
) -> Option<ChannelId> {
    let target = name.trim().trim_start_matches('#');
    let guild = ctx.cache.guild(guild_id)?;
    guild
        .channels
        .values()
        .find(|channel| channel.kind == ChannelType::Text && channel.name == target)
        .map(|channel| channel.id)
}

/// `announce #canal <mensaje>` — publica el anuncio firmado por el autor.
pub async fn announce(
    ctx: &Context,
    msg: &Message,
    guild_id: GuildId,
    lang: Lang,
    args: &str,
) -> Result<()> {
    if !admin::require(ctx, msg, guild_id, lang, Permissions::MANAGE_MESSAGES).await? {
        return Ok(());
    }

    let Some((channel_token, message)) = args.split_once(char::is_whitespace) else {
        let embed = embeds::error(lang, "footer_admin", tr(lang, "err_announce_usage"));
        return reply(ctx, msg, embed).await;
    };
    let message = message.trim();
    if message.is_empty() {
        let embed = embeds::error(lang, "footer_admin", tr(lang, "err_announce_usage"));
        return reply(ctx, msg, embed).await;
    }

    // acepta la mención <#id> o el nombre del canal
    let channel = channel_token
        .strip_prefix("<#")
        .and_then(|rest| rest.strip_suffix('>'))
        .and_then(|id| id.parse::<u64>().ok())
        .map(ChannelId::new)
        .or_else(|| text_channel_by_name(ctx, guild_id, channel_token));
    let Some(channel) = channel else {
        let text = tr(lang, "err_channel_nf").replace("{ch}", channel_token);
        return reply(ctx, msg, embeds::error(lang, "footer_admin", &text)).await;
    };

    let announcement = embeds::base(
        tr(lang, "announcement"),
        Some(message),
        colors::YELLOW,
        tr(lang, "footer_admin"),
    )
    .author(CreateEmbedAuthor::new(msg.author.display_name()).icon_url(msg.author.face()));
    channel
        .send_message(&ctx.http, CreateMessage::new().embed(announcement))
        .await?;

    let text = tr(lang, "ann_sent_msg").replace("{ch}", &format!("<#{channel}>"));
    let confirmation = embeds::base(
        tr(lang, "ann_sent"),
        Some(&text),
        colors::GREEN,
        tr(lang, "footer_admin"),
    );
    reply(ctx, msg, confirmation).await
}
