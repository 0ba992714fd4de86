//! Tabla de comandos con prefijo: parseo, alias y despacho por extensión.

use anyhow::Result;
use serenity::all::{Context, Message};
use serenity::builder::CreateMessage;
use serenity::model::id::GuildId;
use tracing::debug;

use super::{admin, embed_builder, music, util, DashBot, Extensions};
use crate::locale::tr;
use crate::ui::embeds;

/// Catálogo completo expuesto al chat (música, moderación, utilidades).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Play,
    Pause,
    Resume,
    Skip,
    Stop,
    Queue,
    Volume,
    Loop,
    NowPlaying,
    ClearQueue,
    Join,
    Leave,
    Kick,
    Ban,
    Unban,
    Mute,
    Unmute,
    Purge,
    Warn,
    Embed,
    QuickEmbed,
    ServerInfo,
    UserInfo,
    BotInfo,
    Ping,
    Announce,
}

pub const COMMAND_COUNT: usize = 26;

/// Separa `<prefijo><nombre> <args>`. Devuelve `None` si el mensaje no es un
/// comando.
pub fn parse<'a>(content: &'a str, prefix: &str) -> Option<(&'a str, &'a str)> {
    let rest = content.strip_prefix(prefix)?.trim_start();
    if rest.is_empty() {
        return None;
    }
    match rest.split_once(char::is_whitespace) {
        Some((name, args)) => Some((name, args.trim())),
        None => Some((rest, "")),
    }
}

pub fn lookup(name: &str) -> Option<Command> {
    use Command::*;
    Some(match name {
        "play" | "p" => Play,
        "pause" => Pause,
        "resume" | "r" => Resume,
        "skip" | "s" => Skip,
        "stop" => Stop,
        "queue" | "q" => Queue,
        "volume" | "vol" => Volume,
        "loop" => Loop,
        "nowplaying" | "np" => NowPlaying,
        "clear_queue" | "cq" => ClearQueue,
        "join" => Join,
        "leave" | "dc" => Leave,
        "kick" => Kick,
        "ban" => Ban,
        "unban" => Unban,
        "mute" => Mute,
        "unmute" => Unmute,
        "purge" | "clear" => Purge,
        "warn" => Warn,
        "embed" => Embed,
        "quickembed" | "qe" => QuickEmbed,
        "serverinfo" | "si" => ServerInfo,
        "userinfo" | "ui" => UserInfo,
        "botinfo" => BotInfo,
        "ping" => Ping,
        "announce" => Announce,
        _ => return None,
    })
}

pub async fn dispatch(
    bot: &DashBot,
    ctx: &Context,
    msg: &Message,
    guild_id: GuildId,
    extensions: &Extensions,
    command: Command,
    args: &str,
) -> Result<()> {
    use Command::*;

    let lang = bot.lang();

    match command {
        Play | Pause | Resume | Skip | Stop | Queue | Volume | Loop | NowPlaying | ClearQueue
        | Join | Leave => {
            let Some(music_ext) = &extensions.music else {
                let embed = embeds::error(lang, "footer_music", tr(lang, "err_music_off"));
                msg.channel_id
                    .send_message(&ctx.http, CreateMessage::new().embed(embed))
                    .await?;
                return Ok(());
            };
            let registry = &music_ext.registry;
            match command {
                Play => music::play(ctx, msg, guild_id, registry, lang, args).await,
                Pause => music::pause(ctx, msg, guild_id, registry, lang).await,
                Resume => music::resume(ctx, msg, guild_id, registry, lang).await,
                Skip => music::skip(ctx, msg, guild_id, registry, lang).await,
                Stop => music::stop(ctx, msg, guild_id, registry, lang).await,
                Queue => music::queue(ctx, msg, guild_id, registry, lang).await,
                Volume => music::volume(ctx, msg, guild_id, registry, lang, args).await,
                Loop => music::toggle_loop(ctx, msg, guild_id, registry, lang).await,
                NowPlaying => music::now_playing(ctx, msg, guild_id, registry, lang).await,
                ClearQueue => music::clear_queue(ctx, msg, guild_id, registry, lang).await,
                Join => music::join(ctx, msg, guild_id, registry, lang).await,
                Leave => music::leave(ctx, msg, guild_id, registry, lang).await,
                _ => unreachable!("non-music command in music arm"),
            }
        }
        _ => {
            if extensions.admin.is_none() {
                // la extensión no cargó: mismo silencio que un comando inexistente
                debug!("Extensión admin no disponible; comando ignorado");
                return Ok(());
            }
            match command {
                Kick => admin::kick(ctx, msg, guild_id, lang, args).await,
                Ban => admin::ban(ctx, msg, guild_id, lang, args).await,
                Unban => admin::unban(ctx, msg, guild_id, lang, args).await,
                Mute => admin::mute(ctx, msg, guild_id, lang, args).await,
                Unmute => admin::unmute(ctx, msg, guild_id, lang).await,
                Purge => admin::purge(ctx, msg, guild_id, lang, args).await,
                Warn => admin::warn(ctx, msg, guild_id, lang, args).await,
                Embed => embed_builder::run(ctx, msg, guild_id, lang).await,
                QuickEmbed => embed_builder::quick(ctx, msg, guild_id, lang, args).await,
                ServerInfo => util::server_info(ctx, msg, guild_id, lang).await,
                UserInfo => util::user_info(ctx, msg, guild_id, lang).await,
                BotInfo => util::bot_info(ctx, msg, lang).await,
                Ping => util::ping(ctx, msg, lang).await,
                Announce => util::announce(ctx, msg, guild_id, lang, args).await,
                _ => unreachable!("music command in admin arm"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_splits_name_and_args() {
        assert_eq!(parse("!play despacito", "!"), Some(("play", "despacito")));
        assert_eq!(parse("!q", "!"), Some(("q", "")));
        assert_eq!(parse("!volume  42 ", "!"), Some(("volume", "42")));
        assert_eq!(parse("?play x", "?"), Some(("play", "x")));
    }

    #[test]
    fn parse_rejects_non_commands() {
        assert_eq!(parse("hola", "!"), None);
        assert_eq!(parse("!", "!"), None);
        assert_eq!(parse("play x", "!"), None);
        // el prefijo de otro bot no es nuestro
        assert_eq!(parse("?play x", "!"), None);
    }

    #[test]
    fn aliases_resolve_to_their_commands() {
        assert_eq!(lookup("p"), Some(Command::Play));
        assert_eq!(lookup("r"), Some(Command::Resume));
        assert_eq!(lookup("s"), Some(Command::Skip));
        assert_eq!(lookup("vol"), Some(Command::Volume));
        assert_eq!(lookup("np"), Some(Command::NowPlaying));
        assert_eq!(lookup("cq"), Some(Command::ClearQueue));
        assert_eq!(lookup("dc"), Some(Command::Leave));
        assert_eq!(lookup("clear"), Some(Command::Purge));
        assert_eq!(lookup("qe"), Some(Command::QuickEmbed));
        assert_eq!(lookup("si"), Some(Command::ServerInfo));
        assert_eq!(lookup("ui"), Some(Command::UserInfo));
        assert_eq!(lookup("banana"), None);
    }

    #[test]
    fn the_catalogue_matches_its_advertised_size() {
        let names = [
            "play", "pause", "resume", "skip", "stop", "queue", "volume", "loop", "nowplaying",
            "clear_queue", "join", "leave", "kick", "ban", "unban", "mute", "unmute", "purge",
            "warn", "embed", "quickembed", "serverinfo", "userinfo", "botinfo", "ping", "announce",
        ];
        assert_eq!(names.len(), COMMAND_COUNT);
        for name in names {
            assert!(lookup(name).is_some(), "`{name}` missing from the table");
        }
    }
}
