//! Constructor interactivo de embeds: una conversación de preguntas en el
//! canal, con una única pregunta pendiente a la vez. Si una pregunta expira,
//! el flujo entero se aborta y no se envía nada (sin commits parciales).

use anyhow::Result;
use futures::StreamExt;
use serenity::{
    all::{Context, GuildId, Message, Permissions},
    builder::{CreateEmbed, CreateMessage},
    collector::MessageCollector,
};
use std::time::Duration;

use super::{admin, util};
use crate::locale::{tr, Lang};
use crate::ui::embeds::{self, colors, EmbedSpec};

const PROMPT_TIMEOUT: Duration = Duration::from_secs(60);

enum Ask {
    Answer(String),
    Skipped,
    TimedOut,
}

async fn reply(ctx: &Context, msg: &Message, embed: CreateEmbed) -> Result<()> {
    msg.channel_id
        .send_message(&ctx.http, CreateMessage::new().embed(embed))
        .await?;
    Ok(())
}

fn is_yes(lang: Lang, answer: &str) -> bool {
    answer.eq_ignore_ascii_case(tr(lang, "yes_word"))
}

/// Pregunta y espera la respuesta del mismo autor en el mismo canal.
async fn ask(
    ctx: &Context,
    msg: &Message,
    lang: Lang,
    question_key: &str,
    optional: bool,
) -> Result<Ask> {
    let skip_word = tr(lang, "skip_word");
    let mut question = tr(lang, question_key).to_string();
    if optional {
        question.push_str(&tr(lang, "eb_skip_hint").replace("{skip}", skip_word));
    }
    let prompt = embeds::base(
        tr(lang, "embed_builder_t"),
        Some(&question),
        colors::ACCENT,
        tr(lang, "footer_admin"),
    );
    msg.channel_id
        .send_message(&ctx.http, CreateMessage::new().embed(prompt))
        .await?;

    let mut replies = MessageCollector::new(&ctx.shard)
        .channel_id(msg.channel_id)
        .author_id(msg.author.id)
        .timeout(PROMPT_TIMEOUT)
        .stream();

    match replies.next().await {
        Some(answer) if optional && answer.content.trim().eq_ignore_ascii_case(skip_word) => {
            Ok(Ask::Skipped)
        }
        Some(answer) => Ok(Ask::Answer(answer.content.trim().to_string())),
        None => {
            let embed = embeds::error(lang, "footer_admin", tr(lang, "eb_timeout_msg"));
            msg.channel_id
                .send_message(&ctx.http, CreateMessage::new().embed(embed))
                .await?;
            Ok(Ask::TimedOut)
        }
    }
}

/// `embed` — flujo interactivo completo: campos, vista previa, confirmación
/// y canal destino.
pub async fn run(ctx: &Context, msg: &Message, guild_id: GuildId, lang: Lang) -> Result<()> {
    if !admin::require(ctx, msg, guild_id, lang, Permissions::MANAGE_MESSAGES).await? {
        return Ok(());
    }

    let guide = embeds::base(
        tr(lang, "embed_builder_t"),
        Some(tr(lang, "eb_guide")),
        colors::ACCENT,
        tr(lang, "footer_admin"),
    );
    reply(ctx, msg, guide).await?;

    let title = match ask(ctx, msg, lang, "eb_title_q", false).await? {
        Ask::Answer(text) if !text.is_empty() => text,
        _ => return Ok(()),
    };

    let mut optional_answers = Vec::with_capacity(6);
    for question_key in [
        "eb_desc_q",
        "eb_color_q",
        "eb_footer_q",
        "eb_image_q",
        "eb_thumb_q",
        "eb_author_q",
    ] {
        let answer = match ask(ctx, msg, lang, question_key, true).await? {
            Ask::Answer(text) => Some(text),
            Ask::Skipped => None,
            Ask::TimedOut => return Ok(()),
        };
        optional_answers.push(answer);
    }
    let mut optional_answers = optional_answers.into_iter();
    let description = optional_answers.next().flatten();
    let colour = optional_answers.next().flatten();
    let footer = optional_answers.next().flatten();
    let image = optional_answers.next().flatten();
    let thumbnail = optional_answers.next().flatten();
    let author = optional_answers.next().flatten();

    let mut fields = Vec::new();
    let mut more = match ask(ctx, msg, lang, "eb_add_field_q", false).await? {
        Ask::Answer(text) => is_yes(lang, &text),
        Ask::Skipped => false,
        Ask::TimedOut => return Ok(()),
    };
    while more {
        let name = match ask(ctx, msg, lang, "eb_fname_q", false).await? {
            Ask::Answer(text) if !text.is_empty() => text,
            Ask::TimedOut => return Ok(()),
            _ => break,
        };
        let value = match ask(ctx, msg, lang, "eb_fval_q", false).await? {
            Ask::Answer(text) if !text.is_empty() => text,
            Ask::TimedOut => return Ok(()),
            _ => break,
        };
        let inline = match ask(ctx, msg, lang, "eb_inline_q", true).await? {
            Ask::Answer(text) => is_yes(lang, &text),
            Ask::Skipped => false,
            Ask::TimedOut => return Ok(()),
        };
        fields.push((name, value, inline));

        more = match ask(ctx, msg, lang, "eb_another_q", false).await? {
            Ask::Answer(text) => is_yes(lang, &text),
            Ask::Skipped => false,
            Ask::TimedOut => return Ok(()),
        };
    }

    let spec = EmbedSpec {
        title,
        description,
        colour,
        footer,
        image,
        thumbnail,
        author,
        channel: String::new(),
        fields,
    };

    msg.channel_id
        .send_message(
            &ctx.http,
            CreateMessage::new()
                .content(tr(lang, "eb_preview"))
                .embed(spec.build()),
        )
        .await?;

    let confirmed = match ask(ctx, msg, lang, "eb_confirm_q", false).await? {
        Ask::Answer(text) => is_yes(lang, &text),
        Ask::Skipped => false,
        Ask::TimedOut => return Ok(()),
    };
    if !confirmed {
        let embed = embeds::base(
            tr(lang, "eb_cancelled"),
            Some(tr(lang, "eb_cancel_msg")),
            colors::RED,
            tr(lang, "footer_admin"),
        );
        return reply(ctx, msg, embed).await;
    }

    let destination = match ask(ctx, msg, lang, "eb_channel_q", false).await? {
        Ask::Answer(text) => text,
        Ask::Skipped => tr(lang, "here_word").to_string(),
        Ask::TimedOut => return Ok(()),
    };
    let channel = if destination.eq_ignore_ascii_case(tr(lang, "here_word")) {
        msg.channel_id
    } else {
        match util::text_channel_by_name(ctx, guild_id, &destination) {
            Some(channel) => channel,
            None => {
                let text = tr(lang, "err_channel_nf").replace("{ch}", &destination);
                return reply(ctx, msg, embeds::error(lang, "footer_admin", &text)).await;
            }
        }
    };

    channel
        .send_message(&ctx.http, CreateMessage::new().embed(spec.build()))
        .await?;
    let text = tr(lang, "eb_sent_msg").replace("{ch}", &format!("<#{channel}>"));
    let embed = embeds::base(
        tr(lang, "eb_sent"),
        Some(&text),
        colors::GREEN,
        tr(lang, "footer_admin"),
    );
    reply(ctx, msg, embed).await
}

/// `quickembed Título|Descripción|#Color` en una sola línea.
fn quick_spec(args: &str) -> Option<EmbedSpec> {
    let parts: Vec<&str> = args.split('|').map(str::trim).collect();
    let title = parts.first().copied().filter(|title| !title.is_empty())?;
    Some(EmbedSpec {
        title: title.to_string(),
        description: parts
            .get(1)
            .copied()
            .filter(|text| !text.is_empty())
            .map(str::to_string),
        colour: parts
            .get(2)
            .copied()
            .filter(|text| !text.is_empty())
            .map(str::to_string),
        ..Default::default()
    })
}

pub async fn quick(
    ctx: &Context,
    msg: &Message,
    guild_id: GuildId,
    lang: Lang,
    args: &str,
) -> Result<()> {
    if !admin::require(ctx, msg, guild_id, lang, Permissions::MANAGE_MESSAGES).await? {
        return Ok(());
    }
    let Some(spec) = quick_spec(args) else {
        let embed = embeds::error(lang, "footer_admin", tr(lang, "err_quickembed_usage"));
        return reply(ctx, msg, embed).await;
    };
    msg.channel_id
        .send_message(&ctx.http, CreateMessage::new().embed(spec.build()))
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn quick_spec_splits_on_pipes() {
        let spec = quick_spec("Rules|Be kind|#23a55a").unwrap();
        assert_eq!(spec.title, "Rules");
        assert_eq!(spec.description.as_deref(), Some("Be kind"));
        assert_eq!(spec.colour.as_deref(), Some("#23a55a"));
        assert!(spec.fields.is_empty());
    }

    #[test]
    fn quick_spec_tolerates_missing_parts() {
        let spec = quick_spec("Just a title").unwrap();
        assert_eq!(spec.title, "Just a title");
        assert_eq!(spec.description, None);
        assert_eq!(spec.colour, None);
    }

    #[test]
    fn quick_spec_requires_a_title() {
        assert!(quick_spec("").is_none());
        assert!(quick_spec("  |desc").is_none());
    }
}
