use serenity::{
    all::{Colour, Timestamp},
    builder::{CreateEmbed, CreateEmbedAuthor, CreateEmbedFooter},
};

use crate::locale::{tr, Lang};
use crate::player::QueueSnapshot;
use crate::sources::TrackMetadata;

/// Paleta estandarizada: la misma del tema oscuro del panel.
pub mod colors {
    use serenity::all::Colour;

    pub const ACCENT: Colour = Colour::from_rgb(88, 101, 242);
    pub const GREEN: Colour = Colour::from_rgb(35, 165, 90);
    pub const YELLOW: Colour = Colour::from_rgb(240, 178, 50);
    pub const RED: Colour = Colour::from_rgb(242, 63, 67);
}

/// Embed base con color, pie y timestamp; cada grupo de comandos pone su pie.
pub fn base(title: &str, description: Option<&str>, colour: Colour, footer: &str) -> CreateEmbed {
    let mut embed = CreateEmbed::default()
        .title(title)
        .colour(colour)
        .timestamp(Timestamp::now())
        .footer(CreateEmbedFooter::new(footer));
    if let Some(description) = description.filter(|text| !text.is_empty()) {
        embed = embed.description(description);
    }
    embed
}

pub fn error(lang: Lang, footer_key: &str, text: &str) -> CreateEmbed {
    base(
        tr(lang, "err_title"),
        Some(text),
        colors::RED,
        tr(lang, footer_key),
    )
}

pub fn now_playing(lang: Lang, track: &TrackMetadata) -> CreateEmbed {
    let description = format!("**[{}]({})**", track.title, track.source_url);
    let mut embed = base(
        tr(lang, "now_playing"),
        Some(&description),
        colors::ACCENT,
        tr(lang, "footer_music"),
    )
    .field(
        tr(lang, "duration"),
        format!("`{}`", format_track_duration(track.duration_secs)),
        true,
    )
    .field(tr(lang, "uploader"), track.uploader.clone(), true);
    if let Some(thumbnail) = &track.thumbnail {
        embed = embed.thumbnail(thumbnail);
    }
    embed
}

/// La referencia se encola sin resolver, así que el anuncio muestra el texto
/// pedido y la posición, sin pagar un resolve extra.
pub fn track_queued(lang: Lang, reference: &str, position: usize) -> CreateEmbed {
    base(
        tr(lang, "added_queue"),
        Some(&format!("**{reference}**")),
        colors::GREEN,
        tr(lang, "footer_music"),
    )
    .field(tr(lang, "position"), format!("`#{position}`"), true)
}

pub fn queue_overview(lang: Lang, snapshot: &QueueSnapshot) -> CreateEmbed {
    let mut embed = base(
        tr(lang, "queue_title"),
        None,
        colors::ACCENT,
        tr(lang, "footer_music"),
    );

    if let Some(current) = &snapshot.current {
        let value = if snapshot.paused {
            format!("`{}` ⏸️", current.track.title)
        } else {
            format!("`{}`", current.track.title)
        };
        embed = embed.field(tr(lang, "now_playing_lbl"), value, false);
    }

    if snapshot.pending.is_empty() {
        embed = embed.field(tr(lang, "queue_title"), tr(lang, "queue_empty"), false);
    } else {
        let lines: Vec<String> = snapshot
            .pending
            .iter()
            .take(10)
            .enumerate()
            .map(|(index, request)| format!("`{}.` {}", index + 1, request.reference))
            .collect();
        let heading = tr(lang, "next_songs").replace("{n}", &snapshot.pending.len().to_string());
        embed = embed.field(heading, lines.join("\n"), false);
    }

    embed
        .field(
            tr(lang, "loop_lbl"),
            tr(lang, if snapshot.loop_enabled { "loop_on" } else { "loop_off" }),
            true,
        )
        .field(
            tr(lang, "volume_lbl"),
            format!("{}%", (snapshot.volume * 100.0).round() as u8),
            true,
        )
}

/// Carga de un embed construido a mano: lo que produce el constructor
/// interactivo y lo que el panel manda con "enviar embed".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmbedSpec {
    pub title: String,
    pub description: Option<String>,
    /// Color en hex (`#5865F2`); inválido o ausente cae al acento del tema.
    pub colour: Option<String>,
    pub footer: Option<String>,
    pub image: Option<String>,
    pub thumbnail: Option<String>,
    pub author: Option<String>,
    /// Canal de texto destino, por nombre.
    pub channel: String,
    pub fields: Vec<(String, String, bool)>,
}

impl EmbedSpec {
    pub fn build(&self) -> CreateEmbed {
        let colour = self
            .colour
            .as_deref()
            .and_then(parse_hex_colour)
            .unwrap_or(colors::ACCENT);

        let mut embed = CreateEmbed::default()
            .title(self.title.as_str())
            .colour(colour)
            .timestamp(Timestamp::now());

        if let Some(description) = self.description.as_deref().filter(|text| !text.is_empty()) {
            embed = embed.description(description);
        }
        if let Some(footer) = self.footer.as_deref() {
            embed = embed.footer(CreateEmbedFooter::new(footer));
        }
        if let Some(image) = self.image.as_deref() {
            embed = embed.image(image);
        }
        if let Some(thumbnail) = self.thumbnail.as_deref() {
            embed = embed.thumbnail(thumbnail);
        }
        if let Some(author) = self.author.as_deref() {
            embed = embed.author(CreateEmbedAuthor::new(author));
        }
        for (name, value, inline) in &self.fields {
            embed = embed.field(name.as_str(), value.as_str(), *inline);
        }
        embed
    }
}

pub fn parse_hex_colour(text: &str) -> Option<Colour> {
    let hex = text.trim().trim_start_matches('#');
    if hex.len() != 6 {
        return None;
    }
    u32::from_str_radix(hex, 16).ok().map(Colour::new)
}

pub fn format_track_duration(secs: u64) -> String {
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes}:{seconds:02}")
    }
}
