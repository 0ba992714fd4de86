//! Textos de respuesta del bot en los tres idiomas del panel (en/it/pl).
//!
//! Las plantillas usan marcadores `{asi}` que el llamador sustituye con
//! `str::replace`; una clave desconocida se devuelve tal cual y un idioma
//! sin traducción cae al inglés.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    En,
    It,
    Pl,
}

impl Default for Lang {
    fn default() -> Self {
        Lang::En
    }
}

pub fn tr(lang: Lang, key: &str) -> &str {
    let localized = match lang {
        Lang::En => en(key),
        Lang::It => it(key),
        Lang::Pl => pl(key),
    };
    localized.or_else(|| en(key)).unwrap_or(key)
}

fn en(key: &str) -> Option<&'static str> {
    Some(match key {
        // música
        "footer_music" => "Music Player",
        "err_title" => "Error",
        "err_voice" => "You must be in a voice channel first.",
        "err_no_song" => "Nothing is playing right now.",
        "err_not_paused" => "Playback is not paused.",
        "err_vol_range" => "Volume must be between 0 and 100.",
        "err_play_usage" => "Usage: `play <search or URL>`.",
        "err_music_off" => "Music commands are unavailable (the music extension failed to load).",
        "err_track" => "Could not play `{ref}`: {err}",
        "now_playing" => "Now Playing",
        "added_queue" => "Added to Queue",
        "position" => "Position",
        "duration" => "Duration",
        "uploader" => "Uploader",
        "paused_t" => "Paused",
        "playback_paused" => "Playback paused.",
        "resumed_t" => "Resumed",
        "playback_resumed" => "Playback resumed.",
        "skipped_t" => "Skipped",
        "song_skipped" => "Current song skipped.",
        "stopped_t" => "Stopped",
        "stop_msg" => "Playback stopped and queue cleared.",
        "queue_title" => "Music Queue",
        "now_playing_lbl" => "Now playing",
        "queue_empty" => "The queue is empty.",
        "next_songs" => "Next songs ({n})",
        "loop_lbl" => "Loop",
        "loop_on" => "On",
        "loop_off" => "Off",
        "loop_title" => "Loop",
        "loop_status_on" => "Loop enabled: the current song will repeat.",
        "loop_status_off" => "Loop disabled.",
        "volume_lbl" => "Volume",
        "vol_title" => "Volume",
        "vol_set" => "Volume set to {vol}%.",
        "queue_clear_t" => "Queue Cleared",
        "queue_cleared" => "Removed {n} pending songs.",
        "connected_t" => "Connected",
        "connected_to" => "Joined your voice channel.",
        "disconnected_t" => "Disconnected",
        "disconnected_msg" => "Left the voice channel.",
        // moderación
        "footer_admin" => "Administration",
        "no_reason" => "No reason given",
        "kicked" => "Member Kicked",
        "banned" => "Member Banned",
        "unbanned" => "Member Unbanned",
        "muted" => "Member Muted",
        "unmuted" => "Member Unmuted",
        "warned" => "Warning",
        "member" => "Member",
        "reason" => "Reason",
        "moderator" => "Moderator",
        "duration_lbl" => "Duration",
        "minutes" => "minutes",
        "purge_done" => "Purge Complete",
        "purge_msg" => "Deleted {n} messages.",
        "user_nf" => "That user is not in the ban list.",
        "member_nf" => "Mention the member the command applies to.",
        "no_perms" => "You do not have permission to use this command.",
        // constructor de embeds
        "embed_builder_t" => "Embed Builder",
        "eb_guide" => "I will ask for each part of the embed. Answer in this channel.",
        "eb_title_q" => "What is the **title**?",
        "eb_desc_q" => "What is the **description**?",
        "eb_color_q" => "Which **color**? (hex, e.g. `#5865F2`)",
        "eb_footer_q" => "Footer text?",
        "eb_image_q" => "Image URL?",
        "eb_thumb_q" => "Thumbnail URL?",
        "eb_author_q" => "Author name?",
        "eb_add_field_q" => "Add a field? (`yes` / anything else to continue)",
        "eb_fname_q" => "Field name?",
        "eb_fval_q" => "Field value?",
        "eb_inline_q" => "Inline field? (`yes` / `no`)",
        "eb_another_q" => "Add another field? (`yes` / anything else)",
        "eb_preview" => "Preview:",
        "eb_confirm_q" => "Send it? (`yes` / anything else to cancel)",
        "eb_channel_q" => "Which channel? (`here` or a channel name)",
        "eb_sent" => "Embed Sent",
        "eb_sent_msg" => "Embed sent to {ch}.",
        "eb_cancelled" => "Cancelled",
        "eb_cancel_msg" => "The embed was discarded.",
        "eb_timeout_msg" => "Time ran out; the embed builder was aborted.",
        "eb_skip_hint" => " *(type `{skip}` to skip)*",
        "skip_word" => "skip",
        "yes_word" => "yes",
        "here_word" => "here",
        "err_channel_nf" => "Channel `{ch}` was not found.",
        // utilidades
        "server_info_t" => "Server Info",
        "owner" => "Owner",
        "members" => "Members",
        "created" => "Created",
        "text_ch" => "Text channels",
        "voice_ch" => "Voice channels",
        "roles" => "Roles",
        "emojis" => "Emojis",
        "verification" => "Verification",
        "server_id" => "Server ID",
        "user_info_t" => "User Info",
        "account_created" => "Account created",
        "joined" => "Joined",
        "top_role" => "Top role",
        "bot_info_t" => "Bot Info",
        "ping_lbl" => "Ping",
        "servers" => "Servers",
        "users" => "Users",
        "commands_lbl" => "Commands",
        "pong" => "Pong!",
        "latency" => "Latency: {ms} ms",
        "announcement" => "Announcement",
        "ann_sent" => "Announcement Sent",
        "ann_sent_msg" => "Announcement posted in {ch}.",
        "err_announce_usage" => "Usage: `announce #channel <message>`.",
        "err_quickembed_usage" => "Usage: `quickembed Title|Description|#Color`.",
        _ => return None,
    })
}

fn it(key: &str) -> Option<&'static str> {
    Some(match key {
        // musica
        "footer_music" => "Lettore Musicale",
        "err_title" => "Errore",
        "err_voice" => "Devi prima entrare in un canale vocale.",
        "err_no_song" => "Non c'è nulla in riproduzione.",
        "err_not_paused" => "La riproduzione non è in pausa.",
        "err_vol_range" => "Il volume deve essere tra 0 e 100.",
        "err_play_usage" => "Uso: `play <ricerca o URL>`.",
        "err_music_off" => "Comandi musicali non disponibili (estensione musica non caricata).",
        "err_track" => "Impossibile riprodurre `{ref}`: {err}",
        "now_playing" => "In Riproduzione",
        "added_queue" => "Aggiunta alla Coda",
        "position" => "Posizione",
        "duration" => "Durata",
        "uploader" => "Caricato da",
        "paused_t" => "Pausa",
        "playback_paused" => "Riproduzione in pausa.",
        "resumed_t" => "Ripresa",
        "playback_resumed" => "Riproduzione ripresa.",
        "skipped_t" => "Saltata",
        "song_skipped" => "Canzone attuale saltata.",
        "stopped_t" => "Fermato",
        "stop_msg" => "Riproduzione fermata e coda svuotata.",
        "queue_title" => "Coda Musicale",
        "now_playing_lbl" => "In riproduzione",
        "queue_empty" => "La coda è vuota.",
        "next_songs" => "Prossime canzoni ({n})",
        "loop_lbl" => "Loop",
        "loop_on" => "Attivo",
        "loop_off" => "Spento",
        "loop_title" => "Loop",
        "loop_status_on" => "Loop attivato: la canzone attuale si ripeterà.",
        "loop_status_off" => "Loop disattivato.",
        "volume_lbl" => "Volume",
        "vol_title" => "Volume",
        "vol_set" => "Volume impostato al {vol}%.",
        "queue_clear_t" => "Coda Svuotata",
        "queue_cleared" => "Rimosse {n} canzoni in attesa.",
        "connected_t" => "Connesso",
        "connected_to" => "Entrato nel tuo canale vocale.",
        "disconnected_t" => "Disconnesso",
        "disconnected_msg" => "Uscito dal canale vocale.",
        // moderazione
        "footer_admin" => "Amministrazione",
        "no_reason" => "Nessun motivo indicato",
        "kicked" => "Membro Espulso",
        "banned" => "Membro Bannato",
        "unbanned" => "Ban Rimosso",
        "muted" => "Membro Silenziato",
        "unmuted" => "Silenzio Rimosso",
        "warned" => "Avvertimento",
        "member" => "Membro",
        "reason" => "Motivo",
        "moderator" => "Moderatore",
        "duration_lbl" => "Durata",
        "minutes" => "minuti",
        "purge_done" => "Pulizia Completata",
        "purge_msg" => "Eliminati {n} messaggi.",
        "user_nf" => "Quell'utente non è nella lista dei ban.",
        "member_nf" => "Menziona il membro a cui applicare il comando.",
        "no_perms" => "Non hai i permessi per usare questo comando.",
        // costruttore di embed
        "embed_builder_t" => "Costruttore di Embed",
        "eb_guide" => "Ti chiederò ogni parte dell'embed. Rispondi in questo canale.",
        "eb_title_q" => "Qual è il **titolo**?",
        "eb_desc_q" => "Qual è la **descrizione**?",
        "eb_color_q" => "Quale **colore**? (hex, es. `#5865F2`)",
        "eb_footer_q" => "Testo del footer?",
        "eb_image_q" => "URL dell'immagine?",
        "eb_thumb_q" => "URL della miniatura?",
        "eb_author_q" => "Nome dell'autore?",
        "eb_add_field_q" => "Aggiungere un campo? (`yes` / altro per continuare)",
        "eb_fname_q" => "Nome del campo?",
        "eb_fval_q" => "Valore del campo?",
        "eb_inline_q" => "Campo inline? (`yes` / `no`)",
        "eb_another_q" => "Un altro campo? (`yes` / altro)",
        "eb_preview" => "Anteprima:",
        "eb_confirm_q" => "Inviarlo? (`yes` / altro per annullare)",
        "eb_channel_q" => "In quale canale? (`here` o il nome di un canale)",
        "eb_sent" => "Embed Inviato",
        "eb_sent_msg" => "Embed inviato in {ch}.",
        "eb_cancelled" => "Annullato",
        "eb_cancel_msg" => "L'embed è stato scartato.",
        "eb_timeout_msg" => "Tempo scaduto; costruttore di embed annullato.",
        "eb_skip_hint" => " *(scrivi `{skip}` per saltare)*",
        "err_channel_nf" => "Canale `{ch}` non trovato.",
        // utilità
        "server_info_t" => "Info Server",
        "owner" => "Proprietario",
        "members" => "Membri",
        "created" => "Creato",
        "text_ch" => "Canali testuali",
        "voice_ch" => "Canali vocali",
        "roles" => "Ruoli",
        "emojis" => "Emoji",
        "verification" => "Verifica",
        "server_id" => "ID Server",
        "user_info_t" => "Info Utente",
        "account_created" => "Account creato",
        "joined" => "Entrato",
        "top_role" => "Ruolo più alto",
        "bot_info_t" => "Info Bot",
        "ping_lbl" => "Ping",
        "servers" => "Server",
        "users" => "Utenti",
        "commands_lbl" => "Comandi",
        "pong" => "Pong!",
        "latency" => "Latenza: {ms} ms",
        "announcement" => "Annuncio",
        "ann_sent" => "Annuncio Inviato",
        "ann_sent_msg" => "Annuncio pubblicato in {ch}.",
        "err_announce_usage" => "Uso: `announce #canale <messaggio>`.",
        "err_quickembed_usage" => "Uso: `quickembed Titolo|Descrizione|#Colore`.",
        _ => return None,
    })
}

fn pl(key: &str) -> Option<&'static str> {
    Some(match key {
        // muzyka
        "footer_music" => "Odtwarzacz Muzyki",
        "err_title" => "Błąd",
        "err_voice" => "Najpierw dołącz do kanału głosowego.",
        "err_no_song" => "Nic teraz nie gra.",
        "err_not_paused" => "Odtwarzanie nie jest wstrzymane.",
        "err_vol_range" => "Głośność musi być w zakresie 0-100.",
        "err_play_usage" => "Użycie: `play <fraza lub URL>`.",
        "err_music_off" => "Komendy muzyczne niedostępne (rozszerzenie muzyki nie wczytało się).",
        "err_track" => "Nie można odtworzyć `{ref}`: {err}",
        "now_playing" => "Teraz Gra",
        "added_queue" => "Dodano do Kolejki",
        "position" => "Pozycja",
        "duration" => "Czas trwania",
        "uploader" => "Autor",
        "paused_t" => "Pauza",
        "playback_paused" => "Odtwarzanie wstrzymane.",
        "resumed_t" => "Wznowiono",
        "playback_resumed" => "Odtwarzanie wznowione.",
        "skipped_t" => "Pominięto",
        "song_skipped" => "Bieżący utwór pominięty.",
        "stopped_t" => "Zatrzymano",
        "stop_msg" => "Odtwarzanie zatrzymane, kolejka wyczyszczona.",
        "queue_title" => "Kolejka Muzyczna",
        "now_playing_lbl" => "Teraz gra",
        "queue_empty" => "Kolejka jest pusta.",
        "next_songs" => "Następne utwory ({n})",
        "loop_lbl" => "Pętla",
        "loop_on" => "Włączona",
        "loop_off" => "Wyłączona",
        "loop_title" => "Pętla",
        "loop_status_on" => "Pętla włączona: bieżący utwór będzie się powtarzał.",
        "loop_status_off" => "Pętla wyłączona.",
        "volume_lbl" => "Głośność",
        "vol_title" => "Głośność",
        "vol_set" => "Głośność ustawiona na {vol}%.",
        "queue_clear_t" => "Kolejka Wyczyszczona",
        "queue_cleared" => "Usunięto {n} oczekujących utworów.",
        "connected_t" => "Połączono",
        "connected_to" => "Dołączyłem do twojego kanału głosowego.",
        "disconnected_t" => "Rozłączono",
        "disconnected_msg" => "Opuściłem kanał głosowy.",
        // moderacja
        "footer_admin" => "Administracja",
        "no_reason" => "Nie podano powodu",
        "kicked" => "Członek Wyrzucony",
        "banned" => "Członek Zbanowany",
        "unbanned" => "Ban Zdjęty",
        "muted" => "Członek Wyciszony",
        "unmuted" => "Wyciszenie Zdjęte",
        "warned" => "Ostrzeżenie",
        "member" => "Członek",
        "reason" => "Powód",
        "moderator" => "Moderator",
        "duration_lbl" => "Czas",
        "minutes" => "minut",
        "purge_done" => "Czyszczenie Zakończone",
        "purge_msg" => "Usunięto {n} wiadomości.",
        "user_nf" => "Tego użytkownika nie ma na liście banów.",
        "member_nf" => "Oznacz członka, którego dotyczy komenda.",
        "no_perms" => "Nie masz uprawnień do tej komendy.",
        // kreator embedów
        "embed_builder_t" => "Kreator Embedów",
        "eb_guide" => "Zapytam o każdą część embeda. Odpowiadaj na tym kanale.",
        "eb_title_q" => "Jaki **tytuł**?",
        "eb_desc_q" => "Jaki **opis**?",
        "eb_color_q" => "Jaki **kolor**? (hex, np. `#5865F2`)",
        "eb_footer_q" => "Tekst stopki?",
        "eb_image_q" => "URL obrazka?",
        "eb_thumb_q" => "URL miniatury?",
        "eb_author_q" => "Nazwa autora?",
        "eb_add_field_q" => "Dodać pole? (`yes` / cokolwiek innego, by kontynuować)",
        "eb_fname_q" => "Nazwa pola?",
        "eb_fval_q" => "Wartość pola?",
        "eb_inline_q" => "Pole inline? (`yes` / `no`)",
        "eb_another_q" => "Kolejne pole? (`yes` / cokolwiek innego)",
        "eb_preview" => "Podgląd:",
        "eb_confirm_q" => "Wysłać? (`yes` / cokolwiek innego, by anulować)",
        "eb_channel_q" => "Na który kanał? (`here` lub nazwa kanału)",
        "eb_sent" => "Embed Wysłany",
        "eb_sent_msg" => "Embed wysłany na {ch}.",
        "eb_cancelled" => "Anulowano",
        "eb_cancel_msg" => "Embed został odrzucony.",
        "eb_timeout_msg" => "Czas minął; kreator embedów przerwany.",
        "eb_skip_hint" => " *(wpisz `{skip}`, aby pominąć)*",
        "err_channel_nf" => "Nie znaleziono kanału `{ch}`.",
        // narzędzia
        "server_info_t" => "Informacje o Serwerze",
        "owner" => "Właściciel",
        "members" => "Członkowie",
        "created" => "Utworzono",
        "text_ch" => "Kanały tekstowe",
        "voice_ch" => "Kanały głosowe",
        "roles" => "Role",
        "emojis" => "Emoji",
        "verification" => "Weryfikacja",
        "server_id" => "ID Serwera",
        "user_info_t" => "Informacje o Użytkowniku",
        "account_created" => "Konto utworzone",
        "joined" => "Dołączył",
        "top_role" => "Najwyższa rola",
        "bot_info_t" => "Informacje o Bocie",
        "ping_lbl" => "Ping",
        "servers" => "Serwery",
        "users" => "Użytkownicy",
        "commands_lbl" => "Komendy",
        "pong" => "Pong!",
        "latency" => "Opóźnienie: {ms} ms",
        "announcement" => "Ogłoszenie",
        "ann_sent" => "Ogłoszenie Wysłane",
        "ann_sent_msg" => "Ogłoszenie opublikowane na {ch}.",
        "err_announce_usage" => "Użycie: `announce #kanał <wiadomość>`.",
        "err_quickembed_usage" => "Użycie: `quickembed Tytuł|Opis|#Kolor`.",
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn unknown_keys_echo_back() {
        assert_eq!(tr(Lang::En, "definitely_not_a_key"), "definitely_not_a_key");
    }

    #[test]
    fn missing_translation_falls_back_to_english() {
        // it/pl no traducen las palabras clave de confirmación a propósito
        assert_eq!(tr(Lang::It, "yes_word"), "yes");
        assert_eq!(tr(Lang::Pl, "here_word"), "here");
    }

    #[test]
    fn core_reply_keys_exist_in_every_language() {
        for key in ["err_voice", "now_playing", "no_perms", "eb_timeout_msg"] {
            for lang in [Lang::En, Lang::It, Lang::Pl] {
                assert_ne!(tr(lang, key), key, "missing `{key}` for {lang:?}");
            }
        }
    }

    #[test]
    fn templates_keep_their_placeholders() {
        assert!(tr(Lang::It, "vol_set").contains("{vol}"));
        assert!(tr(Lang::Pl, "purge_msg").contains("{n}"));
    }
}
