use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

use crate::locale::Lang;

/// Archivo plano de configuración, al lado del binario.
pub const CONFIG_FILE: &str = "bot_config.json";

/// Presencia del bot en Discord.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceMode {
    Online,
    Idle,
    Dnd,
}

/// Nivel de log persistido en la configuración (sobreescribible con RUST_LOG).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    pub fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Registro plano de configuración del bot.
///
/// Es el contrato con el panel de escritorio: un único documento JSON con
/// claves conocidas. Los valores ausentes caen a los defaults y un archivo
/// corrupto nunca impide arrancar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub token: String,
    pub prefix: String,
    pub bot_name: String,
    pub status: PresenceMode,
    pub activity: String,
    pub log_level: LogLevel,
    pub lang: Lang,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            token: String::new(),
            prefix: "!".to_string(),
            bot_name: "MyBot".to_string(),
            status: PresenceMode::Online,
            activity: String::new(),
            log_level: LogLevel::Info,
            lang: Lang::En,
        }
    }
}

impl Settings {
    /// Carga la configuración desde `bot_config.json`, con el token
    /// sobreescribible vía `DISCORD_TOKEN` (y `.env` si existe).
    pub fn load() -> Self {
        dotenvy::dotenv().ok();

        let mut settings = Self::load_from(Path::new(CONFIG_FILE));
        if let Ok(token) = std::env::var("DISCORD_TOKEN") {
            if !token.trim().is_empty() {
                settings.token = token;
            }
        }
        settings
    }

    /// Carga desde una ruta concreta. Archivo ausente o corrupto → defaults.
    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(settings) => settings,
                Err(e) => {
                    warn!("⚠️ Configuración inválida en {}: {e}; usando defaults", path.display());
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(Path::new(CONFIG_FILE))
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Comprobaciones de sanidad previas al arranque. El token se valida
    /// aparte en el controlador (MissingToken tiene su propio reporte).
    pub fn validate(&self) -> Result<()> {
        if self.prefix.trim().is_empty() {
            anyhow::bail!("command prefix cannot be empty");
        }
        if self.prefix.chars().any(char::is_whitespace) {
            anyhow::bail!("command prefix cannot contain whitespace");
        }
        if self.bot_name.trim().is_empty() {
            anyhow::bail!("bot name cannot be empty");
        }
        Ok(())
    }

    /// Texto de presencia: la actividad configurada o `<prefix>help`.
    pub fn activity_text(&self) -> String {
        if self.activity.trim().is_empty() {
            format!("{}help", self.prefix)
        } else {
            self.activity.clone()
        }
    }

    /// Resumen apto para logs: nunca incluye el token.
    pub fn summary(&self) -> String {
        format!(
            "Config: bot `{}`, prefijo `{}`, presencia {:?}, log {:?}, idioma {:?}, token {}",
            self.bot_name,
            self.prefix,
            self.status,
            self.log_level,
            self.lang,
            if self.token.trim().is_empty() { "ausente" } else { "configurado" },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_from(&dir.path().join("nope.json"));
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.prefix, "!");
        assert_eq!(settings.bot_name, "MyBot");
    }

    #[test]
    fn corrupt_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bot_config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(Settings::load_from(&path), Settings::default());
    }

    #[test]
    fn settings_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bot_config.json");

        let settings = Settings {
            token: "abc123".into(),
            prefix: "?".into(),
            bot_name: "Chispa".into(),
            status: PresenceMode::Dnd,
            activity: "con el panel".into(),
            log_level: LogLevel::Debug,
            lang: Lang::It,
        };
        settings.save_to(&path).unwrap();

        assert_eq!(Settings::load_from(&path), settings);
    }

    #[test]
    fn enums_use_the_wire_spelling() {
        let raw = r#"{"status":"dnd","log_level":"WARNING","lang":"pl"}"#;
        let settings: Settings = serde_json::from_str(raw).unwrap();
        assert_eq!(settings.status, PresenceMode::Dnd);
        assert_eq!(settings.log_level, LogLevel::Warning);
        assert_eq!(settings.lang, Lang::Pl);
    }

    #[test]
    fn validate_rejects_bad_prefixes() {
        let mut settings = Settings::default();
        settings.prefix = "".into();
        assert!(settings.validate().is_err());

        settings.prefix = "! ".into();
        assert!(settings.validate().is_err());

        settings.prefix = "!!".into();
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn activity_falls_back_to_help() {
        let mut settings = Settings::default();
        assert_eq!(settings.activity_text(), "!help");

        settings.activity = "música".into();
        assert_eq!(settings.activity_text(), "música");
    }
}
