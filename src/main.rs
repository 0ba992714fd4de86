use anyhow::Result;
use std::time::Duration;
use tracing::{debug, error, info};

mod bot;
mod config;
mod error;
mod lifecycle;
mod locale;
mod player;
mod sources;
mod ui;

use crate::config::Settings;
use crate::lifecycle::{LifecycleController, LifecycleState};

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load();
    init_tracing(&settings);

    info!("⚡ Iniciando open-dash v{}", env!("CARGO_PKG_VERSION"));

    if std::env::args().any(|arg| arg == "--health-check") {
        return health_check().await;
    }

    settings.validate()?;
    info!("{}", settings.summary());

    let controller = LifecycleController::new(settings);
    if let Err(e) = controller.start().await {
        error!("❌ No se pudo iniciar el bot: {e}");
        return Err(e.into());
    }

    // el primer plano sondea la superficie de observación cada 2 s, igual
    // que lo haría el panel de escritorio
    let mut poll = tokio::time::interval(Duration::from_secs(2));
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("⚠️ Señal de apagado recibida, cerrando...");
                break;
            }
            _ = poll.tick() => {
                let status = controller.status().await;
                if status.state == LifecycleState::Stopped {
                    error!("🛑 La sesión del bot terminó; saliendo");
                    break;
                }
                debug!("{status}");
            }
        }
    }

    controller.stop().await?;
    info!("👋 open-dash detenido");
    Ok(())
}

fn init_tracing(settings: &Settings) {
    let directives = format!(
        "open_dash={level},serenity=info,songbird=info",
        level = settings.log_level.as_directive()
    );
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(directives));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn health_check() -> Result<()> {
    let yt_dlp = async_process::Command::new("yt-dlp")
        .arg("--version")
        .output()
        .await?;

    let ffmpeg = async_process::Command::new("ffmpeg")
        .arg("-version")
        .output()
        .await?;

    if yt_dlp.status.success() && ffmpeg.status.success() {
        println!("OK");
        Ok(())
    } else {
        anyhow::bail!("Dependencias faltantes (yt-dlp / ffmpeg)");
    }
}
