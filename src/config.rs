use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    // Discord
    pub discord_token: String,
    pub application_id: u64,
    pub guild_id: Option<u64>, // Para comandos de desarrollo

    // Resolución
    pub ytdlp_path: String,

    // Features
    pub enable_autoplay: bool,

    // UI
    pub queue_display_limit: usize,
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            // Discord
            discord_token: std::env::var("DISCORD_TOKEN")?,
            application_id: std::env::var("APPLICATION_ID")?.parse()?,
            guild_id: std::env::var("GUILD_ID").ok().and_then(|s| s.parse().ok()),

            // Resolución
            ytdlp_path: std::env::var("YTDLP_PATH").unwrap_or_else(|_| "yt-dlp".to_string()),

            // Features
            enable_autoplay: std::env::var("ENABLE_AUTOPLAY")
                .unwrap_or_else(|_| "false".to_string())
                .parse()?,

            // UI
            queue_display_limit: std::env::var("QUEUE_DISPLAY_LIMIT")
                .unwrap_or_else(|_| "15".to_string())
                .parse()?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Chequeos de sanidad sobre la configuración cargada.
    pub fn validate(&self) -> Result<()> {
        if self.discord_token.trim().is_empty() {
            anyhow::bail!("DISCORD_TOKEN no puede estar vacío");
        }

        if self.application_id == 0 {
            anyhow::bail!("APPLICATION_ID inválido");
        }

        if self.ytdlp_path.trim().is_empty() {
            anyhow::bail!("YTDLP_PATH no puede estar vacío");
        }

        if self.queue_display_limit == 0 {
            anyhow::bail!("QUEUE_DISPLAY_LIMIT debe ser mayor que 0");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_base() -> Config {
        Config {
            discord_token: "token".into(),
            application_id: 1234,
            guild_id: None,
            ytdlp_path: "yt-dlp".into(),
            enable_autoplay: false,
            queue_display_limit: 15,
        }
    }

    #[test]
    fn config_valida_pasa() {
        assert!(config_base().validate().is_ok());
    }

    #[test]
    fn token_vacio_falla() {
        let mut config = config_base();
        config.discord_token = "  ".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn limite_de_cola_cero_falla() {
        let mut config = config_base();
        config.queue_display_limit = 0;
        assert!(config.validate().is_err());
    }
}
