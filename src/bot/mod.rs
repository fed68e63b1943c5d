//! Capa de comandos del bot: registro de slash commands, conexión a voz y
//! despacho de interacciones hacia el motor de reproducción.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use serenity::{
    all::{ChannelId, Context, EventHandler, GuildId, Interaction, Ready, UserId},
    builder::CreateMessage,
};
use tracing::{error, info, warn};

use crate::audio::voice::VoiceSession;

pub mod commands;
pub mod handlers;

use crate::{
    audio::{Announcer, PlayerRegistry, SongbirdSession, Track},
    config::Config,
    error::PlayerError,
    sources::Resolver,
    ui::embeds,
};

/// Handler principal del bot de música.
pub struct MelodiaBot {
    pub config: Arc<Config>,
    pub registry: Arc<PlayerRegistry>,
    pub resolver: Arc<dyn Resolver>,
    /// Sesión de voz activa por guild
    sessions: DashMap<GuildId, Arc<SongbirdSession>>,
}

impl MelodiaBot {
    pub fn new(config: Config, resolver: Arc<dyn Resolver>) -> Self {
        let registry = Arc::new(PlayerRegistry::new(
            Arc::clone(&resolver),
            config.enable_autoplay,
        ));

        Self {
            config: Arc::new(config),
            registry,
            resolver,
            sessions: DashMap::new(),
        }
    }

    /// Registra comandos globales o por guild según configuración.
    async fn register_commands(&self, ctx: &Context) -> Result<()> {
        info!("📝 Registrando comandos slash...");
        info!("🔧 Application ID: {}", self.config.application_id);

        match self.config.guild_id {
            Some(guild_id) => {
                let guild_id = GuildId::from(guild_id);
                commands::register_guild_commands(ctx, guild_id).await?;
                info!("✅ Comandos registrados para guild {}", guild_id);
            }
            None => {
                commands::register_global_commands(ctx).await?;
                info!("✅ Comandos globales registrados");
            }
        }

        Ok(())
    }

    /// Garantiza una sesión de voz en el canal del usuario.
    ///
    /// Falla con [`PlayerError::NotInVoiceChannel`] si el usuario no está en
    /// voz; si el bot ya está conectado en otro canal, se mueve.
    pub async fn ensure_voice(
        &self,
        ctx: &Context,
        guild_id: GuildId,
        user_id: UserId,
    ) -> Result<Arc<SongbirdSession>> {
        let channel_id = get_user_voice_channel(ctx, guild_id, user_id)?;

        let manager = songbird::get(ctx)
            .await
            .ok_or_else(|| anyhow::anyhow!("Songbird no inicializado"))?;

        if let Some(session) = self.sessions.get(&guild_id).map(|s| Arc::clone(&s)) {
            if session.is_connected().await {
                let current = { session.call().lock().await.current_channel() };
                if current == Some(channel_id.into()) {
                    return Ok(session);
                }
                // El usuario está en otro canal: mover el bot
                manager.join(guild_id, channel_id).await?;
                return Ok(session);
            }
            self.sessions.remove(&guild_id);
        }

        let call = manager.join(guild_id, channel_id).await?;
        {
            let mut guard = call.lock().await;
            if let Err(e) = guard.deafen(true).await {
                warn!("⚠️ No se pudo ensordecer el bot: {:?}", e);
            }
        }

        let session = SongbirdSession::new(call).await;
        self.sessions.insert(guild_id, Arc::clone(&session));
        info!("🔊 Conectado al canal de voz en guild {}", guild_id);
        Ok(session)
    }

    /// Desconecta el bot del canal de voz de la guild.
    ///
    /// El loop de esa guild observa la desconexión y termina; una petición
    /// posterior puede recrearlo.
    pub async fn leave_voice_channel(&self, ctx: &Context, guild_id: GuildId) -> Result<()> {
        let manager = songbird::get(ctx)
            .await
            .ok_or_else(|| anyhow::anyhow!("Songbird no inicializado"))?;

        if manager.get(guild_id).is_some() {
            manager.remove(guild_id).await?;
        }

        if let Some((_, session)) = self.sessions.remove(&guild_id) {
            session.closed().cancel();
        }

        info!("👋 Desconectado del canal de voz en guild {}", guild_id);
        Ok(())
    }

    pub fn session(&self, guild_id: GuildId) -> Option<Arc<SongbirdSession>> {
        self.sessions.get(&guild_id).map(|s| Arc::clone(&s))
    }
}

#[async_trait]
impl EventHandler for MelodiaBot {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("🤖 Conectado como {} (ID: {})", ready.user.name, ready.user.id);

        if let Err(e) = self.register_commands(&ctx).await {
            error!("❌ Error registrando comandos: {:?}", e);
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        if let Interaction::Command(command) = interaction {
            if let Err(e) = handlers::handle_command(&ctx, command, self).await {
                error!("❌ Error manejando comando: {:?}", e);
            }
        }
    }
}

/// Anuncia "reproduciendo ahora" en el canal de texto que originó el /play.
pub struct ChannelAnnouncer {
    http: Arc<serenity::http::Http>,
    channel_id: ChannelId,
}

impl ChannelAnnouncer {
    pub fn new(http: Arc<serenity::http::Http>, channel_id: ChannelId) -> Arc<Self> {
        Arc::new(Self { http, channel_id })
    }
}

#[async_trait]
impl Announcer for ChannelAnnouncer {
    async fn now_playing(&self, track: &Track) -> Result<()> {
        let embed = embeds::create_now_playing_embed(track);
        self.channel_id
            .send_message(&self.http, CreateMessage::new().embed(embed))
            .await?;
        Ok(())
    }
}

// Funciones auxiliares

fn get_user_voice_channel(
    ctx: &Context,
    guild_id: GuildId,
    user_id: UserId,
) -> Result<ChannelId> {
    let guild = guild_id
        .to_guild_cached(&ctx.cache)
        .ok_or_else(|| anyhow::anyhow!("Guild no encontrada en caché"))?;

    let channel_id = guild
        .voice_states
        .get(&user_id)
        .and_then(|voice_state| voice_state.channel_id)
        .ok_or(PlayerError::NotInVoiceChannel)?;

    Ok(channel_id)
}
