use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use serenity::model::id::GuildId;
use tracing::{debug, info, warn};

use crate::{
    audio::{
        queue::TrackQueue,
        track::Track,
        voice::{PlaybackDone, VoiceSession},
    },
    error::PlayerError,
    sources::Resolver,
};

/// Destino del anuncio "reproduciendo ahora" (el canal de texto que originó
/// la reproducción). Sus fallos se registran y nunca abortan el loop.
#[async_trait]
pub trait Announcer: Send + Sync {
    async fn now_playing(&self, track: &Track) -> anyhow::Result<()>;
}

/// Estado de reproducción de una guild: cola FIFO, pista actual, flag de
/// autoplay y el task del loop (a lo sumo uno vivo por guild).
///
/// Toda mutación de cola y toda transición de reproducción pasa por aquí.
pub struct GuildPlayer {
    guild_id: GuildId,
    queue: TrackQueue,
    current: parking_lot::RwLock<Option<Track>>,
    autoplay: AtomicBool,
    session: parking_lot::RwLock<Option<Arc<dyn VoiceSession>>>,
    // Guarda la decisión "arrancar el loop"; nunca se retiene durante
    // llamadas al resolver ni al transporte.
    loop_task: tokio::sync::Mutex<Option<tokio::task::JoinHandle<()>>>,
    resolver: Arc<dyn Resolver>,
}

impl GuildPlayer {
    pub fn new(guild_id: GuildId, resolver: Arc<dyn Resolver>, autoplay: bool) -> Self {
        Self {
            guild_id,
            queue: TrackQueue::new(),
            current: parking_lot::RwLock::new(None),
            autoplay: AtomicBool::new(autoplay),
            session: parking_lot::RwLock::new(None),
            loop_task: tokio::sync::Mutex::new(None),
            resolver,
        }
    }

    /// Agrega pistas al final de la cola, en orden. No arranca nada:
    /// el arranque del loop es una operación separada y explícita.
    pub fn enqueue(&self, tracks: impl IntoIterator<Item = Track>) {
        self.queue.push_all(tracks);
    }

    /// Vista ordenada de la cola sin consumirla.
    pub fn peek_queue(&self) -> Vec<Track> {
        self.queue.snapshot()
    }

    /// La pista sonando ahora, o la última reproducida.
    pub fn current_track(&self) -> Option<Track> {
        self.current.read().clone()
    }

    pub fn set_autoplay(&self, enabled: bool) {
        self.autoplay.store(enabled, Ordering::Relaxed);
        info!("🔁 Autoplay {} en guild {}", if enabled { "on" } else { "off" }, self.guild_id);
    }

    pub fn autoplay(&self) -> bool {
        self.autoplay.load(Ordering::Relaxed)
    }

    /// Arranca el loop de reproducción si no hay uno vivo.
    ///
    /// Chequeo y arranque son atómicos bajo el mutex de la guild, así que
    /// arranques concurrentes producen a lo sumo un task.
    pub async fn start_if_needed(
        self: &Arc<Self>,
        session: Arc<dyn VoiceSession>,
        announcer: Arc<dyn Announcer>,
    ) {
        let mut guard = self.loop_task.lock().await;
        if let Some(handle) = guard.as_ref() {
            if !handle.is_finished() {
                return;
            }
        }

        *self.session.write() = Some(Arc::clone(&session));

        let player = Arc::clone(self);
        *guard = Some(tokio::spawn(async move {
            player.playback_loop(session, announcer).await;
        }));
    }

    /// Corta la fuente actual; la señal de fin resultante hace avanzar el
    /// loop a la siguiente pista. La cola no se toca.
    pub async fn skip(&self) -> Result<(), PlayerError> {
        let session = { self.session.read().clone() };
        let session = session.ok_or(PlayerError::Disconnected)?;
        session.stop().await;
        Ok(())
    }

    pub async fn pause(&self) -> Result<(), PlayerError> {
        let session = { self.session.read().clone() };
        let session = session.ok_or(PlayerError::Disconnected)?;
        session.pause().await;
        Ok(())
    }

    pub async fn resume(&self) -> Result<(), PlayerError> {
        let session = { self.session.read().clone() };
        let session = session.ok_or(PlayerError::Disconnected)?;
        session.resume().await;
        Ok(())
    }

    /// Descarta toda la cola y corta la fuente actual. El loop no termina:
    /// queda esperando nuevas pistas (o la desconexión del canal).
    pub async fn stop(&self) {
        self.queue.clear();
        let session = { self.session.read().clone() };
        if let Some(session) = session {
            session.stop().await;
        }
    }

    pub async fn is_playing(&self) -> bool {
        let session = { self.session.read().clone() };
        match session {
            Some(session) => session.is_playing().await,
            None => false,
        }
    }

    /// Ciclo de vida del loop: autoplay → dequeue → anunciar → reproducir →
    /// esperar fin → chequear conexión. Termina solo al desconectarse.
    async fn playback_loop(self: Arc<Self>, session: Arc<dyn VoiceSession>, announcer: Arc<dyn Announcer>) {
        info!("▶️ Loop de reproducción iniciado en guild {}", self.guild_id);
        let closed = session.closed();

        loop {
            // Única vía de crecimiento de cola por autoplay: un intento por
            // observación de cola vacía; si no hay recomendación, la cola
            // queda vacía y el loop se bloquea más abajo.
            if self.queue.is_empty() && self.autoplay() {
                let seed = { self.current.read().clone() };
                if let Some(seed) = seed {
                    match self.resolver.related_to(seed.page_url()).await {
                        Some(next) => {
                            info!("🔁 Autoplay: {} → {}", seed.title(), next.title());
                            self.queue.push(next);
                        }
                        None => debug!("Autoplay sin recomendación para {}", seed.title()),
                    }
                }
            }

            let track = tokio::select! {
                track = self.queue.pop() => track,
                _ = closed.cancelled() => break,
            };
            *self.current.write() = Some(track.clone());

            if let Err(e) = announcer.now_playing(&track).await {
                warn!("⚠️ No se pudo anunciar {}: {}", track.title(), e);
            }

            let (done, done_rx) = PlaybackDone::pair();
            match session.play(track.stream_url(), done).await {
                Ok(()) => {
                    tokio::select! {
                        result = done_rx => match result {
                            Ok(Some(stream_err)) => {
                                warn!("❌ Error de transporte en {}: {}", track.title(), stream_err)
                            }
                            Ok(None) => debug!("Fin de {}", track.title()),
                            // La señal se perdió (driver caído): tratar como fin.
                            Err(_) => debug!("Señal de fin descartada para {}", track.title()),
                        },
                        _ = closed.cancelled() => break,
                    }
                }
                Err(e) => warn!("❌ No se pudo iniciar {}: {}", track.title(), e),
            }

            if !session.is_connected().await {
                break;
            }
        }

        info!("⏹️ Loop de reproducción terminado en guild {}", self.guild_id);
    }
}

/// Mapa proceso-global guild → player, creado perezosamente y nunca
/// removido. Es el único estado mutable compartido entre guilds.
pub struct PlayerRegistry {
    players: DashMap<GuildId, Arc<GuildPlayer>>,
    resolver: Arc<dyn Resolver>,
    autoplay_default: bool,
}

impl PlayerRegistry {
    pub fn new(resolver: Arc<dyn Resolver>, autoplay_default: bool) -> Self {
        Self {
            players: DashMap::new(),
            resolver,
            autoplay_default,
        }
    }

    /// Devuelve el player de la guild, creándolo en el primer acceso.
    pub fn get(&self, guild_id: GuildId) -> Arc<GuildPlayer> {
        self.players
            .entry(guild_id)
            .or_insert_with(|| {
                debug!("Nuevo player para guild {}", guild_id);
                Arc::new(GuildPlayer::new(
                    guild_id,
                    Arc::clone(&self.resolver),
                    self.autoplay_default,
                ))
            })
            .clone()
    }
}
