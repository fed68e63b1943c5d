use std::sync::Arc;

use async_trait::async_trait;
use songbird::{
    tracks::{PlayMode, TrackHandle},
    Call, CoreEvent, Event, EventContext, EventHandler as VoiceEventHandler, TrackEvent,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::PlayerError;

/// Señal de fin de reproducción: exactamente un disparo observable por
/// intento, aunque el transporte emita End y Error para la misma pista.
#[derive(Debug)]
pub struct PlaybackDone {
    tx: parking_lot::Mutex<Option<tokio::sync::oneshot::Sender<Option<String>>>>,
}

impl PlaybackDone {
    /// Crea la señal del ciclo junto con su receptor.
    pub fn pair() -> (Arc<Self>, tokio::sync::oneshot::Receiver<Option<String>>) {
        let (tx, rx) = tokio::sync::oneshot::channel();
        (
            Arc::new(Self {
                tx: parking_lot::Mutex::new(Some(tx)),
            }),
            rx,
        )
    }

    /// Marca la reproducción como terminada; `error` registra un fallo de
    /// streaming para diagnóstico. Disparos posteriores son no-op.
    pub fn signal(&self, error: Option<String>) {
        if let Some(tx) = self.tx.lock().take() {
            let _ = tx.send(error);
        }
    }
}

/// Sesión de voz conectada a un canal.
///
/// `play` entrega el stream al transporte y registra la señal de fin;
/// `stop` corta solo la fuente actual (el disconnect real lo maneja la
/// capa del bot a través del manager de songbird).
#[async_trait]
pub trait VoiceSession: Send + Sync {
    async fn play(&self, stream_url: &str, done: Arc<PlaybackDone>) -> Result<(), PlayerError>;
    async fn stop(&self);
    async fn pause(&self);
    async fn resume(&self);
    async fn is_playing(&self) -> bool;
    async fn is_connected(&self) -> bool;
    /// Token cancelado cuando el driver se desconecta del canal.
    fn closed(&self) -> CancellationToken;
}

/// Implementación real sobre un `Call` de songbird.
pub struct SongbirdSession {
    call: Arc<tokio::sync::Mutex<Call>>,
    http: reqwest::Client,
    active: parking_lot::Mutex<Option<TrackHandle>>,
    closed: CancellationToken,
}

impl SongbirdSession {
    pub async fn new(call: Arc<tokio::sync::Mutex<Call>>) -> Arc<Self> {
        let closed = CancellationToken::new();

        {
            let mut guard = call.lock().await;
            // Una reconexión reutiliza el mismo Call: no acumular watchers.
            guard.remove_all_global_events();
            guard.add_global_event(
                Event::Core(CoreEvent::DriverDisconnect),
                DisconnectWatcher {
                    closed: closed.clone(),
                },
            );
        }

        Arc::new(Self {
            call,
            http: reqwest::Client::new(),
            active: parking_lot::Mutex::new(None),
            closed,
        })
    }

    pub fn call(&self) -> Arc<tokio::sync::Mutex<Call>> {
        Arc::clone(&self.call)
    }
}

#[async_trait]
impl VoiceSession for SongbirdSession {
    async fn play(&self, stream_url: &str, done: Arc<PlaybackDone>) -> Result<(), PlayerError> {
        let input = songbird::input::HttpRequest::new(self.http.clone(), stream_url.to_owned());

        let handle = {
            let mut call = self.call.lock().await;
            call.play_input(input.into())
        };

        handle
            .add_event(
                Event::Track(TrackEvent::End),
                TrackDoneNotifier {
                    done: Arc::clone(&done),
                    failed: false,
                },
            )
            .map_err(|e| PlayerError::Transport(e.to_string()))?;
        handle
            .add_event(
                Event::Track(TrackEvent::Error),
                TrackDoneNotifier { done, failed: true },
            )
            .map_err(|e| PlayerError::Transport(e.to_string()))?;

        *self.active.lock() = Some(handle);
        Ok(())
    }

    async fn stop(&self) {
        let handle = self.active.lock().take();
        if let Some(handle) = handle {
            // stop() dispara el TrackEvent::End, que a su vez dispara la
            // señal de fin del ciclo en curso.
            let _ = handle.stop();
        }
    }

    async fn pause(&self) {
        let handle = self.active.lock().clone();
        if let Some(handle) = handle {
            let _ = handle.pause();
        }
    }

    async fn resume(&self) {
        let handle = self.active.lock().clone();
        if let Some(handle) = handle {
            let _ = handle.play();
        }
    }

    async fn is_playing(&self) -> bool {
        let handle = self.active.lock().clone();
        match handle {
            Some(handle) => match handle.get_info().await {
                Ok(info) => matches!(info.playing, PlayMode::Play),
                Err(_) => false,
            },
            None => false,
        }
    }

    async fn is_connected(&self) -> bool {
        self.call.lock().await.current_connection().is_some()
    }

    fn closed(&self) -> CancellationToken {
        self.closed.clone()
    }
}

/// Dispara la señal de fin cuando songbird reporta End o Error del track.
struct TrackDoneNotifier {
    done: Arc<PlaybackDone>,
    failed: bool,
}

#[async_trait]
impl VoiceEventHandler for TrackDoneNotifier {
    async fn act(&self, ctx: &EventContext<'_>) -> Option<Event> {
        if self.failed {
            let mut detail = String::from("fallo de streaming");
            if let EventContext::Track(track_list) = ctx {
                if let Some((state, _)) = track_list.first() {
                    detail = format!("{:?}", state.playing);
                }
            }
            warn!("❌ Track terminó con error: {}", detail);
            self.done.signal(Some(detail));
        } else {
            debug!("🎵 Track terminado");
            self.done.signal(None);
        }
        None
    }
}

/// Cancela el token de la sesión cuando el driver pierde el canal.
struct DisconnectWatcher {
    closed: CancellationToken,
}

#[async_trait]
impl VoiceEventHandler for DisconnectWatcher {
    async fn act(&self, _ctx: &EventContext<'_>) -> Option<Event> {
        debug!("🔌 Driver de voz desconectado");
        self.closed.cancel();
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn playback_done_entrega_una_sola_vez() {
        let (done, rx) = PlaybackDone::pair();

        done.signal(None);
        // El segundo disparo (p.ej. End después de Error) es un no-op.
        done.signal(Some("tarde".into()));

        assert_eq!(rx.await.unwrap(), None);
    }

    #[tokio::test]
    async fn playback_done_propaga_error_de_stream() {
        let (done, rx) = PlaybackDone::pair();
        done.signal(Some("corte de red".into()));
        assert_eq!(rx.await.unwrap(), Some("corte de red".into()));
    }
}
