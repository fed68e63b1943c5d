use std::collections::VecDeque;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tracing::debug;

use crate::audio::track::Track;

/// Cola FIFO por guild, segura para mutar desde los handlers de comandos
/// mientras el loop de reproducción consume.
///
/// Todo acceso pasa por el lock interno; el loop se suspende en [`pop`]
/// (sin busy-poll) hasta que haya una pista disponible.
///
/// [`pop`]: TrackQueue::pop
#[derive(Debug, Default)]
pub struct TrackQueue {
    items: Mutex<VecDeque<Track>>,
    notify: Notify,
}

impl TrackQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Agrega una pista al final de la cola.
    pub fn push(&self, track: Track) {
        debug!("➕ En cola: {}", track.title());
        self.items.lock().push_back(track);
        self.notify.notify_one();
    }

    /// Agrega varias pistas preservando el orden de llegada.
    pub fn push_all(&self, tracks: impl IntoIterator<Item = Track>) {
        for track in tracks {
            self.push(track);
        }
    }

    /// Extrae la cabeza de la cola, suspendiendo hasta que exista.
    ///
    /// Único consumidor previsto: el loop de reproducción de la guild.
    pub async fn pop(&self) -> Track {
        loop {
            if let Some(track) = self.items.lock().pop_front() {
                return track;
            }
            // notify_one guarda un permiso si llega antes que el waiter,
            // así que un push entre el chequeo y el await no se pierde.
            self.notify.notified().await;
        }
    }

    /// Descarta todas las pistas pendientes.
    pub fn clear(&self) {
        let mut items = self.items.lock();
        if !items.is_empty() {
            debug!("🗑️ Cola limpiada ({} pendientes)", items.len());
        }
        items.clear();
    }

    /// Copia ordenada del contenido actual, sin consumir nada.
    pub fn snapshot(&self) -> Vec<Track> {
        self.items.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use std::time::Duration;

    fn track(title: &str) -> Track {
        Track::new(
            title,
            title,
            format!("https://example.com/{title}"),
            format!("https://cdn.example.com/{title}.webm"),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn orden_fifo_estricto() {
        let queue = TrackQueue::new();
        queue.push_all([track("A"), track("B"), track("C")]);

        assert_eq!(queue.pop().await.title(), "A");
        assert_eq!(queue.pop().await.title(), "B");
        assert_eq!(queue.pop().await.title(), "C");
    }

    #[tokio::test]
    async fn snapshot_no_consume() {
        let queue = TrackQueue::new();
        queue.push_all([track("A"), track("B")]);

        let vista: Vec<_> = queue.snapshot().iter().map(|t| t.title().to_owned()).collect();
        assert_eq!(vista, vec!["A", "B"]);
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.pop().await.title(), "A");
    }

    #[tokio::test]
    async fn clear_vacia_todo() {
        let queue = TrackQueue::new();
        queue.push_all([track("A"), track("B"), track("C")]);

        queue.clear();
        assert!(queue.is_empty());
        assert!(queue.snapshot().is_empty());
    }

    #[tokio::test]
    async fn pop_suspende_hasta_push() {
        let queue = Arc::new(TrackQueue::new());

        let consumer = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.pop().await })
        };

        // El consumidor debe quedar bloqueado mientras la cola está vacía.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!consumer.is_finished());

        queue.push(track("tarde"));
        let got = tokio::time::timeout(Duration::from_secs(1), consumer)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(got.title(), "tarde");
    }

    #[tokio::test]
    async fn fifo_con_lecturas_intercaladas() {
        let queue = Arc::new(TrackQueue::new());

        let reader = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move {
                for _ in 0..100 {
                    let _ = queue.snapshot();
                    tokio::task::yield_now().await;
                }
            })
        };

        for i in 0..20 {
            queue.push(track(&format!("t{i:02}")));
        }
        reader.await.unwrap();

        for i in 0..20 {
            assert_eq!(queue.pop().await.title(), format!("t{i:02}"));
        }
    }
}
