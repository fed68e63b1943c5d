pub mod ytdlp;

pub use ytdlp::YtDlpResolver;

use async_trait::async_trait;

use crate::{audio::track::Track, error::PlayerError};

/// Frontera con el motor de resolución de medios.
///
/// El core nunca re-resuelve por su cuenta: construye pistas con lo que el
/// resolver devuelva y nada más.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Expande una URL, playlist o búsqueda de texto libre en pistas.
    ///
    /// Una búsqueda ambigua retiene solo el primer resultado; una playlist
    /// devuelve todas sus entradas reproducibles en orden. "Sin resultados"
    /// es un error de resolución.
    async fn expand(&self, query: &str) -> Result<Vec<Track>, PlayerError>;

    /// Recomienda una pista relacionada con la página dada.
    ///
    /// Nunca falla: intenta los videos relacionados de la página y cae a
    /// una búsqueda por título; si ambos caminos fallan devuelve `None`.
    async fn related_to(&self, page_url: &str) -> Option<Track>;
}
