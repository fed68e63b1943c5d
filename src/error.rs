use thiserror::Error;

/// Taxonomía de errores del motor de reproducción.
///
/// Ningún error de esta familia es fatal para el proceso: los errores de
/// acciones explícitas se reportan al usuario que las pidió, los del camino
/// de autoplay se absorben en el loop, y `Disconnected` marca el fin de vida
/// del loop de una guild sin afectar a las demás.
#[derive(Debug, Error)]
pub enum PlayerError {
    /// El usuario que pidió la acción no está en un canal de voz.
    #[error("debes estar en un canal de voz")]
    NotInVoiceChannel,

    /// El resolver no pudo convertir la consulta en pistas reproducibles.
    #[error("no se pudo resolver la consulta: {0}")]
    Resolution(String),

    /// La pista no tiene stream de audio directo; se rechaza antes de
    /// llegar a la cola.
    #[error("sin stream de audio disponible: {0}")]
    StreamUnavailable(String),

    /// La sesión de voz reportó un fallo al iniciar o durante el stream.
    #[error("error del transporte de voz: {0}")]
    Transport(String),

    /// La sesión de voz ya no está conectada.
    #[error("desconectado del canal de voz")]
    Disconnected,
}
