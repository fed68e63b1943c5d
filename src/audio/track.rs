use std::time::Duration;

use crate::error::PlayerError;

/// Una pista reproducible, inmutable una vez construida.
///
/// El constructor garantiza el invariante central de la cola: toda `Track`
/// que existe tiene un `stream_url` no vacío, así que nada inreproducible
/// puede llegar al transporte de voz.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    source_query: String,
    title: String,
    page_url: String,
    stream_url: String,
    duration: Option<Duration>,
    uploader: Option<String>,
    id: Option<String>,
}

impl Track {
    /// Crea una pista validando que tenga stream de audio directo.
    pub fn new(
        source_query: impl Into<String>,
        title: impl Into<String>,
        page_url: impl Into<String>,
        stream_url: impl Into<String>,
    ) -> Result<Self, PlayerError> {
        let title = title.into();
        let stream_url = stream_url.into();
        if stream_url.trim().is_empty() {
            return Err(PlayerError::StreamUnavailable(title));
        }

        Ok(Self {
            source_query: source_query.into(),
            title,
            page_url: page_url.into(),
            stream_url,
            duration: None,
            uploader: None,
            id: None,
        })
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn with_uploader(mut self, uploader: impl Into<String>) -> Self {
        self.uploader = Some(uploader.into());
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Consulta o URL original que pidió el usuario.
    pub fn source_query(&self) -> &str {
        &self.source_query
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Página canónica de la pista, usable para buscar relacionadas.
    pub fn page_url(&self) -> &str {
        &self.page_url
    }

    /// Stream de audio directo que consume el transporte de voz.
    pub fn stream_url(&self) -> &str {
        &self.stream_url
    }

    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    pub fn uploader(&self) -> Option<&str> {
        self.uploader.as_deref()
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}
