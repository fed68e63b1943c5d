use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::process::Command;
use tracing::{debug, warn};
use url::Url;

use crate::{audio::track::Track, error::PlayerError, sources::Resolver};

/// Argumentos base para `yt-dlp`: un solo JSON por invocación, mejor audio
/// disponible, búsqueda de YouTube por defecto para texto libre.
const YTDLP_ARGS: &[&str] = &[
    "--dump-single-json",
    "--format",
    "bestaudio/best",
    "--default-search",
    "ytsearch",
    "--no-warnings",
    "--quiet",
    "--skip-download",
    "--no-cache-dir",
];

/// Resolver respaldado por el binario `yt-dlp`.
pub struct YtDlpResolver {
    binary: String,
}

impl YtDlpResolver {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Ejecuta `yt-dlp -J` y devuelve el info-dict crudo.
    async fn extract(&self, query: &str) -> Result<Value, PlayerError> {
        debug!("🔍 yt-dlp: {}", query);

        let output = Command::new(&self.binary)
            .args(YTDLP_ARGS)
            .arg("--")
            .arg(query)
            .output()
            .await
            .map_err(|e| {
                PlayerError::Resolution(format!("no se pudo ejecutar {}: {e}", self.binary))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PlayerError::Resolution(format!(
                "yt-dlp terminó con error: {}",
                stderr.trim()
            )));
        }

        serde_json::from_slice(&output.stdout)
            .map_err(|e| PlayerError::Resolution(format!("JSON inválido de yt-dlp: {e}")))
    }

    /// Convierte una entrada de playlist/búsqueda en pista, re-resolviendo
    /// una sola vez las entradas "flat" que vienen sin stream directo.
    async fn resolve_entry(&self, entry: &Value, query: &str) -> Result<Track, PlayerError> {
        if let Ok(track) = track_from_info(entry, query) {
            return Ok(track);
        }

        let page = entry["webpage_url"]
            .as_str()
            .or_else(|| entry["url"].as_str())
            .ok_or_else(|| PlayerError::Resolution("entrada sin referencia a página".into()))?;

        let full = self.extract(page).await?;
        track_from_info(&full, query)
    }

    /// Busca una recomendación: relacionados de la página, luego búsqueda
    /// por título + uploader. Devuelve `None` si nada funciona.
    async fn find_related(&self, page_url: &str) -> Option<Track> {
        let info = match self.extract(page_url).await {
            Ok(info) => info,
            Err(e) => {
                debug!("Autoplay: no se pudo extraer {}: {}", page_url, e);
                return None;
            }
        };

        for candidate in related_candidates(&info) {
            match self.expand(&candidate).await {
                Ok(mut tracks) if !tracks.is_empty() => return Some(tracks.remove(0)),
                Ok(_) => {}
                Err(e) => debug!("Autoplay: candidato {} descartado: {}", candidate, e),
            }
        }

        // Fallback: búsqueda por el mismo título y canal
        let title = info["title"].as_str()?;
        let uploader = info["uploader"].as_str().unwrap_or("");
        let query = format!("ytsearch1:{title} {uploader}");
        match self.expand(query.trim()).await {
            Ok(mut tracks) if !tracks.is_empty() => Some(tracks.remove(0)),
            Ok(_) => None,
            Err(e) => {
                debug!("Autoplay: búsqueda por título falló: {}", e);
                None
            }
        }
    }
}

#[async_trait]
impl Resolver for YtDlpResolver {
    async fn expand(&self, query: &str) -> Result<Vec<Track>, PlayerError> {
        let info = self.extract(query).await?;
        let mut tracks = Vec::new();

        if info["_type"].as_str() == Some("playlist") || info.get("entries").is_some() {
            let entries = info["entries"].as_array().cloned().unwrap_or_default();
            // Una búsqueda de texto libre retiene solo el primer resultado;
            // una playlist real conserva todas sus entradas.
            let keep = if is_search_result(&info) { 1 } else { entries.len() };

            for entry in entries.iter().take(keep) {
                if entry.is_null() {
                    continue;
                }
                match self.resolve_entry(entry, query).await {
                    Ok(track) => tracks.push(track),
                    Err(e) => warn!("⚠️ Entrada descartada de {}: {}", query, e),
                }
            }
        } else {
            tracks.push(track_from_info(&info, query)?);
        }

        if tracks.is_empty() {
            return Err(PlayerError::Resolution(format!(
                "sin resultados reproducibles para: {query}"
            )));
        }
        Ok(tracks)
    }

    async fn related_to(&self, page_url: &str) -> Option<Track> {
        if Url::parse(page_url).is_err() {
            debug!("Autoplay: referencia no es una URL: {}", page_url);
            return None;
        }
        self.find_related(page_url).await
    }
}

/// Construye una pista desde un info-dict completo de yt-dlp.
///
/// Las entradas sin campo `url` (stream directo) se rechazan con
/// `StreamUnavailable`; el que llama decide si re-resolver.
fn track_from_info(info: &Value, query: &str) -> Result<Track, PlayerError> {
    let title = info["title"].as_str().unwrap_or("Desconocido");
    let stream_url = info["url"].as_str().unwrap_or("");
    let page_url = info["webpage_url"]
        .as_str()
        .or_else(|| info["url"].as_str())
        .unwrap_or("");
    let source_query = info["original_url"]
        .as_str()
        .or_else(|| info["webpage_url"].as_str())
        .unwrap_or(query);

    let mut track = Track::new(source_query, title, page_url, stream_url)?;
    if let Some(secs) = info["duration"].as_f64() {
        track = track.with_duration(Duration::from_secs(secs as u64));
    }
    if let Some(uploader) = info["uploader"].as_str() {
        track = track.with_uploader(uploader);
    }
    if let Some(id) = info["id"].as_str() {
        track = track.with_id(id);
    }
    Ok(track)
}

/// Un resultado de `ytsearch` es una "playlist" sintética de un buscador.
fn is_search_result(info: &Value) -> bool {
    info["ie_key"]
        .as_str()
        .or_else(|| info["extractor_key"].as_str())
        .map(|key| key.to_lowercase().starts_with("youtubesearch"))
        .unwrap_or(false)
}

/// Candidatos recomendados de un info-dict: ids de 11 caracteres se
/// normalizan a URL de watch, el resto se usa tal cual.
fn related_candidates(info: &Value) -> Vec<String> {
    let related = info["related_videos"]
        .as_array()
        .or_else(|| info["related"].as_array());

    related
        .map(|entries| {
            entries
                .iter()
                .filter_map(|r| {
                    let vid = r["id"].as_str().or_else(|| r["url"].as_str())?;
                    if vid.len() == 11 && !vid.contains(':') {
                        Some(format!("https://www.youtube.com/watch?v={vid}"))
                    } else {
                        Some(vid.to_owned())
                    }
                })
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn pista_desde_info_completo() {
        let info = json!({
            "title": "Una Canción",
            "url": "https://cdn.example.com/stream.webm",
            "webpage_url": "https://www.youtube.com/watch?v=abc12345678",
            "original_url": "https://youtu.be/abc12345678",
            "duration": 214.5,
            "uploader": "Canal",
            "id": "abc12345678",
        });

        let track = track_from_info(&info, "ignorado").unwrap();
        assert_eq!(track.title(), "Una Canción");
        assert_eq!(track.stream_url(), "https://cdn.example.com/stream.webm");
        assert_eq!(track.page_url(), "https://www.youtube.com/watch?v=abc12345678");
        assert_eq!(track.source_query(), "https://youtu.be/abc12345678");
        assert_eq!(track.duration(), Some(Duration::from_secs(214)));
        assert_eq!(track.uploader(), Some("Canal"));
    }

    #[test]
    fn info_sin_stream_se_rechaza() {
        let info = json!({
            "title": "Entrada Flat",
            "webpage_url": "https://www.youtube.com/watch?v=abc12345678",
        });

        let err = track_from_info(&info, "q").unwrap_err();
        assert!(matches!(err, PlayerError::StreamUnavailable(_)));
    }

    #[test]
    fn titulo_por_defecto_cuando_falta() {
        let info = json!({ "url": "https://cdn.example.com/s.webm" });
        let track = track_from_info(&info, "mi búsqueda").unwrap();
        assert_eq!(track.title(), "Desconocido");
        assert_eq!(track.source_query(), "mi búsqueda");
    }

    #[test]
    fn detecta_resultado_de_busqueda() {
        assert!(is_search_result(&json!({ "ie_key": "YoutubeSearch" })));
        assert!(is_search_result(&json!({ "extractor_key": "YoutubeSearchURL" })));
        assert!(!is_search_result(&json!({ "extractor_key": "YoutubeTab" })));
        assert!(!is_search_result(&json!({})));
    }

    #[test]
    fn candidatos_relacionados_normalizan_ids() {
        let info = json!({
            "related_videos": [
                { "id": "abcdefghijk" },
                { "url": "https://www.youtube.com/watch?v=zzz99999999" },
                { "comentario": "sin id ni url" },
            ],
        });

        let candidates = related_candidates(&info);
        assert_eq!(
            candidates,
            vec![
                "https://www.youtube.com/watch?v=abcdefghijk",
                "https://www.youtube.com/watch?v=zzz99999999",
            ]
        );
    }

    #[test]
    fn sin_relacionados_devuelve_vacio() {
        assert!(related_candidates(&json!({})).is_empty());
    }
}
