use serenity::{
    all::Timestamp,
    builder::{CreateEmbed, CreateEmbedFooter},
};
use std::time::Duration;

use crate::audio::Track;

/// Paleta de colores estandarizada para el bot
pub mod colors {
    use serenity::all::Colour;

    pub const SUCCESS_GREEN: Colour = Colour::from_rgb(67, 181, 129);
    pub const ERROR_RED: Colour = Colour::from_rgb(220, 53, 69);
    pub const INFO_BLUE: Colour = Colour::from_rgb(52, 144, 220);
    pub const MUSIC_PURPLE: Colour = Colour::from_rgb(138, 43, 226);
}

/// Footer estandarizado para todos los embeds
const STANDARD_FOOTER: &str = "🎵 Melodía";

/// Crea un embed para anunciar la canción en reproducción
pub fn create_now_playing_embed(track: &Track) -> CreateEmbed {
    let mut embed = CreateEmbed::default()
        .title("🎵 Reproduciendo Ahora")
        .description(format!("**{}**", track.title()))
        .color(colors::SUCCESS_GREEN)
        .field(
            "🎤 Canal",
            track.uploader().unwrap_or("Desconocido").to_owned(),
            true,
        );

    if let Some(duration) = track.duration() {
        embed = embed.field("⏱️ Duración", format_duration(duration), true);
    } else {
        embed = embed.field("⏱️ Duración", "🔴 En vivo", true);
    }

    embed
        .url(track.page_url())
        .timestamp(Timestamp::now())
        .footer(CreateEmbedFooter::new(STANDARD_FOOTER))
}

/// Crea un embed para confirmar pistas agregadas a la cola
pub fn create_tracks_added_embed(tracks: &[Track]) -> CreateEmbed {
    let description = match tracks {
        [unica] => format!("**{}** se agregó a la cola", unica.title()),
        varios => format!("Se agregaron **{}** pistas a la cola", varios.len()),
    };

    let mut embed = CreateEmbed::default()
        .title("✅ Agregado a la Cola")
        .description(description)
        .color(colors::SUCCESS_GREEN);

    if let [unica] = tracks {
        if let Some(duration) = unica.duration() {
            embed = embed.field("⏱️ Duración", format_duration(duration), true);
        }
        embed = embed.url(unica.page_url());
    }

    embed
        .timestamp(Timestamp::now())
        .footer(CreateEmbedFooter::new(STANDARD_FOOTER))
}

/// Crea un embed con la pista actual y la cola pendiente
pub fn create_queue_embed(current: Option<&Track>, pending: &[Track], limit: usize) -> CreateEmbed {
    let mut embed = CreateEmbed::default()
        .title("🧾 Cola de Reproducción")
        .color(colors::MUSIC_PURPLE)
        .footer(CreateEmbedFooter::new(STANDARD_FOOTER));

    match current {
        Some(track) => {
            embed = embed.field("🎧 Sonando", format!("**{}**", track.title()), false);
        }
        None => {
            embed = embed.field("🎧 Sonando", "Nada por ahora", false);
        }
    }

    if pending.is_empty() {
        embed = embed.description("La cola está vacía.");
    } else {
        let listado: Vec<String> = pending
            .iter()
            .take(limit)
            .enumerate()
            .map(|(i, track)| format!("{}. {}", i + 1, track.title()))
            .collect();

        let mut texto = listado.join("\n");
        if pending.len() > limit {
            texto.push_str(&format!("\n… y {} más", pending.len() - limit));
        }
        embed = embed.field(format!("🧾 En cola ({})", pending.len()), texto, false);
    }

    embed
}

/// Crea un embed informativo del estado de autoplay
pub fn create_autoplay_embed(enabled: bool) -> CreateEmbed {
    let estado = if enabled { "activado" } else { "desactivado" };
    CreateEmbed::default()
        .title("🔁 Autoplay")
        .description(format!("Autoplay **{estado}**"))
        .color(colors::INFO_BLUE)
        .footer(CreateEmbedFooter::new(STANDARD_FOOTER))
}

/// Crea un embed de error para respuestas efímeras
pub fn create_error_embed(mensaje: &str) -> CreateEmbed {
    CreateEmbed::default()
        .title("❌ Error")
        .description(mensaje.to_owned())
        .color(colors::ERROR_RED)
        .footer(CreateEmbedFooter::new(STANDARD_FOOTER))
}

/// Formatea una duración como mm:ss o hh:mm:ss
fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    let horas = total / 3600;
    let minutos = (total % 3600) / 60;
    let segundos = total % 60;

    if horas > 0 {
        format!("{horas}:{minutos:02}:{segundos:02}")
    } else {
        format!("{minutos}:{segundos:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn formatea_duraciones() {
        assert_eq!(format_duration(Duration::from_secs(59)), "0:59");
        assert_eq!(format_duration(Duration::from_secs(213)), "3:33");
        assert_eq!(format_duration(Duration::from_secs(3661)), "1:01:01");
    }
}
