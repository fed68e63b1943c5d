use anyhow::Result;
use serenity::{
    builder::{
        CreateEmbed, CreateInteractionResponse, CreateInteractionResponseMessage,
        EditInteractionResponse,
    },
    model::application::CommandInteraction,
    prelude::Context,
};
use tracing::{info, warn};

use crate::{
    bot::{ChannelAnnouncer, MelodiaBot},
    error::PlayerError,
    ui::embeds,
};

/// Despacha un comando slash hacia su handler.
///
/// Toda acción explícita del usuario termina en una respuesta: si un handler
/// falla después de reconocer el comando, el error se reporta como embed
/// efímero en vez de dejar la interacción sin contestar.
pub async fn handle_command(
    ctx: &Context,
    command: CommandInteraction,
    bot: &MelodiaBot,
) -> Result<()> {
    let guild_id = command
        .guild_id
        .ok_or_else(|| anyhow::anyhow!("Comando usado fuera de un servidor"))?;

    info!(
        "📝 Comando /{} usado por {} en guild {}",
        command.data.name, command.user.name, guild_id
    );

    let resultado = match command.data.name.as_str() {
        "play" => handle_play(ctx, &command, bot).await,
        "pause" => handle_pause(ctx, &command, bot).await,
        "resume" => handle_resume(ctx, &command, bot).await,
        "skip" => handle_skip(ctx, &command, bot).await,
        "stop" => handle_stop(ctx, &command, bot).await,
        "queue" => handle_queue(ctx, &command, bot).await,
        "nowplaying" => handle_nowplaying(ctx, &command, bot).await,
        "autoplay" => handle_autoplay(ctx, &command, bot).await,
        "join" => handle_join(ctx, &command, bot).await,
        "leave" => handle_leave(ctx, &command, bot).await,
        _ => respond_text(ctx, &command, "❌ Comando no reconocido", true).await,
    };

    if let Err(e) = resultado {
        warn!("⚠️ Comando /{} falló: {:#}", command.data.name, e);
        let embed = embeds::create_error_embed(&e.to_string());
        // La interacción puede estar ya diferida (/play): probar ambas vías.
        if respond_embed(ctx, &command, embed.clone(), true).await.is_err() {
            let _ = edit_with_embed(ctx, &command, embed).await;
        }
    }

    Ok(())
}

/// Traducción de un control de transporte a la respuesta del usuario.
#[derive(Debug, PartialEq)]
enum TransportReply {
    Confirmacion(&'static str),
    Fallo(String),
}

fn transport_reply(result: Result<(), PlayerError>, confirmacion: &'static str) -> TransportReply {
    match result {
        Ok(()) => TransportReply::Confirmacion(confirmacion),
        Err(e) => TransportReply::Fallo(e.to_string()),
    }
}

async fn respond_transport(
    ctx: &Context,
    command: &CommandInteraction,
    reply: TransportReply,
) -> Result<()> {
    match reply {
        TransportReply::Confirmacion(texto) => respond_text(ctx, command, texto, false).await,
        TransportReply::Fallo(mensaje) => {
            respond_embed(ctx, command, embeds::create_error_embed(&mensaje), true).await
        }
    }
}

// Handlers específicos para cada comando

async fn handle_play(ctx: &Context, command: &CommandInteraction, bot: &MelodiaBot) -> Result<()> {
    let guild_id = command.guild_id.unwrap();
    let query = command
        .data
        .options
        .iter()
        .find(|opt| opt.name == "query")
        .and_then(|opt| opt.value.as_str())
        .ok_or_else(|| anyhow::anyhow!("Query no proporcionado"))?
        .to_owned();

    // Defer: la resolución puede tomar varios segundos
    command
        .create_response(
            &ctx.http,
            CreateInteractionResponse::Defer(CreateInteractionResponseMessage::new()),
        )
        .await?;

    // El usuario debe estar en un canal de voz antes de resolver nada
    let session = match bot.ensure_voice(ctx, guild_id, command.user.id).await {
        Ok(session) => session,
        Err(e) => {
            return edit_with_embed(ctx, command, embeds::create_error_embed(&e.to_string())).await;
        }
    };

    let tracks = match bot.resolver.expand(&query).await {
        Ok(tracks) => tracks,
        Err(e) => {
            return edit_with_embed(ctx, command, embeds::create_error_embed(&e.to_string())).await;
        }
    };

    let player = bot.registry.get(guild_id);
    player.enqueue(tracks.iter().cloned());

    edit_with_embed(ctx, command, embeds::create_tracks_added_embed(&tracks)).await?;

    // Arrancar el loop (no-op si ya hay uno vivo); los anuncios van al
    // canal de texto desde donde se pidió la música.
    let announcer = ChannelAnnouncer::new(ctx.http.clone(), command.channel_id);
    player.start_if_needed(session, announcer).await;

    Ok(())
}

async fn handle_pause(ctx: &Context, command: &CommandInteraction, bot: &MelodiaBot) -> Result<()> {
    let guild_id = command.guild_id.unwrap();
    let player = bot.registry.get(guild_id);

    if !player.is_playing().await {
        return respond_text(ctx, command, "Nada está sonando.", true).await;
    }

    let reply = transport_reply(player.pause().await, "⏸️ Reproducción pausada");
    respond_transport(ctx, command, reply).await
}

async fn handle_resume(ctx: &Context, command: &CommandInteraction, bot: &MelodiaBot) -> Result<()> {
    let guild_id = command.guild_id.unwrap();
    let player = bot.registry.get(guild_id);

    if bot.session(guild_id).is_none() {
        return respond_text(ctx, command, "No estoy conectado a un canal de voz.", true).await;
    }

    let reply = transport_reply(player.resume().await, "▶️ Reproducción reanudada");
    respond_transport(ctx, command, reply).await
}

async fn handle_skip(ctx: &Context, command: &CommandInteraction, bot: &MelodiaBot) -> Result<()> {
    let guild_id = command.guild_id.unwrap();
    let player = bot.registry.get(guild_id);

    if !player.is_playing().await {
        return respond_text(ctx, command, "Nada está sonando.", true).await;
    }

    let reply = transport_reply(player.skip().await, "⏭️ Canción saltada");
    respond_transport(ctx, command, reply).await
}

async fn handle_stop(ctx: &Context, command: &CommandInteraction, bot: &MelodiaBot) -> Result<()> {
    let guild_id = command.guild_id.unwrap();

    bot.registry.get(guild_id).stop().await;
    respond_text(ctx, command, "⏹️ Detenido. Cola limpiada.", false).await
}

async fn handle_queue(ctx: &Context, command: &CommandInteraction, bot: &MelodiaBot) -> Result<()> {
    let guild_id = command.guild_id.unwrap();
    let player = bot.registry.get(guild_id);

    let current = player.current_track();
    let pending = player.peek_queue();
    let embed =
        embeds::create_queue_embed(current.as_ref(), &pending, bot.config.queue_display_limit);

    respond_embed(ctx, command, embed, true).await
}

async fn handle_nowplaying(
    ctx: &Context,
    command: &CommandInteraction,
    bot: &MelodiaBot,
) -> Result<()> {
    let guild_id = command.guild_id.unwrap();

    match bot.registry.get(guild_id).current_track() {
        Some(track) => {
            respond_embed(ctx, command, embeds::create_now_playing_embed(&track), true).await
        }
        None => respond_text(ctx, command, "Nada está sonando ahora.", true).await,
    }
}

async fn handle_autoplay(
    ctx: &Context,
    command: &CommandInteraction,
    bot: &MelodiaBot,
) -> Result<()> {
    let guild_id = command.guild_id.unwrap();
    let mode = command
        .data
        .options
        .iter()
        .find(|opt| opt.name == "mode")
        .and_then(|opt| opt.value.as_str())
        .ok_or_else(|| anyhow::anyhow!("Modo no proporcionado"))?;

    let enabled = mode.eq_ignore_ascii_case("on");
    let player = bot.registry.get(guild_id);
    player.set_autoplay(enabled);

    respond_embed(ctx, command, embeds::create_autoplay_embed(enabled), false).await
}

async fn handle_join(ctx: &Context, command: &CommandInteraction, bot: &MelodiaBot) -> Result<()> {
    let guild_id = command.guild_id.unwrap();

    match bot.ensure_voice(ctx, guild_id, command.user.id).await {
        Ok(_) => respond_text(ctx, command, "✅ Conectado a tu canal de voz", true).await,
        Err(e) => {
            respond_embed(ctx, command, embeds::create_error_embed(&e.to_string()), true).await
        }
    }
}

async fn handle_leave(ctx: &Context, command: &CommandInteraction, bot: &MelodiaBot) -> Result<()> {
    let guild_id = command.guild_id.unwrap();

    match bot.leave_voice_channel(ctx, guild_id).await {
        Ok(()) => respond_text(ctx, command, "👋 Hasta luego", true).await,
        Err(e) => {
            respond_embed(ctx, command, embeds::create_error_embed(&e.to_string()), true).await
        }
    }
}

// Funciones auxiliares

async fn respond_text(
    ctx: &Context,
    command: &CommandInteraction,
    content: &str,
    ephemeral: bool,
) -> Result<()> {
    command
        .create_response(
            &ctx.http,
            CreateInteractionResponse::Message(
                CreateInteractionResponseMessage::new()
                    .content(content)
                    .ephemeral(ephemeral),
            ),
        )
        .await?;
    Ok(())
}

async fn respond_embed(
    ctx: &Context,
    command: &CommandInteraction,
    embed: CreateEmbed,
    ephemeral: bool,
) -> Result<()> {
    command
        .create_response(
            &ctx.http,
            CreateInteractionResponse::Message(
                CreateInteractionResponseMessage::new()
                    .embed(embed)
                    .ephemeral(ephemeral),
            ),
        )
        .await?;
    Ok(())
}

async fn edit_with_embed(
    ctx: &Context,
    command: &CommandInteraction,
    embed: CreateEmbed,
) -> Result<()> {
    command
        .edit_response(&ctx.http, EditInteractionResponse::new().embed(embed))
        .await?;
    Ok(())
}
