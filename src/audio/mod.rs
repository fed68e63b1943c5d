//! Motor de reproducción: modelo de pista, cola por guild, sesión de voz y
//! el loop que serializa la reproducción.

pub mod player;
pub mod queue;
pub mod track;
pub mod voice;

pub use player::{Announcer, GuildPlayer, PlayerRegistry};
pub use queue::TrackQueue;
pub use track::Track;
pub use voice::{PlaybackDone, SongbirdSession, VoiceSession};
