//! HTTP API handlers for songlib-server

pub mod error;
pub mod health;
pub mod songs;

pub use error::{ApiError, ApiResult};
pub use health::health_routes;
pub use songs::{add_song, delete_song, edit_song, list_songs, song_lyrics};
