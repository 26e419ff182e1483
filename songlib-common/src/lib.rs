//! # songlib common library
//!
//! Shared code for the songlib workspace:
//! - Domain models (songs, lyrics view, page parameters)
//! - Configuration loading and resolution
//! - Common error type

pub mod config;
pub mod error;
pub mod models;

pub use error::{Error, Result};
pub use models::{Lyrics, PageParams, Song, SongDetailed};
