//! Catalog service
//!
//! Orchestrates enrichment and persistence. Adding a song always fetches its
//! details first; if the lookup fails nothing is stored. Every other
//! operation passes straight through to the store, keeping the store's error
//! kind intact.

use std::sync::Arc;

use songlib_common::{Lyrics, PageParams, Song, SongDetailed};
use thiserror::Error;
use tracing::{debug, info};

use crate::db::{SongFilter, SongRepository, StoreError};
use crate::metadata::{MetadataError, MetadataSource};

/// Catalog operation errors
///
/// Wraps the underlying error without re-labelling it.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Identity fields failed validation
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CatalogError {
    pub fn is_no_match(&self) -> bool {
        matches!(self, CatalogError::Store(e) if e.is_no_match())
    }
}

impl From<songlib_common::Error> for CatalogError {
    fn from(err: songlib_common::Error) -> Self {
        CatalogError::InvalidInput(err.to_string())
    }
}

/// Song catalog operations
#[derive(Clone)]
pub struct CatalogService {
    songs: Arc<dyn SongRepository>,
    metadata: Arc<dyn MetadataSource>,
}

impl CatalogService {
    pub fn new(songs: Arc<dyn SongRepository>, metadata: Arc<dyn MetadataSource>) -> Self {
        Self { songs, metadata }
    }

    /// Enrich `song` from the metadata service, then store it
    pub async fn add_song(&self, song: Song) -> Result<SongDetailed, CatalogError> {
        song.validate()?;

        let detailed = self.metadata.fetch(&song).await?;
        debug!(?detailed, "Got detailed song info");

        self.songs.create(&detailed).await?;
        info!(group = %song.group, name = %song.name, "Added new song");

        Ok(detailed)
    }

    pub async fn get_song(&self, song: &Song) -> Result<SongDetailed, CatalogError> {
        Ok(self.songs.get(song).await?)
    }

    pub async fn delete_song(&self, song: &Song) -> Result<(), CatalogError> {
        Ok(self.songs.delete(song).await?)
    }

    /// Replace the detail fields of an existing song
    pub async fn update_song(&self, song: &SongDetailed) -> Result<(), CatalogError> {
        song.song.validate()?;
        Ok(self.songs.update(song).await?)
    }

    pub async fn list_page(
        &self,
        page: PageParams,
        filter: &SongFilter,
    ) -> Result<Vec<SongDetailed>, CatalogError> {
        Ok(self.songs.list_page(page, filter).await?)
    }

    /// One page of the song's couplets
    pub async fn lyrics_page(&self, song: &Song, page: PageParams) -> Result<Lyrics, CatalogError> {
        let detailed = self.songs.get(song).await?;
        Ok(Lyrics::paginate(&detailed.text, page))
    }
}
