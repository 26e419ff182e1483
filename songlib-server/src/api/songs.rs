//! Song library endpoints
//!
//! All routes here are mounted under `/api/v{version}`.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use songlib_common::{Lyrics, PageParams, Song, SongDetailed};
use tracing::{debug, info};

use super::error::ApiResult;
use crate::db::{FilterField, SongFilter};
use crate::pagination::PageQuery;
use crate::AppState;

/// Query parameters addressing one song
#[derive(Debug, Deserialize)]
pub struct SongKeyQuery {
    pub name: String,
    pub group: String,
}

impl From<SongKeyQuery> for Song {
    fn from(query: SongKeyQuery) -> Self {
        Song::new(query.group, query.name)
    }
}

/// Optional listing filters; empty values are ignored
#[derive(Debug, Default, Deserialize)]
pub struct FilterQuery {
    pub name: Option<String>,
    pub group: Option<String>,
    #[serde(alias = "releaseDate")]
    pub release_date: Option<String>,
    #[serde(alias = "lyrics")]
    pub text: Option<String>,
}

impl From<FilterQuery> for SongFilter {
    fn from(query: FilterQuery) -> Self {
        let mut filter = SongFilter::new();
        let fields = [
            (FilterField::Name, query.name),
            (FilterField::Group, query.group),
            (FilterField::ReleaseDate, query.release_date),
            (FilterField::Text, query.text),
        ];
        for (field, value) in fields {
            if let Some(value) = value.filter(|v| !v.is_empty()) {
                filter.insert(field, value);
            }
        }
        filter
    }
}

/// PUT /lib/add
///
/// Enriches the song from the metadata service and stores it.
pub async fn add_song(
    State(state): State<AppState>,
    Json(song): Json<Song>,
) -> ApiResult<(StatusCode, Json<SongDetailed>)> {
    debug!(group = %song.group, name = %song.name, "Incoming add request");
    let added = state.catalog.add_song(song).await?;
    Ok((StatusCode::CREATED, Json(added)))
}

/// DELETE /lib/remove?name=..&group=..
pub async fn delete_song(
    State(state): State<AppState>,
    Query(key): Query<SongKeyQuery>,
) -> ApiResult<StatusCode> {
    let song = Song::from(key);
    song.validate()?;

    state.catalog.delete_song(&song).await?;
    info!(group = %song.group, name = %song.name, "Deleted song");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /lib?page=..&limit=..[&name=..&group=..&release_date=..&text=..]
pub async fn list_songs(
    State(state): State<AppState>,
    Query(page): Query<PageQuery>,
    Query(filter): Query<FilterQuery>,
) -> ApiResult<Json<Vec<SongDetailed>>> {
    let page = PageParams::try_from(page)?;
    let filter = SongFilter::from(filter);
    debug!(?filter, "Received filter settings for song page");

    let songs = state.catalog.list_page(page, &filter).await?;
    Ok(Json(songs))
}

/// GET /lib/:group_name/:song_name?page=..&limit=..
pub async fn song_lyrics(
    State(state): State<AppState>,
    Path((group_name, song_name)): Path<(String, String)>,
    Query(page): Query<PageQuery>,
) -> ApiResult<Json<Lyrics>> {
    let page = PageParams::try_from(page)?;
    let song = Song::new(group_name, song_name);
    song.validate()?;

    let lyrics = state.catalog.lyrics_page(&song, page).await?;
    Ok(Json(lyrics))
}

/// POST /lib/edit
///
/// Replaces release date, lyrics and link of an existing song.
pub async fn edit_song(
    State(state): State<AppState>,
    Json(song): Json<SongDetailed>,
) -> ApiResult<StatusCode> {
    state.catalog.update_song(&song).await?;
    info!(group = %song.group(), name = %song.name(), "Updated song data");
    Ok(StatusCode::NO_CONTENT)
}
