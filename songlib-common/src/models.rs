//! Catalog domain models
//!
//! A [`Song`] is the addressing key of the catalog; [`SongDetailed`] is the
//! full stored record. [`Lyrics`] is a read-only view derived from the stored
//! lyrics text and is never persisted.

use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Song identity: the (group, name) pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Song {
    pub group: String,
    pub name: String,
}

impl Song {
    pub fn new(group: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
        }
    }

    /// Both identity fields must be non-blank
    pub fn validate(&self) -> Result<()> {
        if self.group.trim().is_empty() {
            return Err(Error::InvalidInput("song group must not be empty".to_string()));
        }
        if self.name.trim().is_empty() {
            return Err(Error::InvalidInput("song name must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Full catalog record
///
/// Serializes flat: `{"group", "name", "release_date", "text", "link"}`.
/// Detail fields default to empty strings when absent from the input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongDetailed {
    #[serde(flatten)]
    pub song: Song,
    /// Free-form release date, stored as-is
    #[serde(default)]
    pub release_date: String,
    /// Lyrics body, one couplet per line
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub link: String,
}

impl SongDetailed {
    pub fn new(
        song: Song,
        release_date: impl Into<String>,
        text: impl Into<String>,
        link: impl Into<String>,
    ) -> Self {
        Self {
            song,
            release_date: release_date.into(),
            text: text.into(),
            link: link.into(),
        }
    }

    pub fn group(&self) -> &str {
        &self.song.group
    }

    pub fn name(&self) -> &str {
        &self.song.name
    }
}

/// Validated page/limit pair
///
/// `page` is zero-based, `limit` is at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    page: u32,
    limit: NonZeroU32,
}

impl PageParams {
    pub fn new(page: u32, limit: u32) -> Result<Self> {
        let limit = NonZeroU32::new(limit)
            .ok_or_else(|| Error::InvalidInput("limit must be greater than zero".to_string()))?;
        Ok(Self { page, limit })
    }

    /// Build from optional query values: page defaults to 0, limit is required
    pub fn from_query(page: Option<u32>, limit: Option<u32>) -> Result<Self> {
        let limit = limit.ok_or_else(|| Error::InvalidInput("limit is required".to_string()))?;
        Self::new(page.unwrap_or(0), limit)
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit.get()
    }

    /// Number of items preceding this page
    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.limit.get())
    }
}

/// One page of a song's couplets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lyrics {
    pub page: u32,
    pub text: Vec<String>,
}

impl Lyrics {
    /// Slice `text` into couplets and keep those on the requested page
    ///
    /// Couplets follow `str::lines`: `\n` or `\r\n` ends a couplet, a
    /// trailing line break adds no empty couplet, and empty text has none.
    /// A page past the last couplet yields an empty list.
    pub fn paginate(text: &str, params: PageParams) -> Self {
        let start = usize::try_from(params.offset()).unwrap_or(usize::MAX);
        let couplets = text
            .lines()
            .skip(start)
            .take(params.limit() as usize)
            .map(str::to_owned)
            .collect();

        Self {
            page: params.page(),
            text: couplets,
        }
    }
}
