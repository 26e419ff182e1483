//! Listing filters
//!
//! A filter maps a fixed set of fields to exact-match values. Field names map
//! to column expressions from a closed enum; values are always bound as query
//! parameters.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::StoreError;

/// Rejected in any filter value
pub const STATEMENT_SEPARATOR: char = ';';

/// Fields a listing can be narrowed by
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FilterField {
    Name,
    Group,
    ReleaseDate,
    Text,
}

impl FilterField {
    pub const ALL: [FilterField; 4] = [
        FilterField::Name,
        FilterField::Group,
        FilterField::ReleaseDate,
        FilterField::Text,
    ];

    /// Column expression in the songs/groups listing join
    pub(crate) fn column(self) -> &'static str {
        match self {
            FilterField::Name => "s.name",
            FilterField::Group => "g.name",
            FilterField::ReleaseDate => "s.release_date",
            FilterField::Text => "s.lyrics",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FilterField::Name => "name",
            FilterField::Group => "group",
            FilterField::ReleaseDate => "release_date",
            FilterField::Text => "text",
        }
    }
}

impl fmt::Display for FilterField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterField {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(FilterField::Name),
            "group" => Ok(FilterField::Group),
            "release_date" => Ok(FilterField::ReleaseDate),
            "text" | "lyrics" => Ok(FilterField::Text),
            other => Err(StoreError::MalformedFilter(format!(
                "unknown filter field '{}'",
                other
            ))),
        }
    }
}

/// Field → value constraints, combined with AND
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SongFilter {
    conditions: BTreeMap<FilterField, String>,
}

impl SongFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from string keys, rejecting unknown fields
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, StoreError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut filter = Self::new();
        for (key, value) in pairs {
            filter.insert(key.as_ref().parse()?, value);
        }
        Ok(filter)
    }

    pub fn with(mut self, field: FilterField, value: impl Into<String>) -> Self {
        self.insert(field, value);
        self
    }

    /// Set a condition, replacing any previous value for the field
    pub fn insert(&mut self, field: FilterField, value: impl Into<String>) {
        self.conditions.insert(field, value.into());
    }

    pub fn get(&self, field: FilterField) -> Option<&str> {
        self.conditions.get(&field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    /// Conditions in stable field order
    pub fn iter(&self) -> impl Iterator<Item = (FilterField, &str)> {
        self.conditions.iter().map(|(field, value)| (*field, value.as_str()))
    }

    /// Reject values carrying a statement separator
    pub fn validate(&self) -> Result<(), StoreError> {
        match self
            .iter()
            .find(|(_, value)| value.contains(STATEMENT_SEPARATOR))
        {
            Some((field, _)) => Err(StoreError::MalformedFilter(format!(
                "value for '{}' contains '{}'",
                field, STATEMENT_SEPARATOR
            ))),
            None => Ok(()),
        }
    }
}
