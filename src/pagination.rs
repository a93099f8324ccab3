//! Keyset pagination over `(created_at, id)`.
//!
//! Rows are always ordered `created_at DESC, id DESC`. A [`Cursor`] marks the
//! last row a caller has seen; the next page is everything strictly below it
//! in that order.

use serde::{Deserialize, Serialize};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use uuid::Uuid;

use crate::error::{AppError, FieldError};

pub const DEFAULT_LIMIT: i64 = 20;
pub const MAX_LIMIT: i64 = 100;

/// Non-positive limits fall back to the default, large ones are capped.
pub fn clamp_limit(limit: i64) -> i64 {
    if limit <= 0 {
        DEFAULT_LIMIT
    } else {
        limit.min(MAX_LIMIT)
    }
}

/// Position of the last row seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub created_at: OffsetDateTime,
    pub id: Uuid,
}

impl Cursor {
    pub fn new(created_at: OffsetDateTime, id: Uuid) -> Self {
        Self { created_at, id }
    }

    pub fn encode(&self) -> CursorToken {
        encode(self.created_at, self.id)
    }
}

/// Wire form of a cursor. Clients echo the fields back as the
/// `cursorCreatedAt` and `cursorId` query parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorToken {
    pub created_at: String,
    pub id: String,
}

pub fn encode(created_at: OffsetDateTime, id: Uuid) -> CursorToken {
    CursorToken {
        // RFC3339 formatting only fails for years outside 0..=9999.
        created_at: created_at
            .format(&Rfc3339)
            .unwrap_or_else(|_| created_at.unix_timestamp().to_string()),
        id: id.to_string(),
    }
}

/// Parses the two cursor query parameters. Both absent means "first page".
pub fn decode(created_at: Option<&str>, id: Option<&str>) -> Result<Option<Cursor>, AppError> {
    let created_at = created_at.filter(|s| !s.is_empty());
    let id = id.filter(|s| !s.is_empty());

    let (created_at, id) = match (created_at, id) {
        (None, None) => return Ok(None),
        (Some(c), Some(i)) => (c, i),
        _ => {
            return Err(AppError::field(
                "cursor",
                "cursorCreatedAt and cursorId must both be provided",
            ))
        }
    };

    let mut details = Vec::new();
    let ts = OffsetDateTime::parse(created_at, &Rfc3339)
        .map_err(|_| details.push(FieldError::new("cursorCreatedAt", "must be RFC3339 timestamp")))
        .ok();
    let uid = Uuid::parse_str(id)
        .map_err(|_| details.push(FieldError::new("cursorId", "must be a valid id")))
        .ok();

    match (ts, uid) {
        (Some(ts), Some(uid)) => Ok(Some(Cursor::new(ts, uid))),
        _ => Err(AppError::Validation(details)),
    }
}

/// One page of results.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<Cursor>,
}

impl<T> Page<T> {
    /// Builds a page from a `limit + 1` over-fetch. If the extra row came
    /// back it is dropped and the last kept row becomes the next cursor.
    pub fn from_overfetch<F>(mut rows: Vec<T>, limit: i64, key: F) -> Self
    where
        F: Fn(&T) -> Cursor,
    {
        let limit = clamp_limit(limit) as usize;
        let next_cursor = if rows.len() > limit {
            rows.truncate(limit);
            rows.last().map(&key)
        } else {
            None
        };
        Self {
            items: rows,
            next_cursor,
        }
    }
}
