//! Cursor pagination over the tool-call time series
//!
//! Offset pagination is not stable under concurrent inserts, so log reads
//! use a strict `(started_at DESC, id DESC)` composite cursor. The encoded
//! form is `base64url(json({started_at, id}))`.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub const DEFAULT_PAGE_LIMIT: u64 = 20;
pub const MAX_PAGE_LIMIT: u64 = 100;

#[derive(Debug, Error)]
pub enum CursorError {
    #[error("cursor is not valid base64url")]
    Encoding(#[from] base64::DecodeError),
    #[error("cursor payload is malformed")]
    Payload(#[from] serde_json::Error),
}

/// Query parameters accepted by cursor-paginated list endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CursorPaginationParams {
    pub cursor: Option<String>,
    pub limit: Option<u64>,
}

impl CursorPaginationParams {
    /// Effective page size, clamped to `[1, MAX_PAGE_LIMIT]`.
    pub fn effective_limit(&self) -> u64 {
        self.limit
            .unwrap_or(DEFAULT_PAGE_LIMIT)
            .clamp(1, MAX_PAGE_LIMIT)
    }
}

/// One page of results plus the cursor for the next page, if any.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CursorPage<T> {
    pub data: Vec<T>,
    pub next_cursor: Option<String>,
}

/// Composite position in the `(started_at DESC, id DESC)` ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogCursor {
    pub started_at: DateTime<Utc>,
    pub id: Uuid,
}

impl LogCursor {
    pub fn new(started_at: DateTime<Utc>, id: Uuid) -> Self {
        Self { started_at, id }
    }

    pub fn encode(&self) -> String {
        let payload = serde_json::json!({
            "started_at": self.started_at.to_rfc3339(),
            "id": self.id,
        });
        URL_SAFE_NO_PAD.encode(payload.to_string())
    }

    pub fn decode(cursor: &str) -> Result<Self, CursorError> {
        let raw = URL_SAFE_NO_PAD.decode(cursor)?;
        let decoded: LogCursor = serde_json::from_slice(&raw)?;
        Ok(decoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_round_trip() {
        let cursor = LogCursor::new(Utc::now(), Uuid::new_v4());
        let decoded = LogCursor::decode(&cursor.encode()).unwrap();
        assert_eq!(decoded, cursor);
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(LogCursor::decode("not base64!!").is_err());
        let not_json = URL_SAFE_NO_PAD.encode("plain text");
        assert!(LogCursor::decode(&not_json).is_err());
    }

    #[test]
    fn limit_clamps_to_bounds() {
        let params = CursorPaginationParams {
            cursor: None,
            limit: Some(100_000),
        };
        assert_eq!(params.effective_limit(), MAX_PAGE_LIMIT);

        let params = CursorPaginationParams::default();
        assert_eq!(params.effective_limit(), DEFAULT_PAGE_LIMIT);

        let params = CursorPaginationParams {
            cursor: None,
            limit: Some(0),
        };
        assert_eq!(params.effective_limit(), 1);
    }
}
