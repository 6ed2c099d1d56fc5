//! Opaque pagination cursors.
//!
//! A cursor carries the key of the last item of a page together with the
//! scope it was issued for (table, partition value, direction). The payload
//! is JSON, transported as unpadded base64url so it survives query strings.

use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use super::error::RepositoryError;
use super::types::{Direction, KeyValue};

const CURSOR_VERSION: u8 = 1;

// Bound on untrusted token input.
const MAX_CURSOR_TOKEN_LEN: usize = 1024;

/// Opaque continuation token returned with a page of results.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    /// Wraps a token received from a caller. It is validated when used.
    pub fn from_token(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Decoded cursor contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct CursorPayload {
    pub v: u8,
    pub table: String,
    pub direction: Direction,
    pub partition: KeyValue,
    pub sort: Option<KeyValue>,
}

impl CursorPayload {
    pub fn new(
        table: &str,
        direction: Direction,
        partition: KeyValue,
        sort: Option<KeyValue>,
    ) -> Self {
        Self {
            v: CURSOR_VERSION,
            table: table.to_string(),
            direction,
            partition,
            sort,
        }
    }

    pub fn encode(&self) -> Result<Cursor, RepositoryError> {
        let bytes =
            serde_json::to_vec(self).map_err(|e| RepositoryError::Serialization(e.to_string()))?;
        Ok(Cursor(URL_SAFE_NO_PAD.encode(bytes)))
    }

    pub fn decode(cursor: &Cursor) -> Result<Self, RepositoryError> {
        let token = cursor.as_str().trim();
        if token.is_empty() {
            return Err(RepositoryError::InvalidCursor("empty token".to_string()));
        }
        if token.len() > MAX_CURSOR_TOKEN_LEN {
            return Err(RepositoryError::InvalidCursor(format!(
                "token exceeds {MAX_CURSOR_TOKEN_LEN} characters"
            )));
        }

        let bytes = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|e| RepositoryError::InvalidCursor(e.to_string()))?;
        let payload: Self = serde_json::from_slice(&bytes)
            .map_err(|e| RepositoryError::InvalidCursor(e.to_string()))?;

        if payload.v != CURSOR_VERSION {
            return Err(RepositoryError::InvalidCursor(format!(
                "unsupported version {}",
                payload.v
            )));
        }
        Ok(payload)
    }

    /// Checks that the cursor was issued for the same query scope.
    pub fn ensure_scope(
        &self,
        table: &str,
        partition: &KeyValue,
        direction: Direction,
    ) -> Result<(), RepositoryError> {
        if self.table != table {
            return Err(RepositoryError::InvalidCursor(format!(
                "issued for table {}, not {table}",
                self.table
            )));
        }
        if &self.partition != partition {
            return Err(RepositoryError::InvalidCursor(format!(
                "issued for partition {}, not {partition}",
                self.partition
            )));
        }
        if self.direction != direction {
            return Err(RepositoryError::InvalidCursor(
                "issued for the opposite direction".to_string(),
            ));
        }
        Ok(())
    }
}
