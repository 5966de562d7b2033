/// Row identities: the key that ties a table row to an archive record
/// across page reloads.
use crate::columns::{ColumnIndexMap, ColumnRole};
use crate::config::IdentityScheme;
use crate::error::ArchiveError;
use crate::timestamp::normalize_timestamp;
use serde::{Deserialize, Serialize};

/// Read access to the cells of one table row
pub trait TableRow {
    /// Text content of the cell at `index`, `None` when the row is shorter
    fn cell_text(&self, index: usize) -> Option<String>;
}

impl<S: AsRef<str>> TableRow for [S] {
    fn cell_text(&self, index: usize) -> Option<String> {
        self.get(index).map(|cell| cell.as_ref().to_string())
    }
}

impl<S: AsRef<str>> TableRow for Vec<S> {
    fn cell_text(&self, index: usize) -> Option<String> {
        self.as_slice().cell_text(index)
    }
}

/// Identity of a ticket row.
///
/// Stored as `["<ticket id>", "<last updated>"]` for composite identities and
/// as a bare string for timestamp-only identities.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RowIdentity {
    Composite(String, String),
    Single(String),
}

impl RowIdentity {
    pub fn composite(ticket_id: impl Into<String>, timestamp: impl Into<String>) -> RowIdentity {
        RowIdentity::Composite(ticket_id.into(), timestamp.into())
    }

    /// Whether two identities refer to the same row.
    ///
    /// Ticket ids compare as text. Timestamps match when their text is equal,
    /// or when both parse to the same non-zero instant so that "15/03/24 09:05"
    /// and "2024-03-15T09:05:00" are recognized as one moment.
    pub fn matches(&self, other: &RowIdentity) -> bool {
        match (self, other) {
            (RowIdentity::Composite(a_id, a_ts), RowIdentity::Composite(b_id, b_ts)) => {
                a_id == b_id && same_instant(a_ts, b_ts)
            }
            (RowIdentity::Single(a_ts), RowIdentity::Single(b_ts)) => same_instant(a_ts, b_ts),
            _ => false,
        }
    }
}

fn same_instant(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    match (normalize_timestamp(a), normalize_timestamp(b)) {
        (Ok(x), Ok(y)) => x != 0 && x == y,
        _ => false,
    }
}

/// Trimmed text of the cell for `role`
fn cell_value<R: TableRow + ?Sized>(
    row: &R,
    columns: &ColumnIndexMap,
    role: ColumnRole,
) -> Result<String, ArchiveError> {
    let index = columns.require(role)?;
    let text = row
        .cell_text(index)
        .ok_or_else(|| ArchiveError::invalid_identity(format!("row has no {} cell", role)))?;
    let text = text.trim();
    if text.is_empty() {
        return Err(ArchiveError::invalid_identity(format!("{} cell is empty", role)));
    }
    Ok(text.to_string())
}

/// Derive the identity of `row` from its designated cells
pub fn extract_identity<R: TableRow + ?Sized>(
    row: &R,
    columns: &ColumnIndexMap,
    scheme: IdentityScheme,
) -> Result<RowIdentity, ArchiveError> {
    match scheme {
        IdentityScheme::Composite => {
            let ticket_id = cell_value(row, columns, ColumnRole::TicketId)?;
            let timestamp = cell_value(row, columns, ColumnRole::LastUpdated)?;
            Ok(RowIdentity::Composite(ticket_id, timestamp))
        }
        IdentityScheme::TimestampOnly => {
            cell_value(row, columns, ColumnRole::LastUpdated).map(RowIdentity::Single)
        }
    }
}
