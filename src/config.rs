/// Runtime configuration for the content script
use crate::columns::ColumnRole;
use serde::{Deserialize, Serialize};

/// Which cells make up a row identity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityScheme {
    /// Ticket id plus last-updated text
    #[default]
    Composite,
    /// Last-updated text alone. Two tickets updated in the same minute
    /// share an identity under this scheme.
    TimestampOnly,
}

impl IdentityScheme {
    /// Columns a row identity is read from
    pub fn required_roles(self) -> &'static [ColumnRole] {
        match self {
            IdentityScheme::Composite => &[ColumnRole::TicketId, ColumnRole::LastUpdated],
            IdentityScheme::TimestampOnly => &[ColumnRole::LastUpdated],
        }
    }
}

/// What happens to an archived row on the page
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalMode {
    #[default]
    Hide,
    Remove,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiverConfig {
    /// Element id of the tickets table
    pub table_id: String,
    /// Element id of the PJAX container whose children are swapped on navigation
    pub container_id: String,
    /// `storage.local` key holding the archive record set
    pub storage_key: String,
    pub title_marker: String,
    pub meta_name: String,
    pub meta_value: String,
    pub identity: IdentityScheme,
    pub removal: RemovalMode,
    pub dedupe_on_write: bool,
    /// Replace the last-updated/message/response columns with a single
    /// "Last Change" column
    pub merge_dates: bool,
    pub log_level: String,
}

impl Default for ArchiverConfig {
    fn default() -> Self {
        ArchiverConfig {
            table_id: "tickets".to_string(),
            container_id: "pjax-container".to_string(),
            storage_key: "archivedTickets".to_string(),
            title_marker: "osTicket".to_string(),
            meta_name: "tip-namespace".to_string(),
            meta_value: "tickets.queue".to_string(),
            identity: IdentityScheme::Composite,
            removal: RemovalMode::Hide,
            dedupe_on_write: true,
            merge_dates: false,
            log_level: "info".to_string(),
        }
    }
}

impl ArchiverConfig {
    /// Configured log level, `Info` when the value is not a level name
    pub fn log_level(&self) -> log::Level {
        self.log_level.parse().unwrap_or(log::Level::Info)
    }
}
