/// Column discovery for the tickets table
///
/// The host page can put its columns in any order, but every header cell
/// carries a fixed `data-id` marker. Positions are discovered per pass by
/// scanning those markers.
use crate::error::ArchiveError;
use std::fmt;

/// Header attribute holding the role marker
pub const MARKER_ATTRIBUTE: &str = "data-id";

/// Logical column of the tickets table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnRole {
    TicketId,
    DateCreated,
    LastUpdated,
    LastMessage,
    LastResponse,
}

impl ColumnRole {
    pub const ALL: [ColumnRole; 5] = [
        ColumnRole::TicketId,
        ColumnRole::DateCreated,
        ColumnRole::LastUpdated,
        ColumnRole::LastMessage,
        ColumnRole::LastResponse,
    ];

    /// Value of the `data-id` attribute on this role's header cell
    pub fn marker(self) -> &'static str {
        match self {
            ColumnRole::TicketId => "1",
            ColumnRole::DateCreated => "2",
            ColumnRole::LastUpdated => "10",
            ColumnRole::LastMessage => "12",
            ColumnRole::LastResponse => "13",
        }
    }

    pub fn from_marker(marker: &str) -> Option<ColumnRole> {
        ColumnRole::ALL
            .into_iter()
            .find(|role| role.marker() == marker.trim())
    }

    fn slot(self) -> usize {
        match self {
            ColumnRole::TicketId => 0,
            ColumnRole::DateCreated => 1,
            ColumnRole::LastUpdated => 2,
            ColumnRole::LastMessage => 3,
            ColumnRole::LastResponse => 4,
        }
    }
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnRole::TicketId => "ticket-id",
            ColumnRole::DateCreated => "date-created",
            ColumnRole::LastUpdated => "last-updated",
            ColumnRole::LastMessage => "last-message",
            ColumnRole::LastResponse => "last-response",
        };
        f.write_str(name)
    }
}

/// Zero-based header position of each role, `None` when the marker is absent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColumnIndexMap {
    positions: [Option<usize>; 5],
}

impl ColumnIndexMap {
    /// Build the map from the marker attribute of each header cell, in
    /// header order. Cells without the attribute yield `None`.
    ///
    /// When two cells carry the same marker the first one wins.
    pub fn locate<I, S>(header_markers: I) -> ColumnIndexMap
    where
        I: IntoIterator<Item = Option<S>>,
        S: AsRef<str>,
    {
        let mut map = ColumnIndexMap::default();

        for (index, marker) in header_markers.into_iter().enumerate() {
            let Some(role) = marker.and_then(|m| ColumnRole::from_marker(m.as_ref())) else {
                continue;
            };
            let slot = &mut map.positions[role.slot()];
            if slot.is_none() {
                *slot = Some(index);
            }
        }

        map
    }

    pub fn get(&self, role: ColumnRole) -> Option<usize> {
        self.positions[role.slot()]
    }

    /// Position of `role`, or `MissingColumn` so the caller can skip
    /// whatever depends on it
    pub fn require(&self, role: ColumnRole) -> Result<usize, ArchiveError> {
        self.get(role).ok_or(ArchiveError::MissingColumn { role })
    }
}
