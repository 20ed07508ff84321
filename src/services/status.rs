//! Accepted response statuses per driver operation.
//!
//! Every operation declares the statuses it understands and what each one
//! means; anything else is an `UnexpectedStatus` error carrying the accepted
//! set. The tables are plain data so they can be enumerated.

use crate::errors::{SwiftError, SwiftResult};
use http::StatusCode;

#[derive(Debug)]
pub struct StatusTable<T: 'static> {
    operation: &'static str,
    entries: &'static [(StatusCode, T)],
}

impl<T: Copy + 'static> StatusTable<T> {
    pub const fn new(operation: &'static str, entries: &'static [(StatusCode, T)]) -> Self {
        Self { operation, entries }
    }

    pub fn operation(&self) -> &'static str {
        self.operation
    }

    pub fn entries(&self) -> &'static [(StatusCode, T)] {
        self.entries
    }

    pub fn accepted(&self) -> Vec<u16> {
        self.entries.iter().map(|(status, _)| status.as_u16()).collect()
    }

    /// Outcome mapped to `status`, or an error listing the accepted codes.
    pub fn resolve(&self, status: StatusCode) -> SwiftResult<T> {
        self.entries
            .iter()
            .find(|(candidate, _)| *candidate == status)
            .map(|(_, outcome)| *outcome)
            .ok_or_else(|| {
                SwiftError::unexpected_status(
                    self.operation,
                    status,
                    self.entries.iter().map(|(s, _)| *s),
                )
            })
    }
}

/// Result of a HEAD lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lookup {
    Found,
    Missing,
}

/// Result of a container listing GET.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Listing {
    Entries,
    Empty,
}

/// Result of one DELETE within a batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Removal {
    Removed,
    AlreadyGone,
}

/// Follow-up to run once a request succeeded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PostAction {
    /// The response carries nothing useful; read the destination back.
    FetchDestination,
}

pub const CONTAINER_EXISTS: StatusTable<bool> = StatusTable::new(
    "container_exists",
    &[(StatusCode::NO_CONTENT, true), (StatusCode::NOT_FOUND, false)],
);

pub const CREATE_CONTAINER: StatusTable<bool> = StatusTable::new(
    "create_container",
    &[(StatusCode::CREATED, true), (StatusCode::ACCEPTED, true)],
);

pub const GET_CONTAINER: StatusTable<Lookup> = StatusTable::new(
    "get_container",
    &[
        (StatusCode::NO_CONTENT, Lookup::Found),
        (StatusCode::NOT_FOUND, Lookup::Missing),
    ],
);

pub const UPDATE_CONTAINER: StatusTable<bool> =
    StatusTable::new("update_container", &[(StatusCode::NO_CONTENT, true)]);

pub const DELETE_CONTAINER: StatusTable<bool> = StatusTable::new(
    "delete_container",
    &[(StatusCode::NO_CONTENT, true), (StatusCode::NOT_FOUND, true)],
);

pub const LIST_OBJECTS: StatusTable<Listing> = StatusTable::new(
    "get_objects",
    &[
        (StatusCode::OK, Listing::Entries),
        (StatusCode::NO_CONTENT, Listing::Empty),
        (StatusCode::NOT_FOUND, Listing::Empty),
    ],
);

/// Per-entry HEAD issued while listing.
pub const LIST_OBJECT_HEAD: StatusTable<Lookup> = StatusTable::new(
    "get_objects",
    &[
        (StatusCode::OK, Lookup::Found),
        (StatusCode::NO_CONTENT, Lookup::Found),
    ],
);

pub const OBJECT_EXISTS: StatusTable<bool> = StatusTable::new(
    "object_exists",
    &[(StatusCode::NO_CONTENT, true), (StatusCode::NOT_FOUND, false)],
);

pub const GET_OBJECT: StatusTable<Lookup> = StatusTable::new(
    "get_object",
    &[
        (StatusCode::NO_CONTENT, Lookup::Found),
        (StatusCode::NOT_FOUND, Lookup::Missing),
    ],
);

pub const GET_OBJECT_CONTENT: StatusTable<()> =
    StatusTable::new("get_object_content", &[(StatusCode::OK, ())]);

pub const UPDATE_OBJECT: StatusTable<bool> =
    StatusTable::new("update_object", &[(StatusCode::CREATED, true)]);

pub const UPDATE_OBJECT_METADATA: StatusTable<bool> =
    StatusTable::new("update_object_metadata", &[(StatusCode::ACCEPTED, true)]);

pub const DELETE_OBJECT: StatusTable<bool> = StatusTable::new(
    "delete_object",
    &[(StatusCode::NO_CONTENT, true), (StatusCode::NOT_FOUND, true)],
);

/// Per-entry DELETE issued by a batch removal.
pub const DELETE_OBJECTS_ENTRY: StatusTable<Removal> = StatusTable::new(
    "delete_objects",
    &[
        (StatusCode::NO_CONTENT, Removal::Removed),
        (StatusCode::NOT_FOUND, Removal::AlreadyGone),
    ],
);

pub const COPY_OBJECT: StatusTable<PostAction> = StatusTable::new(
    "copy_object",
    &[(StatusCode::CREATED, PostAction::FetchDestination)],
);
