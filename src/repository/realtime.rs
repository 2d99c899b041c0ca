//! Change Notifications
//!
//! In-process stand-in for the backend's realtime channel: every write through
//! a SQLite repository is published here, keyed by table.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Default number of events buffered per subscriber
pub const DEFAULT_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// One row-level change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub table: String,
    pub kind: ChangeKind,
    pub row_id: Uuid,
    /// Owning area, for tables scoped by area
    pub area_id: Option<Uuid>,
}

impl ChangeEvent {
    pub fn new(table: &str, kind: ChangeKind, row_id: Uuid, area_id: Option<Uuid>) -> Self {
        Self {
            table: table.to_string(),
            kind,
            row_id,
            area_id,
        }
    }

    /// Server-side style row filter: table match plus area match
    pub fn matches(&self, table: &str, area_id: Uuid) -> bool {
        self.table == table && self.area_id == Some(area_id)
    }
}

/// Broadcast bus shared by the repositories of one database
#[derive(Clone)]
pub struct ChangeBus {
    tx: broadcast::Sender<ChangeEvent>,
}

impl ChangeBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publish; having no subscribers is not an error
    pub fn publish(&self, event: ChangeEvent) {
        log::debug!("change {:?} on {} ({})", event.kind, event.table, event.row_id);
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }
}

impl Default for ChangeBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
