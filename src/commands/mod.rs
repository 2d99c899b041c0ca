//! Commands Layer
//!
//! Services the dashboard calls, one per screen family.

mod area_cmd;
mod document_cmd;
mod checklist_cmd;

pub use area_cmd::{slug_to_name, AreaResolver};
pub use document_cmd::{DocumentStore, DEFAULT_FOLDER_COLOR};
pub use checklist_cmd::ChecklistService;
