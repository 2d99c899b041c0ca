//! Hosted Backend
//!
//! Repository implementations over a PostgREST-style HTTP API. This backend
//! has no change feed; plan views reload after their own writes only.

mod client;
mod plan_repo;
mod area_repo;
mod document_repo;
mod checklist_repo;

pub use client::{eq, ilike_contains, Filter, RestClient};
pub(crate) use client::check_status;
pub use plan_repo::RestPlanRepository;
pub use area_repo::RestAreaRepository;
pub use document_repo::RestDocumentRepository;
pub use checklist_repo::RestChecklistRepository;
