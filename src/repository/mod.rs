//! Repository Layer
//!
//! Data access abstractions and implementations.

mod traits;
mod db;
mod realtime;
mod sql;
mod plan_repo;
mod area_repo;
mod document_repo;
mod checklist_repo;
pub mod rest;

#[cfg(test)]
mod tests;

/// Table names, shared by the SQLite schema and the hosted backend
pub mod tables {
    pub const AREAS: &str = "areas";
    pub const PLANES: &str = "plan_accion";
    pub const CARPETAS: &str = "carpetas";
    pub const DOCUMENTOS: &str = "documentos";
    pub const CHECKLIST_ITEMS: &str = "lista_chequeo_items";
    pub const CHECKLIST_RESPUESTAS: &str = "lista_chequeo_respuestas";
}

pub use traits::{
    AreaRepository, ChecklistRepository, DocumentRepository, PlanRepository, Repository,
    SearchableRepository,
};
pub use db::{init_db, DbState};
pub use realtime::{ChangeBus, ChangeEvent, ChangeKind};
pub use plan_repo::SqlitePlanRepository;
pub use area_repo::SqliteAreaRepository;
pub use document_repo::SqliteDocumentRepository;
pub use checklist_repo::SqliteChecklistRepository;
