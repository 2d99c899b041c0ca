//! Repository Layer - Core Traits
//!
//! Defines the abstract interfaces for data access.
//! Implementations exist for embedded SQLite and for a hosted PostgREST backend.

use async_trait::async_trait;
use tokio::sync::broadcast;
use uuid::Uuid;

use super::realtime::ChangeEvent;
use crate::domain::{
    Area, ChecklistAnswer, ChecklistItem, Document, DomainResult, Entity, Folder, NewPlanRecord,
    PlanChanges, PlanRow,
};

/// Core repository trait: lookup by identifier
///
/// Generic over any Entity type.
/// All operations are async to support various backends.
#[async_trait]
pub trait Repository<T: Entity>: Send + Sync {
    /// Find entity by ID
    async fn find_by_id(&self, id: T::Id) -> DomainResult<Option<T>>;
}

/// Extension for repositories that support text search
#[async_trait]
pub trait SearchableRepository<T: Entity>: Repository<T> {
    /// Case-insensitive partial match on the entity's display name
    async fn search(&self, query: &str) -> DomainResult<Vec<T>>;
}

/// Areas are reference data: read and search only
#[async_trait]
pub trait AreaRepository: SearchableRepository<Area> {
    /// Case-insensitive partial match on the short code
    async fn search_by_codigo(&self, query: &str) -> DomainResult<Vec<Area>>;

    /// All areas ordered by name
    async fn list(&self) -> DomainResult<Vec<Area>>;
}

/// Action plan rows
#[async_trait]
pub trait PlanRepository: Repository<PlanRow> {
    /// Rows of one area, newest created first
    async fn list_by_area(&self, area_id: Uuid) -> DomainResult<Vec<PlanRow>>;

    /// Insert a row; the backend assigns id and timestamps
    async fn insert(&self, record: &NewPlanRecord) -> DomainResult<PlanRow>;

    /// Apply a partial update; absent columns are left untouched
    async fn update(&self, id: Uuid, changes: &PlanChanges) -> DomainResult<()>;

    /// Hard delete
    async fn delete(&self, id: Uuid) -> DomainResult<()>;

    /// Change notifications for the plans table, when the backend has them
    fn changes(&self) -> Option<broadcast::Receiver<ChangeEvent>> {
        None
    }
}

/// Folder and document metadata
#[async_trait]
pub trait DocumentRepository: Repository<Document> {
    async fn insert_folder(&self, folder: &Folder) -> DomainResult<Folder>;

    async fn find_folder(&self, id: Uuid) -> DomainResult<Option<Folder>>;

    async fn list_folders(&self, area_id: Uuid, module_type: &str) -> DomainResult<Vec<Folder>>;

    /// Delete the folder row only; documents are handled by the caller
    async fn delete_folder(&self, id: Uuid) -> DomainResult<()>;

    async fn insert_document(&self, document: &Document) -> DomainResult<Document>;

    async fn list_documents(
        &self,
        area_id: Uuid,
        module_type: &str,
        folder_id: Option<Uuid>,
    ) -> DomainResult<Vec<Document>>;

    async fn delete_document(&self, id: Uuid) -> DomainResult<()>;
}

/// Checklist catalog and answers
#[async_trait]
pub trait ChecklistRepository: Repository<ChecklistItem> {
    /// Catalog ordered by stage then number
    async fn list_items(&self) -> DomainResult<Vec<ChecklistItem>>;

    async fn list_answers(&self, contrato: &str) -> DomainResult<Vec<ChecklistAnswer>>;

    /// Insert or replace the answer for (contrato, item_id)
    async fn upsert_answer(&self, answer: &ChecklistAnswer) -> DomainResult<ChecklistAnswer>;
}
