//! Folder and document metadata over the hosted backend
//!
//! The tables use snake_case columns while the domain structs are camelCase,
//! so rows go through small wire structs.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::client::{eq, Filter, RestClient};
use crate::domain::{Document, DomainResult, Folder};
use crate::repository::tables::{CARPETAS, DOCUMENTOS};
use crate::repository::traits::{DocumentRepository, Repository};

#[derive(Debug, Serialize, Deserialize)]
struct FolderRow {
    id: Uuid,
    name: String,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    color: Option<String>,
    #[serde(default)]
    date: Option<String>,
    area_id: Uuid,
    module_type: String,
}

impl From<&Folder> for FolderRow {
    fn from(f: &Folder) -> Self {
        Self {
            id: f.id,
            name: f.name.clone(),
            category: Some(f.category.clone()),
            color: Some(f.color.clone()),
            date: Some(f.date.clone()),
            area_id: f.area_id,
            module_type: f.module_type.clone(),
        }
    }
}

impl From<FolderRow> for Folder {
    fn from(r: FolderRow) -> Self {
        Self {
            id: r.id,
            name: r.name,
            category: r.category.unwrap_or_default(),
            color: r.color.unwrap_or_default(),
            date: r.date.unwrap_or_default(),
            area_id: r.area_id,
            module_type: r.module_type,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct DocumentRow {
    id: Uuid,
    name: String,
    #[serde(default)]
    description: Option<String>,
    folder_id: Uuid,
    file_type: String,
    #[serde(default)]
    file_size: i64,
    file_url: String,
    #[serde(default)]
    storage_path: Option<String>,
    area_id: Uuid,
    module_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    created_at: Option<String>,
}

impl From<&Document> for DocumentRow {
    fn from(d: &Document) -> Self {
        Self {
            id: d.id,
            name: d.name.clone(),
            description: Some(d.description.clone()),
            folder_id: d.folder_id,
            file_type: d.file_type.clone(),
            file_size: d.file_size,
            file_url: d.file_url.clone(),
            storage_path: Some(d.storage_path.clone()),
            area_id: d.area_id,
            module_type: d.module_type.clone(),
            created_at: d.created_at.clone(),
        }
    }
}

impl From<DocumentRow> for Document {
    fn from(r: DocumentRow) -> Self {
        Self {
            id: r.id,
            name: r.name,
            description: r.description.unwrap_or_default(),
            folder_id: r.folder_id,
            file_type: r.file_type,
            file_size: r.file_size,
            file_url: r.file_url,
            storage_path: r.storage_path.unwrap_or_default(),
            area_id: r.area_id,
            module_type: r.module_type,
            created_at: r.created_at,
        }
    }
}

pub struct RestDocumentRepository {
    client: RestClient,
}

impl RestDocumentRepository {
    pub fn new(client: RestClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Repository<Document> for RestDocumentRepository {
    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<Document>> {
        let row: Option<DocumentRow> = self.client.select_one(DOCUMENTOS, &[("id", eq(id))]).await?;
        Ok(row.map(Document::from))
    }
}

#[async_trait]
impl DocumentRepository for RestDocumentRepository {
    async fn insert_folder(&self, folder: &Folder) -> DomainResult<Folder> {
        let row: FolderRow = self.client.insert(CARPETAS, &FolderRow::from(folder)).await?;
        Ok(row.into())
    }

    async fn find_folder(&self, id: Uuid) -> DomainResult<Option<Folder>> {
        let row: Option<FolderRow> = self.client.select_one(CARPETAS, &[("id", eq(id))]).await?;
        Ok(row.map(Folder::from))
    }

    async fn list_folders(&self, area_id: Uuid, module_type: &str) -> DomainResult<Vec<Folder>> {
        let rows: Vec<FolderRow> = self
            .client
            .select(
                CARPETAS,
                &[("area_id", eq(area_id)), ("module_type", eq(module_type))],
                Some("created_at.desc"),
            )
            .await?;
        Ok(rows.into_iter().map(Folder::from).collect())
    }

    async fn delete_folder(&self, id: Uuid) -> DomainResult<()> {
        self.client.delete(CARPETAS, &[("id", eq(id))]).await
    }

    async fn insert_document(&self, document: &Document) -> DomainResult<Document> {
        let row: DocumentRow = self
            .client
            .insert(DOCUMENTOS, &DocumentRow::from(document))
            .await?;
        Ok(row.into())
    }

    async fn list_documents(
        &self,
        area_id: Uuid,
        module_type: &str,
        folder_id: Option<Uuid>,
    ) -> DomainResult<Vec<Document>> {
        let mut filters: Vec<Filter> =
            vec![("area_id", eq(area_id)), ("module_type", eq(module_type))];
        if let Some(folder_id) = folder_id {
            filters.push(("folder_id", eq(folder_id)));
        }
        let rows: Vec<DocumentRow> = self
            .client
            .select(DOCUMENTOS, &filters, Some("created_at.desc"))
            .await?;
        Ok(rows.into_iter().map(Document::from).collect())
    }

    async fn delete_document(&self, id: Uuid) -> DomainResult<()> {
        self.client.delete(DOCUMENTOS, &[("id", eq(id))]).await
    }
}
