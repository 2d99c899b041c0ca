//! Document Store
//!
//! Folder management and file upload/delete over an object store plus the
//! metadata table. Object and row writes are not transactional: an upload
//! whose row fails removes its object, a delete whose object removal fails
//! still removes the row.

use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{
    dates, object_key, Document, DomainError, DomainResult, Folder, NewFolder, UploadFile,
};
use crate::repository::{DocumentRepository, Repository};
use crate::storage::ObjectStore;

/// Folder color when none is picked
pub const DEFAULT_FOLDER_COLOR: &str = "#2563EB";

#[derive(Clone)]
pub struct DocumentStore {
    repo: Arc<dyn DocumentRepository>,
    objects: Arc<dyn ObjectStore>,
}

impl DocumentStore {
    pub fn new(repo: Arc<dyn DocumentRepository>, objects: Arc<dyn ObjectStore>) -> Self {
        Self { repo, objects }
    }

    // ========================
    // Folders
    // ========================

    pub async fn create_folder(&self, input: NewFolder) -> DomainResult<Folder> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(DomainError::required("name"));
        }
        if input.module_type.trim().is_empty() {
            return Err(DomainError::required("moduleType"));
        }

        let date = match dates::parse_date(&input.date) {
            Some(d) => dates::format_date(&d),
            None => dates::format_date(&chrono::Utc::now()),
        };
        let color = if input.color.trim().is_empty() {
            DEFAULT_FOLDER_COLOR.to_string()
        } else {
            input.color.trim().to_string()
        };

        let folder = Folder {
            id: Uuid::new_v4(),
            name: name.to_string(),
            category: input.category.trim().to_string(),
            color,
            date,
            area_id: input.area_id,
            module_type: input.module_type.trim().to_string(),
        };
        let folder = self.repo.insert_folder(&folder).await?;
        log::info!("created folder '{}' ({})", folder.name, folder.id);
        Ok(folder)
    }

    pub async fn list_folders(&self, area_id: Uuid, module_type: &str) -> DomainResult<Vec<Folder>> {
        self.repo.list_folders(area_id, module_type).await
    }

    /// Delete every document of the folder, then the folder
    pub async fn delete_folder(&self, folder_id: Uuid) -> DomainResult<()> {
        let folder = self
            .repo
            .find_folder(folder_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("folder {} not found", folder_id)))?;

        let documents = self
            .repo
            .list_documents(folder.area_id, &folder.module_type, Some(folder.id))
            .await?;
        for document in &documents {
            self.remove(document).await?;
        }

        self.repo.delete_folder(folder.id).await?;
        log::info!("deleted folder {} with {} documents", folder.id, documents.len());
        Ok(())
    }

    // ========================
    // Documents
    // ========================

    /// Store the bytes, then the metadata row pointing at them
    pub async fn upload(
        &self,
        file: UploadFile,
        folder_id: Uuid,
        name: &str,
        description: &str,
    ) -> DomainResult<Document> {
        let folder = self
            .repo
            .find_folder(folder_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("folder {} not found", folder_id)))?;

        let id = Uuid::new_v4();
        let key = object_key(&folder, id, &file.extension());
        let file_type = file.mime_type();
        let name = match name.trim() {
            "" => file.file_name.clone(),
            n => n.to_string(),
        };

        let url = self.objects.put(&key, &file.bytes, &file_type).await?;

        let document = Document {
            id,
            name,
            description: description.trim().to_string(),
            folder_id: folder.id,
            file_type,
            file_size: file.bytes.len() as i64,
            file_url: url,
            storage_path: key.clone(),
            area_id: folder.area_id,
            module_type: folder.module_type.clone(),
            created_at: None,
        };

        match self.repo.insert_document(&document).await {
            Ok(stored) => {
                log::info!("uploaded {} ({} bytes)", key, stored.file_size);
                Ok(stored)
            }
            Err(e) => {
                if let Err(cleanup) = self.objects.delete(&key).await {
                    log::error!("orphaned object {} left behind: {}", key, cleanup);
                }
                Err(e)
            }
        }
    }

    pub async fn list(
        &self,
        area_id: Uuid,
        module_type: &str,
        folder_id: Option<Uuid>,
    ) -> DomainResult<Vec<Document>> {
        self.repo.list_documents(area_id, module_type, folder_id).await
    }

    pub async fn delete(&self, document_id: Uuid) -> DomainResult<()> {
        let document = self.find(document_id).await?;
        self.remove(&document).await
    }

    /// URL the browser can download from
    pub async fn download_url(&self, document_id: Uuid) -> DomainResult<String> {
        let document = self.find(document_id).await?;
        if document.storage_path.is_empty() {
            return Ok(document.file_url);
        }
        self.objects.signed_url(&document.storage_path).await
    }

    async fn find(&self, document_id: Uuid) -> DomainResult<Document> {
        self.repo
            .find_by_id(document_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("document {} not found", document_id)))
    }

    async fn remove(&self, document: &Document) -> DomainResult<()> {
        if !document.storage_path.is_empty() {
            if let Err(e) = self.objects.delete(&document.storage_path).await {
                log::warn!("could not delete object {}: {}", document.storage_path, e);
            }
        }
        self.repo.delete_document(document.id).await
    }
}
