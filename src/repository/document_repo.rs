//! Document Repository
//!
//! Folder and document metadata in SQLite. Documents reference their folder
//! with ON DELETE CASCADE, so a folder row never leaves orphans behind.

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::realtime::{ChangeBus, ChangeEvent, ChangeKind};
use super::sql;
use super::tables::{CARPETAS, DOCUMENTOS};
use super::traits::{DocumentRepository, Repository};
use crate::domain::{dates, Document, DomainError, DomainResult, Folder};

pub struct SqliteDocumentRepository {
    conn: Arc<Mutex<Connection>>,
    bus: ChangeBus,
}

impl SqliteDocumentRepository {
    pub fn new(conn: Arc<Mutex<Connection>>, bus: ChangeBus) -> Self {
        Self { conn, bus }
    }
}

fn row_to_folder(row: &Row<'_>) -> rusqlite::Result<Folder> {
    Ok(Folder {
        id: sql::get_uuid(row, "id")?,
        name: row.get("name")?,
        category: row.get("category")?,
        color: row.get("color")?,
        date: row.get("date")?,
        area_id: sql::get_uuid(row, "area_id")?,
        module_type: row.get("module_type")?,
    })
}

fn row_to_document(row: &Row<'_>) -> rusqlite::Result<Document> {
    Ok(Document {
        id: sql::get_uuid(row, "id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        folder_id: sql::get_uuid(row, "folder_id")?,
        file_type: row.get("file_type")?,
        file_size: row.get("file_size")?,
        file_url: row.get("file_url")?,
        storage_path: row.get("storage_path")?,
        area_id: sql::get_uuid(row, "area_id")?,
        module_type: row.get("module_type")?,
        created_at: row.get("created_at")?,
    })
}

fn find_folder(conn: &Connection, id: Uuid) -> DomainResult<Option<Folder>> {
    Ok(conn
        .query_row(
            &format!("SELECT * FROM {} WHERE id = ?1", CARPETAS),
            params![id.to_string()],
            row_to_folder,
        )
        .optional()?)
}

fn find_document(conn: &Connection, id: Uuid) -> DomainResult<Option<Document>> {
    Ok(conn
        .query_row(
            &format!("SELECT * FROM {} WHERE id = ?1", DOCUMENTOS),
            params![id.to_string()],
            row_to_document,
        )
        .optional()?)
}

#[async_trait]
impl Repository<Document> for SqliteDocumentRepository {
    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<Document>> {
        let conn = self.conn.lock().await;
        find_document(&conn, id)
    }
}

#[async_trait]
impl DocumentRepository for SqliteDocumentRepository {
    async fn insert_folder(&self, folder: &Folder) -> DomainResult<Folder> {
        let mut values = sql::columns(folder)?;
        // Domain structs serialize camelCase; columns are snake_case
        let area = values.remove("areaId");
        let module = values.remove("moduleType");
        values.insert("area_id".into(), area.unwrap_or_default());
        values.insert("module_type".into(), module.unwrap_or_default());
        values.insert("created_at".into(), dates::now_iso().into());

        let conn = self.conn.lock().await;
        sql::insert(&conn, CARPETAS, values)?;
        find_folder(&conn, folder.id)?
            .ok_or_else(|| DomainError::Backend("inserted folder not found".into()))
    }

    async fn find_folder(&self, id: Uuid) -> DomainResult<Option<Folder>> {
        let conn = self.conn.lock().await;
        find_folder(&conn, id)
    }

    async fn list_folders(&self, area_id: Uuid, module_type: &str) -> DomainResult<Vec<Folder>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&format!(
            "SELECT * FROM {} WHERE area_id = ?1 AND module_type = ?2 ORDER BY created_at DESC, rowid DESC",
            CARPETAS
        ))?;
        let folders = stmt
            .query_map(params![area_id.to_string(), module_type], row_to_folder)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(folders)
    }

    async fn delete_folder(&self, id: Uuid) -> DomainResult<()> {
        let area_id = {
            let conn = self.conn.lock().await;
            let area_id = find_folder(&conn, id)?.map(|f| f.area_id);
            conn.execute(
                &format!("DELETE FROM {} WHERE id = ?1", CARPETAS),
                params![id.to_string()],
            )?;
            area_id
        };

        if area_id.is_some() {
            self.bus.publish(ChangeEvent::new(CARPETAS, ChangeKind::Delete, id, area_id));
        }
        Ok(())
    }

    async fn insert_document(&self, document: &Document) -> DomainResult<Document> {
        let created_at = document.created_at.clone().unwrap_or_else(dates::now_iso);

        let inserted = {
            let conn = self.conn.lock().await;
            conn.execute(
                &format!(
                    "INSERT INTO {} (id, name, description, folder_id, file_type, file_size, file_url, storage_path, area_id, module_type, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                    DOCUMENTOS
                ),
                params![
                    document.id.to_string(),
                    document.name,
                    document.description,
                    document.folder_id.to_string(),
                    document.file_type,
                    document.file_size,
                    document.file_url,
                    document.storage_path,
                    document.area_id.to_string(),
                    document.module_type,
                    created_at,
                ],
            )?;
            find_document(&conn, document.id)?
        }
        .ok_or_else(|| DomainError::Backend("inserted document not found".into()))?;

        self.bus.publish(ChangeEvent::new(
            DOCUMENTOS,
            ChangeKind::Insert,
            inserted.id,
            Some(inserted.area_id),
        ));
        Ok(inserted)
    }

    async fn list_documents(
        &self,
        area_id: Uuid,
        module_type: &str,
        folder_id: Option<Uuid>,
    ) -> DomainResult<Vec<Document>> {
        let conn = self.conn.lock().await;

        let documents = match folder_id {
            Some(folder_id) => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT * FROM {} WHERE area_id = ?1 AND module_type = ?2 AND folder_id = ?3
                     ORDER BY created_at DESC, rowid DESC",
                    DOCUMENTOS
                ))?;
                let rows = stmt.query_map(
                    params![area_id.to_string(), module_type, folder_id.to_string()],
                    row_to_document,
                )?;
                let found = rows.collect::<rusqlite::Result<Vec<_>>>()?;
                found
            }
            None => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT * FROM {} WHERE area_id = ?1 AND module_type = ?2
                     ORDER BY created_at DESC, rowid DESC",
                    DOCUMENTOS
                ))?;
                let rows =
                    stmt.query_map(params![area_id.to_string(), module_type], row_to_document)?;
                let found = rows.collect::<rusqlite::Result<Vec<_>>>()?;
                found
            }
        };
        Ok(documents)
    }

    async fn delete_document(&self, id: Uuid) -> DomainResult<()> {
        let area_id = {
            let conn = self.conn.lock().await;
            let area_id = find_document(&conn, id)?.map(|d| d.area_id);
            conn.execute(
                &format!("DELETE FROM {} WHERE id = ?1", DOCUMENTOS),
                params![id.to_string()],
            )?;
            area_id
        };

        if area_id.is_some() {
            self.bus.publish(ChangeEvent::new(DOCUMENTOS, ChangeKind::Delete, id, area_id));
        }
        Ok(())
    }
}
