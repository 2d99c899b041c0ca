//! Checklist Repository
//!
//! Catalog items and per-contract answers. Answers are unique per
//! (contrato, item_id); saving again replaces the previous answer.

use async_trait::async_trait;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::sql;
use super::tables::{CHECKLIST_ITEMS, CHECKLIST_RESPUESTAS};
use super::traits::{ChecklistRepository, Repository};
use crate::domain::{
    dates, ChecklistAnswer, ChecklistItem, DomainError, DomainResult, Etapa, Respuesta,
};

pub struct SqliteChecklistRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteChecklistRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// Add or replace a catalog question
    pub async fn insert_item(&self, item: &ChecklistItem) -> DomainResult<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            &format!(
                "INSERT OR REPLACE INTO {} (id, etapa, numero, descripcion) VALUES (?1, ?2, ?3, ?4)",
                CHECKLIST_ITEMS
            ),
            params![
                item.id.to_string(),
                item.etapa.as_str(),
                item.numero,
                item.descripcion
            ],
        )?;
        Ok(())
    }
}

fn parse_column<T: FromStr<Err = DomainError>>(row: &Row<'_>, column: &str) -> rusqlite::Result<T> {
    let text: String = row.get(column)?;
    text.parse()
        .map_err(|e: DomainError| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))
}

fn row_to_item(row: &Row<'_>) -> rusqlite::Result<ChecklistItem> {
    Ok(ChecklistItem {
        id: sql::get_uuid(row, "id")?,
        etapa: parse_column::<Etapa>(row, "etapa")?,
        numero: row.get("numero")?,
        descripcion: row.get("descripcion")?,
    })
}

fn row_to_answer(row: &Row<'_>) -> rusqlite::Result<ChecklistAnswer> {
    Ok(ChecklistAnswer {
        id: sql::get_uuid(row, "id")?,
        contrato: row.get("contrato")?,
        item_id: sql::get_uuid(row, "item_id")?,
        respuesta: parse_column::<Respuesta>(row, "respuesta")?,
        observacion: row.get("observacion")?,
    })
}

#[async_trait]
impl Repository<ChecklistItem> for SqliteChecklistRepository {
    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<ChecklistItem>> {
        let conn = self.conn.lock().await;
        let item = conn
            .query_row(
                &format!("SELECT * FROM {} WHERE id = ?1", CHECKLIST_ITEMS),
                params![id.to_string()],
                row_to_item,
            )
            .optional()?;
        Ok(item)
    }
}

#[async_trait]
impl ChecklistRepository for SqliteChecklistRepository {
    async fn list_items(&self) -> DomainResult<Vec<ChecklistItem>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&format!(
            "SELECT * FROM {} ORDER BY
                CASE etapa WHEN 'precontractual' THEN 0 WHEN 'contractual' THEN 1 ELSE 2 END,
                numero",
            CHECKLIST_ITEMS
        ))?;
        let items = stmt
            .query_map([], row_to_item)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(items)
    }

    async fn list_answers(&self, contrato: &str) -> DomainResult<Vec<ChecklistAnswer>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&format!(
            "SELECT * FROM {} WHERE contrato = ?1",
            CHECKLIST_RESPUESTAS
        ))?;
        let answers = stmt
            .query_map(params![contrato], row_to_answer)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(answers)
    }

    async fn upsert_answer(&self, answer: &ChecklistAnswer) -> DomainResult<ChecklistAnswer> {
        let conn = self.conn.lock().await;
        conn.execute(
            &format!(
                "INSERT INTO {} (id, contrato, item_id, respuesta, observacion, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(contrato, item_id) DO UPDATE SET
                    respuesta = excluded.respuesta,
                    observacion = excluded.observacion,
                    updated_at = excluded.updated_at",
                CHECKLIST_RESPUESTAS
            ),
            params![
                answer.id.to_string(),
                answer.contrato,
                answer.item_id.to_string(),
                answer.respuesta.as_str(),
                answer.observacion,
                dates::now_iso(),
            ],
        )?;

        // The stored row keeps the id of the first answer
        let stored = conn
            .query_row(
                &format!(
                    "SELECT * FROM {} WHERE contrato = ?1 AND item_id = ?2",
                    CHECKLIST_RESPUESTAS
                ),
                params![answer.contrato, answer.item_id.to_string()],
                row_to_answer,
            )
            .optional()?;
        stored.ok_or_else(|| DomainError::Backend("saved answer not found".into()))
    }
}
