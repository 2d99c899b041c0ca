//! Area Repository
//!
//! Read access to the area reference table, plus seeding for local setups.

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::sql;
use super::tables::AREAS;
use super::traits::{AreaRepository, Repository, SearchableRepository};
use crate::domain::{Area, DomainResult};

pub struct SqliteAreaRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteAreaRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// Insert or replace an area row
    pub async fn upsert(&self, area: &Area) -> DomainResult<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            &format!(
                "INSERT OR REPLACE INTO {} (id, codigo, nombre) VALUES (?1, ?2, ?3)",
                AREAS
            ),
            params![area.id.to_string(), area.codigo, area.nombre],
        )?;
        Ok(())
    }

    /// Case-insensitive substring match on `column`, full Unicode folding.
    /// `%` and `_` in the query are plain characters.
    async fn search_column(&self, column: Column, query: &str) -> DomainResult<Vec<Area>> {
        let needle = query.trim().to_lowercase();
        let areas = self.list().await?;
        Ok(areas
            .into_iter()
            .filter(|area| {
                let value = match column {
                    Column::Nombre => &area.nombre,
                    Column::Codigo => &area.codigo,
                };
                value.to_lowercase().contains(&needle)
            })
            .collect())
    }
}

#[derive(Clone, Copy)]
enum Column {
    Nombre,
    Codigo,
}

fn row_to_area(row: &Row<'_>) -> rusqlite::Result<Area> {
    Ok(Area {
        id: sql::get_uuid(row, "id")?,
        codigo: row.get("codigo")?,
        nombre: row.get("nombre")?,
    })
}

#[async_trait]
impl Repository<Area> for SqliteAreaRepository {
    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<Area>> {
        let conn = self.conn.lock().await;
        let area = conn
            .query_row(
                &format!("SELECT id, codigo, nombre FROM {} WHERE id = ?1", AREAS),
                params![id.to_string()],
                row_to_area,
            )
            .optional()?;
        Ok(area)
    }
}

#[async_trait]
impl SearchableRepository<Area> for SqliteAreaRepository {
    async fn search(&self, query: &str) -> DomainResult<Vec<Area>> {
        self.search_column(Column::Nombre, query).await
    }
}

#[async_trait]
impl AreaRepository for SqliteAreaRepository {
    async fn search_by_codigo(&self, query: &str) -> DomainResult<Vec<Area>> {
        self.search_column(Column::Codigo, query).await
    }

    async fn list(&self) -> DomainResult<Vec<Area>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&format!(
            "SELECT id, codigo, nombre FROM {} ORDER BY nombre",
            AREAS
        ))?;
        let areas = stmt
            .query_map([], row_to_area)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(areas)
    }
}
