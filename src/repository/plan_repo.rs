//! Plan Repository Implementation
//!
//! SQLite-backed implementation of PlanRepository. Every write is published on
//! the change bus so open plan views can refresh.

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use uuid::Uuid;

use super::realtime::{ChangeBus, ChangeEvent, ChangeKind};
use super::sql;
use super::tables::PLANES;
use super::traits::{PlanRepository, Repository};
use crate::domain::{dates, DomainError, DomainResult, NewPlanRecord, PlanChanges, PlanRow};

/// SQLite implementation of the plan repository
pub struct SqlitePlanRepository {
    conn: Arc<Mutex<Connection>>,
    bus: ChangeBus,
}

impl SqlitePlanRepository {
    pub fn new(conn: Arc<Mutex<Connection>>, bus: ChangeBus) -> Self {
        Self { conn, bus }
    }

    fn area_of(conn: &Connection, id: Uuid) -> DomainResult<Option<Uuid>> {
        let area: Option<String> = conn
            .query_row(
                &format!("SELECT area_id FROM {} WHERE id = ?1", PLANES),
                params![id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(area.and_then(|a| Uuid::parse_str(&a).ok()))
    }
}

fn row_to_plan(row: &Row<'_>) -> rusqlite::Result<PlanRow> {
    Ok(PlanRow {
        id: sql::get_uuid(row, "id")?,
        area_id: sql::get_uuid(row, "area_id")?,
        user_id: sql::get_opt_uuid(row, "user_id")?,
        programa: row.get("programa")?,
        objetivo: row.get("objetivo")?,
        meta: row.get("meta")?,
        presupuesto: row.get("presupuesto")?,
        acciones: row.get("acciones")?,
        indicadores: row.get("indicadores")?,
        porcentaje_avance: row.get("porcentaje_avance")?,
        fecha_inicio: row.get("fecha_inicio")?,
        fecha_fin: row.get("fecha_fin")?,
        responsable: row.get("responsable")?,
        estado: row.get("estado")?,
        prioridad: row.get("prioridad")?,
        comentarios: row.get("comentarios")?,
        meta_decenal: row.get("meta_decenal")?,
        macroobjetivo_decenal: row.get("macroobjetivo_decenal")?,
        objetivo_decenal: row.get("objetivo_decenal")?,
        programa_pdm: row.get("programa_pdm")?,
        subprograma_pdm: row.get("subprograma_pdm")?,
        proyecto_pdm: row.get("proyecto_pdm")?,
        grupo_etareo: row.get("grupo_etareo")?,
        grupo_poblacion: row.get("grupo_poblacion")?,
        zona: row.get("zona")?,
        grupo_etnico: row.get("grupo_etnico")?,
        cantidad: row.get("cantidad")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn find(conn: &Connection, id: Uuid) -> DomainResult<Option<PlanRow>> {
    let row = conn
        .query_row(
            &format!("SELECT * FROM {} WHERE id = ?1", PLANES),
            params![id.to_string()],
            row_to_plan,
        )
        .optional()?;
    Ok(row)
}

#[async_trait]
impl Repository<PlanRow> for SqlitePlanRepository {
    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<PlanRow>> {
        let conn = self.conn.lock().await;
        find(&conn, id)
    }
}

#[async_trait]
impl PlanRepository for SqlitePlanRepository {
    async fn list_by_area(&self, area_id: Uuid) -> DomainResult<Vec<PlanRow>> {
        let conn = self.conn.lock().await;

        let mut stmt = conn.prepare(&format!(
            "SELECT * FROM {} WHERE area_id = ?1 ORDER BY created_at DESC, rowid DESC",
            PLANES
        ))?;
        let rows = stmt
            .query_map(params![area_id.to_string()], row_to_plan)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    async fn insert(&self, record: &NewPlanRecord) -> DomainResult<PlanRow> {
        let id = Uuid::new_v4();
        let now = dates::now_iso();

        let mut values = sql::columns(record)?;
        values.insert("id".into(), id.to_string().into());
        values.insert("created_at".into(), now.clone().into());
        values.insert("updated_at".into(), now.into());

        let row = {
            let conn = self.conn.lock().await;
            sql::insert(&conn, PLANES, values)?;
            find(&conn, id)?
        }
        .ok_or_else(|| DomainError::Backend("inserted plan not found".into()))?;

        self.bus.publish(ChangeEvent::new(PLANES, ChangeKind::Insert, id, Some(row.area_id)));
        Ok(row)
    }

    async fn update(&self, id: Uuid, changes: &PlanChanges) -> DomainResult<()> {
        let values = sql::columns(changes)?;

        let area_id = {
            let conn = self.conn.lock().await;
            let area_id = Self::area_of(&conn, id)?
                .ok_or_else(|| DomainError::NotFound(format!("plan {} not found", id)))?;
            sql::update_by_id(&conn, PLANES, id, values)?;
            area_id
        };

        self.bus.publish(ChangeEvent::new(PLANES, ChangeKind::Update, id, Some(area_id)));
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> DomainResult<()> {
        let area_id = {
            let conn = self.conn.lock().await;
            let area_id = Self::area_of(&conn, id)?;
            conn.execute(
                &format!("DELETE FROM {} WHERE id = ?1", PLANES),
                params![id.to_string()],
            )?;
            area_id
        };

        // Deleting an absent row is a no-op, as it is on the hosted backend
        if area_id.is_some() {
            self.bus.publish(ChangeEvent::new(PLANES, ChangeKind::Delete, id, area_id));
        }
        Ok(())
    }

    fn changes(&self) -> Option<broadcast::Receiver<ChangeEvent>> {
        Some(self.bus.subscribe())
    }
}
