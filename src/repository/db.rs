//! Database Connection and Setup
//!
//! Manages the SQLite database connection and migrations.

use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::realtime::ChangeBus;
use super::tables;
use crate::domain::{DomainError, DomainResult};

/// Database state wrapper
#[derive(Clone)]
pub struct DbState {
    conn: Arc<Mutex<Connection>>,
    bus: ChangeBus,
}

impl DbState {
    /// Shared connection handle for repositories
    pub fn connection(&self) -> Arc<Mutex<Connection>> {
        self.conn.clone()
    }

    /// Change notification bus shared by repositories of this database
    pub fn bus(&self) -> ChangeBus {
        self.bus.clone()
    }
}

/// Open (or create) the database at `db_path` and run migrations.
/// `":memory:"` opens a private in-memory database.
pub async fn init_db(db_path: &Path) -> DomainResult<DbState> {
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| DomainError::Config(format!("Failed to create db dir: {}", e)))?;
    }

    let conn = Connection::open(db_path)
        .map_err(|e| DomainError::Backend(format!("Failed to open db: {}", e)))?;

    conn.execute_batch("PRAGMA foreign_keys = ON;")?;

    // Run migrations
    run_migrations(&conn)?;
    log::info!("database ready at {}", db_path.display());

    Ok(DbState {
        conn: Arc::new(Mutex::new(conn)),
        bus: ChangeBus::default(),
    })
}

/// Check if a column exists in a table
fn column_exists(conn: &Connection, table: &str, column: &str) -> bool {
    let query = format!("PRAGMA table_info({})", table);
    let Ok(mut stmt) = conn.prepare(&query) else {
        return false;
    };
    let Ok(names) = stmt.query_map([], |row| row.get::<_, String>(1)) else {
        return false;
    };
    let found = names.filter_map(|n| n.ok()).any(|name| name == column);
    found
}

/// Run database migrations
fn run_migrations(conn: &Connection) -> DomainResult<()> {
    conn.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS {areas} (
            id TEXT PRIMARY KEY,
            codigo TEXT NOT NULL,
            nombre TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS {planes} (
            id TEXT PRIMARY KEY,
            area_id TEXT NOT NULL,
            user_id TEXT,
            programa TEXT,
            objetivo TEXT,
            meta TEXT,
            presupuesto TEXT,
            acciones TEXT,
            indicadores TEXT,
            porcentaje_avance INTEGER NOT NULL DEFAULT 0,
            fecha_inicio TEXT,
            fecha_fin TEXT,
            responsable TEXT,
            estado TEXT,
            prioridad TEXT,
            comentarios TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_plan_accion_area ON {planes}(area_id);

        CREATE TABLE IF NOT EXISTS {carpetas} (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            category TEXT NOT NULL DEFAULT '',
            color TEXT NOT NULL DEFAULT '',
            date TEXT NOT NULL DEFAULT '',
            area_id TEXT NOT NULL,
            module_type TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS {documentos} (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            folder_id TEXT NOT NULL REFERENCES {carpetas}(id) ON DELETE CASCADE,
            file_type TEXT NOT NULL,
            file_size INTEGER NOT NULL DEFAULT 0,
            file_url TEXT NOT NULL,
            storage_path TEXT NOT NULL,
            area_id TEXT NOT NULL,
            module_type TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_documentos_folder ON {documentos}(folder_id);

        CREATE TABLE IF NOT EXISTS {items} (
            id TEXT PRIMARY KEY,
            etapa TEXT NOT NULL,
            numero INTEGER NOT NULL,
            descripcion TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS {respuestas} (
            id TEXT PRIMARY KEY,
            contrato TEXT NOT NULL,
            item_id TEXT NOT NULL REFERENCES {items}(id) ON DELETE CASCADE,
            respuesta TEXT NOT NULL,
            observacion TEXT NOT NULL DEFAULT '',
            updated_at TEXT NOT NULL,
            UNIQUE(contrato, item_id)
        );",
        areas = tables::AREAS,
        planes = tables::PLANES,
        carpetas = tables::CARPETAS,
        documentos = tables::DOCUMENTOS,
        items = tables::CHECKLIST_ITEMS,
        respuestas = tables::CHECKLIST_RESPUESTAS,
    ))?;

    // Taxonomy columns were added after the first release
    let taxonomy = [
        "meta_decenal",
        "macroobjetivo_decenal",
        "objetivo_decenal",
        "programa_pdm",
        "subprograma_pdm",
        "proyecto_pdm",
        "grupo_etareo",
        "grupo_poblacion",
        "zona",
        "grupo_etnico",
        "cantidad",
    ];
    for column in taxonomy {
        if !column_exists(conn, tables::PLANES, column) {
            conn.execute(
                &format!("ALTER TABLE {} ADD COLUMN {} TEXT", tables::PLANES, column),
                [],
            )
            .map_err(|e| DomainError::Backend(format!("Failed to add {}: {}", column, e)))?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("planes.db");

        init_db(&path).await.expect("first open");
        let state = init_db(&path).await.expect("second open");

        let conn = state.connection();
        let conn = conn.lock().await;
        assert!(column_exists(&conn, tables::PLANES, "grupo_etnico"));
        assert!(column_exists(&conn, tables::DOCUMENTOS, "storage_path"));
        assert!(!column_exists(&conn, tables::PLANES, "no_such_column"));
    }
}
