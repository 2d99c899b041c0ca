//! Planes de Acción Backend
//!
//! Data layer of the education secretariat dashboard.
//!
//! Layered architecture:
//! - domain: Core entities and business rules
//! - repository: Data access abstractions, SQLite and REST implementations
//! - storage: Object storage for uploaded documents
//! - commands: Area resolution, documents and contract checklists
//! - store / plan_sync: Per-area plan state and its synchronization
//! - form: Plan form drafts and submit-time validation
//! - config: File and environment configuration

use std::sync::Arc;

pub mod domain;
pub mod repository;
pub mod storage;
pub mod commands;
pub mod store;
pub mod plan_sync;
pub mod form;
pub mod config;

use commands::{AreaResolver, ChecklistService, DocumentStore};
use config::{AppConfig, BackendConfig, LogConfig};
use domain::{DomainError, DomainResult};
use plan_sync::PlanSync;
use repository::rest::{
    RestAreaRepository, RestChecklistRepository, RestClient, RestDocumentRepository,
    RestPlanRepository,
};
use repository::{
    init_db, AreaRepository, ChecklistRepository, DbState, DocumentRepository, PlanRepository,
    SqliteAreaRepository, SqliteChecklistRepository, SqliteDocumentRepository,
    SqlitePlanRepository,
};
use storage::{FsObjectStore, ObjectStore, RestObjectStore};

/// Services shared by every screen
#[derive(Clone)]
pub struct AppState {
    pub areas: AreaResolver,
    pub plans: Arc<dyn PlanRepository>,
    pub documents: DocumentStore,
    pub checklist: ChecklistService,
    pub objects: Arc<dyn ObjectStore>,
    /// Set when the backend is the local database
    pub db: Option<DbState>,
}

impl AppState {
    /// Build repositories and the object store described by `config`
    pub async fn open(config: &AppConfig) -> DomainResult<Self> {
        config.validate()?;

        let (areas, plans, documents, checklist, db): (
            Arc<dyn AreaRepository>,
            Arc<dyn PlanRepository>,
            Arc<dyn DocumentRepository>,
            Arc<dyn ChecklistRepository>,
            Option<DbState>,
        ) = match &config.backend {
            BackendConfig::Sqlite { path } => {
                let db = init_db(path).await?;
                (
                    Arc::new(SqliteAreaRepository::new(db.connection())),
                    Arc::new(SqlitePlanRepository::new(db.connection(), db.bus())),
                    Arc::new(SqliteDocumentRepository::new(db.connection(), db.bus())),
                    Arc::new(SqliteChecklistRepository::new(db.connection())),
                    Some(db),
                )
            }
            BackendConfig::Rest { url, api_key } => {
                let client = RestClient::new(url, api_key);
                log::info!("using REST backend at {}", client.base_url());
                (
                    Arc::new(RestAreaRepository::new(client.clone())),
                    Arc::new(RestPlanRepository::new(client.clone())),
                    Arc::new(RestDocumentRepository::new(client.clone())),
                    Arc::new(RestChecklistRepository::new(client)),
                    None,
                )
            }
        };

        let objects: Arc<dyn ObjectStore> = match config.rest_storage()? {
            Some(target) => Arc::new(RestObjectStore::new(
                RestClient::new(&target.url, &target.api_key),
                &target.bucket,
                target.signed_url_ttl,
            )),
            None => match &config.storage {
                config::StorageConfig::Local { root, base_url } => {
                    Arc::new(FsObjectStore::new(root.clone(), base_url))
                }
                config::StorageConfig::Rest { .. } => {
                    return Err(DomainError::Config("storage is not configured".into()));
                }
            },
        };

        Ok(Self {
            areas: AreaResolver::new(areas),
            plans,
            documents: DocumentStore::new(documents, objects.clone()),
            checklist: ChecklistService::new(checklist),
            objects,
            db,
        })
    }

    /// Plan sync for the area a route slug (or id) names
    pub async fn plan_sync(&self, area: &str) -> DomainResult<PlanSync> {
        let area = self.areas.resolve(area).await?;
        Ok(PlanSync::new(area.id, self.plans.clone()))
    }
}

/// Start the rolling file logger. Fails if called twice.
pub fn init_logging(config: &LogConfig) -> DomainResult<()> {
    let mut options = rolling_logger::LoggerOptions::new(config.dir.clone(), &config.app_name);
    options.level = config.level()?;
    rolling_logger::init_with(options)
        .map_err(|e| DomainError::Config(format!("failed to init logger: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageConfig;
    use crate::domain::{Area, NewActionPlan};
    use std::path::PathBuf;
    use uuid::Uuid;

    fn local_config(dir: &tempfile::TempDir) -> AppConfig {
        AppConfig {
            backend: BackendConfig::Sqlite {
                path: PathBuf::from(":memory:"),
            },
            storage: StorageConfig::Local {
                root: dir.path().join("objects"),
                base_url: "http://localhost/objects".into(),
            },
            log: LogConfig {
                dir: dir.path().join("logs"),
                ..Default::default()
            },
        }
    }

    #[tokio::test]
    async fn test_open_local_and_sync_area() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::open(&local_config(&dir)).await.unwrap();

        let db = state.db.clone().unwrap();
        let area = Area::new(Uuid::new_v4(), "CE", "Calidad Educativa");
        SqliteAreaRepository::new(db.connection()).upsert(&area).await.unwrap();

        let sync = state.plan_sync("calidad-educativa").await.unwrap();
        assert_eq!(sync.area_id(), area.id);

        sync.add(NewActionPlan {
            programa: "Jornada Única".into(),
            objetivo: "Ampliar jornada".into(),
            meta: "10 sedes".into(),
            presupuesto: "$500.000".into(),
            acciones: "Contratar docentes".into(),
            indicadores: "Sedes con jornada".into(),
            responsable: "Cobertura".into(),
            ..Default::default()
        })
        .await
        .unwrap();
        assert_eq!(sync.snapshot().items.len(), 1);

        assert!(state.plan_sync("no-existe").await.err().unwrap().is_not_found());
    }

    #[tokio::test]
    async fn test_open_rejects_incomplete_rest_config() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = local_config(&dir);
        config.backend = BackendConfig::Rest {
            url: "https://db.example.org".into(),
            api_key: " ".into(),
        };
        let err = AppState::open(&config).await.err().unwrap();
        assert!(matches!(err, DomainError::Config(_)));
    }

    #[tokio::test]
    async fn test_open_rest_needs_no_connection() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = local_config(&dir);
        config.backend = BackendConfig::Rest {
            url: "https://db.example.org/".into(),
            api_key: "anon".into(),
        };
        config.storage = StorageConfig::Rest {
            url: None,
            api_key: None,
            bucket: "documentos".into(),
            signed_url_ttl: None,
        };
        let state = AppState::open(&config).await.unwrap();
        assert!(state.db.is_none());
        assert_eq!(
            state.objects.public_url("a/b.pdf"),
            "https://db.example.org/storage/v1/object/public/documentos/a/b.pdf"
        );
    }

    #[test]
    fn test_init_logging_once() {
        let dir = tempfile::tempdir().unwrap();
        let config = LogConfig {
            dir: dir.path().to_path_buf(),
            app_name: "PlanesTest".into(),
            level: "debug".into(),
        };
        init_logging(&config).unwrap();
        assert!(init_logging(&config).is_err());
    }
}
