//! Repository Integration Tests
//!
//! Tests for the SQLite repositories with an in-memory database.

#[cfg(test)]
mod tests {
    use crate::domain::{
        Area, ChecklistAnswer, ChecklistItem, Document, Estado, Etapa, Folder, NewActionPlan,
        NewPlanRecord, PlanChanges, Respuesta,
    };
    use crate::repository::{
        init_db, AreaRepository, ChangeKind, ChecklistRepository, DbState, DocumentRepository,
        PlanRepository, Repository, SearchableRepository, SqliteAreaRepository,
        SqliteChecklistRepository, SqliteDocumentRepository, SqlitePlanRepository,
    };
    use std::path::PathBuf;
    use uuid::Uuid;

    async fn setup_test_db() -> DbState {
        // Use in-memory database for tests
        let db_path = PathBuf::from(":memory:");
        init_db(&db_path).await.expect("Failed to init test DB")
    }

    fn plan(programa: &str) -> NewActionPlan {
        NewActionPlan {
            programa: programa.to_string(),
            objetivo: "Objetivo".into(),
            meta: "Meta".into(),
            presupuesto: "$1.000.000".into(),
            acciones: "Acciones".into(),
            indicadores: "Indicadores".into(),
            responsable: "Responsable".into(),
            fecha_inicio: "01/02/2025".into(),
            ..Default::default()
        }
    }

    fn folder(area: Uuid) -> Folder {
        Folder {
            id: Uuid::new_v4(),
            name: "Actas".into(),
            category: "Soportes".into(),
            color: "#2563EB".into(),
            date: "05/03/2025".into(),
            area_id: area,
            module_type: "plan-accion".into(),
        }
    }

    fn document(folder: &Folder, name: &str) -> Document {
        Document {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: String::new(),
            folder_id: folder.id,
            file_type: "application/pdf".into(),
            file_size: 3,
            file_url: format!("http://localhost/{}", name),
            storage_path: format!("documentos/{}", name),
            area_id: folder.area_id,
            module_type: folder.module_type.clone(),
            created_at: None,
        }
    }

    // ========================
    // Areas
    // ========================

    #[tokio::test]
    async fn test_area_search_is_case_insensitive() {
        let db = setup_test_db().await;
        let repo = SqliteAreaRepository::new(db.connection());
        let calidad = Area::new(Uuid::new_v4(), "CAL-EDU", "Calidad Educativa");
        repo.upsert(&calidad).await.unwrap();
        repo.upsert(&Area::new(Uuid::new_v4(), "COB", "Cobertura")).await.unwrap();

        let found = repo.search("calidad educ").await.unwrap();
        assert_eq!(found, vec![calidad.clone()]);

        let by_code = repo.search_by_codigo("cal-edu").await.unwrap();
        assert_eq!(by_code, vec![calidad.clone()]);

        assert_eq!(repo.list().await.unwrap().len(), 2);
        assert_eq!(repo.find_by_id(calidad.id).await.unwrap(), Some(calidad));
    }

    #[tokio::test]
    async fn test_area_search_folds_accents_and_keeps_wildcards_literal() {
        let db = setup_test_db().await;
        let repo = SqliteAreaRepository::new(db.connection());
        let inspeccion = Area::new(Uuid::new_v4(), "INS_VIG", "INSPECCIÓN Y VIGILANCIA");
        repo.upsert(&inspeccion).await.unwrap();
        repo.upsert(&Area::new(Uuid::new_v4(), "INSXVIG", "Infraestructura")).await.unwrap();

        let found = repo.search("inspección").await.unwrap();
        assert_eq!(found, vec![inspeccion.clone()]);

        // `_` matches only an underscore, `%` matches nothing here
        let by_code = repo.search_by_codigo("ins_vig").await.unwrap();
        assert_eq!(by_code, vec![inspeccion]);
        assert!(repo.search("%").await.unwrap().is_empty());
    }

    // ========================
    // Plans
    // ========================

    #[tokio::test]
    async fn test_plan_insert_and_list_newest_first() {
        let db = setup_test_db().await;
        let repo = SqlitePlanRepository::new(db.connection(), db.bus());
        let area = Uuid::new_v4();

        repo.insert(&NewPlanRecord::from_new(area, &plan("Primero"))).await.unwrap();
        let second = repo
            .insert(&NewPlanRecord::from_new(area, &plan("Segundo")))
            .await
            .unwrap();
        repo.insert(&NewPlanRecord::from_new(Uuid::new_v4(), &plan("Otra área")))
            .await
            .unwrap();

        let rows = repo.list_by_area(area).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, second.id);
        assert_eq!(rows[0].programa.as_deref(), Some("Segundo"));
        assert_eq!(rows[0].porcentaje_avance, Some(0.0));
        assert_eq!(rows[0].estado.as_deref(), Some(Estado::Pendiente.as_str()));
        assert_eq!(rows[0].fecha_fin, None);
        assert!(rows[0].created_at.is_some());
    }

    #[tokio::test]
    async fn test_plan_partial_update_keeps_other_columns() {
        let db = setup_test_db().await;
        let repo = SqlitePlanRepository::new(db.connection(), db.bus());
        let row = repo
            .insert(&NewPlanRecord::from_new(Uuid::new_v4(), &plan("Programa")))
            .await
            .unwrap();

        let changes = PlanChanges {
            meta: Some("Meta ajustada".into()),
            porcentaje_avance: Some(55),
            zona: Some(None),
            ..Default::default()
        };
        repo.update(row.id, &changes).await.expect("Update failed");

        let found = repo.find_by_id(row.id).await.unwrap().unwrap();
        assert_eq!(found.meta.as_deref(), Some("Meta ajustada"));
        assert_eq!(found.porcentaje_avance, Some(55.0));
        assert_eq!(found.programa.as_deref(), Some("Programa"));
        assert_eq!(found.zona, None);
    }

    #[tokio::test]
    async fn test_plan_update_missing_is_not_found() {
        let db = setup_test_db().await;
        let repo = SqlitePlanRepository::new(db.connection(), db.bus());
        let err = repo
            .update(Uuid::new_v4(), &PlanChanges::default())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_plan_writes_are_published() {
        let db = setup_test_db().await;
        let repo = SqlitePlanRepository::new(db.connection(), db.bus());
        let mut rx = repo.changes().expect("sqlite has a change feed");
        let area = Uuid::new_v4();

        let row = repo.insert(&NewPlanRecord::from_new(area, &plan("P"))).await.unwrap();
        repo.delete(row.id).await.unwrap();
        // Absent row: no event
        repo.delete(row.id).await.unwrap();

        let first = rx.recv().await.unwrap();
        assert_eq!(first.kind, ChangeKind::Insert);
        assert!(first.matches("plan_accion", area));
        let second = rx.recv().await.unwrap();
        assert_eq!(second.kind, ChangeKind::Delete);
        assert!(rx.try_recv().is_err());
    }

    // ========================
    // Folders & Documents
    // ========================

    #[tokio::test]
    async fn test_folder_delete_cascades_to_documents() {
        let db = setup_test_db().await;
        let repo = SqliteDocumentRepository::new(db.connection(), db.bus());
        let area = Uuid::new_v4();
        let f = repo.insert_folder(&folder(area)).await.unwrap();
        repo.insert_document(&document(&f, "a.pdf")).await.unwrap();
        repo.insert_document(&document(&f, "b.pdf")).await.unwrap();

        let docs = repo.list_documents(area, "plan-accion", Some(f.id)).await.unwrap();
        assert_eq!(docs.len(), 2);

        repo.delete_folder(f.id).await.unwrap();
        assert!(repo.find_folder(f.id).await.unwrap().is_none());
        let docs = repo.list_documents(area, "plan-accion", None).await.unwrap();
        assert!(docs.is_empty());
    }

    #[tokio::test]
    async fn test_document_requires_existing_folder() {
        let db = setup_test_db().await;
        let repo = SqliteDocumentRepository::new(db.connection(), db.bus());
        let orphan = folder(Uuid::new_v4());
        let result = repo.insert_document(&document(&orphan, "x.pdf")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_list_folders_scoped_by_module() {
        let db = setup_test_db().await;
        let repo = SqliteDocumentRepository::new(db.connection(), db.bus());
        let area = Uuid::new_v4();
        let f = repo.insert_folder(&folder(area)).await.unwrap();
        let mut other = folder(area);
        other.module_type = "lista-chequeo".into();
        repo.insert_folder(&other).await.unwrap();

        let folders = repo.list_folders(area, "plan-accion").await.unwrap();
        assert_eq!(folders, vec![f]);
    }

    // ========================
    // Checklist
    // ========================

    #[tokio::test]
    async fn test_checklist_catalog_order_and_upsert() {
        let db = setup_test_db().await;
        let repo = SqliteChecklistRepository::new(db.connection());
        let items = [
            (Etapa::Postcontractual, 1),
            (Etapa::Precontractual, 2),
            (Etapa::Contractual, 1),
            (Etapa::Precontractual, 1),
        ];
        for (i, (etapa, numero)) in items.iter().enumerate() {
            repo.insert_item(&ChecklistItem {
                id: Uuid::from_u128(i as u128 + 1),
                etapa: *etapa,
                numero: *numero,
                descripcion: format!("Pregunta {}", i),
            })
            .await
            .unwrap();
        }

        let catalog = repo.list_items().await.unwrap();
        let order: Vec<(Etapa, i32)> = catalog.iter().map(|i| (i.etapa, i.numero)).collect();
        assert_eq!(
            order,
            vec![
                (Etapa::Precontractual, 1),
                (Etapa::Precontractual, 2),
                (Etapa::Contractual, 1),
                (Etapa::Postcontractual, 1),
            ]
        );

        let first = ChecklistAnswer {
            id: Uuid::new_v4(),
            contrato: "SE-CD-045-2025".into(),
            item_id: Uuid::from_u128(1),
            respuesta: Respuesta::No,
            observacion: String::new(),
        };
        let stored = repo.upsert_answer(&first).await.unwrap();
        assert_eq!(stored.id, first.id);

        let again = ChecklistAnswer {
            id: Uuid::new_v4(),
            respuesta: Respuesta::Si,
            observacion: "Corregido".into(),
            ..first.clone()
        };
        let stored = repo.upsert_answer(&again).await.unwrap();
        assert_eq!(stored.id, first.id);
        assert_eq!(stored.respuesta, Respuesta::Si);

        let answers = repo.list_answers("SE-CD-045-2025").await.unwrap();
        assert_eq!(answers.len(), 1);
        assert!(repo.list_answers("OTRO").await.unwrap().is_empty());
    }
}
