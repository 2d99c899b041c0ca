//! Plan repository over the hosted backend

use async_trait::async_trait;
use uuid::Uuid;

use super::client::{eq, RestClient};
use crate::domain::{DomainError, DomainResult, NewPlanRecord, PlanChanges, PlanRow};
use crate::repository::tables::PLANES;
use crate::repository::traits::{PlanRepository, Repository};

pub struct RestPlanRepository {
    client: RestClient,
}

impl RestPlanRepository {
    pub fn new(client: RestClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Repository<PlanRow> for RestPlanRepository {
    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<PlanRow>> {
        self.client.select_one(PLANES, &[("id", eq(id))]).await
    }
}

#[async_trait]
impl PlanRepository for RestPlanRepository {
    async fn list_by_area(&self, area_id: Uuid) -> DomainResult<Vec<PlanRow>> {
        self.client
            .select(PLANES, &[("area_id", eq(area_id))], Some("created_at.desc"))
            .await
    }

    async fn insert(&self, record: &NewPlanRecord) -> DomainResult<PlanRow> {
        self.client.insert(PLANES, record).await
    }

    async fn update(&self, id: Uuid, changes: &PlanChanges) -> DomainResult<()> {
        let touched = self.client.update(PLANES, &[("id", eq(id))], changes).await?;
        if touched == 0 {
            return Err(DomainError::NotFound(format!("plan {} not found", id)));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> DomainResult<()> {
        self.client.delete(PLANES, &[("id", eq(id))]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn row(id: Uuid, area: Uuid) -> serde_json::Value {
        json!({
            "id": id,
            "area_id": area,
            "programa": "Jornada Única",
            "porcentaje_avance": 40,
            "estado": "En progreso",
            "created_at": "2025-03-01T10:00:00.000Z"
        })
    }

    #[tokio::test]
    async fn test_list_by_area_orders_newest_first() {
        let server = MockServer::start().await;
        let area = Uuid::new_v4();
        let id = Uuid::new_v4();
        Mock::given(method("GET"))
            .and(path("/rest/v1/plan_accion"))
            .and(query_param("area_id", format!("eq.{}", area)))
            .and(query_param("order", "created_at.desc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([row(id, area)])))
            .expect(1)
            .mount(&server)
            .await;

        let repo = RestPlanRepository::new(RestClient::new(&server.uri(), "k"));
        let rows = repo.list_by_area(area).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, id);
        assert_eq!(rows[0].porcentaje_avance, Some(40.0));
        assert_eq!(rows[0].objetivo, None);
    }

    #[tokio::test]
    async fn test_update_sends_only_present_columns() {
        let server = MockServer::start().await;
        let id = Uuid::new_v4();
        let changes = PlanChanges {
            meta: Some("Meta nueva".into()),
            updated_at: Some("2025-03-02T00:00:00.000Z".into()),
            ..Default::default()
        };
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/plan_accion"))
            .and(query_param("id", format!("eq.{}", id)))
            .and(body_json(json!({
                "meta": "Meta nueva",
                "updated_at": "2025-03-02T00:00:00.000Z"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": id }])))
            .expect(1)
            .mount(&server)
            .await;

        let repo = RestPlanRepository::new(RestClient::new(&server.uri(), "k"));
        repo.update(id, &changes).await.unwrap();
    }

    #[tokio::test]
    async fn test_update_of_missing_row_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/plan_accion"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let repo = RestPlanRepository::new(RestClient::new(&server.uri(), "k"));
        let err = repo.update(Uuid::new_v4(), &PlanChanges::default()).await.unwrap_err();
        assert!(err.is_not_found());
        assert!(repo.changes().is_none());
    }
}
