//! Area repository over the hosted backend

use async_trait::async_trait;
use uuid::Uuid;

use super::client::{eq, ilike_contains, RestClient};
use crate::domain::{Area, DomainResult};
use crate::repository::tables::AREAS;
use crate::repository::traits::{AreaRepository, Repository, SearchableRepository};

pub struct RestAreaRepository {
    client: RestClient,
}

impl RestAreaRepository {
    pub fn new(client: RestClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Repository<Area> for RestAreaRepository {
    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<Area>> {
        self.client.select_one(AREAS, &[("id", eq(id))]).await
    }
}

#[async_trait]
impl SearchableRepository<Area> for RestAreaRepository {
    async fn search(&self, query: &str) -> DomainResult<Vec<Area>> {
        self.client
            .select(AREAS, &[("nombre", ilike_contains(query))], Some("nombre.asc"))
            .await
    }
}

#[async_trait]
impl AreaRepository for RestAreaRepository {
    async fn search_by_codigo(&self, query: &str) -> DomainResult<Vec<Area>> {
        self.client
            .select(AREAS, &[("codigo", ilike_contains(query))], Some("nombre.asc"))
            .await
    }

    async fn list(&self) -> DomainResult<Vec<Area>> {
        self.client.select(AREAS, &[], Some("nombre.asc")).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_search_uses_ilike_on_nombre() {
        let server = MockServer::start().await;
        let id = Uuid::new_v4();
        Mock::given(method("GET"))
            .and(path("/rest/v1/areas"))
            .and(query_param("nombre", "ilike.*Calidad Educativa*"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": id, "codigo": "CAL", "nombre": "Calidad Educativa" }
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let repo = RestAreaRepository::new(RestClient::new(&server.uri(), "k"));
        let areas = repo.search("Calidad Educativa").await.unwrap();
        assert_eq!(areas, vec![Area::new(id, "CAL", "Calidad Educativa")]);
    }

    #[tokio::test]
    async fn test_find_by_id_absent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/areas"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let repo = RestAreaRepository::new(RestClient::new(&server.uri(), "k"));
        assert!(repo.find_by_id(Uuid::new_v4()).await.unwrap().is_none());
    }
}
