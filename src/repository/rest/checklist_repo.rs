//! Checklist catalog and answers over the hosted backend

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::client::{eq, RestClient};
use crate::domain::{dates, ChecklistAnswer, ChecklistItem, DomainResult};
use crate::repository::tables::{CHECKLIST_ITEMS, CHECKLIST_RESPUESTAS};
use crate::repository::traits::{ChecklistRepository, Repository};

#[derive(Debug, Deserialize)]
struct ItemRow {
    id: Uuid,
    etapa: String,
    numero: i32,
    descripcion: String,
}

impl TryFrom<ItemRow> for ChecklistItem {
    type Error = crate::domain::DomainError;

    fn try_from(r: ItemRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: r.id,
            etapa: r.etapa.parse()?,
            numero: r.numero,
            descripcion: r.descripcion,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct AnswerRow {
    id: Uuid,
    contrato: String,
    item_id: Uuid,
    respuesta: String,
    #[serde(default)]
    observacion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    updated_at: Option<String>,
}

impl TryFrom<AnswerRow> for ChecklistAnswer {
    type Error = crate::domain::DomainError;

    fn try_from(r: AnswerRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: r.id,
            contrato: r.contrato,
            item_id: r.item_id,
            respuesta: r.respuesta.parse()?,
            observacion: r.observacion.unwrap_or_default(),
        })
    }
}

pub struct RestChecklistRepository {
    client: RestClient,
}

impl RestChecklistRepository {
    pub fn new(client: RestClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Repository<ChecklistItem> for RestChecklistRepository {
    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<ChecklistItem>> {
        let row: Option<ItemRow> = self
            .client
            .select_one(CHECKLIST_ITEMS, &[("id", eq(id))])
            .await?;
        row.map(ChecklistItem::try_from).transpose()
    }
}

#[async_trait]
impl ChecklistRepository for RestChecklistRepository {
    async fn list_items(&self) -> DomainResult<Vec<ChecklistItem>> {
        let rows: Vec<ItemRow> = self
            .client
            .select(CHECKLIST_ITEMS, &[], Some("numero.asc"))
            .await?;
        let mut items = rows
            .into_iter()
            .map(ChecklistItem::try_from)
            .collect::<DomainResult<Vec<_>>>()?;
        // Stage order is not alphabetical, sort here
        items.sort_by_key(|i| (i.etapa, i.numero));
        Ok(items)
    }

    async fn list_answers(&self, contrato: &str) -> DomainResult<Vec<ChecklistAnswer>> {
        let rows: Vec<AnswerRow> = self
            .client
            .select(CHECKLIST_RESPUESTAS, &[("contrato", eq(contrato))], None)
            .await?;
        rows.into_iter().map(ChecklistAnswer::try_from).collect()
    }

    async fn upsert_answer(&self, answer: &ChecklistAnswer) -> DomainResult<ChecklistAnswer> {
        let row = AnswerRow {
            id: answer.id,
            contrato: answer.contrato.clone(),
            item_id: answer.item_id,
            respuesta: answer.respuesta.as_str().to_string(),
            observacion: Some(answer.observacion.clone()),
            updated_at: Some(dates::now_iso()),
        };
        let stored: AnswerRow = self
            .client
            .upsert(CHECKLIST_RESPUESTAS, "contrato,item_id", &row)
            .await?;
        stored.try_into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Etapa;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_items_sorted_by_stage_then_number() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/lista_chequeo_items"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": Uuid::from_u128(1), "etapa": "postcontractual", "numero": 1, "descripcion": "Acta de liquidación" },
                { "id": Uuid::from_u128(2), "etapa": "precontractual", "numero": 2, "descripcion": "Estudios previos" },
                { "id": Uuid::from_u128(3), "etapa": "precontractual", "numero": 1, "descripcion": "CDP" },
                { "id": Uuid::from_u128(4), "etapa": "contractual", "numero": 1, "descripcion": "RP" }
            ])))
            .mount(&server)
            .await;

        let repo = RestChecklistRepository::new(RestClient::new(&server.uri(), "k"));
        let items = repo.list_items().await.unwrap();
        let order: Vec<(Etapa, i32)> = items.iter().map(|i| (i.etapa, i.numero)).collect();
        assert_eq!(
            order,
            vec![
                (Etapa::Precontractual, 1),
                (Etapa::Precontractual, 2),
                (Etapa::Contractual, 1),
                (Etapa::Postcontractual, 1),
            ]
        );
    }

    #[tokio::test]
    async fn test_unknown_answer_value_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/lista_chequeo_respuestas"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "id": Uuid::new_v4(),
                "contrato": "SE-001",
                "item_id": Uuid::new_v4(),
                "respuesta": "quizas"
            }])))
            .mount(&server)
            .await;

        let repo = RestChecklistRepository::new(RestClient::new(&server.uri(), "k"));
        let err = repo.list_answers("SE-001").await.unwrap_err();
        assert!(err.is_validation());
    }
}
