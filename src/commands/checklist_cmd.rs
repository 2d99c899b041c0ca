//! Contract Checklist
//!
//! Answers the catalog questions for one contract and reports compliance.

use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{
    ChecklistAnswer, ChecklistItem, ComplianceReport, DomainError, DomainResult, Respuesta,
};
use crate::repository::{ChecklistRepository, Repository};

#[derive(Clone)]
pub struct ChecklistService {
    repo: Arc<dyn ChecklistRepository>,
}

fn contract_number(contrato: &str) -> DomainResult<&str> {
    match contrato.trim() {
        "" => Err(DomainError::required("contrato")),
        c => Ok(c),
    }
}

impl ChecklistService {
    pub fn new(repo: Arc<dyn ChecklistRepository>) -> Self {
        Self { repo }
    }

    pub async fn catalog(&self) -> DomainResult<Vec<ChecklistItem>> {
        self.repo.list_items().await
    }

    pub async fn answers(&self, contrato: &str) -> DomainResult<Vec<ChecklistAnswer>> {
        self.repo.list_answers(contract_number(contrato)?).await
    }

    /// Record (or replace) the answer to one question
    pub async fn answer(
        &self,
        contrato: &str,
        item_id: Uuid,
        respuesta: Respuesta,
        observacion: &str,
    ) -> DomainResult<ChecklistAnswer> {
        let contrato = contract_number(contrato)?;
        if self.repo.find_by_id(item_id).await?.is_none() {
            return Err(DomainError::NotFound(format!("checklist item {} not found", item_id)));
        }

        let answer = ChecklistAnswer {
            id: Uuid::new_v4(),
            contrato: contrato.to_string(),
            item_id,
            respuesta,
            observacion: observacion.trim().to_string(),
        };
        self.repo.upsert_answer(&answer).await
    }

    pub async fn compliance(&self, contrato: &str) -> DomainResult<ComplianceReport> {
        let contrato = contract_number(contrato)?;
        let catalog = self.repo.list_items().await?;
        let answers = self.repo.list_answers(contrato).await?;
        Ok(ComplianceReport::compute(contrato, &catalog, &answers))
    }
}
