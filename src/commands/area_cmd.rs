//! Area Resolution
//!
//! Turns a route slug ("calidad-educativa") or an area id into the stored
//! area. Every other service is keyed by the resolved id.

use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{Area, DomainError, DomainResult};
use crate::repository::{AreaRepository, Repository, SearchableRepository};

/// Known route slugs and the area name they display as
const SLUG_NAMES: &[(&str, &str)] = &[
    ("calidad-educativa", "Calidad Educativa"),
    ("cobertura", "Cobertura"),
    ("cobertura-educativa", "Cobertura Educativa"),
    ("planeacion", "Planeación"),
    ("talento-humano", "Talento Humano"),
    ("inspeccion-vigilancia", "Inspección y Vigilancia"),
    ("infraestructura", "Infraestructura"),
    ("juridica", "Jurídica"),
    ("financiera", "Financiera"),
    ("despacho", "Despacho"),
    ("atencion-ciudadano", "Atención al Ciudadano"),
];

/// Display name for a slug; unknown slugs become their words
pub fn slug_to_name(slug: &str) -> String {
    let slug = slug.trim().to_lowercase();
    SLUG_NAMES
        .iter()
        .find(|(s, _)| *s == slug)
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| slug.replace('-', " "))
}

#[derive(Clone)]
pub struct AreaResolver {
    repo: Arc<dyn AreaRepository>,
}

impl AreaResolver {
    pub fn new(repo: Arc<dyn AreaRepository>) -> Self {
        Self { repo }
    }

    /// Resolve a slug or id to its area
    pub async fn resolve(&self, input: &str) -> DomainResult<Area> {
        let input = input.trim();
        if input.is_empty() {
            return Err(DomainError::required("area"));
        }

        if let Ok(id) = Uuid::parse_str(input) {
            return self
                .repo
                .find_by_id(id)
                .await?
                .ok_or_else(|| DomainError::NotFound(format!("area {} not found", id)));
        }

        let name = slug_to_name(input);
        if let Some(area) = self.repo.search(&name).await?.into_iter().next() {
            log::debug!("area '{}' resolved by name to {}", input, area.id);
            return Ok(area);
        }

        if let Some(area) = self.repo.search_by_codigo(input).await?.into_iter().next() {
            log::debug!("area '{}' resolved by code to {}", input, area.id);
            return Ok(area);
        }

        log::warn!("no area matches '{}'", input);
        Err(DomainError::NotFound(format!(
            "area not found for '{}' (searched name '{}' and code)",
            input, name
        )))
    }

    pub async fn list(&self) -> DomainResult<Vec<Area>> {
        self.repo.list().await
    }
}
