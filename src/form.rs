//! Plan Form
//!
//! Working copy of one plan as the user types it. Nothing is validated while
//! editing; [`PlanForm::validate`] runs at submit and fills the per-field
//! error map.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::dates::parse_date;
use crate::domain::{
    ActionPlanItem, ActionPlanPatch, DomainError, DomainResult, Estado, NewActionPlan, Prioridad,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlanField {
    Programa,
    Objetivo,
    Meta,
    Presupuesto,
    Acciones,
    Indicadores,
    PorcentajeAvance,
    FechaInicio,
    FechaFin,
    Responsable,
    Estado,
    Prioridad,
    Comentarios,
    MetaDecenal,
    MacroobjetivoDecenal,
    ObjetivoDecenal,
    ProgramaPdm,
    SubprogramaPdm,
    ProyectoPdm,
    GrupoEtareo,
    GrupoPoblacion,
    Zona,
    GrupoEtnico,
    Cantidad,
}

impl PlanField {
    pub const REQUIRED: [PlanField; 7] = [
        PlanField::Programa,
        PlanField::Objetivo,
        PlanField::Meta,
        PlanField::Presupuesto,
        PlanField::Acciones,
        PlanField::Indicadores,
        PlanField::Responsable,
    ];

    /// Field name as the UI and error messages spell it
    pub fn name(&self) -> &'static str {
        match self {
            PlanField::Programa => "programa",
            PlanField::Objetivo => "objetivo",
            PlanField::Meta => "meta",
            PlanField::Presupuesto => "presupuesto",
            PlanField::Acciones => "acciones",
            PlanField::Indicadores => "indicadores",
            PlanField::PorcentajeAvance => "porcentajeAvance",
            PlanField::FechaInicio => "fechaInicio",
            PlanField::FechaFin => "fechaFin",
            PlanField::Responsable => "responsable",
            PlanField::Estado => "estado",
            PlanField::Prioridad => "prioridad",
            PlanField::Comentarios => "comentarios",
            PlanField::MetaDecenal => "metaDecenal",
            PlanField::MacroobjetivoDecenal => "macroobjetivoDecenal",
            PlanField::ObjetivoDecenal => "objetivoDecenal",
            PlanField::ProgramaPdm => "programaPdm",
            PlanField::SubprogramaPdm => "subprogramaPdm",
            PlanField::ProyectoPdm => "proyectoPdm",
            PlanField::GrupoEtareo => "grupoEtareo",
            PlanField::GrupoPoblacion => "grupoPoblacion",
            PlanField::Zona => "zona",
            PlanField::GrupoEtnico => "grupoEtnico",
            PlanField::Cantidad => "cantidad",
        }
    }
}

/// Every input of the plan form, as typed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlanDraft {
    pub programa: String,
    pub objetivo: String,
    pub meta: String,
    pub presupuesto: String,
    pub acciones: String,
    pub indicadores: String,
    pub porcentaje_avance: String,
    pub fecha_inicio: String,
    pub fecha_fin: String,
    pub responsable: String,
    pub estado: String,
    pub prioridad: String,
    pub comentarios: String,
    pub meta_decenal: String,
    pub macroobjetivo_decenal: String,
    pub objetivo_decenal: String,
    pub programa_pdm: String,
    pub subprograma_pdm: String,
    pub proyecto_pdm: String,
    pub grupo_etareo: String,
    pub grupo_poblacion: String,
    pub zona: String,
    pub grupo_etnico: String,
    pub cantidad: String,
}

impl PlanDraft {
    pub fn get(&self, field: PlanField) -> &str {
        match field {
            PlanField::Programa => &self.programa,
            PlanField::Objetivo => &self.objetivo,
            PlanField::Meta => &self.meta,
            PlanField::Presupuesto => &self.presupuesto,
            PlanField::Acciones => &self.acciones,
            PlanField::Indicadores => &self.indicadores,
            PlanField::PorcentajeAvance => &self.porcentaje_avance,
            PlanField::FechaInicio => &self.fecha_inicio,
            PlanField::FechaFin => &self.fecha_fin,
            PlanField::Responsable => &self.responsable,
            PlanField::Estado => &self.estado,
            PlanField::Prioridad => &self.prioridad,
            PlanField::Comentarios => &self.comentarios,
            PlanField::MetaDecenal => &self.meta_decenal,
            PlanField::MacroobjetivoDecenal => &self.macroobjetivo_decenal,
            PlanField::ObjetivoDecenal => &self.objetivo_decenal,
            PlanField::ProgramaPdm => &self.programa_pdm,
            PlanField::SubprogramaPdm => &self.subprograma_pdm,
            PlanField::ProyectoPdm => &self.proyecto_pdm,
            PlanField::GrupoEtareo => &self.grupo_etareo,
            PlanField::GrupoPoblacion => &self.grupo_poblacion,
            PlanField::Zona => &self.zona,
            PlanField::GrupoEtnico => &self.grupo_etnico,
            PlanField::Cantidad => &self.cantidad,
        }
    }

    fn slot(&mut self, field: PlanField) -> &mut String {
        match field {
            PlanField::Programa => &mut self.programa,
            PlanField::Objetivo => &mut self.objetivo,
            PlanField::Meta => &mut self.meta,
            PlanField::Presupuesto => &mut self.presupuesto,
            PlanField::Acciones => &mut self.acciones,
            PlanField::Indicadores => &mut self.indicadores,
            PlanField::PorcentajeAvance => &mut self.porcentaje_avance,
            PlanField::FechaInicio => &mut self.fecha_inicio,
            PlanField::FechaFin => &mut self.fecha_fin,
            PlanField::Responsable => &mut self.responsable,
            PlanField::Estado => &mut self.estado,
            PlanField::Prioridad => &mut self.prioridad,
            PlanField::Comentarios => &mut self.comentarios,
            PlanField::MetaDecenal => &mut self.meta_decenal,
            PlanField::MacroobjetivoDecenal => &mut self.macroobjetivo_decenal,
            PlanField::ObjetivoDecenal => &mut self.objetivo_decenal,
            PlanField::ProgramaPdm => &mut self.programa_pdm,
            PlanField::SubprogramaPdm => &mut self.subprograma_pdm,
            PlanField::ProyectoPdm => &mut self.proyecto_pdm,
            PlanField::GrupoEtareo => &mut self.grupo_etareo,
            PlanField::GrupoPoblacion => &mut self.grupo_poblacion,
            PlanField::Zona => &mut self.zona,
            PlanField::GrupoEtnico => &mut self.grupo_etnico,
            PlanField::Cantidad => &mut self.cantidad,
        }
    }
}

impl From<&ActionPlanItem> for PlanDraft {
    fn from(item: &ActionPlanItem) -> Self {
        let text = |v: &Option<String>| v.clone().unwrap_or_default();
        Self {
            programa: item.programa.clone(),
            objetivo: item.objetivo.clone(),
            meta: item.meta.clone(),
            presupuesto: item.presupuesto.clone(),
            acciones: item.acciones.clone(),
            indicadores: item.indicadores.clone(),
            porcentaje_avance: item.porcentaje_avance.to_string(),
            fecha_inicio: item.fecha_inicio.clone(),
            fecha_fin: item.fecha_fin.clone(),
            responsable: item.responsable.clone(),
            estado: item.estado.as_str().to_string(),
            prioridad: item.prioridad.map(|p| p.as_str().to_string()).unwrap_or_default(),
            comentarios: item.comentarios.clone(),
            meta_decenal: text(&item.meta_decenal),
            macroobjetivo_decenal: text(&item.macroobjetivo_decenal),
            objetivo_decenal: text(&item.objetivo_decenal),
            programa_pdm: text(&item.programa_pdm),
            subprograma_pdm: text(&item.subprograma_pdm),
            proyecto_pdm: text(&item.proyecto_pdm),
            grupo_etareo: text(&item.grupo_etareo),
            grupo_poblacion: text(&item.grupo_poblacion),
            zona: text(&item.zona),
            grupo_etnico: text(&item.grupo_etnico),
            cantidad: text(&item.cantidad),
        }
    }
}

/// Plan form state: the draft plus the errors found at the last submit
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanForm {
    pub draft: PlanDraft,
    pub errors: BTreeMap<PlanField, String>,
}

impl PlanForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Form seeded from an existing plan
    pub fn edit(item: &ActionPlanItem) -> Self {
        Self {
            draft: PlanDraft::from(item),
            errors: BTreeMap::new(),
        }
    }

    /// Store a typed value; drops that field's stale error, validates nothing
    pub fn set(&mut self, field: PlanField, value: impl Into<String>) {
        *self.draft.slot(field) = value.into();
        self.errors.remove(&field);
    }

    pub fn error(&self, field: PlanField) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Check the whole draft and replace the error map
    pub fn validate(&mut self) -> bool {
        let mut errors = BTreeMap::new();

        for field in PlanField::REQUIRED {
            if self.draft.get(field).trim().is_empty() {
                errors.insert(field, DomainError::required(field.name()).to_string());
            }
        }

        if parse_avance(&self.draft.porcentaje_avance).is_none() {
            errors.insert(
                PlanField::PorcentajeAvance,
                "porcentajeAvance must be a whole number between 0 and 100".to_string(),
            );
        }

        let inicio = parse_date(&self.draft.fecha_inicio);
        let fin = parse_date(&self.draft.fecha_fin);
        if let (Some(inicio), Some(fin)) = (inicio, fin) {
            if fin <= inicio {
                errors.insert(
                    PlanField::FechaFin,
                    "fechaFin must be after fechaInicio".to_string(),
                );
            }
        }

        let prioridad = self.draft.prioridad.trim();
        if !prioridad.is_empty() && prioridad.parse::<Prioridad>().is_err() {
            errors.insert(
                PlanField::Prioridad,
                format!("unknown prioridad: {}", prioridad),
            );
        }

        self.errors = errors;
        self.errors.is_empty()
    }

    fn first_error(&self) -> DomainError {
        let message = self
            .errors
            .values()
            .next()
            .cloned()
            .unwrap_or_else(|| "invalid form".to_string());
        DomainError::Validation(message)
    }

    /// Validate and build the complete plan; optional fields come back as `""`
    pub fn submit(&mut self) -> DomainResult<NewActionPlan> {
        if !self.validate() {
            return Err(self.first_error());
        }

        let d = &self.draft;
        let text = |v: &String| Some(v.trim().to_string());
        Ok(NewActionPlan {
            user_id: None,
            programa: d.programa.trim().to_string(),
            objetivo: d.objetivo.trim().to_string(),
            meta: d.meta.trim().to_string(),
            presupuesto: d.presupuesto.trim().to_string(),
            acciones: d.acciones.trim().to_string(),
            indicadores: d.indicadores.trim().to_string(),
            porcentaje_avance: parse_avance(&d.porcentaje_avance).unwrap_or(0),
            fecha_inicio: d.fecha_inicio.trim().to_string(),
            fecha_fin: d.fecha_fin.trim().to_string(),
            responsable: d.responsable.trim().to_string(),
            estado: Estado::canonical(Some(d.estado.as_str())),
            prioridad: d.prioridad.parse().ok(),
            comentarios: d.comentarios.trim().to_string(),
            meta_decenal: text(&d.meta_decenal),
            macroobjetivo_decenal: text(&d.macroobjetivo_decenal),
            objetivo_decenal: text(&d.objetivo_decenal),
            programa_pdm: text(&d.programa_pdm),
            subprograma_pdm: text(&d.subprograma_pdm),
            proyecto_pdm: text(&d.proyecto_pdm),
            grupo_etareo: text(&d.grupo_etareo),
            grupo_poblacion: text(&d.grupo_poblacion),
            zona: text(&d.zona),
            grupo_etnico: text(&d.grupo_etnico),
            cantidad: text(&d.cantidad),
        })
    }

    /// Same as [`PlanForm::submit`], shaped as an update carrying every field
    pub fn submit_update(&mut self) -> DomainResult<ActionPlanPatch> {
        let plan = self.submit()?;
        Ok(ActionPlanPatch {
            programa: Some(plan.programa),
            objetivo: Some(plan.objetivo),
            meta: Some(plan.meta),
            presupuesto: Some(plan.presupuesto),
            acciones: Some(plan.acciones),
            indicadores: Some(plan.indicadores),
            porcentaje_avance: Some(plan.porcentaje_avance),
            fecha_inicio: Some(plan.fecha_inicio),
            fecha_fin: Some(plan.fecha_fin),
            responsable: Some(plan.responsable),
            estado: Some(plan.estado),
            prioridad: Some(plan.prioridad),
            comentarios: Some(plan.comentarios),
            meta_decenal: plan.meta_decenal,
            macroobjetivo_decenal: plan.macroobjetivo_decenal,
            objetivo_decenal: plan.objetivo_decenal,
            programa_pdm: plan.programa_pdm,
            subprograma_pdm: plan.subprograma_pdm,
            proyecto_pdm: plan.proyecto_pdm,
            grupo_etareo: plan.grupo_etareo,
            grupo_poblacion: plan.grupo_poblacion,
            zona: plan.zona,
            grupo_etnico: plan.grupo_etnico,
            cantidad: plan.cantidad,
        })
    }
}

/// Empty counts as 0; anything else must be an integer in 0..=100
fn parse_avance(text: &str) -> Option<u8> {
    let text = text.trim().trim_end_matches('%').trim();
    if text.is_empty() {
        return Some(0);
    }
    text.parse::<u8>().ok().filter(|v| *v <= 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> PlanForm {
        let mut form = PlanForm::new();
        form.set(PlanField::Programa, "Bilingüismo");
        form.set(PlanField::Objetivo, "Fortalecer inglés");
        form.set(PlanField::Meta, "20 colegios");
        form.set(PlanField::Presupuesto, "$80.000.000");
        form.set(PlanField::Acciones, "Formación docente");
        form.set(PlanField::Indicadores, "Docentes certificados");
        form.set(PlanField::Responsable, "Calidad Educativa");
        form
    }

    #[test]
    fn test_set_does_not_validate() {
        let mut form = PlanForm::new();
        form.set(PlanField::PorcentajeAvance, "250");
        form.set(PlanField::Programa, "");
        assert!(form.errors.is_empty());
    }

    #[test]
    fn test_required_fields_reported_at_submit() {
        let mut form = PlanForm::new();
        form.set(PlanField::Programa, "Solo programa");
        let err = form.submit().unwrap_err();
        assert!(err.is_validation());
        assert_eq!(form.errors.len(), 6);
        assert_eq!(form.error(PlanField::Meta), Some("field meta is required"));
        assert_eq!(form.error(PlanField::Programa), None);

        // Typing clears only that field's error
        form.set(PlanField::Meta, "Meta");
        assert_eq!(form.error(PlanField::Meta), None);
        assert_eq!(form.errors.len(), 5);
    }

    #[test]
    fn test_date_order_is_strict() {
        let mut form = filled();
        form.set(PlanField::FechaInicio, "01/03/2025");
        form.set(PlanField::FechaFin, "01/03/2025");
        assert!(!form.validate());
        assert!(form.error(PlanField::FechaFin).is_some());

        form.set(PlanField::FechaFin, "02/03/2025");
        assert!(form.validate());

        // One side missing: nothing to compare
        form.set(PlanField::FechaInicio, "");
        assert!(form.validate());
    }

    #[test]
    fn test_avance_bounds() {
        let mut form = filled();
        for bad in ["101", "-1", "12.5", "mucho"] {
            form.set(PlanField::PorcentajeAvance, bad);
            assert!(!form.validate(), "{} should be rejected", bad);
        }
        for good in ["0", "100", " 45 ", "60%", ""] {
            form.set(PlanField::PorcentajeAvance, good);
            assert!(form.validate(), "{} should be accepted", good);
        }
    }

    #[test]
    fn test_submit_is_fully_populated() {
        let mut form = filled();
        form.set(PlanField::PorcentajeAvance, "45");
        form.set(PlanField::Estado, "en progreso");
        form.set(PlanField::Prioridad, "Alta");
        let plan = form.submit().unwrap();

        assert_eq!(plan.porcentaje_avance, 45);
        assert_eq!(plan.estado, Estado::EnProgreso);
        assert_eq!(plan.prioridad, Some(Prioridad::Alta));
        assert_eq!(plan.comentarios, "");
        assert_eq!(plan.zona.as_deref(), Some(""));
        assert_eq!(plan.meta_decenal.as_deref(), Some(""));
        assert!(plan.validate().is_ok());
    }

    #[test]
    fn test_edit_round_trip() {
        let mut form = filled();
        form.set(PlanField::FechaInicio, "15/01/2025");
        form.set(PlanField::Zona, "Urbana");
        let plan = form.submit().unwrap();

        let row: crate::domain::PlanRow = serde_json::from_value(serde_json::json!({
            "id": uuid::Uuid::new_v4(),
            "area_id": uuid::Uuid::new_v4(),
        }))
        .unwrap();
        let mut item = ActionPlanItem::from(row);
        item.programa = plan.programa.clone();
        item.fecha_inicio = plan.fecha_inicio.clone();
        item.zona = plan.zona.clone();

        let mut edit = PlanForm::edit(&item);
        assert_eq!(edit.draft.programa, "Bilingüismo");
        assert_eq!(edit.draft.fecha_inicio, "15/01/2025");
        assert_eq!(edit.draft.zona, "Urbana");
        assert_eq!(edit.draft.porcentaje_avance, "0");

        // Edited item misses required fields; the update is refused
        assert!(edit.submit_update().is_err());
        edit.set(PlanField::Objetivo, "o");
        edit.set(PlanField::Meta, "m");
        edit.set(PlanField::Presupuesto, "1");
        edit.set(PlanField::Acciones, "a");
        edit.set(PlanField::Indicadores, "i");
        edit.set(PlanField::Responsable, "r");
        let patch = edit.submit_update().unwrap();
        assert_eq!(patch.zona.as_deref(), Some("Urbana"));
        assert_eq!(patch.estado, Some(Estado::Pendiente));
        // Empty priority clears the stored one
        assert_eq!(patch.prioridad, Some(None));
    }
}
