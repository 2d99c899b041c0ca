//! Action Plan Entity
//!
//! One row per planned activity of an area. Three shapes exist:
//! - [`PlanRow`]: the backend row, snake_case, every column optional
//! - [`ActionPlanItem`]: what the dashboard works with, camelCase, defaults filled in
//! - [`NewPlanRecord`] / [`PlanChanges`]: insert and patch payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::dates::{display_from_iso, ensure_valid_date, parse_date, to_iso};
use super::entity::{DomainError, DomainResult, Entity};

/// Plan status, canonicalized
///
/// Stored data carries duplicate spellings ("En progreso" / "En Progreso",
/// "Pendiente" / "Sin iniciar"); they parse to the same variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Estado {
    #[default]
    Pendiente,
    EnProgreso,
    Completado,
    Retrasado,
}

impl Estado {
    pub const ALL: [Estado; 4] = [
        Estado::Pendiente,
        Estado::EnProgreso,
        Estado::Completado,
        Estado::Retrasado,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Estado::Pendiente => "Pendiente",
            Estado::EnProgreso => "En Progreso",
            Estado::Completado => "Completado",
            Estado::Retrasado => "Retrasado",
        }
    }

    /// Lenient parse used on load: unknown or missing becomes `Pendiente`
    pub fn canonical(s: Option<&str>) -> Self {
        s.and_then(|s| s.parse().ok()).unwrap_or_default()
    }
}

impl FromStr for Estado {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
        match key.as_str() {
            "pendiente" | "sin iniciar" => Ok(Estado::Pendiente),
            "en progreso" | "en_progreso" => Ok(Estado::EnProgreso),
            "completado" => Ok(Estado::Completado),
            "retrasado" => Ok(Estado::Retrasado),
            _ => Err(DomainError::Validation(format!("unknown estado: {}", s))),
        }
    }
}

impl fmt::Display for Estado {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Estado {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Estado {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Estado::canonical(Some(&s)))
    }
}

/// Informal priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Prioridad {
    Alta,
    Media,
    Baja,
}

impl Prioridad {
    pub fn as_str(&self) -> &'static str {
        match self {
            Prioridad::Alta => "Alta",
            Prioridad::Media => "Media",
            Prioridad::Baja => "Baja",
        }
    }
}

impl FromStr for Prioridad {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "alta" => Ok(Prioridad::Alta),
            "media" => Ok(Prioridad::Media),
            "baja" => Ok(Prioridad::Baja),
            _ => Err(DomainError::Validation(format!("unknown prioridad: {}", s))),
        }
    }
}

/// Clamp a stored progress value into 0..=100
pub fn clamp_avance(value: Option<f64>) -> u8 {
    match value {
        Some(v) if v.is_finite() => v.round().clamp(0.0, 100.0) as u8,
        _ => 0,
    }
}

/// Backend row for the plans table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanRow {
    pub id: Uuid,
    pub area_id: Uuid,
    #[serde(default)]
    pub user_id: Option<Uuid>,
    #[serde(default)]
    pub programa: Option<String>,
    #[serde(default)]
    pub objetivo: Option<String>,
    #[serde(default)]
    pub meta: Option<String>,
    #[serde(default)]
    pub presupuesto: Option<String>,
    #[serde(default)]
    pub acciones: Option<String>,
    #[serde(default)]
    pub indicadores: Option<String>,
    #[serde(default)]
    pub porcentaje_avance: Option<f64>,
    #[serde(default)]
    pub fecha_inicio: Option<String>,
    #[serde(default)]
    pub fecha_fin: Option<String>,
    #[serde(default)]
    pub responsable: Option<String>,
    #[serde(default)]
    pub estado: Option<String>,
    #[serde(default)]
    pub prioridad: Option<String>,
    #[serde(default)]
    pub comentarios: Option<String>,
    #[serde(default)]
    pub meta_decenal: Option<String>,
    #[serde(default)]
    pub macroobjetivo_decenal: Option<String>,
    #[serde(default)]
    pub objetivo_decenal: Option<String>,
    #[serde(default)]
    pub programa_pdm: Option<String>,
    #[serde(default)]
    pub subprograma_pdm: Option<String>,
    #[serde(default)]
    pub proyecto_pdm: Option<String>,
    #[serde(default)]
    pub grupo_etareo: Option<String>,
    #[serde(default)]
    pub grupo_poblacion: Option<String>,
    #[serde(default)]
    pub zona: Option<String>,
    #[serde(default)]
    pub grupo_etnico: Option<String>,
    #[serde(default)]
    pub cantidad: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl Entity for PlanRow {
    type Id = Uuid;

    fn id(&self) -> Self::Id {
        self.id
    }
}

/// An action plan as shown and edited in the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionPlanItem {
    pub id: Uuid,
    pub area_id: Uuid,
    pub user_id: Option<Uuid>,
    pub programa: String,
    pub objetivo: String,
    pub meta: String,
    pub presupuesto: String,
    pub acciones: String,
    pub indicadores: String,
    pub porcentaje_avance: u8,
    /// `dd/mm/yyyy`, empty when unset
    pub fecha_inicio: String,
    /// `dd/mm/yyyy`, empty when unset
    pub fecha_fin: String,
    pub responsable: String,
    pub estado: Estado,
    pub prioridad: Option<Prioridad>,
    pub comentarios: String,

    // Plan Decenal
    pub meta_decenal: Option<String>,
    pub macroobjetivo_decenal: Option<String>,
    pub objetivo_decenal: Option<String>,

    // Plan de Desarrollo Municipal
    pub programa_pdm: Option<String>,
    pub subprograma_pdm: Option<String>,
    pub proyecto_pdm: Option<String>,

    // Demographics
    pub grupo_etareo: Option<String>,
    pub grupo_poblacion: Option<String>,
    pub zona: Option<String>,
    pub grupo_etnico: Option<String>,
    pub cantidad: Option<String>,

    pub created_at: Option<DateTime<Utc>>,
}

impl Entity for ActionPlanItem {
    type Id = Uuid;

    fn id(&self) -> Self::Id {
        self.id
    }
}

impl From<PlanRow> for ActionPlanItem {
    fn from(row: PlanRow) -> Self {
        Self {
            id: row.id,
            area_id: row.area_id,
            user_id: row.user_id,
            programa: row.programa.unwrap_or_default(),
            objetivo: row.objetivo.unwrap_or_default(),
            meta: row.meta.unwrap_or_default(),
            presupuesto: row.presupuesto.unwrap_or_default(),
            acciones: row.acciones.unwrap_or_default(),
            indicadores: row.indicadores.unwrap_or_default(),
            porcentaje_avance: clamp_avance(row.porcentaje_avance),
            fecha_inicio: row.fecha_inicio.as_deref().map(display_from_iso).unwrap_or_default(),
            fecha_fin: row.fecha_fin.as_deref().map(display_from_iso).unwrap_or_default(),
            responsable: row.responsable.unwrap_or_default(),
            estado: Estado::canonical(row.estado.as_deref()),
            prioridad: row.prioridad.as_deref().and_then(|p| p.parse().ok()),
            comentarios: row.comentarios.unwrap_or_default(),
            meta_decenal: row.meta_decenal,
            macroobjetivo_decenal: row.macroobjetivo_decenal,
            objetivo_decenal: row.objetivo_decenal,
            programa_pdm: row.programa_pdm,
            subprograma_pdm: row.subprograma_pdm,
            proyecto_pdm: row.proyecto_pdm,
            grupo_etareo: row.grupo_etareo,
            grupo_poblacion: row.grupo_poblacion,
            zona: row.zona,
            grupo_etnico: row.grupo_etnico,
            cantidad: row.cantidad,
            created_at: row.created_at.as_deref().and_then(parse_date),
        }
    }
}

// ========================
// Input Shapes
// ========================

/// Required fields for a new plan, in the order they are checked
pub const REQUIRED_FIELDS: [&str; 7] = [
    "programa",
    "objetivo",
    "meta",
    "presupuesto",
    "acciones",
    "indicadores",
    "responsable",
];

/// Input for creating a plan
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewActionPlan {
    pub user_id: Option<Uuid>,
    pub programa: String,
    pub objetivo: String,
    pub meta: String,
    pub presupuesto: String,
    pub acciones: String,
    pub indicadores: String,
    pub porcentaje_avance: u8,
    pub fecha_inicio: String,
    pub fecha_fin: String,
    pub responsable: String,
    pub estado: Estado,
    pub prioridad: Option<Prioridad>,
    pub comentarios: String,
    pub meta_decenal: Option<String>,
    pub macroobjetivo_decenal: Option<String>,
    pub objetivo_decenal: Option<String>,
    pub programa_pdm: Option<String>,
    pub subprograma_pdm: Option<String>,
    pub proyecto_pdm: Option<String>,
    pub grupo_etareo: Option<String>,
    pub grupo_poblacion: Option<String>,
    pub zona: Option<String>,
    pub grupo_etnico: Option<String>,
    pub cantidad: Option<String>,
}

impl NewActionPlan {
    fn required_values(&self) -> [&str; 7] {
        [
            self.programa.as_str(),
            self.objetivo.as_str(),
            self.meta.as_str(),
            self.presupuesto.as_str(),
            self.acciones.as_str(),
            self.indicadores.as_str(),
            self.responsable.as_str(),
        ]
    }

    /// First required field left blank
    pub fn missing_required(&self) -> Option<&'static str> {
        REQUIRED_FIELDS
            .iter()
            .zip(self.required_values())
            .find(|(_, v)| v.trim().is_empty())
            .map(|(name, _)| *name)
    }

    pub fn validate(&self) -> DomainResult<()> {
        match self.missing_required() {
            Some(field) => Err(DomainError::required(field)),
            None => Ok(()),
        }
    }
}

/// Partial update; `None` leaves the column untouched
///
/// An empty string for an optional field clears it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActionPlanPatch {
    pub programa: Option<String>,
    pub objetivo: Option<String>,
    pub meta: Option<String>,
    pub presupuesto: Option<String>,
    pub acciones: Option<String>,
    pub indicadores: Option<String>,
    pub porcentaje_avance: Option<u8>,
    pub fecha_inicio: Option<String>,
    pub fecha_fin: Option<String>,
    pub responsable: Option<String>,
    pub estado: Option<Estado>,
    /// `Some(None)` clears the priority
    pub prioridad: Option<Option<Prioridad>>,
    pub comentarios: Option<String>,
    pub meta_decenal: Option<String>,
    pub macroobjetivo_decenal: Option<String>,
    pub objetivo_decenal: Option<String>,
    pub programa_pdm: Option<String>,
    pub subprograma_pdm: Option<String>,
    pub proyecto_pdm: Option<String>,
    pub grupo_etareo: Option<String>,
    pub grupo_poblacion: Option<String>,
    pub zona: Option<String>,
    pub grupo_etnico: Option<String>,
    pub cantidad: Option<String>,
}

impl ActionPlanPatch {
    /// Required fields that are present must stay non-empty
    pub fn validate(&self) -> DomainResult<()> {
        let present = [
            &self.programa,
            &self.objetivo,
            &self.meta,
            &self.presupuesto,
            &self.acciones,
            &self.indicadores,
            &self.responsable,
        ];
        for (name, value) in REQUIRED_FIELDS.iter().zip(present) {
            if matches!(value, Some(v) if v.trim().is_empty()) {
                return Err(DomainError::required(name));
            }
        }
        if matches!(self.porcentaje_avance, Some(p) if p > 100) {
            return Err(DomainError::Validation(
                "porcentajeAvance must be between 0 and 100".into(),
            ));
        }
        Ok(())
    }
}

// ========================
// Backend Payloads
// ========================

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn text_or_null(value: &str) -> Option<String> {
    non_empty(&Some(value.to_string()))
}

/// Empty input means "no date"; anything else is normalized
fn normalize_date(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(to_iso(&ensure_valid_date(value)))
    }
}

/// Insert payload. Every optional column is sent, as `null` when absent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewPlanRecord {
    pub area_id: Uuid,
    pub user_id: Option<Uuid>,
    pub programa: String,
    pub objetivo: String,
    pub meta: String,
    pub presupuesto: String,
    pub acciones: String,
    pub indicadores: String,
    pub porcentaje_avance: u8,
    pub fecha_inicio: Option<String>,
    pub fecha_fin: Option<String>,
    pub responsable: String,
    pub estado: String,
    pub prioridad: Option<String>,
    pub comentarios: Option<String>,
    pub meta_decenal: Option<String>,
    pub macroobjetivo_decenal: Option<String>,
    pub objetivo_decenal: Option<String>,
    pub programa_pdm: Option<String>,
    pub subprograma_pdm: Option<String>,
    pub proyecto_pdm: Option<String>,
    pub grupo_etareo: Option<String>,
    pub grupo_poblacion: Option<String>,
    pub zona: Option<String>,
    pub grupo_etnico: Option<String>,
    pub cantidad: Option<String>,
}

impl NewPlanRecord {
    pub fn from_new(area_id: Uuid, plan: &NewActionPlan) -> Self {
        Self {
            area_id,
            user_id: plan.user_id,
            programa: plan.programa.trim().to_string(),
            objetivo: plan.objetivo.trim().to_string(),
            meta: plan.meta.trim().to_string(),
            presupuesto: plan.presupuesto.trim().to_string(),
            acciones: plan.acciones.trim().to_string(),
            indicadores: plan.indicadores.trim().to_string(),
            porcentaje_avance: plan.porcentaje_avance.min(100),
            fecha_inicio: normalize_date(&plan.fecha_inicio),
            fecha_fin: normalize_date(&plan.fecha_fin),
            responsable: plan.responsable.trim().to_string(),
            estado: plan.estado.as_str().to_string(),
            prioridad: plan.prioridad.map(|p| p.as_str().to_string()),
            comentarios: text_or_null(&plan.comentarios),
            meta_decenal: non_empty(&plan.meta_decenal),
            macroobjetivo_decenal: non_empty(&plan.macroobjetivo_decenal),
            objetivo_decenal: non_empty(&plan.objetivo_decenal),
            programa_pdm: non_empty(&plan.programa_pdm),
            subprograma_pdm: non_empty(&plan.subprograma_pdm),
            proyecto_pdm: non_empty(&plan.proyecto_pdm),
            grupo_etareo: non_empty(&plan.grupo_etareo),
            grupo_poblacion: non_empty(&plan.grupo_poblacion),
            zona: non_empty(&plan.zona),
            grupo_etnico: non_empty(&plan.grupo_etnico),
            cantidad: non_empty(&plan.cantidad),
        }
    }
}

/// Patch payload. Absent fields are not serialized at all; nullable fields
/// present in the patch serialize as a value or `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlanChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub programa: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub objetivo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presupuesto: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acciones: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indicadores: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub porcentaje_avance: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fecha_inicio: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fecha_fin: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub responsable: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estado: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prioridad: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comentarios: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_decenal: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub macroobjetivo_decenal: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub objetivo_decenal: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub programa_pdm: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subprograma_pdm: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proyecto_pdm: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grupo_etareo: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grupo_poblacion: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zona: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grupo_etnico: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cantidad: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl PlanChanges {
    pub fn from_patch(patch: &ActionPlanPatch) -> Self {
        let trimmed = |v: &Option<String>| v.as_ref().map(|s| s.trim().to_string());
        let nullable = |v: &Option<String>| v.as_ref().map(|_| non_empty(v));

        Self {
            programa: trimmed(&patch.programa),
            objetivo: trimmed(&patch.objetivo),
            meta: trimmed(&patch.meta),
            presupuesto: trimmed(&patch.presupuesto),
            acciones: trimmed(&patch.acciones),
            indicadores: trimmed(&patch.indicadores),
            porcentaje_avance: patch.porcentaje_avance.map(|p| p.min(100)),
            fecha_inicio: patch.fecha_inicio.as_deref().map(normalize_date),
            fecha_fin: patch.fecha_fin.as_deref().map(normalize_date),
            responsable: trimmed(&patch.responsable),
            estado: patch.estado.map(|e| e.as_str().to_string()),
            prioridad: patch
                .prioridad
                .map(|p| p.map(|p| p.as_str().to_string())),
            comentarios: nullable(&patch.comentarios),
            meta_decenal: nullable(&patch.meta_decenal),
            macroobjetivo_decenal: nullable(&patch.macroobjetivo_decenal),
            objetivo_decenal: nullable(&patch.objetivo_decenal),
            programa_pdm: nullable(&patch.programa_pdm),
            subprograma_pdm: nullable(&patch.subprograma_pdm),
            proyecto_pdm: nullable(&patch.proyecto_pdm),
            grupo_etareo: nullable(&patch.grupo_etareo),
            grupo_poblacion: nullable(&patch.grupo_poblacion),
            zona: nullable(&patch.zona),
            grupo_etnico: nullable(&patch.grupo_etnico),
            cantidad: nullable(&patch.cantidad),
            updated_at: Some(super::dates::now_iso()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row() -> PlanRow {
        serde_json::from_value(json!({
            "id": "6f1c2a7e-8d7b-4c1e-9a53-2f5d8e0b1c11",
            "area_id": "0b3a5c4e-1111-4a2b-8c9d-000000000001",
        }))
        .unwrap()
    }

    #[test]
    fn test_estado_collapses_variants() {
        assert_eq!("En progreso".parse::<Estado>().unwrap(), Estado::EnProgreso);
        assert_eq!("En Progreso".parse::<Estado>().unwrap(), Estado::EnProgreso);
        assert_eq!("Sin iniciar".parse::<Estado>().unwrap(), Estado::Pendiente);
        assert_eq!(" completado ".parse::<Estado>().unwrap(), Estado::Completado);
        assert!("Cancelado".parse::<Estado>().is_err());
        assert_eq!(Estado::canonical(Some("Cancelado")), Estado::Pendiente);
        assert_eq!(Estado::canonical(None), Estado::Pendiente);
    }

    #[test]
    fn test_row_defaults() {
        let item = ActionPlanItem::from(row());
        assert_eq!(item.programa, "");
        assert_eq!(item.porcentaje_avance, 0);
        assert_eq!(item.estado, Estado::Pendiente);
        assert_eq!(item.fecha_inicio, "");
        assert!(item.meta_decenal.is_none());
        assert!(item.created_at.is_none());
    }

    #[test]
    fn test_row_transform() {
        let mut r = row();
        r.porcentaje_avance = Some(140.0);
        r.estado = Some("En progreso".into());
        r.prioridad = Some("alta".into());
        r.fecha_inicio = Some("2025-02-01T00:00:00.000Z".into());
        r.programa_pdm = Some("Educación de calidad".into());

        let item = ActionPlanItem::from(r);
        assert_eq!(item.porcentaje_avance, 100);
        assert_eq!(item.estado, Estado::EnProgreso);
        assert_eq!(item.prioridad, Some(Prioridad::Alta));
        assert_eq!(item.fecha_inicio, "01/02/2025");
        assert_eq!(item.programa_pdm.as_deref(), Some("Educación de calidad"));
    }

    #[test]
    fn test_item_serializes_camel_case() {
        let value = serde_json::to_value(ActionPlanItem::from(row())).unwrap();
        assert!(value.get("porcentajeAvance").is_some());
        assert!(value.get("areaId").is_some());
        assert_eq!(value["estado"], "Pendiente");
    }

    #[test]
    fn test_missing_required_reports_first_blank() {
        let plan = NewActionPlan {
            programa: "Jornada única".into(),
            objetivo: "  ".into(),
            ..Default::default()
        };
        assert_eq!(plan.missing_required(), Some("objetivo"));
        assert_eq!(
            plan.validate().unwrap_err().to_string(),
            "field objetivo is required"
        );
    }

    #[test]
    fn test_new_record_nulls_absent_optionals() {
        let plan = NewActionPlan {
            programa: "P".into(),
            fecha_inicio: "31/12/2025".into(),
            zona: Some("".into()),
            grupo_etnico: Some("Afro".into()),
            ..Default::default()
        };
        let record = NewPlanRecord::from_new(Uuid::nil(), &plan);
        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(value["fecha_inicio"], "2025-12-31T00:00:00.000Z");
        assert!(value["fecha_fin"].is_null());
        assert!(value["zona"].is_null());
        assert!(value["meta_decenal"].is_null());
        assert_eq!(value["grupo_etnico"], "Afro");
        assert_eq!(value["estado"], "Pendiente");
    }

    #[test]
    fn test_changes_only_carry_present_fields() {
        let patch = ActionPlanPatch {
            estado: Some(Estado::Completado),
            zona: Some(String::new()),
            ..Default::default()
        };
        let value = serde_json::to_value(PlanChanges::from_patch(&patch)).unwrap();
        let map = value.as_object().unwrap();

        assert_eq!(map["estado"], "Completado");
        assert!(map["zona"].is_null());
        assert!(map.contains_key("updated_at"));
        assert!(!map.contains_key("programa"));
        assert!(!map.contains_key("grupo_etnico"));
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn test_changes_clear_prioridad() {
        let cleared = ActionPlanPatch {
            prioridad: Some(None),
            ..Default::default()
        };
        let value = serde_json::to_value(PlanChanges::from_patch(&cleared)).unwrap();
        assert!(value.as_object().unwrap().contains_key("prioridad"));
        assert!(value["prioridad"].is_null());

        let set = ActionPlanPatch {
            prioridad: Some(Some(Prioridad::Baja)),
            ..Default::default()
        };
        let value = serde_json::to_value(PlanChanges::from_patch(&set)).unwrap();
        assert_eq!(value["prioridad"], "Baja");

        let untouched = serde_json::to_value(PlanChanges::from_patch(&ActionPlanPatch::default()))
            .unwrap();
        assert!(!untouched.as_object().unwrap().contains_key("prioridad"));
    }

    #[test]
    fn test_patch_rejects_blank_required() {
        let patch = ActionPlanPatch {
            responsable: Some("".into()),
            ..Default::default()
        };
        assert_eq!(
            patch.validate().unwrap_err(),
            DomainError::required("responsable")
        );
    }
}
