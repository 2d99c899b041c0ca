//! Domain Layer
//!
//! Contains all domain entities and core abstractions.
//! Nothing here touches a database or the network.

mod entity;
mod area;
mod action_plan;
mod document;
mod checklist;
pub mod dates;
pub mod money;

pub use entity::{Entity, DomainError, DomainResult};
pub use area::Area;
pub use action_plan::{
    clamp_avance, ActionPlanItem, ActionPlanPatch, Estado, NewActionPlan, NewPlanRecord,
    PlanChanges, PlanRow, Prioridad, REQUIRED_FIELDS,
};
pub use document::{object_key, Document, Folder, NewFolder, UploadFile};
pub use checklist::{
    ChecklistAnswer, ChecklistItem, ComplianceReport, Etapa, Respuesta, StageCompliance,
};
