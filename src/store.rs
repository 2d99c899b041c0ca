//! Plan State Store
//!
//! The cached plan list of one area as a plain value changed only through
//! [`PlanState::apply`]. [`crate::plan_sync::PlanSync`] owns the live copy and
//! broadcasts every new state to its subscribers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::money::parse_presupuesto;
use crate::domain::{ActionPlanItem, Estado, Prioridad};

/// Snapshot of the plans of one area
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanState {
    /// Newest created first
    pub items: Vec<ActionPlanItem>,
    pub loading: bool,
    /// Last failure, as shown to the user
    pub error: Option<String>,
    pub last_loaded_at: Option<DateTime<Utc>>,
}

/// State transitions
#[derive(Debug, Clone, PartialEq)]
pub enum PlanAction {
    LoadStarted,
    /// Replace the cache wholesale
    Loaded {
        items: Vec<ActionPlanItem>,
        at: DateTime<Utc>,
    },
    /// Keep the last good cache
    LoadFailed(String),
    MutationStarted,
    MutationFailed(String),
    /// Input refused before any request; `loading` is left alone
    Rejected(String),
    ClearError,
}

impl PlanState {
    /// Apply one action; pure
    pub fn apply(&mut self, action: PlanAction) {
        match action {
            PlanAction::LoadStarted | PlanAction::MutationStarted => {
                self.loading = true;
            }
            PlanAction::Loaded { items, at } => {
                self.items = items;
                self.loading = false;
                self.error = None;
                self.last_loaded_at = Some(at);
            }
            PlanAction::LoadFailed(msg) | PlanAction::MutationFailed(msg) => {
                self.loading = false;
                self.error = Some(msg);
            }
            PlanAction::Rejected(msg) => {
                self.error = Some(msg);
            }
            PlanAction::ClearError => {
                self.error = None;
            }
        }
    }

    /// Consuming variant of [`PlanState::apply`]
    pub fn reduce(mut self, action: PlanAction) -> Self {
        self.apply(action);
        self
    }

    pub fn find(&self, id: uuid::Uuid) -> Option<&ActionPlanItem> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn filtered(&self, filter: &PlanFilter) -> Vec<&ActionPlanItem> {
        self.items.iter().filter(|i| filter.matches(i)).collect()
    }

    pub fn summary(&self) -> PlanSummary {
        PlanSummary::of(self.items.iter())
    }
}

// ========================
// Selectors
// ========================

/// Table filter of the plans screen. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlanFilter {
    pub search: String,
    pub estado: Option<Estado>,
    pub responsable: Option<String>,
    pub prioridad: Option<Prioridad>,
}

impl PlanFilter {
    pub fn matches(&self, item: &ActionPlanItem) -> bool {
        if self.estado.is_some_and(|e| e != item.estado) {
            return false;
        }
        if self.prioridad.is_some() && self.prioridad != item.prioridad {
            return false;
        }
        if let Some(responsable) = self.responsable.as_deref().map(str::trim) {
            if !responsable.is_empty() && !item.responsable.eq_ignore_ascii_case(responsable) {
                return false;
            }
        }

        let needle = self.search.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        [
            &item.programa,
            &item.objetivo,
            &item.meta,
            &item.acciones,
            &item.responsable,
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
    }
}

/// Figures shown above the plans table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanSummary {
    pub total: usize,
    /// Sum of the digits-only budgets
    pub budget_total: i64,
    /// Mean progress, 0 when there are no plans
    pub average_avance: f64,
    pub by_estado: BTreeMap<Estado, usize>,
}

impl PlanSummary {
    pub fn of<'a>(items: impl IntoIterator<Item = &'a ActionPlanItem>) -> Self {
        let mut summary = PlanSummary::default();
        let mut avance_sum = 0u64;
        for item in items {
            summary.total += 1;
            summary.budget_total = summary
                .budget_total
                .saturating_add(parse_presupuesto(&item.presupuesto));
            avance_sum += u64::from(item.porcentaje_avance);
            *summary.by_estado.entry(item.estado).or_default() += 1;
        }
        if summary.total > 0 {
            summary.average_avance = avance_sum as f64 / summary.total as f64;
        }
        summary
    }

    pub fn count(&self, estado: Estado) -> usize {
        self.by_estado.get(&estado).copied().unwrap_or(0)
    }
}
