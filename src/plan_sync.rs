//! Plan Sync
//!
//! Keeps the plan list of one area in step with the backend. Every mutation
//! is followed by a full reload; nothing is applied optimistically. State
//! changes go through [`PlanState::apply`] and are published on a watch
//! channel.

use chrono::Utc;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::domain::{
    ActionPlanItem, ActionPlanPatch, DomainError, DomainResult, NewActionPlan, NewPlanRecord,
    PlanChanges,
};
use crate::repository::tables::PLANES;
use crate::repository::PlanRepository;
use crate::store::{PlanAction, PlanState};

#[derive(Clone)]
pub struct PlanSync {
    area_id: Uuid,
    repo: Arc<dyn PlanRepository>,
    state: Arc<watch::Sender<PlanState>>,
}

impl PlanSync {
    pub fn new(area_id: Uuid, repo: Arc<dyn PlanRepository>) -> Self {
        let (tx, _) = watch::channel(PlanState::default());
        Self {
            area_id,
            repo,
            state: Arc::new(tx),
        }
    }

    pub fn area_id(&self) -> Uuid {
        self.area_id
    }

    pub fn subscribe(&self) -> watch::Receiver<PlanState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> PlanState {
        self.state.borrow().clone()
    }

    fn dispatch(&self, action: PlanAction) {
        self.state.send_modify(|state| state.apply(action));
    }

    /// Record a failure in the state and hand the error back
    fn fail(&self, action: fn(String) -> PlanAction, err: DomainError) -> DomainError {
        self.dispatch(action(err.to_string()));
        err
    }

    /// Replace the cache with the area's rows, newest first
    pub async fn load(&self) -> DomainResult<()> {
        self.dispatch(PlanAction::LoadStarted);
        match self.repo.list_by_area(self.area_id).await {
            Ok(rows) => {
                let items: Vec<ActionPlanItem> = rows.into_iter().map(ActionPlanItem::from).collect();
                log::debug!("loaded {} plans for area {}", items.len(), self.area_id);
                self.dispatch(PlanAction::Loaded { items, at: Utc::now() });
                Ok(())
            }
            Err(e) => {
                log::error!("loading plans for area {} failed: {}", self.area_id, e);
                Err(self.fail(PlanAction::LoadFailed, e))
            }
        }
    }

    /// Reload after a successful write; a failed reload is already in the state
    async fn refresh(&self) {
        if let Err(e) = self.load().await {
            log::warn!("reload after write failed: {}", e);
        }
    }

    pub async fn add(&self, plan: NewActionPlan) -> DomainResult<ActionPlanItem> {
        plan.validate()
            .map_err(|e| self.fail(PlanAction::Rejected, e))?;

        self.dispatch(PlanAction::MutationStarted);
        let record = NewPlanRecord::from_new(self.area_id, &plan);
        let row = self
            .repo
            .insert(&record)
            .await
            .map_err(|e| self.fail(PlanAction::MutationFailed, e))?;

        log::info!("created plan {} in area {}", row.id, self.area_id);
        self.refresh().await;
        Ok(row.into())
    }

    /// Apply the fields present in `patch`; the rest stay as they are
    pub async fn update(&self, id: Uuid, patch: ActionPlanPatch) -> DomainResult<()> {
        patch
            .validate()
            .map_err(|e| self.fail(PlanAction::Rejected, e))?;

        self.dispatch(PlanAction::MutationStarted);
        let changes = PlanChanges::from_patch(&patch);
        self.repo
            .update(id, &changes)
            .await
            .map_err(|e| self.fail(PlanAction::MutationFailed, e))?;

        self.refresh().await;
        Ok(())
    }

    pub async fn delete(&self, id: Uuid) -> DomainResult<()> {
        self.dispatch(PlanAction::MutationStarted);
        self.repo
            .delete(id)
            .await
            .map_err(|e| self.fail(PlanAction::MutationFailed, e))?;

        log::info!("deleted plan {}", id);
        self.refresh().await;
        Ok(())
    }

    pub fn clear_error(&self) {
        self.dispatch(PlanAction::ClearError);
    }

    /// Reload whenever the backend reports a change to this area's plans.
    /// `None` when the backend has no change feed. The task ends once every
    /// clone of this `PlanSync` is dropped, or when the handle is aborted.
    pub fn watch_changes(&self) -> Option<JoinHandle<()>> {
        let mut events = self.repo.changes()?;
        let mut alive = self.state.subscribe();
        let state = Arc::downgrade(&self.state);
        let repo = self.repo.clone();
        let area_id = self.area_id;

        Some(tokio::spawn(async move {
            loop {
                let reload = tokio::select! {
                    event = events.recv() => match event {
                        Ok(event) => event.matches(PLANES, area_id),
                        Err(RecvError::Lagged(skipped)) => {
                            log::warn!("change feed lagged by {} events, reloading", skipped);
                            true
                        }
                        Err(RecvError::Closed) => break,
                    },
                    // Errs once the state sender is gone
                    changed = alive.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        false
                    }
                };

                if reload {
                    let Some(state) = state.upgrade() else {
                        break;
                    };
                    let sync = PlanSync {
                        area_id,
                        repo: repo.clone(),
                        state,
                    };
                    sync.refresh().await;
                }
            }
            log::debug!("stopped watching plan changes for area {}", area_id);
        }))
    }
}
