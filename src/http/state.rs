use crate::enrichment::CompanyResearch;
use crate::leads::LeadIntake;
use crate::model::ActorId;
use crate::session::{SessionConfig, TrainingController, TrainingDeps};
use crate::store::TrainingStore;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn TrainingStore>,

    pub deps: TrainingDeps,

    pub session_config: SessionConfig,

    pub research: Arc<dyn CompanyResearch>,

    pub intake: Arc<LeadIntake>,

    /// Trainings shown on the dashboard
    pub recent_limit: usize,

    /// Training controllers (actor_id → controller)
    pub controllers: Arc<RwLock<HashMap<ActorId, Arc<TrainingController>>>>,
}

impl AppState {
    pub fn new(
        deps: TrainingDeps,
        research: Arc<dyn CompanyResearch>,
        session_config: SessionConfig,
        recent_limit: usize,
    ) -> Self {
        let store = deps.store.clone();
        let intake = Arc::new(LeadIntake::new(store.clone(), research.clone()));

        Self {
            store,
            deps,
            session_config,
            research,
            intake,
            recent_limit,
            controllers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// The actor's controller, created on first use
    pub async fn controller(&self, actor_id: ActorId) -> Arc<TrainingController> {
        {
            let controllers = self.controllers.read().await;
            if let Some(controller) = controllers.get(&actor_id) {
                return controller.clone();
            }
        }

        let mut controllers = self.controllers.write().await;
        controllers
            .entry(actor_id)
            .or_insert_with(|| {
                Arc::new(TrainingController::new(
                    actor_id,
                    self.session_config.clone(),
                    self.deps.clone(),
                ))
            })
            .clone()
    }

    /// Every controller created so far
    pub async fn controllers(&self) -> Vec<Arc<TrainingController>> {
        self.controllers.read().await.values().cloned().collect()
    }
}
