//! Dashboard read model
//!
//! Loads the actor profile, the most recent trainings with their client
//! names, and the summary stats. Read failures degrade to safe defaults so
//! the view never comes up blank.

mod stats;

pub use stats::{DashboardStats, NO_DATA, NO_WEAK_POINTS};

use crate::error::{Error, Result};
use crate::model::{Actor, ActorId, ClientId, Training};
use crate::store::TrainingStore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{error, info};

/// Label shown when a training points at a client that no longer exists
pub const UNKNOWN_CLIENT: &str = "Unknown Client";

/// A training row joined with its client's name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingRow {
    #[serde(flatten)]
    pub training: Training,
    #[serde(rename = "clientName")]
    pub client_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dashboard {
    pub actor: Actor,
    pub initials: String,
    pub stats: DashboardStats,
    pub trainings: Vec<TrainingRow>,
}

impl Dashboard {
    /// What the view shows when nothing could be read
    pub fn fallback(actor_id: ActorId) -> Self {
        let actor = Actor {
            id: actor_id,
            name: "User".to_string(),
            email: "user@example.com".to_string(),
        };

        Self {
            initials: actor.initials(),
            actor,
            stats: DashboardStats::default(),
            trainings: Vec::new(),
        }
    }
}

/// Load the dashboard for `actor_id`, falling back to defaults on any read error.
pub async fn load(store: &dyn TrainingStore, actor_id: ActorId, limit: usize) -> Dashboard {
    match try_load(store, actor_id, limit).await {
        Ok(dashboard) => dashboard,
        Err(e) => {
            error!("Failed to load dashboard for actor {}: {}", actor_id, e);
            Dashboard::fallback(actor_id)
        }
    }
}

async fn try_load(store: &dyn TrainingStore, actor_id: ActorId, limit: usize) -> Result<Dashboard> {
    let actor = store
        .actor(actor_id)
        .await
        .map_err(|e| Error::DataFetch(format!("actor: {}", e)))?;

    let trainings = store
        .recent_trainings(actor_id, limit)
        .await
        .map_err(|e| Error::DataFetch(format!("trainings: {}", e)))?;

    let client_names = client_names(store).await;

    let stats = DashboardStats::from_trainings(&trainings);

    let rows = trainings
        .into_iter()
        .map(|training| TrainingRow {
            client_name: lookup_client_name(&client_names, training.client_id),
            training,
        })
        .collect::<Vec<_>>();

    info!(
        "Loaded dashboard for actor {} ({} trainings, avg {:.1})",
        actor_id,
        rows.len(),
        stats.average_score
    );

    Ok(Dashboard {
        initials: actor.initials(),
        actor,
        stats,
        trainings: rows,
    })
}

/// Client id → name map. A failed read leaves every row as unknown.
pub async fn client_names(store: &dyn TrainingStore) -> HashMap<ClientId, String> {
    match store.clients().await {
        Ok(clients) => clients.into_iter().map(|c| (c.id, c.name)).collect(),
        Err(e) => {
            error!("Failed to read client names: {}", e);
            HashMap::new()
        }
    }
}

pub fn lookup_client_name(names: &HashMap<ClientId, String>, id: ClientId) -> String {
    names
        .get(&id)
        .cloned()
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}
