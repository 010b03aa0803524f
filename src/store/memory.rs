use super::TrainingStore;
use crate::error::{Error, Result};
use crate::model::{Actor, ActorId, Client, ClientId, NewClient, NewTraining, Training, TrainingId};
use chrono::Utc;
use serde::Deserialize;
use std::path::Path;
use tokio::sync::RwLock;
use tracing::info;

/// Initial rows loaded at startup
#[derive(Debug, Default, Deserialize)]
pub struct StoreSeed {
    #[serde(default)]
    pub actors: Vec<Actor>,

    #[serde(default)]
    pub clients: Vec<Client>,
}

#[derive(Default)]
struct Tables {
    actors: Vec<Actor>,
    clients: Vec<Client>,
    trainings: Vec<Training>,
    next_client_id: ClientId,
    next_training_id: TrainingId,
}

/// In-process store; insertion order doubles as recency
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seed(seed: StoreSeed) -> Self {
        let next_client_id = seed.clients.iter().map(|c| c.id).max().unwrap_or(0) + 1;

        Self {
            tables: RwLock::new(Tables {
                actors: seed.actors,
                clients: seed.clients,
                trainings: Vec::new(),
                next_client_id,
                next_training_id: 1,
            }),
        }
    }

    pub fn from_seed_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read seed {}: {}", path.display(), e)))?;
        let seed: StoreSeed = serde_json::from_str(&raw)?;

        info!(
            "Seeded store from {} ({} actors, {} clients)",
            path.display(),
            seed.actors.len(),
            seed.clients.len()
        );

        Ok(Self::from_seed(seed))
    }

    pub async fn insert_actor(&self, actor: Actor) {
        let mut tables = self.tables.write().await;
        tables.actors.retain(|a| a.id != actor.id);
        tables.actors.push(actor);
    }
}

#[async_trait::async_trait]
impl TrainingStore for MemoryStore {
    async fn actor(&self, id: ActorId) -> Result<Actor> {
        let tables = self.tables.read().await;
        tables
            .actors
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("actor {}", id)))
    }

    async fn clients(&self) -> Result<Vec<Client>> {
        let tables = self.tables.read().await;
        let mut clients = tables.clients.clone();
        // Stable, so equal timestamps keep newest-inserted first after reverse
        clients.reverse();
        clients.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(clients)
    }

    async fn client(&self, id: ClientId) -> Result<Option<Client>> {
        let tables = self.tables.read().await;
        Ok(tables.clients.iter().find(|c| c.id == id).cloned())
    }

    async fn insert_client(&self, new: NewClient) -> Result<Client> {
        let mut tables = self.tables.write().await;
        let id = tables.next_client_id.max(1);
        tables.next_client_id = id + 1;

        let client = Client {
            id,
            name: new.name,
            company: new.company,
            email: new.email,
            sector: new.sector,
            team_size: new.team_size,
            objective: new.objective,
            budget_range: new.budget_range,
            urgency: new.urgency,
            ai_experience: new.ai_experience,
            insights: new.insights,
            created_at: Utc::now(),
        };
        tables.clients.push(client.clone());

        Ok(client)
    }

    async fn recent_trainings(&self, actor: ActorId, limit: usize) -> Result<Vec<Training>> {
        let tables = self.tables.read().await;
        let mut trainings: Vec<Training> = tables
            .trainings
            .iter()
            .rev()
            .filter(|t| t.actor_id == actor)
            .cloned()
            .collect();
        trainings.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
        trainings.truncate(limit);
        Ok(trainings)
    }

    async fn training(&self, actor: ActorId, id: TrainingId) -> Result<Option<Training>> {
        let tables = self.tables.read().await;
        Ok(tables
            .trainings
            .iter()
            .find(|t| t.id == id && t.actor_id == actor)
            .cloned())
    }

    async fn insert_training(&self, new: NewTraining) -> Result<Training> {
        let mut tables = self.tables.write().await;
        let id = tables.next_training_id.max(1);
        tables.next_training_id = id + 1;

        let training = Training {
            id,
            actor_id: new.actor_id,
            client_id: new.client_id,
            kind: new.kind,
            recorded_at: new.recorded_at,
            transcript: new.transcript,
            summary: new.summary,
            score: new.score,
            improvement_points: new.improvement_points,
            feedback: new.feedback,
            recording_url: new.recording_url,
        };
        tables.trainings.push(training.clone());

        Ok(training)
    }
}
