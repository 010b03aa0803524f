//! Row storage for actors, clients and trainings
//!
//! The dashboard and the training controller only see the `TrainingStore`
//! trait; the managed database behind it is an external collaborator.
//! `MemoryStore` is the in-process implementation the service ships with.

mod memory;

pub use memory::{MemoryStore, StoreSeed};

use crate::error::Result;
use crate::model::{Actor, ActorId, Client, ClientId, NewClient, NewTraining, Training, TrainingId};

/// Row-based read/insert access to the three relations
#[async_trait::async_trait]
pub trait TrainingStore: Send + Sync {
    async fn actor(&self, id: ActorId) -> Result<Actor>;

    /// All clients, newest first
    async fn clients(&self) -> Result<Vec<Client>>;

    async fn client(&self, id: ClientId) -> Result<Option<Client>>;

    async fn insert_client(&self, client: NewClient) -> Result<Client>;

    /// Up to `limit` trainings of `actor`, newest first
    async fn recent_trainings(&self, actor: ActorId, limit: usize) -> Result<Vec<Training>>;

    async fn training(&self, actor: ActorId, id: TrainingId) -> Result<Option<Training>>;

    async fn insert_training(&self, training: NewTraining) -> Result<Training>;
}
