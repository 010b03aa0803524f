// Fakes shared by the controller and HTTP tests
#![allow(dead_code)]

use callcoach::analysis::{recording_url, ConversationAnalysis, ConversationData};
use callcoach::model::{Actor, AiExperience, Client, NewClient, Urgency};
use callcoach::session::{PollPolicy, SessionConfig, TrainingController, TrainingDeps};
use callcoach::store::{MemoryStore, TrainingStore};
use callcoach::voice::{SessionRequest, StaticInputDevices, VoiceBackend, VoiceEvent, VoiceSession};
use callcoach::{Error, Result};
use serde_json::json;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

/// Counters shared between the fake backend and the sessions it opens
#[derive(Clone, Default)]
pub struct SessionProbe {
    pub opened: Arc<AtomicUsize>,
    pub ended: Arc<AtomicUsize>,
    pub audio_chunks: Arc<AtomicUsize>,
    pub muted: Arc<AtomicBool>,
    pub last_request: Arc<Mutex<Option<SessionRequest>>>,
}

pub struct FakeVoice {
    pub credentials: bool,
    pub fail_open: bool,
    pub open_delay: Duration,
    /// What the session handle reports as its conversation id
    pub handle_id: Option<String>,
    pub probe: SessionProbe,
    sender: Mutex<Option<mpsc::Sender<VoiceEvent>>>,
}

impl FakeVoice {
    pub fn new() -> Self {
        Self {
            credentials: true,
            fail_open: false,
            open_delay: Duration::ZERO,
            handle_id: None,
            probe: SessionProbe::default(),
            sender: Mutex::new(None),
        }
    }

    /// Deliver an event on the most recently opened session's stream.
    pub async fn emit(&self, event: VoiceEvent) {
        let tx = self.sender.lock().unwrap().clone();
        tx.expect("no session opened")
            .send(event)
            .await
            .expect("event stream closed");
    }
}

#[async_trait::async_trait]
impl VoiceBackend for FakeVoice {
    async fn open(
        &self,
        request: SessionRequest,
    ) -> Result<(Box<dyn VoiceSession>, mpsc::Receiver<VoiceEvent>)> {
        if !self.open_delay.is_zero() {
            tokio::time::sleep(self.open_delay).await;
        }
        if self.fail_open {
            return Err(Error::Connection("connection refused".to_string()));
        }

        self.probe.opened.fetch_add(1, Ordering::SeqCst);
        *self.probe.last_request.lock().unwrap() = Some(request);

        let (tx, rx) = mpsc::channel(32);
        *self.sender.lock().unwrap() = Some(tx);

        let session = FakeSession {
            probe: self.probe.clone(),
            id: self.handle_id.clone(),
            muted: false,
        };
        Ok((Box::new(session), rx))
    }

    fn name(&self) -> &str {
        "fake"
    }

    fn has_credentials(&self) -> bool {
        self.credentials
    }
}

pub struct FakeSession {
    probe: SessionProbe,
    id: Option<String>,
    muted: bool,
}

#[async_trait::async_trait]
impl VoiceSession for FakeSession {
    async fn end_session(&mut self) -> Result<()> {
        self.probe.ended.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn set_mic_muted(&mut self, muted: bool) -> Result<()> {
        self.muted = muted;
        self.probe.muted.store(muted, Ordering::SeqCst);
        Ok(())
    }

    async fn send_audio(&mut self, _pcm: &[u8]) -> Result<()> {
        if !self.muted {
            self.probe.audio_chunks.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    fn conversation_id(&self) -> Option<String> {
        self.id.clone()
    }
}

/// Analysis endpoint answering every fetch with the same status
pub struct FakeAnalysis {
    pub status: String,
    pub calls: AtomicUsize,
    pub requested: Mutex<Vec<String>>,
}

impl FakeAnalysis {
    pub fn with_status(status: &str) -> Self {
        Self {
            status: status.to_string(),
            calls: AtomicUsize::new(0),
            requested: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ConversationAnalysis for FakeAnalysis {
    async fn fetch_conversation(&self, conversation_id: &str) -> Result<ConversationData> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requested
            .lock()
            .unwrap()
            .push(conversation_id.to_string());

        Ok(serde_json::from_value(json!({
            "conversation_id": conversation_id,
            "status": self.status,
            "analysis": {
                "call_successful": "success",
                "evaluation_criteria_results": {
                    "sales_effectiveness_score": { "result": "success", "rationale": "7/10" }
                },
                "data_collection_results": {
                    "improvement_areas": { "value": "closing, pricing" }
                }
            }
        }))?)
    }

    async fn fetch_audio(&self, _conversation_id: &str) -> Result<Vec<u8>> {
        Ok(vec![0xAB, 0xCD, 0xEF])
    }

    fn recording_url(&self, conversation_id: &str) -> String {
        recording_url(FAKE_API_BASE, conversation_id)
    }
}

pub const FAKE_API_BASE: &str = "http://voice.test/v1/convai";

pub fn lead(name: &str, company: &str) -> NewClient {
    NewClient {
        name: name.to_string(),
        company: company.to_string(),
        email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
        sector: "logística".to_string(),
        team_size: 120,
        objective: "Reduzir tempos de entrega".to_string(),
        budget_range: "20k-50k".to_string(),
        urgency: Urgency::High,
        ai_experience: AiExperience::Basic,
        insights: None,
    }
}

/// Store with actor 1 and one client
pub async fn seeded_store() -> (Arc<MemoryStore>, Client) {
    let store = Arc::new(MemoryStore::new());
    store
        .insert_actor(Actor {
            id: 1,
            name: "Sofia Almeida".to_string(),
            email: "sofia@example.com".to_string(),
        })
        .await;
    let client = store
        .insert_client(lead("Ricardo Matos", "Lusomar"))
        .await
        .expect("insert client");
    (store, client)
}

pub fn fast_config() -> SessionConfig {
    SessionConfig {
        poll: PollPolicy {
            initial_delay: Duration::from_millis(5),
            retry_delay: Duration::from_millis(5),
            max_attempts: 3,
        },
        id_poll_attempts: 5,
        id_poll_interval: Duration::from_millis(5),
        api_base: FAKE_API_BASE.to_string(),
        ..SessionConfig::default()
    }
}

pub fn deps(
    voice: Arc<FakeVoice>,
    analysis: Arc<FakeAnalysis>,
    store: Arc<MemoryStore>,
    microphones: &[&str],
) -> TrainingDeps {
    let labels: Vec<String> = microphones.iter().map(|m| m.to_string()).collect();
    TrainingDeps {
        voice,
        devices: Arc::new(StaticInputDevices::new(&labels)),
        analysis,
        store,
    }
}

/// Poll the controller until it reports `state`; panics after a second.
pub async fn wait_for_state(controller: &TrainingController, state: &str) {
    for _ in 0..200 {
        if controller.status().await.state == state {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!(
        "controller never reached {}; stuck in {}",
        state,
        controller.status().await.state
    );
}
