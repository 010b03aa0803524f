use super::config::SessionConfig;
use super::persona::PersonaScript;
use super::poll::poll_analysis;
use super::state::{reduce, CallEvent, CallState};
use crate::analysis::{CallReport, ConversationAnalysis};
use crate::error::{Error, Result};
use crate::model::{ActorId, Client, ClientId, Training};
use crate::store::TrainingStore;
use crate::voice::{InputDevices, SessionRequest, TranscriptMessage, VoiceBackend, VoiceEvent, VoiceSession};
use chrono::Utc;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// External collaborators a controller talks to
#[derive(Clone)]
pub struct TrainingDeps {
    pub voice: Arc<dyn VoiceBackend>,
    pub devices: Arc<dyn InputDevices>,
    pub analysis: Arc<dyn ConversationAnalysis>,
    pub store: Arc<dyn TrainingStore>,
}

/// Snapshot of the controller for the UI
#[derive(Debug, Clone, Serialize)]
pub struct CallStatus {
    pub state: &'static str,
    pub client: Option<Client>,
    pub conversation_id: Option<String>,
    pub muted: bool,
    pub transcript: Vec<TranscriptMessage>,
}

impl From<&CallState> for CallStatus {
    fn from(state: &CallState) -> Self {
        let call = state.live_call();
        Self {
            state: state.name(),
            client: state.client().cloned(),
            conversation_id: call.and_then(|c| c.conversation_id.clone()),
            muted: call.map(|c| c.muted).unwrap_or(false),
            transcript: call.map(|c| c.transcript.clone()).unwrap_or_default(),
        }
    }
}

/// What an end request did
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum EndOutcome {
    /// Nothing was selected
    NoCall,
    /// Another end request is still tearing the call down
    AlreadyEnding,
    /// The selection was dropped before any live session existed
    Cancelled,
    /// The live call was torn down; `training` is set when it was saved
    Finished {
        training: Option<Training>,
        analysis_ready: bool,
    },
}

struct Inner {
    actor_id: ActorId,
    config: SessionConfig,
    deps: TrainingDeps,

    state: Mutex<CallState>,

    /// Live session handle, present from open until teardown
    session: Mutex<Option<Box<dyn VoiceSession>>>,

    /// Task draining the backend's event stream
    pump: Mutex<Option<JoinHandle<()>>>,

    /// Set while a teardown is running
    ending: AtomicBool,

    /// Bumped whenever a call is torn down, so stale tasks go inert
    generation: AtomicU64,

    /// Cancels analysis polling of the current teardown; replaced per end
    cancel: Mutex<CancellationToken>,
}

/// Drives one actor's training call from client selection to the saved record
#[derive(Clone)]
pub struct TrainingController {
    inner: Arc<Inner>,
}

impl TrainingController {
    pub fn new(actor_id: ActorId, config: SessionConfig, deps: TrainingDeps) -> Self {
        Self {
            inner: Arc::new(Inner {
                actor_id,
                config,
                deps,
                state: Mutex::new(CallState::Idle),
                session: Mutex::new(None),
                pump: Mutex::new(None),
                ending: AtomicBool::new(false),
                generation: AtomicU64::new(0),
                cancel: Mutex::new(CancellationToken::new()),
            }),
        }
    }

    pub fn actor_id(&self) -> ActorId {
        self.inner.actor_id
    }

    pub async fn status(&self) -> CallStatus {
        let state = self.inner.state.lock().await;
        CallStatus::from(&*state)
    }

    async fn apply(&self, event: CallEvent) -> Result<()> {
        let mut state = self.inner.state.lock().await;
        *state = reduce(&state, event)?;
        Ok(())
    }

    /// Pick the client to train against. No external calls yet.
    pub async fn select_client(&self, client_id: ClientId) -> Result<CallStatus> {
        let client = self
            .inner
            .deps
            .store
            .client(client_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("client {}", client_id)))?;

        info!(
            "Actor {} selected client {} ({})",
            self.inner.actor_id, client.name, client.company
        );

        let mut state = self.inner.state.lock().await;
        *state = reduce(&state, CallEvent::Select(client))?;
        Ok(CallStatus::from(&*state))
    }

    /// Run the capability check and open the live session.
    ///
    /// Returns once the session is opening; the connected event arrives
    /// asynchronously. Setup failures put the controller back to idle.
    pub async fn start(&self) -> Result<CallStatus> {
        let client = {
            let mut state = self.inner.state.lock().await;
            let next = reduce(&state, CallEvent::Confirm)?;
            let client = match &next {
                CallState::Preparing { client } => client.clone(),
                other => {
                    return Err(Error::InvalidTransition {
                        state: other.name(),
                        event: "confirm",
                    })
                }
            };
            *state = next;
            client
        };
        let generation = self.inner.generation.load(Ordering::SeqCst);

        info!("Starting training session with {}", client.name);

        if let Err(e) = self.check_capability().await {
            error!("Capability check failed: {}", e);
            self.fail_setup(generation).await;
            return Err(e);
        }

        self.apply(CallEvent::CapabilityPassed).await?;

        let script = PersonaScript::for_client(&client);
        let request = SessionRequest {
            prompt: script.prompt,
            first_message: script.first_message,
            transport: self.inner.config.transport,
        };

        info!(
            "Opening voice session via {}",
            self.inner.deps.voice.name()
        );

        let (mut session, events) = match self.inner.deps.voice.open(request).await {
            Ok(opened) => opened,
            Err(e) => {
                error!("Failed to start voice session: {}", e);
                self.fail_setup(generation).await;
                return Err(match e {
                    Error::Capability(_) | Error::Connection(_) => e,
                    other => Error::Connection(other.to_string()),
                });
            }
        };

        {
            let state = self.inner.state.lock().await;
            let still_ours = matches!(&*state, CallState::Connecting(_))
                && self.inner.generation.load(Ordering::SeqCst) == generation;

            if !still_ours {
                drop(state);
                warn!("Call was cancelled while connecting; closing the new session");
                if let Err(e) = session.end_session().await {
                    warn!("Failed to close abandoned session: {}", e);
                }
                return Ok(self.status().await);
            }

            *self.inner.session.lock().await = Some(session);
        }

        let pump = tokio::spawn(self.clone().pump_events(events, generation));
        *self.inner.pump.lock().await = Some(pump);

        info!("Voice session opened, waiting for connection");
        Ok(self.status().await)
    }

    async fn check_capability(&self) -> Result<()> {
        if !self.inner.deps.voice.has_credentials() {
            return Err(Error::Capability(
                "voice credentials are missing; set the agent id and API key".to_string(),
            ));
        }

        let devices = self
            .inner
            .deps
            .devices
            .input_devices()
            .await
            .map_err(as_capability)?;

        info!("Available audio inputs: {}", devices.len());
        for (i, device) in devices.iter().enumerate() {
            debug!("  {}. {} ({})", i + 1, device.label, device.id);
        }

        if devices.is_empty() {
            return Err(Error::Capability(
                "No microphone found. Please connect a microphone and try again.".to_string(),
            ));
        }

        self.inner
            .deps
            .devices
            .request_access()
            .await
            .map_err(as_capability)
    }

    /// Return to idle after a setup failure of the call started at `generation`.
    async fn fail_setup(&self, generation: u64) {
        {
            let mut state = self.inner.state.lock().await;
            if self.inner.generation.load(Ordering::SeqCst) != generation {
                return;
            }
            match reduce(&state, CallEvent::SetupFailed) {
                Ok(next) => *state = next,
                Err(e) => {
                    debug!("Setup failure ignored: {}", e);
                    return;
                }
            }
            self.inner.generation.fetch_add(1, Ordering::SeqCst);
        }

        if let Some(mut session) = self.inner.session.lock().await.take() {
            if let Err(e) = session.end_session().await {
                warn!("Failed to close session after setup failure: {}", e);
            }
        }
        // Dropping the handle detaches the pump; it sees the new generation and exits
        self.inner.pump.lock().await.take();
    }

    async fn pump_events(self, mut events: mpsc::Receiver<VoiceEvent>, generation: u64) {
        while let Some(event) = events.recv().await {
            if self.inner.generation.load(Ordering::SeqCst) != generation {
                break;
            }

            match event {
                VoiceEvent::Connected { conversation_id } => {
                    info!("Connected to voice service");
                    let known = conversation_id.is_some();
                    if let Err(e) = self.apply(CallEvent::Connected { conversation_id }).await {
                        debug!("Connected event ignored: {}", e);
                        continue;
                    }
                    if !known {
                        self.capture_conversation_id(generation).await;
                    }
                }
                VoiceEvent::Message(message) => {
                    debug!("Transcript {:?}: {}", message.source, message.message);
                    if let Err(e) = self.apply(CallEvent::Message(message)).await {
                        debug!("Transcript message dropped: {}", e);
                    }
                }
                VoiceEvent::Error(message) => {
                    error!("Voice service error: {}", message);
                    let connecting =
                        matches!(&*self.inner.state.lock().await, CallState::Connecting(_));
                    if connecting {
                        self.fail_setup(generation).await;
                        break;
                    }
                }
                VoiceEvent::Disconnected { reason } => {
                    info!("Disconnected from voice service: {:?}", reason);
                }
                VoiceEvent::Status(status) => debug!("Status changed: {:?}", status),
                VoiceEvent::Mode(mode) => debug!("Mode changed: {:?}", mode),
            }
        }

        debug!("Voice event pump stopped");
    }

    /// The handle may not know its id at connect time; ask a few times.
    async fn capture_conversation_id(&self, generation: u64) {
        for _ in 0..self.inner.config.id_poll_attempts {
            tokio::time::sleep(self.inner.config.id_poll_interval).await;
            if self.inner.generation.load(Ordering::SeqCst) != generation {
                return;
            }

            let id = self
                .inner
                .session
                .lock()
                .await
                .as_ref()
                .and_then(|s| s.conversation_id());

            if let Some(id) = id {
                info!("Conversation ID: {}", id);
                if let Err(e) = self.apply(CallEvent::ConversationId(id)).await {
                    debug!("Conversation id dropped: {}", e);
                }
                return;
            }
        }

        warn!("Conversation id not available after connecting");
    }

    /// Flip the microphone mute. `None` when there is no live call.
    pub async fn toggle_mute(&self) -> Result<Option<bool>> {
        let mut state = self.inner.state.lock().await;
        let muted = match state.live_call() {
            Some(call) if matches!(&*state, CallState::Connected(_)) => !call.muted,
            _ => {
                debug!("Mute toggle ignored: no live call");
                return Ok(None);
            }
        };

        let mut session = self.inner.session.lock().await;
        let Some(session) = session.as_mut() else {
            return Ok(None);
        };

        session.set_mic_muted(muted).await?;
        *state = reduce(&state, CallEvent::MuteSet(muted))?;

        Ok(Some(muted))
    }

    /// Forward user audio; returns false when it was dropped.
    pub async fn send_audio(&self, pcm: &[u8]) -> Result<bool> {
        let state = self.inner.state.lock().await;
        match &*state {
            CallState::Connected(call) if !call.muted => {}
            _ => return Ok(false),
        }

        let mut session = self.inner.session.lock().await;
        match session.as_mut() {
            Some(session) => {
                session.send_audio(pcm).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// End the call. Re-entrant requests are dropped.
    ///
    /// Teardown runs on its own task, so it completes and resets the
    /// controller even when the caller stops waiting. Teardown failures are
    /// logged and never keep the controller from returning to idle.
    pub async fn end_call(&self) -> EndOutcome {
        {
            let mut cancel = self.inner.cancel.lock().await;
            if self.inner.ending.swap(true, Ordering::SeqCst) {
                warn!("Already ending call");
                return EndOutcome::AlreadyEnding;
            }
            *cancel = CancellationToken::new();
        }

        info!("Ending training session for actor {}", self.inner.actor_id);
        let controller = self.clone();
        let teardown = tokio::spawn(async move {
            let outcome = controller.teardown().await;
            controller.reset().await;
            controller.inner.ending.store(false, Ordering::SeqCst);
            outcome
        });

        match teardown.await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("{}", Error::Teardown(format!("teardown task: {}", e)));
                self.reset().await;
                self.inner.ending.store(false, Ordering::SeqCst);
                EndOutcome::Finished {
                    training: None,
                    analysis_ready: false,
                }
            }
        }
    }

    /// Stop waiting on post-call analysis; the teardown saves what it has.
    ///
    /// Only affects a teardown already in flight.
    pub async fn abandon(&self) {
        if !self.inner.ending.load(Ordering::SeqCst) {
            debug!("Nothing to abandon for actor {}", self.inner.actor_id);
            return;
        }
        let cancel = self.inner.cancel.lock().await;
        cancel.cancel();
    }

    async fn teardown(&self) -> EndOutcome {
        let (call, was_connected) = {
            let mut state = self.inner.state.lock().await;
            let was_connected = matches!(&*state, CallState::Connected(_));
            let before_start = matches!(
                &*state,
                CallState::Selecting { .. } | CallState::Preparing { .. }
            );

            if matches!(&*state, CallState::Idle) {
                return EndOutcome::NoCall;
            }
            if matches!(&*state, CallState::Ending(_)) {
                return EndOutcome::AlreadyEnding;
            }
            if before_start {
                if let Ok(next) = reduce(&state, CallEvent::EndRequested) {
                    *state = next;
                }
                self.inner.generation.fetch_add(1, Ordering::SeqCst);
                info!("Selection cancelled before the call started");
                return EndOutcome::Cancelled;
            }

            let next = match reduce(&state, CallEvent::EndRequested) {
                Ok(next) => next,
                Err(e) => {
                    error!("Cannot end call: {}", e);
                    return EndOutcome::NoCall;
                }
            };
            *state = next;
            self.inner.generation.fetch_add(1, Ordering::SeqCst);

            match state.live_call() {
                Some(call) => (call.clone(), was_connected),
                None => return EndOutcome::NoCall,
            }
        };

        let mut conversation_id = call.conversation_id.clone();

        match self.inner.session.lock().await.take() {
            Some(mut session) => {
                if conversation_id.is_none() && was_connected {
                    conversation_id = session.conversation_id();
                }
                info!("Ending voice session");
                if let Err(e) = session.end_session().await {
                    let e = Error::Teardown(format!("end session: {}", e));
                    error!("{}", e);
                }
            }
            None => warn!("No active voice session to end"),
        }

        if let Some(pump) = self.inner.pump.lock().await.take() {
            pump.abort();
        }

        let Some(conversation_id) = conversation_id else {
            info!("Call ended before a conversation id was obtained; nothing to save");
            return EndOutcome::Finished {
                training: None,
                analysis_ready: false,
            };
        };

        let cancel = self.inner.cancel.lock().await.clone();
        let polled = poll_analysis(
            self.inner.deps.analysis.as_ref(),
            &conversation_id,
            &self.inner.config.poll,
            &cancel,
        )
        .await;

        let report = CallReport {
            actor_id: self.inner.actor_id,
            client: &call.client,
            analysis: polled.data.as_ref(),
            transcript: &call.transcript,
            api_base: &self.inner.config.api_base,
            recorded_at: Utc::now(),
        };

        let training = match report.into_training() {
            Ok(new) => match self.inner.deps.store.insert_training(new).await {
                Ok(training) => {
                    info!(
                        "Training {} saved (score={:?})",
                        training.id, training.score
                    );
                    Some(training)
                }
                Err(e) => {
                    error!("{}", Error::Teardown(format!("save training: {}", e)));
                    None
                }
            },
            Err(e) => {
                error!("{}", Error::Teardown(format!("build report: {}", e)));
                None
            }
        };

        EndOutcome::Finished {
            training,
            analysis_ready: polled.ready,
        }
    }

    /// Clear every call-scoped field, whatever happened during teardown.
    async fn reset(&self) {
        {
            let mut state = self.inner.state.lock().await;
            if let Ok(next) = reduce(&state, CallEvent::TeardownComplete) {
                *state = next;
            } else if !matches!(&*state, CallState::Idle) {
                *state = CallState::Idle;
            }
        }

        if let Some(mut session) = self.inner.session.lock().await.take() {
            if let Err(e) = session.end_session().await {
                warn!("Failed to close session during reset: {}", e);
            }
        }
        if let Some(pump) = self.inner.pump.lock().await.take() {
            pump.abort();
        }

        debug!("Call state reset");
    }
}

fn as_capability(e: Error) -> Error {
    match e {
        Error::Capability(_) => e,
        other => Error::Capability(other.to_string()),
    }
}
