// Integration tests for the training call lifecycle, driven through fakes

mod common;

use anyhow::Result;
use callcoach::session::{EndOutcome, PollPolicy, TrainingController};
use callcoach::store::TrainingStore;
use callcoach::voice::{Speaker, TranscriptMessage, VoiceEvent};
use callcoach::Error;
use common::{deps, fast_config, seeded_store, wait_for_state, FakeAnalysis, FakeVoice};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

struct Harness {
    voice: Arc<FakeVoice>,
    analysis: Arc<FakeAnalysis>,
    store: Arc<callcoach::MemoryStore>,
    client_id: i64,
    controller: TrainingController,
}

async fn harness_with(voice: FakeVoice, analysis: FakeAnalysis, microphones: &[&str]) -> Harness {
    let (store, client) = seeded_store().await;
    let voice = Arc::new(voice);
    let analysis = Arc::new(analysis);
    let controller = TrainingController::new(
        1,
        fast_config(),
        deps(voice.clone(), analysis.clone(), store.clone(), microphones),
    );

    Harness {
        voice,
        analysis,
        store,
        client_id: client.id,
        controller,
    }
}

async fn harness() -> Harness {
    harness_with(FakeVoice::new(), FakeAnalysis::with_status("done"), &["USB Mic"]).await
}

impl Harness {
    async fn connect(&self, conversation_id: Option<&str>) -> Result<()> {
        self.controller.select_client(self.client_id).await?;
        let status = self.controller.start().await?;
        assert_eq!(status.state, "connecting");

        self.voice
            .emit(VoiceEvent::Connected {
                conversation_id: conversation_id.map(str::to_string),
            })
            .await;
        wait_for_state(&self.controller, "connected").await;
        Ok(())
    }

    async fn trainings(&self) -> Result<usize> {
        Ok(self.store.recent_trainings(1, 50).await?.len())
    }
}

#[tokio::test]
async fn test_full_call_saves_one_training() -> Result<()> {
    let h = harness().await;
    h.connect(Some("conv_1")).await?;

    let request = h.voice.probe.last_request.lock().unwrap().clone().unwrap();
    assert!(request.prompt.starts_with("You are Ricardo Matos from Lusomar"));
    assert!(request.first_message.contains("reduzir tempos de entrega"));

    h.voice
        .emit(VoiceEvent::Message(TranscriptMessage::new(
            Speaker::Agent,
            "Olá! Obrigado por marcar esta reunião.",
        )))
        .await;
    h.voice
        .emit(VoiceEvent::Message(TranscriptMessage::new(Speaker::User, "Bom dia")))
        .await;

    for _ in 0..200 {
        if h.controller.status().await.transcript.len() == 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    let status = h.controller.status().await;
    assert_eq!(status.transcript.len(), 2);
    assert_eq!(status.conversation_id.as_deref(), Some("conv_1"));

    let (training, analysis_ready) = match h.controller.end_call().await {
        EndOutcome::Finished {
            training: Some(training),
            analysis_ready,
        } => (training, analysis_ready),
        other => panic!("expected a saved training, got {:?}", other),
    };

    assert!(analysis_ready);
    assert_eq!(training.score, Some(7));
    assert_eq!(training.client_id, h.client_id);
    assert_eq!(
        training.improvement_points,
        Some(vec!["closing".to_string(), "pricing".to_string()])
    );
    assert_eq!(
        training.recording_url.as_deref(),
        Some("http://voice.test/v1/convai/conversations/conv_1/audio")
    );

    assert_eq!(h.trainings().await?, 1);
    assert_eq!(h.voice.probe.ended.load(Ordering::SeqCst), 1);
    assert_eq!(h.controller.status().await.state, "idle");
    assert!(h.controller.status().await.client.is_none());
    Ok(())
}

#[tokio::test]
async fn test_end_before_connect_saves_nothing() -> Result<()> {
    let mut voice = FakeVoice::new();
    voice.handle_id = Some("conv_early".to_string());
    let h = harness_with(voice, FakeAnalysis::with_status("done"), &["USB Mic"]).await;

    h.controller.select_client(h.client_id).await?;
    h.controller.start().await?;

    let outcome = h.controller.end_call().await;
    assert!(matches!(
        outcome,
        EndOutcome::Finished {
            training: None,
            analysis_ready: false
        }
    ));

    assert_eq!(h.trainings().await?, 0);
    assert_eq!(h.analysis.calls(), 0);
    assert_eq!(h.voice.probe.ended.load(Ordering::SeqCst), 1);
    assert_eq!(h.controller.status().await.state, "idle");
    Ok(())
}

#[tokio::test]
async fn test_cancel_before_start() -> Result<()> {
    let h = harness().await;
    h.controller.select_client(h.client_id).await?;

    assert!(matches!(h.controller.end_call().await, EndOutcome::Cancelled));
    assert_eq!(h.controller.status().await.state, "idle");
    assert_eq!(h.voice.probe.opened.load(Ordering::SeqCst), 0);
    assert!(matches!(h.controller.end_call().await, EndOutcome::NoCall));
    Ok(())
}

#[tokio::test]
async fn test_double_end_tears_down_once() -> Result<()> {
    let (store, client) = seeded_store().await;
    let voice = Arc::new(FakeVoice::new());
    let analysis = Arc::new(FakeAnalysis::with_status("done"));
    let mut config = fast_config();
    config.poll = PollPolicy {
        initial_delay: Duration::from_millis(100),
        retry_delay: Duration::from_millis(5),
        max_attempts: 3,
    };
    let controller = TrainingController::new(
        1,
        config,
        deps(voice.clone(), analysis.clone(), store.clone(), &["USB Mic"]),
    );

    controller.select_client(client.id).await?;
    controller.start().await?;
    voice
        .emit(VoiceEvent::Connected {
            conversation_id: Some("conv_2".to_string()),
        })
        .await;
    wait_for_state(&controller, "connected").await;

    let (first, second) = tokio::join!(controller.end_call(), controller.end_call());

    assert!(matches!(first, EndOutcome::Finished { training: Some(_), .. }));
    assert!(matches!(second, EndOutcome::AlreadyEnding));
    assert_eq!(store.recent_trainings(1, 50).await?.len(), 1);
    assert_eq!(voice.probe.ended.load(Ordering::SeqCst), 1);
    assert_eq!(analysis.calls(), 1);
    Ok(())
}

#[tokio::test]
async fn test_still_processing_after_retries_saves_partial_record() -> Result<()> {
    let h = harness_with(FakeVoice::new(), FakeAnalysis::with_status("processing"), &["USB Mic"]).await;
    h.connect(Some("conv_3")).await?;

    let outcome = h.controller.end_call().await;
    match outcome {
        EndOutcome::Finished {
            training: Some(training),
            analysis_ready,
        } => {
            assert!(!analysis_ready);
            assert_eq!(training.transcript["status"], "processing");
        }
        other => panic!("expected a saved training, got {:?}", other),
    }

    assert_eq!(h.analysis.calls(), 3);
    assert_eq!(h.trainings().await?, 1);
    assert_eq!(h.controller.status().await.state, "idle");
    Ok(())
}

#[tokio::test]
async fn test_conversation_id_captured_from_handle() -> Result<()> {
    let mut voice = FakeVoice::new();
    voice.handle_id = Some("conv_late".to_string());
    let h = harness_with(voice, FakeAnalysis::with_status("done"), &["USB Mic"]).await;

    h.connect(None).await?;
    for _ in 0..200 {
        if h.controller.status().await.conversation_id.is_some() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(
        h.controller.status().await.conversation_id.as_deref(),
        Some("conv_late")
    );

    h.controller.end_call().await;
    assert_eq!(*h.analysis.requested.lock().unwrap(), vec!["conv_late".to_string()]);
    assert_eq!(h.trainings().await?, 1);
    Ok(())
}

#[tokio::test]
async fn test_missing_credentials_is_capability_error() -> Result<()> {
    let mut voice = FakeVoice::new();
    voice.credentials = false;
    let h = harness_with(voice, FakeAnalysis::with_status("done"), &["USB Mic"]).await;

    h.controller.select_client(h.client_id).await?;
    let err = h.controller.start().await.unwrap_err();

    assert!(matches!(err, Error::Capability(_)));
    assert!(err.is_user_visible());
    assert_eq!(h.controller.status().await.state, "idle");
    assert_eq!(h.voice.probe.opened.load(Ordering::SeqCst), 0);
    Ok(())
}

#[tokio::test]
async fn test_no_microphone_is_capability_error() -> Result<()> {
    let h = harness_with(FakeVoice::new(), FakeAnalysis::with_status("done"), &[]).await;

    h.controller.select_client(h.client_id).await?;
    let err = h.controller.start().await.unwrap_err();

    assert!(matches!(err, Error::Capability(ref msg) if msg.contains("No microphone")));
    assert_eq!(h.controller.status().await.state, "idle");
    Ok(())
}

#[tokio::test]
async fn test_open_failure_clears_selection() -> Result<()> {
    let mut voice = FakeVoice::new();
    voice.fail_open = true;
    let h = harness_with(voice, FakeAnalysis::with_status("done"), &["USB Mic"]).await;

    h.controller.select_client(h.client_id).await?;
    let err = h.controller.start().await.unwrap_err();

    assert!(matches!(err, Error::Connection(_)));
    let status = h.controller.status().await;
    assert_eq!(status.state, "idle");
    assert!(status.client.is_none());
    assert_eq!(h.trainings().await?, 0);
    Ok(())
}

#[tokio::test]
async fn test_error_event_while_connecting_returns_to_idle() -> Result<()> {
    let h = harness().await;
    h.controller.select_client(h.client_id).await?;
    h.controller.start().await?;

    h.voice
        .emit(VoiceEvent::Error("handshake rejected".to_string()))
        .await;
    wait_for_state(&h.controller, "idle").await;

    assert_eq!(h.voice.probe.ended.load(Ordering::SeqCst), 1);
    assert!(matches!(h.controller.end_call().await, EndOutcome::NoCall));
    Ok(())
}

#[tokio::test]
async fn test_cancel_while_opening_closes_new_session() -> Result<()> {
    let mut voice = FakeVoice::new();
    voice.open_delay = Duration::from_millis(100);
    let h = harness_with(voice, FakeAnalysis::with_status("done"), &["USB Mic"]).await;

    h.controller.select_client(h.client_id).await?;
    let starter = h.controller.clone();
    let start = tokio::spawn(async move { starter.start().await });

    wait_for_state(&h.controller, "connecting").await;
    let outcome = h.controller.end_call().await;
    assert!(matches!(outcome, EndOutcome::Finished { training: None, .. }));

    let status = start.await??;
    assert_eq!(status.state, "idle");
    assert_eq!(h.voice.probe.opened.load(Ordering::SeqCst), 1);
    assert_eq!(h.voice.probe.ended.load(Ordering::SeqCst), 1);
    assert_eq!(h.trainings().await?, 0);
    Ok(())
}

#[tokio::test]
async fn test_mute_and_audio_forwarding() -> Result<()> {
    let h = harness().await;

    assert_eq!(h.controller.toggle_mute().await?, None);
    assert!(!h.controller.send_audio(&[0u8; 320]).await?);

    h.connect(Some("conv_4")).await?;
    assert!(h.controller.send_audio(&[0u8; 320]).await?);

    assert_eq!(h.controller.toggle_mute().await?, Some(true));
    assert!(h.voice.probe.muted.load(Ordering::SeqCst));
    assert!(h.controller.status().await.muted);
    assert!(!h.controller.send_audio(&[0u8; 320]).await?);

    assert_eq!(h.controller.toggle_mute().await?, Some(false));
    assert!(h.controller.send_audio(&[0u8; 320]).await?);
    assert_eq!(h.voice.probe.audio_chunks.load(Ordering::SeqCst), 2);
    Ok(())
}

#[tokio::test]
async fn test_abandon_stops_waiting_for_analysis() -> Result<()> {
    let (store, client) = seeded_store().await;
    let voice = Arc::new(FakeVoice::new());
    let analysis = Arc::new(FakeAnalysis::with_status("done"));
    let mut config = fast_config();
    config.poll.initial_delay = Duration::from_secs(30);
    let controller = TrainingController::new(
        1,
        config,
        deps(voice.clone(), analysis.clone(), store.clone(), &["USB Mic"]),
    );

    controller.select_client(client.id).await?;
    controller.start().await?;
    voice
        .emit(VoiceEvent::Connected {
            conversation_id: Some("conv_5".to_string()),
        })
        .await;
    wait_for_state(&controller, "connected").await;

    let ender = controller.clone();
    let end = tokio::spawn(async move { ender.end_call().await });
    wait_for_state(&controller, "ending").await;
    controller.abandon().await;

    let outcome = tokio::time::timeout(Duration::from_secs(2), end).await??;
    match outcome {
        EndOutcome::Finished {
            training: Some(training),
            analysis_ready,
        } => {
            assert!(!analysis_ready);
            assert_eq!(training.score, None);
            assert!(training.transcript.get("messages").is_some());
        }
        other => panic!("expected a saved training, got {:?}", other),
    }
    assert_eq!(analysis.calls(), 0);
    assert_eq!(controller.status().await.state, "idle");
    Ok(())
}

#[tokio::test]
async fn test_dropped_end_request_still_finishes_call() -> Result<()> {
    let (store, client) = seeded_store().await;
    let voice = Arc::new(FakeVoice::new());
    let analysis = Arc::new(FakeAnalysis::with_status("done"));
    let mut config = fast_config();
    config.poll.initial_delay = Duration::from_millis(200);
    let controller = TrainingController::new(
        1,
        config,
        deps(voice.clone(), analysis.clone(), store.clone(), &["USB Mic"]),
    );

    controller.select_client(client.id).await?;
    controller.start().await?;
    voice
        .emit(VoiceEvent::Connected {
            conversation_id: Some("conv_7".to_string()),
        })
        .await;
    wait_for_state(&controller, "connected").await;

    // Caller gives up while analysis polling is still waiting
    let gave_up = tokio::time::timeout(Duration::from_millis(50), controller.end_call()).await;
    assert!(gave_up.is_err());

    wait_for_state(&controller, "idle").await;
    let saved = store.recent_trainings(1, 50).await?;
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].score, Some(7));
    assert_eq!(analysis.calls(), 1);

    assert!(matches!(controller.end_call().await, EndOutcome::NoCall));
    let status = controller.select_client(client.id).await?;
    assert_eq!(status.state, "selecting");
    Ok(())
}

#[tokio::test]
async fn test_abandon_while_idle_does_not_skip_next_analysis() -> Result<()> {
    let h = harness().await;
    h.controller.abandon().await;

    h.connect(Some("conv_8")).await?;
    match h.controller.end_call().await {
        EndOutcome::Finished {
            training: Some(training),
            analysis_ready,
        } => {
            assert!(analysis_ready);
            assert_eq!(training.score, Some(7));
            assert!(training.recording_url.is_some());
        }
        other => panic!("expected a saved training, got {:?}", other),
    }
    assert_eq!(h.analysis.calls(), 1);
    Ok(())
}

#[tokio::test]
async fn test_invalid_requests() -> Result<()> {
    let h = harness().await;

    let err = h.controller.start().await.unwrap_err();
    assert!(matches!(err, Error::InvalidTransition { state: "idle", .. }));

    let err = h.controller.select_client(999).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
    Ok(())
}
