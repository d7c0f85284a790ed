//! Session orchestrator
//!
//! Runs the dialogue controller on its own thread. Callers talk to it through
//! an [`OrchestratorHandle`]: commands in, events out, state by snapshot.

use crate::config::SessionConfig;
use crate::dialogue::{
    AppCommand, AppEvent, Collaborators, DialogueController, SharedDialogueState,
};
use crate::gateway::RouteEvent;
use crate::speech::Speaker;
use crate::{Result, SwapVoiceError};
use crossbeam_channel::{bounded, select, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Handle for driving a running session
#[derive(Clone)]
pub struct OrchestratorHandle {
    command_tx: Sender<AppCommand>,
    event_rx: Receiver<AppEvent>,
    state: SharedDialogueState,
    shutdown_timeout: Duration,
}

impl OrchestratorHandle {
    /// Send a command to the session
    pub fn send_command(&self, cmd: AppCommand) -> Result<()> {
        self.command_tx
            .send(cmd)
            .map_err(|e| SwapVoiceError::ChannelError(format!("Failed to send command: {}", e)))
    }

    pub fn start_recording(&self) -> Result<()> {
        self.send_command(AppCommand::StartRecording)
    }

    pub fn stop_recording(&self) -> Result<()> {
        self.send_command(AppCommand::StopRecording)
    }

    pub fn submit_text(&self, text: impl Into<String>) -> Result<()> {
        self.send_command(AppCommand::SubmitText(text.into()))
    }

    pub fn reply(&self, text: impl Into<String>) -> Result<()> {
        self.send_command(AppCommand::Reply(text.into()))
    }

    pub fn shutdown(&self) -> Result<()> {
        self.send_command(AppCommand::Shutdown)
    }

    /// Try to receive an event without blocking
    pub fn try_recv_event(&self) -> Option<AppEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_event_timeout(&self, timeout: Duration) -> Option<AppEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    /// Shared session state for display
    pub fn state(&self) -> &SharedDialogueState {
        &self.state
    }

    /// Drain events until the session reports shutdown
    ///
    /// Returns false if it did not within the configured shutdown timeout.
    pub fn wait_for_shutdown(&self) -> bool {
        let deadline = Instant::now() + self.shutdown_timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                warn!("Session did not shut down within {:?}", self.shutdown_timeout);
                return false;
            }
            match self.event_rx.recv_timeout(remaining) {
                Ok(AppEvent::Shutdown) => return true,
                Ok(_) => continue,
                Err(_) => {
                    warn!("Session did not shut down within {:?}", self.shutdown_timeout);
                    return false;
                }
            }
        }
    }
}

/// Forwards speech and reports each utterance as an event
struct EventSpeaker {
    inner: Arc<dyn Speaker>,
    event_tx: Sender<AppEvent>,
}

impl Speaker for EventSpeaker {
    fn speak(&self, text: &str) {
        self.inner.speak(text);
        if self.event_tx.try_send(AppEvent::Spoke(text.to_string())).is_err() {
            debug!("Event channel full, dropped utterance event");
        }
    }

    fn cancel(&self) {
        self.inner.cancel();
    }
}

pub struct Orchestrator {
    config: SessionConfig,
    collaborators: Collaborators,
    state: SharedDialogueState,
    command_rx: Receiver<AppCommand>,
    event_tx: Sender<AppEvent>,
}

impl Orchestrator {
    pub fn new(
        config: SessionConfig,
        collaborators: Collaborators,
    ) -> Result<(Self, OrchestratorHandle)> {
        config.validate()?;

        let (command_tx, command_rx) = bounded(config.channel_buffer_size);
        let (event_tx, event_rx) = bounded(config.channel_buffer_size);
        let state = SharedDialogueState::new();

        let handle = OrchestratorHandle {
            command_tx,
            event_rx,
            state: state.clone(),
            shutdown_timeout: Duration::from_millis(config.shutdown_timeout_ms),
        };

        let orchestrator = Self {
            config,
            collaborators,
            state,
            command_rx,
            event_tx,
        };

        Ok((orchestrator, handle))
    }

    /// Start the session thread
    pub fn start(self) -> Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("dialogue".to_string())
            .spawn(move || self.run())
            .map_err(|e| SwapVoiceError::IOError(format!("Failed to spawn session thread: {}", e)))
    }

    fn run(self) {
        let Self {
            config,
            mut collaborators,
            state,
            command_rx,
            event_tx,
        } = self;

        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(e) => {
                error!("Failed to build session runtime: {}", e);
                let _ = event_tx.send(AppEvent::Error(e.to_string()));
                let _ = event_tx.send(AppEvent::Shutdown);
                return;
            }
        };

        collaborators.speaker = Arc::new(EventSpeaker {
            inner: collaborators.speaker,
            event_tx: event_tx.clone(),
        });
        let buffer = config.channel_buffer_size;
        let mut controller = DialogueController::with_state(config, collaborators, state);

        runtime.block_on(async {
            info!("Dialogue session started");
            let (route_tx, route_rx) = bounded(buffer);
            controller.subscribe_routes(route_tx);

            loop {
                let next = select! {
                    recv(command_rx) -> msg => match msg {
                        Ok(cmd) => Next::Command(cmd),
                        Err(_) => {
                            warn!("Command channel disconnected");
                            Next::Stop
                        }
                    },
                    recv(route_rx) -> msg => msg.map(Next::Route).unwrap_or(Next::Idle),
                    default(Duration::from_millis(10)) => Next::Idle,
                };

                match next {
                    Next::Command(AppCommand::Shutdown) => {
                        info!("Session shutdown requested");
                        break;
                    }
                    Next::Command(cmd) => {
                        debug!("Command: {:?}", cmd);
                        if let Err(e) = handle_command(&controller, cmd).await {
                            let _ = event_tx.try_send(AppEvent::Error(e.user_message()));
                        }
                        let _ = event_tx.try_send(AppEvent::StateChanged);
                    }
                    Next::Route(event) => {
                        controller.on_route_event(event).await;
                        let _ = event_tx.try_send(AppEvent::StateChanged);
                    }
                    Next::Idle => {}
                    Next::Stop => break,
                }
            }

            controller.teardown();
        });

        let _ = event_tx.send(AppEvent::Shutdown);
        info!("Dialogue session stopped");
    }
}

/// What the session loop picked up
enum Next {
    Command(AppCommand),
    Route(RouteEvent),
    Idle,
    Stop,
}

async fn handle_command(controller: &DialogueController, cmd: AppCommand) -> Result<()> {
    match cmd {
        AppCommand::StartRecording => {
            controller.start_recording().await?;
        }
        AppCommand::StopRecording => controller.stop_and_process().await?,
        AppCommand::SubmitText(text) => controller.submit_text(&text).await,
        AppCommand::Reply(text) => controller.reply(&text).await,
        AppCommand::ConfirmProposal => controller.confirm_proposal().await,
        AppCommand::CancelProposal => controller.cancel_proposal(),
        AppCommand::ConfirmExecution => controller.confirm_execution().await,
        AppCommand::CancelExecution => controller.cancel_execution(),
        AppCommand::ConfirmEns(name) => controller.confirm_ens(&name).await,
        AppCommand::SpellEns => {
            controller.spell_ens_by_voice().await;
        }
        AppCommand::SkipEns => controller.skip_ens().await,
        AppCommand::ConfirmSolanaRecipient(address) => {
            controller.confirm_solana_recipient(address).await
        }
        AppCommand::SkipSolana => controller.skip_solana(),
        AppCommand::ResetIntent => controller.reset_intent(),
        AppCommand::Shutdown => {}
    }
    Ok(())
}
