use anyhow::{Context, Result};
use async_trait::async_trait;
use crossbeam_channel::Sender;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use swapvoice::audio::Recorder;
use swapvoice::gateway::{
    FieldValue, FormField, HttpEnsResolver, HttpIntentClient, HttpTokenResolver, Route,
    RouteEvent, RouteSubscribers, RoutingEngine, SubscriptionId,
};
use swapvoice::speech::{HttpTranscriber, LogSpeaker, Speaker, VoiceOutput};
use swapvoice::wallet::NoWallet;
use swapvoice::{AppCommand, AppEvent, Collaborators, Orchestrator, SessionConfig, SwapVoiceError};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Keeps the order fields it is given; route search happens elsewhere
#[derive(Default)]
struct ConsoleEngine {
    fields: Mutex<HashMap<FormField, FieldValue>>,
    subscribers: RouteSubscribers,
}

#[async_trait]
impl RoutingEngine for ConsoleEngine {
    async fn set_field(&self, field: FormField, value: FieldValue) -> swapvoice::Result<()> {
        info!("Order field {} = {}", field.key(), value);
        self.fields.lock().insert(field, value);
        Ok(())
    }

    fn subscribe(&self, tx: Sender<RouteEvent>) -> SubscriptionId {
        self.subscribers.add(tx)
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.subscribers.remove(id);
    }

    async fn execute(&self, route: &Route) -> swapvoice::Result<Route> {
        Err(SwapVoiceError::ExecutionError(format!(
            "no execution backend for route {}",
            route.id
        )))
    }
}

#[cfg(feature = "audio-io")]
fn recorder() -> Arc<dyn Recorder> {
    Arc::new(swapvoice::audio::MicrophoneRecorder::new())
}

#[cfg(not(feature = "audio-io"))]
fn recorder() -> Arc<dyn Recorder> {
    struct SilentRecorder;

    #[async_trait]
    impl Recorder for SilentRecorder {
        async fn start(&self) -> swapvoice::Result<()> {
            Err(SwapVoiceError::AudioDeviceError(
                "built without audio capture".to_string(),
            ))
        }

        async fn stop(&self) -> swapvoice::Result<swapvoice::audio::AudioClip> {
            Ok(swapvoice::audio::AudioClip::default())
        }
    }

    Arc::new(SilentRecorder)
}

fn collaborators(config: &SessionConfig) -> Result<Collaborators> {
    let speaker: Arc<dyn Speaker> = match &config.tts_command {
        Some(program) => Arc::new(VoiceOutput::new(program.clone())),
        None => Arc::new(LogSpeaker),
    };

    Ok(Collaborators {
        recorder: recorder(),
        transcriber: Arc::new(HttpTranscriber::new(config.transcribe_url.clone())),
        extractor: Arc::new(HttpIntentClient::new(config.intent_url.clone())),
        tokens: Arc::new(HttpTokenResolver::new(
            config.resolve_token_url.clone(),
            config.http_timeout(),
        )?),
        engine: Arc::new(ConsoleEngine::default()),
        wallet: Arc::new(NoWallet),
        speaker,
        ens: Arc::new(HttpEnsResolver::new(
            config.ens_resolver_url.clone(),
            config.http_timeout(),
        )?),
    })
}

fn parse_command(line: &str) -> Option<AppCommand> {
    let (head, rest) = match line.split_once(' ') {
        Some((head, rest)) => (head, rest.trim()),
        None => (line, ""),
    };
    let command = match head {
        ":quit" | ":q" => AppCommand::Shutdown,
        ":rec" => AppCommand::StartRecording,
        ":stop" => AppCommand::StopRecording,
        ":reset" => AppCommand::ResetIntent,
        ":go" => AppCommand::ConfirmExecution,
        ":ens" if !rest.is_empty() => AppCommand::ConfirmEns(rest.to_string()),
        ":spell" => AppCommand::SpellEns,
        ":skip-ens" => AppCommand::SkipEns,
        ":sol" if rest.is_empty() => AppCommand::ConfirmSolanaRecipient(None),
        ":sol" => AppCommand::ConfirmSolanaRecipient(Some(rest.to_string())),
        ":skip-sol" => AppCommand::SkipSolana,
        _ if line.starts_with(':') => return None,
        _ => AppCommand::Reply(line.to_string()),
    };
    Some(command)
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "swapvoice=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting swapvoice");

    let config = SessionConfig::load_or_default().context("loading session config")?;
    let collaborators = collaborators(&config).context("building collaborators")?;
    let (orchestrator, handle) = Orchestrator::new(config, collaborators)?;
    let session = orchestrator.start()?;

    let events = handle.clone();
    let printer = thread::spawn(move || loop {
        match events.recv_event_timeout(Duration::from_millis(250)) {
            Some(AppEvent::Spoke(text)) => println!("assistant> {}", text),
            Some(AppEvent::Error(message)) => println!("error> {}", message),
            Some(AppEvent::Shutdown) => break,
            Some(AppEvent::StateChanged) | None => {}
        }
    });

    println!("Type a request (\"swap 100 usdt to eth on base\"), :rec/:stop to talk, :quit to exit.");
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line.context("reading stdin")?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match parse_command(line) {
            Some(AppCommand::Shutdown) => break,
            Some(command) => handle.send_command(command)?,
            None => warn!("Unknown command: {}", line),
        }
        io::stdout().flush().ok();
    }

    handle.shutdown()?;
    if session.join().is_err() {
        warn!("Session thread panicked");
    }
    if printer.join().is_err() {
        warn!("Event printer panicked");
    }
    Ok(())
}
