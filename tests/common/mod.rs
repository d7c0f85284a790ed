//! Scripted collaborators for dialogue and orchestrator tests

#![allow(dead_code)]

use async_trait::async_trait;
use crossbeam_channel::Sender;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use swapvoice::audio::{AudioClip, Recorder};
use swapvoice::dialogue::AppliedOrder;
use swapvoice::gateway::{
    EnsResolver, FieldValue, FormField, IntentExtractor, Route, RouteEvent, RouteSubscribers,
    RoutingEngine, SubscriptionId, TokenRecord, TokenResolver,
};
use swapvoice::speech::{Speaker, Transcriber};
use swapvoice::wallet::{Wallet, WalletToken};
use swapvoice::{
    Collaborators, DialogueController, PartialIntent, Result, SessionConfig,
    SharedDialogueState, SwapVoiceError,
};
use tokio::sync::broadcast;

pub const ACCOUNT: &str = "0x00000000000000000000000000000000000000aa";
pub const SOLANA_KEY: &str = "9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM";
pub const VITALIK: &str = "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045";

#[derive(Default)]
pub struct ScriptedRecorder {
    pub fail_start: AtomicBool,
    pub starts: AtomicUsize,
    pub stops: AtomicUsize,
}

#[async_trait]
impl Recorder for ScriptedRecorder {
    async fn start(&self) -> Result<()> {
        if self.fail_start.load(Ordering::SeqCst) {
            return Err(SwapVoiceError::AudioDeviceError("no input device".into()));
        }
        self.starts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&self) -> Result<AudioClip> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        Ok(AudioClip::new(vec![0.1; 1600], 16000))
    }
}

/// Hands out queued transcripts, then empty strings
#[derive(Default)]
pub struct ScriptedTranscriber {
    transcripts: Mutex<VecDeque<String>>,
}

impl ScriptedTranscriber {
    pub fn push(&self, text: &str) {
        self.transcripts.lock().push_back(text.to_string());
    }
}

#[async_trait]
impl Transcriber for ScriptedTranscriber {
    async fn transcribe(&self, _clip: &AudioClip, _lang: &str) -> Result<String> {
        Ok(self.transcripts.lock().pop_front().unwrap_or_default())
    }
}

/// Remote extractor answering from a queue; empty once drained
#[derive(Default)]
pub struct ScriptedExtractor {
    answers: Mutex<VecDeque<PartialIntent>>,
    pub fail: AtomicBool,
}

impl ScriptedExtractor {
    pub fn push(&self, json: serde_json::Value) {
        let partial: PartialIntent = serde_json::from_value(json).unwrap();
        self.answers.lock().push_back(partial);
    }
}

#[async_trait]
impl IntentExtractor for ScriptedExtractor {
    async fn extract(&self, _text: &str) -> Result<PartialIntent> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(SwapVoiceError::IntentError("extractor returned 500".into()));
        }
        Ok(self.answers.lock().pop_front().unwrap_or_default())
    }
}

pub fn token(symbol: &str, address: &str, decimals: u32) -> TokenRecord {
    TokenRecord {
        symbol: symbol.to_string(),
        name: symbol.to_string(),
        address: address.to_string(),
        decimals,
        logo_uri: None,
        price_usd: None,
        chain_id: None,
    }
}

#[derive(Default)]
pub struct MapTokenResolver {
    tokens: Mutex<HashMap<(u64, String), TokenRecord>>,
    pub offline: AtomicBool,
    pub calls: AtomicUsize,
}

impl MapTokenResolver {
    pub fn with_defaults() -> Self {
        let resolver = Self::default();
        resolver.insert(8453, token("USDT", "0xfde4c96c8593536e31f229ea8f37b2ada2699bb2", 6));
        resolver.insert(8453, token("ETH", "0x0000000000000000000000000000000000000000", 18));
        resolver.insert(137, token("USDC", "0x3c499c542cef5e3811e1192ce70d8cc03d5c3359", 6));
        resolver.insert(42161, token("USDC", "0xaf88d065e77c8cc2239327c5edb3a432268e5831", 6));
        resolver
    }

    pub fn insert(&self, chain_id: u64, record: TokenRecord) {
        self.tokens
            .lock()
            .insert((chain_id, record.symbol.to_uppercase()), record);
    }
}

#[async_trait]
impl TokenResolver for MapTokenResolver {
    async fn resolve(&self, chain_id: u64, search: &str) -> Result<Option<TokenRecord>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(SwapVoiceError::NetworkError("connection refused".into()));
        }
        Ok(self
            .tokens
            .lock()
            .get(&(chain_id, search.to_uppercase()))
            .cloned())
    }
}

#[derive(Default)]
pub struct RecordingSpeaker {
    spoken: Mutex<Vec<String>>,
    pub cancels: AtomicUsize,
}

impl RecordingSpeaker {
    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().clone()
    }

    pub fn last(&self) -> Option<String> {
        self.spoken.lock().last().cloned()
    }

    pub fn said(&self, text: &str) -> bool {
        self.spoken.lock().iter().any(|s| s == text)
    }

    pub fn count(&self) -> usize {
        self.spoken.lock().len()
    }
}

impl Speaker for RecordingSpeaker {
    fn speak(&self, text: &str) {
        self.spoken.lock().push(text.to_string());
    }

    fn cancel(&self) {
        self.cancels.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct MockWallet {
    pub evm: AtomicBool,
    pub accounts: Mutex<Vec<String>>,
    pub chain: AtomicU64,
    pub allow_switch: AtomicBool,
    chain_tx: broadcast::Sender<u64>,
    pub solana: AtomicBool,
    pub solana_key: Mutex<Option<String>>,
    pub balances: Mutex<Vec<WalletToken>>,
    pub balances_fail: AtomicBool,
}

impl Default for MockWallet {
    fn default() -> Self {
        let (chain_tx, _) = broadcast::channel(8);
        Self {
            evm: AtomicBool::new(true),
            accounts: Mutex::new(vec![ACCOUNT.to_string()]),
            chain: AtomicU64::new(8453),
            allow_switch: AtomicBool::new(true),
            chain_tx,
            solana: AtomicBool::new(false),
            solana_key: Mutex::new(None),
            balances: Mutex::new(Vec::new()),
            balances_fail: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl Wallet for MockWallet {
    fn evm_available(&self) -> bool {
        self.evm.load(Ordering::SeqCst)
    }

    async fn evm_accounts(&self) -> Result<Vec<String>> {
        Ok(self.accounts.lock().clone())
    }

    async fn chain_id(&self) -> Result<u64> {
        Ok(self.chain.load(Ordering::SeqCst))
    }

    async fn switch_chain(&self, chain_id: u64) -> Result<()> {
        if !self.allow_switch.load(Ordering::SeqCst) {
            return Err(SwapVoiceError::WalletError("User rejected the request.".into()));
        }
        self.chain.store(chain_id, Ordering::SeqCst);
        let _ = self.chain_tx.send(chain_id);
        Ok(())
    }

    fn chain_changes(&self) -> Option<broadcast::Receiver<u64>> {
        Some(self.chain_tx.subscribe())
    }

    fn solana_available(&self) -> bool {
        self.solana.load(Ordering::SeqCst)
    }

    async fn solana_connect(&self) -> Result<Option<String>> {
        if !self.solana_available() {
            return Ok(None);
        }
        Ok(self.solana_key.lock().clone())
    }

    fn solana_public_key(&self) -> Option<String> {
        self.solana_key.lock().clone()
    }

    async fn balances(&self, _address: &str) -> Result<Vec<WalletToken>> {
        if self.balances_fail.load(Ordering::SeqCst) {
            return Err(SwapVoiceError::NetworkError("balance api down".into()));
        }
        Ok(self.balances.lock().clone())
    }
}

/// Engine whose routes and execution outcome the test controls
#[derive(Default)]
pub struct ManualEngine {
    pub fields: Mutex<Vec<(FormField, FieldValue)>>,
    pub subscribers: RouteSubscribers,
    pub execute_error: Mutex<Option<String>>,
    pub executed: AtomicUsize,
}

impl ManualEngine {
    pub fn field(&self, field: FormField) -> Option<FieldValue> {
        self.fields
            .lock()
            .iter()
            .rev()
            .find(|(f, _)| *f == field)
            .map(|(_, v)| v.clone())
    }

    pub fn publish(&self, event: RouteEvent) {
        self.subscribers.publish(event);
    }
}

#[async_trait]
impl RoutingEngine for ManualEngine {
    async fn set_field(&self, field: FormField, value: FieldValue) -> Result<()> {
        self.fields.lock().push((field, value));
        Ok(())
    }

    fn subscribe(&self, tx: Sender<RouteEvent>) -> SubscriptionId {
        self.subscribers.add(tx)
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.subscribers.remove(id);
    }

    async fn execute(&self, route: &Route) -> Result<Route> {
        self.executed.fetch_add(1, Ordering::SeqCst);
        match self.execute_error.lock().clone() {
            Some(error) => Err(SwapVoiceError::ExecutionError(error)),
            None => Ok(route.clone()),
        }
    }
}

#[derive(Default)]
pub struct MockEns {
    names: Mutex<HashMap<String, Option<String>>>,
    pub fail: AtomicBool,
}

impl MockEns {
    pub fn with_defaults() -> Self {
        let ens = Self::default();
        ens.names
            .lock()
            .insert("vitalik.eth".to_string(), Some(VITALIK.to_string()));
        ens.names.lock().insert("empty.eth".to_string(), None);
        ens
    }
}

#[async_trait]
impl EnsResolver for MockEns {
    async fn resolve(&self, name: &str) -> Result<Option<String>> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(SwapVoiceError::NetworkError("ens api down".into()));
        }
        Ok(self.names.lock().get(name).cloned().flatten())
    }
}

/// All mocks plus the collaborator set built from them
pub struct Harness {
    pub recorder: Arc<ScriptedRecorder>,
    pub transcriber: Arc<ScriptedTranscriber>,
    pub extractor: Arc<ScriptedExtractor>,
    pub tokens: Arc<MapTokenResolver>,
    pub engine: Arc<ManualEngine>,
    pub wallet: Arc<MockWallet>,
    pub speaker: Arc<RecordingSpeaker>,
    pub ens: Arc<MockEns>,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            recorder: Arc::new(ScriptedRecorder::default()),
            transcriber: Arc::new(ScriptedTranscriber::default()),
            extractor: Arc::new(ScriptedExtractor::default()),
            tokens: Arc::new(MapTokenResolver::with_defaults()),
            engine: Arc::new(ManualEngine::default()),
            wallet: Arc::new(MockWallet::default()),
            speaker: Arc::new(RecordingSpeaker::default()),
            ens: Arc::new(MockEns::with_defaults()),
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            recorder: self.recorder.clone(),
            transcriber: self.transcriber.clone(),
            extractor: self.extractor.clone(),
            tokens: self.tokens.clone(),
            engine: self.engine.clone(),
            wallet: self.wallet.clone(),
            speaker: self.speaker.clone(),
            ens: self.ens.clone(),
        }
    }

    /// Text-only session: no voice yes/no capture
    pub fn controller(&self) -> DialogueController {
        DialogueController::new(test_config().with_voice_confirm(false), self.collaborators())
    }

    pub fn voice_controller(&self) -> DialogueController {
        DialogueController::new(test_config(), self.collaborators())
    }
}

pub fn test_config() -> SessionConfig {
    SessionConfig::new()
        .with_confirm_window_ms(1)
        .with_network_switch_wait_ms(50)
}

/// Mark a USDT -> ETH order on base as handed to the routing engine
pub fn order_applied(state: &SharedDialogueState) {
    state.write().last_applied = Some(AppliedOrder {
        from_chain_id: 8453,
        to_chain_id: 8453,
        from_symbol: "USDT".to_string(),
        to_symbol: "ETH".to_string(),
        amount: 100.0,
        source_chain_name: "base".to_string(),
        target_chain_name: "base".to_string(),
    });
}

/// A route as the engine would report it
pub fn route(id: &str, from_chain: u64, to_chain: u64, from: &str, to: &str, dex: Option<&str>) -> Route {
    let steps = match dex {
        Some(name) => serde_json::json!([{
            "type": "swap",
            "tool": name.to_lowercase(),
            "toolDetails": {"name": name}
        }]),
        None => serde_json::json!([]),
    };
    serde_json::from_value(serde_json::json!({
        "id": id,
        "fromChainId": from_chain,
        "toChainId": to_chain,
        "fromToken": {"symbol": from, "name": from, "address": "0x1", "decimals": 6},
        "toToken": {"symbol": to, "name": to, "address": "0x2", "decimals": 18},
        "fromAmount": "100000000",
        "toAmount": "40000000000000000",
        "fromAmountUSD": "100.00",
        "steps": steps
    }))
    .unwrap()
}
