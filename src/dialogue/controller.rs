//! Dialogue controller
//!
//! Drives one voice session: turns utterances into an order, asks for what
//! is missing, confirms the resolved proposal, hands it to the routing engine
//! and walks the user through recipient checks and execution.
//!
//! Every failure ends in a spoken message and a return to `Idle`; nothing
//! here is fatal to the session.

use super::confirm::{classify_reply, ReplyKind};
use super::proposal::{Proposal, SAME_TOKEN_MESSAGE};
use super::queries::{
    extract_token_from_query, holdings_summary, is_specific_token_query,
    is_wallet_holdings_query, token_balance_message, top_holdings, ASK_WHICH_TOKEN,
    CONNECT_FOR_BALANCE, CONNECT_FOR_HOLDINGS, HOLDINGS_FAILED, HOLDINGS_INTRO,
};
use super::recipient::{is_valid_ens, is_valid_solana_address, normalize_spelled_ens};
use super::state::{ExecStatus, RecipientRequirement, SessionStatus, SharedDialogueState};
use crate::audio::{AudioClip, Recorder};
use crate::config::SessionConfig;
use crate::gateway::{
    dex_name, EnsResolver, FieldValue, FormField, IntentExtractor, ResolutionGateway, Route,
    RouteEvent, RoutingEngine, SubscriptionId, TokenResolver,
};
use crate::history::{TxHistory, TxStatus};
use crate::intent::{
    chain_id, chain_name, extract_local_intent, is_solana, normalize_chain_alias, normalize_token_symbol,
    Intent, PartialIntent,
};
use crate::metrics::{PhaseTimer, TurnMetrics};
use crate::speech::{Speaker, Transcriber};
use crate::wallet::{ensure_chain, Wallet};
use crate::{Result, SwapVoiceError};
use crossbeam_channel::Sender;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

const ASK_SOURCE_CHAIN: &str = "On which source chain should I look?";
const ASK_DESTINATION_CHAIN: &str = "On which destination chain should I send it?";
const RESOLVE_FAILED: &str = "I could not resolve the tokens. Please try again.";
const NETWORK_OFFLINE: &str = "Network looks offline. Please check your connection and try again.";
const GENERIC_FAILURE: &str = "Something went wrong understanding your request.";
const PROPOSAL_CONFIRMED: &str = "Confirmed. Finding the best route for your swap now.";
const PROPOSAL_CANCELLED: &str = "Okay. What would you like to change?";
const SAY_YES_OR_NO: &str = "Please say yes or no.";

const CONNECT_SOLANA_TO_PROCEED: &str = "Please connect a Solana wallet to proceed.";
const SOLANA_DESTINATION: &str = "Destination is Solana. Connect a wallet or paste a Solana address.";
const ENS_OFFER: &str = "Do you want to send to an ENS name? You can type or spell it.";
const EXECUTE_PROMPT: &str = "Should I execute the swap?";

const NO_SOLANA_WALLET: &str =
    "No Solana wallet detected. Please install Phantom or connect in the widget.";
const CONNECT_SOLANA_WALLET: &str = "Please connect your Solana wallet to continue.";
const SOLANA_CONNECT_CANCELLED: &str = "Solana wallet connection was cancelled.";
const NO_EVM_WALLET: &str =
    "No EVM wallet detected. Please use the widget to connect your wallet and try again.";
const CONNECT_EVM_WALLET: &str = "Please connect your wallet using the widget and try again.";
const SWITCH_NETWORK: &str = "Please switch your wallet network to the source chain and try again.";
const PROVIDE_SOLANA_ADDRESS: &str = "Please provide a Solana address to receive funds.";
const SWAP_SUCCEEDED: &str = "Swap executed successfully.";
const EXECUTION_IN_PROGRESS: &str = "Execution is already in progress.";
const EXECUTION_DECLINED: &str = "Okay, I will not execute the swap.";

const INVALID_ENS: &str = "Please enter a valid .eth name.";
const ASK_ENS_NAME: &str = "Please type or spell the ENS name.";
const ENS_NOT_FOUND: &str = "ENS name not found or has no address.";
const ENS_FAILED: &str = "Failed to resolve ENS.";
const ENS_SET: &str = "ENS recipient set. Proceeding to execute.";

const INVALID_SOLANA_ADDRESS: &str = "Enter a valid Solana address.";
const SOLANA_RECIPIENT_SET: &str = "Solana recipient set. Proceeding to execute.";
const SOLANA_CONNECTED: &str = "Solana wallet connected. You can proceed.";
const SOLANA_SKIPPED_DESTINATION: &str =
    "You can add a Solana address later in the widget. I will not execute now.";
const SOLANA_SKIPPED_SOURCE: &str = "Connect a Solana wallet in the widget to continue.";

/// Map an execution failure onto one of three spoken messages
pub fn execution_failure_message(error: &str) -> &'static str {
    let lowered = error.to_lowercase();
    if lowered.contains("not connected") {
        "Please connect your wallet to execute the swap."
    } else if lowered.contains("user rejected") {
        "Transaction rejected in wallet."
    } else {
        "Execution failed. Please try again."
    }
}

fn resolution_failure_message(error: &SwapVoiceError) -> &'static str {
    match error {
        SwapVoiceError::NetworkError(_) => NETWORK_OFFLINE,
        SwapVoiceError::ResolutionError(_) => RESOLVE_FAILED,
        _ => GENERIC_FAILURE,
    }
}

/// Which pending object a yes/no answers
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfirmTarget {
    Proposal,
    Execution,
}

/// Everything the controller talks to
#[derive(Clone)]
pub struct Collaborators {
    pub recorder: Arc<dyn Recorder>,
    pub transcriber: Arc<dyn Transcriber>,
    pub extractor: Arc<dyn IntentExtractor>,
    pub tokens: Arc<dyn TokenResolver>,
    pub engine: Arc<dyn RoutingEngine>,
    pub wallet: Arc<dyn Wallet>,
    pub speaker: Arc<dyn Speaker>,
    pub ens: Arc<dyn EnsResolver>,
}

pub struct DialogueController {
    config: SessionConfig,
    state: SharedDialogueState,
    history: TxHistory,
    gateway: ResolutionGateway,
    recorder: Arc<dyn Recorder>,
    transcriber: Arc<dyn Transcriber>,
    extractor: Arc<dyn IntentExtractor>,
    engine: Arc<dyn RoutingEngine>,
    wallet: Arc<dyn Wallet>,
    speaker: Arc<dyn Speaker>,
    ens: Arc<dyn EnsResolver>,
    subscription: Option<SubscriptionId>,
}

impl DialogueController {
    pub fn new(config: SessionConfig, collaborators: Collaborators) -> Self {
        Self::with_state(config, collaborators, SharedDialogueState::new())
    }

    pub fn with_state(
        config: SessionConfig,
        collaborators: Collaborators,
        state: SharedDialogueState,
    ) -> Self {
        Self {
            gateway: ResolutionGateway::new(collaborators.tokens, config.token_cache_max),
            history: TxHistory::new(config.history_max),
            recorder: collaborators.recorder,
            transcriber: collaborators.transcriber,
            extractor: collaborators.extractor,
            engine: collaborators.engine,
            wallet: collaborators.wallet,
            speaker: collaborators.speaker,
            ens: collaborators.ens,
            subscription: None,
            config,
            state,
        }
    }

    pub fn state(&self) -> &SharedDialogueState {
        &self.state
    }

    pub fn history(&self) -> &TxHistory {
        &self.history
    }

    pub fn gateway(&self) -> &ResolutionGateway {
        &self.gateway
    }

    /// Register for route events; one subscription per session
    pub fn subscribe_routes(&mut self, tx: Sender<RouteEvent>) -> SubscriptionId {
        if let Some(id) = self.subscription {
            warn!("Route events already subscribed ({})", id);
            return id;
        }
        let id = self.engine.subscribe(tx);
        info!("Subscribed to route events ({})", id);
        self.subscription = Some(id);
        id
    }

    /// Drop the route subscription and silence any speech
    pub fn teardown(&mut self) {
        if let Some(id) = self.subscription.take() {
            self.engine.unsubscribe(id);
            info!("Unsubscribed from route events ({})", id);
        }
        self.speaker.cancel();
    }

    fn say(&self, text: impl Into<String>) {
        let text = text.into();
        debug!("Assistant: {}", text);
        self.state.write().last_spoken = Some(text.clone());
        self.speaker.speak(&text);
    }

    // === Turns ===

    /// Begin push-to-talk capture. `Ok(false)` when a turn is in progress.
    pub async fn start_recording(&self) -> Result<bool> {
        {
            let mut state = self.state.write();
            if state.status.is_busy() {
                warn!("Cannot start recording while {}", state.status);
                return Ok(false);
            }
            state.status = SessionStatus::Listening;
            state.clear_error();
        }

        if let Err(e) = self.recorder.start().await {
            error!("Failed to start recording: {}", e);
            let mut state = self.state.write();
            state.status = SessionStatus::Idle;
            state.set_error(e.to_string());
            return Err(e);
        }
        Ok(true)
    }

    /// End capture, transcribe, and run the turn
    pub async fn stop_and_process(&self) -> Result<()> {
        if !self.state.status().is_listening() {
            warn!("Not recording, nothing to process");
            return Ok(());
        }
        self.state.set_status(SessionStatus::Processing);

        let clip = match self.recorder.stop().await {
            Ok(clip) => clip,
            Err(e) => {
                error!("Failed to stop recording: {}", e);
                let mut state = self.state.write();
                state.status = SessionStatus::Idle;
                state.set_error(e.to_string());
                return Err(e);
            }
        };

        let timer = PhaseTimer::start();
        let text = self.transcribe(&clip).await;
        let mut turn = TurnMetrics {
            transcription_ms: Some(timer.elapsed_ms()),
            ..TurnMetrics::default()
        };

        self.run_turn(&text, &mut turn).await;
        self.finish_turn(turn);
        Ok(())
    }

    /// Run a typed utterance as a turn
    pub async fn submit_text(&self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        {
            let mut state = self.state.write();
            if state.status.is_busy() {
                warn!("Ignoring text while {}", state.status);
                return;
            }
            state.status = SessionStatus::Processing;
        }

        let mut turn = TurnMetrics::default();
        self.run_turn(text, &mut turn).await;
        self.finish_turn(turn);
    }

    /// Typed answer to whatever is open
    ///
    /// A pending proposal comes first, then an open recipient prompt, then
    /// the execution yes/no. With nothing open the text runs as a turn.
    pub async fn reply(&self, text: &str) {
        let (proposal, recipient, route) = {
            let state = self.state.read();
            (
                state.proposal.is_some(),
                state.recipient,
                state.exec_proposal.is_some(),
            )
        };

        if proposal {
            info!("Reply to proposal: {}", text);
            self.apply_reply(ConfirmTarget::Proposal, text).await;
        } else if let Some(requirement) = recipient {
            info!("Reply to {} prompt: {}", requirement, text);
            self.answer_recipient(requirement, text).await;
        } else if route {
            info!("Reply to execution: {}", text);
            self.apply_reply(ConfirmTarget::Execution, text).await;
        } else {
            self.submit_text(text).await;
        }
    }

    async fn answer_recipient(&self, requirement: RecipientRequirement, text: &str) {
        let kind = classify_reply(text);
        match requirement {
            RecipientRequirement::EnsOffer => match kind {
                ReplyKind::Negative => self.skip_ens().await,
                ReplyKind::Affirmative => self.say(ASK_ENS_NAME),
                ReplyKind::Unclear => self.confirm_ens(text).await,
            },
            RecipientRequirement::SolanaDestination => match kind {
                ReplyKind::Negative => self.skip_solana(),
                ReplyKind::Affirmative => self.confirm_solana_recipient(None).await,
                ReplyKind::Unclear => {
                    self.confirm_solana_recipient(Some(text.to_string())).await
                }
            },
            RecipientRequirement::SolanaSource => match kind {
                ReplyKind::Negative => self.skip_solana(),
                _ => self.confirm_solana_recipient(None).await,
            },
        }
    }

    async fn transcribe(&self, clip: &AudioClip) -> String {
        match self.transcriber.transcribe(clip, &self.config.language).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Transcription failed, continuing with empty text: {}", e);
                String::new()
            }
        }
    }

    fn finish_turn(&self, turn: TurnMetrics) {
        debug!("Turn timings: {}", turn.summary());
        let mut state = self.state.write();
        state.metrics.finish_turn(turn);
        state.status = SessionStatus::Idle;
    }

    async fn run_turn(&self, text: &str, turn: &mut TurnMetrics) {
        info!("Utterance: {}", text);
        self.state.write().transcript = Some(text.to_string());

        if is_specific_token_query(text) {
            match extract_token_from_query(text) {
                Some(symbol) => self.report_token_balance(&symbol).await,
                None => self.say(ASK_WHICH_TOKEN),
            }
            return;
        }

        if is_wallet_holdings_query(text) {
            self.report_holdings().await;
            return;
        }

        let timer = PhaseTimer::start();
        let (local, remote) = tokio::join!(
            async { extract_local_intent(text) },
            self.extractor.extract(text)
        );
        turn.extraction_ms = Some(timer.elapsed_ms());

        let remote = match remote {
            Ok(partial) => partial.normalized(),
            Err(e) => {
                warn!("Remote intent extraction failed, using local only: {}", e);
                PartialIntent::default()
            }
        };

        let merged = {
            let mut state = self.state.write();
            let mut merged = Intent::merge(&state.intent, &remote, &local);
            if merged.infer_bridge_target() {
                debug!("Cross-chain order without target token, bridging source token");
            }
            state.intent = merged.clone();
            merged
        };
        debug!("Merged intent: {:?}", merged);

        if merged.is_complete() {
            self.propose(&merged, turn).await;
        } else if let Some(field) = merged.next_question() {
            debug!("Asking for {}", field);
            self.say(field.question());
        }
    }

    async fn propose(&self, intent: &Intent, turn: &mut TurnMetrics) {
        let (
            Some(source_token),
            Some(target_token),
            Some(amount),
            Some(source_chain),
            Some(target_chain),
        ) = (
            intent.source_token.as_deref(),
            intent.target_token.as_deref(),
            intent.amount,
            intent.source_chain.as_deref(),
            intent.target_chain.as_deref(),
        )
        else {
            return;
        };

        let source_chain_name = normalize_chain_alias(source_chain);
        let target_chain_name = normalize_chain_alias(target_chain);
        let from_symbol = normalize_token_symbol(source_token);
        let to_symbol = normalize_token_symbol(target_token);

        let Some(from_chain_id) = chain_id(&source_chain_name) else {
            self.say(ASK_SOURCE_CHAIN);
            return;
        };
        let to_chain_id = chain_id(&target_chain_name);

        let timer = PhaseTimer::start();
        let resolved = self
            .gateway
            .resolve_pair(from_chain_id, &from_symbol, to_chain_id, &to_symbol)
            .await;
        turn.resolution_ms = Some(timer.elapsed_ms());

        let (from_token, to_token) = match resolved {
            Ok(pair) => pair,
            Err(e) => {
                warn!("Token resolution failed: {}", e);
                self.say(resolution_failure_message(&e));
                return;
            }
        };
        let Some(from_token) = from_token else {
            self.say(RESOLVE_FAILED);
            return;
        };
        let Some(to_chain_id) = to_chain_id else {
            self.say(ASK_DESTINATION_CHAIN);
            return;
        };
        let Some(to_token) = to_token else {
            self.say(RESOLVE_FAILED);
            return;
        };

        let proposal = Proposal {
            from_chain_id,
            to_chain_id,
            from_symbol,
            to_symbol,
            amount,
            source_chain_name,
            target_chain_name,
            from_token_address: from_token.address,
            to_token_address: to_token.address,
        };
        let message = proposal.message();
        info!("Proposal ready: {}", message);
        self.state.write().proposal = Some(proposal);
        self.say(message);

        if self.config.voice_confirm {
            self.listen_for_yes_no(ConfirmTarget::Proposal).await;
        }
    }

    // === Yes/no ===

    /// Record one confirm window and return what was said
    async fn capture_window(&self) -> Option<String> {
        if let Err(e) = self.recorder.start().await {
            warn!("Confirmation capture unavailable: {}", e);
            return None;
        }
        tokio::time::sleep(self.config.confirm_window()).await;
        match self.recorder.stop().await {
            Ok(clip) => Some(self.transcribe(&clip).await),
            Err(e) => {
                warn!("Confirmation capture failed: {}", e);
                None
            }
        }
    }

    /// Capture a spoken yes/no for the pending proposal or route
    pub async fn listen_for_yes_no(&self, target: ConfirmTarget) {
        let pending = {
            let state = self.state.read();
            match target {
                ConfirmTarget::Proposal => state.proposal.is_some(),
                ConfirmTarget::Execution => state.exec_proposal.is_some(),
            }
        };
        if !pending {
            return;
        }

        let previous = self.state.status();
        self.state.set_status(SessionStatus::Listening);
        let heard = self.capture_window().await;
        self.state.set_status(SessionStatus::Processing);

        if let Some(text) = heard {
            debug!("Confirmation heard: {:?}", text);
            self.apply_reply(target, &text).await;
        }

        let mut state = self.state.write();
        if !state.status.is_idle() {
            state.status = previous;
        }
    }

    async fn apply_reply(&self, target: ConfirmTarget, text: &str) {
        match (classify_reply(text), target) {
            (ReplyKind::Affirmative, ConfirmTarget::Proposal) => self.confirm_proposal().await,
            (ReplyKind::Negative, ConfirmTarget::Proposal) => self.cancel_proposal(),
            (ReplyKind::Affirmative, ConfirmTarget::Execution) => self.confirm_execution().await,
            (ReplyKind::Negative, ConfirmTarget::Execution) => self.cancel_execution(),
            (ReplyKind::Unclear, _) => self.say(SAY_YES_OR_NO),
        }
    }

    // === Proposal ===

    /// Push the pending proposal into the routing engine
    pub async fn confirm_proposal(&self) {
        let Some(proposal) = self.state.proposal() else {
            debug!("No proposal to confirm");
            return;
        };

        if proposal.is_degenerate() {
            warn!(
                "Refusing same-token proposal on chain {}",
                proposal.from_chain_id
            );
            self.say(SAME_TOKEN_MESSAGE);
            return;
        }

        let fields = [
            (FormField::FromChain, FieldValue::ChainId(proposal.from_chain_id)),
            (
                FormField::FromToken,
                FieldValue::Text(proposal.from_token_address.clone()),
            ),
            (FormField::FromAmount, FieldValue::Text(proposal.amount.to_string())),
            (FormField::ToChain, FieldValue::ChainId(proposal.to_chain_id)),
            (
                FormField::ToToken,
                FieldValue::Text(proposal.to_token_address.clone()),
            ),
        ];
        for (field, value) in fields {
            if let Err(e) = self.engine.set_field(field, value).await {
                error!("Failed to set {}: {}", field.key(), e);
                self.state.write().set_error(e.to_string());
                self.say(e.user_message());
                return;
            }
        }

        {
            let mut state = self.state.write();
            state.last_applied = Some(proposal.applied());
            state.proposal = None;
            state.sol_recipient_set = false;
            state.recipient_address = None;
        }
        info!(
            "Applied order: {} {} on {} -> {} on {}",
            proposal.amount,
            proposal.from_symbol,
            proposal.from_chain_id,
            proposal.to_symbol,
            proposal.to_chain_id
        );
        self.say(PROPOSAL_CONFIRMED);
    }

    pub fn cancel_proposal(&self) {
        self.state.write().proposal = None;
        self.say(PROPOSAL_CANCELLED);
    }

    /// Forget the collected order
    pub fn reset_intent(&self) {
        let mut state = self.state.write();
        state.intent.clear();
        state.proposal = None;
        info!("Intent reset");
    }

    // === Routes ===

    pub async fn on_route_event(&self, event: RouteEvent) {
        match event {
            RouteEvent::RoutesAvailable(routes) => {
                debug!("{} route(s) available", routes.len());
                if let Some(best) = routes.into_iter().next() {
                    self.on_best_route(best).await;
                }
            }
            RouteEvent::RouteSelected(route) => self.on_best_route(route).await,
            RouteEvent::ExecutionUpdated(route) => {
                debug!("Execution progress on route {}", route.id);
            }
            RouteEvent::ExecutionCompleted(route) => {
                let record = self.history.record(&route, TxStatus::Completed);
                info!(
                    "Recorded completed swap {} -> {} ({})",
                    record.from_symbol, record.to_symbol, record.route_id
                );
            }
            RouteEvent::ExecutionFailed { route, error } => {
                warn!("Execution of route {} failed: {}", route.id, error);
                self.history.record(&route, TxStatus::Failed);
            }
        }
    }

    /// Announce a newly found best route, once per route id
    ///
    /// Routes that arrive before any order was applied are kept for display
    /// but not announced.
    async fn on_best_route(&self, route: Route) {
        info!(
            "Best route {} ({} -> {}): {} {}",
            route.id,
            chain_name(route.from_chain_id).unwrap_or("unknown"),
            chain_name(route.to_chain_id).unwrap_or("unknown"),
            route.summary(),
            route.meta()
        );
        let skip = {
            let mut state = self.state.write();
            state.best_route = Some(route.clone());
            state.last_applied.is_none()
                || state.exec_proposal.is_some()
                || state.exec_status.is_executing()
                || state.last_prompted_route.as_deref() == Some(route.id.as_str())
        };
        if skip {
            debug!("Not prompting for route {}", route.id);
            return;
        }

        let dex = dex_name(&route).unwrap_or_else(|| "the best available route".to_string());
        let symbol = |s: &str| {
            if s.is_empty() {
                "token".to_string()
            } else {
                s.to_string()
            }
        };
        let message = format!(
            "I found the best route via {}. Swap {} to {}.",
            dex,
            symbol(&route.from_token.symbol),
            symbol(&route.to_token.symbol)
        );

        let (sol_recipient_set, ens_offered) = {
            let mut state = self.state.write();
            state.exec_proposal = Some(route.clone());
            state.exec_status = ExecStatus::Idle;
            state.exec_error = None;
            state.last_prompted_route = Some(route.id.clone());
            (
                state.sol_recipient_set,
                state.last_ens_route.as_deref() == Some(route.id.as_str()),
            )
        };
        self.say(message);

        if is_solana(route.from_chain_id) {
            self.state.write().recipient = Some(RecipientRequirement::SolanaSource);
            self.say(CONNECT_SOLANA_TO_PROCEED);
            return;
        }

        if is_solana(route.to_chain_id) {
            if !sol_recipient_set {
                self.state.write().recipient = Some(RecipientRequirement::SolanaDestination);
                self.say(SOLANA_DESTINATION);
                return;
            }
        } else if !ens_offered {
            {
                let mut state = self.state.write();
                state.last_ens_route = Some(route.id.clone());
                state.recipient = Some(RecipientRequirement::EnsOffer);
            }
            self.say(ENS_OFFER);
            return;
        }

        if self.config.voice_confirm {
            self.listen_for_yes_no(ConfirmTarget::Execution).await;
        }
    }

    // === Execution ===

    /// Check wallets and execute the pending route
    pub async fn confirm_execution(&self) {
        let (route, executing) = {
            let state = self.state.read();
            (state.exec_proposal.clone(), state.exec_status.is_executing())
        };
        let Some(route) = route else {
            debug!("No route to execute");
            return;
        };
        if executing {
            self.say(EXECUTION_IN_PROGRESS);
            return;
        }
        let dex = dex_name(&route).unwrap_or_else(|| "the selected route".to_string());

        if is_solana(route.from_chain_id) {
            if !self.prepare_solana_source().await {
                return;
            }
        } else if !self.prepare_evm_wallet(route.from_chain_id).await {
            return;
        }

        if is_solana(route.to_chain_id) && !self.state.read().sol_recipient_set {
            match self.wallet.solana_public_key() {
                Some(key) => {
                    if !self.write_recipient(key).await {
                        return;
                    }
                    self.state.write().sol_recipient_set = true;
                }
                None => {
                    self.state.write().recipient = Some(RecipientRequirement::SolanaDestination);
                    self.say(PROVIDE_SOLANA_ADDRESS);
                    return;
                }
            }
        }

        self.say(format!(
            "Starting the swap via {}. Please confirm the transaction in your wallet.",
            dex
        ));
        {
            let mut state = self.state.write();
            state.exec_status = ExecStatus::Executing;
            state.exec_error = None;
            state.recipient = None;
            state.status = SessionStatus::Executing;
        }
        info!("Executing route {}", route.id);

        match self.engine.execute(&route).await {
            Ok(finished) => {
                info!("Route {} executed", finished.id);
                {
                    let mut state = self.state.write();
                    state.exec_status = ExecStatus::Succeeded;
                    state.clear_execution();
                    state.best_route = Some(finished);
                    state.status = SessionStatus::Idle;
                }
                self.say(SWAP_SUCCEEDED);
            }
            Err(e) => {
                error!("Route execution failed: {}", e);
                {
                    let mut state = self.state.write();
                    state.exec_status = ExecStatus::Failed;
                    state.exec_error = Some(e.to_string());
                    state.status = SessionStatus::Idle;
                }
                self.say(execution_failure_message(&e.to_string()));
            }
        }
    }

    /// Solana source: the provider must be present and connect
    async fn prepare_solana_source(&self) -> bool {
        if !self.wallet.solana_available() {
            self.state.write().recipient = Some(RecipientRequirement::SolanaSource);
            self.say(NO_SOLANA_WALLET);
            return false;
        }
        match self.wallet.solana_connect().await {
            Ok(Some(key)) => {
                debug!("Solana wallet {} connected", key);
                true
            }
            Ok(None) => {
                self.state.write().recipient = Some(RecipientRequirement::SolanaSource);
                self.say(CONNECT_SOLANA_WALLET);
                false
            }
            Err(e) => {
                warn!("Solana connect failed: {}", e);
                self.state.write().recipient = Some(RecipientRequirement::SolanaSource);
                self.say(SOLANA_CONNECT_CANCELLED);
                false
            }
        }
    }

    /// EVM source: provider, account and network checks
    ///
    /// Provider errors during the checks are logged and do not block
    /// execution; only a definite answer (no provider, no account, switch
    /// refused) does.
    async fn prepare_evm_wallet(&self, source_chain: u64) -> bool {
        if !self.wallet.evm_available() {
            self.say(NO_EVM_WALLET);
            return false;
        }

        match self.wallet.evm_accounts().await {
            Ok(accounts) if accounts.is_empty() => {
                self.say(CONNECT_EVM_WALLET);
                return false;
            }
            Ok(_) => {}
            Err(e) => {
                warn!("Wallet pre-check failed: {}", e);
                return true;
            }
        }

        let wait = self.config.network_switch_wait();
        match ensure_chain(self.wallet.as_ref(), source_chain, wait).await {
            Ok(true) => true,
            Ok(false) => {
                self.say(SWITCH_NETWORK);
                false
            }
            Err(e) => {
                warn!("Wallet pre-check failed: {}", e);
                true
            }
        }
    }

    /// Drop the pending route; a route already executing is left alone
    pub fn cancel_execution(&self) {
        let executing = {
            let mut state = self.state.write();
            let executing = state.exec_status.is_executing();
            if !executing {
                state.clear_execution();
            }
            executing
        };
        self.say(if executing {
            EXECUTION_IN_PROGRESS
        } else {
            EXECUTION_DECLINED
        });
    }

    // === Recipients ===

    async fn write_recipient(&self, address: String) -> bool {
        match self
            .engine
            .set_field(FormField::ToAddress, FieldValue::Text(address.clone()))
            .await
        {
            Ok(()) => {
                self.state.write().recipient_address = Some(address);
                true
            }
            Err(e) => {
                error!("Failed to set recipient: {}", e);
                self.say(e.user_message());
                false
            }
        }
    }

    /// Send to an ENS name, then continue to execution
    pub async fn confirm_ens(&self, name: &str) {
        if self.state.recipient() != Some(RecipientRequirement::EnsOffer) {
            debug!("No ENS prompt open");
            return;
        }

        let name = name.trim().to_lowercase();
        if !is_valid_ens(&name) {
            self.say(INVALID_ENS);
            return;
        }

        match self.ens.resolve(&name).await {
            Ok(Some(address)) => {
                info!("{} resolved to {}", name, address);
                if !self.write_recipient(address).await {
                    return;
                }
                {
                    let mut state = self.state.write();
                    state.recipient = None;
                    state.ens_draft = None;
                }
                self.say(ENS_SET);
                self.confirm_execution().await;
            }
            Ok(None) => self.say(ENS_NOT_FOUND),
            Err(e) => {
                warn!("ENS lookup for {} failed: {}", name, e);
                self.say(ENS_FAILED);
            }
        }
    }

    /// Capture a spelled name and keep it as the ENS draft
    pub async fn spell_ens_by_voice(&self) -> Option<String> {
        let previous = self.state.status();
        self.state.set_status(SessionStatus::Listening);
        let heard = self.capture_window().await;
        self.state.set_status(previous);

        let normalized = normalize_spelled_ens(&heard?);
        if normalized.is_empty() {
            return None;
        }
        debug!("Spelled ENS name: {}", normalized);
        self.state.write().ens_draft = Some(normalized.clone());
        Some(normalized)
    }

    /// Decline the ENS offer and go to the execution yes/no
    pub async fn skip_ens(&self) {
        {
            let mut state = self.state.write();
            if state.recipient != Some(RecipientRequirement::EnsOffer) {
                return;
            }
            state.recipient = None;
            state.ens_draft = None;
        }
        self.say(EXECUTE_PROMPT);
        if self.config.voice_confirm {
            self.listen_for_yes_no(ConfirmTarget::Execution).await;
        }
    }

    /// Answer the open Solana prompt
    ///
    /// Destination mode takes an address, falling back to the connected
    /// Solana wallet; source mode connects the wallet.
    pub async fn confirm_solana_recipient(&self, address: Option<String>) {
        match self.state.recipient() {
            Some(RecipientRequirement::SolanaDestination) => {
                self.confirm_solana_destination(address).await
            }
            Some(RecipientRequirement::SolanaSource) => self.confirm_solana_source().await,
            _ => debug!("No Solana prompt open"),
        }
    }

    async fn confirm_solana_destination(&self, address: Option<String>) {
        let typed = address
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty());
        let address = match typed {
            Some(address) => address,
            None => match self.wallet.solana_connect().await {
                Ok(Some(key)) => key,
                Ok(None) => {
                    self.say(PROVIDE_SOLANA_ADDRESS);
                    return;
                }
                Err(e) => {
                    warn!("Solana connect failed: {}", e);
                    self.say(PROVIDE_SOLANA_ADDRESS);
                    return;
                }
            },
        };

        if !is_valid_solana_address(&address) {
            self.say(INVALID_SOLANA_ADDRESS);
            return;
        }
        if !self.write_recipient(address).await {
            return;
        }
        {
            let mut state = self.state.write();
            state.sol_recipient_set = true;
            state.recipient = None;
        }
        self.say(SOLANA_RECIPIENT_SET);
        self.confirm_execution().await;
    }

    async fn confirm_solana_source(&self) {
        match self.wallet.solana_connect().await {
            Ok(Some(key)) => {
                debug!("Solana wallet {} connected", key);
                self.state.write().recipient = None;
                self.say(SOLANA_CONNECTED);
                if self.config.voice_confirm {
                    self.listen_for_yes_no(ConfirmTarget::Execution).await;
                }
            }
            Ok(None) => self.say(CONNECT_SOLANA_WALLET),
            Err(e) => {
                warn!("Solana connect failed: {}", e);
                self.say(SOLANA_CONNECT_CANCELLED);
            }
        }
    }

    pub fn skip_solana(&self) {
        let mode = {
            let mut state = self.state.write();
            let mode = state.recipient;
            if matches!(
                mode,
                Some(RecipientRequirement::SolanaSource | RecipientRequirement::SolanaDestination)
            ) {
                state.recipient = None;
            }
            mode
        };
        match mode {
            Some(RecipientRequirement::SolanaDestination) => self.say(SOLANA_SKIPPED_DESTINATION),
            Some(RecipientRequirement::SolanaSource) => self.say(SOLANA_SKIPPED_SOURCE),
            _ => debug!("No Solana prompt open"),
        }
    }

    // === Wallet queries ===

    async fn connected_account(&self) -> Option<String> {
        if !self.wallet.evm_available() {
            return None;
        }
        match self.wallet.evm_accounts().await {
            Ok(accounts) => accounts.into_iter().next(),
            Err(e) => {
                warn!("Failed to read wallet accounts: {}", e);
                None
            }
        }
    }

    async fn report_holdings(&self) {
        let Some(account) = self.connected_account().await else {
            self.say(CONNECT_FOR_HOLDINGS);
            return;
        };
        self.say(HOLDINGS_INTRO);

        match self.wallet.balances(&account).await {
            Ok(balances) => {
                let top = top_holdings(balances);
                let summary = holdings_summary(&top);
                self.state.write().holdings = Some(top);
                self.say(summary);
            }
            Err(e) => {
                warn!("Failed to fetch wallet balances: {}", e);
                self.state.write().holdings = None;
                self.say(HOLDINGS_FAILED);
            }
        }
    }

    async fn report_token_balance(&self, symbol: &str) {
        let Some(account) = self.connected_account().await else {
            self.say(CONNECT_FOR_BALANCE);
            return;
        };
        self.say(format!("Checking your {} balance...", symbol));

        match self.wallet.balances(&account).await {
            Ok(balances) => self.say(token_balance_message(symbol, &balances)),
            Err(e) => {
                warn!("Failed to get {} balance: {}", symbol, e);
                self.say(format!(
                    "Sorry, I couldn't check your {} balance. Please try again.",
                    symbol
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execution_failure_messages() {
        assert_eq!(
            execution_failure_message("Account is not connected"),
            "Please connect your wallet to execute the swap."
        );
        assert_eq!(
            execution_failure_message("User rejected the request."),
            "Transaction rejected in wallet."
        );
        assert_eq!(
            execution_failure_message("slippage too high"),
            "Execution failed. Please try again."
        );
    }

    #[test]
    fn test_resolution_failure_messages() {
        assert_eq!(
            resolution_failure_message(&SwapVoiceError::NetworkError("refused".into())),
            NETWORK_OFFLINE
        );
        assert_eq!(
            resolution_failure_message(&SwapVoiceError::ResolutionError("500".into())),
            RESOLVE_FAILED
        );
        assert_eq!(
            resolution_failure_message(&SwapVoiceError::IntentError("bad".into())),
            GENERIC_FAILURE
        );
    }
}
