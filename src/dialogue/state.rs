//! Session state shared between the dialogue thread and display code
//!
//! Only the dialogue controller writes; everything else reads snapshots.

use super::proposal::{AppliedOrder, Proposal};
use crate::gateway::Route;
use crate::intent::Intent;
use crate::metrics::SessionMetrics;
use crate::wallet::WalletToken;
use parking_lot::RwLock;
use std::sync::Arc;

/// Top-level dialogue status
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SessionStatus {
    #[default]
    Idle,
    /// Capturing audio
    Listening,
    /// Transcribing, extracting or resolving
    Processing,
    /// A route is being executed
    Executing,
}

impl SessionStatus {
    pub fn is_idle(&self) -> bool {
        matches!(self, SessionStatus::Idle)
    }

    pub fn is_listening(&self) -> bool {
        matches!(self, SessionStatus::Listening)
    }

    pub fn is_busy(&self) -> bool {
        !self.is_idle()
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionStatus::Idle => write!(f, "Idle"),
            SessionStatus::Listening => write!(f, "Listening"),
            SessionStatus::Processing => write!(f, "Processing"),
            SessionStatus::Executing => write!(f, "Executing"),
        }
    }
}

/// Execution progress of the current route
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExecStatus {
    #[default]
    Idle,
    Executing,
    Succeeded,
    Failed,
}

impl ExecStatus {
    pub fn is_executing(&self) -> bool {
        matches!(self, ExecStatus::Executing)
    }
}

/// Recipient question currently put to the user
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecipientRequirement {
    /// Route starts on Solana: a Solana wallet must be connected
    SolanaSource,
    /// Route ends on Solana: a receiving address is needed
    SolanaDestination,
    /// Optional ENS recipient for an EVM destination
    EnsOffer,
}

impl std::fmt::Display for RecipientRequirement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecipientRequirement::SolanaSource => write!(f, "Solana source wallet"),
            RecipientRequirement::SolanaDestination => write!(f, "Solana destination address"),
            RecipientRequirement::EnsOffer => write!(f, "ENS recipient"),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct DialogueState {
    pub status: SessionStatus,
    /// Order fields collected so far
    pub intent: Intent,
    pub proposal: Option<Proposal>,
    pub last_applied: Option<AppliedOrder>,
    /// Best route last reported by the engine
    pub best_route: Option<Route>,
    /// Route awaiting the execution yes/no
    pub exec_proposal: Option<Route>,
    pub exec_status: ExecStatus,
    pub exec_error: Option<String>,
    pub recipient: Option<RecipientRequirement>,
    pub recipient_address: Option<String>,
    pub sol_recipient_set: bool,
    /// Spelled ENS name waiting for confirmation
    pub ens_draft: Option<String>,
    pub last_prompted_route: Option<String>,
    pub last_ens_route: Option<String>,
    pub transcript: Option<String>,
    pub last_spoken: Option<String>,
    pub holdings: Option<Vec<WalletToken>>,
    pub error: Option<String>,
    pub metrics: SessionMetrics,
}

impl DialogueState {
    pub fn new() -> Self {
        Self::default()
    }

    /// A proposal or route is waiting on a yes/no
    pub fn has_pending_confirmation(&self) -> bool {
        self.proposal.is_some() || (self.exec_proposal.is_some() && self.recipient.is_none())
    }

    pub fn set_error(&mut self, error: String) {
        self.error = Some(error);
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Forget the current route and any recipient answers tied to it
    pub fn clear_execution(&mut self) {
        self.exec_proposal = None;
        self.recipient = None;
        self.ens_draft = None;
    }
}

#[derive(Clone, Default)]
pub struct SharedDialogueState {
    inner: Arc<RwLock<DialogueState>>,
}

impl SharedDialogueState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read(&self) -> parking_lot::RwLockReadGuard<'_, DialogueState> {
        self.inner.read()
    }

    pub fn write(&self) -> parking_lot::RwLockWriteGuard<'_, DialogueState> {
        self.inner.write()
    }

    /// Copy of the current state (no lock held after return)
    pub fn snapshot(&self) -> DialogueState {
        self.inner.read().clone()
    }

    pub fn status(&self) -> SessionStatus {
        self.inner.read().status
    }

    pub fn set_status(&self, status: SessionStatus) {
        self.inner.write().status = status;
    }

    pub fn is_idle(&self) -> bool {
        self.inner.read().status.is_idle()
    }

    pub fn intent(&self) -> Intent {
        self.inner.read().intent.clone()
    }

    pub fn proposal(&self) -> Option<Proposal> {
        self.inner.read().proposal.clone()
    }

    pub fn exec_proposal(&self) -> Option<Route> {
        self.inner.read().exec_proposal.clone()
    }

    pub fn recipient(&self) -> Option<RecipientRequirement> {
        self.inner.read().recipient
    }

    pub fn last_spoken(&self) -> Option<String> {
        self.inner.read().last_spoken.clone()
    }

    pub fn has_pending_confirmation(&self) -> bool {
        self.inner.read().has_pending_confirmation()
    }
}

/// Requests to the dialogue session
#[derive(Clone, Debug)]
pub enum AppCommand {
    StartRecording,
    /// Stop capture and process the utterance
    StopRecording,
    /// Process typed text as an utterance
    SubmitText(String),
    /// Typed answer to a pending yes/no
    Reply(String),
    ConfirmProposal,
    CancelProposal,
    ConfirmExecution,
    CancelExecution,
    ConfirmEns(String),
    /// Capture a spelled ENS name by voice
    SpellEns,
    SkipEns,
    /// Destination address, or `None` to use the connected Solana wallet
    ConfirmSolanaRecipient(Option<String>),
    SkipSolana,
    ResetIntent,
    Shutdown,
}

/// Notifications from the dialogue session
#[derive(Clone, Debug)]
pub enum AppEvent {
    StateChanged,
    Spoke(String),
    Error(String),
    Shutdown,
}
