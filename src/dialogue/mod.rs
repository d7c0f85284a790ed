//! Voice dialogue: turns, confirmations, recipients and execution

pub mod confirm;
pub mod controller;
pub mod proposal;
pub mod queries;
pub mod recipient;
pub mod state;

pub use confirm::{classify_reply, ReplyKind};
pub use controller::{execution_failure_message, Collaborators, ConfirmTarget, DialogueController};
pub use proposal::{AppliedOrder, Proposal, SAME_TOKEN_MESSAGE};
pub use state::{
    AppCommand, AppEvent, DialogueState, ExecStatus, RecipientRequirement, SessionStatus,
    SharedDialogueState,
};
