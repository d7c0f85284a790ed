//! Resolved orders awaiting confirmation

use serde::{Deserialize, Serialize};

pub const SAME_TOKEN_MESSAGE: &str =
    "That is the same token on the same chain. Please change the token or destination chain.";

/// A fully resolved order, pending the user's yes/no
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    pub from_chain_id: u64,
    pub to_chain_id: u64,
    pub from_symbol: String,
    pub to_symbol: String,
    pub amount: f64,
    pub source_chain_name: String,
    pub target_chain_name: String,
    pub from_token_address: String,
    pub to_token_address: String,
}

impl Proposal {
    /// Same symbol moved between two different chains
    pub fn is_bridge(&self) -> bool {
        self.from_symbol == self.to_symbol && self.from_chain_id != self.to_chain_id
    }

    /// Same token on the same chain: no route can exist
    pub fn is_degenerate(&self) -> bool {
        self.from_chain_id == self.to_chain_id
            && self
                .from_token_address
                .eq_ignore_ascii_case(&self.to_token_address)
    }

    /// Spoken summary, ending with the confirmation question
    pub fn message(&self) -> String {
        let verb = if self.is_bridge() { "bridge" } else { "swap" };
        let destination = if self.to_chain_id != self.from_chain_id {
            format!(" on {}", self.target_chain_name)
        } else {
            String::new()
        };
        format!(
            "You want to {} {} {} on {} to {}{}. Should I proceed to find the best route?",
            verb,
            self.amount,
            self.from_symbol,
            self.source_chain_name,
            self.to_symbol,
            destination
        )
    }

    /// Snapshot written once the order is handed to the routing engine
    pub fn applied(&self) -> AppliedOrder {
        AppliedOrder {
            from_chain_id: self.from_chain_id,
            to_chain_id: self.to_chain_id,
            from_symbol: self.from_symbol.clone(),
            to_symbol: self.to_symbol.clone(),
            amount: self.amount,
            source_chain_name: self.source_chain_name.clone(),
            target_chain_name: self.target_chain_name.clone(),
        }
    }
}

/// The last order pushed into the routing engine
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AppliedOrder {
    pub from_chain_id: u64,
    pub to_chain_id: u64,
    pub from_symbol: String,
    pub to_symbol: String,
    pub amount: f64,
    pub source_chain_name: String,
    pub target_chain_name: String,
}
