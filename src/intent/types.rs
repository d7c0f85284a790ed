//! Intent records and the per-turn merge rule

use super::normalize::{normalize_chain_alias, normalize_token_symbol};
use serde::{Deserialize, Deserializer, Serialize};

/// The five fields of a swap/bridge order
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IntentField {
    SourceToken,
    TargetToken,
    Amount,
    SourceChain,
    TargetChain,
}

impl IntentField {
    /// Clarifying question asked when this field is missing
    pub fn question(&self) -> &'static str {
        match self {
            IntentField::SourceToken => "Which token do you want to swap from?",
            IntentField::TargetToken => "Which token do you want to receive?",
            IntentField::Amount => "How much do you want to swap?",
            IntentField::SourceChain => "On which source chain?",
            IntentField::TargetChain => "On which destination chain?",
        }
    }
}

impl std::fmt::Display for IntentField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntentField::SourceToken => write!(f, "source_token"),
            IntentField::TargetToken => write!(f, "target_token"),
            IntentField::Amount => write!(f, "amount"),
            IntentField::SourceChain => write!(f, "source_chain"),
            IntentField::TargetChain => write!(f, "target_chain"),
        }
    }
}

/// Accumulated order state for the session
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    pub source_token: Option<String>,
    pub target_token: Option<String>,
    pub amount: Option<f64>,
    pub source_chain: Option<String>,
    pub target_chain: Option<String>,
}

/// What one extractor understood from one utterance
///
/// Absent and empty fields both mean "no new information".
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialIntent {
    #[serde(default)]
    pub source_token: Option<String>,
    #[serde(default)]
    pub target_token: Option<String>,
    #[serde(default, deserialize_with = "numeric_amount")]
    pub amount: Option<f64>,
    #[serde(default)]
    pub source_chain: Option<String>,
    #[serde(default)]
    pub target_chain: Option<String>,
}

/// Only JSON numbers count as an amount; strings and other types are dropped
fn numeric_amount<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| v.as_f64()))
}

fn usable_text(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn usable_amount(value: Option<f64>) -> Option<f64> {
    value.filter(|a| a.is_finite() && *a > 0.0)
}

fn pick_text(remote: &Option<String>, local: &Option<String>, previous: &Option<String>) -> Option<String> {
    usable_text(remote)
        .or_else(|| usable_text(local))
        .or_else(|| previous.clone())
}

impl PartialIntent {
    /// True when no field carries information
    pub fn is_empty(&self) -> bool {
        usable_text(&self.source_token).is_none()
            && usable_text(&self.target_token).is_none()
            && usable_amount(self.amount).is_none()
            && usable_text(&self.source_chain).is_none()
            && usable_text(&self.target_chain).is_none()
    }

    /// Canonicalise token symbols and chain names
    ///
    /// Values that normalise to nothing (e.g. a chain of "token") are dropped.
    pub fn normalized(&self) -> PartialIntent {
        let token = |v: &Option<String>| {
            usable_text(v)
                .map(|s| normalize_token_symbol(&s))
                .filter(|s| !s.is_empty())
        };
        let chain = |v: &Option<String>| {
            usable_text(v)
                .map(|s| normalize_chain_alias(&s))
                .filter(|s| !s.is_empty())
        };
        PartialIntent {
            source_token: token(&self.source_token),
            target_token: token(&self.target_token),
            amount: usable_amount(self.amount),
            source_chain: chain(&self.source_chain),
            target_chain: chain(&self.target_chain),
        }
    }
}

impl Intent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one turn's extractions into the accumulated intent
    ///
    /// Per field: remote value if usable, else local value, else the previous
    /// value. A filled field never regresses to empty.
    pub fn merge(previous: &Intent, remote: &PartialIntent, local: &PartialIntent) -> Intent {
        Intent {
            source_token: pick_text(&remote.source_token, &local.source_token, &previous.source_token),
            target_token: pick_text(&remote.target_token, &local.target_token, &previous.target_token),
            amount: usable_amount(remote.amount)
                .or_else(|| usable_amount(local.amount))
                .or(previous.amount),
            source_chain: pick_text(&remote.source_chain, &local.source_chain, &previous.source_chain),
            target_chain: pick_text(&remote.target_chain, &local.target_chain, &previous.target_chain),
        }
    }

    /// All five fields are set
    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// Missing fields in question priority order
    pub fn missing_fields(&self) -> Vec<IntentField> {
        let mut missing = Vec::new();
        if self.source_token.is_none() {
            missing.push(IntentField::SourceToken);
        }
        if self.target_token.is_none() {
            missing.push(IntentField::TargetToken);
        }
        if self.amount.is_none() {
            missing.push(IntentField::Amount);
        }
        if self.source_chain.is_none() {
            missing.push(IntentField::SourceChain);
        }
        if self.target_chain.is_none() {
            missing.push(IntentField::TargetChain);
        }
        missing
    }

    /// Both chains are known and differ
    pub fn is_cross_chain(&self) -> bool {
        match (&self.source_chain, &self.target_chain) {
            (Some(src), Some(dst)) => src != dst,
            _ => false,
        }
    }

    /// The single field to ask about next, if any
    ///
    /// On a cross-chain order a missing target token is not asked for: the
    /// order is treated as a bridge of the source token.
    pub fn next_question(&self) -> Option<IntentField> {
        let cross_chain = self.is_cross_chain();
        self.missing_fields()
            .into_iter()
            .find(|field| !(cross_chain && *field == IntentField::TargetToken))
    }

    /// Fill the target token of a cross-chain order with the source token
    ///
    /// Only applies once every other field is known. Returns true when the
    /// target was filled.
    pub fn infer_bridge_target(&mut self) -> bool {
        if self.target_token.is_some() || !self.is_cross_chain() {
            return false;
        }
        if self.missing_fields() != [IntentField::TargetToken] {
            return false;
        }
        self.target_token = self.source_token.clone();
        true
    }

    /// Forget everything collected so far
    pub fn clear(&mut self) {
        *self = Intent::default();
    }
}
