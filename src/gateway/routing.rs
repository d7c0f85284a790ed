//! Routing engine boundary
//!
//! The engine owns route search and execution. The dialogue writes order
//! fields into it and listens for route and execution events.

use super::tokens::TokenRecord;
use crate::format::format_amount_display;
use crate::Result;
use async_trait::async_trait;
use crossbeam_channel::Sender;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

/// Display details of the tool (DEX or bridge) behind a step
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDetails {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "logoURI")]
    pub logo_uri: Option<String>,
}

/// Action block of a step
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepAction {
    #[serde(default, rename = "type")]
    pub action_type: Option<String>,
    #[serde(default)]
    pub tool: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteStep {
    #[serde(default, rename = "type")]
    pub step_type: Option<String>,
    #[serde(default)]
    pub tool: Option<String>,
    #[serde(default)]
    pub tool_details: Option<ToolDetails>,
    #[serde(default)]
    pub action: Option<StepAction>,
}

impl RouteStep {
    fn kind(&self) -> Option<&str> {
        self.step_type
            .as_deref()
            .or_else(|| self.action.as_ref().and_then(|a| a.action_type.as_deref()))
    }

    fn is_swap(&self) -> bool {
        self.kind()
            .map(|k| k.to_lowercase().contains("swap"))
            .unwrap_or(false)
    }

    /// Tool display name, falling back to the tool key
    pub fn tool_name(&self) -> Option<String> {
        self.tool_details
            .as_ref()
            .and_then(|d| d.name.clone())
            .or_else(|| self.tool.clone())
            .or_else(|| self.action.as_ref().and_then(|a| a.tool.clone()))
            .filter(|name| !name.is_empty())
    }
}

/// A candidate route produced by the engine
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub id: String,
    pub from_chain_id: u64,
    pub to_chain_id: u64,
    pub from_token: TokenRecord,
    pub to_token: TokenRecord,
    pub from_amount: String,
    pub to_amount: String,
    #[serde(default, rename = "fromAmountUSD")]
    pub from_amount_usd: Option<String>,
    #[serde(default, rename = "toAmountUSD")]
    pub to_amount_usd: Option<String>,
    #[serde(default, rename = "gasCostUSD")]
    pub gas_cost_usd: Option<String>,
    #[serde(default)]
    pub steps: Vec<RouteStep>,
}

impl Route {
    /// "1.5 USDT → 0.0004 ETH"
    pub fn summary(&self) -> String {
        format!(
            "{} {} → {} {}",
            format_amount_display(&self.from_amount, Some(self.from_token.decimals)),
            self.from_token.symbol,
            format_amount_display(&self.to_amount, Some(self.to_token.decimals)),
            self.to_token.symbol
        )
    }

    /// "≈ $12.34 • Gas ≈ $0.05 • 2 steps"
    pub fn meta(&self) -> String {
        let usd = |v: &Option<String>| v.as_deref().and_then(|s| s.parse::<f64>().ok());
        let mut parts = Vec::new();
        if let Some(value) = usd(&self.to_amount_usd) {
            parts.push(format!("≈ ${:.2}", value));
        }
        if let Some(gas) = usd(&self.gas_cost_usd) {
            parts.push(format!("Gas ≈ ${:.2}", gas));
        }
        match self.steps.len() {
            0 => {}
            1 => parts.push("1 step".to_string()),
            n => parts.push(format!("{} steps", n)),
        }
        parts.join(" • ")
    }
}

/// Name and logo of the tool doing the main swap
#[derive(Clone, Debug, PartialEq)]
pub struct DexInfo {
    pub name: String,
    pub logo_uri: Option<String>,
}

/// The first swap-typed step's tool, or the first step's
pub fn best_dex_info(route: &Route) -> Option<DexInfo> {
    let step = route
        .steps
        .iter()
        .find(|s| s.is_swap())
        .or_else(|| route.steps.first())?;
    Some(DexInfo {
        name: step.tool_name().unwrap_or_default(),
        logo_uri: step.tool_details.as_ref().and_then(|d| d.logo_uri.clone()),
    })
}

/// Non-empty DEX name of a route, if any
pub fn dex_name(route: &Route) -> Option<String> {
    best_dex_info(route)
        .map(|info| info.name)
        .filter(|name| !name.is_empty())
}

/// Order fields the dialogue writes into the engine
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FormField {
    FromChain,
    FromToken,
    FromAmount,
    ToChain,
    ToToken,
    ToAddress,
}

impl FormField {
    pub fn key(&self) -> &'static str {
        match self {
            FormField::FromChain => "fromChain",
            FormField::FromToken => "fromToken",
            FormField::FromAmount => "fromAmount",
            FormField::ToChain => "toChain",
            FormField::ToToken => "toToken",
            FormField::ToAddress => "toAddress",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    ChainId(u64),
    Text(String),
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::ChainId(id) => write!(f, "{}", id),
            FieldValue::Text(text) => write!(f, "{}", text),
        }
    }
}

/// Notifications from the engine
#[derive(Clone, Debug, PartialEq)]
pub enum RouteEvent {
    RoutesAvailable(Vec<Route>),
    RouteSelected(Route),
    ExecutionUpdated(Route),
    ExecutionCompleted(Route),
    ExecutionFailed { route: Route, error: String },
}

pub type SubscriptionId = u64;

/// Route search and execution
#[async_trait]
pub trait RoutingEngine: Send + Sync {
    async fn set_field(&self, field: FormField, value: FieldValue) -> Result<()>;

    fn subscribe(&self, tx: Sender<RouteEvent>) -> SubscriptionId;

    fn unsubscribe(&self, id: SubscriptionId);

    /// Execute a route, returning its final state
    async fn execute(&self, route: &Route) -> Result<Route>;
}

/// Subscriber registry for engine implementations
#[derive(Default)]
pub struct RouteSubscribers {
    next_id: AtomicU64,
    senders: Mutex<HashMap<SubscriptionId, Sender<RouteEvent>>>,
}

impl RouteSubscribers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, tx: Sender<RouteEvent>) -> SubscriptionId {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.senders.lock().insert(id, tx);
        debug!("Route subscriber {} added", id);
        id
    }

    pub fn remove(&self, id: SubscriptionId) {
        if self.senders.lock().remove(&id).is_none() {
            warn!("Unknown route subscriber {}", id);
        }
    }

    pub fn len(&self) -> usize {
        self.senders.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver to every subscriber, dropping those whose receiver is gone
    pub fn publish(&self, event: RouteEvent) {
        let mut senders = self.senders.lock();
        senders.retain(|id, tx| match tx.try_send(event.clone()) {
            Ok(()) => true,
            Err(crossbeam_channel::TrySendError::Full(_)) => {
                warn!("Route subscriber {} lagging, event dropped", id);
                true
            }
            Err(crossbeam_channel::TrySendError::Disconnected(_)) => false,
        });
    }
}
