//! Executed-transaction history, newest first

use crate::gateway::{dex_name, Route};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use uuid::Uuid;

/// Default number of kept records
pub const DEFAULT_HISTORY_MAX: usize = 50;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    Completed,
    Failed,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TxRecord {
    pub id: Uuid,
    pub ts: DateTime<Utc>,
    pub status: TxStatus,
    pub from_chain_id: u64,
    pub to_chain_id: u64,
    pub from_symbol: String,
    pub to_symbol: String,
    /// USD value when the route priced it, else the raw source amount
    pub amount: f64,
    pub dex: Option<String>,
    pub route_id: String,
}

impl TxRecord {
    pub fn from_route(route: &Route, status: TxStatus) -> Self {
        let amount = route
            .from_amount_usd
            .as_deref()
            .and_then(|v| v.parse::<f64>().ok())
            .or_else(|| route.from_amount.parse::<f64>().ok())
            .filter(|v| v.is_finite())
            .unwrap_or(0.0);

        Self {
            id: Uuid::new_v4(),
            ts: Utc::now(),
            status,
            from_chain_id: route.from_chain_id,
            to_chain_id: route.to_chain_id,
            from_symbol: route.from_token.symbol.clone(),
            to_symbol: route.to_token.symbol.clone(),
            amount,
            dex: route.steps.first().and_then(|step| step.tool_name()).or_else(|| dex_name(route)),
            route_id: route.id.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TxHistory {
    records: Arc<RwLock<VecDeque<TxRecord>>>,
    max_records: usize,
}

impl TxHistory {
    pub fn new(max_records: usize) -> Self {
        Self {
            records: Arc::new(RwLock::new(VecDeque::new())),
            max_records: max_records.max(1),
        }
    }

    pub fn add(&self, record: TxRecord) {
        let mut records = self.records.write();
        records.push_front(record);
        records.truncate(self.max_records);
    }

    pub fn record(&self, route: &Route, status: TxStatus) -> TxRecord {
        let record = TxRecord::from_route(route, status);
        self.add(record.clone());
        record
    }

    pub fn get_all(&self) -> Vec<TxRecord> {
        self.records.read().iter().cloned().collect()
    }

    pub fn latest(&self) -> Option<TxRecord> {
        self.records.read().front().cloned()
    }

    pub fn clear(&self) {
        self.records.write().clear();
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl Default for TxHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(id: &str, usd: Option<&str>) -> Route {
        let mut value = serde_json::json!({
            "id": id,
            "fromChainId": 137,
            "toChainId": 42161,
            "fromToken": {"symbol":"USDC","address":"0x1","decimals":6},
            "toToken": {"symbol":"USDC","address":"0x2","decimals":6},
            "fromAmount": "50000000",
            "toAmount": "49900000",
            "steps": [{"type":"cross","tool":"across","toolDetails":{"name":"Across"}}]
        });
        if let Some(usd) = usd {
            value["fromAmountUSD"] = serde_json::Value::String(usd.to_string());
        }
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_record_from_route() {
        let record = TxRecord::from_route(&route("r1", Some("49.98")), TxStatus::Completed);
        assert_eq!(record.amount, 49.98);
        assert_eq!(record.dex.as_deref(), Some("Across"));
        assert_eq!(record.from_chain_id, 137);
        assert_eq!(record.to_symbol, "USDC");

        let record = TxRecord::from_route(&route("r2", None), TxStatus::Failed);
        assert_eq!(record.amount, 50_000_000.0);
        assert_eq!(record.status, TxStatus::Failed);
    }

    #[test]
    fn test_history_newest_first_and_capped() {
        let history = TxHistory::new(3);
        for i in 0..5 {
            history.record(&route(&format!("r{}", i), None), TxStatus::Completed);
        }
        assert_eq!(history.len(), 3);
        let ids: Vec<String> = history.get_all().into_iter().map(|r| r.route_id).collect();
        assert_eq!(ids, vec!["r4", "r3", "r2"]);
        assert_eq!(history.latest().unwrap().route_id, "r4");

        history.clear();
        assert!(history.is_empty());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&TxStatus::Completed).unwrap(), "\"completed\"");
    }
}
