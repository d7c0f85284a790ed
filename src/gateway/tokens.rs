//! Token resolution with a per-session cache
//!
//! A `(chain id, symbol)` pair is looked up at most once per session while
//! the result is positive. Failed or empty lookups are retried on the next
//! turn.

use crate::{Result, SwapVoiceError};
use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// A token as reported by the resolution service
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRecord {
    pub symbol: String,
    #[serde(default)]
    pub name: String,
    pub address: String,
    #[serde(default)]
    pub decimals: u32,
    #[serde(default, rename = "logoURI")]
    pub logo_uri: Option<String>,
    #[serde(default, rename = "priceUSD")]
    pub price_usd: Option<String>,
    #[serde(default)]
    pub chain_id: Option<u64>,
}

/// Pick the best candidate for a search term
///
/// An exact case-insensitive symbol match wins, then a name containing the
/// term.
pub fn select_token(candidates: &[TokenRecord], search: &str) -> Option<TokenRecord> {
    let search = search.trim().to_lowercase();
    if search.is_empty() {
        return None;
    }
    candidates
        .iter()
        .find(|t| t.symbol.to_lowercase() == search)
        .or_else(|| {
            candidates
                .iter()
                .find(|t| t.name.to_lowercase().contains(&search))
        })
        .cloned()
}

/// Looks up a token by chain and symbol
#[async_trait]
pub trait TokenResolver: Send + Sync {
    /// `Ok(None)` when the service answered but knows no such token
    async fn resolve(&self, chain_id: u64, search: &str) -> Result<Option<TokenRecord>>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ResolveRequest<'a> {
    chain_id: u64,
    search: &'a str,
}

#[derive(Deserialize)]
struct ResolveResponse {
    #[serde(default)]
    token: Option<TokenRecord>,
    #[serde(default)]
    tokens: Vec<TokenRecord>,
}

/// HTTP client for the token resolution endpoint
pub struct HttpTokenResolver {
    client: Client,
    url: String,
}

impl HttpTokenResolver {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SwapVoiceError::ConfigError(format!("HTTP client: {}", e)))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl TokenResolver for HttpTokenResolver {
    async fn resolve(&self, chain_id: u64, search: &str) -> Result<Option<TokenRecord>> {
        debug!("Resolving {} on chain {}", search, chain_id);
        let response = self
            .client
            .post(&self.url)
            .json(&ResolveRequest { chain_id, search })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SwapVoiceError::ResolutionError(format!(
                "resolve-token returned {}",
                response.status()
            )));
        }

        let body: ResolveResponse = response.json().await?;
        Ok(body.token.or_else(|| select_token(&body.tokens, search)))
    }
}

type CacheKey = (u64, String);

/// Bounded `(chain id, SYMBOL)` cache, oldest entry evicted first
pub struct TokenCache {
    inner: Mutex<CacheInner>,
    max_entries: usize,
}

struct CacheInner {
    entries: HashMap<CacheKey, TokenRecord>,
    order: VecDeque<CacheKey>,
}

impl TokenCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                entries: HashMap::new(),
                order: VecDeque::new(),
            }),
            max_entries: max_entries.max(1),
        }
    }

    fn key(chain_id: u64, symbol: &str) -> CacheKey {
        (chain_id, symbol.trim().to_uppercase())
    }

    pub fn get(&self, chain_id: u64, symbol: &str) -> Option<TokenRecord> {
        self.inner
            .lock()
            .entries
            .get(&Self::key(chain_id, symbol))
            .cloned()
    }

    pub fn insert(&self, chain_id: u64, symbol: &str, token: TokenRecord) {
        let key = Self::key(chain_id, symbol);
        let mut inner = self.inner.lock();
        if inner.entries.insert(key.clone(), token).is_none() {
            inner.order.push_back(key);
        }
        while inner.order.len() > self.max_entries {
            if let Some(oldest) = inner.order.pop_front() {
                inner.entries.remove(&oldest);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.order.clear();
    }
}

/// Token lookups for the dialogue: cache first, then the resolver
pub struct ResolutionGateway {
    resolver: Arc<dyn TokenResolver>,
    cache: TokenCache,
}

impl ResolutionGateway {
    pub fn new(resolver: Arc<dyn TokenResolver>, cache_max: usize) -> Self {
        Self {
            resolver,
            cache: TokenCache::new(cache_max),
        }
    }

    pub fn cache(&self) -> &TokenCache {
        &self.cache
    }

    pub async fn resolve_token(&self, chain_id: u64, symbol: &str) -> Result<Option<TokenRecord>> {
        if let Some(hit) = self.cache.get(chain_id, symbol) {
            debug!("Token cache hit: {} on {}", symbol, chain_id);
            return Ok(Some(hit));
        }

        let token = self.resolver.resolve(chain_id, symbol).await?;
        match &token {
            Some(found) => {
                info!("Resolved {} on {} to {}", symbol, chain_id, found.address);
                self.cache.insert(chain_id, symbol, found.clone());
            }
            None => warn!("No token {} on chain {}", symbol, chain_id),
        }
        Ok(token)
    }

    /// Resolve source and destination tokens in parallel
    ///
    /// The destination is only looked up when its chain is known. The first
    /// error wins; a source failure is reported before a destination one.
    pub async fn resolve_pair(
        &self,
        from_chain: u64,
        from_symbol: &str,
        to_chain: Option<u64>,
        to_symbol: &str,
    ) -> Result<(Option<TokenRecord>, Option<TokenRecord>)> {
        let destination = async {
            match to_chain {
                Some(chain) => self.resolve_token(chain, to_symbol).await,
                None => Ok(None),
            }
        };
        let (from, to) = tokio::join!(self.resolve_token(from_chain, from_symbol), destination);
        Ok((from?, to?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn record(symbol: &str, address: &str) -> TokenRecord {
        TokenRecord {
            symbol: symbol.to_string(),
            name: format!("{} token", symbol),
            address: address.to_string(),
            decimals: 6,
            logo_uri: None,
            price_usd: None,
            chain_id: None,
        }
    }

    struct CountingResolver {
        calls: AtomicUsize,
        known: Vec<(u64, TokenRecord)>,
        offline: bool,
    }

    #[async_trait]
    impl TokenResolver for CountingResolver {
        async fn resolve(&self, chain_id: u64, search: &str) -> Result<Option<TokenRecord>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.offline {
                return Err(SwapVoiceError::NetworkError("connection refused".into()));
            }
            Ok(self
                .known
                .iter()
                .find(|(c, t)| *c == chain_id && t.symbol == search)
                .map(|(_, t)| t.clone()))
        }
    }

    #[test]
    fn test_select_token_prefers_symbol() {
        let candidates = vec![
            TokenRecord {
                name: "Bridged USDC".into(),
                ..record("USDC.e", "0x1")
            },
            record("USDC", "0x2"),
        ];
        assert_eq!(select_token(&candidates, "usdc").unwrap().address, "0x2");
        assert_eq!(select_token(&candidates, "bridged").unwrap().address, "0x1");
        assert!(select_token(&candidates, "dai").is_none());
        assert!(select_token(&candidates, " ").is_none());
    }

    #[test]
    fn test_cache_evicts_oldest() {
        let cache = TokenCache::new(2);
        cache.insert(1, "usdc", record("USDC", "0x1"));
        cache.insert(1, "DAI", record("DAI", "0x2"));
        cache.insert(8453, "USDC", record("USDC", "0x3"));
        assert_eq!(cache.len(), 2);
        assert!(cache.get(1, "USDC").is_none());
        assert_eq!(cache.get(8453, "usdc").unwrap().address, "0x3");
    }

    #[test]
    fn test_token_record_json() {
        let json = r#"{"symbol":"USDT","name":"Tether","address":"0xabc","decimals":6,"logoURI":"https://x/usdt.png","priceUSD":"1.00","chainId":8453}"#;
        let token: TokenRecord = serde_json::from_str(json).unwrap();
        assert_eq!(token.logo_uri.as_deref(), Some("https://x/usdt.png"));
        assert_eq!(token.price_usd.as_deref(), Some("1.00"));
        assert_eq!(token.chain_id, Some(8453));
    }

    #[tokio::test]
    async fn test_gateway_caches_positive_results() {
        let resolver = Arc::new(CountingResolver {
            calls: AtomicUsize::new(0),
            known: vec![(8453, record("USDT", "0xusdt"))],
            offline: false,
        });
        let gateway = ResolutionGateway::new(resolver.clone(), 16);

        assert!(gateway.resolve_token(8453, "USDT").await.unwrap().is_some());
        assert!(gateway.resolve_token(8453, "USDT").await.unwrap().is_some());
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 1);

        assert!(gateway.resolve_token(8453, "PEPE").await.unwrap().is_none());
        assert!(gateway.resolve_token(8453, "PEPE").await.unwrap().is_none());
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_resolve_pair_without_destination_chain() {
        let resolver = Arc::new(CountingResolver {
            calls: AtomicUsize::new(0),
            known: vec![(137, record("USDC", "0xpoly"))],
            offline: false,
        });
        let gateway = ResolutionGateway::new(resolver.clone(), 16);
        let (from, to) = gateway.resolve_pair(137, "USDC", None, "USDC").await.unwrap();
        assert_eq!(from.unwrap().address, "0xpoly");
        assert!(to.is_none());
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_offline_error_propagates() {
        let resolver = Arc::new(CountingResolver {
            calls: AtomicUsize::new(0),
            known: Vec::new(),
            offline: true,
        });
        let gateway = ResolutionGateway::new(resolver, 16);
        let err = gateway
            .resolve_pair(1, "ETH", Some(1), "USDC")
            .await
            .unwrap_err();
        assert!(err.is_offline());
        assert!(gateway.cache().is_empty());
    }
}
