//! Wallet boundary
//!
//! One EVM provider and one Solana provider, either of which may be absent.
//! The dialogue only ever asks; it never signs anything itself.

use crate::format::format_units;
use crate::{Result, SwapVoiceError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// A balance entry reported for the connected account
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletToken {
    pub symbol: String,
    pub decimals: u32,
    #[serde(default)]
    pub address: String,
    /// Raw base-unit amount
    pub amount: String,
    #[serde(default, rename = "priceUSD")]
    pub price_usd: Option<String>,
    pub chain_id: u64,
}

impl WalletToken {
    /// Amount in whole units
    pub fn units(&self) -> f64 {
        format_units(&self.amount, Some(self.decimals))
            .parse::<f64>()
            .unwrap_or(0.0)
    }

    pub fn price(&self) -> Option<f64> {
        self.price_usd
            .as_deref()
            .and_then(|p| p.parse::<f64>().ok())
            .filter(|p| p.is_finite())
    }

    pub fn usd_value(&self) -> Option<f64> {
        self.price().map(|p| p * self.units())
    }

    pub fn is_zero(&self) -> bool {
        self.units() <= 0.0
    }
}

#[async_trait]
pub trait Wallet: Send + Sync {
    /// An EVM provider is present (not necessarily connected)
    fn evm_available(&self) -> bool;

    /// Connected EVM accounts, empty when not connected
    async fn evm_accounts(&self) -> Result<Vec<String>>;

    async fn chain_id(&self) -> Result<u64>;

    /// Ask the provider to switch network
    async fn switch_chain(&self, chain_id: u64) -> Result<()>;

    /// Network change notifications, when the provider emits them
    fn chain_changes(&self) -> Option<broadcast::Receiver<u64>>;

    fn solana_available(&self) -> bool;

    /// Connect the Solana provider, returning its public key
    async fn solana_connect(&self) -> Result<Option<String>>;

    /// Public key of an already connected Solana provider
    fn solana_public_key(&self) -> Option<String>;

    /// Balances of an account across all chains
    async fn balances(&self, address: &str) -> Result<Vec<WalletToken>>;
}

/// Bring the EVM wallet onto `target`
///
/// Requests a switch, then waits up to `wait` for a matching network change
/// notification before re-reading the chain id. `Ok(false)` when the wallet
/// refused or did not end up on the target.
pub async fn ensure_chain(wallet: &dyn Wallet, target: u64, wait: Duration) -> Result<bool> {
    let current = wallet.chain_id().await?;
    if current == target {
        return Ok(true);
    }

    // subscribe before switching so the notification cannot be missed
    let changes = wallet.chain_changes();

    info!("Switching wallet network {} -> {}", current, target);
    if let Err(e) = wallet.switch_chain(target).await {
        warn!("Network switch failed: {}", e);
        return Ok(false);
    }

    if let Some(mut rx) = changes {
        let observed = tokio::time::timeout(wait, async {
            loop {
                match rx.recv().await {
                    Ok(id) if id == target => return true,
                    Ok(id) => debug!("Wallet reported chain {}", id),
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        debug!("Missed {} chain notifications", n)
                    }
                    Err(broadcast::error::RecvError::Closed) => return false,
                }
            }
        })
        .await;
        if let Ok(true) = observed {
            return Ok(true);
        }
    } else {
        tokio::time::sleep(wait).await;
    }

    Ok(wallet.chain_id().await? == target)
}

/// Stand-in for a session without any wallet provider
#[derive(Debug, Default)]
pub struct NoWallet;

#[async_trait]
impl Wallet for NoWallet {
    fn evm_available(&self) -> bool {
        false
    }

    async fn evm_accounts(&self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    async fn chain_id(&self) -> Result<u64> {
        Err(SwapVoiceError::WalletError("no EVM provider".to_string()))
    }

    async fn switch_chain(&self, _chain_id: u64) -> Result<()> {
        Err(SwapVoiceError::WalletError("no EVM provider".to_string()))
    }

    fn chain_changes(&self) -> Option<broadcast::Receiver<u64>> {
        None
    }

    fn solana_available(&self) -> bool {
        false
    }

    async fn solana_connect(&self) -> Result<Option<String>> {
        Ok(None)
    }

    fn solana_public_key(&self) -> Option<String> {
        None
    }

    async fn balances(&self, _address: &str) -> Result<Vec<WalletToken>> {
        Ok(Vec::new())
    }
}
