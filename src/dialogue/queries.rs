//! Wallet questions answered without touching the order
//!
//! "What's in my wallet" and "how much USDC do I have" style utterances are
//! recognised up front and answered from the wallet's balances.

use crate::format::{format_amount_display, format_grouped};
use crate::wallet::WalletToken;
use regex::Regex;
use std::cmp::Ordering;
use std::sync::LazyLock;

pub const CONNECT_FOR_HOLDINGS: &str = "Please connect your wallet first to view your holdings.";
pub const CONNECT_FOR_BALANCE: &str =
    "Please connect your wallet first to check your token balance.";
pub const HOLDINGS_INTRO: &str = "Here are your current wallet holdings.";
pub const HOLDINGS_FAILED: &str =
    "Sorry, I couldn't load your wallet holdings. Please try again.";
pub const ASK_WHICH_TOKEN: &str = "Which token balance would you like to check?";

/// Holdings kept for display
const MAX_HOLDINGS: usize = 10;

/// Holdings read out loud
const SPOKEN_HOLDINGS: usize = 5;

static HOLDINGS_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\b(?:show|display|what|check|view|see|tell me|list|what are)\b.*\b(?:wallet|balance|balances|holdings|portfolio|tokens|assets|funds)\b",
        r"\b(?:my|current|wallet)\b.*\b(?:balance|balances|holdings|portfolio|tokens|assets)\b",
        r"\b(?:what do i have|what tokens do i have|show my tokens|my tokens|my assets|my holdings|my portfolio)\b",
        r"\b(?:wallet balance|current balance|token balance|account balance)\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid holdings regex"))
    .collect()
});

static SPECIFIC_TOKEN_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\b(?:how many|how much|what is my|what's my|check my)\b.*\b(?:usdt|usdc|eth|btc|matic|dai|weth|tokens?|balance)\b",
        r"\b(?:balance of|amount of)\b.*\b(?:usdt|usdc|eth|btc|matic|dai|weth)\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid token query regex"))
    .collect()
});

static QUERY_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(usdt|usdc|eth|btc|matic|dai|weth|bitcoin|ethereum|tether|usd coin)\b")
        .expect("valid query token regex")
});

pub fn is_wallet_holdings_query(text: &str) -> bool {
    let t = text.to_lowercase();
    HOLDINGS_RES.iter().any(|re| re.is_match(&t))
}

pub fn is_specific_token_query(text: &str) -> bool {
    let t = text.to_lowercase();
    SPECIFIC_TOKEN_RES.iter().any(|re| re.is_match(&t))
}

/// First token named in a balance question, as a symbol
pub fn extract_token_from_query(text: &str) -> Option<String> {
    let t = text.to_lowercase();
    let word = QUERY_TOKEN_RE.captures(&t)?.get(1)?.as_str().to_string();
    let symbol = match word.as_str() {
        "bitcoin" => "BTC".to_string(),
        "ethereum" => "ETH".to_string(),
        "tether" => "USDT".to_string(),
        "usd coin" => "USDC".to_string(),
        other => other.to_uppercase(),
    };
    Some(symbol)
}

/// Spoken answer to "how much <symbol> do I have"
pub fn token_balance_message(symbol: &str, balances: &[WalletToken]) -> String {
    let matching: Vec<&WalletToken> = balances
        .iter()
        .filter(|t| t.symbol.eq_ignore_ascii_case(symbol))
        .collect();

    if matching.is_empty() {
        return format!("You don't have any {} tokens in your wallet.", symbol);
    }

    let total: f64 = matching.iter().map(|t| t.units()).sum();
    let usd: f64 = matching.iter().filter_map(|t| t.usd_value()).sum();

    let mut message = format!("You have {} {}", format_grouped(total), symbol);
    if usd > 0.0 {
        message.push_str(&format!(" worth approximately ${:.2}", usd));
    }
    message.push_str(" in your wallet.");
    message
}

/// Non-zero balances, most valuable first, capped for display
pub fn top_holdings(balances: Vec<WalletToken>) -> Vec<WalletToken> {
    let mut held: Vec<WalletToken> = balances.into_iter().filter(|t| !t.is_zero()).collect();
    held.sort_by(|a, b| {
        let a = a.usd_value().unwrap_or(0.0);
        let b = b.usd_value().unwrap_or(0.0);
        b.partial_cmp(&a).unwrap_or(Ordering::Equal)
    });
    held.truncate(MAX_HOLDINGS);
    held
}

/// Spoken summary of the top holdings
pub fn holdings_summary(holdings: &[WalletToken]) -> String {
    if holdings.is_empty() {
        return "No token balances found in your wallet.".to_string();
    }

    let mut speech = format!("You have {} tokens in your wallet. ", holdings.len());
    for (index, token) in holdings.iter().take(SPOKEN_HOLDINGS).enumerate() {
        speech.push_str(&format!(
            "{}. {} {}",
            index + 1,
            format_amount_display(&token.amount, Some(token.decimals)),
            token.symbol
        ));
        if let Some(usd) = token.usd_value().filter(|v| *v >= 0.005) {
            speech.push_str(&format!(" worth ${:.2}", usd));
        }
        speech.push_str(". ");
    }

    if holdings.len() > SPOKEN_HOLDINGS {
        speech.push_str(&format!(
            "And {} more tokens.",
            holdings.len() - SPOKEN_HOLDINGS
        ));
    }
    speech.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(symbol: &str, amount: &str, decimals: u32, price: Option<&str>, chain_id: u64) -> WalletToken {
        WalletToken {
            symbol: symbol.to_string(),
            decimals,
            address: format!("0x{}", symbol.to_lowercase()),
            amount: amount.to_string(),
            price_usd: price.map(str::to_string),
            chain_id,
        }
    }

    #[test]
    fn test_holdings_queries() {
        assert!(is_wallet_holdings_query("show my wallet"));
        assert!(is_wallet_holdings_query("What are my holdings?"));
        assert!(is_wallet_holdings_query("what do I have"));
        assert!(is_wallet_holdings_query("wallet balance please"));
        assert!(!is_wallet_holdings_query("swap 100 usdt to eth on base"));
    }

    #[test]
    fn test_specific_token_queries() {
        assert!(is_specific_token_query("how much usdc do I have"));
        assert!(is_specific_token_query("What's my ETH balance"));
        assert!(is_specific_token_query("balance of dai"));
        assert!(!is_specific_token_query("bridge usdc from polygon to arbitrum"));
    }

    #[test]
    fn test_extract_token_from_query() {
        assert_eq!(extract_token_from_query("how much tether"), Some("USDT".into()));
        assert_eq!(extract_token_from_query("check my bitcoin"), Some("BTC".into()));
        assert_eq!(extract_token_from_query("how much usd coin"), Some("USDC".into()));
        assert_eq!(extract_token_from_query("how many weth"), Some("WETH".into()));
        assert_eq!(extract_token_from_query("how many tokens"), None);
    }

    #[test]
    fn test_token_balance_message() {
        let balances = vec![
            token("USDC", "1500000000", 6, Some("1.0"), 8453),
            token("usdc", "500000", 6, Some("1.0"), 137),
            token("DAI", "1000000000000000000", 18, None, 1),
        ];
        assert_eq!(
            token_balance_message("USDC", &balances),
            "You have 1,500.5 USDC worth approximately $1500.50 in your wallet."
        );
        assert_eq!(token_balance_message("DAI", &balances), "You have 1 DAI in your wallet.");
        assert_eq!(
            token_balance_message("WETH", &balances),
            "You don't have any WETH tokens in your wallet."
        );
    }

    #[test]
    fn test_top_holdings_order_and_filter() {
        let balances = vec![
            token("DAI", "2000000000000000000", 18, Some("1.0"), 1),
            token("ETH", "1000000000000000000", 18, Some("3000"), 1),
            token("PEPE", "0", 18, Some("0.00001"), 1),
            token("FOO", "5", 0, None, 1),
        ];
        let top = top_holdings(balances);
        let symbols: Vec<&str> = top.iter().map(|t| t.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["ETH", "DAI", "FOO"]);
    }

    #[test]
    fn test_holdings_summary() {
        assert_eq!(holdings_summary(&[]), "No token balances found in your wallet.");

        let holdings = vec![
            token("ETH", "1000000000000000000", 18, Some("3000"), 1),
            token("FOO", "5", 0, None, 1),
        ];
        assert_eq!(
            holdings_summary(&holdings),
            "You have 2 tokens in your wallet. 1. 1 ETH worth $3000.00. 2. 5 FOO."
        );

        let many: Vec<WalletToken> = (0..7).map(|i| token(&format!("T{}", i), "1", 0, None, 1)).collect();
        assert!(holdings_summary(&many).ends_with("And 2 more tokens."));
    }
}
