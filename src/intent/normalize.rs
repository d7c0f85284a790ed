//! Token and chain name normalisation
//!
//! Pure, total functions mapping whatever the transcriber or the remote
//! extractor produced onto canonical token symbols and chain names, plus the
//! fixed chain id registry.

use regex::Regex;
use std::sync::LazyLock;

/// LI.FI-style chain id used for Solana routes
pub const SOLANA_CHAIN_ID: u64 = 1_151_111_081_099_710;

/// Canonical chain names and their numeric ids
const CHAIN_IDS: &[(&str, u64)] = &[
    ("ethereum", 1),
    ("mainnet", 1),
    ("arbitrum", 42161),
    ("polygon", 137),
    ("matic", 137),
    ("bsc", 56),
    ("binance", 56),
    ("optimism", 10),
    ("base", 8453),
    ("avalanche", 43114),
];

/// Spoken chain aliases mapped to canonical chain names
const CHAIN_ALIASES: &[(&str, &str)] = &[
    ("eth", "ethereum"),
    ("ethereum", "ethereum"),
    ("ethereum mainnet", "ethereum"),
    ("eth mainnet", "ethereum"),
    ("mainnet", "ethereum"),
    ("arbitrum", "arbitrum"),
    ("arbitrum one", "arbitrum"),
    ("arbitrum 1", "arbitrum"),
    ("polygon", "polygon"),
    ("matic", "polygon"),
    ("optimism", "optimism"),
    ("op", "optimism"),
    ("base", "base"),
    ("avalanche", "avalanche"),
    ("avax", "avalanche"),
    ("bsc", "bsc"),
    ("binance", "bsc"),
    ("binance smart", "bsc"),
    ("binance smart chain", "bsc"),
    ("bnb", "bsc"),
    ("bnb chain", "bsc"),
];

/// Token aliases mapped to canonical symbols
const TOKEN_ALIASES: &[(&str, &str)] = &[
    ("weth", "WETH"),
    ("eth", "ETH"),
    ("matic", "MATIC"),
    ("polygon", "MATIC"),
    ("bnb", "BNB"),
    ("binance", "BNB"),
    ("avax", "AVAX"),
    ("avalanche", "AVAX"),
    ("sol", "SOL"),
    ("solana", "SOL"),
    ("usdt", "USDT"),
    ("tether", "USDT"),
    ("usdts", "USDT"),
    ("usdc", "USDC"),
    ("dai", "DAI"),
];

/// Words that are never a chain on their own
const CHAIN_FILLER: &[&str] = &["token", "tokens", "coin", "coins"];

static TOKEN_FILLER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:token|coin)\b").expect("valid token filler regex"));

static CHAIN_FILLER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:chain|network)\b").expect("valid chain filler regex"));

static ONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:one|1)\b").expect("valid ordinal regex"));

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn token_alias(word: &str) -> Option<&'static str> {
    TOKEN_ALIASES
        .iter()
        .find(|(alias, _)| *alias == word)
        .map(|(_, symbol)| *symbol)
}

fn chain_alias(phrase: &str) -> Option<&'static str> {
    CHAIN_ALIASES
        .iter()
        .find(|(alias, _)| *alias == phrase)
        .map(|(_, chain)| *chain)
}

/// Map a spoken token name to its canonical uppercase symbol
///
/// "token"/"coin" filler words are dropped and a plural "s" is removed when
/// the singular is a known alias ("usdts", "eths"). Unknown names come back
/// uppercased, so the function is total and idempotent.
pub fn normalize_token_symbol(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    let cleaned = collapse_whitespace(&TOKEN_FILLER_RE.replace_all(&lowered, " "));

    if let Some(symbol) = token_alias(&cleaned) {
        return symbol.to_string();
    }

    if let Some(singular) = cleaned.strip_suffix('s') {
        if let Some(symbol) = token_alias(singular) {
            return symbol.to_string();
        }
    }

    cleaned.to_uppercase()
}

/// Map a spoken chain phrase to its canonical lowercase chain name
///
/// Returns an empty string for filler ("token", "coin") and for input that
/// is empty once "chain"/"network" are removed. Unknown phrases are returned
/// cleaned but otherwise unchanged.
pub fn normalize_chain_alias(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    let cleaned = collapse_whitespace(&CHAIN_FILLER_RE.replace_all(&lowered, " "));

    if cleaned.is_empty() || CHAIN_FILLER.contains(&cleaned.as_str()) {
        return String::new();
    }

    if let Some(chain) = chain_alias(&cleaned) {
        return chain.to_string();
    }

    let stripped = collapse_whitespace(&ONE_RE.replace_all(&cleaned, " "));
    if let Some(chain) = chain_alias(&stripped) {
        return chain.to_string();
    }

    cleaned
}

/// Whether a phrase names a chain we know about
pub fn is_known_chain(phrase: &str) -> bool {
    chain_id(&normalize_chain_alias(phrase)).is_some()
}

/// Look up the numeric id of a canonical chain name
pub fn chain_id(chain: &str) -> Option<u64> {
    CHAIN_IDS
        .iter()
        .find(|(name, _)| *name == chain)
        .map(|(_, id)| *id)
}

/// Display name for a chain id
pub fn chain_name(id: u64) -> Option<&'static str> {
    if id == SOLANA_CHAIN_ID {
        return Some("solana");
    }
    CHAIN_ALIASES
        .iter()
        .map(|(_, chain)| *chain)
        .find(|chain| chain_id(chain) == Some(id))
}

/// Whether a chain id belongs to the Solana ecosystem
pub fn is_solana(id: u64) -> bool {
    id == SOLANA_CHAIN_ID
}
