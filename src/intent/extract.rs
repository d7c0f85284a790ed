//! Offline, regex-driven intent extraction
//!
//! Best-effort parse of one utterance into a [`PartialIntent`]. Rules run in a
//! fixed order and later rules overwrite earlier ones where noted, so the
//! outcome for utterances mixing "on", "from" and "to" is order dependent.

use super::normalize::{chain_id, normalize_chain_alias, normalize_token_symbol};
use super::types::PartialIntent;
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

/// "swap|bridge <amount> <token>"
static AMOUNT_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:swap|bridge)\s+(\d+(?:[.,]\d+)?)\s*([a-z][a-z0-9]*)")
        .expect("valid amount regex")
});

/// "swap|convert [<amount>] <token> to|into|for <token>"
static PAIR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?:swap|convert)\s+(?:\d+(?:[.,]\d+)?\s*)?([a-z][a-z0-9]*)\s+(?:to|into|for)\s+([a-z][a-z0-9]*)",
    )
    .expect("valid pair regex")
});

/// "get|receive|want [to get] <token>"
static TARGET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:get|receive|want(?:\s+to\s+get)?)\s+([a-z][a-z0-9]*)")
        .expect("valid target regex")
});

/// "swap|sell|bridge <token>"
static SOURCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:swap|sell|bridge)\s+([a-z][a-z0-9]*)").expect("valid source regex")
});

static ON_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bon\s+(?:the\s+)?([a-z][a-z0-9-]*)").expect("valid on regex"));

static FROM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bfrom\s+(?:the\s+)?([a-z][a-z0-9-]*)").expect("valid from regex")
});

static TO_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bto\s+(?:the\s+)?([a-z][a-z0-9-]*)").expect("valid to regex"));

/// Words a target-token rule must not take as a token
const TARGET_STOPWORDS: &[&str] = &[
    "to", "a", "an", "the", "some", "my", "me", "it", "that", "this",
];

/// Words that name a token rather than a chain after "to"/"from"
const TOKEN_WORDS: &[&str] = &[
    "token", "tokens", "usdt", "usdc", "eth", "dai", "weth", "bnb", "avax", "sol", "matic",
];

/// Longest phrase a chain alias can span ("binance smart chain")
const MAX_CHAIN_WORDS: usize = 3;

fn is_token_word(word: &str) -> bool {
    TOKEN_WORDS.contains(&word)
}

/// Up to `MAX_CHAIN_WORDS` words starting at byte offset `start`
fn words_from(text: &str, start: usize) -> Vec<&str> {
    text[start..]
        .split_whitespace()
        .take(MAX_CHAIN_WORDS)
        .map(|w| w.trim_end_matches(|c: char| c.is_ascii_punctuation()))
        .take_while(|w| !w.is_empty())
        .collect()
}

/// Resolve the chain phrase starting at `start`
///
/// Prefers the longest run of words forming a known chain; falls back to
/// the single word. Returns the normalised chain name and the first word.
fn chain_phrase_at(text: &str, start: usize) -> Option<(String, String)> {
    let words = words_from(text, start);
    let first = words.first()?.to_string();

    for len in (2..=words.len()).rev() {
        let phrase = words[..len].join(" ");
        let chain = normalize_chain_alias(&phrase);
        if chain_id(&chain).is_some() {
            return Some((chain, first));
        }
    }

    Some((normalize_chain_alias(&first), first))
}

/// Whether the phrase at `start` carries an explicit "chain"/"network" suffix
fn has_chain_suffix(text: &str, start: usize) -> bool {
    let words = words_from(text, start);
    matches!(words.get(1), Some(&"chain") | Some(&"network"))
}

fn parse_amount(raw: &str) -> Option<f64> {
    raw.replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|a| a.is_finite())
}

/// Extract a partial intent from raw text without any network access
pub fn extract_local_intent(text: &str) -> PartialIntent {
    let t = text.to_lowercase();
    let mut out = PartialIntent::default();

    // 1. amount + source token
    if let Some(caps) = AMOUNT_TOKEN_RE.captures(&t) {
        out.amount = parse_amount(&caps[1]);
        out.source_token = Some(normalize_token_symbol(&caps[2]));
    }

    // 2. token pair, overrides rule 1's token
    if let Some(caps) = PAIR_RE.captures(&t) {
        out.source_token = Some(normalize_token_symbol(&caps[1]));
        out.target_token = Some(normalize_token_symbol(&caps[2]));
    }

    // 3. target token
    if out.target_token.is_none() {
        out.target_token = TARGET_RE
            .captures_iter(&t)
            .map(|caps| caps[1].to_string())
            .find(|word| !TARGET_STOPWORDS.contains(&word.as_str()))
            .map(|word| normalize_token_symbol(&word));
    }

    // 4. bare source token
    if out.source_token.is_none() {
        if let Some(caps) = SOURCE_RE.captures(&t) {
            out.source_token = Some(normalize_token_symbol(&caps[1]));
        }
    }

    // 5. "on <chain>" occurrences
    let on_chains: Vec<String> = ON_RE
        .captures_iter(&t)
        .filter_map(|caps| caps.get(1))
        .filter_map(|m| chain_phrase_at(&t, m.start()))
        .map(|(chain, _)| chain)
        .filter(|chain| !chain.is_empty())
        .collect();

    match on_chains.as_slice() {
        [] => {}
        [only] => {
            let idx_to = t.find(" to ");
            let idx_on = t.find(" on ");
            let after_to = matches!((idx_to, idx_on), (Some(to), Some(on)) if on > to);
            if after_to {
                out.target_chain = Some(only.clone());
                // "swap usdt to eth on base": one chain for a same-chain swap
                if out.source_token.is_some() && out.target_token.is_some() {
                    out.source_chain = Some(only.clone());
                }
            } else {
                out.source_chain = Some(only.clone());
            }
        }
        [first, second, ..] => {
            out.source_chain = Some(first.clone());
            out.target_chain = Some(second.clone());
        }
    }

    // 6. "from <chain>" overrides the source chain
    if let Some(m) = FROM_RE.captures(&t).and_then(|caps| caps.get(1)) {
        if let Some((chain, first)) = chain_phrase_at(&t, m.start()) {
            if !chain.is_empty() && !is_token_word(&first) {
                out.source_chain = Some(chain);
            }
        }
    }

    // 7. "to <chain>" overrides the target chain, skipping token words
    let to_chain = TO_RE
        .captures_iter(&t)
        .filter_map(|caps| caps.get(1))
        .filter_map(|m| {
            let (chain, first) = chain_phrase_at(&t, m.start())?;
            if is_token_word(&first) && !has_chain_suffix(&t, m.start()) {
                return None;
            }
            chain_id(&chain).map(|_| chain)
        })
        .next();
    if let Some(chain) = to_chain {
        out.target_chain = Some(chain);
    }

    debug!("Local intent for '{}': {:?}", t, out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> Option<String> {
        Some(v.to_string())
    }

    #[test]
    fn test_scenario_swap_to_on_base() {
        let p = extract_local_intent("swap 100 usdt to eth on base");
        assert_eq!(p.source_token, s("USDT"));
        assert_eq!(p.target_token, s("ETH"));
        assert_eq!(p.amount, Some(100.0));
        assert_eq!(p.source_chain, s("base"));
        assert_eq!(p.target_chain, s("base"));
    }

    #[test]
    fn test_source_token_only() {
        let p = extract_local_intent("I want to swap USDT");
        assert_eq!(p.source_token, s("USDT"));
        assert!(p.target_token.is_none());
        assert!(p.amount.is_none());
        assert!(p.source_chain.is_none());
        assert!(p.target_chain.is_none());
    }

    #[test]
    fn test_bridge_from_to() {
        let p = extract_local_intent("bridge usdc from polygon to arbitrum");
        assert_eq!(p.source_token, s("USDC"));
        assert!(p.target_token.is_none());
        assert!(p.amount.is_none());
        assert_eq!(p.source_chain, s("polygon"));
        assert_eq!(p.target_chain, s("arbitrum"));
    }

    #[test]
    fn test_unknown_to_chain_is_not_taken() {
        let p = extract_local_intent("bridge usdc from polygon to fantom");
        assert_eq!(p.source_chain, s("polygon"));
        assert!(p.target_chain.is_none());
    }

    #[test]
    fn test_comma_decimal_amount() {
        let p = extract_local_intent("bridge 2,5 eth");
        assert_eq!(p.amount, Some(2.5));
        assert_eq!(p.source_token, s("ETH"));
    }

    #[test]
    fn test_pair_overrides_amount_token() {
        let p = extract_local_intent("swap 3 weth for dai");
        assert_eq!(p.amount, Some(3.0));
        assert_eq!(p.source_token, s("WETH"));
        assert_eq!(p.target_token, s("DAI"));
    }

    #[test]
    fn test_convert_into() {
        let p = extract_local_intent("convert tether into usdc");
        assert_eq!(p.source_token, s("USDT"));
        assert_eq!(p.target_token, s("USDC"));
    }

    #[test]
    fn test_target_rules() {
        let p = extract_local_intent("I want to get dai");
        assert_eq!(p.target_token, s("DAI"));

        let p = extract_local_intent("sell matic and receive usdc");
        assert_eq!(p.source_token, s("MATIC"));
        assert_eq!(p.target_token, s("USDC"));
    }

    #[test]
    fn test_target_does_not_override_pair() {
        let p = extract_local_intent("swap usdt to eth, I want weth actually");
        assert_eq!(p.target_token, s("ETH"));
    }

    #[test]
    fn test_single_on_before_to_is_source() {
        let p = extract_local_intent("on arbitrum swap 10 usdc to dai");
        assert_eq!(p.source_chain, s("arbitrum"));
        assert!(p.target_chain.is_none());
    }

    #[test]
    fn test_two_on_occurrences() {
        let p = extract_local_intent("swap 1 eth on ethereum for usdc on optimism");
        assert_eq!(p.source_chain, s("ethereum"));
        assert_eq!(p.target_chain, s("optimism"));
    }

    #[test]
    fn test_multi_word_chain_phrases() {
        let p = extract_local_intent("bridge 5 usdc from arbitrum one to binance smart chain");
        assert_eq!(p.source_chain, s("arbitrum"));
        assert_eq!(p.target_chain, s("bsc"));
    }

    #[test]
    fn test_to_token_word_is_not_chain() {
        let p = extract_local_intent("swap 10 usdc to eth");
        assert!(p.target_chain.is_none());

        let p = extract_local_intent("bridge 10 usdc to bnb chain");
        assert_eq!(p.target_chain, s("bsc"));
    }

    #[test]
    fn test_from_overrides_on() {
        let p = extract_local_intent("bridge 4 dai on base from polygon");
        assert_eq!(p.source_chain, s("polygon"));
    }

    #[test]
    fn test_on_the_chain() {
        let p = extract_local_intent("sell 2 avax on the avalanche network");
        assert_eq!(p.source_chain, s("avalanche"));
    }

    #[test]
    fn test_unrelated_text_is_empty() {
        assert!(extract_local_intent("hello there").is_empty());
        assert!(extract_local_intent("").is_empty());
    }
}
