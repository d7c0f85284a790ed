//! Recipient checks for ENS names and Solana addresses

use regex::Regex;
use std::sync::LazyLock;

static ENS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9-]+(?:\.[a-z0-9-]+)*\.eth$").expect("valid ens regex")
});

static SPOKEN_DOT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bdot\b").expect("valid dot regex"));

static SPOKEN_DASH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:dash|minus)\b").expect("valid dash regex"));

static ENS_ILLEGAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9.-]").expect("valid ens charset regex"));

const BASE58_ALPHABET: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Turn a spelled-out name ("vitalik dot eth") into a candidate ENS name
pub fn normalize_spelled_ens(spoken: &str) -> String {
    let lowered = spoken.to_lowercase();
    let s = SPOKEN_DOT_RE.replace_all(&lowered, ".");
    let s = SPOKEN_DASH_RE.replace_all(&s, "-");
    let mut s: String = s.chars().filter(|c| !c.is_whitespace()).collect();

    if !s.ends_with(".eth") {
        if let Some(idx) = s.find("eth") {
            s.truncate(idx);
            s.push_str(".eth");
        }
    }

    ENS_ILLEGAL_RE.replace_all(&s, "").into_owned()
}

pub fn is_valid_ens(name: &str) -> bool {
    ENS_RE.is_match(name)
}

/// 32 to 44 base58 characters
pub fn is_valid_solana_address(address: &str) -> bool {
    let address = address.trim();
    (32..=44).contains(&address.len()) && address.chars().all(|c| BASE58_ALPHABET.contains(c))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spelled_ens() {
        assert_eq!(normalize_spelled_ens("vitalik dot eth"), "vitalik.eth");
        assert_eq!(normalize_spelled_ens("my dash wallet dot eth"), "my-wallet.eth");
        assert_eq!(normalize_spelled_ens("Nick Johnson eth"), "nickjohnson.eth");
        assert_eq!(normalize_spelled_ens("alice.eth"), "alice.eth");
        assert_eq!(normalize_spelled_ens("bob!"), "bob");
    }

    #[test]
    fn test_ens_validity() {
        assert!(is_valid_ens("vitalik.eth"));
        assert!(is_valid_ens("pay.my-shop.eth"));
        assert!(!is_valid_ens("vitalik"));
        assert!(!is_valid_ens(".eth"));
        assert!(!is_valid_ens("Vitalik.eth"));
    }

    #[test]
    fn test_solana_address() {
        assert!(is_valid_solana_address("9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM"));
        assert!(is_valid_solana_address("So11111111111111111111111111111111111111112"));
        assert!(!is_valid_solana_address("0x1234567890abcdef1234567890abcdef12345678"));
        assert!(!is_valid_solana_address("short"));
        assert!(!is_valid_solana_address("0OIl0OIl0OIl0OIl0OIl0OIl0OIl0OIl"));
    }
}
