//! Yes/no classification of confirmation replies

use regex::Regex;
use std::sync::LazyLock;

static YES_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:yes|yeah|yup|ok|okay|sure|confirm|do it|execute|go ahead)\b")
        .expect("valid affirmative regex")
});

static NO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:no|nah|nope|cancel|stop|not now)\b").expect("valid negative regex")
});

/// How a confirmation reply was understood
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplyKind {
    Affirmative,
    Negative,
    Unclear,
}

/// Classify a reply by its leading word or phrase
///
/// Affirmative is checked first; anything else, including empty text, is
/// unclear.
pub fn classify_reply(text: &str) -> ReplyKind {
    let t = text.to_lowercase();
    let t = t.trim();
    if YES_RE.is_match(t) {
        ReplyKind::Affirmative
    } else if NO_RE.is_match(t) {
        ReplyKind::Negative
    } else {
        ReplyKind::Unclear
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_affirmative() {
        for reply in ["yes", "Yes.", "yeah sure", "ok", "Okay then", "do it", "go ahead", "execute", "  confirm  "] {
            assert_eq!(classify_reply(reply), ReplyKind::Affirmative, "{:?}", reply);
        }
    }

    #[test]
    fn test_negative() {
        for reply in ["no", "Nope thanks", "nah", "cancel that", "stop", "not now"] {
            assert_eq!(classify_reply(reply), ReplyKind::Negative, "{:?}", reply);
        }
    }

    #[test]
    fn test_unclear() {
        for reply in ["", "maybe", "I said yes", "yesterday", "nothing", "okey"] {
            assert_eq!(classify_reply(reply), ReplyKind::Unclear, "{:?}", reply);
        }
    }
}
