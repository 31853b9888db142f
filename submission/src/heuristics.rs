//! Content heuristics for testimonial text.
//!
//! Each check is cheap and independent; any single hit is enough to flag the
//! submission. They run only after structural validation has passed.

use crate::SuspicionReason;

/// Length of an identical-character run that counts as filler.
pub const REPEATED_RUN_LIMIT: usize = 10;

const COMMERCIAL_VERBS: [&str; 4] = ["buy", "sell", "click", "visit"];

const CURRENCY_SYMBOLS: [char; 6] = ['$', '€', '£', '¥', '₹', '₿'];

const CURRENCY_WORDS: [&str; 10] = [
    "usd", "eur", "gbp", "dollar", "dollars", "euro", "euros", "bucks", "btc", "bitcoin",
];

/// Top-level domains that mark a bare `name.tld` token as a link.
const LINK_TLDS: [&str; 20] = [
    "com", "net", "org", "io", "co", "biz", "info", "xyz", "ru", "cn", "me", "ly", "gg", "app",
    "site", "online", "shop", "top", "store", "click",
];

/// Run every heuristic over `text`, returning the first that fires.
pub fn inspect(text: &str) -> Option<SuspicionReason> {
    if has_repeated_run(text, REPEATED_RUN_LIMIT) {
        return Some(SuspicionReason::RepeatedCharacters);
    }
    if contains_url(text) {
        return Some(SuspicionReason::EmbeddedUrl);
    }
    if contains_currency_amount(text) {
        return Some(SuspicionReason::CurrencyAmount);
    }
    if contains_commercial_verb(text) {
        return Some(SuspicionReason::CommercialLanguage);
    }
    None
}

/// Whether `text` holds `limit` or more identical characters in a row.
pub fn has_repeated_run(text: &str, limit: usize) -> bool {
    let mut previous = None;
    let mut run = 0usize;
    for c in text.chars() {
        if Some(c) == previous {
            run += 1;
        } else {
            previous = Some(c);
            run = 1;
        }
        if run >= limit {
            return true;
        }
    }
    false
}

pub fn contains_url(text: &str) -> bool {
    let lower = text.to_lowercase();
    if lower.contains("http://") || lower.contains("https://") || lower.contains("www.") {
        return true;
    }
    lower
        .split(|c: char| c.is_whitespace() || "()[]<>\"',;!?".contains(c))
        .any(looks_like_link)
}

fn looks_like_link(word: &str) -> bool {
    let word = word.trim_end_matches(['.', ':']);
    let host = word.split('/').next().unwrap_or_default();
    match host.rsplit_once('.') {
        Some((name, tld)) => {
            !name.is_empty()
                && name
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
                && LINK_TLDS.contains(&tld)
        }
        None => false,
    }
}

pub fn contains_currency_amount(text: &str) -> bool {
    let lower = text.to_lowercase();
    let words: Vec<&str> = lower.split_whitespace().collect();

    for (i, word) in words.iter().enumerate() {
        let has_symbol = word.chars().any(|c| CURRENCY_SYMBOLS.contains(&c));
        let has_digit = word.chars().any(|c| c.is_ascii_digit());
        if has_symbol && has_digit {
            return true;
        }
        // "$ 100" with the symbol on its own.
        if has_symbol && words.get(i + 1).is_some_and(|next| is_amount(next)) {
            return true;
        }
        if is_amount(word) {
            if let Some(next) = words.get(i + 1) {
                if CURRENCY_WORDS.contains(&strip_punctuation(next)) {
                    return true;
                }
            }
        }
        if CURRENCY_WORDS.contains(&strip_punctuation(word))
            && words.get(i + 1).is_some_and(|next| is_amount(next))
        {
            return true;
        }
    }
    false
}

/// Digits with optional grouping/decimal separators and a `k`/`m` suffix.
fn is_amount(word: &str) -> bool {
    let word = strip_punctuation(word);
    let word = word.trim_end_matches(['k', 'm']);
    !word.is_empty()
        && word.chars().next().is_some_and(|c| c.is_ascii_digit())
        && word.chars().all(|c| c.is_ascii_digit() || c == ',' || c == '.')
}

fn strip_punctuation(word: &str) -> &str {
    word.trim_matches(|c: char| !c.is_alphanumeric())
}

pub fn contains_commercial_verb(text: &str) -> bool {
    text.split(|c: char| !c.is_alphanumeric())
        .any(|w| COMMERCIAL_VERBS.iter().any(|verb| w.eq_ignore_ascii_case(verb)))
}
