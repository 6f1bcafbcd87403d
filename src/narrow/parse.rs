//! Search-bar syntax: `stream:Denmark -is:starred some words`.

use regex::Regex;
use std::sync::LazyLock;

use super::term::{Operator, Term};

/// An optional `operator:` (possibly followed by one space), then either a quoted
/// phrase or a run of non-space characters.
static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"([^\s:]+: ?)?("[^"]+"?|\S+)"#).expect("token regex"));

/// Parse a search string into terms.
///
/// Bare words are collected into a single `search` term, which is always last.
/// A negated `-search:` stays where it was written. Unknown operators are kept
/// as-is; nothing here rejects input.
pub fn parse(raw: &str) -> Vec<Term> {
    let mut terms = Vec::new();
    let mut search_words: Vec<String> = Vec::new();

    for token in TOKEN.find_iter(raw).map(|m| m.as_str()) {
        let Some((operator, rest)) = token.split_once(':') else {
            search_words.push(token.to_string());
            continue;
        };
        if token.starts_with('"') {
            search_words.push(token.to_string());
            continue;
        }

        let (negated, operator) = match operator.strip_prefix('-') {
            Some(name) => (true, name),
            None => (false, operator),
        };
        if operator.is_empty() {
            search_words.push(token.to_string());
            continue;
        }

        let operand = decode_operand(rest, operator);
        let term = Term::new(operator, &operand, negated);
        if let Operator::Search(text) = &term.operator {
            if text.is_empty() {
                continue;
            }
            if !term.negated {
                search_words.push(text.clone());
                continue;
            }
        }
        terms.push(term);
    }

    if !search_words.is_empty() {
        terms.push(Term::positive("search", &search_words.join(" ")));
    }
    terms
}

/// Serialize terms back into search-bar syntax.
pub fn unparse(terms: &[Term]) -> String {
    terms
        .iter()
        .map(|term| match &term.operator {
            Operator::Search(text) if !term.negated => unparse_search_text(text),
            op => format!(
                "{}{}:{}",
                if term.negated { "-" } else { "" },
                op.name(),
                encode_operand(op.operand())
            ),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Search words that would read back as `operator:operand` become `search:` tokens.
fn unparse_search_text(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            if word.contains(':') && !word.contains('"') {
                format!("search:{}", encode_operand(word))
            } else {
                word.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Escape characters that would otherwise split or alter an operand.
pub fn encode_operand(operand: &str) -> String {
    operand
        .replace('%', "%25")
        .replace('+', "%2B")
        .replace(' ', "+")
        .replace('"', "%22")
}

/// Inverse of [`encode_operand`]. Email operands keep `+` literally.
pub fn decode_operand(encoded: &str, operator: &str) -> String {
    let mut encoded = encoded.replace('"', "");
    if !Operator::is_email_operator(&operator.to_lowercase()) {
        encoded = encoded.replace('+', " ");
    }
    robust_uri_decode(&encoded).trim().to_string()
}

/// Percent-decode, leaving the input untouched if it does not decode to UTF-8.
pub fn robust_uri_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%'
            && let Some(hex) = s.get(i + 1..i + 3)
            && hex.bytes().all(|b| b.is_ascii_hexdigit())
            && let Ok(byte) = u8::from_str_radix(hex, 16)
        {
            out.push(byte);
            i += 3;
            continue;
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8(out).unwrap_or_else(|_| s.to_string())
}

/// `encodeURIComponent`: everything but unreserved characters is percent-encoded.
pub fn uri_encode_component(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            'a'..='z'
            | 'A'..='Z'
            | '0'..='9'
            | '-'
            | '_'
            | '.'
            | '!'
            | '~'
            | '*'
            | '\''
            | '('
            | ')' => result.push(c),
            _ => {
                let mut buf = [0u8; 4];
                for b in c.encode_utf8(&mut buf).as_bytes() {
                    result.push_str(&format!("%{:02X}", b));
                }
            }
        }
    }
    result
}
