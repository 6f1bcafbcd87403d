//! URL fragment form of a narrow: `#narrow/stream/Denmark/topic/tennis`.

use super::parse::{robust_uri_decode, uri_encode_component};
use super::term::Term;

/// URI-encode, then make the result safe for fragments that some browsers
/// would otherwise decode: `.` becomes `%2E`, and `%` becomes `.`.
pub fn encode_hash_component(s: &str) -> String {
    uri_encode_component(s).replace('.', "%2E").replace('%', ".")
}

pub fn decode_hash_component(s: &str) -> String {
    robust_uri_decode(&s.replace('.', "%"))
}

pub fn operators_to_hash(terms: &[Term]) -> String {
    if terms.is_empty() {
        return "#".to_string();
    }
    let mut hash = String::from("#narrow");
    for term in terms {
        hash.push('/');
        if term.negated {
            hash.push('-');
        }
        hash.push_str(&encode_hash_component(term.name()));
        hash.push('/');
        hash.push_str(&encode_hash_component(term.operand()));
    }
    hash
}

/// Parse a `#narrow/...` fragment. Returns None if an operator lacks an operand.
pub fn parse_narrow(hash: &str) -> Option<Vec<Term>> {
    let path = hash.trim_start_matches('#');
    let mut parts = path.split('/');
    if parts.next() != Some("narrow") {
        return None;
    }

    let mut terms = Vec::new();
    while let Some(raw_operator) = parts.next() {
        let operator = decode_hash_component(raw_operator);
        if operator.is_empty() {
            break;
        }
        let raw_operand = parts.next().filter(|s| !s.is_empty())?;
        let (negated, operator) = match operator.strip_prefix('-') {
            Some(name) => (true, name.to_string()),
            None => (false, operator),
        };
        let operand = decode_hash_component(raw_operand);
        terms.push(Term::new(&operator, &operand, negated));
    }
    Some(terms)
}
