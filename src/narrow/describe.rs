//! Plain-text descriptions of narrows, as shown in search suggestions.

use super::term::{HasOperand, IsOperand, Operator, Term};

/// Verb phrase for an operator, or None if the operator is unknown.
pub fn operator_to_prefix(operator: &Operator, negated: bool) -> Option<String> {
    if let Operator::Search(_) = operator {
        return Some(if negated { "exclude" } else { "search for" }.to_string());
    }
    let verb = if negated { "exclude " } else { "narrow to " };
    let noun = match operator {
        Operator::Stream(_) => "stream",
        Operator::Near(_) => "messages around",
        Operator::Has(_) => "messages with one or more",
        Operator::Id(_) => "message ID",
        Operator::Topic(_) => "topic",
        Operator::Sender(_) => "sent by",
        Operator::PmWith(_) => "private messages with",
        Operator::In(_) => "messages in",
        Operator::Is(_) => "messages that are",
        Operator::GroupPmWith(_) => "group private messages including",
        Operator::Search(_) | Operator::Unknown { .. } => return None,
    };
    Some(format!("{verb}{noun}"))
}

fn describe_is(operand: &IsOperand, negated: bool) -> String {
    let verb = if negated { "exclude " } else { "" };
    match operand {
        IsOperand::Private | IsOperand::Starred | IsOperand::Alerted | IsOperand::Unread => {
            format!("{verb}{} messages", operand.as_str())
        }
        IsOperand::Mentioned => format!("{verb}@-mentions"),
        IsOperand::Other(other) => format!("invalid {other} operand for is operator"),
    }
}

fn describe_term(term: &Term) -> String {
    match &term.operator {
        Operator::Is(operand) => describe_is(operand, term.negated),
        Operator::Has(HasOperand::Other(other)) => {
            format!("invalid {other} operand for has operator")
        }
        op => match operator_to_prefix(op, term.negated) {
            Some(prefix) => format!("{prefix} {}", op.operand()),
            None => "unknown operator".to_string(),
        },
    }
}

/// Describe a list of terms; a leading stream+topic pair reads "stream S > T".
pub fn describe(terms: &[Term]) -> String {
    if terms.is_empty() {
        return "all messages".to_string();
    }

    let mut parts = Vec::new();
    let mut rest = terms;
    if let [first, second, tail @ ..] = terms
        && !first.negated
        && !second.negated
        && let (Operator::Stream(stream), Operator::Topic(topic)) =
            (&first.operator, &second.operator)
    {
        parts.push(format!("stream {stream} > {topic}"));
        rest = tail;
    }

    parts.extend(rest.iter().map(describe_term));
    parts.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::narrow::parse::parse;

    #[test]
    fn test_describe_empty() {
        assert_eq!(describe(&[]), "all messages");
    }

    #[test]
    fn test_describe_stream_topic() {
        assert_eq!(
            describe(&parse("stream:Denmark topic:tennis -is:starred")),
            "stream Denmark > tennis, exclude starred messages"
        );
    }

    #[test]
    fn test_describe_terms() {
        assert_eq!(
            describe(&parse("sender:alice@example.com is:mentioned hello")),
            "narrow to sent by alice@example.com, @-mentions, search for hello"
        );
        assert_eq!(
            describe(&parse("-topic:golf near:12")),
            "exclude topic golf, narrow to messages around 12"
        );
        assert_eq!(
            describe(&parse("has:images")),
            "narrow to messages with one or more image"
        );
    }

    #[test]
    fn test_describe_invalid() {
        assert_eq!(
            describe(&parse("is:bogus")),
            "invalid bogus operand for is operator"
        );
        assert_eq!(
            describe(&parse("has:nothing")),
            "invalid nothing operand for has operator"
        );
        assert_eq!(describe(&parse("wat:ever")), "unknown operator");
    }
}
