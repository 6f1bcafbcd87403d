//! An immutable list of search terms plus derived facts about it.

use std::fmt;
use std::sync::OnceLock;

use super::describe;
use super::parse;
use super::predicate::Predicate;
use super::term::{Operator, Term};
use crate::directory::{self, Directory};
use crate::message::{Message, MessageId, MessageList, UserId};

/// Order in which term types are considered when bucketing a narrow.
/// Unlisted types sort after all of these.
const TERM_TYPE_LEVELS: &[&str] = &[
    "in",
    "streams-public",
    "stream",
    "topic",
    "pm-with",
    "group-pm-with",
    "sender",
    "near",
    "id",
    "is-alerted",
    "is-mentioned",
    "is-private",
    "is-starred",
    "is-unread",
    "has-link",
    "has-image",
    "has-attachment",
    "search",
];

#[derive(Default)]
pub struct Filter {
    terms: Vec<Term>,
    predicate: OnceLock<Predicate>,
}

impl Filter {
    pub fn new(terms: Vec<Term>) -> Self {
        Self {
            terms,
            predicate: OnceLock::new(),
        }
    }

    /// Build a filter from search-bar text.
    pub fn parse(raw: &str) -> Self {
        Self::new(parse::parse(raw))
    }

    /// Owned copy of the terms.
    pub fn operators(&self) -> Vec<Term> {
        self.terms.clone()
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Negated terms do not count, except for `search` and `has`.
    pub fn has_operator(&self, name: &str) -> bool {
        self.terms.iter().any(|term| {
            if term.negated && !matches!(term.operator, Operator::Search(_) | Operator::Has(_)) {
                return false;
            }
            term.name() == name
        })
    }

    pub fn has_operand(&self, name: &str, operand: &str) -> bool {
        self.terms
            .iter()
            .any(|term| !term.negated && term.name() == name && term.operand_matches(operand))
    }

    pub fn has_negated_operand(&self, name: &str, operand: &str) -> bool {
        self.terms
            .iter()
            .any(|term| term.negated && term.name() == name && term.operand_matches(operand))
    }

    /// Operands of the non-negated terms with this operator, in order.
    pub fn operands(&self, name: &str) -> Vec<&str> {
        self.terms
            .iter()
            .filter(|term| !term.negated && term.name() == name)
            .map(|term| term.operand())
            .collect()
    }

    pub fn is_search(&self) -> bool {
        self.has_operator("search")
    }

    /// Full-text search needs the server's index; everything else can be
    /// evaluated against cached messages.
    pub fn can_apply_locally(&self) -> bool {
        !self
            .terms
            .iter()
            .any(|term| matches!(term.operator, Operator::Search(_)))
    }

    pub fn predicate(&self) -> &Predicate {
        self.predicate.get_or_init(|| Predicate::compile(&self.terms))
    }

    pub fn matches(&self, message: &Message, directory: &dyn Directory) -> bool {
        self.predicate().matches(message, directory)
    }

    #[cfg(test)]
    pub(crate) fn predicate_is_compiled(&self) -> bool {
        self.predicate.get().is_some()
    }

    /// First id (in the given order) that matches this filter. Ids we have no
    /// cached message for are assumed to match.
    pub fn first_valid_id_from(
        &self,
        ids: &[MessageId],
        messages: &MessageList,
        directory: &dyn Directory,
    ) -> Option<MessageId> {
        ids.iter().copied().find(|&id| match messages.get(id) {
            Some(message) => self.matches(message, directory),
            None => true,
        })
    }

    pub fn sorted_term_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.terms.iter().map(Term::term_type).collect();
        types.sort_by(|a, b| {
            term_type_level(a)
                .cmp(&term_type_level(b))
                .then_with(|| a.cmp(b))
        });
        types
    }

    /// True if the leading sorted term types are exactly `wanted`.
    pub fn can_bucket_by(&self, wanted: &[&str]) -> bool {
        let types = self.sorted_term_types();
        types.len() >= wanted.len()
            && types.iter().take(wanted.len()).zip(wanted).all(|(a, b)| a == b)
    }

    pub fn has_topic(&self, stream: &str, topic: &str) -> bool {
        self.has_operand("stream", stream) && self.has_operand("topic", topic)
    }

    /// Same filter with every non-negated topic replaced.
    pub fn filter_with_new_topic(&self, topic: &str) -> Self {
        Self::new(
            self.terms
                .iter()
                .map(|term| match term.operator {
                    Operator::Topic(_) if !term.negated => Term {
                        operator: Operator::Topic(topic.to_string()),
                        negated: false,
                    },
                    _ => term.clone(),
                })
                .collect(),
        )
    }

    /// New filter with `user_id`'s address rewritten in email operands.
    /// Other operators (including streams that look like emails) are untouched.
    pub fn with_updated_email(
        &self,
        user_id: UserId,
        new_email: &str,
        directory: &dyn Directory,
    ) -> Self {
        let new_email = new_email.to_lowercase();
        let rewrite = |emails: &str| {
            directory::update_email_in_reply_to(directory, emails, user_id, &new_email)
        };
        Self::new(
            self.terms
                .iter()
                .map(|term| {
                    let operator = match &term.operator {
                        Operator::PmWith(emails) => Operator::PmWith(rewrite(emails)),
                        Operator::Sender(email) => Operator::Sender(rewrite(email)),
                        Operator::GroupPmWith(email) => Operator::GroupPmWith(rewrite(email)),
                        other => other.clone(),
                    };
                    Term {
                        operator,
                        negated: term.negated,
                    }
                })
                .collect(),
        )
    }

    /// Search-bar form of this filter.
    pub fn unparse(&self) -> String {
        parse::unparse(&self.terms)
    }

    /// Human readable summary, e.g. "stream Denmark > tennis".
    pub fn describe(&self) -> String {
        describe::describe(&self.terms)
    }
}

fn term_type_level(term_type: &str) -> usize {
    TERM_TYPE_LEVELS
        .iter()
        .position(|level| *level == term_type)
        .unwrap_or(999)
}

impl Clone for Filter {
    /// The memoized predicate is rebuilt lazily by the clone.
    fn clone(&self) -> Self {
        Self::new(self.terms.clone())
    }
}

impl PartialEq for Filter {
    fn eq(&self, other: &Self) -> bool {
        self.terms == other.terms
    }
}

impl Eq for Filter {}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filter").field("terms", &self.terms).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::test_directory;

    #[test]
    fn test_operators_is_a_copy() {
        let filter = Filter::parse("stream:Denmark topic:tennis");
        let mut ops = filter.operators();
        ops.clear();
        assert_eq!(filter.terms().len(), 2);
    }

    #[test]
    fn test_has_operator_ignores_negated() {
        let filter = Filter::parse("-stream:Denmark -has:link");
        assert!(!filter.has_operator("stream"));
        assert!(filter.has_operator("has"));
        assert!(filter.has_negated_operand("stream", "denmark"));
        assert!(!filter.has_operand("stream", "Denmark"));
    }

    #[test]
    fn test_has_operand_case_rules() {
        let filter = Filter::parse("stream:Denmark topic:Tennis near:42");
        assert!(filter.has_operand("stream", "DENMARK"));
        assert!(filter.has_operand("topic", "tennis"));
        assert!(filter.has_operand("near", "42"));
        assert!(filter.has_topic("denmark", "TENNIS"));
        assert!(!filter.has_operand("near", "43"));
    }

    #[test]
    fn test_operands() {
        let filter = Filter::parse("topic:a -topic:b topic:c");
        assert_eq!(filter.operands("topic"), vec!["a", "c"]);
        assert!(filter.operands("stream").is_empty());
    }

    #[test]
    fn test_can_apply_locally() {
        for (raw, local) in [
            ("stream:Denmark", true),
            ("is:private", true),
            ("", true),
            ("hello", false),
            ("stream:Denmark hello", false),
            ("has:image", true),
        ] {
            let filter = Filter::parse(raw);
            assert_eq!(filter.can_apply_locally(), local, "{raw}");
            assert_eq!(filter.is_search(), !local, "{raw}");
        }
    }

    #[test]
    fn test_predicate_is_memoized() {
        let filter = Filter::parse("stream:Denmark");
        let first: *const Predicate = filter.predicate();
        let second: *const Predicate = filter.predicate();
        assert_eq!(first, second);
    }

    #[test]
    fn test_first_valid_id_from() {
        let dir = test_directory();
        let messages = MessageList::from_messages([
            Message::stream_message(10, "Sweden", "t"),
            Message::stream_message(20, "Denmark", "t"),
        ]);
        let filter = Filter::parse("stream:Denmark");
        assert_eq!(filter.first_valid_id_from(&[10, 20], &messages, &dir), Some(20));
        // Unknown ids are optimistically accepted
        assert_eq!(filter.first_valid_id_from(&[10, 15, 20], &messages, &dir), Some(15));
        assert_eq!(filter.first_valid_id_from(&[10], &messages, &dir), None);
    }

    #[test]
    fn test_sorted_term_types() {
        let filter = Filter::parse("is:starred topic:t stream:s wat:x");
        assert_eq!(
            filter.sorted_term_types(),
            vec!["stream", "topic", "is-starred", "wat"]
        );
        assert!(filter.can_bucket_by(&["stream", "topic"]));
        assert!(!filter.can_bucket_by(&["topic"]));
        assert!(Filter::parse("is:private").can_bucket_by(&["is-private"]));
        assert!(!Filter::default().can_bucket_by(&["is-private"]));
    }

    #[test]
    fn test_filter_with_new_topic() {
        let filter = Filter::parse("stream:Denmark topic:old -topic:other");
        let moved = filter.filter_with_new_topic("new");
        assert_eq!(moved.unparse(), "stream:Denmark topic:new -topic:other");
    }

    #[test]
    fn test_with_updated_email() {
        let dir = test_directory();
        let filter = Filter::new(vec![
            Term::positive("stream", "alice@example.com"),
            Term::positive("pm-with", "alice@example.com,bob@example.com"),
            Term::negative("sender", "alice@example.com"),
        ]);
        let updated = filter.with_updated_email(4, "al@example.com", &dir);
        assert_eq!(updated.terms()[0].operand(), "alice@example.com");
        assert_eq!(updated.terms()[1].operand(), "al@example.com,bob@example.com");
        assert_eq!(updated.terms()[2].operand(), "al@example.com");
        assert!(updated.terms()[2].negated);
        // The source filter is unchanged
        assert_eq!(filter.terms()[1].operand(), "alice@example.com,bob@example.com");
    }

    #[test]
    fn test_clone_and_eq() {
        let filter = Filter::parse("stream:Denmark");
        filter.predicate();
        let copy = filter.clone();
        assert_eq!(filter, copy);
        assert_ne!(filter, Filter::parse("stream:Sweden"));
    }
}
