//! Search terms: one operator, its operand and a negation flag.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IsOperand {
    Private,
    Starred,
    Mentioned,
    Alerted,
    Unread,
    Other(String),
}

impl IsOperand {
    fn from_keyword(operand: &str) -> Self {
        match operand {
            "private" => Self::Private,
            "starred" => Self::Starred,
            "mentioned" => Self::Mentioned,
            "alerted" => Self::Alerted,
            "unread" => Self::Unread,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Private => "private",
            Self::Starred => "starred",
            Self::Mentioned => "mentioned",
            Self::Alerted => "alerted",
            Self::Unread => "unread",
            Self::Other(s) => s,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InOperand {
    Home,
    All,
    Other(String),
}

impl InOperand {
    fn from_keyword(operand: &str) -> Self {
        match operand {
            "home" => Self::Home,
            "all" => Self::All,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Home => "home",
            Self::All => "all",
            Self::Other(s) => s,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HasOperand {
    Link,
    Image,
    Attachment,
    Other(String),
}

impl HasOperand {
    fn from_keyword(operand: &str) -> Self {
        // images -> image, etc.
        let singular = operand.strip_suffix('s').unwrap_or(operand);
        match singular {
            "link" => Self::Link,
            "image" => Self::Image,
            "attachment" => Self::Attachment,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Link => "link",
            Self::Image => "image",
            Self::Attachment => "attachment",
            Self::Other(s) => s,
        }
    }
}

/// Operator kinds, each carrying only the operand it needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operator {
    Stream(String),
    Topic(String),
    Sender(String),
    /// Comma-joined recipient emails
    PmWith(String),
    GroupPmWith(String),
    Is(IsOperand),
    In(InOperand),
    Has(HasOperand),
    /// Raw operand; only meaningful when it parses as a message id
    Near(String),
    Id(String),
    Search(String),
    /// Unrecognised operator, kept verbatim. Matches every message.
    Unknown { name: String, operand: String },
}

impl Operator {
    /// Build an operator from its textual name and operand, canonicalizing both.
    pub fn from_parts(name: &str, operand: &str) -> Self {
        let name = canonicalize_operator(name);
        match name.as_str() {
            "stream" => Self::Stream(operand.to_string()),
            "topic" => Self::Topic(operand.to_string()),
            "sender" => Self::Sender(operand.to_lowercase()),
            "pm-with" => Self::PmWith(operand.to_lowercase()),
            "group-pm-with" => Self::GroupPmWith(operand.to_lowercase()),
            "is" => Self::Is(IsOperand::from_keyword(&operand.to_lowercase())),
            "in" => Self::In(InOperand::from_keyword(&operand.to_lowercase())),
            "has" => Self::Has(HasOperand::from_keyword(&operand.to_lowercase())),
            "near" => Self::Near(operand.to_string()),
            "id" => Self::Id(operand.to_string()),
            // Some keyboards substitute curly quotes for straight ones
            "search" => Self::Search(operand.replace(['\u{201c}', '\u{201d}'], "\"")),
            _ => Self::Unknown {
                name,
                operand: operand.to_string(),
            },
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Stream(_) => "stream",
            Self::Topic(_) => "topic",
            Self::Sender(_) => "sender",
            Self::PmWith(_) => "pm-with",
            Self::GroupPmWith(_) => "group-pm-with",
            Self::Is(_) => "is",
            Self::In(_) => "in",
            Self::Has(_) => "has",
            Self::Near(_) => "near",
            Self::Id(_) => "id",
            Self::Search(_) => "search",
            Self::Unknown { name, .. } => name,
        }
    }

    pub fn operand(&self) -> &str {
        match self {
            Self::Stream(s)
            | Self::Topic(s)
            | Self::Sender(s)
            | Self::PmWith(s)
            | Self::GroupPmWith(s)
            | Self::Near(s)
            | Self::Id(s)
            | Self::Search(s) => s,
            Self::Is(op) => op.as_str(),
            Self::In(op) => op.as_str(),
            Self::Has(op) => op.as_str(),
            Self::Unknown { operand, .. } => operand,
        }
    }

    /// Stream, topic and email-like operands compare case-insensitively.
    pub fn is_case_insensitive(&self) -> bool {
        matches!(
            self,
            Self::Stream(_) | Self::Topic(_) | Self::Sender(_) | Self::PmWith(_) | Self::GroupPmWith(_)
        )
    }

    /// Operands that are email addresses, where `+` is a literal character.
    pub fn is_email_operator(name: &str) -> bool {
        matches!(name, "sender" | "from" | "pm-with" | "group-pm-with")
    }
}

/// Lower-case the operator and map synonyms to their canonical names.
pub fn canonicalize_operator(name: &str) -> String {
    let name = name.to_lowercase();
    match name.as_str() {
        "from" => "sender".to_string(),
        "subject" => "topic".to_string(),
        _ => name,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    pub operator: Operator,
    pub negated: bool,
}

impl Term {
    pub fn new(name: &str, operand: &str, negated: bool) -> Self {
        Self {
            operator: Operator::from_parts(name, operand),
            negated,
        }
    }

    pub fn positive(name: &str, operand: &str) -> Self {
        Self::new(name, operand, false)
    }

    pub fn negative(name: &str, operand: &str) -> Self {
        Self::new(name, operand, true)
    }

    pub fn name(&self) -> &str {
        self.operator.name()
    }

    pub fn operand(&self) -> &str {
        self.operator.operand()
    }

    /// Does this term's operand equal `value`, honouring the operator's case rule?
    pub fn operand_matches(&self, value: &str) -> bool {
        if self.operator.is_case_insensitive() {
            self.operand().to_lowercase() == value.to_lowercase()
        } else {
            self.operand() == value
        }
    }

    /// Bucketing key such as `stream`, `not-is-starred` or `has-link`.
    pub fn term_type(&self) -> String {
        let mut result = if self.negated {
            String::from("not-")
        } else {
            String::new()
        };
        result.push_str(self.name());
        if matches!(self.operator, Operator::Is(_) | Operator::In(_) | Operator::Has(_)) {
            result.push('-');
            result.push_str(self.operand());
        }
        result
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negated {
            write!(f, "-")?;
        }
        write!(f, "{}:{}", self.name(), self.operand())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonicalize_operator() {
        assert_eq!(canonicalize_operator("Stream"), "stream");
        assert_eq!(canonicalize_operator("from"), "sender");
        assert_eq!(canonicalize_operator("Subject"), "topic");
        assert_eq!(canonicalize_operator("whatever"), "whatever");
    }

    #[test]
    fn test_operand_canonicalization() {
        assert_eq!(
            Term::positive("from", "Alice@Example.com").operator,
            Operator::Sender("alice@example.com".to_string())
        );
        assert_eq!(
            Term::positive("has", "Images").operator,
            Operator::Has(HasOperand::Image)
        );
        assert_eq!(
            Term::positive("is", "STARRED").operator,
            Operator::Is(IsOperand::Starred)
        );
        // Stream and topic names keep their case
        assert_eq!(Term::positive("stream", "Denmark").operand(), "Denmark");
        assert_eq!(Term::positive("subject", "Tennis").operand(), "Tennis");
        assert_eq!(
            Term::positive("search", "\u{201c}hello\u{201d}").operand(),
            "\"hello\""
        );
    }

    #[test]
    fn test_unknown_operator_kept() {
        let term = Term::positive("Wat", "Foo");
        assert_eq!(term.name(), "wat");
        assert_eq!(term.operand(), "Foo");
        assert!(matches!(term.operator, Operator::Unknown { .. }));
    }

    #[test]
    fn test_operand_matches_case_rules() {
        assert!(Term::positive("stream", "Denmark").operand_matches("denmark"));
        assert!(Term::positive("topic", "Tennis").operand_matches("TENNIS"));
        assert!(Term::positive("near", "42").operand_matches("42"));
        assert!(!Term::positive("search", "Foo").operand_matches("foo"));
    }

    #[test]
    fn test_term_type() {
        assert_eq!(Term::positive("stream", "Denmark").term_type(), "stream");
        assert_eq!(Term::negative("is", "starred").term_type(), "not-is-starred");
        assert_eq!(Term::positive("has", "links").term_type(), "has-link");
        assert_eq!(Term::positive("search", "x").term_type(), "search");
    }

    #[test]
    fn test_display() {
        assert_eq!(Term::negative("is", "starred").to_string(), "-is:starred");
    }
}
