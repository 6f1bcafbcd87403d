//! Compiled per-message tests for a list of terms.

use aho_corasick::AhoCorasick;
use regex::Regex;
use std::sync::LazyLock;

use super::term::{HasOperand, InOperand, IsOperand, Operator, Term};
use crate::directory::{self, Directory};
use crate::message::{Message, MessageId};

/// Markers in rendered content, indexed by [`HasOperand`] pattern id.
const LINK_PATTERN: usize = 0;
const IMAGE_PATTERN: usize = 1;
const ATTACHMENT_PATTERN: usize = 2;

static CONTENT_MARKERS: LazyLock<Option<AhoCorasick>> = LazyLock::new(|| {
    AhoCorasick::builder()
        .ascii_case_insensitive(true)
        .build(["<a ", "message_inline_image", "href=\"/user_uploads"])
        .map_err(|e| tracing::warn!("Failed to build content matcher: {}", e))
        .ok()
});

/// A single term, lowered into the form it is evaluated in.
#[derive(Debug)]
enum Matcher {
    /// Matches every message (near, search, unknown operators and operands)
    Always,
    Stream {
        name: String,
        related: Option<Regex>,
    },
    Topic {
        name: String,
        related: Option<Regex>,
    },
    Sender(String),
    PmWith(String),
    GroupPmWith(String),
    Is(IsOperand),
    InHome,
    Has(HasOperand),
    Id(Option<MessageId>),
}

#[derive(Debug)]
struct CompiledTerm {
    matcher: Matcher,
    negated: bool,
}

/// AND of all terms of a filter. Built once per filter and reused.
#[derive(Debug)]
pub struct Predicate {
    terms: Vec<CompiledTerm>,
}

impl Predicate {
    pub fn compile(terms: &[Term]) -> Self {
        Self {
            terms: terms
                .iter()
                .map(|term| CompiledTerm {
                    matcher: Matcher::compile(&term.operator),
                    negated: term.negated,
                })
                .collect(),
        }
    }

    pub fn matches(&self, message: &Message, directory: &dyn Directory) -> bool {
        self.terms.iter().all(|term| {
            let ok = term.matcher.matches(message, directory);
            if term.negated { !ok } else { ok }
        })
    }
}

impl Matcher {
    fn compile(operator: &Operator) -> Self {
        match operator {
            Operator::Stream(name) => Self::Stream {
                name: name.to_lowercase(),
                related: related_stream_regex(name),
            },
            Operator::Topic(name) => Self::Topic {
                name: name.to_lowercase(),
                related: related_topic_regex(name),
            },
            Operator::Sender(email) => Self::Sender(email.to_lowercase()),
            Operator::PmWith(emails) => Self::PmWith(directory::normalize_emails(emails)),
            Operator::GroupPmWith(email) => Self::GroupPmWith(email.trim().to_lowercase()),
            Operator::Is(IsOperand::Other(_)) => Self::Always,
            Operator::Is(operand) => Self::Is(operand.clone()),
            Operator::In(InOperand::Home) => Self::InHome,
            Operator::In(_) => Self::Always,
            Operator::Has(HasOperand::Other(_)) => Self::Always,
            Operator::Has(operand) => Self::Has(operand.clone()),
            Operator::Id(raw) => Self::Id(raw.trim().parse().ok()),
            Operator::Near(_) | Operator::Search(_) | Operator::Unknown { .. } => Self::Always,
        }
    }

    fn matches(&self, message: &Message, directory: &dyn Directory) -> bool {
        match self {
            Self::Always => true,
            Self::Stream { name, related } => {
                if !message.is_stream() {
                    return false;
                }
                if directory.is_zephyr_mirror_realm()
                    && let Some(re) = related
                {
                    return re.is_match(&message.stream);
                }
                // Prefer ids; fall back to names for streams we are not subscribed to
                if let Some(stream_id) = directory.stream_id(name)
                    && let Some(message_stream_id) = message.stream_id
                {
                    return message_stream_id == stream_id;
                }
                message.stream.to_lowercase() == *name
            }
            Self::Topic { name, related } => {
                if !message.is_stream() {
                    return false;
                }
                if directory.is_zephyr_mirror_realm()
                    && let Some(re) = related
                {
                    return re.is_match(&message.topic);
                }
                message.topic.to_lowercase() == *name
            }
            Self::Sender(email) => directory
                .email(message.sender_id)
                .unwrap_or_else(|| message.sender_email.clone())
                .eq_ignore_ascii_case(email),
            Self::PmWith(emails) => {
                message.is_private() && directory::normalize_emails(&message.reply_to) == *emails
            }
            Self::GroupPmWith(email) => {
                message.is_private()
                    && directory::split_emails(&message.reply_to)
                        .any(|e| e.eq_ignore_ascii_case(email))
            }
            Self::Is(operand) => match operand {
                IsOperand::Private => message.is_private(),
                IsOperand::Starred => message.is_starred(),
                IsOperand::Mentioned => message.is_mentioned(),
                IsOperand::Alerted => message.is_alerted(),
                IsOperand::Unread => message.is_unread(),
                IsOperand::Other(_) => true,
            },
            Self::InHome => {
                if message.is_private() {
                    return true;
                }
                match message.stream_id.or_else(|| directory.stream_id(&message.stream)) {
                    Some(stream_id) => directory.in_home_view(stream_id),
                    None => true,
                }
            }
            Self::Has(operand) => content_has(&message.content, operand),
            Self::Id(id) => *id == Some(message.id),
        }
    }
}

fn content_has(content: &str, operand: &HasOperand) -> bool {
    let Some(ac) = CONTENT_MARKERS.as_ref() else {
        return true;
    };
    let wanted = match operand {
        HasOperand::Link => LINK_PATTERN,
        HasOperand::Image => IMAGE_PATTERN,
        HasOperand::Attachment => ATTACHMENT_PATTERN,
        HasOperand::Other(_) => return true,
    };
    ac.find_overlapping_iter(content)
        .any(|m| m.pattern().as_usize() == wanted)
}

fn strip_dot_d(mut name: &str) -> &str {
    while let Some(base) = name.strip_suffix(".d") {
        name = base;
    }
    name
}

/// `un`-prefixed and `.d`-suffixed variants of a stream are the same stream in
/// mirrored realms.
fn related_stream_regex(operand: &str) -> Option<Regex> {
    let mut base = operand.to_lowercase();
    while let Some(rest) = base.strip_prefix("un") {
        base = rest.to_string();
    }
    let base = strip_dot_d(&base);
    build_regex(&format!(r"(?i)^(un)*{}(\.d)*$", regex::escape(base)))
}

/// `.d` variants of a topic match; the empty topic and "personal" are unified.
fn related_topic_regex(operand: &str) -> Option<Regex> {
    let lower = operand.to_lowercase();
    let base = strip_dot_d(&lower);
    if base.is_empty() || base == "personal" {
        build_regex(r#"(?i)^(|personal|\(instance ""\))(\.d)*$"#)
    } else {
        build_regex(&format!(r"(?i)^{}(\.d)*$", regex::escape(base)))
    }
}

fn build_regex(pattern: &str) -> Option<Regex> {
    match Regex::new(pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::warn!("Failed to build matcher '{}': {}", pattern, e);
            None
        }
    }
}
