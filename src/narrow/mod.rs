//! Narrowing: restricting the message view to what a search filter matches.

pub mod describe;
pub mod filter;
pub mod hash;
pub mod local;
pub mod parse;
pub mod predicate;
pub mod state;
pub mod term;

pub use filter::Filter;
pub use local::{IdInfo, LocalSelection, Target, maybe_add_local_messages};
pub use state::{ComposeDefaults, FirstUnread, NarrowContext, NarrowEnv};
pub use term::{HasOperand, InOperand, IsOperand, Operator, Term};

use crate::config::FetchConfig;
use crate::message::MessageId;

/// Where the server should center a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Id(MessageId),
    FirstUnread,
}

/// What the caller should do after activating a narrow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NarrowPlan {
    /// Everything needed is cached: render these messages and select `select_id`.
    RenderLocally {
        select_id: MessageId,
        message_ids: Vec<MessageId>,
    },
    /// Ask the server for messages around `anchor`.
    Fetch {
        anchor: Anchor,
        num_before: u32,
        num_after: u32,
        narrow: Vec<Term>,
    },
}

/// Result of [`activate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activation {
    pub id_info: IdInfo,
    pub plan: NarrowPlan,
}

/// Message a filter itself asks to center on (`id:` wins over `near:`).
pub fn target_from_filter(filter: &Filter) -> Option<Target> {
    let operand_id = |name: &str| -> Option<MessageId> {
        filter
            .operands(name)
            .first()
            .and_then(|raw| raw.trim().parse().ok())
    };
    operand_id("id")
        .map(Target::Explicit)
        .or_else(|| operand_id("near").map(Target::Near))
}

/// Make `terms` the active narrow and plan how to show it.
///
/// An empty term list returns to the home view and yields None.
pub fn activate(
    context: &mut NarrowContext,
    terms: Vec<Term>,
    then_select_id: Option<MessageId>,
    env: &NarrowEnv<'_>,
    fetch: &FetchConfig,
) -> Option<Activation> {
    if terms.is_empty() {
        tracing::debug!("Empty narrow, returning to home view");
        context.deactivate();
        return None;
    }

    let filter = Filter::new(terms);
    let target = target_from_filter(&filter).or(then_select_id.map(Target::Explicit));
    let selection = maybe_add_local_messages(&filter, target, env);
    let id_info = selection.id_info;

    let plan = match id_info.local_select_id {
        Some(select_id) => NarrowPlan::RenderLocally {
            select_id,
            message_ids: selection.message_ids(),
        },
        None => NarrowPlan::Fetch {
            anchor: id_info
                .final_select_id
                .map(Anchor::Id)
                .unwrap_or(Anchor::FirstUnread),
            num_before: fetch.num_before,
            num_after: fetch.num_after,
            narrow: filter.operators(),
        },
    };
    tracing::info!("Narrow {}: {:?}", filter.unparse(), plan);

    context.activate(filter);
    Some(Activation { id_info, plan })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::test_directory;
    use crate::message::{Message, MessageList};
    use crate::unread::UnreadIndex;

    fn run(raw: &str, then_select_id: Option<MessageId>) -> (NarrowContext, Option<Activation>) {
        let dir = test_directory();
        let mut messages = MessageList::from_messages(
            [10, 20, 30].map(|id| Message::stream_message(id, "Denmark", "tennis")),
        );
        messages.fetch_status.found_newest = true;
        let unread = UnreadIndex::new();
        let env = NarrowEnv {
            messages: &messages,
            unread: &unread,
            directory: &dir,
        };
        let mut context = NarrowContext::new();
        let activation = activate(
            &mut context,
            parse::parse(raw),
            then_select_id,
            &env,
            &FetchConfig::default(),
        );
        (context, activation)
    }

    #[test]
    fn test_target_from_filter() {
        assert_eq!(
            target_from_filter(&Filter::parse("near:42")),
            Some(Target::Near(42))
        );
        assert_eq!(
            target_from_filter(&Filter::parse("near:42 id:7")),
            Some(Target::Explicit(7))
        );
        assert_eq!(target_from_filter(&Filter::parse("near:abc")), None);
        assert_eq!(target_from_filter(&Filter::parse("stream:Denmark")), None);
    }

    #[test]
    fn test_activate_renders_locally() {
        let (context, activation) = run("stream:Denmark", None);
        assert!(context.active());
        let activation = activation.unwrap();
        assert_eq!(
            activation.plan,
            NarrowPlan::RenderLocally {
                select_id: 10,
                message_ids: vec![10, 20, 30],
            }
        );
    }

    #[test]
    fn test_activate_near_uses_operand() {
        let (_, activation) = run("stream:Denmark near:20", Some(10));
        let activation = activation.unwrap();
        assert_eq!(activation.id_info.target_id, Some(20));
        assert!(matches!(
            activation.plan,
            NarrowPlan::RenderLocally { select_id: 20, .. }
        ));
    }

    #[test]
    fn test_activate_search_fetches() {
        let (context, activation) = run("stream:Denmark hello", None);
        assert!(context.narrowed_to_search());
        let Some(Activation { plan, .. }) = activation else {
            panic!("expected an activation");
        };
        match plan {
            NarrowPlan::Fetch {
                anchor,
                num_before,
                num_after,
                narrow,
            } => {
                assert_eq!(anchor, Anchor::FirstUnread);
                assert_eq!(num_before, 50);
                assert_eq!(num_after, 50);
                assert_eq!(parse::unparse(&narrow), "stream:Denmark hello");
            }
            other => panic!("unexpected plan {other:?}"),
        }
    }

    #[test]
    fn test_activate_out_of_range_target_fetches_around_it() {
        let (_, activation) = run("stream:Denmark", Some(500));
        assert!(matches!(
            activation.unwrap().plan,
            NarrowPlan::Fetch {
                anchor: Anchor::Id(500),
                ..
            }
        ));
    }

    #[test]
    fn test_activate_no_matches_fetches_around_target() {
        let (_, activation) = run("stream:Denmark is:starred", Some(20));
        let activation = activation.unwrap();
        assert_eq!(activation.id_info.local_select_id, None);
        assert_eq!(activation.id_info.final_select_id, Some(20));
        assert_eq!(
            activation.plan,
            NarrowPlan::Fetch {
                anchor: Anchor::Id(20),
                num_before: 50,
                num_after: 50,
                narrow: parse::parse("stream:Denmark is:starred"),
            }
        );
    }

    #[test]
    fn test_activate_empty_goes_home() {
        let (context, activation) = run("", None);
        assert!(activation.is_none());
        assert!(!context.active());
    }
}
