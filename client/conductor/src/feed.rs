//! The per-session feed the conductor's event reducer builds (§4.2's
//! projection, §5's backpressure policy): a bounded ring of renderable
//! items, oldest dropped first with a breadcrumb left behind.

use std::collections::VecDeque;

use agentsrv_protocol::ApprovalRiskCode;
use agentsrv_protocol::RequestId;
use agentsrv_protocol::TurnId;
use agentsrv_protocol_wire::ReasoningKind;

/// Default bound on a thread's feed (§5: "Feed buffers are bounded
/// (default 2 000 items per thread)").
pub const DEFAULT_FEED_CAPACITY: usize = 2_000;

/// One renderable item produced by folding server events.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedItem {
    UserMessage { client_message_id: String, text: String, optimistic: bool },
    AssistantMessage { turn_id: TurnId, text: String },
    Reasoning { turn_id: TurnId, kind: ReasoningKind, text: String },
    ToolCall { call_id: String, name: String },
    ToolResult { call_id: String, ok: bool, detail: String },
    Ask { request_id: RequestId, question: String },
    Approval { request_id: RequestId, command: String, dangerous: bool, reason_code: ApprovalRiskCode },
    Error { code: String, message: String },
    /// Left behind whenever the feed truncates its oldest items.
    Breadcrumb { dropped: usize },
}

/// A capacity-bounded feed for a single thread.
///
/// Oldest items are evicted once `capacity` is exceeded; a single
/// [`FeedItem::Breadcrumb`] absorbs however many were dropped since the
/// last breadcrumb, so the UI can render "12 earlier items trimmed"
/// instead of one line per eviction.
#[derive(Debug, Clone)]
pub struct Feed {
    items: VecDeque<FeedItem>,
    capacity: usize,
}

impl Feed {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity.min(64)),
            capacity,
        }
    }

    pub fn push(&mut self, item: FeedItem) {
        self.items.push_back(item);
        self.evict_if_needed();
    }

    fn evict_if_needed(&mut self) {
        if self.items.len() <= self.capacity {
            return;
        }
        let mut dropped = 0;
        while self.items.len() > self.capacity {
            self.items.pop_front();
            dropped += 1;
        }
        match self.items.front() {
            Some(FeedItem::Breadcrumb { .. }) => {
                if let Some(FeedItem::Breadcrumb { dropped: existing }) = self.items.front_mut() {
                    *existing += dropped;
                }
            }
            _ => self.items.push_front(FeedItem::Breadcrumb { dropped }),
        }
    }

    /// Replace an optimistic user-message placeholder with its server
    /// echo, suppressing the duplicate (§4.4 optimistic send).
    pub fn reconcile_echo(&mut self, client_message_id: &str) -> bool {
        if let Some(item) = self.items.iter_mut().find(|item| {
            matches!(item, FeedItem::UserMessage { client_message_id: id, optimistic: true, .. } if id == client_message_id)
        }) {
            if let FeedItem::UserMessage { optimistic, .. } = item {
                *optimistic = false;
            }
            true
        } else {
            false
        }
    }

    pub fn items(&self) -> impl Iterator<Item = &FeedItem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Default for Feed {
    fn default() -> Self {
        Self::new(DEFAULT_FEED_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eviction_past_capacity_leaves_one_breadcrumb() {
        let mut feed = Feed::new(2);
        for i in 0..5 {
            feed.push(FeedItem::AssistantMessage {
                turn_id: TurnId::from(format!("t{i}")),
                text: i.to_string(),
            });
        }
        assert_eq!(feed.len(), 3);
        assert!(matches!(feed.items().next(), Some(FeedItem::Breadcrumb { dropped: 3 })));
    }

    #[test]
    fn reconcile_echo_clears_optimistic_flag() {
        let mut feed = Feed::new(10);
        feed.push(FeedItem::UserMessage {
            client_message_id: "c1".to_string(),
            text: "hi".to_string(),
            optimistic: true,
        });
        assert!(feed.reconcile_echo("c1"));
        let item = feed.items().next().unwrap();
        assert!(matches!(item, FeedItem::UserMessage { optimistic: false, .. }));
    }

    #[test]
    fn reconcile_echo_of_unknown_id_is_a_noop() {
        let mut feed = Feed::new(10);
        assert!(!feed.reconcile_echo("missing"));
    }
}
