//! Fetch window policy.

use sync_types::{Anchor, Direction, FetchWindow, MessageId};

/// Default page size for message history requests.
pub const DEFAULT_MESSAGES_PER_REQUEST: u32 = 50;

/// Computes anchor/before/after parameters for pagination requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowPolicy {
    messages_per_request: u32,
}

impl Default for WindowPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MESSAGES_PER_REQUEST)
    }
}

impl WindowPolicy {
    /// Page size is clamped to at least one message.
    pub fn new(messages_per_request: u32) -> Self {
        Self {
            messages_per_request: messages_per_request.max(1),
        }
    }

    pub fn messages_per_request(&self) -> u32 {
        self.messages_per_request
    }

    /// A full page extending away from the known boundary message.
    pub fn directional(&self, direction: Direction, boundary: MessageId) -> FetchWindow {
        let (num_before, num_after) = match direction {
            Direction::Older => (self.messages_per_request, 0),
            Direction::Newer => (0, self.messages_per_request),
        };
        FetchWindow {
            anchor: Anchor::Message(boundary),
            num_before,
            num_after,
        }
    }

    /// Half a page on each side of `anchor`, for opening a narrow fresh.
    pub fn centered(&self, anchor: Anchor) -> FetchWindow {
        let half = (self.messages_per_request / 2).max(1);
        FetchWindow {
            anchor,
            num_before: half,
            num_after: half,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn older_page_anchors_at_first_known_message() {
        let window = WindowPolicy::new(50).directional(Direction::Older, 1000);
        assert_eq!(
            window,
            FetchWindow {
                anchor: Anchor::Message(1000),
                num_before: 50,
                num_after: 0,
            }
        );
    }

    #[test]
    fn newer_page_extends_after_boundary() {
        let window = WindowPolicy::new(50).directional(Direction::Newer, 2000);
        assert_eq!(window.anchor, Anchor::Message(2000));
        assert_eq!((window.num_before, window.num_after), (0, 50));
    }

    #[test]
    fn centered_window_splits_page() {
        let window = WindowPolicy::new(50).centered(Anchor::FirstUnread);
        assert_eq!(window.anchor, Anchor::FirstUnread);
        assert_eq!((window.num_before, window.num_after), (25, 25));
    }

    #[test]
    fn every_window_requests_something() {
        for size in [0, 1, 2, 3, 50] {
            let policy = WindowPolicy::new(size);
            assert!(policy.centered(Anchor::Newest).is_valid());
            assert!(policy.directional(Direction::Older, 1).is_valid());
            assert!(policy.directional(Direction::Newer, 1).is_valid());
        }
    }
}
