//! Notifications emitted after feed changes are committed

use castsync_core::{Feed, FeedId, FeedItem};
use crossbeam_channel::{unbounded, Receiver, Sender};

/// Payload of a feed list notification
#[derive(Debug, Clone, PartialEq)]
pub enum FeedListUpdate {
    /// A feed was merged and committed
    Updated(Feed),
    /// The list changed but no feed object is available
    Empty,
    /// A feed was removed
    Removed(FeedId),
}

/// Payload of an item notification
#[derive(Debug, Clone, PartialEq)]
pub enum ItemEvent {
    /// The item's downloaded media file is gone
    MediaDeleted(FeedItem),
}

/// Receives notifications after store writes have completed
///
/// Delivery is fire-and-forget; implementations must not block.
pub trait EventSink: Send + Sync {
    /// Called once per committed merge
    fn on_feed_list_changed(&self, update: FeedListUpdate);

    /// Called when a single item changed outside of a merge
    fn on_item_changed(&self, event: ItemEvent);
}

/// Either kind of notification, as delivered by [`ChannelEventSink`]
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    /// See [`EventSink::on_feed_list_changed`]
    FeedList(FeedListUpdate),
    /// See [`EventSink::on_item_changed`]
    Item(ItemEvent),
}

/// Forwards every notification into a channel
#[derive(Debug, Clone)]
pub struct ChannelEventSink {
    sender: Sender<FeedEvent>,
}

impl ChannelEventSink {
    /// Creates a sink and the receiving end of its channel
    pub fn new() -> (Self, Receiver<FeedEvent>) {
        let (sender, receiver) = unbounded();
        (Self { sender }, receiver)
    }

    fn send(&self, event: FeedEvent) {
        if self.sender.send(event).is_err() {
            log::debug!("Event receiver dropped, discarding notification");
        }
    }
}

impl EventSink for ChannelEventSink {
    fn on_feed_list_changed(&self, update: FeedListUpdate) {
        self.send(FeedEvent::FeedList(update));
    }

    fn on_item_changed(&self, event: ItemEvent) {
        self.send(FeedEvent::Item(event));
    }
}

/// Discards every notification
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn on_feed_list_changed(&self, _update: FeedListUpdate) {}

    fn on_item_changed(&self, _event: ItemEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_sink_delivers_in_order() {
        let (sink, receiver) = ChannelEventSink::new();
        sink.on_feed_list_changed(FeedListUpdate::Empty);
        sink.on_item_changed(ItemEvent::MediaDeleted(FeedItem::new("x")));

        assert_eq!(
            receiver.try_recv().unwrap(),
            FeedEvent::FeedList(FeedListUpdate::Empty)
        );
        assert!(matches!(
            receiver.try_recv().unwrap(),
            FeedEvent::Item(ItemEvent::MediaDeleted(_))
        ));
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn test_dropped_receiver_is_ignored() {
        let (sink, receiver) = ChannelEventSink::new();
        drop(receiver);
        sink.on_feed_list_changed(FeedListUpdate::Removed(FeedId::new(1)));
    }
}
