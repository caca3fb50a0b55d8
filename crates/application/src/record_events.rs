use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use scholardesk_core::{AppError, AppResult, RecordId};
use scholardesk_domain::{Record, RecordKind};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::warn;

/// Default number of buffered events per record kind.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Change notification for one record kind.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordEvent<R> {
    /// Record was created or changed.
    Upserted(R),
    /// Record was removed.
    Deleted(RecordId),
}

impl<R: Record> RecordEvent<R> {
    /// Returns the affected record id.
    #[must_use]
    pub fn record_id(&self) -> RecordId {
        match self {
            Self::Upserted(record) => record.id(),
            Self::Deleted(record_id) => *record_id,
        }
    }
}

type ChannelMap = HashMap<RecordKind, Box<dyn Any + Send + Sync>>;

/// In-process publish/subscribe hub with one typed channel per record kind.
///
/// Clones share the same channels.
#[derive(Clone)]
pub struct RecordEventBus {
    channels: Arc<Mutex<ChannelMap>>,
    capacity: usize,
}

impl Default for RecordEventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

impl std::fmt::Debug for RecordEventBus {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("RecordEventBus")
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

impl RecordEventBus {
    /// Creates a bus buffering up to `capacity` events per kind.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: Arc::new(Mutex::new(HashMap::new())),
            capacity: capacity.max(1),
        }
    }

    /// Publishes one event and returns how many subscribers received it.
    pub fn publish<R: Record>(&self, event: RecordEvent<R>) -> AppResult<usize> {
        Ok(self.sender::<R>()?.send(event).unwrap_or(0))
    }

    /// Subscribes to events for `R`; dropping the subscription unsubscribes.
    pub fn subscribe<R: Record>(&self) -> AppResult<RecordSubscription<R>> {
        Ok(RecordSubscription {
            receiver: self.sender::<R>()?.subscribe(),
        })
    }

    fn sender<R: Record>(&self) -> AppResult<broadcast::Sender<RecordEvent<R>>> {
        let mut channels = self.channels.lock().unwrap_or_else(PoisonError::into_inner);
        let capacity = self.capacity;
        channels
            .entry(R::KIND)
            .or_insert_with(|| Box::new(broadcast::channel::<RecordEvent<R>>(capacity).0))
            .downcast_ref::<broadcast::Sender<RecordEvent<R>>>()
            .cloned()
            .ok_or_else(|| {
                AppError::Internal(format!(
                    "event channel for kind '{}' carries a different record type",
                    R::KIND
                ))
            })
    }
}

/// Live subscription to one record kind's events.
#[derive(Debug)]
pub struct RecordSubscription<R> {
    receiver: broadcast::Receiver<RecordEvent<R>>,
}

impl<R: Record> RecordSubscription<R> {
    /// Waits for the next event; returns `None` once the bus is gone.
    ///
    /// Events dropped because this subscriber fell behind are skipped.
    pub async fn recv(&mut self) -> Option<RecordEvent<R>> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(kind = R::KIND.as_str(), skipped, "record event subscriber lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use scholardesk_core::RecordId;
    use scholardesk_domain::{
        Presentation, PresentationFormat, PresentationInput, Record, TeachingLog,
    };

    use super::{RecordEvent, RecordEventBus};

    fn presentation() -> Presentation {
        Presentation::new(
            RecordId::new(),
            PresentationInput {
                title: "Contrastive pretraining".to_owned(),
                event_name: "ACL".to_owned(),
                format: PresentationFormat::Talk,
                presented_on: None,
                slides_url: None,
            },
        )
        .unwrap_or_else(|_| unreachable!())
    }

    #[tokio::test]
    async fn subscribers_receive_events_for_their_kind_only() {
        let bus = RecordEventBus::default();
        let mut presentations = bus.subscribe::<Presentation>().unwrap_or_else(|_| unreachable!());
        let mut teaching_logs = bus.subscribe::<TeachingLog>().unwrap_or_else(|_| unreachable!());

        let record = presentation();
        let delivered = bus.publish(RecordEvent::Upserted(record.clone()));
        assert_eq!(delivered.ok(), Some(1));

        let event = presentations.recv().await;
        assert_eq!(event, Some(RecordEvent::Upserted(record.clone())));
        assert_eq!(
            event.map(|event| event.record_id()),
            Some(record.id())
        );

        let deleted = RecordId::new();
        assert!(bus.publish::<TeachingLog>(RecordEvent::Deleted(deleted)).is_ok());
        assert_eq!(teaching_logs.recv().await, Some(RecordEvent::Deleted(deleted)));
    }

    #[test]
    fn publishing_without_subscribers_is_not_an_error() {
        let bus = RecordEventBus::default();
        let delivered = bus.publish::<Presentation>(RecordEvent::Deleted(RecordId::new()));
        assert_eq!(delivered.ok(), Some(0));
    }

    #[tokio::test]
    async fn dropped_subscription_stops_counting_as_receiver() {
        let bus = RecordEventBus::default();
        let subscription = bus.subscribe::<Presentation>().unwrap_or_else(|_| unreachable!());
        drop(subscription);

        let delivered = bus.publish::<Presentation>(RecordEvent::Deleted(RecordId::new()));
        assert_eq!(delivered.ok(), Some(0));
    }

    #[tokio::test]
    async fn lagging_subscriber_skips_to_newest_events() {
        let bus = RecordEventBus::new(2);
        let mut subscription = bus.subscribe::<Presentation>().unwrap_or_else(|_| unreachable!());
        let ids: Vec<RecordId> = (0..4).map(|_| RecordId::new()).collect();

        for id in &ids {
            assert!(bus.publish::<Presentation>(RecordEvent::Deleted(*id)).is_ok());
        }

        assert_eq!(subscription.recv().await, Some(RecordEvent::Deleted(ids[2])));
        assert_eq!(subscription.recv().await, Some(RecordEvent::Deleted(ids[3])));
    }
}
