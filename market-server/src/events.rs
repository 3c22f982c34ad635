//! In-process notifications about things the service created.

use tokio::sync::broadcast;
use tracing::debug;

use crate::entities::AppMode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarketEvent {
    /// A studio app was created from a marketplace listing.
    AppCreated {
        app_id: String,
        tenant_id: String,
        account_id: String,
        mode: AppMode,
    },
}

#[derive(Clone, Debug)]
pub struct EventBus {
    sender: broadcast::Sender<MarketEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MarketEvent> {
        self.sender.subscribe()
    }

    /// Fan the event out to current subscribers and return how many got it.
    pub fn publish(&self, event: MarketEvent) -> usize {
        match self.sender.send(event) {
            Ok(receivers) => receivers,
            Err(broadcast::error::SendError(event)) => {
                debug!(?event, "no subscribers for market event");
                0
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tokio::time::{timeout, Duration};
    use tracing_test::traced_test;

    fn created() -> MarketEvent {
        MarketEvent::AppCreated {
            app_id: "app-1".into(),
            tenant_id: "tenant-1".into(),
            account_id: "acc-1".into(),
            mode: AppMode::Chat,
        }
    }

    #[tokio::test]
    async fn publish_and_receive_event() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();

        assert_eq!(bus.publish(created()), 1);

        let received = timeout(Duration::from_millis(100), rx.recv())
            .await
            .expect("timeout")
            .expect("recv");
        assert_eq!(received, created());
    }

    #[test]
    #[traced_test]
    fn publish_without_subscribers_is_not_an_error() {
        let bus = EventBus::new(8);
        assert_eq!(bus.publish(created()), 0);
        assert!(logs_contain("no subscribers for market event"));
    }
}
