use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::model::{NotificationId, WindowId};

/// Signals the navigator emits towards the compositor shell.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[serde(tag = "type")]
pub enum NavigatorEvent {
    BackgroundClicked,
    ThumbnailClicked { window: WindowId },
    ThumbnailClosed { window: WindowId },
    NotificationClicked { notification: NotificationId },
    NotificationClosed { notification: NotificationId },
}

pub type EventSender = mpsc::UnboundedSender<NavigatorEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<NavigatorEvent>;

pub fn channel() -> (EventSender, EventReceiver) { mpsc::unbounded_channel() }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_tagged() {
        let event = NavigatorEvent::ThumbnailClosed { window: WindowId::new(3) };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"type":"thumbnail_closed","window":3}"#);
        assert_eq!(
            serde_json::to_string(&NavigatorEvent::BackgroundClicked).unwrap(),
            r#"{"type":"background_clicked"}"#
        );
    }
}
