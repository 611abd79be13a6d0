use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct NotificationId(u32);

impl NotificationId {
    pub fn new(id: u32) -> NotificationId { NotificationId(id) }

    pub fn get(&self) -> u32 { self.0 }
}

impl std::fmt::Display for NotificationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "{}", self.0) }
}

/// Visual content supplied by the notification's owner.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotificationContent {
    pub summary: String,
    /// Themed icon name. A missing icon renders as a blank square.
    pub icon: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    /// Application the notification is directed at.
    pub destination_app: String,
    pub content: NotificationContent,
}
