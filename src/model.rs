pub mod notification;
pub mod window;

pub use notification::{Notification, NotificationContent, NotificationId};
pub use window::{Window, WindowId};
