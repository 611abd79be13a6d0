use serde::{Deserialize, Serialize};

use crate::sys::geometry::{Point, Rect};

/// Identity of a compositor window, stable for the window's whole life.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct WindowId(u32);

impl WindowId {
    pub fn new(id: u32) -> WindowId { WindowId(id) }

    pub fn get(&self) -> u32 { self.0 }
}

impl std::fmt::Display for WindowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

/// What the compositor tells the navigator about a managed window.
///
/// The navigator never owns the window; it only borrows the window's content
/// actor while the window is shown as a thumbnail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Window {
    pub id: WindowId,
    /// Application identity, matched against notification destinations.
    pub class_id: String,
    pub app_name: String,
    /// Full window geometry on the stage, decorations included.
    pub frame: Rect,
    /// Stage-space part of `frame` without the window-manager decorations.
    pub content_rect: Rect,
}

impl Window {
    /// Where the window origin sits relative to the top-left of its content.
    pub fn decoration_offset(&self) -> Point { self.frame.origin - self.content_rect.origin }
}
