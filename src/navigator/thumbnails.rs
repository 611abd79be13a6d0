//! Thumbnails: one card per managed application window.
//!
//! A card is laid out as
//!
//! ```text
//! card
//! ├── prison       clip container, scales the window content into the cell
//! │   ├── window   borrowed compositor content, while claimed
//! │   └── still    cached last frame or placeholder, when there is one
//! ├── title        application name, or icon + summary of a merged note
//! ├── close
//! └── badge        shown while the application is hibernated
//! ```

use std::sync::Arc;
use std::time::SystemTime;

use slotmap::SlotMap;
use tracing::{debug, error, trace, warn};

use super::notes::NoteManager;
use super::{Completion, EffectKind, Navigator, OnDone};
use crate::common::collections::HashMap;
use crate::model::{NotificationContent, NotificationId, Window, WindowId};
use crate::sys::geometry::{Point, Rect, Scale, Size};
use crate::sys::scene::{ActorId, ActorKind, Property};

slotmap::new_key_type! {
    pub struct ThumbnailId;
}

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ThumbnailFlags: u8 {
        /// The window content sits inside the prison.
        const CLAIMED = 1 << 0;
        const HIBERNATING = 1 << 1;
        /// Playing the exit effect; no longer part of the order.
        const CLOSING = 1 << 2;
    }
}

/// Where the newest thumbnail goes when the grid grows to five.
const FIFTH_THUMBNAIL_SLOT: usize = 2;

#[derive(Debug, Clone)]
pub struct Thumbnail {
    pub window: Window,
    pub card: ActorId,
    pub prison: ActorId,
    pub title: ActorId,
    pub title_icon: ActorId,
    pub title_label: ActorId,
    pub close: ActorId,
    pub badge: ActorId,
    /// Cached image or placeholder shown instead of the live window.
    pub still: Option<ActorId>,
    /// Modification time of the last cached image load.
    pub cached: Option<SystemTime>,
    pub bound_note: Option<NotificationId>,
    pub flags: ThumbnailFlags,
}

impl Thumbnail {
    pub fn is_claimed(&self) -> bool { self.flags.contains(ThumbnailFlags::CLAIMED) }

    pub fn is_hibernating(&self) -> bool { self.flags.contains(ThumbnailFlags::HIBERNATING) }

    pub fn is_closing(&self) -> bool { self.flags.contains(ThumbnailFlags::CLOSING) }

    pub fn content_size(&self) -> Size { self.window.content_rect.size }
}

/// Thumbnails in display order.
///
/// Records stay allocated while their exit effect plays, but are taken out
/// of the order and the window index as soon as removal starts.
#[derive(Debug, Default)]
pub struct ThumbnailRegistry {
    slots: SlotMap<ThumbnailId, Thumbnail>,
    order: Vec<ThumbnailId>,
    by_window: HashMap<WindowId, ThumbnailId>,
}

impl ThumbnailRegistry {
    pub fn new() -> Self { Self::default() }

    pub fn len(&self) -> usize { self.order.len() }

    pub fn is_empty(&self) -> bool { self.order.is_empty() }

    pub fn get(&self, id: ThumbnailId) -> Option<&Thumbnail> { self.slots.get(id) }

    fn get_mut(&mut self, id: ThumbnailId) -> Option<&mut Thumbnail> { self.slots.get_mut(id) }

    pub fn ids(&self) -> impl DoubleEndedIterator<Item = ThumbnailId> + '_ {
        self.order.iter().copied()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (ThumbnailId, &Thumbnail)> + '_ {
        self.order.iter().map(|&id| (id, &self.slots[id]))
    }

    pub fn index_of(&self, id: ThumbnailId) -> Option<usize> {
        self.order.iter().position(|&t| t == id)
    }

    pub fn find_by_window(&self, window: WindowId) -> Option<ThumbnailId> {
        self.by_window.get(&window).copied()
    }

    pub fn find_by_card(&self, card: ActorId) -> Option<ThumbnailId> {
        self.ids().find(|&id| self.slots[id].card == card)
    }

    /// First thumbnail of `class_id` whose title is free for a note.
    pub fn find_unbound(&self, class_id: &str) -> Option<ThumbnailId> {
        self.iter()
            .find(|(_, t)| t.window.class_id == class_id && t.bound_note.is_none())
            .map(|(id, _)| id)
    }

    fn insert(&mut self, thumbnail: Thumbnail) -> ThumbnailId {
        let window = thumbnail.window.id;
        let id = self.slots.insert(thumbnail);
        if self.order.len() == 4 {
            self.order.insert(FIFTH_THUMBNAIL_SLOT, id);
        } else {
            self.order.push(id);
        }
        self.by_window.insert(window, id);
        id
    }

    fn detach(&mut self, id: ThumbnailId) {
        self.order.retain(|&t| t != id);
        if let Some(t) = self.slots.get(id) {
            if self.by_window.get(&t.window.id) == Some(&id) {
                self.by_window.remove(&t.window.id);
            }
        }
    }

    fn free(&mut self, id: ThumbnailId) -> Option<Thumbnail> {
        self.detach(id);
        self.slots.remove(id)
    }

    fn rebind(&mut self, id: ThumbnailId, window: Window) {
        let Some(t) = self.slots.get_mut(id) else { return };
        self.by_window.remove(&t.window.id);
        self.by_window.insert(window.id, id);
        t.window = window;
    }
}

pub(super) struct ThumbnailManager;

impl ThumbnailManager {
    pub fn add(nav: &mut Navigator, window: Window) -> ThumbnailId {
        nav.scene.ensure_window(&window, nav.layers.app);
        let thumbnail = Self::build_card(nav, window);
        let class_id = thumbnail.window.class_id.clone();
        let id = nav.thumbnails.insert(thumbnail);
        debug!(?id, class_id, count = nav.thumbnails.len(), "added thumbnail");

        match nav.notes.find_standalone_for(&class_id) {
            Some(note) => NoteManager::merge(nav, note, id),
            None => Self::set_plain_title(nav, id),
        }
        if nav.is_active() {
            Self::claim(nav, id);
        }
        nav.relayout(Some(id), None);
        id
    }

    pub fn remove(nav: &mut Navigator, window: WindowId, on_done: OnDone) {
        let Some(id) = nav.thumbnails.find_by_window(window) else {
            error!(%window, "removing a window that has no thumbnail");
            nav.ready.push(on_done);
            return;
        };
        nav.thumbnails.detach(id);
        let Some(t) = nav.thumbnails.get_mut(id) else {
            error!(%window, ?id, "thumbnail record vanished while removing it");
            nav.ready.push(on_done);
            return;
        };
        t.flags.insert(ThumbnailFlags::CLOSING);
        let card = t.card;
        let demoted = t.bound_note.take();
        if let Some(note) = demoted {
            NoteManager::demote(nav, note);
        }

        if !nav.animated() {
            Self::finish_removal(nav, id);
            nav.relayout(None, demoted);
            nav.ready.push(on_done);
            return;
        }

        let size = nav.scene.size(card);
        nav.scene.set_scale_anchor(card, Point::new(size.width / 2.0, size.height / 2.0));
        nav.effects.animate(&nav.scene, EffectKind::Fly, card, Property::Scale, Point::new(1.0, 0.0));
        nav.relayout(None, demoted);
        nav.effects.start(&nav.scene, EffectKind::Fly);
        if let Err(completion) = nav
            .effects
            .schedule(EffectKind::Fly, Completion::FinishRemoval { thumbnail: id, on_done })
        {
            nav.dispatch(vec![completion]);
        }
    }

    /// Returns the window to its owner and frees the record.
    pub fn finish_removal(nav: &mut Navigator, id: ThumbnailId) {
        Self::release(nav, id);
        let Some(t) = nav.thumbnails.free(id) else {
            error!(?id, "thumbnail vanished before its removal finished");
            return;
        };
        nav.effects.forget(t.card);
        nav.scene.destroy(t.card);
        trace!(window = %t.window.id, "thumbnail freed");
    }

    pub fn replace(nav: &mut Navigator, old: WindowId, window: Window) {
        let Some(id) = nav.thumbnails.find_by_window(old) else {
            error!(%old, new = %window.id, "replacing a window that has no thumbnail");
            if nav.thumbnails.find_by_window(window.id).is_none() {
                Self::add(nav, window);
            }
            return;
        };
        if window.id != old && nav.thumbnails.find_by_window(window.id).is_some() {
            error!(%old, new = %window.id, "replacement window already has a thumbnail");
            return;
        }
        let claimed = nav.thumbnails.get(id).is_some_and(Thumbnail::is_claimed);
        Self::release(nav, id);
        nav.scene.ensure_window(&window, nav.layers.app);
        nav.thumbnails.rebind(id, window);

        let Some(t) = nav.thumbnails.get_mut(id) else { return };
        t.flags.remove(ThumbnailFlags::HIBERNATING);
        t.cached = None;
        let (still, badge, merged) = (t.still.take(), t.badge, t.bound_note.is_some());
        if let Some(still) = still {
            nav.scene.destroy(still);
        }
        nav.scene.hide(badge);
        if !merged {
            Self::set_plain_title(nav, id);
        }
        Self::fit_card(nav, id);
        if claimed {
            Self::claim(nav, id);
        }
    }

    pub fn hibernate(nav: &mut Navigator, window: WindowId) {
        let Some(id) = nav.thumbnails.find_by_window(window) else {
            error!(%window, "hibernating a window that has no thumbnail");
            return;
        };
        let Some(t) = nav.thumbnails.get_mut(id) else { return };
        t.flags.insert(ThumbnailFlags::HIBERNATING);
        let (badge, claimed) = (t.badge, t.is_claimed());
        nav.scene.show(badge);
        if claimed {
            Self::refresh_still(nav, id);
        }
    }

    /// Moves the window content into the prison.
    pub fn claim(nav: &mut Navigator, id: ThumbnailId) {
        let Some(t) = nav.thumbnails.get(id) else { return };
        let (window, prison) = (t.window.clone(), t.prison);
        let content = nav.scene.ensure_window(&window, nav.layers.app);
        nav.scene.add_child(prison, content);
        nav.scene.set_position(content, window.decoration_offset());
        nav.scene.set_scale(content, Scale::ONE);
        if let Some(t) = nav.thumbnails.get_mut(id) {
            t.flags.insert(ThumbnailFlags::CLAIMED);
        }
        Self::refresh_still(nav, id);
    }

    /// Hands the window content back to the application layer at its normal
    /// placement.
    pub fn release(nav: &mut Navigator, id: ThumbnailId) {
        let Some(t) = nav.thumbnails.get_mut(id) else { return };
        if !t.is_claimed() {
            return;
        }
        t.flags.remove(ThumbnailFlags::CLAIMED);
        let (window, prison) = (t.window.clone(), t.prison);
        let Some(content) = nav.scene.window_actor(window.id) else { return };
        // The window may already be claimed by a newer thumbnail.
        if nav.scene.parent(content) != Some(prison) {
            return;
        }
        nav.scene.add_child(nav.layers.app, content);
        nav.scene.set_position(content, window.frame.origin);
        nav.scene.show(content);
    }

    /// Loads a cached image if storage has a fresher one, and decides
    /// whether the live window or the still is shown.
    fn refresh_still(nav: &mut Navigator, id: ThumbnailId) {
        let Some(t) = nav.thumbnails.get(id) else { return };
        let class_id = t.window.class_id.clone();
        let modified = nav.snapshots.modified(&class_id);
        let fresher = match (modified, t.cached) {
            (Some(on_disk), Some(loaded)) => on_disk > loaded,
            (Some(_), None) => true,
            (None, _) => false,
        };

        if fresher {
            let kind = match nav.snapshots.load(&class_id) {
                Ok(snapshot) => {
                    debug!(class_id, "using cached frame");
                    ActorKind::Snapshot(Arc::new(snapshot))
                }
                Err(e) => {
                    warn!(class_id, error = %e, "cached frame unusable, showing placeholder");
                    ActorKind::Placeholder
                }
            };
            if let Some(t) = nav.thumbnails.get_mut(id) {
                t.cached = modified;
            }
            Self::set_still(nav, id, kind);
        } else if t.is_hibernating() && t.still.is_none() {
            Self::set_still(nav, id, ActorKind::Placeholder);
        }

        let Some(t) = nav.thumbnails.get(id) else { return };
        if let Some(content) = nav.scene.window_actor(t.window.id) {
            if nav.scene.parent(content) == Some(t.prison) {
                nav.scene.set_visible(content, t.still.is_none());
            }
        }
    }

    fn set_still(nav: &mut Navigator, id: ThumbnailId, kind: ActorKind) {
        let Some(t) = nav.thumbnails.get(id) else { return };
        let (prison, size) = (t.prison, t.content_size());
        let still = match t.still {
            Some(still) => {
                nav.scene.set_kind(still, kind);
                still
            }
            None => nav.scene.create_child(prison, "still", kind),
        };
        nav.scene.set_position(still, Point::ZERO);
        nav.scene.set_size(still, size);
        if let Some(t) = nav.thumbnails.get_mut(id) {
            t.still = Some(still);
        }
    }

    fn build_card(nav: &mut Navigator, window: Window) -> Thumbnail {
        let scene = &mut nav.scene;
        let card = scene.create_child(nav.layers.content, "thumbnail", ActorKind::Group);
        let prison = scene.create_child(card, "prison", ActorKind::Clip);
        let title = scene.create_child(card, "title", ActorKind::Group);
        let title_icon = scene.create_child(title, "title_icon", ActorKind::Icon(None));
        scene.hide(title_icon);
        let title_label =
            scene.create_child(title, "title_label", ActorKind::Label(window.app_name.clone()));
        let close = scene.create_child(card, "close", ActorKind::Icon(Some("close".into())));
        let badge = scene.create_child(card, "badge", ActorKind::Icon(Some("hibernating".into())));
        scene.hide(badge);

        Thumbnail {
            window,
            card,
            prison,
            title,
            title_icon,
            title_label,
            close,
            badge,
            still: None,
            cached: None,
            bound_note: None,
            flags: ThumbnailFlags::empty(),
        }
    }

    /// Sizes the card to the current cell and scales the prison so the
    /// window content fits below the title, centred.
    pub fn fit_card(nav: &mut Navigator, id: ThumbnailId) {
        let Some(t) = nav.thumbnails.get(id) else { return };
        let title_height = nav.engine.settings().title_height;
        let cell = nav.layout.cell_size();
        let content = t.content_size();
        let room = Size::new(cell.width, (cell.height - title_height).max(0.0));
        let k = if content.is_empty() {
            1.0
        } else {
            (room.width / content.width).min(room.height / content.height)
        };

        let scene = &mut nav.scene;
        scene.set_size(t.card, cell);
        scene.set_position(
            t.prison,
            Point::new(
                (cell.width - content.width * k) / 2.0,
                title_height + (room.height - content.height * k) / 2.0,
            ),
        );
        scene.set_size(t.prison, content);
        scene.set_scale(t.prison, Scale::uniform(k));
        scene.set_clip(t.prison, Some(Rect::new(Point::ZERO, content)));

        scene.set_size(t.title, Size::new(cell.width, title_height));
        scene.set_position(t.close, Point::new(cell.width - title_height, 0.0));
        scene.set_size(t.close, Size::new(title_height, title_height));
        scene.set_position(t.badge, Point::new(0.0, title_height));
        scene.set_size(t.badge, Size::new(title_height, title_height));
        Self::arrange_title(nav, id);
    }

    fn arrange_title(nav: &mut Navigator, id: ThumbnailId) {
        let Some(t) = nav.thumbnails.get(id) else { return };
        let title_height = nav.engine.settings().title_height;
        let width = nav.scene.size(t.title).width;
        let text_x = if t.bound_note.is_some() { title_height } else { 0.0 };
        let scene = &mut nav.scene;
        scene.set_position(t.title_icon, Point::ZERO);
        scene.set_size(t.title_icon, Size::new(title_height, title_height));
        scene.set_position(t.title_label, Point::new(text_x, 0.0));
        scene.set_size(
            t.title_label,
            Size::new((width - text_x - title_height).max(0.0), title_height),
        );
    }

    pub fn set_plain_title(nav: &mut Navigator, id: ThumbnailId) {
        let Some(t) = nav.thumbnails.get(id) else { return };
        let (icon, label) = (t.title_icon, t.title_label);
        let name = t.window.app_name.clone();
        nav.scene.hide(icon);
        nav.scene.set_kind(label, ActorKind::Label(name));
        Self::arrange_title(nav, id);
    }

    pub fn set_note_title(nav: &mut Navigator, id: ThumbnailId, content: &NotificationContent) {
        let Some(t) = nav.thumbnails.get(id) else { return };
        let (icon, label) = (t.title_icon, t.title_label);
        nav.scene.set_kind(icon, ActorKind::Icon(content.icon.clone()));
        nav.scene.show(icon);
        nav.scene.set_kind(label, ActorKind::Label(content.summary.clone()));
        Self::arrange_title(nav, id);
    }

    pub fn bind_note(nav: &mut Navigator, id: ThumbnailId, note: Option<NotificationId>) {
        if let Some(t) = nav.thumbnails.get_mut(id) {
            t.bound_note = note;
        }
    }

    /// Puts every card in its slot of the current layout. Returns whether any
    /// card was given a fly transition.
    pub fn place_cards(nav: &mut Navigator, animated: bool, fresh: Option<ThumbnailId>) -> bool {
        let ids: Vec<ThumbnailId> = nav.thumbnails.ids().collect();
        let mut moved = false;
        for (index, id) in ids.into_iter().enumerate() {
            Self::fit_card(nav, id);
            let Some(card) = nav.thumbnails.get(id).map(|t| t.card) else { continue };
            let slot = nav.layout.slot(index);
            moved |= nav.place(card, slot, animated && fresh != Some(id));
        }
        moved
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn thumbnail(id: u32) -> Thumbnail {
        let mut actors = SlotMap::<ActorId, ()>::with_key();
        let mut next = || actors.insert(());
        Thumbnail {
            window: Window {
                id: WindowId::new(id),
                class_id: format!("app{id}"),
                app_name: format!("App {id}"),
                frame: Rect::from_xywh(0.0, 0.0, 800.0, 480.0),
                content_rect: Rect::from_xywh(0.0, 56.0, 800.0, 424.0),
            },
            card: next(),
            prison: next(),
            title: next(),
            title_icon: next(),
            title_label: next(),
            close: next(),
            badge: next(),
            still: None,
            cached: None,
            bound_note: None,
            flags: ThumbnailFlags::empty(),
        }
    }

    fn windows(registry: &ThumbnailRegistry) -> Vec<u32> {
        registry.iter().map(|(_, t)| t.window.id.get()).collect()
    }

    #[test]
    fn fifth_thumbnail_takes_the_third_slot() {
        let mut registry = ThumbnailRegistry::new();
        for id in 1..=4 {
            registry.insert(thumbnail(id));
        }
        assert_eq!(windows(&registry), vec![1, 2, 3, 4]);
        registry.insert(thumbnail(5));
        assert_eq!(windows(&registry), vec![1, 2, 5, 3, 4]);
        registry.insert(thumbnail(6));
        assert_eq!(windows(&registry), vec![1, 2, 5, 3, 4, 6]);
    }

    #[test]
    fn detached_records_are_invisible_to_lookups() {
        let mut registry = ThumbnailRegistry::new();
        let a = registry.insert(thumbnail(1));
        let b = registry.insert(thumbnail(2));
        registry.detach(a);

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.find_by_window(WindowId::new(1)), None);
        assert_eq!(registry.find_by_window(WindowId::new(2)), Some(b));
        assert!(registry.get(a).is_some());
        assert_eq!(registry.index_of(b), Some(0));

        assert!(registry.free(a).is_some());
        assert!(registry.get(a).is_none());
    }

    #[test]
    fn card_lookup_ignores_closing_records() {
        let mut actors = SlotMap::<ActorId, ()>::with_key();
        let (card_a, card_b, stray) = (actors.insert(()), actors.insert(()), actors.insert(()));
        let mut registry = ThumbnailRegistry::new();
        let a = registry.insert(Thumbnail { card: card_a, ..thumbnail(1) });
        let b = registry.insert(Thumbnail { card: card_b, ..thumbnail(2) });

        assert_eq!(registry.find_by_card(card_a), Some(a));
        assert_eq!(registry.find_by_card(card_b), Some(b));
        assert_eq!(registry.find_by_card(stray), None);

        registry.detach(a);
        assert_eq!(registry.find_by_card(card_a), None);
        assert_eq!(registry.find_by_card(card_b), Some(b));
    }

    #[test]
    fn rebind_moves_the_window_index() {
        let mut registry = ThumbnailRegistry::new();
        let id = registry.insert(thumbnail(1));
        let mut replacement = thumbnail(9).window;
        replacement.class_id = "app1".into();
        registry.rebind(id, replacement);

        assert_eq!(registry.find_by_window(WindowId::new(1)), None);
        assert_eq!(registry.find_by_window(WindowId::new(9)), Some(id));
        assert_eq!(registry.find_unbound("app1"), Some(id));
    }

    #[test]
    fn unbound_lookup_skips_titles_with_notes() {
        let mut registry = ThumbnailRegistry::new();
        let first = registry.insert(thumbnail(1));
        let mut second = thumbnail(2);
        second.window.class_id = "app1".into();
        let second = registry.insert(second);

        assert_eq!(registry.find_unbound("app1"), Some(first));
        registry.get_mut(first).unwrap().bound_note = Some(NotificationId::new(1));
        assert_eq!(registry.find_unbound("app1"), Some(second));
        assert_eq!(registry.find_unbound("other"), None);
    }
}
