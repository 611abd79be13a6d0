//! Notifications shown by the navigator.
//!
//! A note is either merged into the title of a thumbnail of its destination
//! application, or shown as a standalone card in the two-column grid below
//! the thumbnails.

use tracing::{debug, error, warn};

use super::thumbnails::{ThumbnailId, ThumbnailManager};
use super::{EffectKind, Navigator};
use crate::common::collections::HashMap;
use crate::layout_engine::LayoutEngine;
use crate::model::{Notification, NotificationContent, NotificationId};
use crate::sys::geometry::{Point, Size};
use crate::sys::scene::{ActorId, ActorKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteCard {
    pub card: ActorId,
    pub icon: ActorId,
    pub summary: ActorId,
    pub close: ActorId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotePlacement {
    Merged(ThumbnailId),
    Standalone(NoteCard),
}

#[derive(Debug, Clone)]
pub struct Note {
    pub notification: Notification,
    pub placement: NotePlacement,
}

impl Note {
    pub fn id(&self) -> NotificationId { self.notification.id }

    pub fn is_merged(&self) -> bool { matches!(self.placement, NotePlacement::Merged(_)) }

    pub fn standalone_card(&self) -> Option<NoteCard> {
        match self.placement {
            NotePlacement::Standalone(card) => Some(card),
            NotePlacement::Merged(_) => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct NoteRegistry {
    notes: HashMap<NotificationId, Note>,
    /// Standalone notes in grid order.
    standalone: Vec<NotificationId>,
}

impl NoteRegistry {
    pub fn new() -> Self { Self::default() }

    pub fn len(&self) -> usize { self.notes.len() }

    pub fn is_empty(&self) -> bool { self.notes.is_empty() }

    pub fn standalone_len(&self) -> usize { self.standalone.len() }

    pub fn get(&self, id: NotificationId) -> Option<&Note> { self.notes.get(&id) }

    pub fn standalone_ids(&self) -> impl DoubleEndedIterator<Item = NotificationId> + '_ {
        self.standalone.iter().copied()
    }

    pub fn standalone_index(&self, id: NotificationId) -> Option<usize> {
        self.standalone.iter().position(|&n| n == id)
    }

    /// First standalone note directed at `class_id`.
    pub fn find_standalone_for(&self, class_id: &str) -> Option<NotificationId> {
        self.standalone_ids().find(|id| {
            self.notes.get(id).is_some_and(|n| n.notification.destination_app == class_id)
        })
    }

    fn insert(&mut self, note: Note) {
        let id = note.id();
        if !note.is_merged() {
            self.standalone.push(id);
        }
        self.notes.insert(id, note);
    }

    fn remove(&mut self, id: NotificationId) -> Option<Note> {
        self.standalone.retain(|&n| n != id);
        self.notes.remove(&id)
    }

    fn set_placement(&mut self, id: NotificationId, placement: NotePlacement) {
        let Some(note) = self.notes.get_mut(&id) else { return };
        note.placement = placement;
        self.standalone.retain(|&n| n != id);
        if let NotePlacement::Standalone(_) = placement {
            self.standalone.push(id);
        }
    }
}

pub(super) struct NoteManager;

impl NoteManager {
    pub fn add(nav: &mut Navigator, notification: Notification) {
        let id = notification.id;
        if nav.notes.get(id).is_some() {
            warn!(%id, "notification posted twice, updating it instead");
            Self::update(nav, id, notification.content);
            return;
        }

        if let Some(thumbnail) = nav.thumbnails.find_unbound(&notification.destination_app) {
            debug!(%id, ?thumbnail, "merging notification into thumbnail title");
            ThumbnailManager::bind_note(nav, thumbnail, Some(id));
            ThumbnailManager::set_note_title(nav, thumbnail, &notification.content);
            nav.notes.insert(Note { notification, placement: NotePlacement::Merged(thumbnail) });
            return;
        }

        let rows_before = LayoutEngine::note_rows(nav.notes.standalone_len());
        let card = Self::build_card(nav, &notification.content);
        nav.notes.insert(Note { notification, placement: NotePlacement::Standalone(card) });
        debug!(%id, count = nav.notes.standalone_len(), "added standalone notification");
        Self::repack(nav, rows_before, Some(id));
    }

    pub fn remove(nav: &mut Navigator, id: NotificationId) {
        let rows_before = LayoutEngine::note_rows(nav.notes.standalone_len());
        let Some(note) = nav.notes.remove(id) else {
            error!(%id, "removing an unknown notification");
            return;
        };
        match note.placement {
            NotePlacement::Merged(thumbnail) => {
                ThumbnailManager::bind_note(nav, thumbnail, None);
                ThumbnailManager::set_plain_title(nav, thumbnail);
            }
            NotePlacement::Standalone(card) => {
                nav.effects.forget(card.card);
                nav.scene.destroy(card.card);
                Self::repack(nav, rows_before, None);
            }
        }
    }

    pub fn update(nav: &mut Navigator, id: NotificationId, content: NotificationContent) {
        let Some(note) = nav.notes.notes.get_mut(&id) else {
            error!(%id, "updating an unknown notification");
            return;
        };
        note.notification.content = content.clone();
        let placement = note.placement;
        match placement {
            NotePlacement::Merged(thumbnail) => {
                ThumbnailManager::set_note_title(nav, thumbnail, &content);
            }
            NotePlacement::Standalone(card) => {
                nav.scene.set_kind(card.icon, ActorKind::Icon(content.icon));
                nav.scene.set_kind(card.summary, ActorKind::Label(content.summary));
            }
        }
    }

    /// Moves a standalone note into the title of `thumbnail`.
    pub fn merge(nav: &mut Navigator, id: NotificationId, thumbnail: ThumbnailId) {
        let Some(note) = nav.notes.get(id) else { return };
        let content = note.notification.content.clone();
        if let Some(card) = note.standalone_card() {
            nav.effects.forget(card.card);
            nav.scene.destroy(card.card);
        }
        nav.notes.set_placement(id, NotePlacement::Merged(thumbnail));
        ThumbnailManager::bind_note(nav, thumbnail, Some(id));
        ThumbnailManager::set_note_title(nav, thumbnail, &content);
        debug!(%id, ?thumbnail, "notification merged");
    }

    /// Turns a merged note back into a standalone card at the end of the
    /// grid. The caller relayouts.
    pub fn demote(nav: &mut Navigator, id: NotificationId) {
        let Some(note) = nav.notes.get(id) else {
            error!(%id, "demoting an unknown notification");
            return;
        };
        if !note.is_merged() {
            return;
        }
        let content = note.notification.content.clone();
        let card = Self::build_card(nav, &content);
        nav.notes.set_placement(id, NotePlacement::Standalone(card));
        debug!(%id, "notification demoted to a standalone card");
    }

    /// Relayouts everything if the number of note rows changed, otherwise
    /// only re-packs the note grid.
    fn repack(nav: &mut Navigator, rows_before: usize, fresh: Option<NotificationId>) {
        let rows_after = LayoutEngine::note_rows(nav.notes.standalone_len());
        if rows_after != rows_before {
            nav.relayout(None, fresh);
        } else if Self::place_cards(nav, nav.animated(), fresh) {
            nav.effects.start(&nav.scene, EffectKind::Fly);
        }
    }

    /// Puts every standalone card in its grid slot below the thumbnails.
    /// Returns whether any card was given a fly transition.
    pub fn place_cards(
        nav: &mut Navigator,
        animated: bool,
        fresh: Option<NotificationId>,
    ) -> bool {
        let top = nav.engine.notes_area_top(&nav.layout);
        let ids: Vec<NotificationId> = nav.notes.standalone_ids().collect();
        let count = ids.len();
        let mut moved = false;
        for (index, id) in ids.into_iter().enumerate() {
            let Some(card) = nav.notes.get(id).and_then(Note::standalone_card) else { continue };
            let slot = nav.engine.note_slot(top, index, count);
            moved |= nav.place(card.card, slot, animated && fresh != Some(id));
        }
        moved
    }

    fn build_card(nav: &mut Navigator, content: &NotificationContent) -> NoteCard {
        let size = nav.engine.note_size();
        let button = nav.engine.settings().title_height;
        let scene = &mut nav.scene;

        let card = scene.create_child(nav.layers.content, "note", ActorKind::Group);
        scene.set_size(card, size);
        let icon = scene.create_child(card, "note_icon", ActorKind::Icon(content.icon.clone()));
        scene.set_size(icon, Size::new(size.height, size.height));
        let summary =
            scene.create_child(card, "note_summary", ActorKind::Label(content.summary.clone()));
        scene.set_position(summary, Point::new(size.height, 0.0));
        scene.set_size(summary, Size::new((size.width - size.height - button).max(0.0), size.height));
        let close = scene.create_child(card, "note_close", ActorKind::Icon(Some("close".into())));
        scene.set_position(close, Point::new(size.width - button, 0.0));
        scene.set_size(close, Size::new(button, button));

        NoteCard { card, icon, summary, close }
    }
}
