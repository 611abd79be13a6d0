//! The task navigator: running applications and pending notifications as a
//! scrollable grid of thumbnails that can be zoomed into and out of.
//!
//! All state lives in [`Navigator`]. The managers in the submodules operate
//! on it the way the window manager's reactor managers operate on the
//! reactor. Every operation takes `&mut self`, so registry mutations never
//! nest. Completion callbacks run at the end of the operation that finished
//! them, once the registries are consistent again; they must not call back
//! into the navigator synchronously.

pub mod animation;
pub mod events;
mod input;
pub mod notes;
pub mod thumbnails;
pub mod zoom;

use std::fmt;
use std::time::Duration;

use tracing::{debug, error, instrument, trace};

pub use animation::{EffectKind, EffectScheduler};
pub use events::{EventReceiver, EventSender, NavigatorEvent};
use notes::NoteManager;
pub use notes::{Note, NoteCard, NotePlacement, NoteRegistry};
use thumbnails::ThumbnailManager;
pub use thumbnails::{Thumbnail, ThumbnailFlags, ThumbnailId, ThumbnailRegistry};
use zoom::ZoomManager;
pub use zoom::{ViewportTransform, ZoomState};
use crate::common::config::Config;
use crate::layout_engine::{Layout, LayoutEngine};
use crate::model::{Notification, NotificationContent, NotificationId, Window, WindowId};
use crate::sys::geometry::Point;
use crate::sys::scene::{ActorId, ActorKind, Property, Scene};
use crate::sys::snapshot::{FsSnapshotStore, NoSnapshots, SnapshotStore};

pub type OnDone = Box<dyn FnOnce()>;

/// Work attached to the end of an effect.
enum Completion {
    /// Shows a card that was kept hidden while the others flew into place.
    RevealCard(ThumbnailId),
    FinishRemoval { thumbnail: ThumbnailId, on_done: OnDone },
    FinishZoomIn { generation: u64, on_done: OnDone },
    FinishZoomOut { generation: u64, on_done: OnDone },
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Completion::RevealCard(id) => f.debug_tuple("RevealCard").field(id).finish(),
            Completion::FinishRemoval { thumbnail, .. } => {
                f.debug_struct("FinishRemoval").field("thumbnail", thumbnail).finish_non_exhaustive()
            }
            Completion::FinishZoomIn { generation, .. } => {
                f.debug_struct("FinishZoomIn").field("generation", generation).finish_non_exhaustive()
            }
            Completion::FinishZoomOut { generation, .. } => f
                .debug_struct("FinishZoomOut")
                .field("generation", generation)
                .finish_non_exhaustive(),
        }
    }
}

/// Fixed part of the navigator's scene.
#[derive(Debug, Clone, Copy)]
pub struct Layers {
    /// Windows at their normal placement.
    pub app: ActorId,
    /// Visible iff the navigator is active.
    pub root: ActorId,
    /// Carries the zoom transform.
    pub viewport: ActorId,
    /// Scrolled by the scroll offset; parent of every card.
    pub content: ActorId,
}

pub struct Navigator {
    config: Config,
    engine: LayoutEngine,
    scene: Scene,
    layers: Layers,
    thumbnails: ThumbnailRegistry,
    notes: NoteRegistry,
    effects: EffectScheduler<Completion>,
    zoom: ZoomState,
    zoom_generation: u64,
    scroll: f64,
    layout: Layout,
    snapshots: Box<dyn SnapshotStore>,
    events_tx: EventSender,
    ready: Vec<OnDone>,
}

impl Navigator {
    pub fn new(config: Config, events_tx: EventSender) -> Self {
        let engine = LayoutEngine::from_config(&config);
        let screen = engine.screen();
        let mut scene = Scene::new(screen);
        let stage = scene.stage();
        let app = scene.create_child(stage, "app_layer", ActorKind::Group);
        scene.set_size(app, screen);
        let root = scene.create_child(stage, "navigator", ActorKind::Group);
        scene.set_size(root, screen);
        scene.hide(root);
        let viewport = scene.create_child(root, "viewport", ActorKind::Group);
        scene.set_size(viewport, screen);
        let content = scene.create_child(viewport, "content", ActorKind::Group);
        scene.set_size(content, screen);

        let snapshots: Box<dyn SnapshotStore> = match &config.snapshots.dir {
            Some(dir) => Box::new(FsSnapshotStore::new(dir.clone())),
            None => Box::new(NoSnapshots),
        };

        Navigator {
            effects: EffectScheduler::new(&config.animation),
            layout: engine.compute_layout(0, 0),
            engine,
            scene,
            layers: Layers { app, root, viewport, content },
            thumbnails: ThumbnailRegistry::new(),
            notes: NoteRegistry::new(),
            zoom: ZoomState::AppFullscreen,
            zoom_generation: 0,
            scroll: 0.0,
            snapshots,
            events_tx,
            ready: Vec::new(),
            config,
        }
    }

    pub fn with_snapshot_store(mut self, store: impl SnapshotStore + 'static) -> Self {
        self.snapshots = Box::new(store);
        self
    }

    pub fn config(&self) -> &Config { &self.config }

    pub fn scene(&self) -> &Scene { &self.scene }

    /// For the compositor to manage its window content actors.
    pub fn scene_mut(&mut self) -> &mut Scene { &mut self.scene }

    pub fn layers(&self) -> Layers { self.layers }

    pub fn layout(&self) -> &Layout { &self.layout }

    pub fn thumbnails(&self) -> &ThumbnailRegistry { &self.thumbnails }

    pub fn notes(&self) -> &NoteRegistry { &self.notes }

    pub fn is_active(&self) -> bool { self.zoom != ZoomState::AppFullscreen }

    pub fn is_empty(&self) -> bool { self.thumbnails.is_empty() && self.notes.is_empty() }

    pub fn has_window(&self, window: WindowId) -> bool {
        self.thumbnails.find_by_window(window).is_some()
    }

    pub fn thumbnail_count(&self) -> usize { self.thumbnails.len() }

    pub fn notification_count(&self) -> usize { self.notes.len() }

    pub fn zoom_state(&self) -> ZoomState { self.zoom }

    pub fn viewport_transform(&self) -> ViewportTransform { ZoomManager::viewport(self) }

    pub fn scroll_offset(&self) -> f64 { self.scroll }

    pub fn content_height(&self) -> f64 {
        self.engine.content_height(&self.layout, self.notes.standalone_len())
    }

    /// Shows the navigator without any effect.
    #[instrument(skip(self))]
    pub fn enter(&mut self) {
        if self.zoom == ZoomState::Grid {
            return;
        }
        ZoomManager::cancel(self);
        self.show();
        self.flush();
    }

    /// Hides the navigator without any effect.
    #[instrument(skip(self))]
    pub fn exit(&mut self) {
        if self.zoom == ZoomState::AppFullscreen {
            return;
        }
        ZoomManager::cancel(self);
        self.hide();
        self.flush();
    }

    #[instrument(skip(self, window), fields(window = %window.id))]
    pub fn add_window(&mut self, window: Window) {
        if self.has_window(window.id) {
            error!("window already has a thumbnail");
            return;
        }
        ThumbnailManager::add(self, window);
        self.flush();
    }

    /// Removes the window's thumbnail, shrinking it away first while the
    /// navigator is shown. `on_done` fires exactly once, when the window is
    /// back in the application layer.
    #[instrument(skip(self, on_done))]
    pub fn remove_window(&mut self, window: WindowId, on_done: impl FnOnce() + 'static) {
        ThumbnailManager::remove(self, window, Box::new(on_done));
        self.flush();
    }

    /// Swaps the window behind a thumbnail in place.
    #[instrument(skip(self, window), fields(new = %window.id))]
    pub fn replace_window(&mut self, old: WindowId, window: Window) {
        ThumbnailManager::replace(self, old, window);
        self.flush();
    }

    #[instrument(skip(self))]
    pub fn hibernate_window(&mut self, window: WindowId) {
        ThumbnailManager::hibernate(self, window);
        self.flush();
    }

    #[instrument(skip(self, notification), fields(id = %notification.id))]
    pub fn add_notification(&mut self, notification: Notification) {
        NoteManager::add(self, notification);
        self.flush();
    }

    #[instrument(skip(self))]
    pub fn remove_notification(&mut self, id: NotificationId) {
        NoteManager::remove(self, id);
        self.flush();
    }

    #[instrument(skip(self, content))]
    pub fn update_notification(&mut self, id: NotificationId, content: NotificationContent) {
        NoteManager::update(self, id, content);
        self.flush();
    }

    #[instrument(skip(self, on_done))]
    pub fn zoom_in(&mut self, window: WindowId, on_done: impl FnOnce() + 'static) {
        ZoomManager::zoom_in(self, window, Box::new(on_done));
        self.flush();
    }

    #[instrument(skip(self, on_done))]
    pub fn zoom_out(&mut self, window: WindowId, on_done: impl FnOnce() + 'static) {
        ZoomManager::zoom_out(self, window, Box::new(on_done));
        self.flush();
    }

    /// Frame-clock tick.
    pub fn advance(&mut self, dt: Duration) {
        let finished = self.effects.advance(&mut self.scene, dt);
        self.dispatch(finished);
        self.flush();
    }

    /// Routes a click at a stage point, emitting the resulting event.
    ///
    /// Clicks are ignored unless the navigator shows the grid at rest.
    pub fn handle_click(&mut self, point: Point) -> Option<NavigatorEvent> {
        let event = input::hit_test(self, point)?;
        debug!(?point, ?event, "click");
        _ = self.events_tx.send(event.clone());
        Some(event)
    }

    /// Scrolls the content, clamped to its extent. Returns the offset
    /// actually applied.
    pub fn scroll_to(&mut self, offset: f64) -> f64 { self.set_scroll(offset) }

    fn set_scroll(&mut self, offset: f64) -> f64 {
        let max = (self.content_height() - self.engine.screen().height).max(0.0);
        self.scroll = offset.clamp(0.0, max);
        self.effects.jump(
            &mut self.scene,
            self.layers.content,
            Property::Position,
            Point::new(0.0, -self.scroll),
        );
        self.scroll
    }

    fn animated(&self) -> bool { self.is_active() && self.config.animation.enabled }

    fn show(&mut self) {
        self.scene.show(self.layers.root);
        self.zoom = ZoomState::Grid;
        ZoomManager::set_viewport(self, ViewportTransform::IDENTITY);
        let ids: Vec<ThumbnailId> = self.thumbnails.ids().collect();
        for id in ids {
            ThumbnailManager::claim(self, id);
        }
        self.relayout_with(false, None, None);
    }

    /// Lands every flying card, gives the windows back and hides the root.
    fn hide(&mut self) {
        self.zoom = ZoomState::AppFullscreen;
        let landed = self.effects.finish(&mut self.scene, EffectKind::Fly);
        self.dispatch(landed);
        let ids: Vec<ThumbnailId> = self.thumbnails.ids().collect();
        for id in ids {
            ThumbnailManager::release(self, id);
        }
        self.scene.hide(self.layers.root);
    }

    /// Recomputes the layout from the current registries and moves every
    /// card to its slot. Returns whether a fly effect is running afterwards.
    fn relayout(&mut self, fresh: Option<ThumbnailId>, fresh_note: Option<NotificationId>) -> bool {
        self.relayout_with(self.animated(), fresh, fresh_note)
    }

    fn relayout_with(
        &mut self,
        animated: bool,
        fresh: Option<ThumbnailId>,
        fresh_note: Option<NotificationId>,
    ) -> bool {
        self.layout =
            self.engine.compute_layout(self.thumbnails.len(), self.notes.standalone_len());
        trace!(layout = ?self.layout, "relayout");
        let cards_moved = ThumbnailManager::place_cards(self, animated, fresh);
        let notes_moved = NoteManager::place_cards(self, animated, fresh_note);
        self.set_scroll(self.scroll);

        if cards_moved || notes_moved {
            self.effects.start(&self.scene, EffectKind::Fly);
        }
        let flying = self.effects.is_running(EffectKind::Fly);
        if let Some(id) = fresh.filter(|_| flying) {
            if let Some(card) = self.thumbnails.get(id).map(|t| t.card) {
                self.scene.hide(card);
                if let Err(completion) =
                    self.effects.schedule(EffectKind::Fly, Completion::RevealCard(id))
                {
                    self.dispatch(vec![completion]);
                }
            }
        }
        flying
    }

    /// Moves `actor` to `to`, as a fly transition if `animate`. Returns
    /// whether a transition was registered.
    fn place(&mut self, actor: ActorId, to: Point, animate: bool) -> bool {
        if animate {
            self.effects.animate(&self.scene, EffectKind::Fly, actor, Property::Position, to)
        } else {
            self.effects.jump(&mut self.scene, actor, Property::Position, to);
            false
        }
    }

    fn dispatch(&mut self, completions: Vec<Completion>) {
        for completion in completions {
            trace!(?completion, "effect completion");
            match completion {
                Completion::RevealCard(id) => {
                    if let Some(card) = self.thumbnails.get(id).map(|t| t.card) {
                        self.scene.show(card);
                    }
                }
                Completion::FinishRemoval { thumbnail, on_done } => {
                    ThumbnailManager::finish_removal(self, thumbnail);
                    self.ready.push(on_done);
                }
                Completion::FinishZoomIn { generation, on_done } => {
                    if generation == self.zoom_generation && self.zoom == ZoomState::ZoomingIn {
                        ZoomManager::finish_zoom_in(self);
                    } else {
                        debug!(generation, "stale zoom-in completion");
                    }
                    self.ready.push(on_done);
                }
                Completion::FinishZoomOut { generation, on_done } => {
                    if generation == self.zoom_generation && self.zoom == ZoomState::ZoomingOut {
                        ZoomManager::finish_zoom_out(self);
                    } else {
                        debug!(generation, "stale zoom-out completion");
                    }
                    self.ready.push(on_done);
                }
            }
        }
    }

    fn flush(&mut self) {
        for on_done in std::mem::take(&mut self.ready) {
            on_done();
        }
    }
}

impl fmt::Debug for Navigator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Navigator")
            .field("zoom", &self.zoom)
            .field("thumbnails", &self.thumbnails.len())
            .field("notes", &self.notes.len())
            .field("scroll", &self.scroll)
            .finish_non_exhaustive()
    }
}
