//! Retained scene graph shared between the compositor and the navigator.
//!
//! The compositor renders whatever this tree describes. The navigator only
//! touches geometry (position, size, scale, clip), visibility and parenting;
//! actor kinds are opaque payloads to it.

use std::sync::Arc;

use slotmap::SlotMap;
use tracing::{error, trace};

use crate::common::collections::HashMap;
use crate::model::{Window, WindowId};
use crate::sys::geometry::{Point, Rect, Scale, Size};
use crate::sys::snapshot::Snapshot;

slotmap::new_key_type! {
    pub struct ActorId;
}

#[derive(Clone, Debug)]
pub enum ActorKind {
    Group,
    /// Clips its children to the actor's `clip` rect.
    Clip,
    Label(String),
    /// Themed icon; `None` renders blank.
    Icon(Option<String>),
    Snapshot(Arc<Snapshot>),
    /// Solid rectangle standing in for content that could not be loaded.
    Placeholder,
    /// Live content of a compositor window.
    Window(WindowId),
}

#[derive(Clone, Debug)]
pub struct Actor {
    pub role: &'static str,
    pub kind: ActorKind,
    pub parent: Option<ActorId>,
    pub children: Vec<ActorId>,
    pub position: Point,
    pub size: Size,
    pub scale: Scale,
    /// Fixed point of `scale`, in the actor's own unscaled coordinates.
    pub scale_anchor: Point,
    pub clip: Option<Rect>,
    pub visible: bool,
}

impl Actor {
    fn new(role: &'static str, kind: ActorKind) -> Self {
        Actor {
            role,
            kind,
            parent: None,
            children: Vec::new(),
            position: Point::ZERO,
            size: Size::ZERO,
            scale: Scale::ONE,
            scale_anchor: Point::ZERO,
            clip: None,
            visible: true,
        }
    }

    /// Maps a point from this actor's coordinates into its parent's.
    fn to_parent(&self, local: Point) -> Point {
        self.position + self.scale_anchor + (local - self.scale_anchor).scaled(self.scale)
    }
}

/// Animatable actor properties. Values travel as points; for `Scale` the
/// x/y components are the per-axis factors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Property {
    Position,
    Scale,
}

pub struct Scene {
    actors: SlotMap<ActorId, Actor>,
    stage: ActorId,
    windows: HashMap<WindowId, ActorId>,
}

impl Scene {
    pub fn new(screen: Size) -> Self {
        let mut actors = SlotMap::with_key();
        let mut stage = Actor::new("stage", ActorKind::Group);
        stage.size = screen;
        let stage = actors.insert(stage);
        Scene {
            actors,
            stage,
            windows: HashMap::default(),
        }
    }

    pub fn stage(&self) -> ActorId { self.stage }

    pub fn len(&self) -> usize { self.actors.len() }

    pub fn is_empty(&self) -> bool { self.actors.is_empty() }

    pub fn get(&self, id: ActorId) -> Option<&Actor> { self.actors.get(id) }

    pub fn contains(&self, id: ActorId) -> bool { self.actors.contains_key(id) }

    pub fn create(&mut self, role: &'static str, kind: ActorKind) -> ActorId {
        self.actors.insert(Actor::new(role, kind))
    }

    pub fn create_child(
        &mut self,
        parent: ActorId,
        role: &'static str,
        kind: ActorKind,
    ) -> ActorId {
        let id = self.create(role, kind);
        self.add_child(parent, id);
        id
    }

    /// Makes `child` the topmost child of `parent`, detaching it from any
    /// previous parent first.
    pub fn add_child(&mut self, parent: ActorId, child: ActorId) {
        if parent == child || !self.contains(parent) || !self.contains(child) {
            error!(?parent, ?child, "refusing to reparent actor");
            return;
        }
        self.unparent(child);
        self.actors[parent].children.push(child);
        self.actors[child].parent = Some(parent);
    }

    pub fn unparent(&mut self, child: ActorId) {
        let Some(parent) = self.actors.get(child).and_then(|a| a.parent) else {
            return;
        };
        if let Some(p) = self.actors.get_mut(parent) {
            p.children.retain(|&c| c != child);
        }
        self.actors[child].parent = None;
    }

    /// Destroys `id` and its subtree. Window content actors are never
    /// destroyed here since they belong to the compositor; they are detached
    /// instead.
    pub fn destroy(&mut self, id: ActorId) {
        if id == self.stage || !self.contains(id) {
            return;
        }
        self.unparent(id);
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(ActorKind::Window(wid)) = self.actors.get(next).map(|a| &a.kind) {
                error!(window = %wid, "window content still inside a destroyed subtree");
                self.unparent(next);
                continue;
            }
            if let Some(actor) = self.actors.remove(next) {
                stack.extend(actor.children);
            }
        }
    }

    /// Returns the content actor for `window`, creating it inside `parent`
    /// at the window's frame when the compositor has not registered it yet.
    pub fn ensure_window(&mut self, window: &Window, parent: ActorId) -> ActorId {
        if let Some(&id) = self.windows.get(&window.id) {
            if self.contains(id) {
                return id;
            }
        }
        let id = self.create_child(parent, "window", ActorKind::Window(window.id));
        let actor = &mut self.actors[id];
        actor.position = window.frame.origin;
        actor.size = window.frame.size;
        self.windows.insert(window.id, id);
        id
    }

    pub fn window_actor(&self, window: WindowId) -> Option<ActorId> {
        self.windows.get(&window).copied()
    }

    pub fn remove_window(&mut self, window: WindowId) {
        if let Some(id) = self.windows.remove(&window) {
            self.unparent(id);
            self.actors.remove(id);
        }
    }

    pub fn children(&self, id: ActorId) -> &[ActorId] {
        self.actors.get(id).map(|a| a.children.as_slice()).unwrap_or(&[])
    }

    pub fn parent(&self, id: ActorId) -> Option<ActorId> { self.actors.get(id)?.parent }

    pub fn position(&self, id: ActorId) -> Point {
        self.actors.get(id).map(|a| a.position).unwrap_or_default()
    }

    pub fn set_position(&mut self, id: ActorId, position: Point) {
        if let Some(a) = self.actors.get_mut(id) {
            a.position = position;
        }
    }

    pub fn size(&self, id: ActorId) -> Size { self.actors.get(id).map(|a| a.size).unwrap_or_default() }

    pub fn set_size(&mut self, id: ActorId, size: Size) {
        if let Some(a) = self.actors.get_mut(id) {
            a.size = size;
        }
    }

    pub fn scale(&self, id: ActorId) -> Scale {
        self.actors.get(id).map(|a| a.scale).unwrap_or_default()
    }

    pub fn set_scale(&mut self, id: ActorId, scale: Scale) {
        if let Some(a) = self.actors.get_mut(id) {
            a.scale = scale;
        }
    }

    pub fn set_scale_anchor(&mut self, id: ActorId, anchor: Point) {
        if let Some(a) = self.actors.get_mut(id) {
            a.scale_anchor = anchor;
        }
    }

    pub fn set_clip(&mut self, id: ActorId, clip: Option<Rect>) {
        if let Some(a) = self.actors.get_mut(id) {
            a.clip = clip;
        }
    }

    pub fn set_kind(&mut self, id: ActorId, kind: ActorKind) {
        if let Some(a) = self.actors.get_mut(id) {
            a.kind = kind;
        }
    }

    pub fn kind(&self, id: ActorId) -> Option<&ActorKind> { self.actors.get(id).map(|a| &a.kind) }

    pub fn show(&mut self, id: ActorId) { self.set_visible(id, true) }

    pub fn hide(&mut self, id: ActorId) { self.set_visible(id, false) }

    pub fn set_visible(&mut self, id: ActorId, visible: bool) {
        if let Some(a) = self.actors.get_mut(id) {
            a.visible = visible;
        }
    }

    pub fn is_visible(&self, id: ActorId) -> bool { self.actors.get(id).is_some_and(|a| a.visible) }

    /// True if the actor and all of its ancestors are visible and it is
    /// attached to the stage.
    pub fn is_mapped(&self, id: ActorId) -> bool {
        let mut cur = Some(id);
        while let Some(next) = cur {
            let Some(actor) = self.actors.get(next) else {
                return false;
            };
            if !actor.visible {
                return false;
            }
            if next == self.stage {
                return true;
            }
            cur = actor.parent;
        }
        false
    }

    pub fn property(&self, id: ActorId, property: Property) -> Option<Point> {
        let actor = self.actors.get(id)?;
        Some(match property {
            Property::Position => actor.position,
            Property::Scale => Point::new(actor.scale.x, actor.scale.y),
        })
    }

    pub fn set_property(&mut self, id: ActorId, property: Property, value: Point) {
        let Some(actor) = self.actors.get_mut(id) else {
            trace!(?id, ?property, "property update for a destroyed actor");
            return;
        };
        match property {
            Property::Position => actor.position = value,
            Property::Scale => actor.scale = Scale::new(value.x, value.y),
        }
    }

    /// Maps a point in `id`'s coordinates to stage coordinates.
    pub fn to_stage(&self, id: ActorId, local: Point) -> Point {
        let mut point = local;
        let mut cur = Some(id);
        while let Some(next) = cur {
            let Some(actor) = self.actors.get(next) else { break };
            if next == self.stage {
                break;
            }
            point = actor.to_parent(point);
            cur = actor.parent;
        }
        point
    }

    /// The product of the scales of `id` and all its ancestors.
    pub fn absolute_scale(&self, id: ActorId) -> Scale {
        let mut scale = Scale::ONE;
        let mut cur = Some(id);
        while let Some(next) = cur {
            let Some(actor) = self.actors.get(next) else { break };
            scale = actor.scale.compose(scale);
            cur = actor.parent;
        }
        scale
    }

    /// The actor's own bounds in stage coordinates.
    pub fn stage_rect(&self, id: ActorId) -> Rect {
        let origin = self.to_stage(id, Point::ZERO);
        let scale = self.absolute_scale(id);
        let size = self.size(id);
        Rect::new(origin, Size::new(size.width * scale.x, size.height * scale.y))
    }
}
