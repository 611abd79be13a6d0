//! Frame-clock driven property animation.
//!
//! There is one shared timeline per effect category, so every card that
//! flies during a layout pass moves in lockstep. Callers attach one-shot
//! completions to a running timeline; they are handed back, in attachment
//! order, from the `advance` call that finishes it.

use std::time::Duration;

use strum::IntoEnumIterator;
use tracing::{debug, trace};

use crate::common::config::AnimationSettings;
use crate::sys::geometry::{Point, SameAs};
use crate::sys::scene::{ActorId, Property, Scene};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum EffectKind {
    /// Cards moving to new layout slots, and the remove-window shrink.
    Fly,
    /// Viewport transitions between the grid and a full-screen window.
    Zoom,
}

#[derive(Debug)]
struct Timeline<C> {
    duration: Duration,
    elapsed: Duration,
    running: bool,
    completions: Vec<C>,
}

impl<C> Timeline<C> {
    fn new(duration: Duration) -> Self {
        Timeline {
            duration,
            elapsed: Duration::ZERO,
            running: false,
            completions: Vec::new(),
        }
    }

    fn progress(&self) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        (self.elapsed.as_secs_f64() / self.duration.as_secs_f64()).min(1.0)
    }
}

#[derive(Clone, Debug)]
struct Transition {
    kind: EffectKind,
    actor: ActorId,
    property: Property,
    from: Point,
    to: Point,
}

#[derive(Debug)]
pub struct EffectScheduler<C> {
    fly: Timeline<C>,
    zoom: Timeline<C>,
    transitions: Vec<Transition>,
}

impl<C> EffectScheduler<C> {
    pub fn new(settings: &AnimationSettings) -> Self {
        EffectScheduler {
            fly: Timeline::new(settings.fly_duration),
            zoom: Timeline::new(settings.zoom_duration),
            transitions: Vec::new(),
        }
    }

    fn timeline(&self, kind: EffectKind) -> &Timeline<C> {
        match kind {
            EffectKind::Fly => &self.fly,
            EffectKind::Zoom => &self.zoom,
        }
    }

    fn timeline_mut(&mut self, kind: EffectKind) -> &mut Timeline<C> {
        match kind {
            EffectKind::Fly => &mut self.fly,
            EffectKind::Zoom => &mut self.zoom,
        }
    }

    pub fn is_running(&self, kind: EffectKind) -> bool { self.timeline(kind).running }

    /// Registers a transition of `actor`'s `property` from its current value
    /// to `to`, replacing any transition of the same property already in
    /// flight. Returns false if there is nothing to animate.
    ///
    /// The transition only starts moving once `start` is called for `kind`.
    pub fn animate(
        &mut self,
        scene: &Scene,
        kind: EffectKind,
        actor: ActorId,
        property: Property,
        to: Point,
    ) -> bool {
        let Some(from) = scene.property(actor, property) else {
            trace!(?actor, ?property, "not animating a destroyed actor");
            return false;
        };
        self.transitions.retain(|t| !(t.actor == actor && t.property == property));
        if from.same_as(to) {
            return false;
        }
        self.transitions.push(Transition { kind, actor, property, from, to });
        true
    }

    /// Sets `property` immediately, cancelling any transition of it.
    pub fn jump(&mut self, scene: &mut Scene, actor: ActorId, property: Property, value: Point) {
        self.transitions.retain(|t| !(t.actor == actor && t.property == property));
        scene.set_property(actor, property, value);
    }

    /// Starts (or restarts) `kind`'s timeline.
    ///
    /// Transitions already in flight are rebased onto their current values so
    /// nothing jumps; completions attached earlier stay attached and fire
    /// when the restarted timeline finishes.
    pub fn start(&mut self, scene: &Scene, kind: EffectKind) {
        for t in self.transitions.iter_mut().filter(|t| t.kind == kind) {
            if let Some(current) = scene.property(t.actor, t.property) {
                t.from = current;
            }
        }
        let timeline = self.timeline_mut(kind);
        if timeline.running {
            debug!(%kind, "superseding running effect");
        }
        timeline.elapsed = Duration::ZERO;
        timeline.running = true;
    }

    /// Attaches a one-shot completion to `kind`'s running timeline.
    ///
    /// Hands the completion back if the timeline is idle, since it would
    /// never fire.
    pub fn schedule(&mut self, kind: EffectKind, completion: C) -> Result<(), C> {
        let timeline = self.timeline_mut(kind);
        if !timeline.running {
            return Err(completion);
        }
        timeline.completions.push(completion);
        Ok(())
    }

    /// Drops every transition touching `actor`, e.g. before destroying it.
    pub fn forget(&mut self, actor: ActorId) { self.transitions.retain(|t| t.actor != actor); }

    /// One frame-clock tick.
    pub fn advance(&mut self, scene: &mut Scene, dt: Duration) -> Vec<C> {
        let mut finished = Vec::new();
        for kind in EffectKind::iter() {
            let timeline = self.timeline_mut(kind);
            if !timeline.running {
                continue;
            }
            timeline.elapsed = timeline.elapsed.saturating_add(dt);
            let t = timeline.progress();
            self.apply(scene, kind, t, &mut finished);
        }
        finished
    }

    /// Jumps `kind`'s timeline to its end state, returning its completions.
    pub fn finish(&mut self, scene: &mut Scene, kind: EffectKind) -> Vec<C> {
        let mut finished = Vec::new();
        if self.timeline(kind).running {
            self.apply(scene, kind, 1.0, &mut finished);
        }
        finished
    }

    fn apply(&mut self, scene: &mut Scene, kind: EffectKind, t: f64, finished: &mut Vec<C>) {
        let done = t >= 1.0;
        let s = ease(t);

        for tr in self.transitions.iter().filter(|tr| tr.kind == kind) {
            let value = if done {
                tr.to
            } else {
                Point::new(blend(tr.from.x, tr.to.x, s), blend(tr.from.y, tr.to.y, s))
            };
            scene.set_property(tr.actor, tr.property, value);
        }

        if done {
            self.transitions.retain(|tr| tr.kind != kind);
            let timeline = self.timeline_mut(kind);
            timeline.running = false;
            finished.extend(timeline.completions.drain(..));
            trace!(%kind, "effect finished");
        }
    }
}

// https://notes.yvt.jp/Graphics/Easing-Functions/
fn ease(t: f64) -> f64 {
    if t < 0.5 {
        (1.0 - f64::sqrt(1.0 - f64::powi(2.0 * t, 2))) / 2.0
    } else {
        (f64::sqrt(1.0 - f64::powi(-2.0 * t + 2.0, 2)) + 1.0) / 2.0
    }
}

fn blend(a: f64, b: f64, s: f64) -> f64 { (1.0 - s) * a + s * b }
