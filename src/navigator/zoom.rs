//! Zooming between the thumbnail grid and a full-screen application.
//!
//! Zooming scales and translates the viewport so that a thumbnail's prison
//! lands exactly on the window's content rectangle. For a prison whose
//! origin sits at `a` on the stage with absolute scale `k`, the viewport
//! transform is `scale = 1/k`, `translation = content.origin - a/k`. Zooming
//! out starts from that same transform and animates back to the identity,
//! so the two directions are exact inverses.

use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use super::thumbnails::ThumbnailId;
use super::{Completion, EffectKind, Navigator, OnDone};
use crate::model::WindowId;
use crate::sys::geometry::{Point, SameAs, Scale};
use crate::sys::scene::Property;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ZoomState {
    /// Navigator shown with an identity viewport.
    Grid,
    ZoomingIn,
    ZoomingOut,
    /// Navigator hidden; windows shown 1:1 in the application layer.
    AppFullscreen,
}

impl ZoomState {
    pub fn is_transient(self) -> bool { matches!(self, ZoomState::ZoomingIn | ZoomState::ZoomingOut) }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViewportTransform {
    pub scale: Scale,
    pub translation: Point,
}

impl Default for ViewportTransform {
    fn default() -> Self { Self::IDENTITY }
}

impl ViewportTransform {
    pub const IDENTITY: ViewportTransform =
        ViewportTransform { scale: Scale::ONE, translation: Point::ZERO };

    pub fn is_identity(&self) -> bool {
        self.scale.same_as(Scale::ONE) && self.translation.same_as(Point::ZERO)
    }

    /// Maps a point in unzoomed stage space to where the viewport shows it.
    pub fn apply(&self, point: Point) -> Point { self.translation + point.scaled(self.scale) }
}

pub(super) struct ZoomManager;

impl ZoomManager {
    pub fn zoom_in(nav: &mut Navigator, window: WindowId, on_done: OnDone) {
        if nav.zoom != ZoomState::Grid {
            warn!(state = %nav.zoom, %window, "zoom in is only possible from the grid");
            nav.ready.push(on_done);
            return;
        }
        let Some(id) = nav.thumbnails.find_by_window(window) else {
            error!(%window, "zooming into a window that has no thumbnail");
            nav.hide();
            nav.ready.push(on_done);
            return;
        };

        // Land on the card's final slot, not wherever it is mid-flight.
        let landed = nav.effects.finish(&mut nav.scene, EffectKind::Fly);
        nav.dispatch(landed);

        Self::set_viewport(nav, ViewportTransform::IDENTITY);
        let target = Self::target(nav, id);
        nav.zoom_generation += 1;
        nav.zoom = ZoomState::ZoomingIn;
        debug!(%window, ?target, "zooming in");

        if !nav.config.animation.enabled {
            Self::set_viewport(nav, target);
            Self::finish_zoom_in(nav);
            nav.ready.push(on_done);
            return;
        }
        Self::animate_viewport(nav, target);
        let generation = nav.zoom_generation;
        if let Err(completion) =
            nav.effects.schedule(EffectKind::Zoom, Completion::FinishZoomIn { generation, on_done })
        {
            nav.dispatch(vec![completion]);
        }
    }

    pub fn zoom_out(nav: &mut Navigator, window: WindowId, on_done: OnDone) {
        if nav.zoom != ZoomState::AppFullscreen {
            warn!(state = %nav.zoom, %window, "zoom out is only possible from a full-screen app");
            nav.ready.push(on_done);
            return;
        }
        let Some(id) = nav.thumbnails.find_by_window(window) else {
            error!(%window, "zooming out of a window that has no thumbnail");
            nav.show();
            nav.ready.push(on_done);
            return;
        };

        nav.show();
        Self::centre_on(nav, id);
        let target = Self::target(nav, id);
        nav.zoom_generation += 1;
        debug!(%window, ?target, scroll = nav.scroll, "zooming out");

        if !nav.config.animation.enabled {
            nav.ready.push(on_done);
            return;
        }
        nav.zoom = ZoomState::ZoomingOut;
        Self::set_viewport(nav, target);
        Self::animate_viewport(nav, ViewportTransform::IDENTITY);
        let generation = nav.zoom_generation;
        if let Err(completion) = nav
            .effects
            .schedule(EffectKind::Zoom, Completion::FinishZoomOut { generation, on_done })
        {
            nav.dispatch(vec![completion]);
        }
    }

    /// Hides the navigator once the zoomed thumbnail covers the window. The
    /// viewport keeps the zoomed transform; showing the navigator again
    /// resets it.
    pub fn finish_zoom_in(nav: &mut Navigator) {
        debug!("zoomed in");
        nav.hide();
    }

    pub fn finish_zoom_out(nav: &mut Navigator) {
        debug!("zoomed out");
        nav.zoom = ZoomState::Grid;
    }

    /// Abandons any zoom in flight. Its completion still fires but no
    /// longer changes any state.
    pub fn cancel(nav: &mut Navigator) {
        if !nav.zoom.is_transient() {
            return;
        }
        debug!(state = %nav.zoom, "cancelling zoom");
        nav.zoom_generation += 1;
        let stale = nav.effects.finish(&mut nav.scene, EffectKind::Zoom);
        nav.dispatch(stale);
        Self::set_viewport(nav, ViewportTransform::IDENTITY);
    }

    /// Scrolls so the card is vertically centred, as far as the content
    /// allows.
    fn centre_on(nav: &mut Navigator, id: ThumbnailId) {
        let Some(t) = nav.thumbnails.get(id) else { return };
        let card = nav.scene.position(t.card);
        let desired = card.y + nav.layout.cell_height / 2.0 - nav.engine.screen().height / 2.0;
        let actual = nav.set_scroll(desired);
        if !actual.same_as(desired) {
            debug!(desired, actual, "scroll clamped while centring");
        }
    }

    /// Viewport transform that shows the thumbnail's prison at the window's
    /// real content geometry. Expects an identity viewport.
    pub fn target(nav: &Navigator, id: ThumbnailId) -> ViewportTransform {
        let Some(t) = nav.thumbnails.get(id) else {
            return ViewportTransform::IDENTITY;
        };
        let anchor = nav.scene.to_stage(t.prison, Point::ZERO);
        let scale = nav.scene.absolute_scale(t.prison).recip();
        ViewportTransform {
            scale,
            translation: t.window.content_rect.origin - anchor.scaled(scale),
        }
    }

    pub fn viewport(nav: &Navigator) -> ViewportTransform {
        let viewport = nav.layers.viewport;
        ViewportTransform {
            scale: nav.scene.scale(viewport),
            translation: nav.scene.position(viewport),
        }
    }

    pub fn set_viewport(nav: &mut Navigator, transform: ViewportTransform) {
        let viewport = nav.layers.viewport;
        let scale = Point::new(transform.scale.x, transform.scale.y);
        nav.effects.jump(&mut nav.scene, viewport, Property::Scale, scale);
        nav.effects.jump(&mut nav.scene, viewport, Property::Position, transform.translation);
    }

    fn animate_viewport(nav: &mut Navigator, transform: ViewportTransform) {
        let viewport = nav.layers.viewport;
        let scale = Point::new(transform.scale.x, transform.scale.y);
        nav.effects.animate(&nav.scene, EffectKind::Zoom, viewport, Property::Scale, scale);
        nav.effects.animate(
            &nav.scene,
            EffectKind::Zoom,
            viewport,
            Property::Position,
            transform.translation,
        );
        nav.effects.start(&nav.scene, EffectKind::Zoom);
    }
}
