use super::{Navigator, NavigatorEvent, ZoomState};
use crate::sys::geometry::Point;
use crate::sys::scene::{ActorId, Scene};

fn hits(scene: &Scene, actor: ActorId, point: Point) -> bool {
    scene.is_mapped(actor) && scene.stage_rect(actor).contains(point)
}

/// Finds what a click at `point` lands on, topmost first. `None` while the
/// grid is not at rest.
pub(super) fn hit_test(nav: &Navigator, point: Point) -> Option<NavigatorEvent> {
    if nav.zoom != ZoomState::Grid {
        return None;
    }
    let scene = &nav.scene;

    for (_, t) in nav.thumbnails.iter().rev() {
        if hits(scene, t.close, point) {
            return Some(NavigatorEvent::ThumbnailClosed { window: t.window.id });
        }
        if let Some(notification) = t.bound_note {
            if hits(scene, t.title, point) {
                return Some(NavigatorEvent::NotificationClicked { notification });
            }
        }
        if hits(scene, t.card, point) {
            return Some(NavigatorEvent::ThumbnailClicked { window: t.window.id });
        }
    }

    for notification in nav.notes.standalone_ids().rev() {
        let Some(card) = nav.notes.get(notification).and_then(|n| n.standalone_card()) else {
            continue;
        };
        if hits(scene, card.close, point) {
            return Some(NavigatorEvent::NotificationClosed { notification });
        }
        if hits(scene, card.card, point) {
            return Some(NavigatorEvent::NotificationClicked { notification });
        }
    }

    Some(NavigatorEvent::BackgroundClicked)
}
