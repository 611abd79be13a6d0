use std::cell::Cell;
use std::fs;
use std::rc::Rc;
use std::time::Duration;

use image::RgbaImage;
use pretty_assertions::assert_eq;
use tasknav::common::config::Config;
use tasknav::layout_engine::LayoutEngine;
use tasknav::model::{Notification, NotificationContent, NotificationId, Window, WindowId};
use tasknav::navigator::events::{self, EventReceiver};
use tasknav::navigator::{Navigator, NavigatorEvent, ViewportTransform, ZoomState};
use tasknav::sys::geometry::{Point, Rect, SameAs, Size};
use tasknav::sys::scene::ActorKind;

const FRAME: Duration = Duration::from_millis(16);

fn window(id: u32, class_id: &str) -> Window {
    Window {
        id: WindowId::new(id),
        class_id: class_id.into(),
        app_name: format!("{class_id} window"),
        frame: Rect::from_xywh(0.0, 0.0, 800.0, 480.0),
        content_rect: Rect::from_xywh(0.0, 56.0, 800.0, 424.0),
    }
}

fn note(id: u32, destination_app: &str, summary: &str) -> Notification {
    Notification {
        id: NotificationId::new(id),
        destination_app: destination_app.into(),
        content: NotificationContent { summary: summary.into(), icon: Some("mail".into()) },
    }
}

fn navigator_with(config: Config) -> (Navigator, EventReceiver) {
    let (tx, rx) = events::channel();
    (Navigator::new(config, tx), rx)
}

fn animated() -> (Navigator, EventReceiver) { navigator_with(Config::default()) }

fn still() -> (Navigator, EventReceiver) {
    let mut config = Config::default();
    config.animation.enabled = false;
    navigator_with(config)
}

fn settle(nav: &mut Navigator) {
    for _ in 0..100 {
        nav.advance(FRAME);
    }
}

fn counter() -> (Rc<Cell<usize>>, impl FnOnce() + 'static) {
    let count = Rc::new(Cell::new(0));
    let inner = count.clone();
    (count, move || inner.set(inner.get() + 1))
}

fn order(nav: &Navigator) -> Vec<u32> {
    nav.thumbnails().iter().map(|(_, t)| t.window.id.get()).collect()
}

fn thumbnail(nav: &Navigator, id: u32) -> &tasknav::navigator::Thumbnail {
    let tid = nav.thumbnails().find_by_window(WindowId::new(id)).expect("thumbnail");
    nav.thumbnails().get(tid).expect("record")
}

fn card_position(nav: &Navigator, id: u32) -> Point {
    nav.scene().position(thumbnail(nav, id).card)
}

fn note_position(nav: &Navigator, id: u32) -> Point {
    let card = nav
        .notes()
        .get(NotificationId::new(id))
        .and_then(|n| n.standalone_card())
        .expect("standalone card");
    nav.scene().position(card.card)
}

fn prison_on_stage(nav: &Navigator, id: u32) -> Rect {
    nav.scene().stage_rect(thumbnail(nav, id).prison)
}

#[test]
fn fifth_window_takes_the_third_slot() {
    let (mut nav, _rx) = still();
    for id in 1..=4 {
        nav.add_window(window(id, &format!("app{id}")));
    }
    assert_eq!(order(&nav), vec![1, 2, 3, 4]);

    nav.add_window(window(5, "app5"));
    assert_eq!(order(&nav), vec![1, 2, 5, 3, 4]);
    assert_eq!(card_position(&nav, 5), nav.layout().slot(2));
}

#[test]
fn zoom_in_lands_on_the_window_and_zoom_out_restores_the_grid() {
    let (mut nav, _rx) = animated();
    for id in 1..=3 {
        nav.add_window(window(id, &format!("app{id}")));
    }
    nav.enter();
    assert_eq!(nav.zoom_state(), ZoomState::Grid);

    let (zoomed_in, on_done) = counter();
    nav.zoom_in(WindowId::new(2), on_done);
    assert_eq!(nav.zoom_state(), ZoomState::ZoomingIn);
    settle(&mut nav);

    assert_eq!(zoomed_in.get(), 1);
    assert_eq!(nav.zoom_state(), ZoomState::AppFullscreen);
    assert!(!nav.is_active());
    assert!(prison_on_stage(&nav, 2).same_as(window(2, "app2").content_rect));
    let content = nav.scene().window_actor(WindowId::new(2)).unwrap();
    assert_eq!(nav.scene().parent(content), Some(nav.layers().app));
    assert_eq!(nav.scene().position(content), Point::ZERO);

    let (zoomed_out, on_done) = counter();
    nav.zoom_out(WindowId::new(2), on_done);
    assert_eq!(nav.zoom_state(), ZoomState::ZoomingOut);
    // The first frame of the zoom out shows the thumbnail exactly where the
    // window was.
    assert!(prison_on_stage(&nav, 2).same_as(window(2, "app2").content_rect));
    settle(&mut nav);

    assert_eq!(zoomed_out.get(), 1);
    assert_eq!(nav.zoom_state(), ZoomState::Grid);
    assert_eq!(nav.viewport_transform(), ViewportTransform::IDENTITY);
    assert_eq!(nav.scroll_offset(), 0.0);
}

#[test]
fn zoom_out_uses_the_clamped_scroll_offset() {
    let (mut nav, _rx) = animated();
    for id in 1..=12 {
        nav.add_window(window(id, &format!("app{id}")));
    }
    let last = order(&nav)[11];
    let max_scroll = nav.content_height() - 480.0;
    assert!(max_scroll > 0.0);

    nav.zoom_out(WindowId::new(last), || {});
    assert_eq!(nav.scroll_offset(), max_scroll);
    assert!(prison_on_stage(&nav, last).same_as(window(last, "x").content_rect));

    settle(&mut nav);
    assert_eq!(nav.viewport_transform(), ViewportTransform::IDENTITY);
    assert_eq!(nav.scroll_offset(), max_scroll);
}

#[test]
fn zoom_round_trip_from_a_scrolled_grid() {
    let (mut nav, _rx) = animated();
    for id in 1..=12 {
        nav.add_window(window(id, &format!("app{id}")));
    }
    nav.enter();
    let max_scroll = nav.content_height() - 480.0;
    assert_eq!(nav.scroll_to(max_scroll), max_scroll);
    let last = order(&nav)[11];
    let content_rect = window(last, "x").content_rect;

    let (zoomed_in, on_done) = counter();
    nav.zoom_in(WindowId::new(last), on_done);
    settle(&mut nav);
    assert_eq!(zoomed_in.get(), 1);
    assert_eq!(nav.zoom_state(), ZoomState::AppFullscreen);
    assert!(prison_on_stage(&nav, last).same_as(content_rect));

    let (zoomed_out, on_done) = counter();
    nav.zoom_out(WindowId::new(last), on_done);
    assert!(prison_on_stage(&nav, last).same_as(content_rect));
    settle(&mut nav);
    assert_eq!(zoomed_out.get(), 1);
    assert_eq!(nav.zoom_state(), ZoomState::Grid);
    assert_eq!(nav.viewport_transform(), ViewportTransform::IDENTITY);
    assert_eq!(nav.scroll_offset(), max_scroll);
}

#[test]
fn scroll_is_clamped_to_the_content() {
    let (mut nav, _rx) = still();
    nav.add_window(window(1, "app1"));
    assert_eq!(nav.scroll_to(120.0), 0.0);

    for id in 2..=12 {
        nav.add_window(window(id, &format!("app{id}")));
    }
    let max_scroll = nav.content_height() - 480.0;
    assert_eq!(nav.scroll_to(-5.0), 0.0);
    assert_eq!(nav.scroll_to(10_000.0), max_scroll);
    assert_eq!(nav.scene().position(nav.layers().content), Point::new(0.0, -max_scroll));
}

#[test]
fn removing_the_last_window_and_note_empties_the_navigator() {
    let (mut nav, _rx) = still();
    nav.add_window(window(1, "app1"));
    nav.add_window(window(2, "app2"));
    nav.add_notification(note(1, "elsewhere", "hello"));

    nav.remove_window(WindowId::new(1), || {});
    assert!(!nav.is_empty());
    nav.remove_window(WindowId::new(2), || {});
    assert!(!nav.is_empty());
    nav.remove_notification(NotificationId::new(1));
    assert!(nav.is_empty());
    assert!(!nav.has_window(WindowId::new(1)));
}

#[test]
fn matching_note_merges_and_is_demoted_with_its_window() {
    let (mut nav, _rx) = still();
    nav.add_window(window(1, "mail"));
    nav.add_notification(note(7, "mail", "New mail"));

    assert_eq!(nav.notes().standalone_len(), 0);
    assert!(nav.notes().get(NotificationId::new(7)).unwrap().is_merged());
    let t = thumbnail(&nav, 1);
    assert_eq!(t.bound_note, Some(NotificationId::new(7)));
    assert!(matches!(
        nav.scene().kind(t.title_label),
        Some(ActorKind::Label(summary)) if summary == "New mail"
    ));
    assert!(nav.scene().is_visible(t.title_icon));

    nav.remove_window(WindowId::new(1), || {});
    assert_eq!(nav.notes().standalone_len(), 1);
    let card = nav.notes().get(NotificationId::new(7)).and_then(|n| n.standalone_card()).unwrap();
    assert!(matches!(
        nav.scene().kind(card.summary),
        Some(ActorKind::Label(summary)) if summary == "New mail"
    ));
}

#[test]
fn window_added_after_its_note_takes_it_over() {
    let (mut nav, _rx) = still();
    nav.add_notification(note(7, "mail", "New mail"));
    assert_eq!(nav.notes().standalone_len(), 1);

    nav.add_window(window(1, "mail"));
    assert_eq!(nav.notes().standalone_len(), 0);
    assert_eq!(thumbnail(&nav, 1).bound_note, Some(NotificationId::new(7)));

    // Only one note fits a title; the second one stays standalone.
    nav.add_notification(note(8, "mail", "More mail"));
    assert_eq!(nav.notes().standalone_len(), 1);

    nav.remove_notification(NotificationId::new(7));
    let t = thumbnail(&nav, 1);
    assert_eq!(t.bound_note, None);
    assert!(!nav.scene().is_visible(t.title_icon));
    assert!(matches!(
        nav.scene().kind(t.title_label),
        Some(ActorKind::Label(name)) if name == "mail window"
    ));
}

#[test]
fn notification_grid_fills_right_then_left() {
    let (mut nav, _rx) = still();
    let engine = LayoutEngine::from_config(nav.config());

    nav.add_notification(note(1, "a", "one"));
    let top = engine.notes_area_top(nav.layout());
    assert_eq!(note_position(&nav, 1), Point::new(400.0, top));

    nav.add_notification(note(2, "b", "two"));
    assert_eq!(note_position(&nav, 1), Point::new(8.0, top));
    assert_eq!(note_position(&nav, 2), Point::new(400.0, top));

    nav.add_notification(note(3, "c", "three"));
    assert_eq!(note_position(&nav, 3), Point::new(400.0, top + 64.0));

    nav.remove_notification(NotificationId::new(1));
    assert_eq!(note_position(&nav, 2), Point::new(8.0, top));
    assert_eq!(note_position(&nav, 3), Point::new(400.0, top));
}

#[test]
fn notes_sit_below_the_thumbnail_grid() {
    let (mut nav, _rx) = still();
    nav.add_window(window(1, "app1"));
    nav.add_window(window(2, "app2"));
    nav.add_notification(note(1, "other", "hi"));

    let layout = *nav.layout();
    assert_eq!(note_position(&nav, 1).y, layout.grid_bottom() + 8.0);
    assert!(note_position(&nav, 1).y + 64.0 <= 480.0);
    assert_eq!(nav.content_height(), 480.0);
}

#[test]
fn second_note_pushes_the_first_one_left() {
    let (mut nav, _rx) = animated();
    nav.enter();
    nav.add_notification(note(1, "a", "one"));
    let top = note_position(&nav, 1).y;

    nav.add_notification(note(2, "b", "two"));
    assert_eq!(note_position(&nav, 1), Point::new(400.0, top));
    assert_eq!(note_position(&nav, 2), Point::new(400.0, top));

    settle(&mut nav);
    assert_eq!(note_position(&nav, 1), Point::new(8.0, top));
}

#[test]
fn remove_window_completes_after_the_exit_effect() {
    let (mut nav, _rx) = animated();
    nav.add_window(window(1, "app1"));
    nav.add_window(window(2, "app2"));
    nav.enter();

    let (done, on_done) = counter();
    nav.remove_window(WindowId::new(1), on_done);
    assert!(!nav.has_window(WindowId::new(1)));
    assert_eq!(nav.thumbnail_count(), 1);
    assert_eq!(done.get(), 0);

    nav.advance(Duration::from_millis(100));
    assert_eq!(done.get(), 0);
    nav.advance(Duration::from_millis(200));
    assert_eq!(done.get(), 1);
    settle(&mut nav);
    assert_eq!(done.get(), 1);

    let content = nav.scene().window_actor(WindowId::new(1)).unwrap();
    assert_eq!(nav.scene().parent(content), Some(nav.layers().app));
    assert_eq!(card_position(&nav, 2), nav.layout().slot(0));
}

#[test_log::test]
fn removing_a_closing_window_again_still_completes_both() {
    let (mut nav, _rx) = animated();
    nav.add_window(window(1, "app1"));
    nav.add_window(window(2, "app2"));
    nav.enter();

    let (first, on_done) = counter();
    nav.remove_window(WindowId::new(1), on_done);
    let (second, on_done) = counter();
    nav.remove_window(WindowId::new(1), on_done);
    assert_eq!((first.get(), second.get()), (0, 1));

    settle(&mut nav);
    assert_eq!((first.get(), second.get()), (1, 1));
    assert_eq!(nav.thumbnail_count(), 1);
}

#[test]
fn remove_window_while_hidden_completes_immediately() {
    let (mut nav, _rx) = animated();
    nav.add_window(window(1, "app1"));
    let (done, on_done) = counter();
    nav.remove_window(WindowId::new(1), on_done);
    assert_eq!(done.get(), 1);
    assert!(nav.is_empty());
}

#[test]
fn new_card_stays_hidden_while_the_others_fly() {
    let (mut nav, _rx) = animated();
    nav.enter();
    nav.add_window(window(1, "app1"));
    assert!(nav.scene().is_visible(thumbnail(&nav, 1).card));

    nav.add_window(window(2, "app2"));
    assert!(!nav.scene().is_visible(thumbnail(&nav, 2).card));
    assert_eq!(card_position(&nav, 2), nav.layout().slot(1));

    settle(&mut nav);
    assert!(nav.scene().is_visible(thumbnail(&nav, 2).card));
    assert_eq!(card_position(&nav, 1), nav.layout().slot(0));
}

#[test]
fn clicks_are_routed_to_what_they_hit() {
    let (mut nav, mut rx) = still();
    nav.add_window(window(1, "app1"));
    nav.add_window(window(2, "app2"));
    assert_eq!(nav.handle_click(Point::new(1.0, 1.0)), None);

    nav.enter();
    let close = nav.scene().stage_rect(thumbnail(&nav, 1).close).mid();
    let card = nav.scene().stage_rect(thumbnail(&nav, 2).card).mid();
    assert_eq!(
        nav.handle_click(close),
        Some(NavigatorEvent::ThumbnailClosed { window: WindowId::new(1) })
    );
    assert_eq!(
        nav.handle_click(card),
        Some(NavigatorEvent::ThumbnailClicked { window: WindowId::new(2) })
    );
    assert_eq!(nav.handle_click(Point::new(1.0, 1.0)), Some(NavigatorEvent::BackgroundClicked));

    nav.add_notification(note(5, "app1", "merged"));
    nav.add_notification(note(6, "other", "standalone"));
    let title = nav.scene().stage_rect(thumbnail(&nav, 1).title).mid();
    let standalone = nav.notes().get(NotificationId::new(6)).unwrap().standalone_card().unwrap();
    let note_close = nav.scene().stage_rect(standalone.close).mid();
    let note_card = nav.scene().stage_rect(standalone.summary).mid();
    assert_eq!(
        nav.handle_click(title),
        Some(NavigatorEvent::NotificationClicked { notification: NotificationId::new(5) })
    );
    assert_eq!(
        nav.handle_click(note_close),
        Some(NavigatorEvent::NotificationClosed { notification: NotificationId::new(6) })
    );
    assert_eq!(
        nav.handle_click(note_card),
        Some(NavigatorEvent::NotificationClicked { notification: NotificationId::new(6) })
    );

    let mut received = Vec::new();
    while let Ok(event) = rx.try_recv() {
        received.push(event);
    }
    assert_eq!(received.len(), 6);
    assert_eq!(received[2], NavigatorEvent::BackgroundClicked);
}

#[test]
fn clicks_are_ignored_mid_zoom() {
    let (mut nav, mut rx) = animated();
    nav.add_window(window(1, "app1"));
    nav.enter();
    nav.zoom_in(WindowId::new(1), || {});
    assert_eq!(nav.handle_click(Point::new(1.0, 1.0)), None);
    assert!(rx.try_recv().is_err());
}

#[test_log::test]
fn invalid_transitions_still_complete() {
    let (mut nav, _rx) = animated();
    nav.add_window(window(1, "app1"));

    let (done, on_done) = counter();
    nav.zoom_in(WindowId::new(1), on_done);
    assert_eq!(done.get(), 1);
    assert_eq!(nav.zoom_state(), ZoomState::AppFullscreen);

    nav.enter();
    let (done, on_done) = counter();
    nav.zoom_out(WindowId::new(1), on_done);
    assert_eq!(done.get(), 1);
    assert_eq!(nav.zoom_state(), ZoomState::Grid);

    let (done, on_done) = counter();
    nav.zoom_in(WindowId::new(99), on_done);
    assert_eq!(done.get(), 1);
    assert_eq!(nav.zoom_state(), ZoomState::AppFullscreen);

    let (done, on_done) = counter();
    nav.zoom_out(WindowId::new(99), on_done);
    assert_eq!(done.get(), 1);
    assert_eq!(nav.zoom_state(), ZoomState::Grid);

    let (done, on_done) = counter();
    nav.remove_window(WindowId::new(99), on_done);
    assert_eq!(done.get(), 1);
}

#[test]
fn exit_mid_zoom_still_fires_the_callback() {
    let (mut nav, _rx) = animated();
    nav.add_window(window(1, "app1"));
    nav.enter();

    let (done, on_done) = counter();
    nav.zoom_in(WindowId::new(1), on_done);
    nav.advance(Duration::from_millis(100));
    nav.exit();
    assert_eq!(done.get(), 1);
    assert_eq!(nav.zoom_state(), ZoomState::AppFullscreen);

    settle(&mut nav);
    assert_eq!(done.get(), 1);
    nav.enter();
    assert_eq!(nav.viewport_transform(), ViewportTransform::IDENTITY);
}

#[test]
fn enter_and_exit_lend_the_windows() {
    let (mut nav, _rx) = still();
    nav.add_window(window(1, "app1"));
    let content = nav.scene().window_actor(WindowId::new(1)).unwrap();
    assert_eq!(nav.scene().parent(content), Some(nav.layers().app));

    nav.enter();
    let t = thumbnail(&nav, 1);
    assert!(t.is_claimed());
    assert_eq!(nav.scene().parent(content), Some(t.prison));
    assert!(nav.scene().is_mapped(content));

    nav.exit();
    assert!(!thumbnail(&nav, 1).is_claimed());
    assert_eq!(nav.scene().parent(content), Some(nav.layers().app));
    assert!(!nav.scene().is_visible(nav.layers().root));
}

#[test]
fn prison_fits_the_content_below_the_title() {
    let (mut nav, _rx) = still();
    nav.add_window(window(1, "app1"));
    let cell = Rect::new(nav.layout().slot(0), nav.layout().cell_size());
    let prison = prison_on_stage(&nav, 1);
    let title = nav.config().layout.title_height;

    assert!(prison.origin.y >= cell.origin.y + title);
    assert!(prison.max().y <= cell.max().y + 1e-9);
    assert!(prison.max().x <= cell.max().x + 1e-9);
    assert!((prison.mid().x - cell.mid().x).abs() < 1e-9);
    let aspect = prison.size.width / prison.size.height;
    assert!((aspect - 800.0 / 424.0).abs() < 1e-9);
}

#[test]
fn hibernation_shows_a_still_until_replaced() {
    let (mut nav, _rx) = still();
    nav.add_window(window(1, "mail"));
    nav.enter();
    nav.hibernate_window(WindowId::new(1));

    let t = thumbnail(&nav, 1);
    assert!(t.is_hibernating());
    assert!(nav.scene().is_visible(t.badge));
    let still = t.still.expect("placeholder");
    assert!(matches!(nav.scene().kind(still), Some(ActorKind::Placeholder)));
    let content = nav.scene().window_actor(WindowId::new(1)).unwrap();
    assert!(!nav.scene().is_visible(content));

    let mut woken = window(2, "mail");
    woken.app_name = "Mail".into();
    nav.replace_window(WindowId::new(1), woken);

    assert!(!nav.has_window(WindowId::new(1)));
    assert_eq!(order(&nav), vec![2]);
    let t = thumbnail(&nav, 2);
    assert!(!t.is_hibernating());
    assert!(t.still.is_none());
    assert!(!nav.scene().is_visible(t.badge));
    assert!(matches!(
        nav.scene().kind(t.title_label),
        Some(ActorKind::Label(name)) if name == "Mail"
    ));
    let new_content = nav.scene().window_actor(WindowId::new(2)).unwrap();
    assert_eq!(nav.scene().parent(new_content), Some(t.prison));
    assert_eq!(nav.scene().parent(content), Some(nav.layers().app));
}

#[test_log::test]
fn replacing_an_unknown_window_adds_it() {
    let (mut nav, _rx) = still();
    nav.replace_window(WindowId::new(1), window(2, "app2"));
    assert!(nav.has_window(WindowId::new(2)));
}

#[test_log::test]
fn undecodable_snapshot_becomes_a_placeholder() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("mail.png"), b"not an image").unwrap();
    RgbaImage::new(16, 9).save(dir.path().join("chat.png")).unwrap();

    let mut config = Config::default();
    config.animation.enabled = false;
    config.snapshots.dir = Some(dir.path().to_path_buf());
    let (mut nav, _rx) = navigator_with(config);
    nav.add_window(window(1, "mail"));
    nav.add_window(window(2, "chat"));
    nav.add_window(window(3, "browser"));
    nav.enter();

    let broken = thumbnail(&nav, 1).still.expect("placeholder");
    assert!(matches!(nav.scene().kind(broken), Some(ActorKind::Placeholder)));
    assert_eq!(nav.scene().size(broken), Size::new(800.0, 424.0));

    let cached = thumbnail(&nav, 2).still.expect("snapshot");
    match nav.scene().kind(cached) {
        Some(ActorKind::Snapshot(snapshot)) => assert_eq!(snapshot.size, Size::new(16.0, 9.0)),
        other => panic!("expected a snapshot, got {other:?}"),
    }

    assert!(thumbnail(&nav, 3).still.is_none());
    let live = nav.scene().window_actor(WindowId::new(3)).unwrap();
    assert!(nav.scene().is_mapped(live));
}

#[test]
fn updates_reach_either_representation() {
    let (mut nav, _rx) = still();
    nav.add_window(window(1, "mail"));
    nav.add_notification(note(1, "mail", "one"));
    nav.add_notification(note(2, "chat", "two"));

    let update = |summary: &str| NotificationContent { summary: summary.into(), icon: None };
    nav.update_notification(NotificationId::new(1), update("one, edited"));
    nav.update_notification(NotificationId::new(2), update("two, edited"));

    let title = thumbnail(&nav, 1).title_label;
    assert!(matches!(
        nav.scene().kind(title),
        Some(ActorKind::Label(s)) if s == "one, edited"
    ));
    let card = nav.notes().get(NotificationId::new(2)).unwrap().standalone_card().unwrap();
    assert!(matches!(
        nav.scene().kind(card.summary),
        Some(ActorKind::Label(s)) if s == "two, edited"
    ));
    assert!(matches!(nav.scene().kind(card.icon), Some(ActorKind::Icon(None))));
    assert_eq!(nav.notification_count(), 2);
}
