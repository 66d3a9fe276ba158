use std::time::Duration;

use folio::pdf::{Command, ZoomMode};
use folio::test_utils::test_helpers::{ViewerBuilder, ViewerFixture};

const ROLL_UP: f32 = -0.5;
const ROLL_DOWN: f32 = 0.5;

fn wheel(delta: f32, zoom_modifier: bool) -> Command {
    Command::Wheel { delta, zoom_modifier }
}

fn loaded_and_calm(pages: u32) -> ViewerFixture {
    let mut fixture = ViewerBuilder::new().document("/a.pdf", pages).build();
    fixture.show("/a.pdf", 1);
    fixture.calm_down();
    fixture
}

#[test]
fn test_viewer_is_busy_until_calm_down_passes() {
    let mut fixture = ViewerBuilder::new().document("/a.pdf", 3).build();
    fixture.show("/a.pdf", 1);
    assert!(fixture.viewer.is_busy());

    fixture.clock.advance(Duration::from_millis(100));
    assert!(fixture.viewer.is_busy());

    fixture.clock.advance(Duration::from_millis(60));
    assert!(!fixture.viewer.is_busy());
}

#[test]
fn test_viewer_stays_busy_while_draws_are_running() {
    let mut fixture = ViewerBuilder::new()
        .document("/a.pdf", 3)
        .manual_drawing()
        .build();
    fixture.show("/a.pdf", 1);

    fixture.clock.advance(Duration::from_secs(5));
    assert!(fixture.viewer.is_busy());

    fixture.finish_draws();
    assert!(fixture.viewer.is_busy());
    fixture.calm_down();
    assert!(!fixture.viewer.is_busy());
    assert_eq!(fixture.viewer.status().pages_drawn, 3);
}

#[test]
fn test_wheel_zoom_is_ignored_while_busy() {
    let mut fixture = ViewerBuilder::new().document("/a.pdf", 3).build();
    fixture.show("/a.pdf", 1);

    fixture.command(wheel(ROLL_UP, true));

    assert_eq!(fixture.viewer.state().zoom.mode(), ZoomMode::FitPage);
    assert_eq!(fixture.viewer.zoom_percent(), 72);
}

#[test]
fn test_wheel_with_modifier_zooms() {
    let mut fixture = loaded_and_calm(3);

    fixture.command(wheel(ROLL_UP, true));
    assert_eq!(fixture.viewer.zoom_percent(), 75);

    fixture.calm_down();
    fixture.command(wheel(ROLL_DOWN, true));
    // a bigger step is needed right after an accepted one
    assert_eq!(fixture.viewer.zoom_percent(), 75);
    assert_eq!(fixture.viewer.state().wheel_threshold(), 0.25);

    fixture.command(wheel(ROLL_DOWN, true));
    assert_eq!(fixture.viewer.zoom_percent(), 66);
}

#[test]
fn test_wheel_pages_when_canvas_fits() {
    let mut fixture = loaded_and_calm(3);
    assert!(fixture.viewer.state().canvas_fits);

    fixture.command(wheel(ROLL_DOWN, false));
    assert_eq!(fixture.viewer.current_page(), 2);

    fixture.calm_down();
    fixture.command(wheel(-1.0, false));
    assert_eq!(fixture.viewer.current_page(), 1);
}

#[test]
fn test_wheel_does_not_page_oversized_canvas() {
    let mut fixture = loaded_and_calm(3);
    fixture.command(Command::FitWidth);
    fixture.calm_down();
    assert!(!fixture.viewer.state().canvas_fits);

    fixture.command(wheel(ROLL_DOWN, false));

    assert_eq!(fixture.viewer.current_page(), 1);
}

#[test]
fn test_small_wheel_deltas_are_absorbed() {
    let mut fixture = loaded_and_calm(3);

    fixture.command(wheel(-0.1, true));

    assert_eq!(fixture.viewer.state().zoom.mode(), ZoomMode::FitPage);
    assert_eq!(fixture.viewer.state().wheel_threshold(), 0.25);
}
