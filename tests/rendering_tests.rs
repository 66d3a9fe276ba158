use folio::pdf::{Command, RenderingState};
use folio::test_utils::test_helpers::{ViewerBuilder, ViewerFixture};

fn loaded_with_manual_draws(pages: u32) -> ViewerFixture {
    let mut fixture = ViewerBuilder::new()
        .document("/a.pdf", pages)
        .manual_drawing()
        .build();
    fixture.show("/a.pdf", 1);
    fixture
}

fn state_of(fixture: &ViewerFixture, page: u32) -> Option<RenderingState> {
    fixture.viewer.registry().get(page).map(|view| view.render_state)
}

#[test]
fn test_draws_of_previous_zoom_are_dropped() {
    let mut fixture = loaded_with_manual_draws(3);
    assert_eq!(fixture.control.drawing(), vec![1, 2, 3]);

    fixture.command(Command::ZoomIn);

    // old draws were cancelled by the surface update, only visible and
    // prefetched pages at the new zoom are drawing
    assert_eq!(fixture.control.drawing(), vec![1, 2]);
    assert_eq!(state_of(&fixture, 3), Some(RenderingState::Initial));
    assert!(fixture.errors().is_empty());

    fixture.finish_draws();
    assert_eq!(fixture.viewer.status().pages_drawn, 2);
    assert_eq!(state_of(&fixture, 1), Some(RenderingState::Finished));
}

#[test]
fn test_finished_page_is_centered_in_container() {
    let fixture = {
        let mut fixture = ViewerBuilder::new().document("/a.pdf", 1).build();
        fixture.show("/a.pdf", 1);
        fixture
    };

    let placement = fixture.control.placement(1).expect("placed");
    let view = fixture.viewer.registry().get(1).expect("page 1");
    assert_eq!(view.placement, Some(placement));
    assert!(placement.shadow);
    // canvas about 440 wide in an 800 wide container
    assert!((placement.left - 179.75).abs() < 0.5);
    assert!((placement.top - 15.0).abs() < 0.5);
}

#[test]
fn test_paused_page_is_resumed_when_visible_again() {
    let mut fixture = loaded_with_manual_draws(3);

    fixture.control.pause_draw(1);
    fixture.viewer.poll();
    assert_eq!(state_of(&fixture, 1), Some(RenderingState::Paused));

    fixture.scroll_to(0.0);

    assert_eq!(fixture.control.resume_log(), vec![1]);
    assert_eq!(state_of(&fixture, 1), Some(RenderingState::Running));
    // no second draw was started
    assert_eq!(fixture.control.draw_log(), vec![1, 2, 3]);

    fixture.control.finish_draw(1);
    fixture.viewer.poll();
    assert_eq!(state_of(&fixture, 1), Some(RenderingState::Finished));
}

#[test]
fn test_running_pages_are_not_drawn_twice() {
    let mut fixture = loaded_with_manual_draws(5);

    fixture.scroll_to(10.0);
    fixture.scroll_to(20.0);

    assert_eq!(fixture.control.draw_log(), vec![1, 2, 3]);
}

#[test]
fn test_prefetch_can_be_disabled() {
    let mut fixture = ViewerBuilder::new()
        .document("/a.pdf", 5)
        .prefetch(false)
        .build();

    fixture.show("/a.pdf", 1);

    assert_eq!(fixture.control.draw_log(), vec![1, 2]);
}

#[test]
fn test_lower_threshold_moves_current_page_earlier() {
    let mut fixture = ViewerBuilder::new()
        .document("/a.pdf", 5)
        .threshold(50)
        .build();
    fixture.show("/a.pdf", 1);

    // page 2 is 54% visible, page 1 49%
    fixture.scroll_to(290.0);

    assert_eq!(fixture.viewer.current_page(), 2);
}

#[test]
fn test_new_document_destroys_old_views_on_target_switch() {
    let mut fixture = ViewerBuilder::new()
        .document("/a.pdf", 3)
        .document("/b.pdf", 1)
        .manual_drawing()
        .build();
    fixture.show("/a.pdf", 1);

    fixture.show_target("/b.pdf", 1, "other");

    assert_eq!(fixture.control.destroyed(), vec![1, 2, 3]);
    assert_eq!(fixture.viewer.registry().len(), 1);
    assert_eq!(fixture.control.drawing(), vec![1]);
    assert!(fixture.errors().is_empty());
}
