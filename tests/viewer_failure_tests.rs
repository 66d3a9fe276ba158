use folio::pdf::{DrawError, RenderingState, TaskOutcome};
use folio::sim::SimDocument;
use folio::test_utils::test_helpers::ViewerBuilder;

#[test]
fn test_missing_document_alerts_and_completes() {
    let mut fixture = ViewerBuilder::new().build();

    let (_, outcomes) = fixture.show_recorded("/missing.pdf", 1);

    let expected = "Could not load the document: HTTP status 404".to_string();
    assert_eq!(
        *outcomes.borrow(),
        vec![TaskOutcome::Failed {
            message: expected.clone()
        }]
    );
    assert_eq!(fixture.alerts(), &[expected]);
    assert_eq!(fixture.errors().len(), 1);
    assert!(fixture.errors()[0].contains("url=/missing.pdf"));
    assert_eq!(fixture.viewer.page_count(), 0);
    assert_eq!(fixture.viewer.pending_tasks(), 0);
}

#[test]
fn test_failed_page_is_reported_and_others_are_shown() {
    let mut fixture = ViewerBuilder::new()
        .sim_document("/a.pdf", SimDocument::new(3).failing_page(2))
        .build();

    let (_, outcomes) = fixture.show_recorded("/a.pdf", 1);

    let expected = "Could not load page 2: HTTP status 500".to_string();
    assert_eq!(
        *outcomes.borrow(),
        vec![TaskOutcome::Failed {
            message: expected.clone()
        }]
    );
    assert_eq!(fixture.alerts(), &[expected]);
    assert_eq!(fixture.viewer.page_count(), 3);
    let pages: Vec<u32> = fixture.viewer.registry().page_numbers().collect();
    assert_eq!(pages, vec![1, 3]);
    assert!(fixture.viewer.is_shown());
}

#[test]
fn test_failure_alert_is_skipped_when_follow_up_is_queued() {
    let mut fixture = ViewerBuilder::new()
        .document("/a.pdf", 2)
        .manual_loading()
        .build();

    let (_, failed) = fixture.show_recorded("/missing.pdf", 1);
    let (_, loaded) = fixture.show_recorded("/a.pdf", 1);
    fixture.resolve_all();

    assert!(matches!(failed.borrow().as_slice(), [TaskOutcome::Failed { .. }]));
    assert_eq!(*loaded.borrow(), vec![TaskOutcome::Completed]);
    assert!(fixture.alerts().is_empty());
    assert_eq!(fixture.errors().len(), 1);
    assert_eq!(fixture.viewer.page_count(), 2);
}

#[test]
fn test_render_failure_is_logged_without_alert() {
    let mut fixture = ViewerBuilder::new()
        .document("/a.pdf", 3)
        .manual_drawing()
        .build();
    fixture.show("/a.pdf", 1);
    assert_eq!(fixture.control.drawing(), vec![1, 2, 3]);

    fixture.control.fail_draw(1, DrawError::failed("out of memory"));
    fixture.viewer.poll();

    assert!(fixture.alerts().is_empty());
    assert_eq!(
        fixture.errors(),
        &["Failed to render page 1 from url=/a.pdf, got error: out of memory".to_string()]
    );
    let view = fixture.viewer.registry().get(1).expect("page 1");
    assert_eq!(view.render_state, RenderingState::Initial);
}

#[test]
fn test_cancelled_draw_is_silent_and_redrawn_later() {
    let mut fixture = ViewerBuilder::new()
        .document("/a.pdf", 3)
        .manual_drawing()
        .build();
    fixture.show("/a.pdf", 1);

    fixture.control.fail_draw(1, DrawError::Cancelled);
    fixture.viewer.poll();
    assert!(fixture.errors().is_empty());
    assert_eq!(
        fixture.viewer.registry().get(1).map(|view| view.render_state),
        Some(RenderingState::Initial)
    );

    // the next visibility update starts it again
    fixture.scroll_to(0.0);
    assert_eq!(fixture.control.draw_log(), vec![1, 2, 3, 1]);
}

#[test]
fn test_render_failure_alerts_when_nothing_is_shown() {
    let mut fixture = ViewerBuilder::new()
        .document("/a.pdf", 1)
        .manual_drawing()
        .build();
    fixture.show("/a.pdf", 1);

    fixture.control.fail_draw(1, DrawError::failed("corrupt stream"));
    fixture.viewer.poll();

    assert_eq!(fixture.alerts(), &["Could not render page 1: corrupt stream".to_string()]);
    assert!(!fixture.viewer.is_shown());
}

#[test]
fn test_failed_page_drops_canvas_of_previous_document() {
    let mut fixture = ViewerBuilder::new()
        .document("/a.pdf", 3)
        .sim_document("/b.pdf", SimDocument::new(3).failing_page(2))
        .build();
    fixture.show("/a.pdf", 1);
    assert_eq!(fixture.viewer.status().pages_drawn, 3);

    fixture.show("/b.pdf", 1);

    assert_eq!(fixture.control.destroyed(), vec![2]);
    let pages: Vec<u32> = fixture.viewer.registry().page_numbers().collect();
    assert_eq!(pages, vec![1, 3]);
    assert_eq!(fixture.alerts(), &["Could not load page 2: HTTP status 500".to_string()]);
}

#[test]
fn test_failed_page_cancels_draw_of_previous_document() {
    let mut fixture = ViewerBuilder::new()
        .document("/a.pdf", 3)
        .sim_document("/b.pdf", SimDocument::new(3).failing_page(2))
        .manual_drawing()
        .build();
    fixture.show("/a.pdf", 1);
    assert_eq!(fixture.control.drawing(), vec![1, 2, 3]);

    fixture.show("/b.pdf", 1);

    assert!(fixture.viewer.registry().get(2).is_none());
    assert!(!fixture.control.drawing().contains(&2));
    assert!(fixture.errors().iter().all(|error| !error.contains("render")));
}
