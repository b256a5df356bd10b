//! Controller behaviour against the headless engine and the in-memory document.

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::timeout;
use tourguide::{
    BBox, ButtonSpec, MemoryDocument, PlaybackEngine, StepDescriptor, Tour, TourController,
    TourEvent, TourEventKind, TourOptions,
};

fn controller(path: &str) -> (Arc<MemoryDocument>, TourController<PlaybackEngine>) {
    let doc = Arc::new(MemoryDocument::new(path));
    let controller = TourController::new(PlaybackEngine::new(), doc.clone());
    (doc, controller)
}

async fn next_event(events: &mut broadcast::Receiver<TourEvent>) -> TourEvent {
    timeout(Duration::from_secs(60), events.recv())
        .await
        .expect("no event")
        .expect("channel closed")
}

/// Everything emitted until the clock has moved `window` forward.
async fn drain(events: &mut broadcast::Receiver<TourEvent>, window: Duration) -> Vec<TourEvent> {
    tokio::time::sleep(window).await;
    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }
    seen
}

fn shown_id(event: &TourEvent) -> Option<&str> {
    match event.kind {
        TourEventKind::Shown { ref step_id, .. } => step_id.as_deref(),
        _ => None,
    }
}

#[tokio::test(start_paused = true)]
async fn test_operations_are_noops_without_a_tour() {
    let (_doc, tours) = controller("/");
    let mut events = tours.engine().subscribe();

    assert!(!tours.is_running());
    tours.resume();
    tours.cancel();
    assert!(!tours.is_running());
    assert!(tours.session().is_none());
    assert!(drain(&mut events, Duration::from_millis(100)).await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_start_shows_first_step() {
    let (_doc, mut tours) = controller("/");
    let mut events = tours.engine().subscribe();

    tours.start(
        vec![
            StepDescriptor::new("welcome").text("Hi"),
            StepDescriptor::new("second"),
        ],
        &TourOptions::default(),
    );
    assert!(tours.is_running());

    let event = next_event(&mut events).await;
    assert_eq!(shown_id(&event), Some("welcome"));
    let tour = tours.session().unwrap();
    assert_eq!(event.tour, tour.id());
    assert_eq!(tour.len(), 2);
    assert!(tour.is_displaying());
}

#[tokio::test(start_paused = true)]
async fn test_options_reach_the_engine() {
    let (_doc, mut tours) = controller("/");
    let options = TourOptions {
        default_step_options: Some(json!({ "classes": "tour-dark" })),
        tour_options: Some(json!({ "exitOnEsc": false })),
    };
    tours.start(vec![StepDescriptor::new("a")], &options);

    let merged = tours.session().unwrap().options();
    assert_eq!(merged["useModalOverlay"], true);
    assert_eq!(merged["exitOnEsc"], false);
    assert_eq!(merged["defaultStepOptions"]["classes"], "tour-dark");
    assert_eq!(merged["defaultStepOptions"]["scrollTo"], false);
}

#[tokio::test(start_paused = true)]
async fn test_start_cancels_previous_tour_first() {
    let (_doc, mut tours) = controller("/");
    let mut events = tours.engine().subscribe();

    tours.start(vec![StepDescriptor::new("old")], &TourOptions::default());
    let first = Arc::clone(tours.session().unwrap());
    assert_eq!(shown_id(&next_event(&mut events).await), Some("old"));

    tours.start(vec![StepDescriptor::new("new")], &TourOptions::default());
    let second = tours.session().unwrap();
    assert!(!first.is_active());
    assert!(second.is_active());
    assert!(!Arc::ptr_eq(&first, second));

    let cancelled = next_event(&mut events).await;
    assert_eq!(cancelled.tour, first.id());
    assert_eq!(cancelled.kind, TourEventKind::Cancelled);

    let shown = next_event(&mut events).await;
    assert_eq!(shown.tour, second.id());
    assert_eq!(shown_id(&shown), Some("new"));
}

#[tokio::test(start_paused = true)]
async fn test_superseded_wait_has_no_effect() {
    let (doc, mut tours) = controller("/");
    let mut events = tours.engine().subscribe();

    tours.start(
        vec![StepDescriptor::new("settings")
            .route("/settings")
            .attach("#never")
            .wait_timeout(300)],
        &TourOptions::default(),
    );
    let first = tours.session().unwrap().id();

    // Let the first tour's step begin waiting, then replace the tour.
    tokio::time::sleep(Duration::from_millis(50)).await;
    tours.start(vec![StepDescriptor::new("fresh")], &TourOptions::default());
    let second = tours.session().unwrap().id();

    let seen = drain(&mut events, Duration::from_secs(1)).await;
    let from_first: Vec<_> = seen.iter().filter(|e| e.tour == first).collect();
    assert_eq!(from_first.len(), 1, "events: {:?}", seen);
    assert_eq!(from_first[0].kind, TourEventKind::Cancelled);

    assert!(seen
        .iter()
        .any(|e| e.tour == second && shown_id(e) == Some("fresh")));
    // The abandoned step did navigate before it was superseded.
    assert_eq!(doc.history(), vec!["/settings".to_string()]);
    assert!(tours.is_running());
}

#[tokio::test(start_paused = true)]
async fn test_cancel_then_resume() {
    let (_doc, mut tours) = controller("/");
    let mut events = tours.engine().subscribe();
    tours.start(
        vec![StepDescriptor::new("a"), StepDescriptor::new("b")],
        &TourOptions::default(),
    );
    next_event(&mut events).await;

    tours.cancel();
    assert!(!tours.is_running());
    assert!(tours.session().is_some());
    assert_eq!(next_event(&mut events).await.kind, TourEventKind::Cancelled);

    tours.resume();
    assert!(tours.is_running());
    assert_eq!(shown_id(&next_event(&mut events).await), Some("a"));
}

#[tokio::test(start_paused = true)]
async fn test_buttons_walk_the_tour_across_routes() {
    let (doc, mut tours) = controller("/");
    doc.mount_on_route("/", "#search", BBox::new(0.0, 0.0, 300.0, 40.0));
    doc.mount_on_route("/feed", "#posts", BBox::new(0.0, 120.0, 600.0, 800.0));
    let mut events = tours.engine().subscribe();

    tours.start(
        vec![
            StepDescriptor::new("search")
                .route("/")
                .attach_on("#search", "bottom")
                .button(ButtonSpec::next("Next")),
            StepDescriptor::new("feed")
                .route("/feed")
                .attach("#posts")
                .button(ButtonSpec::back("Back"))
                .button(ButtonSpec::next("Done")),
        ],
        &TourOptions::default(),
    );

    assert_eq!(shown_id(&next_event(&mut events).await), Some("search"));
    assert!(doc.history().is_empty());

    let tour = Arc::clone(tours.session().unwrap());
    tour.step(0).unwrap().button("Next").unwrap().click();
    assert_eq!(shown_id(&next_event(&mut events).await), Some("feed"));
    assert_eq!(doc.path(), "/feed");

    tour.step(1).unwrap().button("Back").unwrap().click();
    assert_eq!(shown_id(&next_event(&mut events).await), Some("search"));
    assert_eq!(doc.path(), "/");

    tour.step(0).unwrap().button("Next").unwrap().click();
    next_event(&mut events).await;
    tour.step(1).unwrap().button("Done").unwrap().click();
    assert_eq!(next_event(&mut events).await.kind, TourEventKind::Completed);
    assert!(!tours.is_running());
    assert_eq!(doc.history(), vec!["/feed", "/", "/feed"]);
}

#[tokio::test(start_paused = true)]
async fn test_missing_target_stops_the_tour() {
    let (doc, mut tours) = controller("/");
    let mut events = tours.engine().subscribe();

    let started = tokio::time::Instant::now();
    tours.start(
        vec![StepDescriptor::new("save")
            .route("/settings")
            .attach("#save-btn")
            .wait_timeout(500)],
        &TourOptions::default(),
    );

    let event = next_event(&mut events).await;
    assert!(started.elapsed() > Duration::from_millis(500));
    match event.kind {
        TourEventKind::StepFailed { index, ref error } => {
            assert_eq!(index, 0);
            assert!(error.contains("#save-btn"));
        }
        ref other => panic!("Expected StepFailed, got {:?}", other),
    }
    assert_eq!(doc.history(), vec!["/settings".to_string()]);
    assert!(!tours.is_running());
}

#[test]
fn test_start_outside_runtime_does_not_panic() {
    let (_doc, mut tours) = controller("/");
    let mut events = tours.engine().subscribe();

    tours.start(vec![StepDescriptor::new("intro")], &TourOptions::default());

    assert!(!tours.is_running());
    assert!(tours.session().is_some());
    assert!(matches!(
        events.try_recv().map(|e| e.kind),
        Ok(TourEventKind::StepFailed { index: 0, .. })
    ));
    tours.cancel();
    tours.resume();
    assert!(!tours.is_running());
}
