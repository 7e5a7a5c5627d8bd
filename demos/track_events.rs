//! Tracking events end to end.
//!
//! This demo builds an application tracker and a section tracker derived from it,
//! tracks a few events and delivers them through a retrying, queued HTTP transport
//! that falls back to the console when the collector can't be reached.
//!
//! Point it at a collector with `TRACKER_ENDPOINT=http://localhost:8081` and raise the
//! log level with `RUST_LOG=debug`.

use std::sync::Arc;
use std::time::Duration;
use tracker_core::context::taxonomy::{
    content_context, path_context, pressable_context, root_location_context,
    APPLICATION_LOADED_EVENT, PRESS_EVENT,
};
use tracker_core::context::ContextsConfig;
use tracker_core::event::UntrackedEvent;
use tracker_core::plugins::{OpenTaxonomyValidationPlugin, PathContextPlugin};
use tracker_core::queue::{TrackerQueue, TrackerQueueConfig};
use tracker_core::repository::TrackerRepository;
use tracker_core::tracker::{Tracker, TrackerConfig};
use tracker_core::transport::{
    DebugTransport, HttpTransport, RetryPolicy, RetryTransport, TrackerTransport, TransportGroup,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    println!("=== Tracking Events ===\n");

    let http = RetryTransport::with_policy(
        Arc::new(HttpTransport::default()),
        RetryPolicy::default()
            .with_max_attempts(3)
            .with_timeouts(Duration::from_millis(200), Duration::from_secs(2)),
    );
    let transport: Arc<dyn TrackerTransport> = Arc::new(TransportGroup::new(vec![
        Arc::new(http),
        Arc::new(DebugTransport::default()),
    ]));

    let queue = Arc::new(TrackerQueue::new(TrackerQueueConfig {
        batch_size: 5,
        batch_delay: Duration::from_millis(250),
    }));

    let repository = TrackerRepository::default();
    let app = repository
        .make(
            TrackerConfig::new("demo-app")
                .with_location_stack(vec![root_location_context("home")])
                .with_plugins(vec![
                    Arc::new(PathContextPlugin::from_fn(|| Some("/home".to_string()))),
                    Arc::new(OpenTaxonomyValidationPlugin::new()),
                ])
                .with_transport(transport)
                .with_queue(queue),
        )
        .ok_or_else(|| anyhow::anyhow!("demo-app is already registered"))?;

    let loaded = app.track_event(UntrackedEvent::non_interactive(APPLICATION_LOADED_EVENT), &[]);
    println!("Tracked {} ({})", loaded.event_type(), loaded.id());

    let section = Tracker::from_tracker(
        &app,
        ContextsConfig::default().with_location(content_context("checkout")),
    );
    let press = section.track_event(
        UntrackedEvent::interactive(PRESS_EVENT).with_location(pressable_context("buy")),
        &[],
    );
    println!("Tracked {} at {:?}", press.event_type(), press.location_stack());

    // A second RootLocationContext: the validation plugin reports it, the event still goes out.
    app.track_event(
        UntrackedEvent::interactive(PRESS_EVENT).with_location(root_location_context("modal")),
        &[],
    );

    // The event's own PathContext wins over the one the plugin would add.
    let elsewhere = app.track_event(
        UntrackedEvent::non_interactive(APPLICATION_LOADED_EVENT)
            .with_global(path_context("/elsewhere")),
        &[],
    );
    println!("Tracked {} with {:?}", elsewhere.event_type(), elsewhere.global_contexts());

    if repository.wait_for_queues(Duration::from_secs(10)).await {
        println!("\nAll events delivered");
    } else {
        println!("\nSome events are still queued");
    }

    Ok(())
}
