use crate::engine::{RequestEvent, TabId, TrackerEngine};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

/// Events delivered by the request-interception and windowing collaborators.
#[derive(Debug, Clone)]
pub enum ObserverEvent {
    Request(RequestEvent),
    TabClosed(TabId),
}

/// Drains collaborator events and drives the engine. Runs until every sender
/// is dropped.
pub async fn run(engine: Arc<TrackerEngine>, mut events: mpsc::Receiver<ObserverEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            ObserverEvent::Request(request) => {
                engine.handle_request(request).await;
            }
            ObserverEvent::TabClosed(tab) => engine.tab_closed(tab),
        }
    }
    info!("Observer channel closed, stopping");
}
