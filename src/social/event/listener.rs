//! Event listener callbacks

use async_trait::async_trait;

#[async_trait]
pub trait EventListener: Send + Sync {
    /// An event was created or edited; argument is the event as JSON
    async fn on_event_changed(&self, event_json: String);

    /// A registration row was inserted or changed status
    async fn on_registration_changed(&self, registration_json: String);
}

pub struct EmptyEventListener;

#[async_trait]
impl EventListener for EmptyEventListener {
    async fn on_event_changed(&self, _event_json: String) {}

    async fn on_registration_changed(&self, _registration_json: String) {}
}
