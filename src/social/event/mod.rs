//! Events ("parties"): organiser-owned events, per-user registrations with
//! an optional approval step, and the visible-events aggregation.

pub mod dao;
pub mod listener;
pub mod models;
pub mod service;
pub mod visibility;

pub use dao::EventDao;
pub use listener::{EmptyEventListener, EventListener};
pub use models::{
    Event, EventRegistration, EventSummary, EventUpdate, LocationRef, NewEvent,
    RegistrationStatus, RegistrationView, VisibleEvents,
};
pub use service::EventService;
pub use visibility::partition_visible_events;
