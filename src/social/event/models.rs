//! Event and registration models

use anyhow::anyhow;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
    Registered,
    Cancelled,
    Waitlisted,
}

impl RegistrationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationStatus::Registered => "registered",
            RegistrationStatus::Cancelled => "cancelled",
            RegistrationStatus::Waitlisted => "waitlisted",
        }
    }

    /// `registered` and `waitlisted` rows hold a place; `cancelled` does not
    pub fn is_active(&self) -> bool {
        !matches!(self, RegistrationStatus::Cancelled)
    }
}

impl fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RegistrationStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "registered" => Ok(RegistrationStatus::Registered),
            "cancelled" => Ok(RegistrationStatus::Cancelled),
            "waitlisted" => Ok(RegistrationStatus::Waitlisted),
            other => Err(anyhow!("unknown registration status: {}", other)),
        }
    }
}

/// Where an event takes place: a row in `bars` or in `custom_locations`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum LocationRef {
    Bar(String),
    Custom(String),
}

impl LocationRef {
    /// Split into the `(bar_id, custom_location_id)` column pair
    pub fn to_columns(location: Option<&LocationRef>) -> (Option<String>, Option<String>) {
        match location {
            Some(LocationRef::Bar(id)) => (Some(id.clone()), None),
            Some(LocationRef::Custom(id)) => (None, Some(id.clone())),
            None => (None, None),
        }
    }

    pub fn from_columns(bar_id: Option<String>, custom_id: Option<String>) -> Option<LocationRef> {
        match (bar_id, custom_id) {
            (Some(id), _) => Some(LocationRef::Bar(id)),
            (None, Some(id)) => Some(LocationRef::Custom(id)),
            (None, None) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub organiser_id: String,
    pub title: String,
    pub description: Option<String>,
    pub is_public: bool,
    pub requires_approval: bool,
    pub start_time: i64,
    pub end_time: i64,
    pub capacity: Option<i64>,
    pub location: Option<LocationRef>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Input for creating an event; the organiser is the acting user
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    pub title: String,
    pub description: Option<String>,
    pub is_public: bool,
    pub requires_approval: bool,
    pub start_time: i64,
    pub end_time: i64,
    pub capacity: Option<i64>,
    pub location: Option<LocationRef>,
}

/// Tell an explicit `null` (`Some(None)`) apart from a missing field (`None`)
fn deserialize_double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Organiser edits; `None` keeps the current value.
///
/// Nullable columns take `Some(None)` to clear them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventUpdate {
    pub title: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_double_option"
    )]
    pub description: Option<Option<String>>,
    pub is_public: Option<bool>,
    pub requires_approval: Option<bool>,
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_double_option"
    )]
    pub capacity: Option<Option<i64>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_double_option"
    )]
    pub location: Option<Option<LocationRef>>,
}

impl EventUpdate {
    pub fn apply(&self, event: &mut Event) {
        if let Some(title) = &self.title {
            event.title = title.trim().to_string();
        }
        if let Some(description) = &self.description {
            event.description = description.clone();
        }
        if let Some(is_public) = self.is_public {
            event.is_public = is_public;
        }
        if let Some(requires_approval) = self.requires_approval {
            event.requires_approval = requires_approval;
        }
        if let Some(start_time) = self.start_time {
            event.start_time = start_time;
        }
        if let Some(end_time) = self.end_time {
            event.end_time = end_time;
        }
        if let Some(capacity) = self.capacity {
            event.capacity = capacity;
        }
        if let Some(location) = &self.location {
            event.location = location.clone();
        }
    }
}

/// One row of `event_registrations`; at most one per (event, user)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRegistration {
    pub id: String,
    pub event_id: String,
    pub user_id: String,
    pub status: RegistrationStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

/// What the UI sees of a user's registration. A cancelled row reads exactly
/// like no row at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationView {
    pub is_registered: bool,
    pub status: Option<RegistrationStatus>,
}

impl RegistrationView {
    pub fn not_registered() -> Self {
        Self {
            is_registered: false,
            status: None,
        }
    }

    pub fn from_registration(registration: Option<&EventRegistration>) -> Self {
        match registration {
            Some(r) if r.status.is_active() => Self {
                is_registered: true,
                status: Some(r.status),
            },
            _ => Self::not_registered(),
        }
    }
}

/// Attendance counters for an event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSummary {
    pub event_id: String,
    pub registered_count: i64,
    pub waitlisted_count: i64,
    /// Only known when the event has a capacity; never negative
    pub spots_left: Option<i64>,
}

/// Events another user can see, split by why they are visible
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibleEvents {
    /// Private events organised by accepted friends
    pub friends: Vec<Event>,
    /// Public events, whoever organises them
    pub public: Vec<Event>,
}
