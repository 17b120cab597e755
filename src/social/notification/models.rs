use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What triggered a notification; stored as its snake_case name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    FriendRequest,
    FriendAccepted,
    EventRegistration,
    RegistrationApproved,
    RegistrationRejected,
    EventUpdated,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::FriendRequest => "friend_request",
            NotificationKind::FriendAccepted => "friend_accepted",
            NotificationKind::EventRegistration => "event_registration",
            NotificationKind::RegistrationApproved => "registration_approved",
            NotificationKind::RegistrationRejected => "registration_rejected",
            NotificationKind::EventUpdated => "event_updated",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "friend_request" => Ok(NotificationKind::FriendRequest),
            "friend_accepted" => Ok(NotificationKind::FriendAccepted),
            "event_registration" => Ok(NotificationKind::EventRegistration),
            "registration_approved" => Ok(NotificationKind::RegistrationApproved),
            "registration_rejected" => Ok(NotificationKind::RegistrationRejected),
            "event_updated" => Ok(NotificationKind::EventUpdated),
            other => Err(anyhow!("unknown notification kind: {}", other)),
        }
    }
}

/// Optional links back to the entity that triggered the notification
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationLinks {
    pub friendship_id: Option<String>,
    pub event_id: Option<String>,
}

impl NotificationLinks {
    pub fn friendship(id: impl Into<String>) -> Self {
        Self {
            friendship_id: Some(id.into()),
            event_id: None,
        }
    }

    pub fn event(id: impl Into<String>) -> Self {
        Self {
            friendship_id: None,
            event_id: Some(id.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub receiver_id: String,
    pub actor_id: String,
    pub kind: NotificationKind,
    #[serde(flatten)]
    pub links: NotificationLinks,
    pub is_read: bool,
    pub created_at: i64,
}

/// Per-user notification preferences. A user without a stored row gets
/// everything enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSettings {
    pub friend_requests: bool,
    pub event_registrations: bool,
    pub event_updates: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            friend_requests: true,
            event_registrations: true,
            event_updates: true,
        }
    }
}

impl NotificationSettings {
    /// Whether the receiver wants notifications of this kind
    pub fn allows(&self, kind: NotificationKind) -> bool {
        match kind {
            NotificationKind::FriendRequest | NotificationKind::FriendAccepted => {
                self.friend_requests
            }
            NotificationKind::EventRegistration => self.event_registrations,
            NotificationKind::RegistrationApproved
            | NotificationKind::RegistrationRejected
            | NotificationKind::EventUpdated => self.event_updates,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_gate_by_category() {
        let settings = NotificationSettings {
            friend_requests: false,
            event_registrations: true,
            event_updates: false,
        };
        assert!(!settings.allows(NotificationKind::FriendRequest));
        assert!(!settings.allows(NotificationKind::FriendAccepted));
        assert!(settings.allows(NotificationKind::EventRegistration));
        assert!(!settings.allows(NotificationKind::RegistrationApproved));
        assert!(!settings.allows(NotificationKind::EventUpdated));
    }

    #[test]
    fn kind_names_match_stored_values() {
        for kind in [
            NotificationKind::FriendRequest,
            NotificationKind::FriendAccepted,
            NotificationKind::EventRegistration,
            NotificationKind::RegistrationApproved,
            NotificationKind::RegistrationRejected,
            NotificationKind::EventUpdated,
        ] {
            assert_eq!(kind.as_str().parse::<NotificationKind>().unwrap(), kind);
            assert_eq!(
                serde_json::to_value(kind).unwrap(),
                serde_json::Value::String(kind.as_str().to_string())
            );
        }
        assert!("poke".parse::<NotificationKind>().is_err());
    }
}
