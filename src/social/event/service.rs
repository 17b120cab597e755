//! Event service layer
//!
//! Registration state machine per (event, user):
//! `none -> {registered, waitlisted} -> cancelled -> {registered, waitlisted}`,
//! with the organiser deciding `waitlisted -> {registered, cancelled}`.
//! Rows are never deleted by attendees; cancelling is a status change.

use crate::social::error::SocialError;
use crate::social::event::dao::EventDao;
use crate::social::event::listener::{EmptyEventListener, EventListener};
use crate::social::event::models::{
    Event, EventRegistration, EventSummary, EventUpdate, LocationRef, NewEvent,
    RegistrationStatus, RegistrationView, VisibleEvents,
};
use crate::social::event::visibility::partition_visible_events;
use crate::social::friend::FriendDao;
use crate::social::notification::{NotificationKind, NotificationLinks, NotificationService};
use crate::social::types::now_millis;
use anyhow::Result;
use sqlx::{Pool, Sqlite};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

pub struct EventService {
    /// Acting user
    user_id: String,
    event_dao: EventDao,
    friend_dao: FriendDao,
    notifications: NotificationService,
    listener: Arc<dyn EventListener>,
}

impl EventService {
    pub fn new(db: Pool<Sqlite>, user_id: String) -> Self {
        Self::with_listener(db, user_id, Arc::new(EmptyEventListener))
    }

    pub fn with_listener(
        db: Pool<Sqlite>,
        user_id: String,
        listener: Arc<dyn EventListener>,
    ) -> Self {
        Self {
            event_dao: EventDao::new(db.clone()),
            friend_dao: FriendDao::new(db.clone()),
            notifications: NotificationService::new(db, user_id.clone()),
            user_id,
            listener,
        }
    }

    async fn load_event(&self, event_id: &str) -> Result<Event> {
        self.event_dao
            .get_event(event_id)
            .await?
            .ok_or_else(|| SocialError::NotFound(format!("event {}", event_id)).into())
    }

    /// Load an event the acting user organises
    async fn load_own_event(&self, event_id: &str, what: &str) -> Result<Event> {
        let event = self.load_event(event_id).await?;
        if event.organiser_id != self.user_id {
            return Err(SocialError::NotAuthorized(format!(
                "only the organiser can {}",
                what
            ))
            .into());
        }
        Ok(event)
    }

    fn validate_schedule(event: &Event) -> Result<()> {
        if event.title.is_empty() {
            return Err(SocialError::InvalidInput("title cannot be empty".into()).into());
        }
        if event.end_time < event.start_time {
            return Err(
                SocialError::InvalidInput("event cannot end before it starts".into()).into(),
            );
        }
        if matches!(event.capacity, Some(c) if c <= 0) {
            return Err(SocialError::InvalidInput("capacity must be positive".into()).into());
        }
        Ok(())
    }

    async fn ensure_location(&self, location: Option<&LocationRef>) -> Result<()> {
        let Some(location) = location else {
            return Ok(());
        };
        if !self.event_dao.location_exists(location).await? {
            let what = match location {
                LocationRef::Bar(id) => format!("bar {}", id),
                LocationRef::Custom(id) => format!("custom location {}", id),
            };
            return Err(SocialError::NotFound(what).into());
        }
        Ok(())
    }

    async fn emit_event(&self, event: &Event) -> Result<()> {
        let json = serde_json::to_string(event)?;
        self.listener.on_event_changed(json).await;
        Ok(())
    }

    async fn emit_registration(&self, registration: &EventRegistration) -> Result<()> {
        let json = serde_json::to_string(registration)?;
        self.listener.on_registration_changed(json).await;
        Ok(())
    }

    /// Create an event organised by the acting user
    pub async fn create_event(&self, new_event: NewEvent) -> Result<Event> {
        let now = now_millis();
        let event = Event {
            id: Uuid::new_v4().to_string(),
            organiser_id: self.user_id.clone(),
            title: new_event.title.trim().to_string(),
            description: new_event.description,
            is_public: new_event.is_public,
            requires_approval: new_event.requires_approval,
            start_time: new_event.start_time,
            end_time: new_event.end_time,
            capacity: new_event.capacity,
            location: new_event.location,
            created_at: now,
            updated_at: now,
        };
        Self::validate_schedule(&event)?;
        self.ensure_location(event.location.as_ref()).await?;

        self.event_dao.insert_event(&event).await?;
        info!(
            "[EventService] {} created event {} ({})",
            self.user_id,
            event.id,
            if event.is_public { "public" } else { "private" }
        );
        self.emit_event(&event).await?;
        Ok(event)
    }

    /// Edit an event; organiser only. Everyone holding a place is notified.
    pub async fn update_event(&self, event_id: &str, update: EventUpdate) -> Result<Event> {
        let mut event = self.load_own_event(event_id, "edit this event").await?;
        update.apply(&mut event);
        event.updated_at = now_millis();
        Self::validate_schedule(&event)?;
        self.ensure_location(event.location.as_ref()).await?;

        self.event_dao.update_event(&event).await?;
        info!("[EventService] {} updated event {}", self.user_id, event.id);

        for status in [RegistrationStatus::Registered, RegistrationStatus::Waitlisted] {
            for registration in self
                .event_dao
                .get_registrations_by_status(&event.id, status)
                .await?
            {
                self.notifications
                    .notify_quietly(
                        &registration.user_id,
                        &self.user_id,
                        NotificationKind::EventUpdated,
                        NotificationLinks::event(&event.id),
                    )
                    .await;
            }
        }
        self.emit_event(&event).await?;
        Ok(event)
    }

    /// Delete an event and, through the foreign keys, its registrations
    pub async fn delete_event(&self, event_id: &str) -> Result<()> {
        let event = self.load_own_event(event_id, "delete this event").await?;
        self.event_dao.delete_event(&event.id).await?;
        info!("[EventService] {} deleted event {}", self.user_id, event.id);
        Ok(())
    }

    /// Register the acting user.
    ///
    /// Approval-required events put the user on the waitlist. An existing
    /// cancelled row is reused; an active row is returned unchanged.
    pub async fn register_for_event(&self, event_id: &str) -> Result<EventRegistration> {
        let event = self.load_event(event_id).await?;

        if let Some(existing) = self
            .event_dao
            .get_registration(&event.id, &self.user_id)
            .await?
        {
            if existing.status.is_active() {
                debug!(
                    "[EventService] {} already {} for {}",
                    self.user_id, existing.status, event.id
                );
                return Ok(existing);
            }
        }

        let status = if event.requires_approval {
            RegistrationStatus::Waitlisted
        } else {
            RegistrationStatus::Registered
        };
        let registration = self
            .event_dao
            .upsert_registration(&event.id, &self.user_id, status)
            .await?;
        info!(
            "[EventService] {} is {} for event {}",
            self.user_id, status, event.id
        );

        self.notifications
            .notify_quietly(
                &event.organiser_id,
                &self.user_id,
                NotificationKind::EventRegistration,
                NotificationLinks::event(&event.id),
            )
            .await;
        self.emit_registration(&registration).await?;
        Ok(registration)
    }

    /// Cancel the acting user's registration (soft: the row stays)
    pub async fn cancel_registration(&self, event_id: &str) -> Result<EventRegistration> {
        let mut registration = self
            .event_dao
            .get_registration(event_id, &self.user_id)
            .await?
            .filter(|r| r.status.is_active())
            .ok_or(SocialError::NotRegistered)?;

        self.event_dao
            .update_registration_status(&registration.id, RegistrationStatus::Cancelled)
            .await?;
        registration.status = RegistrationStatus::Cancelled;
        info!(
            "[EventService] {} cancelled registration for {}",
            self.user_id, event_id
        );
        self.emit_registration(&registration).await?;
        Ok(registration)
    }

    /// Organiser moves a waitlisted attendee to `registered`
    pub async fn approve_registration(
        &self,
        event_id: &str,
        attendee_id: &str,
    ) -> Result<EventRegistration> {
        self.decide_registration(event_id, attendee_id, true).await
    }

    /// Organiser turns a waitlisted attendee away (`cancelled`)
    pub async fn reject_registration(
        &self,
        event_id: &str,
        attendee_id: &str,
    ) -> Result<EventRegistration> {
        self.decide_registration(event_id, attendee_id, false).await
    }

    async fn decide_registration(
        &self,
        event_id: &str,
        attendee_id: &str,
        approve: bool,
    ) -> Result<EventRegistration> {
        let action = if approve { "approve" } else { "reject" };
        let event = self
            .load_own_event(event_id, "decide on registrations")
            .await?;
        let mut registration = self
            .event_dao
            .get_registration(&event.id, attendee_id)
            .await?
            .ok_or_else(|| SocialError::NotFound(format!("registration of {}", attendee_id)))?;
        if registration.status != RegistrationStatus::Waitlisted {
            return Err(SocialError::InvalidTransition {
                from: registration.status.to_string(),
                action,
            }
            .into());
        }

        let (status, kind) = if approve {
            (
                RegistrationStatus::Registered,
                NotificationKind::RegistrationApproved,
            )
        } else {
            (
                RegistrationStatus::Cancelled,
                NotificationKind::RegistrationRejected,
            )
        };
        self.event_dao
            .update_registration_status(&registration.id, status)
            .await?;
        registration.status = status;
        info!(
            "[EventService] organiser {} {}d {} for event {}",
            self.user_id, action, attendee_id, event.id
        );

        self.notifications
            .notify_quietly(
                attendee_id,
                &self.user_id,
                kind,
                NotificationLinks::event(&event.id),
            )
            .await;
        self.emit_registration(&registration).await?;
        Ok(registration)
    }

    /// Registration of `user_id` as the UI presents it
    pub async fn get_user_event_registration(
        &self,
        event_id: &str,
        user_id: &str,
    ) -> Result<RegistrationView> {
        let registration = self.event_dao.get_registration(event_id, user_id).await?;
        Ok(RegistrationView::from_registration(registration.as_ref()))
    }

    /// Confirmed attendees
    pub async fn get_event_attendees(&self, event_id: &str) -> Result<Vec<EventRegistration>> {
        self.event_dao
            .get_registrations_by_status(event_id, RegistrationStatus::Registered)
            .await
    }

    /// Pending approvals; organiser only
    pub async fn get_waitlist(&self, event_id: &str) -> Result<Vec<EventRegistration>> {
        let event = self.load_own_event(event_id, "view the waitlist").await?;
        self.event_dao
            .get_registrations_by_status(&event.id, RegistrationStatus::Waitlisted)
            .await
    }

    pub async fn get_event_summary(&self, event_id: &str) -> Result<EventSummary> {
        let event = self.load_event(event_id).await?;
        let registered_count = self
            .event_dao
            .count_registrations(&event.id, RegistrationStatus::Registered)
            .await?;
        let waitlisted_count = self
            .event_dao
            .count_registrations(&event.id, RegistrationStatus::Waitlisted)
            .await?;
        Ok(EventSummary {
            event_id: event.id,
            registered_count,
            waitlisted_count,
            spots_left: event.capacity.map(|c| (c - registered_count).max(0)),
        })
    }

    pub async fn get_event(&self, event_id: &str) -> Result<Event> {
        self.load_event(event_id).await
    }

    /// Events the acting user organises
    pub async fn get_my_events(&self) -> Result<Vec<Event>> {
        self.event_dao.get_events_by_organiser(&self.user_id).await
    }

    /// Friends' private events and public events, excluding the user's own
    pub async fn get_visible_events(&self) -> Result<VisibleEvents> {
        let friend_ids = self.friend_dao.get_friend_ids(&self.user_id).await?;
        let events = self
            .event_dao
            .get_events_not_organised_by(&self.user_id)
            .await?;
        let visible = partition_visible_events(&self.user_id, events, &friend_ids);
        debug!(
            "[EventService] {} sees {} friends' events and {} public events",
            self.user_id,
            visible.friends.len(),
            visible.public.len()
        );
        Ok(visible)
    }

    /// Add a bar to the shared venue list and return a reference usable in
    /// `NewEvent::location`
    pub async fn create_bar(&self, name: &str, address: Option<&str>) -> Result<LocationRef> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SocialError::InvalidInput("bar name cannot be empty".into()).into());
        }
        let id = Uuid::new_v4().to_string();
        self.event_dao.insert_bar(&id, name, address).await?;
        info!("[EventService] {} added bar {} ({})", self.user_id, id, name);
        Ok(LocationRef::Bar(id))
    }

    /// Register a user-defined place and return a reference usable in
    /// `NewEvent::location`
    pub async fn create_custom_location(
        &self,
        name: &str,
        address: Option<&str>,
    ) -> Result<LocationRef> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SocialError::InvalidInput("location name cannot be empty".into()).into());
        }
        let id = Uuid::new_v4().to_string();
        self.event_dao
            .insert_custom_location(&id, name, address, &self.user_id)
            .await?;
        Ok(LocationRef::Custom(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::social::db::create_memory_pool;
    use crate::social::db::test_support::init_test_logger;
    use crate::social::friend::FriendService;
    use crate::social::profile::ProfileDao;

    const HOUR: i64 = 60 * 60 * 1000;

    async fn setup() -> Result<Pool<Sqlite>> {
        init_test_logger();
        let pool = create_memory_pool().await?;
        let profiles = ProfileDao::new(pool.clone());
        for id in ["host", "guest", "friend", "stranger"] {
            profiles
                .create_profile(id, id, &format!("{}@example.com", id), None)
                .await?;
        }
        Ok(pool)
    }

    fn party(title: &str, is_public: bool, requires_approval: bool) -> NewEvent {
        NewEvent {
            title: title.into(),
            is_public,
            requires_approval,
            start_time: 10 * HOUR,
            end_time: 14 * HOUR,
            ..Default::default()
        }
    }

    fn social_err(err: &anyhow::Error) -> SocialError {
        SocialError::from_anyhow(err)
            .cloned()
            .unwrap_or_else(|| panic!("expected a SocialError, got {:#}", err))
    }

    #[tokio::test]
    async fn approval_events_waitlist_until_organiser_approves() -> Result<()> {
        let pool = setup().await?;
        let host = EventService::new(pool.clone(), "host".into());
        let guest = EventService::new(pool.clone(), "guest".into());

        let event = host.create_event(party("Tiki night", true, true)).await?;
        let registration = guest.register_for_event(&event.id).await?;
        assert_eq!(registration.status, RegistrationStatus::Waitlisted);

        // registering again does not jump the queue
        let again = guest.register_for_event(&event.id).await?;
        assert_eq!(again.status, RegistrationStatus::Waitlisted);
        assert_eq!(again.id, registration.id);

        let err = guest
            .approve_registration(&event.id, "guest")
            .await
            .unwrap_err();
        assert!(matches!(social_err(&err), SocialError::NotAuthorized(_)));

        assert_eq!(host.get_waitlist(&event.id).await?.len(), 1);
        let approved = host.approve_registration(&event.id, "guest").await?;
        assert_eq!(approved.status, RegistrationStatus::Registered);

        let err = host
            .approve_registration(&event.id, "guest")
            .await
            .unwrap_err();
        assert!(matches!(
            social_err(&err),
            SocialError::InvalidTransition { action: "approve", .. }
        ));

        let attendees = host.get_event_attendees(&event.id).await?;
        assert_eq!(attendees.len(), 1);
        assert_eq!(attendees[0].user_id, "guest");
        Ok(())
    }

    #[tokio::test]
    async fn open_events_register_directly() -> Result<()> {
        let pool = setup().await?;
        let host = EventService::new(pool.clone(), "host".into());
        let guest = EventService::new(pool.clone(), "guest".into());

        let event = host.create_event(party("Margarita Monday", true, false)).await?;
        let registration = guest.register_for_event(&event.id).await?;
        assert_eq!(registration.status, RegistrationStatus::Registered);

        let view = host.get_user_event_registration(&event.id, "guest").await?;
        assert!(view.is_registered);
        assert_eq!(view.status, Some(RegistrationStatus::Registered));
        Ok(())
    }

    #[tokio::test]
    async fn cancelled_registration_reads_as_none_and_reuses_row() -> Result<()> {
        let pool = setup().await?;
        let host = EventService::new(pool.clone(), "host".into());
        let guest = EventService::new(pool.clone(), "guest".into());

        let event = host.create_event(party("Negroni week", true, false)).await?;
        let first = guest.register_for_event(&event.id).await?;
        let cancelled = guest.cancel_registration(&event.id).await?;
        assert_eq!(cancelled.status, RegistrationStatus::Cancelled);

        let view = guest.get_user_event_registration(&event.id, "guest").await?;
        assert_eq!(view, RegistrationView::not_registered());

        let err = guest.cancel_registration(&event.id).await.unwrap_err();
        assert_eq!(social_err(&err), SocialError::NotRegistered);

        let again = guest.register_for_event(&event.id).await?;
        assert_eq!(again.id, first.id);
        assert_eq!(again.status, RegistrationStatus::Registered);
        assert_eq!(again.created_at, first.created_at);
        Ok(())
    }

    #[tokio::test]
    async fn organiser_rejection_cancels_waitlisted_row() -> Result<()> {
        let pool = setup().await?;
        let host = EventService::new(pool.clone(), "host".into());
        let guest = EventService::new(pool.clone(), "guest".into());
        let guest_inbox = NotificationService::new(pool.clone(), "guest".into());

        let event = host.create_event(party("Speakeasy", false, true)).await?;
        guest.register_for_event(&event.id).await?;
        let rejected = host.reject_registration(&event.id, "guest").await?;
        assert_eq!(rejected.status, RegistrationStatus::Cancelled);
        assert!(!guest
            .get_user_event_registration(&event.id, "guest")
            .await?
            .is_registered);

        let inbox = guest_inbox.get_notifications(10).await?;
        assert_eq!(inbox[0].kind, NotificationKind::RegistrationRejected);
        Ok(())
    }

    #[tokio::test]
    async fn only_organiser_edits_and_attendees_hear_about_it() -> Result<()> {
        let pool = setup().await?;
        let host = EventService::new(pool.clone(), "host".into());
        let guest = EventService::new(pool.clone(), "guest".into());
        let guest_inbox = NotificationService::new(pool.clone(), "guest".into());
        let host_inbox = NotificationService::new(pool.clone(), "host".into());

        let event = host.create_event(party("Sours", true, false)).await?;
        guest.register_for_event(&event.id).await?;
        assert_eq!(host_inbox.get_unread_count().await?, 1);

        let update = EventUpdate {
            title: Some("Whiskey sours".into()),
            ..Default::default()
        };
        let err = guest.update_event(&event.id, update.clone()).await.unwrap_err();
        assert!(matches!(social_err(&err), SocialError::NotAuthorized(_)));

        let updated = host.update_event(&event.id, update).await?;
        assert_eq!(updated.title, "Whiskey sours");
        let inbox = guest_inbox.get_notifications(10).await?;
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].kind, NotificationKind::EventUpdated);

        let err = guest.delete_event(&event.id).await.unwrap_err();
        assert!(matches!(social_err(&err), SocialError::NotAuthorized(_)));
        host.delete_event(&event.id).await?;
        let err = guest.get_event(&event.id).await.unwrap_err();
        assert!(matches!(social_err(&err), SocialError::NotFound(_)));
        Ok(())
    }

    #[tokio::test]
    async fn invalid_schedules_are_rejected() -> Result<()> {
        let pool = setup().await?;
        let host = EventService::new(pool, "host".into());

        let mut backwards = party("Backwards", true, false);
        backwards.end_time = backwards.start_time - HOUR;
        let err = host.create_event(backwards).await.unwrap_err();
        assert!(matches!(social_err(&err), SocialError::InvalidInput(_)));

        let mut empty = party("Empty", true, false);
        empty.capacity = Some(0);
        let err = host.create_event(empty).await.unwrap_err();
        assert!(matches!(social_err(&err), SocialError::InvalidInput(_)));
        Ok(())
    }

    #[tokio::test]
    async fn summary_counts_places() -> Result<()> {
        let pool = setup().await?;
        let host = EventService::new(pool.clone(), "host".into());
        let mut event = party("Small bar", true, false);
        event.capacity = Some(2);
        let location = host.create_custom_location("Back room", None).await?;
        event.location = Some(location.clone());
        let event = host.create_event(event).await?;
        assert_eq!(host.get_event(&event.id).await?.location, Some(location));

        for id in ["guest", "friend"] {
            EventService::new(pool.clone(), id.into())
                .register_for_event(&event.id)
                .await?;
        }
        let summary = host.get_event_summary(&event.id).await?;
        assert_eq!(summary.registered_count, 2);
        assert_eq!(summary.waitlisted_count, 0);
        assert_eq!(summary.spots_left, Some(0));
        Ok(())
    }

    #[tokio::test]
    async fn events_can_be_held_at_a_bar() -> Result<()> {
        let pool = setup().await?;
        let host = EventService::new(pool, "host".into());

        let bar = host.create_bar("  The Rum Shack ", Some("1 Beach Rd")).await?;
        let mut new_event = party("Rum tasting", true, false);
        new_event.location = Some(bar.clone());
        let event = host.create_event(new_event).await?;
        assert_eq!(host.get_event(&event.id).await?.location, Some(bar));

        let err = host.create_bar("   ", None).await.unwrap_err();
        assert!(matches!(social_err(&err), SocialError::InvalidInput(_)));
        Ok(())
    }

    #[tokio::test]
    async fn unknown_locations_are_not_found() -> Result<()> {
        let pool = setup().await?;
        let host = EventService::new(pool, "host".into());

        let mut at_missing_bar = party("Nowhere", true, false);
        at_missing_bar.location = Some(LocationRef::Bar("bar-1".into()));
        let err = host.create_event(at_missing_bar).await.unwrap_err();
        assert_eq!(social_err(&err), SocialError::NotFound("bar bar-1".into()));

        let event = host.create_event(party("Somewhere", true, false)).await?;
        let update = EventUpdate {
            location: Some(Some(LocationRef::Custom("loc-1".into()))),
            ..Default::default()
        };
        let err = host.update_event(&event.id, update).await.unwrap_err();
        assert_eq!(
            social_err(&err),
            SocialError::NotFound("custom location loc-1".into())
        );
        assert_eq!(host.get_event(&event.id).await?.location, None);
        Ok(())
    }

    #[tokio::test]
    async fn organiser_can_clear_capacity_and_location() -> Result<()> {
        let pool = setup().await?;
        let host = EventService::new(pool, "host".into());

        let mut new_event = party("Capped", true, false);
        new_event.capacity = Some(4);
        new_event.description = Some("bring ice".into());
        new_event.location = Some(host.create_bar("Corner bar", None).await?);
        let event = host.create_event(new_event).await?;

        let cleared = host
            .update_event(
                &event.id,
                EventUpdate {
                    capacity: Some(None),
                    location: Some(None),
                    ..Default::default()
                },
            )
            .await?;
        assert_eq!(cleared.capacity, None);
        assert_eq!(cleared.location, None);
        assert_eq!(cleared.description.as_deref(), Some("bring ice"));

        let stored = host.get_event(&event.id).await?;
        assert_eq!(stored.capacity, None);
        assert_eq!(stored.location, None);
        assert_eq!(host.get_event_summary(&event.id).await?.spots_left, None);
        Ok(())
    }

    #[tokio::test]
    async fn visible_events_follow_friendship_and_visibility() -> Result<()> {
        let pool = setup().await?;
        let host = EventService::new(pool.clone(), "host".into());
        let friend = EventService::new(pool.clone(), "friend".into());
        let stranger = EventService::new(pool.clone(), "stranger".into());

        let friend_svc = FriendService::new(pool.clone(), "friend".into());
        let request = friend_svc.send_friend_request("host").await?;
        FriendService::new(pool.clone(), "host".into())
            .accept_friend_request(&request.id)
            .await?;

        host.create_event(party("Mine", false, false)).await?;
        let friend_private = friend.create_event(party("Friend private", false, false)).await?;
        let friend_public = friend.create_event(party("Friend public", true, false)).await?;
        stranger.create_event(party("Stranger private", false, false)).await?;
        let stranger_public = stranger.create_event(party("Stranger public", true, false)).await?;

        let visible = host.get_visible_events().await?;
        let friends: Vec<_> = visible.friends.iter().map(|e| e.id.clone()).collect();
        let mut public: Vec<_> = visible.public.iter().map(|e| e.id.clone()).collect();
        public.sort();
        let mut expected_public = vec![friend_public.id, stranger_public.id];
        expected_public.sort();

        assert_eq!(friends, vec![friend_private.id]);
        assert_eq!(public, expected_public);
        Ok(())
    }
}
