//! Event data access (DAO): `events`, `event_registrations` and the two
//! location tables an event can point at.

use crate::social::event::models::{Event, EventRegistration, LocationRef, RegistrationStatus};
use crate::social::types::now_millis;
use anyhow::{Context, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, Row, Sqlite};
use tracing::debug;
use uuid::Uuid;

const EVENT_COLUMNS: &str = r#"
    id, organiser_id, title, description, is_public, requires_approval,
    start_time, end_time, capacity, bar_id, custom_location_id, created_at, updated_at
"#;

const REGISTRATION_COLUMNS: &str = "id, event_id, user_id, status, created_at, updated_at";

pub struct EventDao {
    db: Pool<Sqlite>,
}

impl EventDao {
    pub fn new(db: Pool<Sqlite>) -> Self {
        Self { db }
    }

    fn map_event(m: SqliteRow) -> Event {
        Event {
            id: m.get("id"),
            organiser_id: m.get("organiser_id"),
            title: m.get("title"),
            description: m.get("description"),
            is_public: m.get::<i64, _>("is_public") != 0,
            requires_approval: m.get::<i64, _>("requires_approval") != 0,
            start_time: m.get("start_time"),
            end_time: m.get("end_time"),
            capacity: m.get("capacity"),
            location: LocationRef::from_columns(m.get("bar_id"), m.get("custom_location_id")),
            created_at: m.get("created_at"),
            updated_at: m.get("updated_at"),
        }
    }

    fn map_registration(m: SqliteRow) -> Result<EventRegistration> {
        let status: String = m.get("status");
        Ok(EventRegistration {
            id: m.get("id"),
            event_id: m.get("event_id"),
            user_id: m.get("user_id"),
            status: status.parse()?,
            created_at: m.get("created_at"),
            updated_at: m.get("updated_at"),
        })
    }

    pub async fn insert_event(&self, e: &Event) -> Result<()> {
        let (bar_id, custom_location_id) = LocationRef::to_columns(e.location.as_ref());
        sqlx::query(&format!(
            "INSERT INTO events ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            EVENT_COLUMNS
        ))
        .bind(&e.id)
        .bind(&e.organiser_id)
        .bind(&e.title)
        .bind(&e.description)
        .bind(e.is_public as i64)
        .bind(e.requires_approval as i64)
        .bind(e.start_time)
        .bind(e.end_time)
        .bind(e.capacity)
        .bind(bar_id)
        .bind(custom_location_id)
        .bind(e.created_at)
        .bind(e.updated_at)
        .execute(&self.db)
        .await
        .context("failed to insert event")?;
        Ok(())
    }

    /// Overwrite every editable column of an existing event
    pub async fn update_event(&self, e: &Event) -> Result<()> {
        let (bar_id, custom_location_id) = LocationRef::to_columns(e.location.as_ref());
        sqlx::query(
            r#"
            UPDATE events SET
                title = ?,
                description = ?,
                is_public = ?,
                requires_approval = ?,
                start_time = ?,
                end_time = ?,
                capacity = ?,
                bar_id = ?,
                custom_location_id = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&e.title)
        .bind(&e.description)
        .bind(e.is_public as i64)
        .bind(e.requires_approval as i64)
        .bind(e.start_time)
        .bind(e.end_time)
        .bind(e.capacity)
        .bind(bar_id)
        .bind(custom_location_id)
        .bind(e.updated_at)
        .bind(&e.id)
        .execute(&self.db)
        .await
        .context("failed to update event")?;
        Ok(())
    }

    pub async fn delete_event(&self, id: &str) -> Result<()> {
        sqlx::query("DELETE FROM events WHERE id = ?")
            .bind(id)
            .execute(&self.db)
            .await
            .context("failed to delete event")?;
        Ok(())
    }

    pub async fn get_event(&self, id: &str) -> Result<Option<Event>> {
        let row = sqlx::query(&format!("SELECT {} FROM events WHERE id = ?", EVENT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.db)
            .await
            .context("failed to query event")?;
        Ok(row.map(Self::map_event))
    }

    /// Every event not organised by `user_id`, soonest first
    pub async fn get_events_not_organised_by(&self, user_id: &str) -> Result<Vec<Event>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM events WHERE organiser_id != ? ORDER BY start_time, id",
            EVENT_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.db)
        .await
        .context("failed to query events")?;
        debug!("[EventDAO] loaded {} candidate events", rows.len());
        Ok(rows.into_iter().map(Self::map_event).collect())
    }

    pub async fn get_events_by_organiser(&self, organiser_id: &str) -> Result<Vec<Event>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM events WHERE organiser_id = ? ORDER BY start_time, id",
            EVENT_COLUMNS
        ))
        .bind(organiser_id)
        .fetch_all(&self.db)
        .await
        .context("failed to query organiser events")?;
        Ok(rows.into_iter().map(Self::map_event).collect())
    }

    pub async fn get_registration(
        &self,
        event_id: &str,
        user_id: &str,
    ) -> Result<Option<EventRegistration>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM event_registrations WHERE event_id = ? AND user_id = ?",
            REGISTRATION_COLUMNS
        ))
        .bind(event_id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await
        .context("failed to query event registration")?;
        row.map(Self::map_registration).transpose()
    }

    /// Insert the (event, user) row, or update the existing one in place.
    /// The row id and `created_at` survive re-registration.
    pub async fn upsert_registration(
        &self,
        event_id: &str,
        user_id: &str,
        status: RegistrationStatus,
    ) -> Result<EventRegistration> {
        let now = now_millis();
        sqlx::query(
            r#"
            INSERT INTO event_registrations (id, event_id, user_id, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(event_id, user_id) DO UPDATE SET
                status = excluded.status,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(event_id)
        .bind(user_id)
        .bind(status.as_str())
        .bind(now)
        .bind(now)
        .execute(&self.db)
        .await
        .context("failed to upsert event registration")?;

        self.get_registration(event_id, user_id)
            .await?
            .context("registration missing right after upsert")
    }

    pub async fn update_registration_status(
        &self,
        id: &str,
        status: RegistrationStatus,
    ) -> Result<()> {
        sqlx::query("UPDATE event_registrations SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(now_millis())
            .bind(id)
            .execute(&self.db)
            .await
            .context("failed to update registration status")?;
        Ok(())
    }

    /// Registrations of an event in one status, oldest first
    pub async fn get_registrations_by_status(
        &self,
        event_id: &str,
        status: RegistrationStatus,
    ) -> Result<Vec<EventRegistration>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM event_registrations WHERE event_id = ? AND status = ? ORDER BY created_at, rowid",
            REGISTRATION_COLUMNS
        ))
        .bind(event_id)
        .bind(status.as_str())
        .fetch_all(&self.db)
        .await
        .context("failed to query event registrations")?;
        rows.into_iter().map(Self::map_registration).collect()
    }

    pub async fn count_registrations(
        &self,
        event_id: &str,
        status: RegistrationStatus,
    ) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM event_registrations WHERE event_id = ? AND status = ?",
        )
        .bind(event_id)
        .bind(status.as_str())
        .fetch_one(&self.db)
        .await
        .context("failed to count event registrations")?;
        Ok(count)
    }

    pub async fn insert_bar(&self, id: &str, name: &str, address: Option<&str>) -> Result<()> {
        sqlx::query("INSERT INTO bars (id, name, address) VALUES (?, ?, ?)")
            .bind(id)
            .bind(name)
            .bind(address)
            .execute(&self.db)
            .await
            .context("failed to insert bar")?;
        Ok(())
    }

    /// Whether the row a location reference points at exists
    pub async fn location_exists(&self, location: &LocationRef) -> Result<bool> {
        let (sql, id) = match location {
            LocationRef::Bar(id) => ("SELECT COUNT(*) FROM bars WHERE id = ?", id),
            LocationRef::Custom(id) => ("SELECT COUNT(*) FROM custom_locations WHERE id = ?", id),
        };
        let count: i64 = sqlx::query_scalar(sql)
            .bind(id)
            .fetch_one(&self.db)
            .await
            .context("failed to query location")?;
        Ok(count > 0)
    }

    pub async fn insert_custom_location(
        &self,
        id: &str,
        name: &str,
        address: Option<&str>,
        created_by: &str,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO custom_locations (id, name, address, created_by) VALUES (?, ?, ?, ?)",
        )
        .bind(id)
        .bind(name)
        .bind(address)
        .bind(created_by)
        .execute(&self.db)
        .await
        .context("failed to insert custom location")?;
        Ok(())
    }
}
