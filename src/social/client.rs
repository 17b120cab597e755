//! Client facade
//!
//! Binds every service to one acting user and one shared SQLite pool.

use crate::social::db::create_sqlite_pool_with_migration;
use crate::social::error::SocialError;
use crate::social::event::{EmptyEventListener, EventListener, EventService};
use crate::social::friend::{EmptyFriendListener, FriendListener, FriendService};
use crate::social::notification::NotificationService;
use crate::social::profile::{Profile, ProfileDao, ProfileUpdate};
use crate::social::recipe::{match_recipes, RecipeDao, RecipeMatch};
use anyhow::Result;
use sqlx::{Pool, Sqlite};
use std::sync::Arc;
use tracing::{debug, info};

/// Client configuration
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Acting user id
    pub user_id: String,
    /// SQLite database URL, e.g. `sqlite://cocktail_social.db?mode=rwc`
    pub db_url: String,
    /// Pool size
    pub max_connections: u32,
}

impl ClientConfig {
    pub fn new(user_id: String) -> Self {
        Self {
            user_id,
            db_url: "sqlite://cocktail_social.db?mode=rwc".to_string(),
            max_connections: 5,
        }
    }

    pub fn with_db_url(mut self, db_url: impl Into<String>) -> Self {
        self.db_url = db_url.into();
        self
    }
}

pub struct SocialClient {
    config: ClientConfig,
    db: Pool<Sqlite>,
    friends: FriendService,
    events: EventService,
    notifications: NotificationService,
    profiles: ProfileDao,
    recipes: RecipeDao,
}

impl SocialClient {
    /// Open (and migrate) the configured database
    pub async fn connect(config: ClientConfig) -> Result<Self> {
        let db = create_sqlite_pool_with_migration(&config.db_url, config.max_connections).await?;
        Ok(Self::with_pool(config, db))
    }

    /// Build a client on an existing pool
    pub fn with_pool(config: ClientConfig, db: Pool<Sqlite>) -> Self {
        info!("[Client] creating social client for {}", config.user_id);
        let user_id = config.user_id.clone();
        Self {
            friends: FriendService::with_listener(
                db.clone(),
                user_id.clone(),
                Arc::new(EmptyFriendListener),
            ),
            events: EventService::with_listener(
                db.clone(),
                user_id.clone(),
                Arc::new(EmptyEventListener),
            ),
            notifications: NotificationService::new(db.clone(), user_id),
            profiles: ProfileDao::new(db.clone()),
            recipes: RecipeDao::new(db.clone()),
            config,
            db,
        }
    }

    /// Register a friendship listener; the friend service is rebuilt around it
    pub fn set_friend_listener(&mut self, listener: Arc<dyn FriendListener>) {
        self.friends =
            FriendService::with_listener(self.db.clone(), self.config.user_id.clone(), listener);
    }

    /// Register an event listener; the event service is rebuilt around it
    pub fn set_event_listener(&mut self, listener: Arc<dyn EventListener>) {
        self.events =
            EventService::with_listener(self.db.clone(), self.config.user_id.clone(), listener);
    }

    pub fn user_id(&self) -> &str {
        &self.config.user_id
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.db
    }

    pub fn friends(&self) -> &FriendService {
        &self.friends
    }

    pub fn events(&self) -> &EventService {
        &self.events
    }

    pub fn notifications(&self) -> &NotificationService {
        &self.notifications
    }

    pub fn recipes(&self) -> &RecipeDao {
        &self.recipes
    }

    /// Create the acting user's profile (signup)
    pub async fn sign_up(
        &self,
        display_name: &str,
        email: &str,
        avatar_url: Option<&str>,
    ) -> Result<Profile> {
        self.profiles
            .create_profile(&self.config.user_id, display_name, email, avatar_url)
            .await
    }

    pub async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>> {
        self.profiles.get_profile(user_id).await
    }

    pub async fn get_my_profile(&self) -> Result<Profile> {
        self.profiles
            .get_profile(&self.config.user_id)
            .await?
            .ok_or_else(|| SocialError::NotFound(format!("profile {}", self.config.user_id)).into())
    }

    /// Profiles are only editable by their owner, so this always targets the
    /// acting user
    pub async fn update_my_profile(&self, update: &ProfileUpdate) -> Result<Profile> {
        self.profiles
            .update_profile(&self.config.user_id, update)
            .await
    }

    /// People search, excluding the acting user
    pub async fn search_profiles(&self, query: &str, limit: u32) -> Result<Vec<Profile>> {
        self.profiles
            .search_profiles(query, Some(&self.config.user_id), limit)
            .await
    }

    /// Rank the catalog against the selected ingredients
    pub async fn discover_recipes<S: AsRef<str>>(&self, selected: &[S]) -> Result<Vec<RecipeMatch>> {
        let recipes = self.recipes.get_all_recipes().await?;
        let matches = match_recipes(selected, &recipes);
        debug!(
            "[Client] {} of {} recipes match the selection",
            matches.len(),
            recipes.len()
        );
        Ok(matches)
    }
}
