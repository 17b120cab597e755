//! Cocktail social CLI
//!
//! Non-interactive front end over a local database. Every invocation acts as
//! the user given by `--user` and prints JSON.

use anyhow::{Context, Result};
use chrono::DateTime;
use clap::{Args as ClapArgs, Parser, Subcommand};
use cocktail_sdk_core_rust::social::event::{Event, EventUpdate, LocationRef, NewEvent};
use cocktail_sdk_core_rust::social::notification::NotificationSettings;
use cocktail_sdk_core_rust::social::profile::ProfileUpdate;
use cocktail_sdk_core_rust::social::recipe::{Ingredient, Recipe};
use cocktail_sdk_core_rust::social::types::format_event_window;
use cocktail_sdk_core_rust::{ActionResult, ClientConfig, SocialClient};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "social-cli")]
#[command(about = "Cocktail social CLI - friends, parties and recipe discovery", long_about = None)]
struct Args {
    /// Acting user id
    #[arg(short, long)]
    user: String,

    /// SQLite database URL
    #[arg(long, default_value = "sqlite://cocktail_social.db?mode=rwc")]
    db: String,

    /// Log level (RUST_LOG takes precedence)
    #[arg(long, default_value = "warn,cocktail_sdk_core_rust=info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Profile commands
    #[command(subcommand)]
    Profile(ProfileCommand),
    /// Friendship commands
    #[command(subcommand)]
    Friend(FriendCommand),
    /// Party commands
    #[command(subcommand)]
    Event(EventCommand),
    /// Notification inbox
    #[command(subcommand)]
    Notification(NotificationCommand),
    /// Recipe catalog and ingredient matching
    #[command(subcommand)]
    Recipe(RecipeCommand),
}

#[derive(Subcommand, Debug)]
enum ProfileCommand {
    /// Create the acting user's profile
    Signup {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        avatar: Option<String>,
    },
    /// Show a profile (defaults to the acting user)
    Show { id: Option<String> },
    /// Edit the acting user's profile
    Edit {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        avatar: Option<String>,
    },
    /// Search people by display name
    Search {
        query: String,
        #[arg(long, default_value = "20")]
        limit: u32,
    },
}

#[derive(Subcommand, Debug)]
enum FriendCommand {
    /// Send a friend request
    Request { to: String },
    /// Accept a received request
    Accept { friendship_id: String },
    /// Reject a received request
    Reject { friendship_id: String },
    /// Withdraw a sent request
    Cancel { friendship_id: String },
    /// Remove a friend
    Unfriend { user: String },
    /// Relationship with another user
    Status { other: String },
    /// Accepted friends
    List,
    /// Pending requests, both directions
    Requests,
}

#[derive(ClapArgs, Debug)]
struct EventFields {
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    description: Option<String>,
    /// RFC 3339 start time, e.g. 2026-10-16T19:00:00+02:00
    #[arg(long)]
    start: Option<String>,
    /// RFC 3339 end time
    #[arg(long)]
    end: Option<String>,
    #[arg(long)]
    capacity: Option<i64>,
    #[arg(long)]
    public: Option<bool>,
    #[arg(long)]
    approval: Option<bool>,
    /// Id of a bar added with `event add-bar`
    #[arg(long)]
    bar: Option<String>,
}

#[derive(Subcommand, Debug)]
enum EventCommand {
    /// Create a party organised by the acting user
    Create {
        #[command(flatten)]
        fields: EventFields,
        /// Name of a new custom location to attach
        #[arg(long, conflicts_with = "bar")]
        location: Option<String>,
    },
    /// Edit a party (organiser only)
    Edit {
        event_id: String,
        #[command(flatten)]
        fields: EventFields,
        #[arg(long, conflicts_with = "description")]
        clear_description: bool,
        #[arg(long, conflicts_with = "capacity")]
        clear_capacity: bool,
        #[arg(long, conflicts_with = "bar")]
        clear_location: bool,
    },
    /// Add a bar to the shared venue list
    AddBar {
        #[arg(long)]
        name: String,
        #[arg(long)]
        address: Option<String>,
    },
    /// Delete a party (organiser only)
    Delete { event_id: String },
    Register { event_id: String },
    /// Cancel the acting user's registration
    Cancel { event_id: String },
    /// Approve a waitlisted attendee (organiser only)
    Approve { event_id: String, attendee: String },
    /// Turn a waitlisted attendee away (organiser only)
    Decline { event_id: String, attendee: String },
    /// Registration state of a user (defaults to the acting user)
    Registration {
        event_id: String,
        #[arg(long)]
        of: Option<String>,
    },
    Attendees { event_id: String },
    Waitlist { event_id: String },
    Summary { event_id: String },
    /// Friends' and public parties
    Visible,
    /// Parties the acting user organises
    Mine,
}

#[derive(Subcommand, Debug)]
enum NotificationCommand {
    List {
        #[arg(long, default_value = "50")]
        limit: u32,
    },
    Unread,
    Read { notification_id: String },
    ReadAll,
    /// Show or change preferences
    Settings {
        #[arg(long)]
        friend_requests: Option<bool>,
        #[arg(long)]
        event_registrations: Option<bool>,
        #[arg(long)]
        event_updates: Option<bool>,
    },
}

#[derive(Subcommand, Debug)]
enum RecipeCommand {
    /// Add a recipe; ingredients as `name` or `name=measure`
    Add {
        #[arg(long)]
        name: String,
        #[arg(long = "ingredient", required = true)]
        ingredients: Vec<String>,
        #[arg(long)]
        instructions: Option<String>,
    },
    /// Rank recipes by how many selected ingredients they use
    Match {
        #[arg(required = true)]
        ingredients: Vec<String>,
    },
    /// Every known ingredient name
    Ingredients,
}

/// Initialise logging on stdout and in `social-cli.log`
fn init_logger(log_level: &str) -> Result<()> {
    use std::fs::OpenOptions;
    use std::io;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    // RUST_LOG wins over the command line
    let filter_layer =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open("social-cli.log")
        .context("cannot open log file social-cli.log")?;

    // logs go to stderr so stdout stays valid JSON
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_file(true)
        .with_line_number(true)
        .with_target(false)
        .with_ansi(true);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(log_file)
        .with_file(true)
        .with_line_number(true)
        .with_target(false)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(console_layer)
        .with(file_layer)
        .init();
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print the success/error shape for a mutation
fn print_action<T: Serialize>(operation: &str, result: Result<T>) -> Result<()> {
    match result {
        Ok(value) => print_json(&value),
        Err(e) => print_json(&ActionResult::from_result::<()>(operation, Err(e))),
    }
}

fn parse_time(value: &str) -> Result<i64> {
    Ok(DateTime::parse_from_rfc3339(value)
        .with_context(|| format!("invalid RFC 3339 time: {}", value))?
        .timestamp_millis())
}

/// A value printed alongside a readable `when` line
#[derive(Serialize)]
struct Dated<'a, T: Serialize> {
    #[serde(flatten)]
    value: &'a T,
    when: String,
}

fn dated(event: &Event) -> Dated<'_, Event> {
    Dated {
        value: event,
        when: format_event_window(event.start_time, event.end_time),
    }
}

fn dated_all(events: &[Event]) -> Vec<Dated<'_, Event>> {
    events.iter().map(dated).collect()
}

/// `Some(None)` clears the column, `None` leaves it alone
fn edit_value<T>(value: Option<T>, clear: bool) -> Option<Option<T>> {
    if clear {
        Some(None)
    } else {
        value.map(Some)
    }
}

fn parse_ingredient(raw: &str) -> Ingredient {
    match raw.split_once('=') {
        Some((name, measure)) => Ingredient {
            name: name.trim().to_string(),
            measure: Some(measure.trim().to_string()),
        },
        None => Ingredient {
            name: raw.trim().to_string(),
            measure: None,
        },
    }
}

async fn run_profile(client: &SocialClient, cmd: ProfileCommand) -> Result<()> {
    match cmd {
        ProfileCommand::Signup {
            name,
            email,
            avatar,
        } => print_action(
            "signup",
            client.sign_up(&name, &email, avatar.as_deref()).await,
        ),
        ProfileCommand::Show { id } => {
            let id = id.unwrap_or_else(|| client.user_id().to_string());
            print_json(&client.get_profile(&id).await?)
        }
        ProfileCommand::Edit { name, avatar } => print_action(
            "edit_profile",
            client
                .update_my_profile(&ProfileUpdate {
                    display_name: name,
                    avatar_url: avatar,
                })
                .await,
        ),
        ProfileCommand::Search { query, limit } => {
            print_json(&client.search_profiles(&query, limit).await?)
        }
    }
}

async fn run_friend(client: &SocialClient, cmd: FriendCommand) -> Result<()> {
    let friends = client.friends();
    match cmd {
        FriendCommand::Request { to } => {
            print_action("send_friend_request", friends.send_friend_request(&to).await)
        }
        FriendCommand::Accept { friendship_id } => print_action(
            "accept_friend_request",
            friends.accept_friend_request(&friendship_id).await,
        ),
        FriendCommand::Reject { friendship_id } => print_json(&ActionResult::from_result(
            "reject_friend_request",
            friends.reject_friend_request(&friendship_id).await,
        )),
        FriendCommand::Cancel { friendship_id } => print_json(&ActionResult::from_result(
            "cancel_friend_request",
            friends.cancel_friend_request(&friendship_id).await,
        )),
        FriendCommand::Unfriend { user } => print_json(&ActionResult::from_result(
            "unfriend",
            friends.unfriend(&user).await,
        )),
        FriendCommand::Status { other } => {
            let status = friends
                .get_friendship_status(client.user_id(), &other)
                .await?;
            print_json(&serde_json::json!({
                "status": status.map(|s| s.to_string()).unwrap_or_else(|| "none".to_string())
            }))
        }
        FriendCommand::List => print_json(&friends.get_friends().await?),
        FriendCommand::Requests => print_json(&serde_json::json!({
            "received": friends.get_received_requests().await?,
            "sent": friends.get_sent_requests().await?,
        })),
    }
}

async fn run_event(client: &SocialClient, cmd: EventCommand) -> Result<()> {
    let events = client.events();
    match cmd {
        EventCommand::Create { fields, location } => {
            let title = fields
                .title
                .context("--title is required when creating an event")?;
            let start_time = parse_time(
                fields
                    .start
                    .as_deref()
                    .context("--start is required when creating an event")?,
            )?;
            let end_time = match fields.end.as_deref() {
                Some(end) => parse_time(end)?,
                None => start_time,
            };
            let location = match (fields.bar, location) {
                (Some(bar_id), _) => Some(LocationRef::Bar(bar_id)),
                (None, Some(name)) => Some(events.create_custom_location(&name, None).await?),
                (None, None) => None,
            };
            print_action(
                "create_event",
                events
                    .create_event(NewEvent {
                        title,
                        description: fields.description,
                        is_public: fields.public.unwrap_or(false),
                        requires_approval: fields.approval.unwrap_or(false),
                        start_time,
                        end_time,
                        capacity: fields.capacity,
                        location,
                    })
                    .await,
            )
        }
        EventCommand::Edit {
            event_id,
            fields,
            clear_description,
            clear_capacity,
            clear_location,
        } => {
            let update = EventUpdate {
                title: fields.title,
                description: edit_value(fields.description, clear_description),
                is_public: fields.public,
                requires_approval: fields.approval,
                start_time: fields.start.as_deref().map(parse_time).transpose()?,
                end_time: fields.end.as_deref().map(parse_time).transpose()?,
                capacity: edit_value(fields.capacity, clear_capacity),
                location: edit_value(fields.bar.map(LocationRef::Bar), clear_location),
            };
            print_action("update_event", events.update_event(&event_id, update).await)
        }
        EventCommand::AddBar { name, address } => print_action(
            "create_bar",
            events.create_bar(&name, address.as_deref()).await,
        ),
        EventCommand::Delete { event_id } => print_json(&ActionResult::from_result(
            "delete_event",
            events.delete_event(&event_id).await,
        )),
        EventCommand::Register { event_id } => print_action(
            "register_for_event",
            events.register_for_event(&event_id).await,
        ),
        EventCommand::Cancel { event_id } => print_action(
            "cancel_registration",
            events.cancel_registration(&event_id).await,
        ),
        EventCommand::Approve { event_id, attendee } => print_action(
            "approve_registration",
            events.approve_registration(&event_id, &attendee).await,
        ),
        EventCommand::Decline { event_id, attendee } => print_action(
            "reject_registration",
            events.reject_registration(&event_id, &attendee).await,
        ),
        EventCommand::Registration { event_id, of } => {
            let user = of.unwrap_or_else(|| client.user_id().to_string());
            print_json(&events.get_user_event_registration(&event_id, &user).await?)
        }
        EventCommand::Attendees { event_id } => {
            print_json(&events.get_event_attendees(&event_id).await?)
        }
        EventCommand::Waitlist { event_id } => print_json(&events.get_waitlist(&event_id).await?),
        EventCommand::Summary { event_id } => {
            let event = events.get_event(&event_id).await?;
            let summary = events.get_event_summary(&event_id).await?;
            print_json(&Dated {
                value: &summary,
                when: format_event_window(event.start_time, event.end_time),
            })
        }
        EventCommand::Visible => {
            let visible = events.get_visible_events().await?;
            print_json(&serde_json::json!({
                "friends": dated_all(&visible.friends),
                "public": dated_all(&visible.public),
            }))
        }
        EventCommand::Mine => print_json(&dated_all(&events.get_my_events().await?)),
    }
}

async fn run_notification(client: &SocialClient, cmd: NotificationCommand) -> Result<()> {
    let inbox = client.notifications();
    match cmd {
        NotificationCommand::List { limit } => print_json(&inbox.get_notifications(limit).await?),
        NotificationCommand::Unread => print_json(&serde_json::json!({
            "unread": inbox.get_unread_count().await?
        })),
        NotificationCommand::Read { notification_id } => print_json(&ActionResult::from_result(
            "mark_as_read",
            inbox.mark_as_read(&notification_id).await,
        )),
        NotificationCommand::ReadAll => print_json(&serde_json::json!({
            "marked": inbox.mark_all_as_read().await?
        })),
        NotificationCommand::Settings {
            friend_requests,
            event_registrations,
            event_updates,
        } => {
            let current = inbox.get_settings().await?;
            let wanted = NotificationSettings {
                friend_requests: friend_requests.unwrap_or(current.friend_requests),
                event_registrations: event_registrations.unwrap_or(current.event_registrations),
                event_updates: event_updates.unwrap_or(current.event_updates),
            };
            if wanted != current {
                inbox.update_settings(&wanted).await?;
            }
            print_json(&wanted)
        }
    }
}

async fn run_recipe(client: &SocialClient, cmd: RecipeCommand) -> Result<()> {
    match cmd {
        RecipeCommand::Add {
            name,
            ingredients,
            instructions,
        } => {
            let recipe = Recipe {
                id: Uuid::new_v4().to_string(),
                name,
                ingredients: ingredients.iter().map(|i| parse_ingredient(i)).collect(),
                instructions,
                image_url: None,
            };
            let result = client.recipes().insert_recipe(&recipe).await.map(|_| recipe);
            print_action("add_recipe", result)
        }
        RecipeCommand::Match { ingredients } => {
            print_json(&client.discover_recipes(ingredients.as_slice()).await?)
        }
        RecipeCommand::Ingredients => {
            print_json(&client.recipes().get_all_ingredient_names().await?)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logger(&args.log_level)?;

    let config = ClientConfig::new(args.user.clone()).with_db_url(args.db.clone());
    let client = SocialClient::connect(config).await?;
    info!("[CLI] acting as {} on {}", args.user, args.db);

    match args.command {
        Command::Profile(cmd) => run_profile(&client, cmd).await,
        Command::Friend(cmd) => run_friend(&client, cmd).await,
        Command::Event(cmd) => run_event(&client, cmd).await,
        Command::Notification(cmd) => run_notification(&client, cmd).await,
        Command::Recipe(cmd) => run_recipe(&client, cmd).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ingredient_measure_is_optional() {
        assert_eq!(
            parse_ingredient(" Lime juice = 1 oz"),
            Ingredient {
                name: "Lime juice".into(),
                measure: Some("1 oz".into())
            }
        );
        assert_eq!(parse_ingredient("Salt").measure, None);
    }

    #[test]
    fn rfc3339_times_become_millis() {
        assert_eq!(parse_time("1970-01-01T00:00:01Z").unwrap(), 1000);
        assert!(parse_time("tomorrow").is_err());
    }

    #[test]
    fn clear_flag_wins_over_missing_value() {
        assert_eq!(edit_value::<i64>(None, true), Some(None));
        assert_eq!(edit_value(Some(4), false), Some(Some(4)));
        assert_eq!(edit_value::<i64>(None, false), None);

        let args = Args::try_parse_from([
            "social-cli", "--user", "host", "event", "edit", "e1", "--clear-capacity",
        ])
        .unwrap();
        assert!(matches!(
            args.command,
            Command::Event(EventCommand::Edit { clear_capacity: true, .. })
        ));
        assert!(Args::try_parse_from([
            "social-cli", "--user", "host", "event", "edit", "e1", "--clear-capacity",
            "--capacity", "3",
        ])
        .is_err());
    }

    #[test]
    fn listed_events_carry_a_readable_window() {
        let event = Event {
            id: "e1".into(),
            organiser_id: "host".into(),
            title: "Tiki night".into(),
            description: None,
            is_public: true,
            requires_approval: false,
            start_time: 0,
            end_time: 3 * 60 * 60 * 1000,
            capacity: None,
            location: None,
            created_at: 0,
            updated_at: 0,
        };
        let json = serde_json::to_value(dated_all(std::slice::from_ref(&event))).unwrap();
        assert_eq!(json[0]["title"], "Tiki night");
        assert_eq!(
            json[0]["when"],
            format_event_window(event.start_time, event.end_time)
        );
    }

    #[test]
    fn cli_parses_nested_commands() {
        let args = Args::try_parse_from([
            "social-cli",
            "--user",
            "alice",
            "event",
            "approve",
            "e1",
            "bob",
        ])
        .unwrap();
        assert!(matches!(
            args.command,
            Command::Event(EventCommand::Approve { ref event_id, ref attendee })
                if event_id == "e1" && attendee == "bob"
        ));
    }
}
