//! Command-line interface for helpline
//!
//! This module defines the CLI structure using clap derive macros.
//! Each command group is implemented in its own submodule.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::desk::HelpDesk;
use crate::error::{Error, Result};
use crate::events::{Event, EventDestination, EventKind, EventSink};
use crate::model::User;
use crate::output::OutputOptions;
use crate::storage::resolve_home;

mod actor;
mod board;
mod init;
mod notification;
mod post;
mod station;
mod user;

/// helpline - community emergency help requests
///
/// Post a request for help, let volunteers announce they are on the way,
/// and credit them when the author marks the request completed.
#[derive(Parser, Debug)]
#[command(name = "helpline")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Directory holding the helpline store
    #[arg(long, global = true, env = "HELPLINE_HOME")]
    pub home: Option<PathBuf>,

    /// Username to act as
    #[arg(long = "as", global = true, env = "HELPLINE_ACTOR")]
    pub actor: Option<String>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Stream lifecycle events as JSON lines to a file, or `-` for stdout
    #[arg(long, global = true)]
    pub events: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the store and a default config
    Init,

    /// User directory
    #[command(subcommand)]
    User(UserCommands),

    /// Set or show the acting user
    #[command(subcommand)]
    Actor(ActorCommands),

    /// Help requests
    #[command(subcommand)]
    Post(PostCommands),

    /// Volunteers ranked by completed responses
    Leaderboard,

    /// The acting user's completed-response count
    Stats,

    /// The acting user's notifications
    #[command(subcommand)]
    Notif(NotifCommands),

    /// Emergency station directory
    #[command(subcommand)]
    Station(StationCommands),
}

#[derive(Subcommand, Debug)]
pub enum UserCommands {
    /// Register a user
    Add {
        username: String,

        #[arg(long)]
        email: Option<String>,
    },

    /// List users
    List,

    /// Remove a user with their posts, responses and notifications
    Rm { username: String },
}

#[derive(Subcommand, Debug)]
pub enum ActorCommands {
    /// Persist the acting username
    Set { username: String },

    /// Show the resolved acting username
    Show,
}

#[derive(Subcommand, Debug)]
pub enum PostCommands {
    /// Ask for help
    New {
        #[arg(long)]
        location: String,

        #[arg(long)]
        description: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        exact_location: Option<String>,

        /// Image reference (path or URL), stored as given
        #[arg(long)]
        image: Option<String>,
    },

    /// List posts, newest first
    List {
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show one post with its responses
    Show { id: u64 },

    /// Find posts by location
    Search {
        #[arg(required = true)]
        query: Vec<String>,
    },

    /// Edit a post you authored (pass an empty string to clear an optional field)
    Edit {
        id: u64,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        location: Option<String>,

        #[arg(long)]
        exact_location: Option<String>,

        #[arg(long)]
        image: Option<String>,

        #[arg(long)]
        description: Option<String>,
    },

    /// Delete a post you authored
    Rm { id: u64 },

    /// Tell the author you are on the way
    Respond { id: u64 },

    /// Mark a post you authored as completed
    Complete { id: u64 },
}

#[derive(Subcommand, Debug)]
pub enum NotifCommands {
    /// List notifications, newest first
    List {
        #[arg(long)]
        unread: bool,
    },

    /// Mark a notification read (or unread with --unread)
    Read {
        id: u64,

        #[arg(long)]
        unread: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum StationCommands {
    /// Add a station category
    AddCategory { name: String },

    /// Add a station to a category (by id or name)
    Add {
        category: String,

        #[arg(long)]
        name: String,

        #[arg(long)]
        phone: String,

        #[arg(long)]
        location: String,
    },

    /// List every category with its stations
    List,

    /// Find stations by location
    Search {
        #[arg(required = true)]
        query: Vec<String>,
    },
}

/// Flags shared by every command.
#[derive(Debug, Clone)]
pub struct GlobalOptions {
    pub home: Option<PathBuf>,
    pub actor: Option<String>,
    pub events: Option<String>,
    pub json: bool,
    pub quiet: bool,
}

impl GlobalOptions {
    pub fn home(&self) -> PathBuf {
        resolve_home(self.home.as_deref())
    }
}

/// An opened store plus the per-invocation output plumbing.
pub(crate) struct Session {
    pub desk: HelpDesk,
    pub output: OutputOptions,
    actor: Option<String>,
    events: Option<EventSink>,
}

impl Session {
    /// Open the store, failing if `helpline init` has not run.
    pub fn open(global: &GlobalOptions) -> Result<Self> {
        let home = global.home();
        let desk = HelpDesk::open(home.clone());
        if !desk.storage().is_initialized() {
            return Err(Error::NotInitialized(home));
        }

        let destination = EventDestination::parse(global.events.as_deref());
        let events = destination.as_ref().map(|dest| dest.open()).transpose()?;
        let events_to_stdout = matches!(destination, Some(EventDestination::Stdout));

        Ok(Self {
            desk,
            output: OutputOptions {
                json: global.json && !events_to_stdout,
                quiet: global.quiet || events_to_stdout,
            },
            actor: global.actor.clone(),
            events,
        })
    }

    pub fn actor_name(&self) -> Result<String> {
        crate::actor::resolve_actor(self.desk.storage().home(), self.actor.as_deref())
    }

    /// The registered user behind the acting username.
    pub fn acting_user(&self) -> Result<User> {
        let name = self.actor_name()?;
        self.desk.find_user(&name)
    }

    /// Emit an event; failures come back as a warning instead of an error.
    pub fn emit<T: Serialize>(
        &mut self,
        kind: EventKind,
        actor: Option<&str>,
        data: T,
    ) -> Option<String> {
        let sink = self.events.as_mut()?;

        let event = match Event::new(kind, actor.map(str::to_string)).with_data(data) {
            Ok(event) => event,
            Err(err) => return Some(format!("event output failed: {err}")),
        };
        if let Err(err) = sink.emit(&event) {
            return Some(format!("event output failed: {err}"));
        }
        None
    }
}

impl Cli {
    fn global(&self) -> GlobalOptions {
        GlobalOptions {
            home: self.home.clone(),
            actor: self.actor.clone(),
            events: self.events.clone(),
            json: self.json,
            quiet: self.quiet,
        }
    }

    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        let global = self.global();
        match self.command {
            Commands::Init => init::run(global),
            Commands::User(cmd) => match cmd {
                UserCommands::Add { username, email } => {
                    user::run_add(user::AddOptions { username, email, global })
                }
                UserCommands::List => user::run_list(global),
                UserCommands::Rm { username } => user::run_rm(user::RmOptions { username, global }),
            },
            Commands::Actor(cmd) => match cmd {
                ActorCommands::Set { username } => {
                    actor::run_set(actor::SetOptions { username, global })
                }
                ActorCommands::Show => actor::run_show(global),
            },
            Commands::Post(cmd) => match cmd {
                PostCommands::New {
                    location,
                    description,
                    title,
                    exact_location,
                    image,
                } => post::run_new(post::NewOptions {
                    location,
                    description,
                    title,
                    exact_location,
                    image,
                    global,
                }),
                PostCommands::List { limit } => post::run_list(post::ListOptions { limit, global }),
                PostCommands::Show { id } => post::run_show(post::ShowOptions { id, global }),
                PostCommands::Search { query } => post::run_search(post::SearchOptions {
                    query: query.join(" "),
                    global,
                }),
                PostCommands::Edit {
                    id,
                    title,
                    location,
                    exact_location,
                    image,
                    description,
                } => post::run_edit(post::EditOptions {
                    id,
                    title,
                    location,
                    exact_location,
                    image,
                    description,
                    global,
                }),
                PostCommands::Rm { id } => post::run_rm(post::ShowOptions { id, global }),
                PostCommands::Respond { id } => {
                    post::run_respond(post::ShowOptions { id, global })
                }
                PostCommands::Complete { id } => {
                    post::run_complete(post::ShowOptions { id, global })
                }
            },
            Commands::Leaderboard => board::run_leaderboard(global),
            Commands::Stats => board::run_stats(global),
            Commands::Notif(cmd) => match cmd {
                NotifCommands::List { unread } => {
                    notification::run_list(notification::ListOptions { unread, global })
                }
                NotifCommands::Read { id, unread } => {
                    notification::run_read(notification::ReadOptions { id, unread, global })
                }
            },
            Commands::Station(cmd) => match cmd {
                StationCommands::AddCategory { name } => {
                    station::run_add_category(station::AddCategoryOptions { name, global })
                }
                StationCommands::Add {
                    category,
                    name,
                    phone,
                    location,
                } => station::run_add(station::AddOptions {
                    category,
                    name,
                    phone,
                    location,
                    global,
                }),
                StationCommands::List => station::run_list(global),
                StationCommands::Search { query } => station::run_search(station::SearchOptions {
                    query: query.join(" "),
                    global,
                }),
            },
        }
    }
}
