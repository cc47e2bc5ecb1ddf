//! Command execution for the cys CLI.
//!
//! `App` wires the configured storage, seed source and session manager
//! together and runs one parsed command, writing human-readable output.

use std::io::Write;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use cys_core::auth::credentials::public_user;
use cys_core::community::{self, Attendance, EventQuery, PortfolioQuery};
use cys_core::models::{PortfolioSort, Timeframe, User};
use cys_core::resource::{ResourceType, EVENTS, PORTFOLIOS, USERS};
use cys_core::{Auth, Config, FileStore, KeyValueStore, Record, ResourceStore, Seeds, SessionManager};
use tracing::{debug, info, warn};

use crate::commands::{Command, ListFilters, USAGE};
use crate::render;

/// Collections warmed by `cys seed`
const SEEDED_COLLECTIONS: [&str; 3] = [PORTFOLIOS, EVENTS, USERS];

pub struct App {
    config: Config,
    store: ResourceStore<Seeds>,
    sessions: SessionManager,
    persist_config: bool,
}

impl App {
    /// Build an app over the on-disk store described by `config`
    pub fn new(config: Config) -> Result<Self> {
        let data_dir = config.data_dir()?;
        debug!(?data_dir, "Data directory configured");
        let kv: Arc<dyn KeyValueStore> = Arc::new(
            FileStore::new(data_dir).context("Failed to open data directory")?,
        );
        let seeds = config.seed_source()?;
        let mut app = Self::with_storage(config, kv, seeds);
        app.persist_config = true;
        Ok(app)
    }

    pub fn with_storage(config: Config, kv: Arc<dyn KeyValueStore>, seeds: Seeds) -> Self {
        Self {
            store: ResourceStore::new(kv.clone(), seeds),
            sessions: SessionManager::new(kv),
            config,
            persist_config: false,
        }
    }

    pub async fn execute(&mut self, command: Command, out: &mut dyn Write) -> Result<()> {
        match command {
            Command::List { resource, filters } => self.list(&resource, &filters, out).await,
            Command::Get { resource, id } => {
                let record = self.store.get_record(&resource, &id).await?;
                write_json(out, &present(&resource, record)?)
            }
            Command::Create { resource, json } => {
                let session = self.sessions.current()?;
                let record = parse_record(&json)?;
                let created = self.store.create_record(session.as_ref(), &resource, record).await?;
                write_json(out, &present(&resource, created)?)
            }
            Command::Update { resource, id, json } => {
                let session = self.sessions.current()?;
                let partial = parse_record(&json)?;
                let updated = self
                    .store
                    .update_record(session.as_ref(), &resource, &id, partial)
                    .await?;
                write_json(out, &present(&resource, updated)?)
            }
            Command::Delete { resource, id } => {
                let session = self.sessions.current()?;
                let confirmation = self.store.delete_record(session.as_ref(), &resource, &id).await?;
                write_json(out, &confirmation)
            }
            Command::Refresh { resource } => {
                let records = self.store.refresh_collection(&resource).await?;
                writeln!(out, "Refreshed {} ({} items)", resource, records.len())?;
                Ok(())
            }
            Command::Clear { resource } => {
                let session = self.sessions.current()?;
                self.store.clear_collection(session.as_ref(), &resource).await?;
                writeln!(out, "Cleared {}", resource)?;
                Ok(())
            }
            Command::Seed => self.seed(out).await,
            Command::Login { email } => {
                let email = match email.or_else(|| self.config.last_email.clone()) {
                    Some(email) => email,
                    None => bail!("Usage: cys login <email>"),
                };
                let password = prompt_password("Password: ")?;
                self.login(&email, &password, out).await
            }
            Command::Register { name, email } => {
                let password = prompt_password("Password: ")?;
                let confirm = prompt_password("Confirm password: ")?;
                if password != confirm {
                    bail!("Passwords do not match");
                }
                self.register(&name, &email, &password, out).await
            }
            Command::Logout => {
                Auth::new(&self.store, &self.sessions).logout()?;
                writeln!(out, "Logged out")?;
                Ok(())
            }
            Command::Whoami => match self.sessions.current()? {
                Some(session) => {
                    writeln!(out, "{}", render::user_summary(&session.profile()?))?;
                    Ok(())
                }
                None => {
                    writeln!(out, "Not logged in")?;
                    Ok(())
                }
            },
            Command::Profile { user_id } => self.profile(user_id, out).await,
            Command::Attend { event_id } => {
                let session = self
                    .sessions
                    .current()?
                    .context("You must be logged in to attend events")?;
                let message = match community::toggle_attendance(&self.store, &session, &event_id).await? {
                    Attendance::Joined => "You are now attending this event",
                    Attendance::Left => "You are no longer attending this event",
                };
                writeln!(out, "{}", message)?;
                Ok(())
            }
            Command::Like { work_id } => {
                let session = self
                    .sessions
                    .current()?
                    .context("You must be logged in to like works")?;
                let state = community::toggle_like(&self.store, &session, &work_id).await?;
                let verb = if state.liked { "Liked" } else { "Unliked" };
                writeln!(out, "{} {} ({} likes)", verb, work_id, state.likes)?;
                Ok(())
            }
            Command::Upload(draft) => {
                let session = self
                    .sessions
                    .current()?
                    .context("You must be logged in to publish works")?;
                let work = community::publish_work(&self.store, &session, draft).await?;
                writeln!(out, "Work published: {}", work.id().unwrap_or_default())?;
                Ok(())
            }
            Command::Help => {
                write!(out, "{}", USAGE)?;
                Ok(())
            }
        }
    }

    pub async fn login(&mut self, email: &str, password: &str, out: &mut dyn Write) -> Result<()> {
        let user = Auth::new(&self.store, &self.sessions)
            .login(email, password)
            .await?;
        self.remember_email(email);
        writeln!(out, "Logged in as {}", user.get_str("name").unwrap_or(email))?;
        Ok(())
    }

    pub async fn register(
        &mut self,
        name: &str,
        email: &str,
        password: &str,
        out: &mut dyn Write,
    ) -> Result<()> {
        let user = Auth::new(&self.store, &self.sessions)
            .register(name, email, password)
            .await?;
        self.remember_email(email);
        writeln!(out, "Welcome, {} ({})", name, user.id().unwrap_or_default())?;
        Ok(())
    }

    fn remember_email(&mut self, email: &str) {
        self.config.last_email = Some(email.to_string());
        if !self.persist_config {
            return;
        }
        if let Err(e) = self.config.save() {
            warn!(error = %e, "Failed to save config");
        }
    }

    async fn list(&self, resource: &str, filters: &ListFilters, out: &mut dyn Write) -> Result<()> {
        let resource_type = ResourceType::from_path(resource)?;
        match resource_type.as_str() {
            PORTFOLIOS => {
                let query = portfolio_query(filters)?;
                for work in query.run(&self.store).await? {
                    writeln!(out, "{}", render::portfolio_line(&work))?;
                }
            }
            EVENTS => {
                let query = event_query(filters)?;
                let now = Utc::now();
                for event in query.run(&self.store).await? {
                    writeln!(out, "{}", render::event_line(&event, now))?;
                }
            }
            _ => {
                if filters != &ListFilters::default() {
                    bail!("Filters are only supported for portfolios and events");
                }
                let records = self.store.fetch_collection(resource).await?;
                let records = records
                    .into_iter()
                    .map(|record| present(resource, record))
                    .collect::<Result<Vec<_>>>()?;
                write_json(out, &records)?;
            }
        }
        Ok(())
    }

    async fn seed(&self, out: &mut dyn Write) -> Result<()> {
        let results = self.store.seed_all(&SEEDED_COLLECTIONS).await;
        let mut failed = false;
        for (path, result) in results {
            match result {
                Ok(count) => writeln!(out, "{:<12} {} items", path, count)?,
                Err(e) => {
                    failed = true;
                    writeln!(out, "{:<12} failed: {}", path, e)?;
                }
            }
        }
        if failed {
            bail!("Some collections could not be seeded");
        }
        info!("Collections seeded");
        Ok(())
    }

    async fn profile(&self, user_id: Option<String>, out: &mut dyn Write) -> Result<()> {
        let user_id = match user_id {
            Some(id) => id,
            None => self
                .sessions
                .current()?
                .and_then(|session| session.user_id().map(str::to_string))
                .context("Not logged in; pass a user id")?,
        };

        match self.store.get_record(USERS, &user_id).await {
            Ok(record) => {
                let user: User = record.to_model()?;
                writeln!(out, "{}", render::user_summary(&user))?;
            }
            Err(e) => debug!(user_id = %user_id, error = %e, "No user record for profile"),
        }

        let stats = community::profile_stats(&self.store, &user_id).await?;
        writeln!(out, "{}", render::profile_stats(&stats))?;
        for work in community::user_portfolios(&self.store, &user_id).await? {
            writeln!(out, "  {}", render::portfolio_line(&work))?;
        }
        Ok(())
    }
}

fn portfolio_query(filters: &ListFilters) -> Result<PortfolioQuery> {
    if filters.timeframe.is_some() {
        bail!("--timeframe only applies to events");
    }
    let sort = match filters.sort.as_deref() {
        Some(s) => PortfolioSort::parse(s).with_context(|| format!("Unknown sort: {}", s))?,
        None => PortfolioSort::default(),
    };
    Ok(PortfolioQuery {
        category: filters.category.clone(),
        tags: filters.tags.clone(),
        search: filters.search.clone(),
        sort,
    })
}

fn event_query(filters: &ListFilters) -> Result<EventQuery> {
    if filters.sort.is_some() || !filters.tags.is_empty() {
        bail!("--sort and --tag only apply to portfolios");
    }
    let timeframe = match filters.timeframe.as_deref() {
        Some(t) => Timeframe::parse(t).with_context(|| format!("Unknown timeframe: {}", t))?,
        None => Timeframe::default(),
    };
    Ok(EventQuery {
        category: filters.category.clone(),
        timeframe,
        search: filters.search.clone(),
    })
}

/// Record as shown to the user; credentials never leave the store
fn present(resource: &str, record: Record) -> Result<Record> {
    if ResourceType::from_path(resource)?.as_str() == USERS {
        Ok(public_user(&record))
    } else {
        Ok(record)
    }
}

fn parse_record(json: &str) -> Result<Record> {
    let value: serde_json::Value = serde_json::from_str(json).context("Argument is not valid JSON")?;
    Ok(Record::try_from(value)?)
}

fn write_json<T: serde::Serialize + ?Sized>(out: &mut dyn Write, value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    writeln!(out, "{}", text)?;
    Ok(())
}

fn prompt_password(label: &str) -> Result<String> {
    let password = rpassword::prompt_password(label)?;
    Ok(password)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cys_core::seed::fallback::DEMO_PASSWORD;
    use cys_core::seed::NoSeeds;
    use cys_core::MemoryStore;

    fn app() -> App {
        App::with_storage(
            Config::default(),
            Arc::new(MemoryStore::new()),
            Seeds::None(NoSeeds),
        )
    }

    async fn run(app: &mut App, command: Command) -> Result<String> {
        let mut out = Vec::new();
        app.execute(command, &mut out).await?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[tokio::test]
    async fn test_list_events_upcoming() {
        let mut app = app();
        let output = run(
            &mut app,
            Command::List {
                resource: "events".to_string(),
                filters: ListFilters {
                    timeframe: Some("upcoming".to_string()),
                    ..Default::default()
                },
            },
        )
        .await
        .unwrap();
        let lines: Vec<_> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("event_1"));
    }

    #[tokio::test]
    async fn test_create_requires_login() {
        let mut app = app();
        let err = run(
            &mut app,
            Command::Create {
                resource: "portfolios".to_string(),
                json: r#"{"title": "X"}"#.to_string(),
            },
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("Authentication required"));
    }

    #[tokio::test]
    async fn test_create_after_login() {
        let mut app = app();
        app.sessions
            .begin(&Record::new().with("id", "user_1").with("name", "Demo User"))
            .unwrap();

        let output = run(
            &mut app,
            Command::Create {
                resource: "/public/data/portfolios.json".to_string(),
                json: r#"{"title": "X", "category": "Visual Art", "tags": ["a"]}"#.to_string(),
            },
        )
        .await
        .unwrap();
        let created: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert!(created["id"].as_str().unwrap().starts_with("portfolios_"));
        assert!(created.get("likes").is_none());
    }

    #[tokio::test]
    async fn test_whoami_and_attend() {
        let mut app = app();
        app.sessions
            .begin(
                &Record::new()
                    .with("id", "user_2")
                    .with("name", "Creative Creator")
                    .with("email", "creator@example.com"),
            )
            .unwrap();

        let output = run(&mut app, Command::Whoami).await.unwrap();
        assert!(output.starts_with("Creative Creator <creator@example.com>"));

        let output = run(
            &mut app,
            Command::Attend {
                event_id: "event_2".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(output.trim(), "You are now attending this event");
    }

    #[tokio::test]
    async fn test_login_flow_without_prompt() {
        let mut app = app();
        let mut out = Vec::new();
        let err = app.login("demo@example.com", "nope", &mut out).await.unwrap_err();
        assert!(err.to_string().contains("Invalid email or password"));

        app.login("demo@example.com", DEMO_PASSWORD, &mut out).await.unwrap();
        assert!(String::from_utf8(out).unwrap().contains("Logged in as Demo User"));
        assert!(app.sessions.current().unwrap().is_some());
        assert_eq!(app.config.last_email.as_deref(), Some("demo@example.com"));
    }

    #[tokio::test]
    async fn test_list_rejects_filters_for_other_collections() {
        let mut app = app();
        let err = run(
            &mut app,
            Command::List {
                resource: "users".to_string(),
                filters: ListFilters {
                    search: Some("demo".to_string()),
                    ..Default::default()
                },
            },
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("only supported"));
    }

    #[tokio::test]
    async fn test_profile_for_user() {
        let mut app = app();
        let output = run(
            &mut app,
            Command::Profile {
                user_id: Some("user_1".to_string()),
            },
        )
        .await
        .unwrap();
        assert!(output.contains("Demo User <demo@example.com>"));
        assert!(output.contains("1 works, 15 likes, 1 comments"));
        assert!(output.contains("portfolio_1"));
    }

    #[tokio::test]
    async fn test_seed_reports_counts() {
        let mut app = app();
        let output = run(&mut app, Command::Seed).await.unwrap();
        assert!(output.contains("portfolios"));
        assert!(output.contains("3 items"));
        assert!(output.contains("2 items"));
    }

    #[tokio::test]
    async fn test_file_backed_app_persists_collections() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            data_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        };

        let mut app = App::new(config.clone()).unwrap();
        run(&mut app, Command::Seed).await.unwrap();
        assert!(dir.path().join("cys_events.json").exists());

        app.sessions
            .begin(&Record::new().with("id", "user_1"))
            .unwrap();
        run(
            &mut app,
            Command::Delete {
                resource: "events".to_string(),
                id: "event_3".to_string(),
            },
        )
        .await
        .unwrap();

        let mut reopened = App::new(config).unwrap();
        let output = run(
            &mut reopened,
            Command::List {
                resource: "events".to_string(),
                filters: ListFilters::default(),
            },
        )
        .await
        .unwrap();
        assert_eq!(output.lines().count(), 2);
        assert!(!output.contains("event_3"));
    }

    #[tokio::test]
    async fn test_user_output_hides_credentials() {
        let mut app = app();
        let output = run(
            &mut app,
            Command::List {
                resource: "users".to_string(),
                filters: ListFilters::default(),
            },
        )
        .await
        .unwrap();
        assert!(output.contains("demo@example.com"));
        assert!(!output.contains("passwordHash"));

        let output = run(
            &mut app,
            Command::Get {
                resource: "/public/data/users.json".to_string(),
                id: "user_1".to_string(),
            },
        )
        .await
        .unwrap();
        assert!(output.contains("Demo User"));
        assert!(!output.contains("passwordHash"));

        app.sessions
            .begin(&Record::new().with("id", "user_1"))
            .unwrap();
        let output = run(
            &mut app,
            Command::Create {
                resource: "users".to_string(),
                json: r#"{"name": "Manual", "email": "m@example.com", "password": "hunter2"}"#.to_string(),
            },
        )
        .await
        .unwrap();
        assert!(!output.contains("hunter2"));
        assert!(!output.contains("passwordHash"));
    }

    #[tokio::test]
    async fn test_like_and_upload() {
        let mut app = app();
        app.sessions
            .begin(&Record::new().with("id", "user_1").with("name", "Demo User"))
            .unwrap();

        let output = run(
            &mut app,
            Command::Like {
                work_id: "portfolio_3".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(output.trim(), "Liked portfolio_3 (13 likes)");

        let output = run(
            &mut app,
            Command::Upload(community::WorkDraft {
                title: "Dawn".to_string(),
                description: "Oil on board".to_string(),
                category: "Visual Art".to_string(),
                tags: vec!["Painting".to_string()],
                image_url: None,
            }),
        )
        .await
        .unwrap();
        assert!(output.starts_with("Work published: portfolios_"));

        let output = run(
            &mut app,
            Command::Profile {
                user_id: Some("user_1".to_string()),
            },
        )
        .await
        .unwrap();
        assert!(output.contains("2 works"));
        assert!(output.contains("Dawn"));
    }
}
