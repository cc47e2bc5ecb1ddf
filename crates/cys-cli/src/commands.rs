//! Command-line argument parsing.

use anyhow::{bail, Result};
use cys_core::community::WorkDraft;

pub const USAGE: &str = "\
Usage: cys <command> [args]

Collections:
  list <resource> [--category C] [--tag T]... [--search S] [--sort S] [--timeframe T]
  get <resource> <id>
  create <resource> <json>
  update <resource> <id> <json>
  delete <resource> <id>
  refresh <resource>        Replace the cached collection with seed data
  clear <resource>          Drop the cached collection
  seed                      Warm the portfolios, events and users collections

Account:
  login [email]             Password is prompted
  register <name> <email>   Password is prompted
  logout
  whoami
  profile [user-id]         Works and totals for a member (default: you)
  attend <event-id>         Toggle your attendance at an event

Gallery:
  like <work-id>            Like or unlike a work
  upload --title T --description D --category C --tag T... [--image URL]

Sort (portfolios): newest, oldest, popular, az, za
Timeframe (events): all, upcoming, past
";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilters {
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
    pub timeframe: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List { resource: String, filters: ListFilters },
    Get { resource: String, id: String },
    Create { resource: String, json: String },
    Update { resource: String, id: String, json: String },
    Delete { resource: String, id: String },
    Refresh { resource: String },
    Clear { resource: String },
    Seed,
    Login { email: Option<String> },
    Register { name: String, email: String },
    Logout,
    Whoami,
    Profile { user_id: Option<String> },
    Attend { event_id: String },
    Like { work_id: String },
    Upload(WorkDraft),
    Help,
}

/// Parse arguments (without the program name) into a command
pub fn parse(args: &[String]) -> Result<Command> {
    let Some((name, rest)) = args.split_first() else {
        return Ok(Command::Help);
    };

    let command = match name.as_str() {
        "list" | "ls" => {
            let (resource, flags) = split_positional(rest, "list", "<resource>")?;
            Command::List {
                resource,
                filters: parse_filters(flags)?,
            }
        }
        "get" => {
            let [resource, id] = exact::<2>(rest, "get <resource> <id>")?;
            Command::Get { resource, id }
        }
        "create" => {
            let [resource, json] = exact::<2>(rest, "create <resource> <json>")?;
            Command::Create { resource, json }
        }
        "update" => {
            let [resource, id, json] = exact::<3>(rest, "update <resource> <id> <json>")?;
            Command::Update { resource, id, json }
        }
        "delete" | "rm" => {
            let [resource, id] = exact::<2>(rest, "delete <resource> <id>")?;
            Command::Delete { resource, id }
        }
        "refresh" => {
            let [resource] = exact::<1>(rest, "refresh <resource>")?;
            Command::Refresh { resource }
        }
        "clear" => {
            let [resource] = exact::<1>(rest, "clear <resource>")?;
            Command::Clear { resource }
        }
        "seed" => {
            exact::<0>(rest, "seed")?;
            Command::Seed
        }
        "login" => match rest {
            [] => Command::Login { email: None },
            [email] => Command::Login {
                email: Some(email.clone()),
            },
            _ => bail!("Usage: cys login [email]"),
        },
        "register" | "signup" => {
            let [name, email] = exact::<2>(rest, "register <name> <email>")?;
            Command::Register { name, email }
        }
        "logout" => Command::Logout,
        "whoami" => Command::Whoami,
        "profile" => match rest {
            [] => Command::Profile { user_id: None },
            [id] => Command::Profile {
                user_id: Some(id.clone()),
            },
            _ => bail!("Usage: cys profile [user-id]"),
        },
        "attend" => {
            let [event_id] = exact::<1>(rest, "attend <event-id>")?;
            Command::Attend { event_id }
        }
        "like" => {
            let [work_id] = exact::<1>(rest, "like <work-id>")?;
            Command::Like { work_id }
        }
        "upload" | "publish" => Command::Upload(parse_draft(rest)?),
        "help" | "--help" | "-h" => Command::Help,
        other => bail!("Unknown command: {}\n\n{}", other, USAGE),
    };
    Ok(command)
}

fn exact<const N: usize>(args: &[String], usage: &str) -> Result<[String; N]> {
    match <[String; N]>::try_from(args.to_vec()) {
        Ok(values) => Ok(values),
        Err(_) => bail!("Usage: cys {}", usage),
    }
}

fn split_positional<'a>(args: &'a [String], command: &str, what: &str) -> Result<(String, &'a [String])> {
    match args.split_first() {
        Some((first, rest)) if !first.starts_with("--") => Ok((first.clone(), rest)),
        _ => bail!("Usage: cys {} {}", command, what),
    }
}

fn parse_filters(flags: &[String]) -> Result<ListFilters> {
    let mut filters = ListFilters::default();
    let mut iter = flags.iter();
    while let Some(flag) = iter.next() {
        let Some(value) = iter.next() else {
            bail!("Missing value for {}", flag);
        };
        match flag.as_str() {
            "--category" => filters.category = Some(value.clone()),
            "--tag" => filters.tags.push(value.clone()),
            "--search" => filters.search = Some(value.clone()),
            "--sort" => filters.sort = Some(value.clone()),
            "--timeframe" => filters.timeframe = Some(value.clone()),
            other => bail!("Unknown option: {}", other),
        }
    }
    Ok(filters)
}

fn parse_draft(flags: &[String]) -> Result<WorkDraft> {
    let mut draft = WorkDraft::default();
    let mut iter = flags.iter();
    while let Some(flag) = iter.next() {
        let Some(value) = iter.next() else {
            bail!("Missing value for {}", flag);
        };
        match flag.as_str() {
            "--title" => draft.title = value.clone(),
            "--description" => draft.description = value.clone(),
            "--category" => draft.category = value.clone(),
            "--tag" => draft.tags.push(value.clone()),
            "--image" => draft.image_url = Some(value.clone()),
            other => bail!("Unknown option: {}", other),
        }
    }
    Ok(draft)
}
