//! This client manages notes on a running server from the command line.
//!
//! Usage:
//!   client list
//!   client create <title> <description>
//!   client update <id> <title> <description>
//!   client delete <id>
use anyhow::{anyhow, bail, Context};
use notes::{
    config::{self, ClientConfig},
    request::NoteRequest,
    response::{ErrorResponse, NoteResponse},
};
use reqwest::{blocking::Response, StatusCode};
use tracing::debug;

/// A single invocation of the client.
#[derive(Debug, PartialEq, Eq)]
enum Command {
    List,
    Create { title: String, description: String },
    Update { id: String, title: String, description: String },
    Delete { id: String },
}

impl Command {
    fn parse(args: &[String]) -> anyhow::Result<Self> {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();

        match args.as_slice() {
            ["list"] => Ok(Command::List),
            ["create", title, description] => Ok(Command::Create {
                title: title.to_string(),
                description: description.to_string(),
            }),
            ["update", id, title, description] => Ok(Command::Update {
                id: id.to_string(),
                title: title.to_string(),
                description: description.to_string(),
            }),
            ["delete", id] => Ok(Command::Delete { id: id.to_string() }),
            _ => Err(anyhow!(
                "usage: client list | create <title> <description> | \
                 update <id> <title> <description> | delete <id>"
            )),
        }
    }
}

/// Turns a non-success response into an error carrying the server's message.
fn check(res: Response) -> anyhow::Result<Response> {
    let status = res.status();

    if status.is_success() {
        return Ok(res);
    }

    match res.json::<ErrorResponse>() {
        Ok(body) => bail!("request failed with {}: {}", status, body.error),
        Err(_) => bail!("request failed with {}", status),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("failed to format response")?
    );

    Ok(())
}

fn run(
    command: Command,
    base_url: &str,
    client: &reqwest::blocking::Client,
) -> anyhow::Result<()> {
    let notes_url = format!("{base_url}/api/notes");

    match command {
        Command::List => {
            let res = client
                .get(&notes_url)
                .send()
                .context("request for notes failed")?;
            let notes = check(res)?
                .json::<Vec<NoteResponse>>()
                .context("failed to parse notes")?;

            print_json(&notes)
        }
        Command::Create { title, description } => {
            let res = client
                .post(&notes_url)
                .json(&NoteRequest { title, description })
                .send()
                .context("request to create note failed")?;
            let note = check(res)?
                .json::<NoteResponse>()
                .context("failed to parse created note")?;

            print_json(&note)
        }
        Command::Update {
            id,
            title,
            description,
        } => {
            let res = client
                .put(format!("{notes_url}/{id}"))
                .json(&NoteRequest { title, description })
                .send()
                .context("request to update note failed")?;
            let note = check(res)?
                .json::<NoteResponse>()
                .context("failed to parse updated note")?;

            print_json(&note)
        }
        Command::Delete { id } => {
            let res = client
                .delete(format!("{notes_url}/{id}"))
                .send()
                .context("request to delete note failed")?;

            if check(res)?.status() == StatusCode::NO_CONTENT {
                println!("deleted note {id}");
            }

            Ok(())
        }
    }
}

fn main() -> anyhow::Result<()> {
    // setup logging
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter("client=debug")
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).context("failed to set global default")?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = Command::parse(&args)?;

    // load config items
    let config_file_path = config::config_file_path("client.toml")?;
    let config =
        ClientConfig::load(Some(&config_file_path)).context("failed to load config file")?;
    let base_url = config.base_url.trim_end_matches('/');

    debug!("config file path: {:?}", config_file_path);
    debug!("base url: {:?}", base_url);

    let client = reqwest::blocking::Client::new();

    run(command, base_url, &client)
}
