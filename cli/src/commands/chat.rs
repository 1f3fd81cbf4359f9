use std::sync::Arc;

use clap::Args;
use eai_core::events::{EventSink, TracingSink};
use eai_core::integrity::probe_catalog;
use eai_core::loader::CatalogLoader;
use eai_core::store::JsonFileStore;
use eai_core::{LearnerProfile, Locale};
use eai_runtime::{
    CoachSession, CollaboratorArgs, GeminiCollaborator, SessionError, TurnOutcome, http_client,
};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::util::{print_json, report_error};

#[derive(Args)]
pub struct ChatArgs {
    #[command(flatten)]
    pub collaborator: CollaboratorArgs,

    /// Learner name
    #[arg(long)]
    pub name: Option<String>,
    /// Subject of the session
    #[arg(long)]
    pub subject: Option<String>,
    /// Education level (e.g. HAVO, VWO, HBO)
    #[arg(long)]
    pub level: Option<String>,
    /// Grade or year
    #[arg(long)]
    pub grade: Option<String>,
    /// Learning goal; when given, the session opens with the start prompt
    #[arg(long)]
    pub goal: Option<String>,
}

/// One REPL input line.
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Quit,
    State,
    Reset,
    Locale(&'a str),
    Message(&'a str),
    Blank,
}

/// Only the REPL's own commands are intercepted; other slash commands
/// (the coach's command library) go to the collaborator as messages.
fn parse_input(line: &str) -> Input<'_> {
    let line = line.trim();
    if line.is_empty() {
        return Input::Blank;
    }
    if let Some(rest) = line.strip_prefix("/locale") {
        if rest.is_empty() || rest.starts_with(char::is_whitespace) {
            return Input::Locale(rest.trim());
        }
    }
    match line {
        "/quit" | "/exit" => Input::Quit,
        "/state" => Input::State,
        "/reset" => Input::Reset,
        message => Input::Message(message),
    }
}

fn print_turn(result: Result<TurnOutcome, SessionError>) {
    match result {
        Ok(outcome) => {
            println!("{}", outcome.message.text);
            if !outcome.validation.ok {
                eprintln!(
                    "[ungrounded] unknown bands {:?}, unknown command {:?}",
                    outcome.validation.unknown_band_ids, outcome.validation.unknown_command_id
                );
            }
        }
        Err(SessionError::Collaborator(e)) => eprintln!("[error] System Failure: {e}"),
        Err(e) => eprintln!("[error] {e}"),
    }
}

pub async fn run(locale: Locale, store: JsonFileStore, args: ChatArgs) -> i32 {
    if args.collaborator.api_key.is_none() {
        return report_error(
            "cli_error",
            "No API key configured",
            Some("Set GEMINI_API_KEY or pass --api-key"),
            1,
        );
    }
    let client = match http_client(args.collaborator.timeout_secs) {
        Ok(client) => client,
        Err(e) => return report_error("connection_error", &e.to_string(), None, 3),
    };

    let events: Arc<dyn EventSink> = Arc::new(TracingSink);
    let loader = Arc::new(CatalogLoader::builtin(events.clone()));
    for each in Locale::ALL {
        probe_catalog(&loader.get(each), each, events.as_ref());
    }

    let session = CoachSession::open(
        locale,
        Arc::new(GeminiCollaborator::new(args.collaborator, client)),
        loader,
        Arc::new(store),
        events,
    );

    if let Some(goal) = args.goal.as_deref() {
        let entered = LearnerProfile {
            name: args.name,
            subject: args.subject,
            level: args.level,
            grade: args.grade,
        }
        .normalized();
        print_turn(session.start(&entered, goal).await);
    } else {
        eprintln!("Type a message. Commands: /state, /reset, /locale <nl|en>, /quit");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                return report_error("cli_error", &format!("Failed to read stdin: {e}"), None, 2);
            }
        };

        match parse_input(&line) {
            Input::Blank => continue,
            Input::Quit => break,
            Input::State => print_json(&session.dashboard()),
            Input::Reset => match session.reset() {
                Ok(()) => eprintln!("Session reset."),
                Err(e) => eprintln!("[error] {e}"),
            },
            Input::Locale(tag) => match tag.parse::<Locale>() {
                Ok(next) => match session.switch_locale(next) {
                    Ok(()) => eprintln!("Locale: {next}"),
                    Err(e) => eprintln!("[error] {e}"),
                },
                Err(e) => eprintln!("[error] {e}"),
            },
            Input::Message(message) => print_turn(session.send(message).await),
        }
    }

    0
}
