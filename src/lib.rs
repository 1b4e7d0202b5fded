mod clipboard;
mod config;
mod console;
mod presenter;
mod session;
mod summary;
mod upload;

pub use clipboard::{ClipboardError, ClipboardWriter, MemoryClipboard, SystemClipboard};
pub use config::AppConfig;
pub use presenter::SessionView;
pub use session::{
    CopyFeedback, Intent, SessionClosed, SessionController, SessionError, SessionHandle,
    SessionRuntime, SessionSnapshot, SubmissionState, SummaryResult,
};
pub use summary::{
    HealthStatus, HttpSummaryAdapter, SummaryError, SummaryLength, SummaryRequest, SummaryResponse,
    SummaryTransport,
};
pub use upload::{DocumentKind, FileSelector, SelectedFile, SelectionError};

use clap::Parser;
use console::{Args, Command};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

struct AppState {
    session: SessionHandle,
    selector: FileSelector,
    adapter: Arc<HttpSummaryAdapter>,
}

fn open_file(path: &str, state: &AppState) -> Result<(), String> {
    let paths = [upload::expand_home(path)];
    open_files(&paths[..], state)
}

/// A rejected file leaves the session untouched; the reason only goes to the log.
fn open_files<P: AsRef<std::path::Path>>(paths: &[P], state: &AppState) -> Result<(), String> {
    match state.selector.select_many(paths) {
        Ok(file) => state
            .session
            .send(Intent::SelectFile(file))
            .map_err(|e| e.to_string()),
        Err(e) => {
            tracing::warn!("File not accepted: {}", e);
            Ok(())
        }
    }
}

fn set_summary_length(length: SummaryLength, state: &AppState) -> Result<(), String> {
    state
        .session
        .send(Intent::SetSummaryLength(length))
        .map_err(|e| e.to_string())
}

fn submit_document(state: &AppState) -> Result<(), String> {
    state.session.send(Intent::Submit).map_err(|e| e.to_string())
}

fn copy_summary(state: &AppState) -> Result<(), String> {
    state
        .session
        .send(Intent::CopyResult)
        .map_err(|e| e.to_string())
}

fn clear_session(state: &AppState) -> Result<(), String> {
    state.session.send(Intent::Clear).map_err(|e| e.to_string())
}

async fn check_service(state: &AppState) -> Result<String, String> {
    state
        .adapter
        .check_health()
        .await
        .map(|health| {
            if health.message.is_empty() {
                "Summary service is up".to_string()
            } else {
                health.message
            }
        })
        .map_err(|e| e.to_string())
}

fn current_view(state: &AppState) -> String {
    SessionView::from_snapshot(&state.session.snapshot()).render()
}

/// Re-render whenever the session publishes a different snapshot.
fn spawn_renderer(state: &AppState) -> tokio::task::JoinHandle<()> {
    let mut snapshots = state.session.subscribe();
    tokio::spawn(async move {
        let mut last = snapshots.borrow_and_update().clone();
        while snapshots.changed().await.is_ok() {
            let snapshot = snapshots.borrow_and_update().clone();
            if snapshot == last {
                continue;
            }
            println!("{}", SessionView::from_snapshot(&snapshot).render());
            last = snapshot;
        }
    })
}

async fn dispatch(command: Command, state: &AppState) -> Result<bool, String> {
    match command {
        Command::Open(path) => open_file(&path, state)?,
        Command::Length(length) => set_summary_length(length, state)?,
        Command::Submit => submit_document(state)?,
        Command::Copy => copy_summary(state)?,
        Command::Clear => clear_session(state)?,
        Command::Status => println!("{}", current_view(state)),
        Command::Health => println!("{}", check_service(state).await?),
        Command::Help => println!("{}", console::HELP),
        Command::Quit => return Ok(false),
    }
    Ok(true)
}

async fn run_console(args: Args) -> Result<(), String> {
    let config = config::load().unwrap_or_else(|e| {
        tracing::warn!("Using default config: {}", e);
        let mut config = AppConfig::default();
        config::apply_env_overrides(&mut config);
        config
    });

    let adapter = Arc::new(HttpSummaryAdapter::from_config(&config).map_err(|e| e.to_string())?);
    let (session, session_task) = SessionRuntime::spawn(
        SessionController::new(config.summary_length()),
        adapter.clone(),
        clipboard::default_clipboard(),
        config.copy_feedback(),
    );

    let state = AppState {
        session,
        selector: FileSelector::new(),
        adapter,
    };

    println!("{}\n{}\n", presenter::APP_TITLE, presenter::APP_TAGLINE);
    println!("{}\n", console::HELP);
    println!("{}", current_view(&state));
    let renderer = spawn_renderer(&state);

    if !args.files.is_empty() {
        open_files(&args.files[..], &state)?;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.map_err(|e| e.to_string())? {
        let command = match console::parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };

        match dispatch(command, &state).await {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => println!("{}", e),
        }
    }

    drop(state);
    let _ = session_task.await;
    let _ = renderer.await;
    Ok(())
}

pub fn run() {
    let args = Args::parse();
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,doc_summary_lib=info")),
        )
        .init();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Failed to start async runtime: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(run_console(args)) {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
