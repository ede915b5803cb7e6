use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use taskpulse::client::{ApiClient, ApiError};
use taskpulse::models::{LoginRequest, Task, Workgroup};
use taskpulse::session::{CredentialStore, SessionState, SessionSupervisor};
use taskpulse::timeline;

/// Track width of the timeline bars, in character cells.
const BAR_WIDTH: usize = 40;

#[derive(Parser)]
#[command(name = "taskpulse")]
#[command(about = "Command-line client for the TaskPulse task tracker")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and store the session token
    Login {
        /// Sign-in name
        login: String,
        /// Password
        password: String,
    },
    /// Sign out and drop the stored token
    Logout,
    /// Show the signed-in profile
    Whoami,
    /// List tasks
    Tasks,
    /// Show task progress timelines
    Timeline {
        /// Only show tasks of this workgroup
        #[arg(short, long)]
        workgroup: Option<i64>,
    },
    /// Send an immediate Telegram reminder for a task
    Nudge {
        /// The task to nudge
        task_id: i64,
    },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "taskpulse=warn".into()),
    );
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let client = ApiClient::from_env();
    let store = CredentialStore::open_default()?;
    let supervisor = SessionSupervisor::new(client.clone(), store);

    match cli.command {
        Commands::Login { login, password } => {
            let credentials = LoginRequest { login, password };
            match supervisor.login(&credentials).await {
                Ok(user) => println!("Signed in as {}", user.display_name()),
                Err(e) => anyhow::bail!("login failed: {}", e),
            }
        }
        Commands::Logout => {
            supervisor.logout()?;
            println!("Signed out");
        }
        Commands::Whoami => {
            let user = require_session(&supervisor).await?;
            println!("{} ({})", user.display_name(), user.role.label());
        }
        Commands::Tasks => {
            require_session(&supervisor).await?;
            let tasks = fetch(&supervisor, |token| {
                let client = client.clone();
                async move { client.list_tasks(&token).await }
            })
            .await?;
            print_tasks(&tasks);
        }
        Commands::Timeline { workgroup } => {
            require_session(&supervisor).await?;
            let tasks = fetch(&supervisor, |token| {
                let client = client.clone();
                async move { client.list_tasks(&token).await }
            })
            .await?;
            let workgroups = fetch(&supervisor, |token| {
                let client = client.clone();
                async move { client.list_workgroups(&token).await }
            })
            .await?;
            print_timeline(&tasks, &workgroups, workgroup);
        }
        Commands::Nudge { task_id } => {
            require_session(&supervisor).await?;
            fetch(&supervisor, |token| {
                let client = client.clone();
                async move { client.nudge_task(&token, task_id).await }
            })
            .await?;
            println!("Reminder sent for task {}", task_id);
        }
    }

    Ok(())
}

/// Restore the session from the stored token, or explain how to sign in.
async fn require_session(
    supervisor: &SessionSupervisor<ApiClient>,
) -> anyhow::Result<taskpulse::models::User> {
    match supervisor.validate_session().await? {
        SessionState::Authenticated(user) => Ok(user),
        _ => anyhow::bail!("not signed in; run `taskpulse login <login> <password>`"),
    }
}

/// Run an authorized request. A 401 drops the session through the
/// staleness-checked path before reporting; other failures are user-visible
/// notices and leave the session alone.
async fn fetch<T, F, Fut>(
    supervisor: &SessionSupervisor<ApiClient>,
    call: F,
) -> anyhow::Result<T>
where
    F: FnOnce(String) -> Fut,
    Fut: std::future::Future<Output = Result<T, ApiError>>,
{
    let Some(token) = supervisor.store().get() else {
        anyhow::bail!("not signed in; run `taskpulse login <login> <password>`");
    };
    match call(token.clone()).await {
        Ok(value) => Ok(value),
        Err(ApiError::Unauthorized) => {
            supervisor.invalidate_if_current(&token)?;
            anyhow::bail!("session expired; sign in again");
        }
        Err(e) => anyhow::bail!("request failed: {}", e),
    }
}

fn format_date(date: Option<DateTime<Utc>>) -> String {
    match date {
        Some(d) => d.format("%d.%m.%Y").to_string(),
        None => "-".to_string(),
    }
}

fn print_tasks(tasks: &[Task]) {
    if tasks.is_empty() {
        println!("No tasks");
        return;
    }
    for task in tasks {
        let assignees: Vec<String> = task.assignees.iter().map(|u| u.display_name()).collect();
        println!(
            "#{:<4} [{}] {}  due {}  {}",
            task.id,
            task.status.label(),
            task.title,
            format_date(task.due_date),
            assignees.join(", "),
        );
    }
}

fn print_timeline(tasks: &[Task], workgroups: &[Workgroup], filter: Option<i64>) {
    let filtered: Vec<&Task> = tasks
        .iter()
        .filter(|t| filter.is_none() || t.workgroup_id == filter)
        .collect();
    if filtered.is_empty() {
        println!("No tasks");
        return;
    }
    if let Some(id) = filter {
        if let Some(wg) = workgroups.iter().find(|w| w.id == id) {
            println!("Workgroup: {}\n", wg.name);
        }
    }
    for task in filtered {
        let points = timeline::layout(&task.sorted_poll_responses(), task.is_done());
        println!("#{} {} [{}]", task.id, task.title, task.status.label());
        println!(
            "  {} {} {}",
            format_date(Some(task.created_at)),
            timeline::render_bar(&points, BAR_WIDTH),
            format_date(task.due_date),
        );
        println!("  {:11}{}", "", timeline::render_zone_labels(BAR_WIDTH));
        for point in &points {
            println!("    {}", point.tooltip);
        }
        println!();
    }
}
