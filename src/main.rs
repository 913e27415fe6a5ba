mod handlers;

use std::{path::PathBuf, sync::Arc, time::Duration};

use crate::handlers::{
    catalog::{list_languages, show_problem, show_progress},
    metrics::{describe_metrics, render_metrics},
    run::{ExecuteArgs, run_code, submit_code},
};

use clap::{Parser, Subcommand};
use config::Config;
use dotenvy::dotenv;
use judge_workspace::{
    AuthEvent, AuthSession, HttpTransport, JudgeClient, Portal, QueryCache,
    types::{AppConfig, Credential},
};
use metrics_exporter_prometheus::PrometheusBuilder;
use tokio::sync::broadcast::error::RecvError;

#[derive(Parser)]
#[command(name = "judge-workspace", version, about = "Run and submit solutions against the practice backend")]
struct Cli {
    /// Print collected metrics when the command finishes
    #[arg(long)]
    print_metrics: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the languages the backend can execute
    Languages,
    /// Show a problem statement with its sample cases
    Problem { id: String },
    /// Run a solution against the sample cases
    Run {
        id: String,
        file: PathBuf,
        #[arg(short, long)]
        language: Option<String>,
        /// Custom stdin instead of the sample cases
        #[arg(short, long)]
        input: Option<String>,
    },
    /// Submit a solution for grading
    Submit {
        id: String,
        file: PathBuf,
        #[arg(short, long)]
        language: Option<String>,
        #[arg(long)]
        contest: Option<String>,
    },
    /// Show solved counts
    Progress,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    dotenv().ok();
    let settings = Config::builder()
        .add_source(config::File::with_name("Settings").required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("preferred_languages"),
        )
        .build()?;

    let app_config: AppConfig = settings.try_deserialize()?;
    let cli = Cli::parse();

    let handle = PrometheusBuilder::new().install_recorder()?;
    describe_metrics();

    let auth = Arc::new(AuthSession::new());
    let mut events = auth.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(AuthEvent::LoginRequired) => {
                    eprintln!("session expired, log in again");
                }
                Ok(AuthEvent::LoggedIn(student)) => {
                    tracing::info!(name = %student.name, "logged in");
                }
                Ok(AuthEvent::LoggedOut) => {}
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
    });

    let transport = HttpTransport::new(app_config.base_url.clone())
        .with_timeout(Duration::from_millis(app_config.request_timeout_ms));
    let client = JudgeClient::new(transport, Arc::clone(&auth), app_config.api_prefix.clone());

    match (&app_config.token, &app_config.username, &app_config.password) {
        (Some(token), _, _) => auth.establish(Credential {
            access_token: token.clone(),
            ..Default::default()
        }),
        (None, Some(username), Some(password)) => {
            client.login(username, password).await?;
        }
        _ => tracing::warn!("no credentials configured, requests will be unauthenticated"),
    }

    let portal = Portal::new(
        client,
        Arc::new(QueryCache::new()),
        app_config.preferred_languages.clone(),
    );

    let outcome = match cli.command {
        Command::Languages => list_languages(&portal).await,
        Command::Problem { id } => show_problem(&portal, &id).await,
        Command::Run {
            id,
            file,
            language,
            input,
        } => {
            let args = ExecuteArgs {
                problem_id: id,
                file,
                language,
            };
            run_code(&portal, args, input).await
        }
        Command::Submit {
            id,
            file,
            language,
            contest,
        } => {
            let args = ExecuteArgs {
                problem_id: id,
                file,
                language,
            };
            submit_code(&portal, args, contest).await
        }
        Command::Progress => show_progress(&portal).await,
    };

    if cli.print_metrics {
        println!("{}", render_metrics(&handle));
    }
    outcome
}
