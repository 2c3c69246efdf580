use std::path::Path;
use std::process::ExitCode;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use repo_align::config::load_config;
use repo_align::driver::{expand_repositories, run_all};
use repo_align::github::OctocrabClient;
use repo_align::report::{overall_success, render_markdown};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "repo_align=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let token = match std::env::var("GITHUB_TOKEN") {
        Ok(token) if !token.is_empty() => token,
        _ => {
            eprintln!("GITHUB_TOKEN must be set");
            return ExitCode::FAILURE;
        }
    };

    let config_path = std::env::var("REPO_ALIGN_CONFIG").unwrap_or_else(|_| "repos.yml".into());
    let dry_run = std::env::args().any(|a| a == "--dry-run")
        || std::env::var("REPO_ALIGN_DRY_RUN").is_ok_and(|v| v == "1" || v == "true");

    let config = match load_config(Path::new(&config_path)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let client = match octocrab::Octocrab::builder()
        .personal_token(token)
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            eprintln!("failed to build GitHub client: {e}");
            return ExitCode::FAILURE;
        }
    };

    let entries = match expand_repositories(&client, &config.repositories).await {
        Ok(entries) => entries,
        Err(e) => {
            eprintln!("failed to expand repository list: {e}");
            return ExitCode::FAILURE;
        }
    };

    let reports = run_all(&config, &entries, dry_run, |id| {
        OctocrabClient::new(client.clone(), id)
    })
    .await;

    print!("{}", render_markdown(&reports));

    if overall_success(&reports) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
