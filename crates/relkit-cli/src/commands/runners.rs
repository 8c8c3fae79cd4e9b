use relkit_core::{RelkitConfig, RunnerScope};
use relkit_github::run_reaper;
use secrecy::{ExposeSecret, SecretString};

use super::github_client;

pub async fn runners_reap(
    url: &str,
    token: String,
    once: bool,
    interval: Option<u64>,
) -> anyhow::Result<()> {
    let scope = RunnerScope::from_url(url)?;
    let config = RelkitConfig::load(std::path::Path::new("."))?;
    let client = github_client(&config, &SecretString::from(token))?;
    let reaper = client.runners();

    if once {
        let report = reaper.reap(&scope).await?;
        println!(
            "Deleted {} offline runner(s) from {scope}",
            report.deleted_count()
        );
        for (id, reason) in &report.failed {
            println!("  failed to delete {id}: {reason}");
        }
        return Ok(());
    }

    let interval = interval
        .map(std::time::Duration::from_secs)
        .unwrap_or_else(|| config.reaper.interval());
    println!(
        "Reaping offline runners from {scope} every {}s (Ctrl-C to stop)",
        interval.as_secs()
    );

    let cycles = run_reaper(&reaper, &scope, interval, shutdown_signal()).await;
    println!("Stopped after {cycles} cycle(s)");
    Ok(())
}

pub async fn runners_token(url: &str, token: String) -> anyhow::Result<()> {
    let scope = RunnerScope::from_url(url)?;
    let config = RelkitConfig::load(std::path::Path::new("."))?;
    let client = github_client(&config, &SecretString::from(token))?;

    let registration = client.runners().registration_token(&scope).await?;
    println!("{}", registration.token.expose_secret());
    if let Some(expires_at) = registration.expires_at {
        eprintln!("expires at {expires_at}");
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "cannot listen for Ctrl-C, reaper runs until killed");
        std::future::pending::<()>().await;
    }
}
