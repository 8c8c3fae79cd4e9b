mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "relkit",
    about = "Branch-scoped build versions, GitHub releases, and CI housekeeping"
)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the per-branch build version
    Version {
        #[command(subcommand)]
        action: VersionAction,
    },
    /// Publish GitHub releases
    Release {
        #[command(subcommand)]
        action: ReleaseAction,
    },
    /// Build, push, and scan container images
    Image {
        #[command(subcommand)]
        action: ImageAction,
    },
    /// Manage self-hosted Actions runners
    Runners {
        #[command(subcommand)]
        action: RunnersAction,
    },
}

#[derive(Subcommand)]
enum VersionAction {
    /// Allocate the next build number for a branch and store it
    Bump {
        /// Branch name (default: from GITHUB_REF)
        #[arg(long)]
        branch: Option<String>,
        /// Fail instead of falling back to v0.0 for non-version branches
        #[arg(long)]
        strict: bool,
    },
    /// Print the stored version record for a branch
    Show {
        /// Branch name (default: from GITHUB_REF)
        #[arg(long)]
        branch: Option<String>,
    },
}

#[derive(Subcommand)]
enum ReleaseAction {
    /// Tag the commit and create a release from the stored version
    Publish {
        /// Branch name (default: from GITHUB_REF)
        #[arg(long)]
        branch: Option<String>,
        /// Commit to tag (default: GITHUB_SHA)
        #[arg(long)]
        sha: Option<String>,
        /// Files to attach to the release
        #[arg(long = "asset", value_name = "PATH")]
        assets: Vec<PathBuf>,
    },
}

#[derive(Subcommand)]
enum ImageAction {
    /// Build and push a multi-platform image tagged from the stored version
    Build {
        /// Branch name (default: from GITHUB_REF)
        #[arg(long)]
        branch: Option<String>,
        /// Also pull the pushed image and save it as a tarball
        #[arg(long, value_name = "PATH")]
        save: Option<PathBuf>,
    },
    /// Generate SBOM and vulnerability reports for the pushed image
    Sbom {
        /// Image reference to scan (default: ghcr.io image of the stored version)
        #[arg(long)]
        image: Option<String>,
        /// Branch name (default: from GITHUB_REF)
        #[arg(long)]
        branch: Option<String>,
        /// Docker config.json to mount into the scanner
        #[arg(long, value_name = "PATH")]
        docker_config: Option<PathBuf>,
        /// Commit the JSON and text reports to the repository ([sbom].commit_dir)
        #[arg(long)]
        commit: bool,
    },
}

#[derive(Subcommand)]
enum RunnersAction {
    /// Delete offline runners, every interval until interrupted
    Reap {
        /// Repository or organization URL (https://github.com/<owner>[/<repo>])
        url: String,
        /// Personal access token
        token: String,
        /// Run a single cycle and exit
        #[arg(long)]
        once: bool,
        /// Seconds between cycles (default: [reaper].interval_secs)
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        interval: Option<u64>,
    },
    /// Print a runner registration token
    Token {
        /// Repository or organization URL
        url: String,
        /// Personal access token
        token: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
        Err(e) => tracing::debug!(error = %e, "no .env loaded"),
    }

    let cli = Cli::parse();

    match cli.command {
        Commands::Version { action } => match action {
            VersionAction::Bump { branch, strict } => {
                commands::version_bump(branch, strict).await?
            }
            VersionAction::Show { branch } => commands::version_show(branch).await?,
        },
        Commands::Release { action } => match action {
            ReleaseAction::Publish {
                branch,
                sha,
                assets,
            } => commands::release_publish(branch, sha, &assets).await?,
        },
        Commands::Image { action } => match action {
            ImageAction::Build { branch, save } => {
                commands::image_build(branch, save.as_deref()).await?
            }
            ImageAction::Sbom {
                image,
                branch,
                docker_config,
                commit,
            } => commands::image_sbom(image, branch, docker_config.as_deref(), commit).await?,
        },
        Commands::Runners { action } => match action {
            RunnersAction::Reap {
                url,
                token,
                once,
                interval,
            } => commands::runners_reap(&url, token, once, interval).await?,
            RunnersAction::Token { url, token } => commands::runners_token(&url, token).await?,
        },
    }

    Ok(())
}
