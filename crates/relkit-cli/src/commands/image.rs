use std::path::Path;

use anyhow::Context;

use relkit_core::VersionRecord;
use relkit_image::{
    BuildRequest, ImagePipeline, RegistryTarget, SbomScanner, image_references, oci_labels,
};

use super::Settings;

async fn stored_record(settings: &Settings, branch: &str) -> anyhow::Result<VersionRecord> {
    let repo = settings.env.require_repository()?;
    let client = settings.github()?;
    client
        .version_store(&repo, settings.config.github.state_branch.as_deref())
        .read(branch)
        .await?
        .map(|stored| stored.record)
        .ok_or_else(|| {
            anyhow::anyhow!(
                "no version recorded for branch '{branch}'. Run `relkit version bump` first"
            )
        })
}

pub async fn image_build(branch: Option<String>, save: Option<&Path>) -> anyhow::Result<()> {
    let settings = Settings::load()?;
    let image_config = &settings.config.image;
    let repo = settings.env.require_repository()?;
    let image = settings
        .env
        .require_image_name(image_config.name.as_deref())?
        .to_owned();
    let branch = settings.branch(branch)?;

    let pipeline = ImagePipeline::new();
    let mut targets = Vec::new();

    if image_config.push_dockerhub {
        let (user, password) = settings.env.require_docker_credentials()?;
        targets.push((RegistryTarget::docker_hub(user), user.to_owned(), password));
    }
    if image_config.push_ghcr {
        let actor = settings.env.require_actor()?;
        let password = settings.env.require_token()?;
        targets.push((RegistryTarget::ghcr(&repo.owner), actor.to_owned(), password));
    }
    if targets.is_empty() {
        anyhow::bail!("both push_dockerhub and push_ghcr are disabled in relkit.toml");
    }

    let record = stored_record(&settings, &branch).await?;
    println!("Building {image} {}", record.version);

    pipeline.setup_builder().await?;
    for (target, user, password) in &targets {
        pipeline
            .login(target.registry.as_deref(), user, password)
            .await?;
    }

    let registries: Vec<RegistryTarget> = targets.into_iter().map(|(t, _, _)| t).collect();
    let source = format!("{}/{repo}", settings.env.server_url());
    let request = BuildRequest {
        context: image_config.context.clone(),
        platforms: image_config.platforms.clone(),
        references: image_references(&image, &record.tags, &registries),
        labels: oci_labels(&image, &record.version, &source),
    };
    pipeline.build_and_push(&request).await?;

    for reference in &request.references {
        println!("  pushed {reference}");
    }

    if let Some(path) = save {
        let reference = registries
            .last()
            .map(|target| target.reference(&image, &record.version))
            .ok_or_else(|| anyhow::anyhow!("no registry to pull from"))?;
        pipeline.pull(&reference).await?;
        pipeline.save(&reference, path).await?;
        println!("Saved {reference} to {}", path.display());
    }

    let output = settings.env.output();
    output.set("full_version", &record.version)?;
    output.set_json("image_references", &request.references)?;

    Ok(())
}

pub async fn image_sbom(
    image: Option<String>,
    branch: Option<String>,
    docker_config: Option<&Path>,
    commit: bool,
) -> anyhow::Result<()> {
    let settings = Settings::load()?;
    let repo = settings.env.require_repository()?;

    let reference = match image {
        Some(reference) => reference,
        None => {
            let name = settings
                .env
                .require_image_name(settings.config.image.name.as_deref())?;
            let branch = settings.branch(branch)?;
            let record = stored_record(&settings, &branch).await?;
            RegistryTarget::ghcr(&repo.owner).reference(name, &record.version)
        }
    };

    let actor = settings.env.require_actor()?;
    let token = settings.env.require_token()?;
    ImagePipeline::new()
        .login(Some("ghcr.io"), actor, token)
        .await?;

    let scanner = SbomScanner::new(settings.config.sbom.clone());
    let output_dir = Path::new(&settings.config.sbom.output_dir);
    let reports = scanner.generate(&reference, output_dir, docker_config).await?;

    println!("Scanned {reference}");
    for report in &reports {
        println!("  {}", report.display());
    }

    if commit {
        let targets = scanner.commit_targets(&reports);
        if targets.is_empty() {
            tracing::warn!(dir = %output_dir.display(), "no SBOM reports to commit");
        }

        let client = settings.github()?;
        let files = client.repo_files(&repo, settings.config.github.state_branch.as_deref());
        for (local, target) in &targets {
            let content = tokio::fs::read(local)
                .await
                .with_context(|| format!("failed to read {}", local.display()))?;
            files
                .upsert(target, &content, &format!("Update {target}"))
                .await?;
            println!("  committed {target}");
        }
    }

    let output = settings.env.output();
    output.set("sbom_dir", &output_dir.display().to_string())?;

    Ok(())
}
