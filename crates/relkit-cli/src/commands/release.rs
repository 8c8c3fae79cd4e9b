use std::path::PathBuf;

use anyhow::Context;

use super::Settings;

pub async fn release_publish(
    branch: Option<String>,
    sha: Option<String>,
    assets: &[PathBuf],
) -> anyhow::Result<()> {
    let settings = Settings::load()?;
    let repo = settings.env.require_repository()?;
    let branch = settings.branch(branch)?;
    let sha = match sha {
        Some(sha) => sha,
        None => settings.env.require_sha()?.to_owned(),
    };

    for asset in assets {
        if !asset.is_file() {
            anyhow::bail!("asset not found: {}", asset.display());
        }
    }

    let client = settings.github()?;
    let record = client
        .version_store(&repo, settings.config.github.state_branch.as_deref())
        .read(&branch)
        .await?
        .map(|stored| stored.record)
        .ok_or_else(|| {
            anyhow::anyhow!(
                "no version recorded for branch '{branch}'. Run `relkit version bump` first"
            )
        })?;

    let releases = client.releases(&repo);
    let tag = releases.create_tag(&sha, &record.version).await?;
    println!("Tagged {} at {}", tag.name(), tag.sha());

    let release = releases
        .create_release(&tag, &record)
        .await
        .with_context(|| {
            format!(
                "tag {} exists without a release; create the release by hand or delete the tag before retrying",
                tag.name()
            )
        })?;
    println!(
        "Created release {} ({})",
        release.tag_name,
        release.html_url.as_deref().unwrap_or("no html url")
    );

    for asset in assets {
        let uploaded = releases.upload_asset(&release, asset).await?;
        println!("Uploaded {}", uploaded.name);
    }

    let output = settings.env.output();
    output.set("version", &record.version)?;
    output.set("release_created", "true")?;
    output.set("upload_url", &release.upload_url)?;

    Ok(())
}
