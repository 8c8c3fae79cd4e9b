use relkit_core::version::parse_branch;

use super::Settings;

pub async fn version_bump(branch: Option<String>, strict: bool) -> anyhow::Result<()> {
    let settings = Settings::load()?;
    let branch = settings.branch(branch)?;

    if strict {
        parse_branch(&branch).strict(&branch)?;
    }

    let repo = settings.env.require_repository()?;
    let client = settings.github()?;
    let store = client.version_store(&repo, settings.config.github.state_branch.as_deref());

    let bump = store.bump(&branch).await?;
    let record = &bump.record;

    println!("Branch:       {branch}");
    println!("Version:      {}", record.version);
    println!("Build number: {}", record.build_number);
    println!("Tags:");
    for tag in &record.tags {
        println!("  {tag}");
    }
    if bump.parsed.is_defaulted() {
        println!();
        println!("'{branch}' is not a version branch; used the default v0.0 line.");
        println!("Pass --strict to fail instead.");
    }

    let output = settings.env.output();
    output.set("full_version", &record.version)?;
    output.set_json("tags", &record.tags)?;

    Ok(())
}

pub async fn version_show(branch: Option<String>) -> anyhow::Result<()> {
    let settings = Settings::load()?;
    let branch = settings.branch(branch)?;
    let repo = settings.env.require_repository()?;
    let client = settings.github()?;

    let stored = client
        .version_store(&repo, settings.config.github.state_branch.as_deref())
        .read(&branch)
        .await?;

    match stored {
        Some(stored) => println!("{}", stored.record.to_pretty_json()?),
        None => println!("No version recorded for branch '{branch}'."),
    }
    Ok(())
}
