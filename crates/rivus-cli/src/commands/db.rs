use anyhow::{anyhow, Context, Result};
use rivus_cli::{DbCommands, Settings};
use rivus_db::RunStore;

fn database_url(url: Option<&String>, settings: &Settings) -> Result<String> {
    url.cloned()
        .or_else(|| settings.database.clone())
        .ok_or_else(|| anyhow!("no database url; pass --url or set `database` in rivus.toml"))
}

pub fn handle(command: &DbCommands, settings: &Settings) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("building tokio runtime")?;
    match command {
        DbCommands::Init { url } => {
            let url = database_url(url.as_ref(), settings)?;
            runtime.block_on(async {
                let store = RunStore::connect(&url).await?;
                store.init_schema().await
            })?;
            println!("Initialised run database {url}");
            Ok(())
        }
        DbCommands::Show { run_id, url } => {
            let url = database_url(url.as_ref(), settings)?;
            let (run, costs) = runtime.block_on(async {
                let store = RunStore::connect(&url).await?;
                let run = store.fetch_run(*run_id).await?;
                let costs = store.fetch_costs(*run_id).await?;
                anyhow::Ok((run, costs))
            })?;
            let run = run.ok_or_else(|| anyhow!("run {run_id} not found in {url}"))?;
            println!(
                "Run {} ({}) by {}: {} / {}",
                run.run_id, run.run_uuid, run.runner, run.status, run.outcome
            );
            println!(
                "  started {}, ended {}",
                run.start_ts,
                run.end_ts.as_deref().unwrap_or("-")
            );
            for (cost_type, value) in &costs {
                println!("  {cost_type}: {value:.2}");
            }
            Ok(())
        }
    }
}
