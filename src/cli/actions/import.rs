use crate::{
    db::{self, DatabaseUrl},
    stocks::import::import_file,
};
use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug)]
pub struct Args {
    pub database_url: String,
    pub file: PathBuf,
}

/// Execute the import action.
/// # Errors
/// Returns an error if the database is unreachable or any row is invalid.
pub async fn execute(args: Args) -> Result<()> {
    let database_url = DatabaseUrl::parse(&args.database_url).context("Invalid DATABASE_URL")?;
    let pool = db::connect(&database_url).await?;

    let imported = import_file(&pool, &args.file)
        .await
        .with_context(|| format!("Failed to import {}", args.file.display()))?;

    info!("Imported {imported} stocks from {}", args.file.display());
    println!("{imported} stocks imported");

    pool.close().await;
    Ok(())
}
