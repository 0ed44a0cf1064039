use anyhow::{Context, Result};
use ssreports::{config::FileMakerConfig, logging::init_tracing, prepare};
use std::path::Path;
use tracing::info;

const CONFIG_FILE: &str = "config.json";

fn main() -> Result<()> {
    init_tracing();

    let config = FileMakerConfig::load(Path::new(CONFIG_FILE))?;
    let summary = prepare::run(&config).context("preparing call list")?;

    info!(
        read = summary.read,
        skipped = summary.skipped,
        "numbers found in the checklist or blacklist were skipped"
    );
    for path in &summary.outputs {
        println!("Файл {} готов", path.display());
    }
    println!("Шаблон {} очищен", summary.template.display());
    Ok(())
}
