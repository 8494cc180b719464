use anyhow::{Context, Result};
use geodata_import::{
    cli::{Cli, Commands},
    config::ImportConfig,
    import::{prune_empty, Importer},
    model::Level,
    source::SourceDir,
    ConsoleUi, GeoStore, SqliteStore, Ui,
};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let log_level = std::env::var("GEODATA_LOG").unwrap_or_else(|_| "warn".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&log_level))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse_args();

    match cli.command {
        Commands::Import {
            locations,
            languages,
            no_prune,
            quiet,
        } => {
            let mut config = locations.resolve()?;
            if let Some(languages) = languages {
                config = config.with_languages(languages);
            }
            if no_prune {
                config.prune = false;
            }

            run_import(&config, &mut console(quiet))?;
        }

        Commands::Prune { locations, quiet } => {
            let config = locations.resolve()?;
            let mut store = open_store(&config)?;
            let pruned = prune_empty(&mut store, &mut console(quiet), config.progress_interval)
                .context("Failed to prune database")?;
            println!(
                "Removed {} regions and {} provinces without cities",
                pruned.regions, pruned.provinces
            );
        }

        Commands::Stats { locations } => {
            let config = locations.resolve()?;
            let store = open_store(&config)?;
            println!("{:<12} {:>10} {:>10}", "level", "entities", "names");
            for level in Level::ALL {
                println!(
                    "{:<12} {:>10} {:>10}",
                    level.plural(),
                    store.count_entities(level)?,
                    store.count_names(level)?
                );
            }
            println!("{:<12} {:>10}", "Time zones", store.count_time_zones()?);
        }

        Commands::Languages { locations } => {
            let config = locations.resolve()?;
            let source = SourceDir::new(&config.data_dir);
            let languages = source
                .available_languages()
                .with_context(|| format!("Failed to scan {:?}", config.data_dir))?;
            println!("Languages with source files in {:?}:\n", config.data_dir);
            for language in languages {
                println!("  {}", language);
            }
        }
    }

    Ok(())
}

fn console(quiet: bool) -> ConsoleUi {
    if quiet {
        ConsoleUi::hidden()
    } else {
        ConsoleUi::new()
    }
}

fn open_store(config: &ImportConfig) -> Result<SqliteStore> {
    SqliteStore::open(&config.database)
        .with_context(|| format!("Failed to open database {:?}", config.database))
}

fn run_import(config: &ImportConfig, ui: &mut impl Ui) -> Result<()> {
    let start = Instant::now();
    let mut store = open_store(config)?;

    ui.log("Importing new data ... This action may take some minutes.");
    let importer = Importer::new(&mut store, ui, config)?;
    let summary = importer.run()?;
    store.finalize()?;

    println!("\n{}", summary);
    println!(
        "\nImported into {:?} in {:.1}s",
        config.database,
        start.elapsed().as_secs_f64()
    );
    Ok(())
}
