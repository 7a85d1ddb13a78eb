use crate::config::{BoardConfig, BoardSettings, CONFIG_FILE};
use crate::error::BoardError;
use crate::model::Persona;
use crate::storage::FileBackend;
use crate::validation::validate_dev_count;
use anyhow::Result;
use colored::Colorize;

pub fn handle_init(
    path: String,
    name_prefix: String,
    field_prefix: String,
    persona: Persona,
    dev_count: u32,
) -> Result<()> {
    validate_dev_count(dev_count)?;
    let cwd = std::env::current_dir()?;
    let config_path = cwd.join(CONFIG_FILE);

    if config_path.exists() {
        return Err(BoardError::AlreadyInitialized(config_path.display().to_string()).into());
    }

    let config = BoardConfig {
        board: BoardSettings {
            path,
            name_prefix,
            field_prefix,
            persona,
            dev_count,
            ..BoardSettings::default()
        },
        required_fields: Default::default(),
    };

    let backend = FileBackend::new(&config, &cwd);
    backend.init()?;
    config.save(&config_path)?;

    println!(
        "{} delivery board in {}",
        "Initialized".green(),
        cwd.display()
    );
    println!("  Config: {}", config_path.display());
    println!("  Data:   {}", backend.data_path().display());

    Ok(())
}
