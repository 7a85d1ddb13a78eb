mod board;
mod create;
mod deps;
mod eta;
mod init;
mod options;
mod show;
mod transition;
mod utils;
mod validate;

pub use board::{BoardArgs, handle_board};
pub use create::handle_create;
pub use deps::{handle_block, handle_blockers, handle_unblock};
pub use eta::handle_eta;
pub use init::handle_init;
pub use options::handle_options;
pub use show::handle_show;
pub use transition::{handle_drop, handle_move};
pub use validate::handle_validate;

use crate::board::{Board, BoardOptions};
use crate::cli::Selection;
use crate::config::BoardConfig;
use crate::error::BoardError;
use crate::storage::FileBackend;
use crate::workflow::WorkflowConfig;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Common context passed to all command handlers
pub struct CommandContext {
    pub config: BoardConfig,
    pub root: PathBuf,
    pub workflow: WorkflowConfig,
}

impl CommandContext {
    /// Load from an explicit config file, or search upward from the
    /// working directory.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let (config, root) = match config_path {
            Some(path) => {
                let path = Path::new(path);
                let config = BoardConfig::load_file(path)
                    .with_context(|| format!("Failed to load config from {}", path.display()))?;
                let root = path
                    .parent()
                    .filter(|p| !p.as_os_str().is_empty())
                    .map(Path::to_path_buf)
                    .unwrap_or(std::env::current_dir()?);
                (config, root)
            }
            None => BoardConfig::load(&std::env::current_dir()?)?,
        };
        let workflow = config
            .workflow(&root)
            .context("Failed to load workflow overrides")?;
        Ok(Self {
            config,
            root,
            workflow,
        })
    }

    pub fn backend(&self) -> FileBackend {
        FileBackend::new(&self.config, &self.root)
    }

    pub fn options(&self, selection: &Selection) -> BoardOptions {
        let mut options = BoardOptions::from_settings(&self.config.board);
        if let Some(persona) = selection.persona {
            options.persona = persona.into();
        }
        if let Some(view) = selection.view {
            options.view = view.into();
        }
        options
    }

    /// A board over the project's data, already refreshed.
    pub async fn board(&self, options: BoardOptions) -> Board<FileBackend> {
        let mut board = Board::new(self.backend(), &self.workflow, options);
        board.refresh().await;
        board
    }
}

/// Resolve a ticket number or id to the stored id.
pub(crate) fn resolve_ticket(board: &Board<FileBackend>, id: &str) -> Result<String> {
    board
        .ticket(id)
        .map(|t| t.id.clone())
        .ok_or_else(|| BoardError::NotFound(id.to_string()).into())
}
