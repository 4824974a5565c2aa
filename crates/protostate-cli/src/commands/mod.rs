pub mod analyze;
pub mod titrate;

use crate::error::{CliError, Result};
use protostate::core::models::system::TitratableSystem;
use std::path::Path;
use tracing::info;

fn load_system(path: &Path) -> Result<TitratableSystem> {
    info!("Loading titratable system from {:?}", path);
    TitratableSystem::load(path).map_err(|e| CliError::FileParsing {
        path: path.to_path_buf(),
        source: e.into(),
    })
}
