use crate::error::AppError;
use std::path::PathBuf;

pub mod json_store;

pub use json_store::{PlannerState, load_state, save_state, store_path};

/// `$env_var` when set, else `<app data dir>/dayplan/<file_name>`.
pub(crate) fn app_file(env_var: &str, file_name: &str) -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(env_var)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    let base = if cfg!(windows) {
        std::env::var("APPDATA")
            .map(PathBuf::from)
            .map_err(|_| AppError::invalid_data("APPDATA is not set"))?
    } else {
        std::env::var("HOME")
            .map(|home| PathBuf::from(home).join(".config"))
            .map_err(|_| AppError::invalid_data("HOME is not set"))?
    };
    Ok(base.join("dayplan").join(file_name))
}
