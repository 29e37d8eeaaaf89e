use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    fn state_dir() -> PathBuf {
        if let Ok(home) = std::env::var("HOME") {
            PathBuf::from(home)
                .join(".local")
                .join("state")
                .join("typemeteor")
        } else if let Some(proj_dirs) = ProjectDirs::from("", "", "typemeteor") {
            proj_dirs.data_local_dir().to_path_buf()
        } else {
            PathBuf::from(".")
        }
    }

    pub fn leaderboard_db_path() -> PathBuf {
        Self::state_dir().join("leaderboard.db")
    }

    pub fn leaderboard_json_path() -> PathBuf {
        Self::state_dir().join("database.json")
    }

    pub fn config_path() -> PathBuf {
        if let Some(pd) = ProjectDirs::from("", "", "typemeteor") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("typemeteor_config.json")
        }
    }
}
