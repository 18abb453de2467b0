//! Path utilities

use std::path::PathBuf;

/// Data directory (~/.baton), or `.baton` in the working directory when
/// no home directory can be found
pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".baton"))
        .unwrap_or_else(|| PathBuf::from(".baton"))
}

/// Config file location
pub fn config_path() -> PathBuf {
    data_dir().join("config.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_path_inside_data_dir() {
        let path = config_path();
        assert!(path.starts_with(data_dir()));
        assert_eq!(path.file_name().unwrap(), "config.json");
    }

    #[test]
    fn test_data_dir_name() {
        assert!(data_dir().ends_with(".baton"));
    }
}
