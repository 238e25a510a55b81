//! Configuration utility functions.

use std::path::{Path, PathBuf};

/// Find config file by searching upward from current directory
///
/// An absolute `config_name` is used as is. Otherwise starts from cwd and
/// walks up parent directories until finding `config_name`.
///
/// # Example
/// ```text
/// /home/user/site/static/css/   ← cwd
/// /home/user/site/reserve.toml  ← found!
/// ```
pub fn find_config_file(config_name: &Path) -> Option<PathBuf> {
    if config_name.is_absolute() {
        return config_name.exists().then(|| config_name.to_path_buf());
    }

    let cwd = std::env::current_dir().ok()?;
    find_upward(&cwd, config_name)
}

fn find_upward(start: &Path, config_name: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(config_name))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_find_upward() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("static").join("css");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join("reserve.toml"), "").unwrap();

        assert_eq!(
            find_upward(&nested, Path::new("reserve.toml")),
            Some(dir.path().join("reserve.toml"))
        );
        assert!(find_upward(&nested, Path::new("missing.toml")).is_none());
    }

    #[test]
    fn test_absolute_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dev.toml");
        assert!(find_config_file(&path).is_none());
        fs::write(&path, "").unwrap();
        assert_eq!(find_config_file(&path), Some(path));
    }
}
