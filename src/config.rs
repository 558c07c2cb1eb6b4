use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use serde::Deserialize;

pub const CONFIG_FILE: &str = ".faceloader.json";

/// Runtime configuration. The JSON file keeps the PascalCase keys the tool has
/// always used, so `{"FacebookPage": "...", "Username": "..."}` round-trips.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Config {
    /// URL of the page's events listing.
    pub facebook_page: String,
    /// Explicit Chrome binary; autodetected when unset.
    pub chrome_path: Option<PathBuf>,
    pub username: String,
    pub password: String,
    /// Keep the browser visible.
    pub debug: bool,
}

impl Config {
    /// Read the config file. An explicit `path` must exist; otherwise the file
    /// is looked up in the working directory and then `$HOME`, and defaults
    /// apply when neither has one.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path.map(Path::to_path_buf).or_else(discover) else {
            return Ok(Self::default());
        };
        let file = File::open(&path)?;
        let reader = BufReader::new(file);
        let config = serde_json::from_reader(reader)?;
        tracing::info!(target: "config", "loaded {}", path.display());
        Ok(config)
    }

    #[must_use]
    pub const fn headless(&self) -> bool {
        !self.debug
    }
}

fn discover() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILE);
    if local.is_file() {
        return Some(local);
    }
    let home = std::env::var_os("HOME")?;
    let home = Path::new(&home).join(CONFIG_FILE);
    home.is_file().then_some(home)
}

#[cfg(test)]
mod tests {
    use super::Config;

    #[test]
    fn parses_pascal_case_keys() {
        let config: Config = serde_json::from_str(
            r#"{
                "FacebookPage": "https://www.facebook.com/example/events",
                "ChromePath": "/usr/bin/chromium",
                "Username": "someone@example.org",
                "Password": "hunter2",
                "Debug": true
            }"#,
        )
        .unwrap();
        assert_eq!(
            config.facebook_page,
            "https://www.facebook.com/example/events"
        );
        assert_eq!(
            config.chrome_path.as_deref(),
            Some(std::path::Path::new("/usr/bin/chromium"))
        );
        assert_eq!(config.username, "someone@example.org");
        assert!(config.debug);
        assert!(!config.headless());
    }

    #[test]
    fn missing_keys_default() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert!(config.facebook_page.is_empty());
        assert!(config.chrome_path.is_none());
        assert!(config.headless());
    }
}
