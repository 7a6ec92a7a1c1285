use crate::constants::{DEFAULT_HISTORY_WINDOW, DEFAULT_MAX_OUTPUT_BYTES, DEFAULT_TF_PATH};
use crate::error::{Result, TfError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// how tf authenticates; credentials are never passed on the command line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    /// operating system integrated (windows) authentication
    #[default]
    Integrated,
}

/// configuration snapshot, read once at startup and never mutated afterwards
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// team project collection url
    pub server_url: Option<String>,
    pub project: Option<String>,
    pub workspace: Option<String>,
    pub tf_path: PathBuf,
    /// local directory mapped to `server_root`; defaults to the current directory
    pub local_root: Option<PathBuf>,
    /// defaults to `$/<project>`
    pub server_root: Option<String>,
    pub auth: AuthMode,
    pub max_output_bytes: usize,
    pub timeout_secs: Option<u64>,
    /// extra environment for every tf invocation
    pub env: BTreeMap<String, String>,
    /// how many changesets to scan when looking for a previous revision
    pub history_window: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: None,
            project: None,
            workspace: None,
            tf_path: PathBuf::from(DEFAULT_TF_PATH),
            local_root: None,
            server_root: None,
            auth: AuthMode::Integrated,
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
            timeout_secs: None,
            env: BTreeMap::new(),
            history_window: DEFAULT_HISTORY_WINDOW,
        }
    }
}

/// values supplied on the command line, applied over the file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub tf_path: Option<PathBuf>,
    pub local_root: Option<PathBuf>,
    pub workspace: Option<String>,
    pub server_url: Option<String>,
    pub server_root: Option<String>,
}

impl Config {
    /// `<config dir>/tfvc-cli/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tfvc-cli").join("config.json"))
    }

    /// read `explicit`, or the default location if it exists, or fall back to
    /// built-in defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Some(path) if path.is_file() => path,
                _ => return Ok(Self::default()),
            },
        };
        let text = fs::read_to_string(&path)
            .map_err(|e| TfError::Config(format!("failed to read {}: {e}", path.display())))?;
        Self::from_json(&text)
            .map_err(|e| TfError::Config(format!("{}: {e}", path.display())))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn apply(&mut self, overrides: Overrides) -> Result<()> {
        if let Some(tf_path) = overrides.tf_path {
            self.tf_path = tf_path;
        }
        if let Some(local_root) = overrides.local_root {
            self.local_root = Some(local_root);
        }
        if let Some(workspace) = overrides.workspace {
            self.workspace = Some(workspace);
        }
        if let Some(server_url) = overrides.server_url {
            self.server_url = Some(server_url);
        }
        if let Some(server_root) = overrides.server_root {
            self.server_root = Some(server_root);
        }
        self.validate()
    }

    fn validate(&self) -> Result<()> {
        if let Some(root) = self.server_root()
            && !root.starts_with("$/")
        {
            return Err(TfError::Config(format!(
                "server root must start with $/, got {root}"
            )));
        }
        if self.max_output_bytes == 0 {
            return Err(TfError::Config("max_output_bytes must be positive".to_string()));
        }
        Ok(())
    }

    /// explicit server root, else `$/<project>`
    pub fn server_root(&self) -> Option<String> {
        self.server_root
            .clone()
            .or_else(|| self.project.as_ref().map(|project| format!("$/{project}")))
    }

    pub fn local_root(&self, cwd: &Path) -> PathBuf {
        match &self.local_root {
            Some(root) if root.is_absolute() => root.clone(),
            Some(root) => cwd.join(root),
            None => cwd.to_path_buf(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config = Config::from_json(r#"{"project": "Proj", "workspace": "alice-dev"}"#).unwrap();
        assert_eq!(config.server_root().as_deref(), Some("$/Proj"));
        assert_eq!(config.workspace.as_deref(), Some("alice-dev"));
        assert_eq!(config.tf_path, PathBuf::from(DEFAULT_TF_PATH));
        assert_eq!(config.auth, AuthMode::Integrated);
        assert_eq!(config.history_window, DEFAULT_HISTORY_WINDOW);
        assert_eq!(config.timeout_secs, None);
    }

    #[test]
    fn test_explicit_server_root_wins_over_project() {
        let config =
            Config::from_json(r#"{"project": "Proj", "server_root": "$/Proj/Main"}"#).unwrap();
        assert_eq!(config.server_root().as_deref(), Some("$/Proj/Main"));
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(Config::from_json(r#"{"server_root": "Proj/Main"}"#).is_err());
        assert!(Config::from_json(r#"{"auth": "basic"}"#).is_err());
        assert!(Config::from_json(r#"{"max_output_bytes": 0}"#).is_err());
    }

    #[test]
    fn test_overrides_take_precedence() {
        let mut config = Config::from_json(r#"{"workspace": "from-file", "tf_path": "/opt/tf"}"#).unwrap();
        config
            .apply(Overrides {
                workspace: Some("from-flag".to_string()),
                ..Overrides::default()
            })
            .unwrap();
        assert_eq!(config.workspace.as_deref(), Some("from-flag"));
        assert_eq!(config.tf_path, PathBuf::from("/opt/tf"));
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"server_url": "https://tfs.example.com/tfs/DefaultCollection"}"#).unwrap();
        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(
            config.server_url.as_deref(),
            Some("https://tfs.example.com/tfs/DefaultCollection")
        );

        let missing = dir.path().join("missing.json");
        assert!(matches!(Config::load(Some(&missing)), Err(TfError::Config(_))));
    }

    #[test]
    fn test_local_root_resolution() {
        let cwd = Path::new("/home/alice/code");
        let mut config = Config::default();
        assert_eq!(config.local_root(cwd), PathBuf::from("/home/alice/code"));
        config.local_root = Some(PathBuf::from("ws"));
        assert_eq!(config.local_root(cwd), PathBuf::from("/home/alice/code/ws"));
        config.local_root = Some(PathBuf::from("/srv/ws"));
        assert_eq!(config.local_root(cwd), PathBuf::from("/srv/ws"));
    }
}
