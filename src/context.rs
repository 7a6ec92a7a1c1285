use crate::client::{TfClient, WorkspaceSettings};
use crate::config::Config;
use crate::exec::{Executor, ProcessRunner};
use std::path::PathBuf;
use std::time::Duration;

/// application context handed to whatever presents results; replaces any
/// process-wide executor or view handles
pub struct AppContext {
    /// configuration snapshot, read-only once loaded
    pub config: Config,

    pub client: TfClient<ProcessRunner>,

    /// print records as JSON instead of text
    pub json: bool,

    /// skip confirmation prompts
    pub assume_yes: bool,
}

impl AppContext {
    pub fn new(config: Config, cwd: PathBuf, trace: bool, json: bool, assume_yes: bool) -> Self {
        let local_root = config.local_root(&cwd);
        let runner = ProcessRunner {
            max_output_bytes: config.max_output_bytes,
            timeout: config.timeout_secs.map(Duration::from_secs),
        };
        let exec = Executor::new(runner, config.tf_path.clone(), local_root.clone())
            .with_env(config.env.clone().into_iter().collect())
            .with_collection(config.server_url.clone())
            .with_trace(trace);
        let settings = WorkspaceSettings {
            local_root,
            server_root: config.server_root(),
            workspace: config.workspace.clone(),
            collection: config.server_url.clone(),
            history_window: config.history_window,
        };

        Self {
            client: TfClient::new(exec, settings, cwd),
            config,
            json,
            assume_yes,
        }
    }
}
