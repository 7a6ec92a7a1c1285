use crate::debug;
use crate::error::{Result, TfError};
use crate::exec::{Executor, ProcessRunner, Runner};
use crate::model::{BranchPath, HistoryEntry, PendingChange};
use crate::parse::{
    parse_branches, parse_brief_status_counted, parse_detailed_status, parse_history,
};
use crate::paths::{PathNormalizer, strip_changeset_suffix, with_changeset};
use crate::workspace::{self, Binding, WorkspaceSpec};
use std::fs;
use std::path::{Path, PathBuf};

/// `tf resolve /auto:` strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ResolveStrategy {
    AcceptTheirs,
    AcceptYours,
    AcceptMerge,
    AcceptYoursRenameTheirs,
    OverwriteLocal,
}

impl ResolveStrategy {
    fn as_tf(self) -> &'static str {
        match self {
            ResolveStrategy::AcceptTheirs => "AcceptTheirs",
            ResolveStrategy::AcceptYours => "AcceptYours",
            ResolveStrategy::AcceptMerge => "AcceptMerge",
            ResolveStrategy::AcceptYoursRenameTheirs => "AcceptYoursRenameTheirs",
            ResolveStrategy::OverwriteLocal => "OverwriteLocal",
        }
    }
}

/// the workspace a client operates on
#[derive(Debug, Clone)]
pub struct WorkspaceSettings {
    pub local_root: PathBuf,
    pub server_root: Option<String>,
    pub workspace: Option<String>,
    pub collection: Option<String>,
    pub history_window: u32,
}

/// records plus the number of characters skipped as unrecognisable
type StatusParser = fn(&str) -> (Vec<PendingChange>, usize);

fn parse_detailed_counted(text: &str) -> (Vec<PendingChange>, usize) {
    (parse_detailed_status(text), 0)
}

/// typed front for the tf operations the tool supports
///
/// every call shells out afresh; nothing is cached between calls.
pub struct TfClient<R: Runner = ProcessRunner> {
    exec: Executor<R>,
    paths: PathNormalizer,
    settings: WorkspaceSettings,
}

impl<R: Runner> TfClient<R> {
    pub fn new(exec: Executor<R>, settings: WorkspaceSettings, cwd: PathBuf) -> Self {
        let paths = PathNormalizer::new(
            settings.server_root.clone(),
            settings.local_root.clone(),
            cwd,
        );
        Self {
            exec,
            paths,
            settings,
        }
    }

    pub fn executor(&self) -> &Executor<R> {
        &self.exec
    }

    fn root_arg(&self) -> String {
        self.settings.local_root.to_string_lossy().into_owned()
    }

    fn collection_arg(&self) -> Option<String> {
        self.settings
            .collection
            .as_ref()
            .map(|url| format!("/collection:{url}"))
    }

    /// server paths pass through, anything else becomes an absolute local path
    fn itemspec(&self, path: &str) -> String {
        if path.starts_with("$/") {
            path.to_string()
        } else {
            self.paths.to_local(path).to_string_lossy().into_owned()
        }
    }

    /// server path for items that may not exist locally yet (branch and merge
    /// targets); paths outside the mapping fall back to `itemspec`
    fn server_itemspec(&self, path: &str) -> String {
        self.paths
            .to_server(path)
            .unwrap_or_else(|| self.itemspec(path))
    }

    /// item to scope history queries to: the given path, else the server root,
    /// else the local root
    fn history_scope(&self, path: Option<&str>) -> String {
        match path {
            Some(path) => self.itemspec(path),
            None => self
                .settings
                .server_root
                .clone()
                .unwrap_or_else(|| self.root_arg()),
        }
    }

    fn trace(&self, message: &str) {
        if self.exec.trace() {
            debug!("{}", message);
        }
    }

    /// map the local root into the configured workspace, skipped when the
    /// workspace name, collection or server root is unknown
    pub fn ensure_workspace(&self) -> Result<Option<Binding>> {
        let (Some(name), Some(collection), Some(server_root)) = (
            self.settings.workspace.as_deref(),
            self.settings.collection.as_deref(),
            self.settings.server_root.as_deref(),
        ) else {
            self.trace("workspace, collection or server root not configured, skipping mapping");
            return Ok(None);
        };
        let spec = WorkspaceSpec {
            name,
            collection,
            server_root,
            local_root: &self.settings.local_root,
        };
        workspace::ensure_mapped(&self.exec, &spec).map(Some)
    }

    pub fn get_latest(&self) -> Result<()> {
        self.exec
            .run(&[
                "get".to_string(),
                self.root_arg(),
                "/recursive".to_string(),
                "/noprompt".to_string(),
            ])
            .map(|_| ())
    }

    /// query variants, most verbose first, each a more qualified repeat of the
    /// same status query
    fn status_attempts(&self) -> Vec<(&'static str, Vec<String>, StatusParser)> {
        let base = |format: &str| {
            vec![
                "status".to_string(),
                self.root_arg(),
                "/recursive".to_string(),
                format!("/format:{format}"),
                "/noprompt".to_string(),
            ]
        };

        let mut attempts: Vec<(&'static str, Vec<String>, StatusParser)> = vec![
            ("detailed", base("detailed"), parse_detailed_counted),
            ("brief", base("brief"), parse_brief_status_counted),
        ];
        if let Some(workspace) = &self.settings.workspace {
            let mut args = base("brief");
            args.push(format!("/workspace:{workspace}"));
            attempts.push(("brief with workspace", args, parse_brief_status_counted));
        }
        if let Some(collection) = self.collection_arg() {
            let mut args = base("brief");
            if let Some(workspace) = &self.settings.workspace {
                args.push(format!("/workspace:{workspace}"));
            }
            args.push(collection);
            attempts.push(("brief with collection", args, parse_brief_status_counted));
        }
        attempts
    }

    /// pending changes with local paths; empty when every query variant fails
    /// or yields nothing
    pub fn pending_changes(&self) -> Vec<PendingChange> {
        for (label, args, parse) in self.status_attempts() {
            match self.exec.run(&args) {
                Ok(out) => {
                    let (changes, unparsed) = parse(&out);
                    if unparsed > 0 {
                        self.trace(&format!(
                            "status ({label}) skipped {unparsed} characters of unrecognised output"
                        ));
                    }
                    if !changes.is_empty() {
                        return changes
                            .into_iter()
                            .map(|change| PendingChange {
                                file: self.paths.to_local(&change.file).to_string_lossy().into_owned(),
                                action: change.action,
                            })
                            .collect();
                    }
                    self.trace(&format!("status ({label}) yielded no changes"));
                }
                Err(e) => self.trace(&format!("status ({label}) failed: {e}")),
            }
        }
        Vec::new()
    }

    pub fn add(&self, paths: &[String]) -> Result<()> {
        let mut args = vec!["add".to_string()];
        args.extend(paths.iter().map(|p| self.itemspec(p)));
        args.push("/noprompt".to_string());
        self.exec.run(&args).map(|_| ())
    }

    /// check in `files`, or every pending change under the local root
    pub fn checkin(&self, comment: &str, files: &[String]) -> Result<()> {
        let mut args = vec![
            "checkin".to_string(),
            format!("/comment:{comment}"),
            "/noprompt".to_string(),
        ];
        if files.is_empty() {
            args.push("/recursive".to_string());
            args.push(self.root_arg());
        } else {
            args.extend(files.iter().map(|f| self.itemspec(f)));
        }
        self.exec.run(&args).map(|_| ())
    }

    /// undo `paths`, or every pending change under the local root
    pub fn undo(&self, paths: &[String]) -> Result<()> {
        let mut args = vec!["undo".to_string(), "/noprompt".to_string()];
        if paths.is_empty() {
            args.push("/recursive".to_string());
            args.push(self.root_arg());
        } else {
            args.extend(paths.iter().map(|p| self.itemspec(p)));
        }
        self.exec.run(&args).map(|_| ())
    }

    /// branches related to `root` (defaults to the server root)
    pub fn branches(&self, root: Option<&str>) -> Result<Vec<BranchPath>> {
        let target = match root {
            Some(root) => self.itemspec(root),
            None => self.settings.server_root.clone().ok_or_else(|| {
                TfError::Config("no server root configured, pass a path".to_string())
            })?,
        };
        let mut args = vec!["branches".to_string(), target];
        args.extend(self.collection_arg());
        Ok(parse_branches(&self.exec.run(&args)?))
    }

    /// pend a branch of `source` to `target`, optionally from a changeset
    pub fn create_branch(&self, source: &str, target: &str, version: Option<u64>) -> Result<()> {
        let mut args = vec![
            "branch".to_string(),
            self.server_itemspec(source),
            self.server_itemspec(target),
        ];
        args.extend(version.map(|id| format!("/version:C{id}")));
        args.push("/noprompt".to_string());
        self.exec.run(&args).map(|_| ())
    }

    /// merge `source` into `target`; with `changeset` only that changeset is merged
    pub fn merge(&self, source: &str, target: &str, changeset: Option<u64>) -> Result<()> {
        let mut args = vec![
            "merge".to_string(),
            self.server_itemspec(source),
            self.server_itemspec(target),
            "/recursive".to_string(),
        ];
        args.extend(changeset.map(|id| format!("/version:C{id}~C{id}")));
        args.push("/noprompt".to_string());
        self.exec.run(&args).map(|_| ())
    }

    pub fn resolve(&self, path: Option<&str>, strategy: ResolveStrategy) -> Result<()> {
        let item = match path {
            Some(path) => self.itemspec(path),
            None => self.root_arg(),
        };
        self.exec
            .run(&[
                "resolve".to_string(),
                item,
                "/recursive".to_string(),
                format!("/auto:{}", strategy.as_tf()),
                "/noprompt".to_string(),
            ])
            .map(|_| ())
    }

    /// newest first, as tf prints it
    pub fn history(&self, path: Option<&str>, limit: u32) -> Result<Vec<HistoryEntry>> {
        let out = self.exec.run(&[
            "history".to_string(),
            self.history_scope(path),
            "/recursive".to_string(),
            "/format:detailed".to_string(),
            "/noprompt".to_string(),
            format!("/stopafter:{limit}"),
        ])?;
        Ok(parse_history(&out))
    }

    /// a single changeset, `None` when neither query knows it
    pub fn changeset(&self, id: u64) -> Result<Option<HistoryEntry>> {
        let scoped = vec![
            "history".to_string(),
            self.history_scope(None),
            "/recursive".to_string(),
            "/format:detailed".to_string(),
            "/noprompt".to_string(),
            format!("/version:C{id}~C{id}"),
        ];
        let mut direct = vec!["changeset".to_string(), id.to_string(), "/noprompt".to_string()];
        direct.extend(self.collection_arg());

        let mut last_error = None;
        let mut answered = false;
        for args in [scoped, direct] {
            match self.exec.run(&args) {
                Ok(out) => {
                    answered = true;
                    if let Some(entry) = parse_history(&out)
                        .into_iter()
                        .find(|entry| entry.changeset_id == id)
                    {
                        return Ok(Some(entry));
                    }
                }
                Err(e) => {
                    self.trace(&format!("changeset {id} lookup failed: {e}"));
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if !answered => Err(e),
            _ => Ok(None),
        }
    }

    /// nearest changeset below `before` that touched `path`, looking at most
    /// `history_window` changesets back; approximate when history is sparse or
    /// the item was renamed
    pub fn previous_revision(&self, path: &str, before: u64) -> Result<Option<u64>> {
        let out = self.exec.run(&[
            "history".to_string(),
            self.itemspec(strip_changeset_suffix(path)),
            "/format:detailed".to_string(),
            "/noprompt".to_string(),
            format!("/version:C{before}"),
            format!("/stopafter:{}", self.settings.history_window),
        ])?;
        Ok(parse_history(&out)
            .iter()
            .map(|entry| entry.changeset_id)
            .filter(|&id| id < before)
            .max())
    }

    /// write `path` as of `changeset` to a temporary file and return its path;
    /// the file outlives this call and belongs to the caller
    pub fn file_at_revision(&self, path: &str, changeset: u64) -> Result<PathBuf> {
        let bare = strip_changeset_suffix(path);
        let suffix = match Path::new(bare).extension() {
            Some(ext) => format!(".C{changeset}.{}", ext.to_string_lossy()),
            None => format!(".C{changeset}"),
        };
        let target = tempfile::Builder::new()
            .prefix("tfvc-")
            .suffix(&suffix)
            .tempfile()?
            .into_temp_path()
            .keep()
            .map_err(|e| TfError::Io(e.error))?;

        let mut args = vec![
            "view".to_string(),
            with_changeset(&self.itemspec(bare), changeset),
            format!("/output:{}", target.display()),
            "/noprompt".to_string(),
        ];
        args.extend(self.collection_arg());

        if let Err(e) = self.exec.run(&args) {
            let _ = fs::remove_file(&target);
            return Err(e);
        }
        Ok(target)
    }

    /// pend the inverse of changeset `id` in the workspace
    pub fn rollback(&self, id: u64) -> Result<()> {
        self.exec
            .run(&[
                "rollback".to_string(),
                format!("/changeset:C{id}"),
                "/recursive".to_string(),
                self.root_arg(),
                "/noprompt".to_string(),
            ])
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests;
