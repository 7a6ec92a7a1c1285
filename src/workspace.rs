use crate::error::{Result, TfError};
use crate::exec::{Executor, Runner};
use std::path::Path;

/// what it took to get the local root mapped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    /// the directory was already mapped to this server folder
    AlreadyMapped(String),
    /// an existing workspace gained a mapping
    Mapped,
    /// a workspace was created and mapped
    Created,
}

/// everything needed to bind the local root
#[derive(Debug, Clone)]
pub struct WorkspaceSpec<'a> {
    pub name: &'a str,
    pub collection: &'a str,
    pub server_root: &'a str,
    pub local_root: &'a Path,
}

/// server folder of a `tf workfold` mapping line (` $/Proj: C:\ws`)
fn mapped_server_folder(workfold: &str) -> Option<String> {
    workfold.lines().find_map(|line| {
        let line = line.trim();
        let rest = line.strip_prefix("$/")?;
        let (folder, _local) = rest.split_once(": ")?;
        Some(format!("$/{folder}"))
    })
}

fn map<R: Runner>(exec: &Executor<R>, spec: &WorkspaceSpec<'_>) -> Result<()> {
    exec.run(&[
        "workfold".to_string(),
        "/map".to_string(),
        format!("/collection:{}", spec.collection),
        format!("/workspace:{}", spec.name),
        spec.server_root.to_string(),
        spec.local_root.to_string_lossy().into_owned(),
    ])
    .map(|_| ())
}

/// make sure `spec.local_root` is mapped under workspace `spec.name`
///
/// best effort: query the mapping, else map into the existing workspace, else
/// create the workspace and map it. the error names the last step that failed.
pub fn ensure_mapped<R: Runner>(exec: &Executor<R>, spec: &WorkspaceSpec<'_>) -> Result<Binding> {
    let local = spec.local_root.to_string_lossy().into_owned();
    if let Ok(out) = exec.run(&["workfold".to_string(), local])
        && let Some(folder) = mapped_server_folder(&out)
    {
        return Ok(Binding::AlreadyMapped(folder));
    }

    if map(exec, spec).is_ok() {
        return Ok(Binding::Mapped);
    }

    exec.run(&[
        "workspace".to_string(),
        "/new".to_string(),
        spec.name.to_string(),
        format!("/collection:{}", spec.collection),
        "/noprompt".to_string(),
    ])
    .map_err(|e| TfError::Workspace {
        step: "creating the workspace",
        message: e.to_string(),
    })?;

    map(exec, spec).map_err(|e| TfError::Workspace {
        step: "mapping the new workspace",
        message: e.to_string(),
    })?;

    Ok(Binding::Created)
}
