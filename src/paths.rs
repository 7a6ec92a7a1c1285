use regex::Regex;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

static CHANGESET_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i);C\d+$").expect("valid changeset suffix regex"));
static DRIVE_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z]:[\\/]").expect("valid drive regex"));

/// drop a trailing `;C<id>` version qualifier
pub fn strip_changeset_suffix(path: &str) -> &str {
    match CHANGESET_SUFFIX.find(path) {
        Some(m) => &path[..m.start()],
        None => path,
    }
}

/// `$/Proj/File.cs` + 42 -> `$/Proj/File.cs;C42`
pub fn with_changeset(path: &str, changeset: u64) -> String {
    format!("{};C{changeset}", strip_changeset_suffix(path))
}

fn is_local_absolute(path: &str) -> bool {
    Path::new(path).is_absolute() || DRIVE_PATH.is_match(path) || path.starts_with("\\\\")
}

/// maps server paths (`$/...`) and local paths onto the local filesystem
/// using the workspace's single server-root to local-root mapping
#[derive(Debug, Clone)]
pub struct PathNormalizer {
    server_root: Option<String>,
    local_root: PathBuf,
    cwd: PathBuf,
}

impl PathNormalizer {
    pub fn new(server_root: Option<String>, local_root: PathBuf, cwd: PathBuf) -> Self {
        let server_root = server_root.map(|root| root.trim_end_matches('/').to_string());
        Self {
            server_root,
            local_root,
            cwd,
        }
    }

    /// the part of a server path below the mapped root, if it is mapped
    fn relative_to_root<'a>(&self, server_path: &'a str) -> Option<&'a str> {
        let root = self.server_root.as_deref()?;
        let head = server_path.get(..root.len())?;
        if !head.eq_ignore_ascii_case(root) {
            return None;
        }
        let rest = &server_path[root.len()..];
        if rest.is_empty() {
            Some(rest)
        } else {
            rest.strip_prefix('/')
        }
    }

    /// canonical local path for anything tf printed or the user typed
    pub fn to_local(&self, path: &str) -> PathBuf {
        let path = strip_changeset_suffix(path.trim());

        if let Some(server_rest) = path.strip_prefix("$/") {
            let (base, rest) = match self.relative_to_root(path) {
                Some(rest) => (&self.local_root, rest),
                None => (&self.cwd, server_rest),
            };
            return rest
                .split('/')
                .filter(|segment| !segment.is_empty())
                .fold(base.clone(), |acc, segment| acc.join(segment));
        }

        if is_local_absolute(path) {
            PathBuf::from(path)
        } else {
            self.cwd.join(path)
        }
    }

    /// server path for a local path under the mapped root; branch and merge
    /// name their items this way since a target may not exist locally yet
    pub fn to_server(&self, path: &str) -> Option<String> {
        let path = strip_changeset_suffix(path.trim());
        if path.starts_with("$/") {
            return Some(path.to_string());
        }
        let root = self.server_root.as_deref()?;
        let local = self.to_local(path);
        let rest = local.strip_prefix(&self.local_root).ok()?;
        let mut segments: Vec<String> = Vec::new();
        for component in rest.components() {
            match component {
                Component::Normal(name) => segments.push(name.to_string_lossy().into_owned()),
                Component::ParentDir => {
                    segments.pop()?;
                }
                _ => {}
            }
        }
        if segments.is_empty() {
            Some(root.to_string())
        } else {
            Some(format!("{root}/{}", segments.join("/")))
        }
    }
}
