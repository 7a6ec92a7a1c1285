//! shell out to the TFVC command line (`tf`), parse what it prints into typed
//! records and hand them to a presentation layer

pub mod ui;

pub mod client;
pub mod config;
pub mod constants;
pub mod context;
pub mod error;
pub mod exec;
pub mod model;
pub mod parse;
pub mod paths;
pub mod workspace;

pub use client::{ResolveStrategy, TfClient, WorkspaceSettings};
pub use config::Config;
pub use context::AppContext;
pub use error::{Result, TfError};
pub use model::{BranchPath, ChangeKind, HistoryEntry, HistoryItem, PendingChange};
