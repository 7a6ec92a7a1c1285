// executor
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 50 * 1024 * 1024;
#[cfg(windows)]
pub const DEFAULT_TF_PATH: &str = "TF.exe";
#[cfg(not(windows))]
pub const DEFAULT_TF_PATH: &str = "tf";

// output fragments that mean the cached credentials were rejected
pub const AUTH_FAILURE_SIGNATURES: &[&str] = &[
    "tf30063",
    "tf30064",
    "tf30076",
    "tf31003",
    "tf400813",
    "not authorized",
    "unauthorized",
    "authentication failed",
];

// parsing
pub const STATUS_WRAP_BUFFER_LIMIT: usize = 500;

// history
pub const DEFAULT_HISTORY_WINDOW: u32 = 50;
pub const DEFAULT_HISTORY_LIMIT: u32 = 25;

// ui
pub const MAX_ITEMS_TO_SHOW: usize = 20;
pub const COMMENT_PREVIEW_LENGTH: usize = 72;
