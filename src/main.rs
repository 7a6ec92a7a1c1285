mod cli;

use crate::cli::{Cli, Command};
use anyhow::{Context, Result, bail};
use num_format::{Locale, ToFormattedString};
use serde::Serialize;
use std::io::IsTerminal;
use std::path::PathBuf;
use tfvc_cli::constants::{COMMENT_PREVIEW_LENGTH, MAX_ITEMS_TO_SHOW};
use tfvc_cli::workspace::Binding;
use tfvc_cli::{AppContext, Config, HistoryEntry, PendingChange, ui};
use tfvc_cli::{debug, error, info, status, warning};

fn main() {
    if let Err(e) = run() {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse_args();

    let mut config = Config::load(cli.config.as_deref())?;
    config.apply(cli.overrides())?;
    let cwd = std::env::current_dir().context("failed to read the current directory")?;

    let ctx = AppContext::new(config, cwd, cli.verbose, cli.json, cli.yes);
    if cli.verbose {
        debug!(
            "tf: {}, server root: {}",
            ctx.config.tf_path.display(),
            ctx.config.server_root().as_deref().unwrap_or("(none)")
        );
    }
    dispatch(&ctx, cli.command)
}

fn dispatch(ctx: &AppContext, command: Command) -> Result<()> {
    let tf = &ctx.client;

    match command {
        Command::Get => {
            bind_workspace(ctx)?;
            ui::with_spinner("getting latest...", || tf.get_latest())?;
            status!("workspace is up to date");
        }

        Command::Status => {
            bind_workspace(ctx)?;
            let changes = ui::with_spinner("querying pending changes...", || tf.pending_changes());
            if ctx.json {
                print_json(&changes)?;
            } else {
                show_changes(&changes, usize::MAX);
            }
        }

        Command::Add { paths } => {
            bind_workspace(ctx)?;
            tf.add(&paths)?;
            status!("pended {} for add", count(paths.len(), "item"));
        }

        Command::Checkin { message, files } => {
            bind_workspace(ctx)?;
            if files.is_empty() {
                let changes =
                    ui::with_spinner("querying pending changes...", || tf.pending_changes());
                if changes.is_empty() {
                    bail!("no pending changes found");
                }
                show_changes(&changes, MAX_ITEMS_TO_SHOW);
            }

            let comment = match message {
                Some(message) => message,
                None => {
                    require_terminal()?;
                    status!("check-in comment:");
                    ui::edit_one_line("")?
                }
            };
            if comment.trim().is_empty() {
                bail!("check-in comment is empty");
            }

            ui::with_spinner("checking in...", || tf.checkin(&comment, &files))?;
            status!("checked in");
        }

        Command::Undo { paths } => {
            bind_workspace(ctx)?;
            if paths.is_empty() && !confirmed(ctx, "undo every pending change in the workspace?")? {
                bail!("aborted");
            }
            tf.undo(&paths)?;
            status!("undone");
        }

        Command::Branches { path } => {
            let branches = ui::with_spinner("querying branches...", || tf.branches(path.as_deref()))?;
            if ctx.json {
                print_json(&branches)?;
            } else if branches.is_empty() {
                warning!("no branches found");
            } else {
                for branch in &branches {
                    info!(branch);
                }
            }
        }

        Command::Branch {
            source,
            target,
            changeset,
        } => {
            tf.create_branch(&source, &target, changeset)?;
            status!("pended branch {source} -> {target}, check in to commit it");
        }

        Command::Merge {
            source,
            target,
            changeset,
        } => {
            ui::with_spinner("merging...", || tf.merge(&source, &target, changeset))?;
            status!("merged {source} into {target}, resolve any conflicts and check in");
        }

        Command::Resolve { path, strategy } => {
            tf.resolve(path.as_deref(), strategy)?;
            status!("conflicts resolved");
        }

        Command::History { path, limit } => {
            let entries =
                ui::with_spinner("querying history...", || tf.history(path.as_deref(), limit))?;
            if ctx.json {
                print_json(&entries)?;
            } else if entries.is_empty() {
                warning!("no history found");
            } else {
                show_history(&entries);
            }
        }

        Command::Changeset { id } => {
            let Some(entry) = ui::with_spinner("querying changeset...", || tf.changeset(id))?
            else {
                bail!("changeset {id} not found");
            };
            if ctx.json {
                print_json(&entry)?;
            } else {
                show_changeset(&entry);
            }
        }

        Command::Rollback { id } => {
            if !confirmed(ctx, &format!("roll back changeset {id}?"))? {
                bail!("aborted");
            }
            ui::with_spinner("rolling back...", || tf.rollback(id))?;
            status!("pended rollback of changeset {id}, check in to commit it");
        }

        Command::View {
            path,
            changeset,
            previous,
        } => {
            let changeset = match (changeset, previous) {
                (Some(id), _) => id,
                (None, Some(before)) => tf
                    .previous_revision(&path, before)?
                    .with_context(|| format!("no revision of {path} before changeset {before}"))?,
                (None, None) => bail!("pass --changeset or --previous"),
            };
            let file = ui::with_spinner("downloading...", || tf.file_at_revision(&path, changeset))?;
            if ctx.json {
                print_json(&ViewedFile {
                    path,
                    changeset,
                    file,
                })?;
            } else {
                info!("{}", file.display());
            }
        }

        Command::Map => match tf.ensure_workspace()? {
            Some(binding) => report_binding(&binding, true),
            None => bail!("workspace, collection and server root must be configured to map"),
        },
    }

    Ok(())
}

#[derive(Serialize)]
struct ViewedFile {
    path: String,
    changeset: u64,
    file: PathBuf,
}

/// make sure the local root is mapped before touching the working copy
fn bind_workspace(ctx: &AppContext) -> Result<()> {
    if let Some(binding) = ctx.client.ensure_workspace()?
        && !ctx.json
    {
        report_binding(&binding, false);
    }
    Ok(())
}

fn report_binding(binding: &Binding, always: bool) {
    match binding {
        Binding::AlreadyMapped(folder) if always => status!("already mapped to {folder}"),
        Binding::AlreadyMapped(_) => {}
        Binding::Mapped => status!("mapped the local root into the workspace"),
        Binding::Created => status!("created the workspace and mapped the local root"),
    }
}

fn require_terminal() -> Result<()> {
    if !std::io::stdin().is_terminal() || !std::io::stdout().is_terminal() {
        bail!("interactive terminal required");
    }
    Ok(())
}

fn confirmed(ctx: &AppContext, question: &str) -> Result<bool> {
    if ctx.assume_yes {
        return Ok(true);
    }
    require_terminal().context("pass --yes to skip confirmation")?;
    ui::confirm(question)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    info!("{}", text);
    Ok(())
}

/// "1 item", "1,204 items"
fn count(n: usize, noun: &str) -> String {
    let plural = if n == 1 { "" } else { "s" };
    format!("{} {noun}{plural}", n.to_formatted_string(&Locale::en))
}

fn show_changes(changes: &[PendingChange], limit: usize) {
    if changes.is_empty() {
        status!("no pending changes");
        return;
    }

    status!("{}:", count(changes.len(), "pending change"));
    for change in changes.iter().take(limit) {
        info!("{} {}", change.action.status_char(), change.file);
    }
    if changes.len() > limit {
        info!("(+{} more)", (changes.len() - limit).to_formatted_string(&Locale::en));
    }
    info!();
}

/// first line of a comment, cut to fit one terminal row
fn preview(comment: &str) -> String {
    let first = comment.lines().next().unwrap_or("");
    if first.chars().count() <= COMMENT_PREVIEW_LENGTH {
        first.to_string()
    } else {
        let cut: String = first.chars().take(COMMENT_PREVIEW_LENGTH - 3).collect();
        format!("{cut}...")
    }
}

fn display_date(entry: &HistoryEntry) -> String {
    match (&entry.timestamp, &entry.date) {
        (Some(timestamp), _) => timestamp.format("%Y-%m-%d %H:%M").to_string(),
        (None, Some(raw)) => raw.clone(),
        (None, None) => String::new(),
    }
}

fn show_history(entries: &[HistoryEntry]) {
    use colored::Colorize;

    for entry in entries {
        info!(
            "{} {} {} {}",
            format!("C{}", entry.changeset_id).yellow(),
            display_date(entry).dimmed(),
            entry.author.as_deref().unwrap_or("?").cyan(),
            preview(&entry.comment)
        );
    }
}

fn show_changeset(entry: &HistoryEntry) {
    status!("changeset {}", entry.changeset_id);
    info!("author: {}", entry.author.as_deref().unwrap_or("?"));
    info!("date:   {}", display_date(entry));
    info!();
    for line in entry.comment.lines() {
        info!("    {}", line);
    }
    if !entry.comment.is_empty() {
        info!();
    }

    status!("{}:", count(entry.files.len(), "item"));
    for item in entry.files.iter().take(MAX_ITEMS_TO_SHOW) {
        info!("{} {}", item.change.status_char(), item.path);
    }
    if entry.files.len() > MAX_ITEMS_TO_SHOW {
        info!("(+{} more)", entry.files.len() - MAX_ITEMS_TO_SHOW);
    }
}
