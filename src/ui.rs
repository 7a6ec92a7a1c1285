use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::cell::RefCell;
use std::time::Duration;

thread_local! {
    /// spinner currently ticking on this thread, if any
    static ACTIVE_SPINNER: RefCell<Option<ProgressBar>> = const { RefCell::new(None) };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __emit {
    ($stream:ident, $color:ident, $($arg:tt)*) => {{
        use colored::Colorize;
        use std::io::{self, Write};
        let _ = writeln!(io::$stream(), "{}", format!($($arg)*).$color());
    }};
}

#[macro_export]
macro_rules! warning {
    ($fmt:literal $(, $($arg:tt)*)?) => { $crate::__emit!(stderr, yellow, $fmt $(, $($arg)*)?) };
    ($expr:expr) => { $crate::__emit!(stderr, yellow, "{}", $expr) };
}

#[macro_export]
macro_rules! error {
    ($fmt:literal $(, $($arg:tt)*)?) => { $crate::__emit!(stderr, red, $fmt $(, $($arg)*)?) };
    ($expr:expr) => { $crate::__emit!(stderr, red, "{}", $expr) };
}

#[macro_export]
macro_rules! status {
    ($fmt:literal $(, $($arg:tt)*)?) => { $crate::__emit!(stdout, green, $fmt $(, $($arg)*)?) };
    ($expr:expr) => { $crate::__emit!(stdout, green, "{}", $expr) };
}

/// dimmed diagnostics on stderr, callers decide whether tracing is enabled
#[macro_export]
macro_rules! debug {
    ($fmt:literal $(, $($arg:tt)*)?) => { $crate::__emit!(stderr, dimmed, $fmt $(, $($arg)*)?) };
    ($expr:expr) => { $crate::__emit!(stderr, dimmed, "{}", $expr) };
}

#[macro_export]
macro_rules! info {
    () => {{
        use std::io::{self, Write};
        let _ = writeln!(io::stdout());
    }};
    ($fmt:literal $(, $($arg:tt)*)?) => {{
        use std::io::{self, Write};
        let _ = writeln!(io::stdout(), $fmt $(, $($arg)*)?);
    }};
    ($expr:expr) => {{
        use std::io::{self, Write};
        let _ = writeln!(io::stdout(), "{}", $expr);
    }};
}

/// run `work` while a spinner with `message` ticks on stderr
pub fn with_spinner<T>(message: &str, work: impl FnOnce() -> T) -> T {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));

    let previous = ACTIVE_SPINNER.with(|active| active.replace(Some(spinner.clone())));
    let result = work();
    ACTIVE_SPINNER.with(|active| active.replace(previous));

    spinner.finish_and_clear();
    result
}

/// run `work` with this thread's spinner hidden, so a child process attached
/// to the terminal can prompt without being drawn over
pub fn suspend_spinner<T>(work: impl FnOnce() -> T) -> T {
    match ACTIVE_SPINNER.with(|active| active.borrow().clone()) {
        Some(spinner) => spinner.suspend(work),
        None => work(),
    }
}

/// single-key choice prompt, e.g. `[Y]ES/[n]o`; returns the lowercased first
/// character of the chosen option (enter picks the first option)
pub fn prompt(options: &[&str]) -> Result<char> {
    use crossterm::{
        event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
        terminal::{disable_raw_mode, enable_raw_mode},
    };
    use std::io::{self, Write};

    debug_assert!(!options.is_empty(), "prompt requires at least one option");

    let keys: Vec<char> = options
        .iter()
        .filter_map(|opt| opt.chars().next())
        .map(|c| c.to_ascii_lowercase())
        .collect();
    let labels: Vec<String> = options
        .iter()
        .filter_map(|opt| {
            let first = opt.chars().next()?;
            Some(format!("[{first}]{}", &opt[first.len_utf8()..]))
        })
        .collect();

    print!("{} ? ", labels.join("/"));
    let _ = io::stdout().flush();

    enable_raw_mode().context("this command requires an interactive terminal")?;

    let choice = loop {
        let Ok(Event::Key(KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            ..
        })) = event::read()
        else {
            continue;
        };
        match code {
            KeyCode::Esc => break None,
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => break None,
            KeyCode::Enter => break Some(0),
            KeyCode::Char(c) => {
                let lower = c.to_ascii_lowercase();
                if let Some(idx) = keys.iter().position(|&k| k == lower) {
                    break Some(idx);
                }
            }
            _ => {}
        }
    };
    disable_raw_mode().ok();

    match choice {
        Some(idx) => {
            info!(options[idx]);
            Ok(keys[idx])
        }
        None => {
            info!("^C");
            std::process::exit(1);
        }
    }
}

/// ask a yes/no question, defaulting to yes on enter
pub fn confirm(question: &str) -> Result<bool> {
    status!("{}", question);
    Ok(prompt(&["YES", "no"])? == 'y')
}

/// edit a single line in place, returning the trimmed result
pub fn edit_one_line(initial: &str) -> Result<String> {
    use rustyline::DefaultEditor;

    let mut editor = DefaultEditor::new().context("failed to initialise line editor")?;

    if let Ok(edited) = editor.readline_with_initial("? ", (initial, "")) {
        Ok(edited.trim().to_string())
    } else {
        info!("^C");
        std::process::exit(1);
    }
}
