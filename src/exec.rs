use crate::constants::AUTH_FAILURE_SIGNATURES;
use crate::debug;
use crate::error::{Result, TfError};
use crate::ui;
use crate::warning;
use regex::Regex;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::LazyLock;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use wait_timeout::ChildExt;

/// a fully resolved tf invocation; every argument is a discrete element and
/// is never joined into a shell string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    pub env: Vec<(String, String)>,
}

impl Invocation {
    /// shell-quoted rendering, for tracing only
    pub fn display(&self) -> String {
        let program = self.program.to_string_lossy().into_owned();
        let words = std::iter::once(program.as_str()).chain(self.args.iter().map(String::as_str));
        shlex::try_join(words).unwrap_or_else(|_| format!("{program} {}", self.args.join(" ")))
    }
}

/// captured result of a finished process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Output {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl Output {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// stderr if there is any, otherwise stdout
    pub fn failure_message(&self) -> String {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            let stdout = self.stdout.trim();
            if stdout.is_empty() {
                match self.code {
                    Some(code) => format!("tf exited with code {code}"),
                    None => "tf was terminated by a signal".to_string(),
                }
            } else {
                stdout.to_string()
            }
        } else {
            stderr.to_string()
        }
    }

    fn into_failure(self) -> TfError {
        TfError::Execution {
            message: self.failure_message(),
            code: self.code,
        }
    }
}

/// seam between the executor and the operating system
pub trait Runner {
    /// run with stdout and stderr captured
    fn capture(&self, invocation: &Invocation) -> Result<Output>;

    /// run attached to the user's terminal so credential prompts can render;
    /// returns whether the process succeeded
    fn interactive(&self, invocation: &Invocation) -> Result<bool>;
}

/// spawns real child processes
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    pub max_output_bytes: usize,
    pub timeout: Option<Duration>,
}

impl ProcessRunner {
    fn command(invocation: &Invocation) -> Command {
        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args)
            .current_dir(&invocation.cwd)
            .envs(invocation.env.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        cmd
    }

    fn spawn_error(invocation: &Invocation, source: io::Error) -> TfError {
        TfError::Spawn {
            program: invocation.program.clone(),
            source,
        }
    }
}

/// read a stream to the end on its own thread, keeping at most `limit` bytes;
/// anything beyond is drained so the child never blocks on a full pipe
fn collect<R: Read + Send + 'static>(
    reader: Option<R>,
    limit: usize,
) -> JoinHandle<io::Result<(Vec<u8>, bool)>> {
    thread::spawn(move || {
        let Some(reader) = reader else {
            return Ok((Vec::new(), false));
        };
        let mut buf = Vec::new();
        let mut limited = reader.take(limit as u64 + 1);
        limited.read_to_end(&mut buf)?;
        let overflowed = buf.len() > limit;
        if overflowed {
            buf.truncate(limit);
            io::copy(&mut limited.into_inner(), &mut io::sink())?;
        }
        Ok((buf, overflowed))
    })
}

fn join_stream(handle: JoinHandle<io::Result<(Vec<u8>, bool)>>) -> Result<(Vec<u8>, bool)> {
    match handle.join() {
        Ok(result) => Ok(result?),
        Err(_) => Err(TfError::Io(io::Error::other("output reader thread panicked"))),
    }
}

impl Runner for ProcessRunner {
    fn capture(&self, invocation: &Invocation) -> Result<Output> {
        let mut child = Self::command(invocation)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Self::spawn_error(invocation, e))?;

        let stdout = collect(child.stdout.take(), self.max_output_bytes);
        let stderr = collect(child.stderr.take(), self.max_output_bytes);

        let status = match self.timeout {
            Some(timeout) => match child.wait_timeout(timeout)? {
                Some(status) => status,
                None => {
                    if let Err(e) = child.kill() {
                        warning!("failed to kill tf process: {}", e);
                    }
                    if let Err(e) = child.wait() {
                        warning!("failed to reap tf process: {}", e);
                    }
                    // output of a killed command is of no use, only the threads matter
                    let _ = join_stream(stdout);
                    let _ = join_stream(stderr);
                    return Err(TfError::TimedOut {
                        secs: timeout.as_secs(),
                    });
                }
            },
            None => child.wait()?,
        };

        let (stdout, stdout_overflow) = join_stream(stdout)?;
        let (stderr, stderr_overflow) = join_stream(stderr)?;
        if stdout_overflow || stderr_overflow {
            return Err(TfError::OutputTooLarge {
                limit: self.max_output_bytes,
            });
        }

        Ok(Output {
            code: status.code(),
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
        })
    }

    fn interactive(&self, invocation: &Invocation) -> Result<bool> {
        let status = Self::command(invocation)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|e| Self::spawn_error(invocation, e))?;
        Ok(status.success())
    }
}

static AUTH_FAILURE: LazyLock<Regex> = LazyLock::new(|| {
    let alternatives: Vec<String> = AUTH_FAILURE_SIGNATURES
        .iter()
        .map(|signature| regex::escape(signature))
        .collect();
    Regex::new(&format!(r"(?i)\b(?:{})\b", alternatives.join("|")))
        .expect("valid auth signature regex")
});

/// true when a failed command's output carries a known credential rejection
///
/// signatures are matched as whole words in tf's message text; words that
/// contain a path separator (server paths, local paths, urls) are left out so
/// item names can't trigger a sign-in
pub fn is_auth_failure(output: &Output) -> bool {
    output.stdout.lines().chain(output.stderr.lines()).any(|line| {
        let message: Vec<&str> = line
            .split_whitespace()
            .filter(|word| !word.contains('/') && !word.contains('\\'))
            .collect();
        AUTH_FAILURE.is_match(&message.join(" "))
    })
}

/// runs tf with a fixed program, working directory and environment
///
/// per call: run, and if the failure looks like rejected credentials, sign in
/// interactively once and retry exactly once. nothing survives between calls.
#[derive(Debug, Clone)]
pub struct Executor<R: Runner = ProcessRunner> {
    runner: R,
    program: PathBuf,
    cwd: PathBuf,
    env: Vec<(String, String)>,
    collection: Option<String>,
    trace: bool,
}

impl<R: Runner> Executor<R> {
    pub fn new(runner: R, program: impl Into<PathBuf>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            program: program.into(),
            cwd: cwd.into(),
            env: Vec::new(),
            collection: None,
            trace: false,
        }
    }

    pub fn with_env(mut self, env: Vec<(String, String)>) -> Self {
        self.env = env;
        self
    }

    /// collection url used for the interactive sign-in
    pub fn with_collection(mut self, collection: Option<String>) -> Self {
        self.collection = collection;
        self
    }

    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    pub fn trace(&self) -> bool {
        self.trace
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn invocation<S: AsRef<str>>(&self, args: &[S]) -> Invocation {
        Invocation {
            program: self.program.clone(),
            args: args.iter().map(|a| a.as_ref().to_string()).collect(),
            cwd: self.cwd.clone(),
            env: self.env.clone(),
        }
    }

    fn attempt(&self, invocation: &Invocation) -> Result<Output> {
        if self.trace {
            debug!("$ {}", invocation.display());
        }
        self.runner.capture(invocation)
    }

    /// run tf and return its stdout
    pub fn run<S: AsRef<str>>(&self, args: &[S]) -> Result<String> {
        let invocation = self.invocation(args);
        let output = self.attempt(&invocation)?;
        if output.success() {
            return Ok(output.stdout);
        }
        if !is_auth_failure(&output) {
            return Err(output.into_failure());
        }

        let Some(collection) = self.collection.as_deref() else {
            return Err(output.into_failure());
        };
        let signin = self.invocation(&[
            "workspaces".to_string(),
            format!("/collection:{collection}"),
        ]);
        // tf owns the terminal while it prompts for credentials
        let signed_in = ui::suspend_spinner(|| {
            warning!("tf rejected the cached credentials, signing in...");
            if self.trace {
                debug!("$ {}", signin.display());
            }
            self.runner.interactive(&signin)
        })?;
        if !signed_in {
            warning!("sign-in did not complete successfully, retrying anyway");
        }

        let retry = self.attempt(&invocation)?;
        if retry.success() {
            Ok(retry.stdout)
        } else {
            Err(retry.into_failure())
        }
    }
}

#[cfg(test)]
pub(crate) mod mock;
