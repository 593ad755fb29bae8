use anyhow::{Context, Result};
use nix::errno::Errno;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// A command line plus the environment variables to add on top of the
/// inherited environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Exit status and captured stdout+stderr of a finished process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    /// `None` when the process was terminated by a signal
    pub code: Option<i32>,
    pub combined: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Flush the captured output to stdout
    pub fn echo(&self) {
        if self.combined.is_empty() {
            return;
        }
        let mut stdout = std::io::stdout();
        let _ = stdout.write_all(self.combined.as_bytes());
        let _ = stdout.flush();
    }

    fn status_display(&self) -> String {
        match self.code {
            Some(code) => format!("exit code {}", code),
            None => "a signal".to_string(),
        }
    }
}

/// Runs external processes to completion and signals running ones
pub trait ProcessRunner {
    /// Run a command, blocking until it exits. An `Err` means the process
    /// could not be started; a non-zero exit is reported through the output.
    fn run(&self, spec: &CommandSpec) -> Result<ProcessOutput>;

    /// Send SIGKILL to `pid`. Returns `false` if no such process exists.
    fn kill(&self, pid: u32) -> Result<bool>;

    /// Pids of the running processes whose command name is exactly `name`
    fn find_processes(&self, name: &str) -> Result<Vec<u32>>;
}

/// Executes commands on the local host
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, spec: &CommandSpec) -> Result<ProcessOutput> {
        let program = resolve_program(&spec.program)?;
        log::debug!("running {}", spec);

        let output = Command::new(&program)
            .args(&spec.args)
            .envs(spec.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("Failed to execute command: {}", spec.program))?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        Ok(ProcessOutput {
            code: output.status.code(),
            combined,
        })
    }

    fn kill(&self, pid: u32) -> Result<bool> {
        let raw = i32::try_from(pid).with_context(|| format!("Invalid process id: {}", pid))?;
        match signal::kill(Pid::from_raw(raw), Signal::SIGKILL) {
            Ok(()) => Ok(true),
            Err(Errno::ESRCH) => Ok(false),
            Err(e) => Err(e).with_context(|| format!("Failed to kill process {}", pid)),
        }
    }

    fn find_processes(&self, name: &str) -> Result<Vec<u32>> {
        processes_named(Path::new(PROC_ROOT), name)
    }
}

const PROC_ROOT: &str = "/proc";

/// Scan `<proc_root>/<pid>/comm` for `name`. Processes that exit during the
/// scan are skipped.
pub fn processes_named(proc_root: &Path, name: &str) -> Result<Vec<u32>> {
    let entries = fs::read_dir(proc_root)
        .with_context(|| format!("Failed to list processes in {}", proc_root.display()))?;

    let mut pids = Vec::new();
    for entry in entries.flatten() {
        let Some(pid) = entry.file_name().to_str().and_then(|n| n.parse::<u32>().ok()) else {
            continue;
        };
        if let Ok(comm) = fs::read_to_string(entry.path().join("comm")) {
            if comm.trim_end_matches('\n') == name {
                pids.push(pid);
            }
        }
    }
    pids.sort_unstable();
    Ok(pids)
}

/// Bare program names are looked up in PATH so a missing tool is reported by
/// name instead of as a generic spawn failure
fn resolve_program(program: &str) -> Result<PathBuf> {
    if program.contains('/') {
        return Ok(PathBuf::from(program));
    }
    which::which(program).with_context(|| format!("{} not found in PATH", program))
}

/// Run a command and turn a non-zero exit into an error. Output is echoed on
/// success and carried in the error otherwise.
pub fn run_echoed(runner: &dyn ProcessRunner, spec: &CommandSpec) -> Result<ProcessOutput> {
    let output = runner.run(spec)?;
    if !output.success() {
        let printed = output.combined.trim_end();
        if printed.is_empty() {
            anyhow::bail!("`{}` failed with {}", spec, output.status_display());
        }
        anyhow::bail!(
            "`{}` failed with {}:\n{}",
            spec,
            output.status_display(),
            printed
        );
    }
    output.echo();
    Ok(output)
}
