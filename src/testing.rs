// Recording fakes for the process, artifact and chart seams

use crate::artifacts::{Artifact, ArtifactProvider};
use crate::error::ArtifactError;
use crate::services::vela::ChartInstaller;
use crate::utils::exec::{CommandSpec, ProcessOutput, ProcessRunner};
use anyhow::Result;
use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Read;

/// Records every invocation; answers with a canned response per program name
/// (basename), or exit 0 with no output
#[derive(Default)]
pub struct RecordingRunner {
    calls: RefCell<Vec<CommandSpec>>,
    responses: HashMap<String, ProcessOutput>,
    processes: HashMap<String, Vec<u32>>,
    live_pids: RefCell<Vec<u32>>,
    killed: RefCell<Vec<u32>>,
    unavailable: bool,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// A host where no program can be started, as with an empty PATH
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    /// Processes `find_processes` reports as running under `name`
    pub fn with_processes(mut self, name: &str, pids: &[u32]) -> Self {
        self.processes.insert(name.to_string(), pids.to_vec());
        self
    }

    pub fn respond(mut self, program: &str, code: i32, combined: &str) -> Self {
        self.responses.insert(
            program.to_string(),
            ProcessOutput {
                code: Some(code),
                combined: combined.to_string(),
            },
        );
        self
    }

    /// Processes `kill` will find alive
    pub fn with_live_pids(self, pids: &[u32]) -> Self {
        self.live_pids.borrow_mut().extend_from_slice(pids);
        self
    }

    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.borrow().clone()
    }

    pub fn programs(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .map(|c| basename(&c.program).to_string())
            .collect()
    }

    pub fn killed(&self) -> Vec<u32> {
        self.killed.borrow().clone()
    }
}

fn basename(program: &str) -> &str {
    program.rsplit('/').next().unwrap_or(program)
}

impl ProcessRunner for RecordingRunner {
    fn run(&self, spec: &CommandSpec) -> Result<ProcessOutput> {
        self.calls.borrow_mut().push(spec.clone());
        if self.unavailable {
            anyhow::bail!("{} not found in PATH", spec.program);
        }
        Ok(self
            .responses
            .get(basename(&spec.program))
            .cloned()
            .unwrap_or(ProcessOutput {
                code: Some(0),
                combined: String::new(),
            }))
    }

    fn kill(&self, pid: u32) -> Result<bool> {
        self.killed.borrow_mut().push(pid);
        let mut live = self.live_pids.borrow_mut();
        match live.iter().position(|p| *p == pid) {
            Some(index) => {
                live.remove(index);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn find_processes(&self, name: &str) -> Result<Vec<u32>> {
        Ok(self.processes.get(name).cloned().unwrap_or_default())
    }
}

/// Serves `<name> payload` for every artifact and records what was opened
#[derive(Default)]
pub struct StaticArtifacts {
    opened: RefCell<Vec<Artifact>>,
}

impl StaticArtifacts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn payload(artifact: Artifact) -> Vec<u8> {
        format!("{} payload", artifact.relative_path()).into_bytes()
    }

    pub fn opened(&self) -> Vec<Artifact> {
        self.opened.borrow().clone()
    }
}

impl ArtifactProvider for StaticArtifacts {
    fn open(&self, artifact: Artifact) -> Result<Box<dyn Read + '_>> {
        self.opened.borrow_mut().push(artifact);
        Ok(Box::new(std::io::Cursor::new(Self::payload(artifact))))
    }
}

/// Behaves like a build with nothing staged
#[derive(Default)]
pub struct MissingArtifacts {
    requested: RefCell<Vec<Artifact>>,
}

impl MissingArtifacts {
    pub fn requested(&self) -> Vec<Artifact> {
        self.requested.borrow().clone()
    }
}

impl ArtifactProvider for MissingArtifacts {
    fn open(&self, artifact: Artifact) -> Result<Box<dyn Read + '_>> {
        self.requested.borrow_mut().push(artifact);
        Err(ArtifactError::NotEmbedded(artifact.relative_path()).into())
    }
}

/// Chart installer that records its arguments and optionally fails
#[derive(Default)]
pub struct RecordingChartInstaller {
    pub fail: bool,
    invocations: RefCell<Vec<Vec<String>>>,
}

impl RecordingChartInstaller {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn invocations(&self) -> Vec<Vec<String>> {
        self.invocations.borrow().clone()
    }
}

impl ChartInstaller for RecordingChartInstaller {
    fn install(&self, args: &[String]) -> Result<()> {
        self.invocations.borrow_mut().push(args.to_vec());
        if self.fail {
            anyhow::bail!("helm release vela-core failed: timed out waiting for the condition");
        }
        Ok(())
    }
}
