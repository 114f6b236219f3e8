//! In-process stand-ins for the network, the runner and external commands

use spin_actions::exec::{CommandError, CommandOutput, CommandRunner};
use spin_actions::provision::{Downloader, ProvisionError};
use spin_actions::runner::PathRegistrar;
use std::collections::{HashMap, VecDeque};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Serves URLs from local files
#[derive(Default)]
pub struct LocalDownloader {
    files: HashMap<String, PathBuf>,
    calls: Mutex<Vec<String>>,
}

impl LocalDownloader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serve(mut self, url: &str, file: &Path) -> Self {
        self.files.insert(url.to_string(), file.to_path_buf());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl Downloader for LocalDownloader {
    fn download(&self, url: &str, dest: &Path) -> Result<(), ProvisionError> {
        self.calls.lock().unwrap().push(url.to_string());
        let source = self
            .files
            .get(url)
            .ok_or_else(|| ProvisionError::download(url, "HTTP 404 Not Found"))?;
        fs::copy(source, dest).map_err(|e| ProvisionError::filesystem(dest, e))?;
        Ok(())
    }
}

/// Remembers every directory added to the path
#[derive(Default)]
pub struct RecordingRegistrar {
    dirs: Mutex<Vec<PathBuf>>,
}

impl RecordingRegistrar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dirs(&self) -> Vec<PathBuf> {
        self.dirs.lock().unwrap().clone()
    }
}

impl PathRegistrar for RecordingRegistrar {
    fn add_path(&self, dir: &Path) -> io::Result<()> {
        self.dirs.lock().unwrap().push(dir.to_path_buf());
        Ok(())
    }
}

/// Records invocations and answers from a script, defaulting to success
#[derive(Default)]
pub struct FakeCommandRunner {
    responses: Mutex<HashMap<String, VecDeque<CommandOutput>>>,
    calls: Mutex<Vec<String>>,
}

impl FakeCommandRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a response for the exact command line `line`
    pub fn respond(self, line: &str, code: i32, stdout: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .entry(line.to_string())
            .or_default()
            .push_back(CommandOutput {
                code,
                stdout: stdout.to_string(),
                stderr: String::new(),
            });
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl CommandRunner for FakeCommandRunner {
    fn output(&self, program: &str, args: &[String]) -> Result<CommandOutput, CommandError> {
        let line = std::iter::once(program.to_string())
            .chain(args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ");
        self.calls.lock().unwrap().push(line.clone());

        let scripted = self
            .responses
            .lock()
            .unwrap()
            .get_mut(&line)
            .and_then(VecDeque::pop_front);
        Ok(scripted.unwrap_or_default())
    }
}
