//! CI runner file-command protocol
//!
//! Steps talk back to the runner by appending to files whose paths the runner
//! exposes in the environment (`GITHUB_PATH`, `GITHUB_OUTPUT`, `GITHUB_ENV`)
//! and by printing `::command::` lines on stdout.

use std::env;
use std::ffi::OsString;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

/// Makes a directory available for executable lookup in later steps
pub trait PathRegistrar {
    fn add_path(&self, dir: &Path) -> io::Result<()>;
}

/// Runner backed by the process environment
#[derive(Debug, Clone, Default)]
pub struct ActionsRunner {
    path_file: Option<PathBuf>,
    output_file: Option<PathBuf>,
    env_file: Option<PathBuf>,
}

impl ActionsRunner {
    pub fn from_env() -> Self {
        let file = |key: &str| env::var_os(key).filter(|v| !v.is_empty()).map(PathBuf::from);
        Self {
            path_file: file("GITHUB_PATH"),
            output_file: file("GITHUB_OUTPUT"),
            env_file: file("GITHUB_ENV"),
        }
    }

    pub fn with_files(path_file: PathBuf, output_file: PathBuf, env_file: PathBuf) -> Self {
        Self {
            path_file: Some(path_file),
            output_file: Some(output_file),
            env_file: Some(env_file),
        }
    }

    /// Sets a step output
    pub fn set_output(&self, name: &str, value: &str) -> io::Result<()> {
        match &self.output_file {
            Some(file) => append(file, &key_value_message(name, value)?),
            None => {
                println!("::set-output name={}::{}", name, escape_data(value));
                Ok(())
            }
        }
    }

    /// Exports a variable to later steps and to this process
    pub fn export_variable(&self, name: &str, value: &str) -> io::Result<()> {
        env::set_var(name, value);
        match &self.env_file {
            Some(file) => append(file, &key_value_message(name, value)?),
            None => {
                println!("::set-env name={}::{}", name, escape_data(value));
                Ok(())
            }
        }
    }

    /// Reports the step as failed
    pub fn set_failed(&self, message: &str) {
        println!("::error::{}", escape_data(message));
    }
}

impl PathRegistrar for ActionsRunner {
    fn add_path(&self, dir: &Path) -> io::Result<()> {
        match &self.path_file {
            Some(file) => append(file, &format!("{}\n", dir.display()))?,
            None => println!("::add-path::{}", dir.display()),
        }

        let mut paths = vec![dir.to_path_buf()];
        if let Some(current) = env::var_os("PATH") {
            paths.extend(env::split_paths(&current));
        }
        let joined: OsString = env::join_paths(paths)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        env::set_var("PATH", joined);

        debug!("Added {} to PATH", dir.display());
        Ok(())
    }
}

fn append(file: &Path, content: &str) -> io::Result<()> {
    let mut handle = OpenOptions::new().create(true).append(true).open(file)?;
    handle.write_all(content.as_bytes())
}

/// Heredoc-style `name<<DELIM` record used by the output and env files
fn key_value_message(name: &str, value: &str) -> io::Result<String> {
    let delimiter = format!("ghadelimiter_{}", Uuid::new_v4());

    if name.contains(&delimiter) || value.contains(&delimiter) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("value must not contain the delimiter {}", delimiter),
        ));
    }

    Ok(format!("{name}<<{delimiter}\n{value}\n{delimiter}\n"))
}

fn escape_data(value: &str) -> String {
    value
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    fn runner_in(dir: &TempDir) -> ActionsRunner {
        ActionsRunner::with_files(
            dir.path().join("path"),
            dir.path().join("output"),
            dir.path().join("env"),
        )
    }

    #[test]
    fn test_key_value_message_format() {
        let msg = key_value_message("app-url", "https://app.example.com").unwrap();
        let lines: Vec<&str> = msg.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("app-url<<ghadelimiter_"));
        assert_eq!(lines[1], "https://app.example.com");
        assert_eq!(lines[0].split("<<").nth(1).unwrap(), lines[2]);
    }

    #[test]
    fn test_set_output_appends() {
        let dir = TempDir::new().unwrap();
        let runner = runner_in(&dir);
        runner.set_output("a", "1").unwrap();
        runner.set_output("b", "2").unwrap();

        let content = fs::read_to_string(dir.path().join("output")).unwrap();
        assert!(content.contains("a<<"));
        assert!(content.contains("\n1\n"));
        assert!(content.contains("b<<"));
    }

    #[test]
    fn test_escape_data() {
        assert_eq!(escape_data("50%\nfailed"), "50%25%0Afailed");
    }

    #[test]
    #[serial]
    fn test_add_path_writes_file_and_prepends_process_path() {
        let dir = TempDir::new().unwrap();
        let runner = runner_in(&dir);
        let original = env::var_os("PATH");

        let tool_dir = dir.path().join("tools/bin");
        runner.add_path(&tool_dir).unwrap();

        let recorded = fs::read_to_string(dir.path().join("path")).unwrap();
        assert_eq!(recorded, format!("{}\n", tool_dir.display()));

        let path = env::var_os("PATH").unwrap();
        assert_eq!(env::split_paths(&path).next().unwrap(), tool_dir);

        match original {
            Some(p) => env::set_var("PATH", p),
            None => env::remove_var("PATH"),
        }
    }

    #[test]
    #[serial]
    fn test_export_variable_sets_process_env() {
        let dir = TempDir::new().unwrap();
        let runner = runner_in(&dir);
        runner
            .export_variable("SPIN_ACTIONS_TEST_VAR", "spin 2.0.0")
            .unwrap();

        assert_eq!(env::var("SPIN_ACTIONS_TEST_VAR").unwrap(), "spin 2.0.0");
        let content = fs::read_to_string(dir.path().join("env")).unwrap();
        assert!(content.starts_with("SPIN_ACTIONS_TEST_VAR<<"));
        env::remove_var("SPIN_ACTIONS_TEST_VAR");
    }
}
