//! External load tools run as scoped subprocesses

use std::fmt;
use std::io::Write;
use std::path::PathBuf;
use std::process::Stdio;
use std::str::FromStr;
use std::time::Duration;
use tempfile::NamedTempFile;
use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{ExecutionError, ExecutionResult};

/// Supported external load tools
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadTool {
    Hey,
    Wrk,
}

impl LoadTool {
    pub fn program(&self) -> &'static str {
        match self {
            LoadTool::Hey => "hey",
            LoadTool::Wrk => "wrk",
        }
    }

    /// Arguments for one run, in the tool's own grammar
    pub fn args(&self, invocation: &ToolInvocation) -> Vec<String> {
        let seconds = invocation.duration.as_secs().max(1);
        let workers = invocation.workers.max(1);

        match self {
            LoadTool::Hey => {
                // hey takes a per-worker rate limit
                let per_worker = (invocation.rate as usize / workers).max(1);
                vec![
                    "-z".to_string(),
                    format!("{}s", seconds),
                    "-c".to_string(),
                    workers.to_string(),
                    "-q".to_string(),
                    per_worker.to_string(),
                    "-host".to_string(),
                    invocation.host_header.clone(),
                    invocation.address.clone(),
                ]
            }
            LoadTool::Wrk => vec![
                "-t".to_string(),
                workers.to_string(),
                "-c".to_string(),
                workers.to_string(),
                "-d".to_string(),
                format!("{}s", seconds),
                "-H".to_string(),
                format!("Host: {}", invocation.host_header),
                invocation.address.clone(),
            ],
        }
    }
}

impl fmt::Display for LoadTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.program())
    }
}

impl FromStr for LoadTool {
    type Err = ExecutionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "hey" => Ok(LoadTool::Hey),
            "wrk" => Ok(LoadTool::Wrk),
            _ => Err(ExecutionError::UnsupportedTool(s.to_string())),
        }
    }
}

/// Target and shape of one external load run
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInvocation {
    pub address: String,
    pub host_header: String,
    /// Requests per second across all workers
    pub rate: u32,
    pub workers: usize,
    pub duration: Duration,
}

/// An external load tool and where to find it
#[derive(Debug, Clone)]
pub struct ExternalTool {
    tool: LoadTool,
    binary: String,
    script_dir: Option<PathBuf>,
}

impl ExternalTool {
    /// Use the tool's binary from `PATH`
    pub fn new(tool: LoadTool) -> Self {
        Self {
            tool,
            binary: tool.program().to_string(),
            script_dir: None,
        }
    }

    /// Use a specific binary for the tool
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Write invocation scripts under `dir` instead of the system temp dir
    pub fn with_script_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.script_dir = Some(dir.into());
        self
    }

    pub fn tool(&self) -> LoadTool {
        self.tool
    }

    /// Shell command line for an invocation
    pub fn command_line(&self, invocation: &ToolInvocation) -> String {
        let args = self.tool.args(invocation);
        std::iter::once(self.binary.as_str())
            .chain(args.iter().map(String::as_str))
            .map(shell_quote)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Run the tool to completion and return its standard output.
    ///
    /// The invocation goes through a temporary `sh` script. The script is
    /// removed and the child reaped on every path out of this function; if
    /// the returned future is dropped the child is killed.
    pub async fn run(&self, invocation: &ToolInvocation) -> ExecutionResult<String> {
        let tool = self.tool.to_string();
        let command_line = self.command_line(invocation);
        let script = self.write_script(&command_line)?;

        info!(tool = %tool, address = %invocation.address, host = %invocation.host_header, "Running external load tool");
        debug!(command = %command_line, script = %script.path().display(), "Tool invocation");

        let child = Command::new("sh")
            .arg(script.path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ExecutionError::Spawn {
                tool: tool.clone(),
                source,
            })?;

        let output = child
            .wait_with_output()
            .await
            .map_err(|source| ExecutionError::Spawn {
                tool: tool.clone(),
                source,
            })?;
        drop(script);

        if !output.status.success() {
            return Err(ExecutionError::ToolFailed {
                tool,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        debug!(tool = %tool, bytes = stdout.len(), "External load tool finished");
        Ok(stdout)
    }

    fn write_script(&self, command_line: &str) -> ExecutionResult<NamedTempFile> {
        let to_error = |source: std::io::Error| ExecutionError::Script {
            tool: self.tool.to_string(),
            source,
        };

        let mut builder = tempfile::Builder::new();
        builder.prefix("scalebench-").suffix(".sh");
        let mut script = match &self.script_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .map_err(to_error)?;

        writeln!(script, "#!/bin/sh").map_err(to_error)?;
        writeln!(script, "exec {}", command_line).map_err(to_error)?;
        script.flush().map_err(to_error)?;
        Ok(script)
    }
}

/// Single-quote a word for `sh`
fn shell_quote(word: &str) -> String {
    format!("'{}'", word.replace('\'', r"'\''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invocation() -> ToolInvocation {
        ToolInvocation {
            address: "http://10.0.0.7:31380".to_string(),
            host_header: "ksvc-0.bench.example.com".to_string(),
            rate: 100,
            workers: 4,
            duration: Duration::from_secs(30),
        }
    }

    #[test]
    fn test_parse_tool_names() {
        assert_eq!("hey".parse::<LoadTool>().unwrap(), LoadTool::Hey);
        assert_eq!("WRK".parse::<LoadTool>().unwrap(), LoadTool::Wrk);

        let err = "ab".parse::<LoadTool>().unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(err.to_string(), "Unsupported load tool: ab");
    }

    #[test]
    fn test_hey_arguments() {
        let args = LoadTool::Hey.args(&invocation());
        assert_eq!(
            args.join(" "),
            "-z 30s -c 4 -q 25 -host ksvc-0.bench.example.com http://10.0.0.7:31380"
        );

        // Rate below the worker count still allows one request per worker
        let slow = ToolInvocation {
            rate: 2,
            ..invocation()
        };
        assert!(LoadTool::Hey.args(&slow).join(" ").contains("-q 1 "));
    }

    #[test]
    fn test_wrk_arguments_and_quoting() {
        let line = ExternalTool::new(LoadTool::Wrk).command_line(&invocation());
        assert_eq!(
            line,
            "'wrk' '-t' '4' '-c' '4' '-d' '30s' '-H' 'Host: ksvc-0.bench.example.com' 'http://10.0.0.7:31380'"
        );
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
    }

    #[tokio::test]
    async fn test_run_captures_stdout_and_removes_script() {
        let dir = tempfile::tempdir().unwrap();
        let tool = ExternalTool::new(LoadTool::Hey)
            .with_binary("echo")
            .with_script_dir(dir.path());

        let out = tool.run(&invocation()).await.unwrap();

        assert_eq!(
            out.trim(),
            "-z 30s -c 4 -q 25 -host ksvc-0.bench.example.com http://10.0.0.7:31380"
        );
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_tool_failure() {
        let dir = tempfile::tempdir().unwrap();
        let tool = ExternalTool::new(LoadTool::Wrk)
            .with_binary("false")
            .with_script_dir(dir.path());

        let err = tool.run(&invocation()).await.unwrap_err();

        assert!(matches!(err, ExecutionError::ToolFailed { ref tool, .. } if tool == "wrk"));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
