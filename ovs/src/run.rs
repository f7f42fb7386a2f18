/*
Copyright (c) 2022 VMware, Inc.
SPDX-License-Identifier: MIT
Permission is hereby granted, free of charge, to any person obtaining a copy
of this software and associated documentation files (the "Software"), to deal
in the Software without restriction, including without limitation the rights
to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:
The above copyright notice and this permission notice shall be included in all
copies or substantial portions of the Software.
THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
SOFTWARE.
 */

//! Running Open vSwitch and OVN command-line tools.
//!
//! Every tool invocation goes through a [`CommandRunner`].  The production implementation,
//! [`ProcessRunner`], runs the program as a child process and kills it if it does not finish
//! within a fixed timeout.  Tests substitute their own runner to script the tools' output.

use std::io::{self, Read};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, sleep, JoinHandle};
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{event, Level};

/// Error that can arise running an external command.
#[derive(Error, Debug)]
pub enum CommandError {
    /// The command line had no program name.
    #[error("empty command line")]
    Empty,

    /// The program could not be started at all (e.g. it is not installed).
    #[error("{command}: could not start ({source})")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    /// The program did not exit within the allotted time and was killed.
    #[error("timeout: {command} (no exit after {timeout:?})")]
    Timeout { command: String, timeout: Duration },

    /// The program exited unsuccessfully.
    #[error("cmd failed: {command} ({status})\n{stderr}")]
    Failed {
        command: String,
        status: ExitStatus,
        stderr: String,
    },

    /// Waiting for the program or collecting its output failed.
    #[error("{command}: {source}")]
    Io {
        command: String,
        #[source]
        source: io::Error,
    },
}

impl CommandError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, CommandError::Timeout { .. })
    }
}

/// Runs a program, given as an argv-style command line, to completion and returns what it wrote
/// to `stdout`.  A nonzero exit status is an error.
pub trait CommandRunner: Send + Sync {
    fn run(&self, argv: &[String]) -> Result<String, CommandError>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for std::sync::Arc<R> {
    fn run(&self, argv: &[String]) -> Result<String, CommandError> {
        (**self).run(argv)
    }
}

/// Returns a string with the program name followed by arguments, separated by spaces.  This is
/// suitable for diagnostic messages; it's not properly escaped or encoded for other use.
pub fn command_string<S: AsRef<str>>(argv: &[S]) -> String {
    argv.iter().map(|s| s.as_ref()).collect::<Vec<_>>().join(" ")
}

/// Where a tool runs: directly on this host, or inside a container through `docker exec -i`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Location {
    Host,
    Container(String),
}

impl Location {
    /// An empty container name means the tool is installed on the host.
    pub fn from_container(name: &str) -> Location {
        let name = name.trim();
        if name.is_empty() {
            Location::Host
        } else {
            Location::Container(name.into())
        }
    }

    /// Builds the full command line for running `program` with `args` at this location.
    pub fn argv<I, S>(&self, program: &str, args: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut argv = match self {
            Location::Host => Vec::new(),
            Location::Container(container) => {
                vec!["docker".into(), "exec".into(), "-i".into(), container.clone()]
            }
        };
        argv.push(program.into());
        argv.extend(args.into_iter().map(Into::into));
        argv
    }
}

enum Completion<T> {
    Incomplete,
    Complete(T),
}
use Completion::*;

/// Repeatedly evaluates `condition`, sleeping a bit between calls, until it yields
/// `Complete(value)`, then returns `Some(value)`.  Gives up and returns `None` once `timeout`
/// has passed.
fn wait_until<T, F>(timeout: Duration, mut condition: F) -> Option<T>
where
    F: FnMut() -> Completion<T>,
{
    let deadline = Instant::now() + timeout;
    let mut delay = Duration::from_millis(1);
    loop {
        if let Complete(result) = condition() {
            return Some(result);
        }
        let now = Instant::now();
        if now >= deadline {
            return None;
        }

        // Most tools finish in a few milliseconds, so start with short naps.
        sleep(delay.min(deadline - now));
        delay = (delay * 2).min(Duration::from_millis(50));
    }
}

fn spawn_reader<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<io::Result<String>>> {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            pipe.read_to_end(&mut buf)?;
            Ok(String::from_utf8_lossy(&buf).into_owned())
        })
    })
}

fn join_reader(reader: Option<JoinHandle<io::Result<String>>>) -> io::Result<String> {
    match reader {
        None => Ok(String::new()),
        Some(handle) => handle
            .join()
            .unwrap_or_else(|_| Err(io::Error::new(io::ErrorKind::Other, "output reader panicked"))),
    }
}

/// Runs commands as child processes, killing any child that runs longer than `timeout`.
#[derive(Clone, Debug)]
pub struct ProcessRunner {
    timeout: Duration,
}

impl ProcessRunner {
    pub fn new(timeout: Duration) -> ProcessRunner {
        ProcessRunner { timeout }
    }

    fn wait(&self, child: &mut Child) -> Option<io::Result<ExitStatus>> {
        wait_until(self.timeout, || match child.try_wait() {
            Ok(Some(status)) => Complete(Ok(status)),
            Ok(None) => Incomplete,
            Err(e) => Complete(Err(e)),
        })
    }
}

impl CommandRunner for ProcessRunner {
    fn run(&self, argv: &[String]) -> Result<String, CommandError> {
        let (program, args) = argv.split_first().ok_or(CommandError::Empty)?;
        let command = command_string(argv);
        event!(Level::DEBUG, "running command: {command}");

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| CommandError::Spawn { command: command.clone(), source })?;

        // Drain both pipes concurrently so that a chatty child can't fill a pipe buffer and stall.
        let stdout = spawn_reader(child.stdout.take());
        let stderr = spawn_reader(child.stderr.take());

        let status = match self.wait(&mut child) {
            Some(Ok(status)) => status,
            Some(Err(source)) => return Err(CommandError::Io { command, source }),
            None => {
                // The readers are left detached: a grandchild may still hold the pipes open.
                if let Err(e) = child.kill() {
                    event!(Level::WARN, "{command}: kill after timeout failed ({e})");
                }
                let _ = child.wait();
                event!(Level::WARN, "{command}: timed out after {:?}", self.timeout);
                return Err(CommandError::Timeout { command, timeout: self.timeout });
            }
        };

        let output = join_reader(stdout)
            .map_err(|source| CommandError::Io { command: command.clone(), source })?;
        let errors = join_reader(stderr)
            .map_err(|source| CommandError::Io { command: command.clone(), source })?;
        event!(Level::DEBUG, "{program} exited ({status})");
        if !status.success() {
            return Err(CommandError::Failed {
                command,
                status,
                stderr: errors.trim().into(),
            });
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_location_runs_tool_directly() {
        let argv = Location::from_container("").argv("ovs-ofctl", ["dump-flows", "br-int"]);
        assert_eq!(argv, ["ovs-ofctl", "dump-flows", "br-int"]);
    }

    #[test]
    fn container_location_wraps_in_docker_exec() {
        let argv = Location::from_container(" ovn_sb_db ").argv("ovn-sbctl", ["show"]);
        assert_eq!(argv, ["docker", "exec", "-i", "ovn_sb_db", "ovn-sbctl", "show"]);
    }

    #[test]
    fn empty_argv_is_rejected() {
        let runner = ProcessRunner::new(Duration::from_secs(1));
        assert!(matches!(runner.run(&[]), Err(CommandError::Empty)));
    }

    #[test]
    fn wait_until_gives_up() {
        let start = Instant::now();
        let result: Option<()> = wait_until(Duration::from_millis(30), || Incomplete);
        assert!(result.is_none());
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn wait_until_returns_first_completion() {
        let mut calls = 0;
        let result = wait_until(Duration::from_secs(5), || {
            calls += 1;
            if calls == 3 { Complete(calls) } else { Incomplete }
        });
        assert_eq!(result, Some(3));
    }
}
