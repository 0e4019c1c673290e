//! External programs as actions.

use std::io::Write;
use std::process::{self, Stdio};

use camino::Utf8PathBuf;

use crate::action::Action;
use crate::error::ActionError;

/// Runs a program with fixed arguments and an optional stdin payload.
///
/// Output is stdout followed by stderr.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellAction {
    program: Utf8PathBuf,
    args: Vec<String>,
    stdin: Option<Vec<u8>>,
}

impl ShellAction {
    /// Action running `program` without arguments.
    #[must_use]
    pub fn new(program: impl Into<Utf8PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            stdin: None,
        }
    }

    /// Appends one argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends several arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Feeds `input` to the program's stdin.
    #[must_use]
    pub fn stdin(mut self, input: impl Into<Vec<u8>>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    /// Arguments passed to the program.
    #[must_use]
    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    /// Boxes the action for use in a [`Command`](crate::Command).
    #[must_use]
    pub fn boxed(self) -> Box<dyn Action> {
        Box::new(self)
    }

    fn spawn_error(&self, source: std::io::Error) -> ActionError {
        ActionError::Spawn {
            program: self.program.to_string(),
            source,
        }
    }
}

impl Action for ShellAction {
    fn run(&self) -> Result<Vec<u8>, ActionError> {
        let mut command = process::Command::new(self.program.as_std_path());
        command
            .args(&self.args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(if self.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            });

        let mut child = command.spawn().map_err(|source| self.spawn_error(source))?;
        if let (Some(input), Some(mut pipe)) = (&self.stdin, child.stdin.take()) {
            pipe.write_all(input)
                .map_err(|source| self.spawn_error(source))?;
        }

        let output = child
            .wait_with_output()
            .map_err(|source| self.spawn_error(source))?;
        let mut combined = output.stdout;
        combined.extend_from_slice(&output.stderr);

        if output.status.success() {
            Ok(combined)
        } else {
            Err(ActionError::Exit {
                program: self.program.to_string(),
                status: output.status.to_string(),
                output: String::from_utf8_lossy(&combined).into_owned(),
            })
        }
    }

    fn describe(&self) -> String {
        let mut line = self.program.to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

#[cfg(all(test, unix))]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn sh(script: &str) -> ShellAction {
        ShellAction::new("/bin/sh").args(["-c", script])
    }

    #[test]
    fn captures_stdout_then_stderr() {
        let output = sh("echo out; echo err >&2").run().expect("script succeeds");
        assert_eq!(String::from_utf8_lossy(&output), "out\nerr\n");
    }

    #[test]
    fn feeds_stdin() {
        let output = ShellAction::new("/bin/cat")
            .stdin("neighbor 10.0.0.2\n")
            .run()
            .expect("cat succeeds");
        assert_eq!(output, b"neighbor 10.0.0.2\n");
    }

    #[test]
    fn non_zero_exit_carries_output() {
        let error = sh("echo broken; exit 3").run().expect_err("script fails");
        match error {
            ActionError::Exit { output, .. } => assert_eq!(output, "broken\n"),
            other => panic!("expected exit error, got {other:?}"),
        }
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let dir = TempDir::new().expect("temp dir");
        let missing = dir.path().join("ncm-missing-tool");
        let program = Utf8PathBuf::from_path_buf(missing).expect("utf-8 temp path");

        let error = ShellAction::new(program).run().expect_err("spawn fails");
        assert!(matches!(error, ActionError::Spawn { .. }), "got {error:?}");
    }

    #[test]
    fn describe_renders_command_line() {
        let action = ShellAction::new("/usr/bin/ncm-vty").args(["ip", "route", "10.0.0.0/8", "-H", "PE1"]);
        assert_eq!(action.describe(), "/usr/bin/ncm-vty ip route 10.0.0.0/8 -H PE1");
    }
}
