// SPDX-License-Identifier: GPL-3.0-only

//! External command invocation with captured output and dry-run support.

use std::process::Command;

use crate::error::{Result, SysError};

#[derive(Debug, Clone)]
pub struct CommandOutcome {
    pub command: String,
    pub stdout: String,
    pub stderr: String,
    pub executed: bool,
}

pub fn render(command: &str, args: &[&str]) -> String {
    if args.is_empty() {
        command.to_string()
    } else {
        format!("{} {}", command, args.join(" "))
    }
}

/// Run a command, capturing stdout/stderr. A nonzero exit status maps to
/// [`SysError::CommandFailed`]. With `dry_run` the command is rendered and
/// logged but never executed.
pub fn run(command: &str, args: &[&str], dry_run: bool) -> Result<CommandOutcome> {
    let rendered = render(command, args);
    if dry_run {
        tracing::info!(command = %rendered, "dry-run: skipping");
        return Ok(CommandOutcome {
            command: rendered,
            stdout: String::new(),
            stderr: String::new(),
            executed: false,
        });
    }

    tracing::debug!(command = %rendered, "running");
    let output = Command::new(command).args(args).output()?;

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    if !output.status.success() {
        tracing::debug!(command = %rendered, %stderr, "command failed");
        return Err(SysError::CommandFailed {
            command: rendered,
            stderr,
        });
    }

    Ok(CommandOutcome {
        command: rendered,
        stdout,
        stderr,
        executed: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_command_with_args() {
        assert_eq!(render("lvs", &[]), "lvs");
        assert_eq!(render("umount", &["/srv/data"]), "umount /srv/data");
    }

    #[test]
    fn dry_run_executes_nothing() {
        let outcome = run("definitely-not-a-real-binary", &["--flag"], true).unwrap();
        assert!(!outcome.executed);
        assert!(outcome.stdout.is_empty());
    }
}
