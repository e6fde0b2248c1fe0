// src/exec/command.rs

//! External tool invocation.
//!
//! Commands are configured as shell strings with `{name}` placeholders.
//! They run synchronously: every caller is already on the blocking pool.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;

use anyhow::{Context, Result, bail};
use tracing::debug;

/// Substitute `{key}` placeholders with shell-quoted values.
pub fn render_command(template: &str, vars: &[(&str, &str)]) -> String {
    vars.iter().fold(template.to_string(), |cmd, (key, value)| {
        cmd.replace(&format!("{{{key}}}"), &quote_arg(value))
    })
}

/// Quote a single argument for the platform shell.
pub fn quote_arg(value: &str) -> String {
    if cfg!(windows) {
        format!("\"{}\"", value.replace('"', "\\\""))
    } else {
        format!("'{}'", value.replace('\'', r"'\''"))
    }
}

/// Run `cmd` through the platform shell in `cwd`.
///
/// `stdin` is piped to the process when given. Returns stdout; a non-zero
/// exit status is an error carrying stderr.
pub fn run_shell(cmd: &str, cwd: &Path, stdin: Option<&[u8]>) -> Result<Vec<u8>> {
    let mut command = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(cmd);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(cmd);
        c
    };

    command
        .current_dir(cwd)
        .stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    debug!(cmd = %cmd, cwd = %cwd.display(), "running external command");

    let mut child = command
        .spawn()
        .with_context(|| format!("spawning `{cmd}`"))?;

    // Feed stdin from a separate thread so a chatty child cannot deadlock
    // on a full stdout pipe.
    let writer = match (stdin, child.stdin.take()) {
        (Some(input), Some(mut pipe)) => {
            let input = input.to_vec();
            Some(thread::spawn(move || pipe.write_all(&input)))
        }
        _ => None,
    };

    let output = child
        .wait_with_output()
        .with_context(|| format!("waiting for `{cmd}`"))?;

    if let Some(writer) = writer {
        match writer.join() {
            Ok(res) => {
                // A broken pipe here means the child exited early; the exit
                // status below reports the real problem.
                if let Err(err) = res {
                    debug!(cmd = %cmd, error = %err, "writing to stdin failed");
                }
            }
            Err(_) => bail!("stdin writer for `{cmd}` panicked"),
        }
    }

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let code = output
            .status
            .code()
            .map_or_else(|| "signal".to_string(), |c| c.to_string());
        bail!("`{cmd}` exited with status {code}: {}", stderr.trim());
    }

    Ok(output.stdout)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn placeholders_are_quoted() {
        let cmd = render_command("bundle {entry} --out {output}", &[
            ("entry", "src/js/my file.js"),
            ("output", "it's.js"),
        ]);
        assert_eq!(cmd, r"bundle 'src/js/my file.js' --out 'it'\''s.js'");
    }

    #[test]
    fn stdin_is_piped_through() {
        let dir = std::env::temp_dir();
        let out = run_shell("cat", &dir, Some(b"hello")).unwrap();
        assert_eq!(out, b"hello");
    }

    #[test]
    fn failing_command_reports_stderr() {
        let dir = std::env::temp_dir();
        let err = run_shell("echo boom >&2; exit 3", &dir, None).unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("status 3"), "{msg}");
        assert!(msg.contains("boom"), "{msg}");
    }
}
