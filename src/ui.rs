//! Terminal UI and process execution: spinners, stage banners, and captured
//! command output.
//!
//! # Two ways to run a command
//!
//! - **Streamed.** The child inherits stdout/stderr, so `pgbackrest info` and
//!   friends print straight to the terminal.  This is the default for every
//!   command that has something to show.
//! - **Captured.** While the child runs the user sees only a spinner and a
//!   short label.  If it exits non-zero its captured stdout *and* stderr are
//!   replayed so the operator can diagnose the problem without re-running.
//!
//! With `--dry-run` neither happens: the command line is printed instead.

use std::{
    io::Write,
    process::{Child, Command, ExitStatus, Stdio},
    time::Duration,
};

use anyhow::{Context, Result, bail};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, warn};

use crate::{cli::Cli, runner::Invocation};

// ─── Icons ───────────────────────────────────────────────────────────────────

static SPINNER_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

fn icon_ok() -> console::StyledObject<&'static str> {
    style("✓").green().bold()
}
fn icon_err() -> console::StyledObject<&'static str> {
    style("✗").red().bold()
}
fn icon_done() -> console::StyledObject<&'static str> {
    style("✓").cyan().bold()
}

// ─── Stage result ─────────────────────────────────────────────────────────────

/// The outcome of a single step of a multi-step command.
///
/// Carries the step label plus whatever the command wrote to stdout/stderr so
/// it can be replayed to the terminal when something goes wrong.
#[derive(Debug)]
pub struct StageOutcome {
    /// Human-readable label, e.g. `"Create cluster"`.
    pub label: String,
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    pub error: Option<String>,
}

impl StageOutcome {
    pub fn ok(label: &str) -> Self {
        Self {
            label: label.to_string(),
            success: true,
            stdout: String::new(),
            stderr: String::new(),
            error: None,
        }
    }

    pub fn from_result(label: &str, result: Result<()>) -> Self {
        match result {
            Ok(()) => Self::ok(label),
            Err(e) => Self {
                label: label.to_string(),
                success: false,
                stdout: String::new(),
                stderr: String::new(),
                error: Some(format!("{e:#}")),
            },
        }
    }

    /// Print the one-line summary (✓/✗ + label).
    ///
    /// On failure, also prints the captured stdout/stderr and the error
    /// message.
    pub fn print(&self) {
        if self.success {
            println!("  {}  {}", icon_ok(), style(&self.label).bold());
            return;
        }

        println!("  {}  {}", icon_err(), style(&self.label).bold());
        if let Some(ref msg) = self.error {
            eprintln!();
            eprintln!("  {} {}", style("Error:").red().bold(), msg);
        }
        if !self.stdout.is_empty() {
            eprintln!();
            eprintln!("  {} stdout:", style("►").dim());
            for line in self.stdout.lines() {
                eprintln!("    {line}");
            }
        }
        if !self.stderr.is_empty() {
            eprintln!();
            eprintln!("  {} stderr:", style("►").dim());
            for line in self.stderr.lines() {
                eprintln!("    {line}");
            }
        }
    }

    pub const fn failed(&self) -> bool {
        !self.success
    }
}

// ─── Spinner ──────────────────────────────────────────────────────────────────

fn make_spinner(label: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(s) = ProgressStyle::with_template("  {spinner:.cyan}  {msg}") {
        pb.set_style(s.tick_chars(SPINNER_CHARS));
    }
    pb.set_message(format!("{}", style(label).dim()));
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

// ─── Spawning ─────────────────────────────────────────────────────────────────

fn spawn(inv: &Invocation, stdout: Stdio, stderr: Stdio) -> Result<Child> {
    let (prog, rest) = inv
        .args
        .split_first()
        .context("cannot run an empty command")?;

    let stdin = if inv.stdin.is_some() {
        Stdio::piped()
    } else {
        Stdio::null()
    };

    let mut child = Command::new(prog)
        .args(rest)
        .stdin(stdin)
        .stdout(stdout)
        .stderr(stderr)
        .spawn()
        .with_context(|| format!("failed to spawn: {inv}"))?;

    if let Some(text) = &inv.stdin {
        // Dropping the handle closes the pipe so the child sees EOF.
        let mut pipe = child.stdin.take().context("child stdin was not piped")?;
        if let Err(e) = pipe.write_all(text.as_bytes()) {
            drop(pipe);
            // The child went away early; its status and stderr say why.
            let output = child
                .wait_with_output()
                .with_context(|| format!("waiting for: {inv}"))?;
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "`{inv}` exited with {} before reading its stdin ({e}){}{}",
                output.status,
                if stderr.trim().is_empty() { "" } else { ": " },
                stderr.trim()
            );
        }
    }

    Ok(child)
}

/// Run a command, capturing both stdout and stderr.
///
/// Returns `(status, stdout_text, stderr_text)`.
pub fn run_captured(inv: &Invocation) -> Result<(ExitStatus, String, String)> {
    let output = spawn(inv, Stdio::piped(), Stdio::piped())?
        .wait_with_output()
        .with_context(|| format!("waiting for: {inv}"))?;

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

    Ok((output.status, stdout, stderr))
}

/// Run a command with the parent's stdout/stderr.
pub fn run_inherited(inv: &Invocation) -> Result<ExitStatus> {
    spawn(inv, Stdio::inherit(), Stdio::inherit())?
        .wait()
        .with_context(|| format!("waiting for: {inv}"))
}

// ─── Stage runner ─────────────────────────────────────────────────────────────

/// Run a command behind a spinner, returning a [`StageOutcome`].
pub fn run_stage(label: &str, inv: &Invocation) -> StageOutcome {
    let spinner = make_spinner(label);

    let result = run_captured(inv);
    spinner.finish_and_clear();

    match result {
        Ok((status, stdout, stderr)) if status.success() => StageOutcome {
            label: label.to_string(),
            success: true,
            stdout,
            stderr,
            error: None,
        },
        Ok((status, stdout, stderr)) => StageOutcome {
            label: label.to_string(),
            success: false,
            stdout,
            stderr,
            error: Some(format!("`{inv}` exited with {status}")),
        },
        Err(e) => StageOutcome {
            label: label.to_string(),
            success: false,
            stdout: String::new(),
            stderr: String::new(),
            error: Some(format!("{e:#}")),
        },
    }
}

/// Run `inv` according to the global flags.
///
/// - `--dry-run`: print the command line and return.
/// - `print`: stream output to the terminal.
/// - otherwise: run behind a spinner, replaying output only on failure.
///
/// A non-zero exit is an error naming the command and its exit status.
pub fn execute(cli: &Cli, label: &str, inv: &Invocation, print: bool) -> Result<()> {
    debug!(command = %inv, "{label}");
    if cli.dry_run {
        println!("  {} {inv}", style("would run:").dim());
        return Ok(());
    }

    if print {
        let status = run_inherited(inv)?;
        if !status.success() {
            bail!("{label} failed: `{inv}` exited with {status}");
        }
        return Ok(());
    }

    let outcome = run_stage(label, inv);
    outcome.print();
    if outcome.failed() {
        bail!("{label} failed: {}", outcome.error.unwrap_or_default());
    }
    Ok(())
}

/// Like [`execute`] (captured), but a failure is only logged.
///
/// Used for idempotent "stop/drop it if it is there" steps.
pub fn execute_suppressed(cli: &Cli, label: &str, inv: &Invocation) -> StageOutcome {
    debug!(command = %inv, "{label}");
    if cli.dry_run {
        println!("  {} {inv}", style("would run:").dim());
        return StageOutcome::ok(label);
    }

    let spinner = make_spinner(label);
    let result = run_captured(inv);
    spinner.finish_and_clear();

    match result {
        Ok((status, ..)) if status.success() => {},
        Ok((status, _, stderr)) => {
            warn!(command = %inv, %status, stderr = stderr.trim(), "{label}: ignoring failure");
        },
        Err(e) => warn!(command = %inv, "{label}: ignoring error: {e:#}"),
    }
    StageOutcome::ok(label)
}

// ─── Summary banner ───────────────────────────────────────────────────────────

/// Print the final summary after all steps have run.
pub fn print_summary(what: &str, outcomes: &[StageOutcome]) {
    let failed: Vec<&StageOutcome> = outcomes.iter().filter(|o| o.failed()).collect();
    println!();
    if failed.is_empty() {
        println!(
            "  {} {}",
            icon_done(),
            style(format!("{what} completed successfully.")).cyan().bold()
        );
    } else {
        eprintln!(
            "  {}  {}",
            icon_err(),
            style(format!("{what} failed.")).red().bold()
        );
        for o in &failed {
            eprintln!("    {} {}", icon_err(), style(&o.label).red());
        }
    }
    println!();
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    fn inv(args: &[&str]) -> Invocation {
        Invocation::new(args.iter().map(|s| (*s).to_string()).collect())
    }

    fn sh(script: &str) -> Invocation {
        inv(&["sh", "-c", script])
    }

    fn make_cli(extra: &[&str]) -> Cli {
        Cli::parse_from(
            std::iter::once("postgres-rs")
                .chain(extra.iter().copied())
                .chain(["start"]),
        )
    }

    // ── StageOutcome ──────────────────────────────────────────────────────────

    #[test]
    fn ok_outcome_is_not_failed() {
        assert!(!StageOutcome::ok("Check").failed());
    }

    #[test]
    fn error_result_becomes_failed_outcome() {
        let o = StageOutcome::from_result("Write", Err(anyhow::anyhow!("disk full")));
        assert!(o.failed());
        assert_eq!(o.error.as_deref(), Some("disk full"));
    }

    // ── run_captured ─────────────────────────────────────────────────────────

    #[test]
    fn run_captured_true_succeeds() {
        let (status, _out, _err) = run_captured(&inv(&["true"])).unwrap();
        assert!(status.success());
    }

    #[test]
    fn run_captured_false_fails() {
        let (status, _out, _err) = run_captured(&inv(&["false"])).unwrap();
        assert!(!status.success());
    }

    #[test]
    fn run_captured_captures_stdout_and_stderr() {
        let (status, out, err) = run_captured(&sh("echo hello; echo oops >&2")).unwrap();
        assert!(status.success());
        assert!(out.contains("hello"));
        assert!(err.contains("oops"));
    }

    #[test]
    fn run_captured_feeds_stdin() {
        let (status, out, _err) =
            run_captured(&inv(&["cat"]).with_stdin("from stdin\n")).unwrap();
        assert!(status.success());
        assert_eq!(out, "from stdin\n");
    }

    #[test]
    fn run_captured_reports_exit_code() {
        let (status, ..) = run_captured(&sh("exit 5")).unwrap();
        assert_eq!(status.code(), Some(5));
    }

    #[test]
    fn child_that_ignores_stdin_is_reaped_and_reported() {
        // Larger than a pipe buffer, so the write cannot finish before exit.
        let big = "x".repeat(1 << 20);
        let err = run_captured(&sh("echo gone >&2; exit 4").with_stdin(big)).unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("exit status: 4"), "{msg}");
        assert!(msg.contains("gone"), "{msg}");
    }

    #[test]
    fn run_captured_empty_args_errors() {
        assert!(run_captured(&Invocation::new(vec![])).is_err());
    }

    // ── run_stage ─────────────────────────────────────────────────────────────

    #[test]
    fn run_stage_failure_keeps_output() {
        let o = run_stage("Test", &sh("echo bad output; exit 1"));
        assert!(o.failed());
        assert!(o.stdout.contains("bad output"));
        let error = o.error.unwrap();
        assert!(error.contains("exit status: 1"), "{error}");
        assert!(error.contains("bad output; exit 1"), "{error}");
    }

    // ── execute ───────────────────────────────────────────────────────────────

    #[test]
    fn execute_streamed_success() {
        execute(&make_cli(&[]), "True", &inv(&["true"]), true).unwrap();
    }

    #[test]
    fn execute_streamed_failure_is_error() {
        let err = execute(&make_cli(&[]), "False", &inv(&["false"]), true).unwrap_err();
        assert!(err.to_string().contains("False failed"));
    }

    #[test]
    fn execute_captured_failure_names_command_and_status() {
        let err = execute(&make_cli(&[]), "Stanza create", &sh("exit 3"), false).unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.starts_with("Stanza create failed: `sh -c 'exit 3'`"), "{msg}");
        assert!(msg.contains("exit status: 3"), "{msg}");
    }

    #[test]
    fn execute_dry_run_does_not_spawn() {
        let cli = make_cli(&["--dry-run"]);
        execute(&cli, "Nope", &inv(&["/definitely/not/a/binary"]), true).unwrap();
    }

    #[test]
    fn execute_suppressed_swallows_failures() {
        let o = execute_suppressed(&make_cli(&[]), "Drop", &inv(&["false"]));
        assert!(!o.failed());
        let o = execute_suppressed(&make_cli(&[]), "Drop", &inv(&["/no/such/binary"]));
        assert!(!o.failed());
    }

    // ── print_summary ─────────────────────────────────────────────────────────

    #[test]
    fn summary_smoke() {
        let outcomes = vec![
            StageOutcome::ok("Create cluster"),
            StageOutcome::from_result("Write", Err(anyhow::anyhow!("nope"))),
        ];
        print_summary("Set-up", &outcomes);
    }
}
