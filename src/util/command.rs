use std::process::Command;

use tracing::debug;

use crate::error::{Result, RescueError};
use crate::types::RunMode;

pub fn command_line(cmd: &Command) -> String {
    let program = cmd.get_program().to_string_lossy();
    let args: Vec<String> = cmd
        .get_args()
        .map(|a| a.to_string_lossy().to_string())
        .collect();
    format!("{} {}", program, args.join(" "))
}

pub fn maybe_print_command(cmd: &Command, run_mode: RunMode) {
    debug!(command = %command_line(cmd), "exec");
    if run_mode.verbose {
        println!("{}", command_line(cmd));
    }
}

/// Runs with inherited stdio and returns the exit code.
pub fn run_command(cmd: &mut Command, run_mode: RunMode) -> Result<i32> {
    maybe_print_command(cmd, run_mode);
    let status = cmd
        .status()
        .map_err(|e| RescueError::message(format!("{}: {}", cmd.get_program().to_string_lossy(), e)))?;
    Ok(status.code().unwrap_or(1))
}

/// Runs with captured output; a non-zero exit is a query failure.
pub fn capture_stdout(cmd: &mut Command, run_mode: RunMode) -> Result<String> {
    maybe_print_command(cmd, run_mode);
    let program = cmd.get_program().to_string_lossy().to_string();
    let output = cmd
        .output()
        .map_err(|e| RescueError::query(format!("{}: {}", program, e)))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(RescueError::query(format!(
            "{} failed with exit code {}: {}",
            program,
            output.status.code().unwrap_or(1),
            stderr
        )));
    }
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    if stdout.trim().is_empty() {
        return Err(RescueError::query(format!("{} produced no output", program)));
    }
    Ok(stdout)
}
