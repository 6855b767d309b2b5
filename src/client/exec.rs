use std::process::Stdio;
use tokio::process::Command;

/// Exit code reported when the command never produced one.
pub const NO_EXIT_CODE: i32 = 0;

/// Exit code reported when the command was killed by a signal.
pub const SIGNALED_EXIT_CODE: i32 = -1;

/// What happened to a wrapped command
#[derive(Debug)]
pub struct CommandOutcome {
    pub exit_code: i32,
    /// `Err` if the command could not be started or did not exit cleanly.
    pub result: anyhow::Result<()>,
}

impl CommandOutcome {
    /// Status this process should exit with to pass the command's result on
    ///
    /// The command's own exit code when it exited non-zero, 1 when it could
    /// not be started or was killed by a signal, 0 on success.
    pub fn process_exit_code(&self) -> i32 {
        match (&self.result, self.exit_code) {
            (Ok(()), _) => 0,
            (Err(_), code) if code > 0 => code,
            (Err(_), _) => 1,
        }
    }
}

/// Runs `command` with inherited stdio and waits for it
pub async fn run_command(command: &str, args: &[String]) -> CommandOutcome {
    let status = Command::new(command)
        .args(args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .await;

    match status {
        Ok(status) if status.success() => CommandOutcome {
            exit_code: 0,
            result: Ok(()),
        },
        Ok(status) => CommandOutcome {
            exit_code: status.code().unwrap_or(SIGNALED_EXIT_CODE),
            result: Err(anyhow::anyhow!("command {} failed: {}", command, status)),
        },
        Err(e) => CommandOutcome {
            exit_code: NO_EXIT_CODE,
            result: Err(anyhow::Error::new(e).context(format!("failed to run command {}", command))),
        },
    }
}
