use std::process::Stdio;

use tokio::io::AsyncWriteExt;

use crate::docker::DockerError;

/// Abstraction over docker CLI execution for testability.
///
/// Production code uses [`RealExecutor`], tests use mockall-generated mocks.
#[allow(async_fn_in_trait)]
pub trait DockerExecutor: Send + Sync {
    /// Execute a docker command and capture stdout.
    async fn exec(&self, args: &[String]) -> Result<String, DockerError>;

    /// Execute a docker command, streaming output to the terminal.
    async fn exec_streaming(&self, args: &[String]) -> Result<(), DockerError>;

    /// Execute a docker command with data piped to stdin.
    async fn exec_with_stdin(&self, args: &[String], stdin_data: &[u8])
    -> Result<String, DockerError>;
}

/// Runs the real docker CLI (or a compatible one, e.g. `podman`).
pub struct RealExecutor {
    program: String,
}

impl RealExecutor {
    pub fn new() -> Self {
        Self::with_program("docker")
    }

    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn not_found(&self, source: std::io::Error) -> DockerError {
        DockerError::NotFound {
            program: self.program.clone(),
            source,
        }
    }

    fn command(&self, args: &[String]) -> tokio::process::Command {
        tracing::debug!(program = %self.program, ?args, "running container CLI");
        let mut cmd = tokio::process::Command::new(&self.program);
        cmd.args(args);
        cmd
    }
}

impl Default for RealExecutor {
    fn default() -> Self {
        Self::new()
    }
}

/// Map a finished process to its stdout, or to `CommandFailed`.
fn captured(args: &[String], output: std::process::Output) -> Result<String, DockerError> {
    if !output.status.success() {
        return Err(DockerError::CommandFailed {
            args: args.to_vec(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }
    String::from_utf8(output.stdout).map_err(|e| DockerError::InvalidUtf8 { source: e })
}

impl DockerExecutor for RealExecutor {
    async fn exec(&self, args: &[String]) -> Result<String, DockerError> {
        let output = self
            .command(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| self.not_found(e))?;

        captured(args, output)
    }

    async fn exec_streaming(&self, args: &[String]) -> Result<(), DockerError> {
        let status = self
            .command(args)
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| self.not_found(e))?;

        if status.success() {
            Ok(())
        } else {
            Err(DockerError::CommandFailed {
                args: args.to_vec(),
                stderr: format!("exit code: {status}"),
            })
        }
    }

    async fn exec_with_stdin(
        &self,
        args: &[String],
        stdin_data: &[u8],
    ) -> Result<String, DockerError> {
        let mut child = self
            .command(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.not_found(e))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(stdin_data)
                .await
                .map_err(|e| DockerError::StdinWrite { source: e })?;
            // close stdin so `--password-stdin` sees EOF
            drop(stdin);
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| self.not_found(e))?;

        captured(args, output)
    }
}
