#[derive(Debug, thiserror::Error)]
pub enum DockerError {
    #[error(
        "cannot run `{program}`; install docker (https://docs.docker.com/get-docker/) \
         or select a compatible CLI with RealExecutor::with_program"
    )]
    NotFound {
        program: String,
        source: std::io::Error,
    },

    #[error("docker command failed: {args:?}\n{stderr}")]
    CommandFailed { args: Vec<String>, stderr: String },

    #[error("docker output was not valid UTF-8")]
    InvalidUtf8 { source: std::string::FromUtf8Error },

    #[error("failed to write to docker stdin")]
    StdinWrite { source: std::io::Error },
}
