use mockall::mock;
use relkit_image::docker::DockerError;
use relkit_image::executor::DockerExecutor;
use relkit_image::pipeline::{
    BuildRequest, ImagePipeline, PipelineError, RegistryTarget, image_references, oci_labels,
};
use secrecy::SecretString;
use std::path::PathBuf;

mock! {
    Executor {}

    impl DockerExecutor for Executor {
        async fn exec(&self, args: &[String]) -> Result<String, DockerError>;
        async fn exec_streaming(&self, args: &[String]) -> Result<(), DockerError>;
        async fn exec_with_stdin(
            &self,
            args: &[String],
            stdin_data: &[u8],
        ) -> Result<String, DockerError>;
    }
}

fn tags() -> Vec<String> {
    ["v1", "v1.2", "v1.2.3", "latest"]
        .iter()
        .map(|s| (*s).to_owned())
        .collect()
}

fn request() -> BuildRequest {
    BuildRequest {
        context: "src".to_owned(),
        platforms: vec!["linux/amd64".to_owned(), "linux/arm64".to_owned()],
        references: vec![
            "acme/api:v1".to_owned(),
            "ghcr.io/acme/api:v1".to_owned(),
        ],
        labels: oci_labels("api", "v1.2.3", "https://github.com/Acme/api"),
    }
}

// ── References and labels ──

#[test]
fn references_group_by_registry_in_tag_order() {
    let targets = [
        RegistryTarget::docker_hub("acmebot"),
        RegistryTarget::ghcr("Acme"),
    ];

    let refs = image_references("api", &tags(), &targets);

    assert_eq!(
        refs,
        vec![
            "acmebot/api:v1",
            "acmebot/api:v1.2",
            "acmebot/api:v1.2.3",
            "acmebot/api:latest",
            "ghcr.io/acme/api:v1",
            "ghcr.io/acme/api:v1.2",
            "ghcr.io/acme/api:v1.2.3",
            "ghcr.io/acme/api:latest",
        ]
    );
}

#[test]
fn ghcr_target_logs_into_ghcr() {
    let target = RegistryTarget::ghcr("Acme");
    assert_eq!(target.registry.as_deref(), Some("ghcr.io"));
    assert!(RegistryTarget::docker_hub("acme").registry.is_none());
}

#[test]
fn labels_follow_oci_order() {
    let labels = oci_labels("api", "v1.2.3", "https://github.com/acme/api");
    let keys: Vec<&str> = labels.iter().map(|(k, _)| k.as_str()).collect();

    assert_eq!(
        keys,
        vec![
            "org.opencontainers.image.title",
            "org.opencontainers.image.version",
            "org.opencontainers.image.source",
        ]
    );
    assert_eq!(labels[1].1, "v1.2.3");
}

#[test]
fn build_args_layout() {
    let args = request().to_args();

    assert_eq!(
        args,
        vec![
            "buildx",
            "build",
            "--platform",
            "linux/amd64,linux/arm64",
            "--push",
            "-t",
            "acme/api:v1",
            "-t",
            "ghcr.io/acme/api:v1",
            "--label",
            "org.opencontainers.image.title=api",
            "--label",
            "org.opencontainers.image.version=v1.2.3",
            "--label",
            "org.opencontainers.image.source=https://github.com/Acme/api",
            "src",
        ]
    );
}

// ── Pipeline ──

#[tokio::test]
async fn setup_creates_builder_and_registers_qemu() {
    let mut mock = MockExecutor::new();
    mock.expect_exec()
        .withf(|args| args == ["buildx", "create", "--use"])
        .times(1)
        .returning(|_| Ok("builder-1\n".to_owned()));
    mock.expect_exec()
        .withf(|args| args.contains(&"multiarch/qemu-user-static".to_owned()))
        .times(1)
        .returning(|_| Ok(String::new()));

    let pipeline = ImagePipeline::with_executor(mock);
    pipeline.setup_builder().await.unwrap();
}

#[tokio::test]
async fn login_passes_password_on_stdin() {
    let mut mock = MockExecutor::new();
    mock.expect_exec_with_stdin()
        .withf(|args, stdin| {
            args == ["login", "ghcr.io", "-u", "octocat", "--password-stdin"]
                && stdin == b"ghp_secret"
        })
        .times(1)
        .returning(|_, _| Ok("Login Succeeded\n".to_owned()));

    let pipeline = ImagePipeline::with_executor(mock);
    pipeline
        .login(
            Some("ghcr.io"),
            "octocat",
            &SecretString::from("ghp_secret".to_owned()),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn docker_hub_login_omits_registry() {
    let mut mock = MockExecutor::new();
    mock.expect_exec_with_stdin()
        .withf(|args, _| args == ["login", "-u", "acme", "--password-stdin"])
        .returning(|_, _| Ok(String::new()));

    let pipeline = ImagePipeline::with_executor(mock);
    pipeline
        .login(None, "acme", &SecretString::from("dckr".to_owned()))
        .await
        .unwrap();
}

#[tokio::test]
async fn failed_login_names_registry() {
    let mut mock = MockExecutor::new();
    mock.expect_exec_with_stdin().returning(|_, _| {
        Err(DockerError::CommandFailed {
            args: vec![],
            stderr: "unauthorized".to_owned(),
        })
    });

    let pipeline = ImagePipeline::with_executor(mock);
    let result = pipeline
        .login(None, "acme", &SecretString::from("bad".to_owned()))
        .await;

    assert!(matches!(
        result,
        Err(PipelineError::Login { ref registry, .. }) if registry == "docker.io"
    ));
}

#[tokio::test]
async fn build_streams_buildx_command() {
    let mut mock = MockExecutor::new();
    mock.expect_exec_streaming()
        .withf(|args| args.starts_with(&["buildx".to_owned(), "build".to_owned()]))
        .times(1)
        .returning(|_| Ok(()));

    let pipeline = ImagePipeline::with_executor(mock);
    pipeline.build_and_push(&request()).await.unwrap();
}

#[tokio::test]
async fn build_without_references_is_rejected() {
    let mut mock = MockExecutor::new();
    mock.expect_exec_streaming().never();

    let pipeline = ImagePipeline::with_executor(mock);
    let mut req = request();
    req.references.clear();

    assert!(matches!(
        pipeline.build_and_push(&req).await,
        Err(PipelineError::NoReferences)
    ));
}

#[tokio::test]
async fn build_without_platforms_is_rejected() {
    let mock = MockExecutor::new();
    let pipeline = ImagePipeline::with_executor(mock);
    let mut req = request();
    req.platforms.clear();

    assert!(matches!(
        pipeline.build_and_push(&req).await,
        Err(PipelineError::NoPlatforms)
    ));
}

#[tokio::test]
async fn build_failure_is_reported() {
    let mut mock = MockExecutor::new();
    mock.expect_exec_streaming().returning(|_| {
        Err(DockerError::CommandFailed {
            args: vec![],
            stderr: "exit code: 1".to_owned(),
        })
    });

    let pipeline = ImagePipeline::with_executor(mock);
    assert!(matches!(
        pipeline.build_and_push(&request()).await,
        Err(PipelineError::Build { .. })
    ));
}

#[tokio::test]
async fn save_writes_tarball() {
    let mut mock = MockExecutor::new();
    mock.expect_exec()
        .withf(|args| args == ["save", "ghcr.io/acme/api:v1.2.3", "-o", "api.tar"])
        .times(1)
        .returning(|_| Ok(String::new()));

    let pipeline = ImagePipeline::with_executor(mock);
    pipeline
        .save("ghcr.io/acme/api:v1.2.3", &PathBuf::from("api.tar"))
        .await
        .unwrap();
}
