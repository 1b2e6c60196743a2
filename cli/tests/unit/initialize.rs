//! Workspace initialization: the one-shot latch and its preconditions.

#![allow(clippy::expect_used)]

use kubetest2_tf::domain::{BuildConfig, InitState, PreconditionError};

use crate::mocks::{
    CLUSTER, FakeBuilder, FakeHost, FakeInfra, FakePlaybook, RecordingReporter, common, config,
    count, deployer,
};

#[tokio::test]
async fn initialize_creates_workspace_once() {
    let dir = tempfile::tempdir().expect("tempdir");
    let infra = FakeInfra::with_hosts(&[], &[]);
    let playbook = FakePlaybook::exiting(0);
    let builder = FakeBuilder::default();
    let host = FakeHost::all_tools(dir.path());

    let d = deployer(config(dir.path()), common(dir.path()), &infra, &playbook, &builder, &host);
    assert_eq!(d.init_state(), InitState::Uninitialized);

    let (a, b, c) = tokio::join!(d.workspace(), d.workspace(), d.workspace());
    let ws = a.expect("workspace");
    assert_eq!(b.expect("workspace"), ws);
    assert_eq!(c.expect("workspace"), ws);

    assert!(ws.path().is_dir());
    assert_eq!(ws.name(), CLUSTER);
    assert_eq!(d.init_state(), InitState::Ready);
    assert_eq!(count(&host.locate_calls), 2);
}

#[tokio::test]
async fn existing_directory_is_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::create_dir(dir.path().join(CLUSTER)).expect("pre-existing");
    let infra = FakeInfra::with_hosts(&[], &[]);
    let playbook = FakePlaybook::exiting(0);
    let builder = FakeBuilder::default();
    let host = FakeHost::all_tools(dir.path());

    let d = deployer(config(dir.path()), common(dir.path()), &infra, &playbook, &builder, &host);
    let err = d.workspace().await.expect_err("workspace exists");

    assert!(matches!(err, PreconditionError::WorkspaceExists { .. }));
    assert!(err.to_string().contains("please choose a different cluster-name"));
    assert_eq!(d.init_state(), InitState::Failed);
}

#[tokio::test]
async fn existing_directory_is_reused_with_override() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::create_dir(dir.path().join(CLUSTER)).expect("pre-existing");
    let infra = FakeInfra::with_hosts(&[], &[]);
    let playbook = FakePlaybook::exiting(0);
    let builder = FakeBuilder::default();
    let host = FakeHost::all_tools(dir.path());

    let mut cfg = config(dir.path());
    cfg.ignore_cluster_dir = true;

    let d = deployer(cfg, common(dir.path()), &infra, &playbook, &builder, &host);
    d.workspace().await.expect("reused");
    assert_eq!(d.init_state(), InitState::Ready);
}

#[tokio::test]
async fn failed_initialization_is_replayed() {
    let dir = tempfile::tempdir().expect("tempdir");
    let conflict = dir.path().join(CLUSTER);
    std::fs::create_dir(&conflict).expect("pre-existing");
    let infra = FakeInfra::with_hosts(&["10.1.0.5"], &[]);
    let playbook = FakePlaybook::exiting(0);
    let builder = FakeBuilder::default();
    let host = FakeHost::all_tools(dir.path());

    let d = deployer(config(dir.path()), common(dir.path()), &infra, &playbook, &builder, &host);
    let first = d.workspace().await.expect_err("conflict");

    // the conflict going away does not re-run initialization
    std::fs::remove_dir(&conflict).expect("remove");
    let second = d.workspace().await.expect_err("cached failure");
    assert_eq!(first, second);

    let err = d.up(&RecordingReporter::default()).await.expect_err("up sees failure");
    assert!(format!("{err:#}").contains("up failed to init"));
    assert_eq!(count(&host.locate_calls), 2);
    assert_eq!(count(&infra.apply_calls), 0);
}

#[tokio::test]
async fn missing_tool_fails_fast() {
    let dir = tempfile::tempdir().expect("tempdir");
    let infra = FakeInfra::with_hosts(&[], &[]);
    let playbook = FakePlaybook::exiting(0);
    let builder = FakeBuilder::default();
    let host = FakeHost::with_tools(&["terraform"], dir.path());

    let d = deployer(config(dir.path()), common(dir.path()), &infra, &playbook, &builder, &host);
    let err = d.workspace().await.expect_err("missing ansible");

    assert_eq!(
        err,
        PreconditionError::MissingTool {
            tool: "ansible-playbook".to_string()
        }
    );
    assert!(!dir.path().join(CLUSTER).exists());
}

#[tokio::test]
async fn build_requires_make_at_initialization() {
    let dir = tempfile::tempdir().expect("tempdir");
    let infra = FakeInfra::with_hosts(&[], &[]);
    let playbook = FakePlaybook::exiting(0);
    let builder = FakeBuilder::default();
    let host = FakeHost::with_tools(&["terraform", "ansible-playbook"], dir.path());

    let mut cfg = config(dir.path());
    cfg.build = Some(BuildConfig {
        repo_root: None,
        target_platform: "linux/ppc64le".to_string(),
    });

    let d = deployer(cfg, common(dir.path()), &infra, &playbook, &builder, &host);
    let err = d.workspace().await.expect_err("missing make");
    assert!(matches!(err, PreconditionError::MissingTool { tool } if tool == "make"));
}

#[tokio::test]
async fn missing_repo_root_fails_initialization() {
    let dir = tempfile::tempdir().expect("tempdir");
    let infra = FakeInfra::with_hosts(&[], &[]);
    let playbook = FakePlaybook::exiting(0);
    let builder = FakeBuilder::default();
    let host = FakeHost::all_tools(dir.path());

    let mut cfg = config(dir.path());
    cfg.build = Some(BuildConfig {
        repo_root: Some(dir.path().join("kubernetes")),
        target_platform: "linux/ppc64le".to_string(),
    });

    let d = deployer(cfg, common(dir.path()), &infra, &playbook, &builder, &host);
    let err = d.workspace().await.expect_err("missing repo root");
    assert!(matches!(err, PreconditionError::RepoRootMissing { .. }));
}

#[tokio::test]
async fn invalid_cluster_name_is_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let infra = FakeInfra::with_hosts(&[], &[]);
    let playbook = FakePlaybook::exiting(0);
    let builder = FakeBuilder::default();
    let host = FakeHost::all_tools(dir.path());

    let mut vars = common(dir.path());
    vars.cluster_name = "../escape".to_string();

    let d = deployer(config(dir.path()), vars, &infra, &playbook, &builder, &host);
    let err = d.workspace().await.expect_err("invalid name");
    assert!(matches!(err, PreconditionError::InvalidClusterName(_)));
    assert_eq!(count(&host.locate_calls), 0);
}

#[tokio::test]
async fn build_defaults_repo_root_to_current_directory() {
    let dir = tempfile::tempdir().expect("tempdir");
    let infra = FakeInfra::with_hosts(&[], &[]);
    let playbook = FakePlaybook::exiting(0);
    let builder = FakeBuilder::default();
    let host = FakeHost::all_tools(dir.path());

    let mut cfg = config(dir.path());
    cfg.build = Some(BuildConfig {
        repo_root: None,
        target_platform: "linux/ppc64le".to_string(),
    });

    let d = deployer(cfg, common(dir.path()), &infra, &playbook, &builder, &host);
    d.build(&RecordingReporter::default()).await.expect("build");

    assert_eq!(
        *builder.last.lock().expect("lock"),
        Some((dir.path().to_path_buf(), "linux/ppc64le".to_string()))
    );
    assert!(!dir.path().join(CLUSTER).exists(), "build leaves no workspace");
}

#[tokio::test]
async fn build_failure_is_terminal() {
    let dir = tempfile::tempdir().expect("tempdir");
    let infra = FakeInfra::with_hosts(&[], &[]);
    let playbook = FakePlaybook::exiting(0);
    let builder = FakeBuilder {
        fail: true,
        ..FakeBuilder::default()
    };
    let host = FakeHost::all_tools(dir.path());

    let mut cfg = config(dir.path());
    cfg.build = Some(BuildConfig {
        repo_root: Some(dir.path().to_path_buf()),
        target_platform: "linux/amd64".to_string(),
    });

    let d = deployer(cfg, common(dir.path()), &infra, &playbook, &builder, &host);
    let err = d.build(&RecordingReporter::default()).await.expect_err("build failed");
    assert!(format!("{err:#}").contains("make quick-release failed"));
    assert_eq!(count(&builder.calls), 1);
}
