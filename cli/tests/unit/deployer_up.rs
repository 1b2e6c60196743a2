//! `Deployer::up`: apply retries, inventory, playbook and kubeconfig rewrite.

#![allow(clippy::expect_used)]

use kubetest2_tf::domain::{ApplyError, InventoryError, PlaybookError, PreconditionError};

use crate::mocks::{
    CLUSTER, FakeBuilder, FakeHost, FakeInfra, FakePlaybook, KUBECONFIG, RecordingReporter,
    common, config, count, deployer, err_output,
};

#[tokio::test]
async fn up_writes_inventory_runs_playbook_and_rewrites_kubeconfig() {
    let dir = tempfile::tempdir().expect("tempdir");
    let ws = dir.path().join(CLUSTER);
    let infra = FakeInfra::with_hosts(&["10.1.0.5", "10.1.0.6"], &["10.1.0.7"]);
    let playbook = FakePlaybook::producing_kubeconfig(ws.join("kubeconfig"), KUBECONFIG);
    let builder = FakeBuilder::default();
    let host = FakeHost::all_tools(dir.path());
    let reporter = RecordingReporter::default();

    let d = deployer(config(dir.path()), common(dir.path()), &infra, &playbook, &builder, &host);
    let outcome = d.up(&reporter).await.expect("up");

    assert_eq!(outcome.apply_attempts, 1);
    assert_eq!(outcome.workspace, ws);
    assert_eq!(
        std::fs::read_to_string(ws.join("hosts")).expect("hosts"),
        "[masters]\n10.1.0.5\n10.1.0.6\n\n[workers]\n10.1.0.7\n\n"
    );
    assert!(ws.join("common.auto.tfvars.json").exists());
    assert!(ws.join("powervs.auto.tfvars.json").exists());
    assert_eq!(count(&infra.init_calls), 1);
    assert_eq!(count(&playbook.calls), 1);
    assert_eq!(
        *host.unpacked.lock().expect("lock"),
        vec!["powervs".to_string(), "k8s-ansible".to_string()]
    );

    let kubeconfig = outcome.kubeconfig.expect("kubeconfig path");
    assert!(kubeconfig.is_absolute());
    let rewritten = std::fs::read_to_string(&kubeconfig).expect("kubeconfig");
    assert!(rewritten.contains("https://10.1.0.5:6443"), "{rewritten}");
    assert!(!rewritten.contains("10.0.0.1"));
}

#[tokio::test]
async fn up_passes_merged_extra_vars_with_control_plane_certs() {
    let dir = tempfile::tempdir().expect("tempdir");
    let infra = FakeInfra::with_hosts(&["10.1.0.5", "10.1.0.6"], &[]);
    let playbook = FakePlaybook::exiting(0);
    let builder = FakeBuilder::default();
    let host = FakeHost::all_tools(dir.path());

    let mut cfg = config(dir.path());
    cfg.rewrite_kubeconfig = false;
    cfg.extra_vars.insert("runtime".to_string(), "crio".to_string());
    cfg.extra_vars.insert("k8s_branch".to_string(), "main".to_string());

    let d = deployer(cfg, common(dir.path()), &infra, &playbook, &builder, &host);
    let outcome = d.up(&RecordingReporter::default()).await.expect("up");
    assert!(outcome.kubeconfig.is_none());

    let payload = playbook.extra_vars.lock().expect("lock").clone().expect("payload");
    let vars: serde_json::Value = serde_json::from_str(&payload).expect("json payload");
    assert_eq!(vars["extra_cert"], "10.1.0.5,10.1.0.6");
    assert_eq!(vars["runtime"], "crio");
    assert_eq!(vars["k8s_branch"], "main");
    assert_eq!(vars["cluster_name"], CLUSTER);
    assert_eq!(vars["apiserver_port"], 6443);
}

#[tokio::test]
async fn apply_is_retried_until_it_succeeds() {
    let dir = tempfile::tempdir().expect("tempdir");
    let infra = FakeInfra::with_hosts(&["10.1.0.5"], &[]).failing_applies(&[1, 1]);
    let playbook = FakePlaybook::exiting(0);
    let builder = FakeBuilder::default();
    let host = FakeHost::all_tools(dir.path());
    let reporter = RecordingReporter::default();

    let mut cfg = config(dir.path());
    cfg.apply_retries = 3;
    cfg.rewrite_kubeconfig = false;

    let d = deployer(cfg, common(dir.path()), &infra, &playbook, &builder, &host);
    let outcome = d.up(&reporter).await.expect("up");

    assert_eq!(outcome.apply_attempts, 3);
    assert_eq!(count(&infra.apply_calls), 3);
    assert_eq!(reporter.warnings.lock().expect("lock").len(), 2);
    assert_eq!(count(&playbook.calls), 1);
}

#[tokio::test]
async fn exhausted_apply_returns_error_and_skips_playbook() {
    let dir = tempfile::tempdir().expect("tempdir");
    let infra = FakeInfra::with_hosts(&["10.1.0.5"], &[]).failing_applies(&[1, 1, 1]);
    let playbook = FakePlaybook::exiting(0);
    let builder = FakeBuilder::default();
    let host = FakeHost::all_tools(dir.path());

    let mut cfg = config(dir.path());
    cfg.apply_retries = 1;

    let d = deployer(cfg, common(dir.path()), &infra, &playbook, &builder, &host);
    let err = d.up(&RecordingReporter::default()).await.expect_err("apply exhausted");

    match err.downcast_ref::<ApplyError>() {
        Some(ApplyError::Exhausted {
            attempts,
            exit_code,
        }) => {
            assert_eq!(*attempts, 2);
            assert_eq!(*exit_code, Some(1));
        }
        other => panic!("expected ApplyError::Exhausted, got {other:?}"),
    }
    assert_eq!(count(&infra.apply_calls), 2);
    assert_eq!(count(&playbook.calls), 0);
    assert!(!dir.path().join(CLUSTER).join("hosts").exists());
}

#[tokio::test]
async fn every_attempt_logs_terraform_output() {
    let dir = tempfile::tempdir().expect("tempdir");
    let infra = FakeInfra::with_hosts(&["10.1.0.5"], &[]).failing_applies(&[1]);
    let playbook = FakePlaybook::exiting(0);
    let builder = FakeBuilder::default();
    let host = FakeHost::all_tools(dir.path());

    let mut cfg = config(dir.path());
    cfg.rewrite_kubeconfig = false;

    let d = deployer(cfg, common(dir.path()), &infra, &playbook, &builder, &host);
    d.up(&RecordingReporter::default()).await.expect("up");

    // two diagnostic queries plus one per role
    assert_eq!(count(&infra.output_calls), 4);
}

#[tokio::test]
async fn empty_masters_is_a_precondition_failure() {
    let dir = tempfile::tempdir().expect("tempdir");
    let ws = dir.path().join(CLUSTER);
    let infra = FakeInfra::with_hosts(&[], &["10.1.0.7"]);
    let playbook = FakePlaybook::exiting(0);
    let builder = FakeBuilder::default();
    let host = FakeHost::all_tools(dir.path());

    let d = deployer(config(dir.path()), common(dir.path()), &infra, &playbook, &builder, &host);
    let err = d.up(&RecordingReporter::default()).await.expect_err("no masters");

    assert!(matches!(
        err.downcast_ref::<PreconditionError>(),
        Some(PreconditionError::NoControlPlane { .. })
    ));
    assert_eq!(count(&playbook.calls), 0);
    assert!(!ws.join("kubeconfig").exists());
    assert!(ws.join("hosts").exists());
}

#[tokio::test]
async fn failed_role_query_is_fatal() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut infra = FakeInfra::with_hosts(&["10.1.0.5"], &[]);
    infra
        .role_outputs
        .insert("workers", err_output(1, b"Error: Output \"workers\" not found"));
    let playbook = FakePlaybook::exiting(0);
    let builder = FakeBuilder::default();
    let host = FakeHost::all_tools(dir.path());

    let d = deployer(config(dir.path()), common(dir.path()), &infra, &playbook, &builder, &host);
    let err = d.up(&RecordingReporter::default()).await.expect_err("output failed");

    assert!(matches!(
        err.downcast_ref::<InventoryError>(),
        Some(InventoryError::OutputFailed { role, exit_code: Some(1) }) if role == "workers"
    ));
    assert_eq!(count(&playbook.calls), 0);
}

#[tokio::test]
async fn malformed_role_output_is_fatal() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut infra = FakeInfra::with_hosts(&["10.1.0.5"], &[]);
    infra
        .role_outputs
        .insert("masters", crate::mocks::ok_output(br#"{"not":"a list"}"#));
    let playbook = FakePlaybook::exiting(0);
    let builder = FakeBuilder::default();
    let host = FakeHost::all_tools(dir.path());

    let d = deployer(config(dir.path()), common(dir.path()), &infra, &playbook, &builder, &host);
    let err = d.up(&RecordingReporter::default()).await.expect_err("malformed");

    assert!(matches!(
        err.downcast_ref::<InventoryError>(),
        Some(InventoryError::Malformed { .. })
    ));
}

#[tokio::test]
async fn playbook_failure_carries_exit_code() {
    let dir = tempfile::tempdir().expect("tempdir");
    let infra = FakeInfra::with_hosts(&["10.1.0.5"], &[]);
    let playbook = FakePlaybook::exiting(4);
    let builder = FakeBuilder::default();
    let host = FakeHost::all_tools(dir.path());

    let d = deployer(config(dir.path()), common(dir.path()), &infra, &playbook, &builder, &host);
    let err = d.up(&RecordingReporter::default()).await.expect_err("playbook failed");

    assert!(matches!(
        err.downcast_ref::<PlaybookError>(),
        Some(PlaybookError::Failed { exit_code: Some(4), .. })
    ));
    assert!(err.to_string().contains("install-k8s.yml"));
}

#[tokio::test]
async fn terraform_init_failure_stops_before_apply() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut infra = FakeInfra::with_hosts(&["10.1.0.5"], &[]);
    infra.init_code = 1;
    let playbook = FakePlaybook::exiting(0);
    let builder = FakeBuilder::default();
    let host = FakeHost::all_tools(dir.path());

    let d = deployer(config(dir.path()), common(dir.path()), &infra, &playbook, &builder, &host);
    let err = d.up(&RecordingReporter::default()).await.expect_err("init failed");

    assert!(matches!(
        err.downcast_ref::<ApplyError>(),
        Some(ApplyError::Init { exit_code: Some(1) })
    ));
    assert_eq!(count(&infra.apply_calls), 0);
}

#[tokio::test]
async fn missing_kubeconfig_fails_rewrite() {
    let dir = tempfile::tempdir().expect("tempdir");
    let infra = FakeInfra::with_hosts(&["10.1.0.5"], &[]);
    let playbook = FakePlaybook::exiting(0);
    let builder = FakeBuilder::default();
    let host = FakeHost::all_tools(dir.path());

    let d = deployer(config(dir.path()), common(dir.path()), &infra, &playbook, &builder, &host);
    let err = d.up(&RecordingReporter::default()).await.expect_err("no kubeconfig");

    assert!(format!("{err:#}").contains("failed to locate the kubeconfig file"));
}

#[tokio::test]
async fn auto_approve_reaches_terraform() {
    let dir = tempfile::tempdir().expect("tempdir");
    let infra = FakeInfra::with_hosts(&["10.1.0.5"], &[]);
    let playbook = FakePlaybook::exiting(0);
    let builder = FakeBuilder::default();
    let host = FakeHost::all_tools(dir.path());

    let mut cfg = config(dir.path());
    cfg.auto_approve = true;
    cfg.rewrite_kubeconfig = false;

    let d = deployer(cfg, common(dir.path()), &infra, &playbook, &builder, &host);
    d.up(&RecordingReporter::default()).await.expect("up");

    assert_eq!(*infra.apply_auto_approve.lock().expect("lock"), Some(true));
}
