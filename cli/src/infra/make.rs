//! `BinaryBuilder` that compiles Kubernetes with `make`.

use anyhow::Result;
use tracing::info;

use crate::application::ports::{BinaryBuilder, BuildSpec, CommandRunner};
use crate::domain::error::BuildError;

const MAKE_BIN: &str = "make";

/// Test binaries built alongside a cross-compiled release, so the e2e suite
/// can run on the host.
pub const HOST_TEST_TARGETS: &str = "github.com/onsi/ginkgo/v2/ginkgo k8s.io/kubernetes/test/e2e/e2e.test k8s.io/kubernetes/cmd/kubectl";

pub struct MakeBuilder<R> {
    runner: R,
}

impl<R: CommandRunner> MakeBuilder<R> {
    #[must_use]
    pub fn new(runner: R) -> Self {
        Self { runner }
    }
}

/// `make` invocations for a build, in order.
#[must_use]
pub fn make_invocations(spec: &BuildSpec<'_>) -> Vec<Vec<String>> {
    let mut runs = vec![vec![
        "quick-release".to_string(),
        format!("KUBE_BUILD_PLATFORMS={}", spec.target_platform),
    ]];
    if spec.target_platform != spec.host_platform {
        runs.push(vec![format!("WHAT={HOST_TEST_TARGETS}")]);
    }
    runs
}

impl<R: CommandRunner> BinaryBuilder for MakeBuilder<R> {
    async fn build(&self, spec: &BuildSpec<'_>) -> Result<()> {
        for args in make_invocations(spec) {
            info!(repo_root = %spec.repo_root.display(), ?args, "running make");
            let argv: Vec<&str> = args.iter().map(String::as_str).collect();
            let status = self
                .runner
                .run_status_in(spec.repo_root, MAKE_BIN, &argv)
                .await?;
            if !status.success() {
                return Err(BuildError::Failed {
                    target: args.join(" "),
                    exit_code: status.code(),
                }
                .into());
            }
        }
        Ok(())
    }
}
