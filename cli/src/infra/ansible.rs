//! `PlaybookRunner` backed by `ansible-playbook`.

use std::process::ExitStatus;

use anyhow::Result;

use crate::application::ports::{CommandRunner, PlaybookRunner, PlaybookSpec};

/// ansible-playbook executable name.
pub const ANSIBLE_PLAYBOOK_BIN: &str = "ansible-playbook";

pub struct AnsibleRunner<R> {
    runner: R,
}

impl<R: CommandRunner> AnsibleRunner<R> {
    #[must_use]
    pub fn new(runner: R) -> Self {
        Self { runner }
    }
}

/// `--inventory=<file> --extra-vars=<json> <playbook>`
#[must_use]
pub fn playbook_args(spec: &PlaybookSpec<'_>) -> Vec<String> {
    vec![
        format!("--inventory={}", spec.inventory.display()),
        format!("--extra-vars={}", spec.extra_vars),
        spec.playbook.display().to_string(),
    ]
}

impl<R: CommandRunner> PlaybookRunner for AnsibleRunner<R> {
    async fn run_playbook(&self, spec: &PlaybookSpec<'_>) -> Result<ExitStatus> {
        let args = playbook_args(spec);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        self.runner.run_status(ANSIBLE_PLAYBOOK_BIN, &args).await
    }
}
