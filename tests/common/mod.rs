// Shared setup for CLI tests
#![allow(dead_code)]

use assert_cmd::Command;
use std::fs;
use std::sync::MutexGuard;
use tempfile::TempDir;

use crate::test_env;

pub struct TestEnv {
    pub home: TempDir,
    _guard: MutexGuard<'static, ()>,
}

impl TestEnv {
    /// Temp HOME with an rc file pointing at a fresh ledger, plus extra rc lines
    pub fn with_rc(extra: &str) -> Self {
        let guard = test_env::lock_test_env();
        let home = TempDir::new().unwrap();
        let db_path = home.path().join("workflow.db");
        let config_dir = home.path().join(".procflow");
        fs::create_dir_all(&config_dir).unwrap();
        fs::write(
            config_dir.join("rc"),
            format!("data.location={}\n{}", db_path.display(), extra),
        ).unwrap();
        Self { home, _guard: guard }
    }

    pub fn new() -> Self {
        Self::with_rc("")
    }

    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("procflow").unwrap();
        cmd.env("HOME", self.home.path());
        cmd.env_remove("PROCFLOW_BACKEND_URL");
        cmd.env_remove("RUST_LOG");
        cmd
    }

    pub fn run_ok(&self, args: &[&str]) -> String {
        let output = self.cmd().args(args).assert().success().get_output().stdout.clone();
        String::from_utf8(output).unwrap()
    }

    pub fn submit(&self, project_id: &str) {
        self.run_ok(&[
            "submit",
            "--title", "Core banking servers",
            "--department", "IT",
            "--category", "Hardware",
            "--priority", "high",
            "--amount", "2500000",
            "--justification", "Capacity for branch rollout",
            "--submitted-by", "R. Sharma",
            "--project-id", project_id,
        ]);
    }

    pub fn show_json(&self) -> serde_json::Value {
        serde_json::from_str(&self.run_ok(&["show", "--json"])).unwrap()
    }
}
