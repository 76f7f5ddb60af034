//! Shared helpers for CLI specs

use assert_cmd::Command;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Timing short enough that a session finishes in well under a second
pub const FAST_CONFIG: &str = r#"
grace_period = "150ms"
ledger_flush = "50ms"
journal_flush = "50ms"
index_persist = "50ms"
"#;

/// A scratch data directory
pub struct DataDir {
    dir: TempDir,
}

impl DataDir {
    /// Empty directory with fast timings
    pub fn new() -> Self {
        let data = Self {
            dir: TempDir::new().unwrap(),
        };
        data.file("setlog.toml", FAST_CONFIG);
        data
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn join(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    /// Write a file relative to the data directory
    pub fn file(&self, rel: &str, content: &str) {
        let path = self.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }

    pub fn read(&self, rel: &str) -> String {
        std::fs::read_to_string(self.join(rel)).unwrap()
    }

    /// `setlog` pointed at this directory
    pub fn setlog(&self) -> Cli {
        let mut cmd = Command::cargo_bin("setlog").unwrap();
        cmd.arg("--data-dir").arg(self.path());
        cmd.env_remove("RUST_LOG");
        Cli { cmd }
    }

    /// Run a session fed with `script` on stdin
    pub fn session(&self, script: &str) -> RunAssert {
        self.setlog().args(&["session"]).stdin(script).passes()
    }
}

pub struct Cli {
    cmd: Command,
}

impl Cli {
    pub fn args(mut self, args: &[&str]) -> Self {
        self.cmd.args(args);
        self
    }

    pub fn stdin(mut self, input: &str) -> Self {
        self.cmd.write_stdin(input.to_string());
        self
    }

    /// Run and require exit status 0
    pub fn passes(mut self) -> RunAssert {
        let output = self.cmd.output().unwrap();
        let run = RunAssert::from(output);
        assert!(
            run.success,
            "expected success\nstdout:\n{}\nstderr:\n{}",
            run.stdout, run.stderr
        );
        run
    }

    /// Run and require a failing exit status
    pub fn fails(mut self) -> RunAssert {
        let output = self.cmd.output().unwrap();
        let run = RunAssert::from(output);
        assert!(
            !run.success,
            "expected failure\nstdout:\n{}\nstderr:\n{}",
            run.stdout, run.stderr
        );
        run
    }
}

pub struct RunAssert {
    success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl From<std::process::Output> for RunAssert {
    fn from(output: std::process::Output) -> Self {
        Self {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

impl RunAssert {
    pub fn stdout_has(self, needle: &str) -> Self {
        assert!(
            self.stdout.contains(needle),
            "stdout missing {needle:?}\nstdout:\n{}",
            self.stdout
        );
        self
    }

    pub fn stdout_lacks(self, needle: &str) -> Self {
        assert!(
            !self.stdout.contains(needle),
            "stdout unexpectedly has {needle:?}\nstdout:\n{}",
            self.stdout
        );
        self
    }

    pub fn stderr_has(self, needle: &str) -> Self {
        assert!(
            self.stderr.contains(needle),
            "stderr missing {needle:?}\nstderr:\n{}",
            self.stderr
        );
        self
    }

    /// Compare stdout exactly, with a readable diff on mismatch
    pub fn stdout_eq(self, expected: &str) -> Self {
        similar_asserts::assert_eq!(self.stdout, expected);
        self
    }
}

/// Data rows of a ledger, header excluded
pub fn ledger_rows(data: &DataDir) -> Vec<String> {
    data.read("ledger.csv")
        .lines()
        .skip(1)
        .map(str::to_string)
        .collect()
}
