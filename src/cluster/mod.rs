//! Cluster access
//!
//! - [`ClusterClient`]: the capabilities the scheduler consumes
//! - [`OcClient`]: implementation on top of the `oc` CLI

mod client;
#[cfg(any(test, feature = "test-utils"))]
pub mod fake;
mod oc;

pub use client::{BuildHandle, BuildOptions, BuildStatus, ClusterClient};
pub use oc::OcClient;

/// Max number of output lines to include in build error messages.
const BUILD_ERROR_TAIL_LINES: usize = 50;

/// Extract the useful tail of `oc` output for error diagnostics.
///
/// Combines stdout and stderr, then returns the last `BUILD_ERROR_TAIL_LINES`
/// lines so error messages are actionable without being overwhelming.
pub(crate) fn error_tail(stdout: &str, stderr: &str) -> String {
    let lines: Vec<&str> = stdout.lines().chain(stderr.lines()).collect();
    let total = lines.len();
    let tail: Vec<&str> = if total > BUILD_ERROR_TAIL_LINES {
        lines[total - BUILD_ERROR_TAIL_LINES..].to_vec()
    } else {
        lines
    };
    tail.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_tail_keeps_last_lines() {
        let stdout: String = (0..80).map(|i| format!("line {}\n", i)).collect();
        let tail = error_tail(&stdout, "boom");
        assert_eq!(tail.lines().count(), BUILD_ERROR_TAIL_LINES);
        assert!(tail.ends_with("boom"));
        assert!(!tail.contains("line 0\n"));
    }

    #[test]
    fn error_tail_short_output() {
        assert_eq!(error_tail("a", "b"), "a\nb");
    }
}
