//! Renderer seam and the external renderer process driver.

use async_trait::async_trait;
use regrade_core::{RenderStatus, RunConfig, SelectedTest, Viewport};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

/// Something that turns a scene into a frame at `output_path`.
///
/// Implementations report how the attempt ended; whether a frame exists is
/// decided afterwards by looking at `output_path`.
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(&self, test: &SelectedTest, output_path: &Path) -> RenderStatus;
}

/// Renderer under test, invoked as
/// `<exe> --width W --height H --screenshot <output> <scene.json>`.
#[derive(Debug, Clone)]
pub struct ExternalRenderer {
    pub executable: PathBuf,
    pub viewport: Viewport,

    /// Zero disables the timeout.
    pub timeout: Duration,
}

impl ExternalRenderer {
    pub fn new(executable: PathBuf, viewport: Viewport, timeout: Duration) -> Self {
        Self {
            executable,
            viewport,
            timeout,
        }
    }

    pub fn from_config(config: &RunConfig) -> Self {
        Self::new(
            config.renderer.clone(),
            config.viewport,
            config.render_timeout,
        )
    }

    /// Arguments passed to the executable for one scene.
    pub fn args(&self, test: &SelectedTest, output_path: &Path) -> Vec<OsString> {
        vec![
            "--width".into(),
            self.viewport.width.to_string().into(),
            "--height".into(),
            self.viewport.height.to_string().into(),
            "--screenshot".into(),
            output_path.as_os_str().to_os_string(),
            test.spec_path.as_os_str().to_os_string(),
        ]
    }
}

#[async_trait]
impl Renderer for ExternalRenderer {
    async fn render(&self, test: &SelectedTest, output_path: &Path) -> RenderStatus {
        let child = Command::new(&self.executable)
            .args(self.args(test, output_path))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();

        let child = match child {
            Ok(child) => child,
            Err(e) => {
                warn!(scene = %test.id, error = %e, "Failed to start renderer");
                return RenderStatus::SpawnFailed {
                    reason: e.to_string(),
                };
            }
        };

        // Dropping the wait future on timeout kills the child.
        let waited = if self.timeout.is_zero() {
            child.wait_with_output().await
        } else {
            match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
                Ok(waited) => waited,
                Err(_) => {
                    warn!(
                        scene = %test.id,
                        timeout_secs = self.timeout.as_secs(),
                        "Renderer timed out"
                    );
                    return RenderStatus::TimedOut {
                        after_secs: self.timeout.as_secs(),
                    };
                }
            }
        };

        match waited {
            Ok(output) => {
                let code = output.status.code();
                debug!(
                    scene = %test.id,
                    exit_code = ?code,
                    stdout = %String::from_utf8_lossy(&output.stdout).trim_end(),
                    stderr = %String::from_utf8_lossy(&output.stderr).trim_end(),
                    "Renderer exited"
                );
                RenderStatus::Exited { code }
            }
            Err(e) => {
                warn!(scene = %test.id, error = %e, "Failed to wait for renderer");
                RenderStatus::SpawnFailed {
                    reason: e.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_scene() -> SelectedTest {
        SelectedTest {
            id: "pbr_bunny".to_string(),
            spec_path: PathBuf::from("/scenes/pbr_bunny.json"),
        }
    }

    #[test]
    fn test_args_layout() {
        let renderer = ExternalRenderer::new(
            PathBuf::from("/bin/render"),
            Viewport::default(),
            Duration::from_secs(60),
        );
        let args = renderer.args(&test_scene(), Path::new("/out/pbr_bunny.png"));
        let args: Vec<String> = args
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args,
            vec![
                "--width",
                "500",
                "--height",
                "500",
                "--screenshot",
                "/out/pbr_bunny.png",
                "/scenes/pbr_bunny.json",
            ]
        );
    }

    #[tokio::test]
    async fn test_spawn_failure_is_reported() {
        let renderer = ExternalRenderer::new(
            PathBuf::from("/definitely/not/a/renderer"),
            Viewport::default(),
            Duration::from_secs(5),
        );
        let status = renderer
            .render(&test_scene(), Path::new("/tmp/never.png"))
            .await;
        assert!(matches!(status, RenderStatus::SpawnFailed { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_exit_code_is_captured() {
        let renderer = ExternalRenderer::new(
            PathBuf::from("false"),
            Viewport::default(),
            Duration::from_secs(30),
        );
        let status = renderer
            .render(&test_scene(), Path::new("/tmp/never.png"))
            .await;
        assert!(matches!(status, RenderStatus::Exited { code: Some(c) } if c != 0));
    }
}
