//! [`MediaEngine`] implementation that shells out to a native `ffmpeg`.

use std::collections::VecDeque;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use ffonline_core::{EngineError, EngineResult, MediaEngine, ProgressSink};
use tempfile::TempDir;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::paths;
use crate::progress::{LineSplitter, ProgressParser};

/// Binary looked up on `PATH` when no explicit path is configured.
pub const DEFAULT_BINARY: &str = "ffmpeg";

/// Flags prepended to every command: quiet banner, no stdin, overwrite outputs.
const FIXED_ARGS: [&str; 3] = ["-hide_banner", "-nostdin", "-y"];

/// Stderr lines retained for failure detail.
const TAIL_LINES: usize = 20;

const READ_CHUNK: usize = 4096;

/// Native engine whose filesystem is a private temporary directory.
#[derive(Debug)]
pub struct FfmpegEngine {
    binary: PathBuf,
    workdir: TempDir,
    loaded: AtomicBool,
    progress: ProgressParser,
}

impl FfmpegEngine {
    /// Engine using [`DEFAULT_BINARY`].
    ///
    /// # Errors
    ///
    /// Returns an error if the working directory cannot be created.
    pub fn new() -> EngineResult<Self> {
        Self::with_binary(DEFAULT_BINARY)
    }

    /// Engine invoking `binary`.
    ///
    /// # Errors
    ///
    /// Returns an error if the working directory cannot be created or the
    /// progress patterns fail to compile.
    pub fn with_binary(binary: impl Into<PathBuf>) -> EngineResult<Self> {
        let binary = binary.into();
        let workdir = tempfile::Builder::new()
            .prefix("ffonline-")
            .tempdir()
            .map_err(|err| EngineError::operation_failed("create_workdir", None, err))?;
        let progress = ProgressParser::new()
            .map_err(|err| EngineError::operation_failed("compile_progress", None, err))?;
        Ok(Self {
            binary,
            workdir,
            loaded: AtomicBool::new(false),
            progress,
        })
    }

    /// Directory backing the engine filesystem.
    #[must_use]
    pub fn working_dir(&self) -> &Path {
        self.workdir.path()
    }

    fn require_loaded(&self, operation: &'static str) -> EngineResult<()> {
        if self.loaded.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(EngineError::NotLoaded { operation })
        }
    }

    fn binary_label(&self) -> String {
        self.binary.display().to_string()
    }
}

#[async_trait]
impl MediaEngine for FfmpegEngine {
    async fn load(&self) -> EngineResult<()> {
        if self.loaded.load(Ordering::Acquire) {
            return Ok(());
        }
        let output = Command::new(&self.binary)
            .arg("-version")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|err| EngineError::operation_failed("load", Some(self.binary_label()), err))?;
        if !output.status.success() {
            let detail = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(EngineError::operation_failed(
                "load",
                Some(self.binary_label()),
                EngineError::command_failed(output.status.code(), detail),
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let version = stdout.lines().next().unwrap_or("unknown version");
        info!(
            binary = %self.binary.display(),
            workdir = %self.workdir.path().display(),
            version = %version,
            "ffmpeg engine loaded"
        );
        self.loaded.store(true, Ordering::Release);
        Ok(())
    }

    async fn run(&self, args: &[String], progress: &ProgressSink) -> EngineResult<()> {
        self.require_loaded("run")?;
        debug!(args = ?args, "spawning ffmpeg");

        let mut child = Command::new(&self.binary)
            .current_dir(self.workdir.path())
            .args(FIXED_ARGS)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| EngineError::operation_failed("run", Some(self.binary_label()), err))?;

        let mut stderr = child.stderr.take().ok_or_else(|| {
            EngineError::operation_failed("run", None, io::Error::other("missing stderr pipe"))
        })?;

        let mut parser = self.progress.fresh();
        let mut splitter = LineSplitter::default();
        let mut tail = VecDeque::with_capacity(TAIL_LINES);
        let mut observe = |line: String| {
            if let Some(ratio) = parser.feed(&line) {
                progress.report(ratio);
            }
            if tail.len() == TAIL_LINES {
                tail.pop_front();
            }
            tail.push_back(line);
        };

        let mut buffer = [0_u8; READ_CHUNK];
        loop {
            let read = stderr
                .read(&mut buffer)
                .await
                .map_err(|err| EngineError::operation_failed("run", None, err))?;
            if read == 0 {
                break;
            }
            splitter.push(&buffer[..read]).into_iter().for_each(&mut observe);
        }
        if let Some(line) = splitter.finish() {
            observe(line);
        }

        let status = child
            .wait()
            .await
            .map_err(|err| EngineError::operation_failed("run", None, err))?;
        if !status.success() {
            let detail = Vec::from(tail).join("\n");
            warn!(exit_code = ?status.code(), "ffmpeg exited unsuccessfully");
            return Err(EngineError::command_failed(status.code(), detail));
        }
        progress.report(1.0);
        Ok(())
    }

    async fn write_file(&self, name: &str, bytes: &[u8]) -> EngineResult<()> {
        self.require_loaded("write_file")?;
        let path = paths::resolve(self.workdir.path(), name)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|err| fs_error("write_file", name, err))?;
        }
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|err| fs_error("write_file", name, err))
    }

    async fn read_file(&self, name: &str) -> EngineResult<Vec<u8>> {
        self.require_loaded("read_file")?;
        let path = paths::resolve(self.workdir.path(), name)?;
        tokio::fs::read(&path)
            .await
            .map_err(|err| fs_error("read_file", name, err))
    }

    async fn list_directory(&self, path: &str) -> EngineResult<Vec<String>> {
        self.require_loaded("list_directory")?;
        let dir = paths::resolve_dir(self.workdir.path(), path)?;
        let mut entries = tokio::fs::read_dir(&dir)
            .await
            .map_err(|err| fs_error("list_directory", path, err))?;

        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|err| fs_error("list_directory", path, err))?
        {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }
}

fn fs_error(operation: &'static str, name: &str, err: io::Error) -> EngineError {
    if err.kind() == io::ErrorKind::NotFound {
        EngineError::NotFound {
            name: name.to_string(),
        }
    } else {
        EngineError::operation_failed(operation, Some(name.to_string()), err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestResult<T> = Result<T, Box<dyn std::error::Error>>;

    fn loaded_without_binary() -> TestResult<FfmpegEngine> {
        let engine = FfmpegEngine::with_binary("ffonline-missing-binary")?;
        engine.loaded.store(true, Ordering::Release);
        Ok(engine)
    }

    #[tokio::test]
    async fn operations_require_load() -> TestResult<()> {
        let engine = FfmpegEngine::with_binary("ffonline-missing-binary")?;
        assert!(matches!(
            engine.read_file("a.mp4").await,
            Err(EngineError::NotLoaded { operation: "read_file" })
        ));
        assert!(matches!(
            engine.list_directory(".").await,
            Err(EngineError::NotLoaded { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn missing_binary_fails_to_load() -> TestResult<()> {
        let engine = FfmpegEngine::with_binary("ffonline-missing-binary")?;
        let err = engine.load().await.err().ok_or("load should fail")?;
        assert!(matches!(err, EngineError::OperationFailed { operation: "load", .. }));
        assert!(engine.require_loaded("run").is_err());
        Ok(())
    }

    #[tokio::test]
    async fn filesystem_round_trips_through_workdir() -> TestResult<()> {
        let engine = loaded_without_binary()?;
        engine.write_file("input.mp4", b"abc").await?;
        engine.write_file("frames/001.png", b"png").await?;
        engine.write_file("input.mp4", b"replaced").await?;

        assert_eq!(engine.read_file("input.mp4").await?, b"replaced");
        assert!(engine.working_dir().join("frames/001.png").is_file());
        assert_eq!(engine.list_directory(".").await?, vec!["frames", "input.mp4"]);
        assert_eq!(engine.list_directory("frames").await?, vec!["001.png"]);
        Ok(())
    }

    #[tokio::test]
    async fn missing_files_and_escapes_are_distinguished() -> TestResult<()> {
        let engine = loaded_without_binary()?;
        let missing = engine.read_file("absent.gif").await.err().ok_or("expected error")?;
        assert!(missing.is_not_found());

        let escape = engine.read_file("../outside").await.err().ok_or("expected error")?;
        assert!(matches!(escape, EngineError::InvalidName { reason: "path_traversal", .. }));
        assert!(engine.list_directory("nope").await.err().is_some_and(|err| err.is_not_found()));
        Ok(())
    }
}
