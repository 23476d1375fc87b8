//! Output Sink
//! Copies a child's captured stdout/stderr into append-only files
//!
//! Files are opened before the instance is spawned, so an unwritable log path
//! surfaces as a failed start instead of a child writing into a dead pipe. The
//! pump tasks own the file handles; dropping [`OutputPumps`] aborts them and
//! closes the files.

use crate::constants::output::COPY_BUFFER_SIZE;
use crate::domain::ports::OutputStream;
use crate::domain::{DomainError, LogTimestampFormat, OutputTarget, ProcessSpec};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Output destinations of one spec
#[derive(Debug, Clone)]
pub struct OutputSink {
    process: String,
    stdout: OutputTarget,
    stderr: OutputTarget,
    timestamps: Option<LogTimestampFormat>,
}

impl OutputSink {
    pub fn new(
        process: impl Into<String>,
        stdout: OutputTarget,
        stderr: OutputTarget,
        timestamps: Option<LogTimestampFormat>,
    ) -> Self {
        Self {
            process: process.into(),
            stdout,
            stderr,
            timestamps,
        }
    }

    pub fn from_spec(spec: &ProcessSpec) -> Self {
        let timestamps = spec
            .log_timestamps()
            .then(|| LogTimestampFormat::parse(spec.log_date_format()));

        Self::new(
            spec.name(),
            spec.stdout().clone(),
            spec.stderr().clone(),
            timestamps,
        )
    }

    /// Open the file destinations for a new instance
    pub async fn open(&self) -> Result<OpenOutputs, DomainError> {
        Ok(OpenOutputs {
            process: self.process.clone(),
            stdout: open_target(&self.stdout).await?,
            stderr: open_target(&self.stderr).await?,
            timestamps: self.timestamps.clone(),
        })
    }
}

async fn open_target(target: &OutputTarget) -> Result<Option<(PathBuf, File)>, DomainError> {
    let Some(path) = target.path() else {
        return Ok(None);
    };

    Ok(Some((path.to_path_buf(), open_append(path).await?)))
}

async fn open_append(path: &Path) -> Result<File, DomainError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                DomainError::Io(format!(
                    "Failed to create log directory '{}': {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .map_err(|e| {
            DomainError::Io(format!(
                "Failed to open log file '{}': {}",
                path.display(),
                e
            ))
        })
}

/// File handles opened for one instance, waiting for its streams
#[derive(Debug)]
pub struct OpenOutputs {
    process: String,
    stdout: Option<(PathBuf, File)>,
    stderr: Option<(PathBuf, File)>,
    timestamps: Option<LogTimestampFormat>,
}

impl OpenOutputs {
    /// Start copying the captured streams into their files
    pub fn attach(self, stdout: Option<OutputStream>, stderr: Option<OutputStream>) -> OutputPumps {
        let mut tasks = Vec::with_capacity(2);

        for (name, destination, stream) in [
            ("stdout", self.stdout, stdout),
            ("stderr", self.stderr, stderr),
        ] {
            let (Some((path, file)), Some(stream)) = (destination, stream) else {
                continue;
            };

            let process = self.process.clone();
            let timestamps = self.timestamps.clone();
            tasks.push(tokio::spawn(async move {
                let result = match timestamps {
                    Some(format) => pump_lines(stream, file, &format).await,
                    None => pump_raw(stream, file).await,
                };

                match result {
                    Ok(bytes) => debug!(
                        process = %process,
                        stream = name,
                        path = %path.display(),
                        bytes = bytes,
                        "Output stream closed"
                    ),
                    Err(e) => warn!(
                        process = %process,
                        stream = name,
                        path = %path.display(),
                        error = %e,
                        "Failed to copy output"
                    ),
                }
            }));
        }

        OutputPumps { tasks }
    }
}

// Every chunk is flushed so the file reflects the output as soon as it is read
async fn pump_raw(stream: OutputStream, mut file: File) -> std::io::Result<u64> {
    let mut reader = BufReader::with_capacity(COPY_BUFFER_SIZE, stream);
    let mut bytes = 0u64;

    loop {
        let chunk = reader.fill_buf().await?;
        if chunk.is_empty() {
            break;
        }

        let len = chunk.len();
        file.write_all(chunk).await?;
        file.flush().await?;
        reader.consume(len);
        bytes += len as u64;
    }

    Ok(bytes)
}

async fn pump_lines(
    stream: OutputStream,
    mut file: File,
    format: &LogTimestampFormat,
) -> std::io::Result<u64> {
    let mut reader = BufReader::with_capacity(COPY_BUFFER_SIZE, stream);
    let mut line = Vec::new();
    let mut record = Vec::new();
    let mut bytes = 0u64;

    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line).await? == 0 {
            break;
        }

        record.clear();
        record.extend_from_slice(format.now().as_bytes());
        record.extend_from_slice(b": ");
        record.extend_from_slice(&line);
        file.write_all(&record).await?;
        bytes += record.len() as u64;

        if reader.buffer().is_empty() {
            file.flush().await?;
        }
    }

    file.flush().await?;
    Ok(bytes)
}

/// Running copy tasks for one instance
///
/// Dropping the guard aborts whatever is still copying.
#[derive(Debug, Default)]
pub struct OutputPumps {
    tasks: Vec<JoinHandle<()>>,
}

impl OutputPumps {
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Wait for the streams to reach end of file, then abort what is left
    ///
    /// Grandchildren holding the pipe open would otherwise keep the pumps alive.
    pub async fn finish(mut self, timeout: Duration) {
        let deadline = tokio::time::Instant::now() + timeout;

        for task in self.tasks.iter_mut() {
            if tokio::time::timeout_at(deadline, task).await.is_err() {
                debug!("Output pump did not drain in time, aborting");
                break;
            }
        }
        // Drop aborts the remaining tasks
    }
}

impl Drop for OutputPumps {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn stream_of(data: &'static [u8]) -> OutputStream {
        Box::new(data)
    }

    #[tokio::test]
    async fn test_raw_copy_appends() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("logs/out.log");
        std::fs::create_dir_all(out.parent().unwrap()).unwrap();
        std::fs::write(&out, "previous\n").unwrap();

        let sink = OutputSink::new("app", OutputTarget::File(out.clone()), OutputTarget::Null, None);
        let pumps = sink
            .open()
            .await
            .unwrap()
            .attach(Some(stream_of(b"hello\nworld")), None);
        pumps.finish(Duration::from_secs(5)).await;

        assert_eq!(std::fs::read_to_string(&out).unwrap(), "previous\nhello\nworld");
    }

    #[tokio::test]
    async fn test_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let err = dir.path().join("nested/deeper/err.log");

        let sink = OutputSink::new("app", OutputTarget::Null, OutputTarget::File(err.clone()), None);
        let pumps = sink
            .open()
            .await
            .unwrap()
            .attach(None, Some(stream_of(b"boom\n")));
        pumps.finish(Duration::from_secs(5)).await;

        assert_eq!(std::fs::read_to_string(&err).unwrap(), "boom\n");
    }

    #[tokio::test]
    async fn test_timestamped_lines() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out.log");

        let format = LogTimestampFormat::parse("[ts]");
        let sink = OutputSink::new(
            "app",
            OutputTarget::File(out.clone()),
            OutputTarget::Null,
            Some(format),
        );
        let pumps = sink
            .open()
            .await
            .unwrap()
            .attach(Some(stream_of(b"one\ntwo\npartial")), None);
        pumps.finish(Duration::from_secs(5)).await;

        assert_eq!(
            std::fs::read_to_string(&out).unwrap(),
            "ts: one\nts: two\nts: partial"
        );
    }

    #[tokio::test]
    async fn test_null_and_inherit_open_nothing() {
        let sink = OutputSink::new("app", OutputTarget::Null, OutputTarget::Inherit, None);
        let pumps = sink.open().await.unwrap().attach(None, None);
        assert!(pumps.is_empty());
    }

    #[tokio::test]
    async fn test_unwritable_destination() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "").unwrap();

        // A regular file cannot be used as a parent directory
        let sink = OutputSink::new(
            "app",
            OutputTarget::File(blocker.join("out.log")),
            OutputTarget::Null,
            None,
        );
        let err = sink.open().await.unwrap_err();
        assert!(matches!(err, DomainError::Io(_)));
    }

    #[tokio::test]
    async fn test_drop_aborts_blocked_pump() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out.log");

        let (reader, mut writer) = tokio::io::duplex(64);
        writer.write_all(b"first\n").await.unwrap();

        let sink = OutputSink::new("app", OutputTarget::File(out.clone()), OutputTarget::Null, None);
        let pumps = sink
            .open()
            .await
            .unwrap()
            .attach(Some(Box::new(reader)), None);

        // The writer stays open, so the pump can only end by timing out
        pumps.finish(Duration::from_millis(100)).await;
        drop(writer);

        assert_eq!(std::fs::read_to_string(&out).unwrap(), "first\n");
    }
}
