//! Audio extraction with the yt-dlp command-line tool.

use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    pin::Pin,
    process::Stdio,
    task::{Context, Poll},
    time::Duration,
};

use bytes::Bytes;
use futures::Stream;
use tempfile::TempDir;
use tokio::process::Command;
use tokio_util::{io::ReaderStream, sync::CancellationToken};
use tracing::{debug, info, warn};
use ytlatest_core::{Error, Result, VideoReference};

/// Output name inside the scratch directory; yt-dlp fills in the extension.
const OUTPUT_TEMPLATE: &str = "audio.%(ext)s";

/// Default ceiling on one yt-dlp run.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Authentication method for yt-dlp.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthMethod {
    /// Use cookies from a locally installed browser (`chrome`, `firefox`, ...).
    BrowserCookies(String),
    /// No authentication.
    #[default]
    None,
}

impl AuthMethod {
    fn to_args(&self) -> Vec<OsString> {
        match self {
            Self::BrowserCookies(browser) => {
                vec!["--cookies-from-browser".into(), browser.into()]
            }
            Self::None => vec![],
        }
    }
}

/// yt-dlp invocation settings.
#[derive(Debug, Clone)]
pub struct YtDlp {
    path: PathBuf,
    auth_method: AuthMethod,
    timeout: Duration,
    temp_root: Option<PathBuf>,
}

impl Default for YtDlp {
    fn default() -> Self {
        Self::new("yt-dlp")
    }
}

impl YtDlp {
    /// Use the binary at `path` (or found on `PATH` if it is a bare name).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            auth_method: AuthMethod::None,
            timeout: DEFAULT_TIMEOUT,
            temp_root: None,
        }
    }

    #[must_use]
    pub fn with_auth_method(mut self, auth_method: AuthMethod) -> Self {
        self.auth_method = auth_method;
        self
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Create scratch directories under `root` instead of the system temp dir.
    #[must_use]
    pub fn with_temp_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.temp_root = Some(root.into());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub const fn auth_method(&self) -> &AuthMethod {
        &self.auth_method
    }

    /// Argument vector for one extraction. The URL always follows `--`.
    fn args(&self, output_template: &Path, url: &str) -> Vec<OsString> {
        let mut args: Vec<OsString> = [
            "--no-playlist",
            "--no-warnings",
            "--no-progress",
            "-f",
            "bestaudio",
            "-x",
            "--audio-format",
            "mp3",
            "--audio-quality",
            "0",
            "--print",
            "after_move:title",
            "--print",
            "after_move:filepath",
            "-o",
        ]
        .into_iter()
        .map(OsString::from)
        .collect();
        args.push(output_template.as_os_str().to_owned());
        args.extend(self.auth_method.to_args());
        args.push("--".into());
        args.push(url.into());
        args
    }

    fn scratch_dir(&self) -> std::io::Result<TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("ytlatest-");
        match &self.temp_root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        }
    }

    /// Extract the audio of `reference` to an MP3 file in a fresh scratch directory.
    ///
    /// The child process is killed if the run exceeds the timeout, if `cancel`
    /// fires, or if this future is dropped.
    pub async fn extract(&self, reference: &VideoReference, cancel: &CancellationToken) -> Result<ExtractedAudio> {
        let dir = self
            .scratch_dir()
            .map_err(|e| Error::ExtractionFailure(format!("Failed to create scratch dir: {e}")))?;
        let args = self.args(&dir.path().join(OUTPUT_TEMPLATE), reference.as_str());

        debug!("Running yt-dlp for {}", reference.video_id());
        let child = Command::new(&self.path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                Error::ExtractionFailure(format!("Failed to run {}: {e}", self.path.display()))
            })?;

        let output = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(Error::Cancelled),
            waited = tokio::time::timeout(self.timeout, child.wait_with_output()) => match waited {
                Ok(output) => output
                    .map_err(|e| Error::ExtractionFailure(format!("Failed to wait for yt-dlp: {e}")))?,
                Err(_) => {
                    return Err(Error::ExtractionFailure(format!(
                        "yt-dlp timed out after {}s",
                        self.timeout.as_secs()
                    )))
                }
            },
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!("yt-dlp stderr: {}", stderr.trim());
            return Err(Error::ExtractionFailure(format!(
                "yt-dlp failed ({}): {}",
                output.status,
                stderr.lines().next().unwrap_or("Unknown error")
            )));
        }

        let printed = parse_printed(&String::from_utf8_lossy(&output.stdout));
        let path = printed
            .filepath
            .unwrap_or_else(|| dir.path().join("audio.mp3"));
        if !path.starts_with(dir.path()) {
            return Err(Error::ExtractionFailure(format!(
                "yt-dlp wrote outside its scratch dir: {}",
                path.display()
            )));
        }

        let size = tokio::fs::metadata(&path)
            .await
            .map_err(|e| Error::ExtractionFailure(format!("Missing output {}: {e}", path.display())))?
            .len();
        if size == 0 {
            return Err(Error::ExtractionFailure("yt-dlp produced an empty file".to_string()));
        }

        info!("Extracted {} ({size} bytes)", reference.video_id());
        Ok(ExtractedAudio {
            file: ScopedAudioFile {
                path,
                size,
                _dir: dir,
            },
            title: printed.title,
        })
    }
}

/// Values yt-dlp printed after moving the final file into place.
#[derive(Debug, Default, PartialEq, Eq)]
struct Printed {
    title: Option<String>,
    filepath: Option<PathBuf>,
}

/// The title line comes first, then the file path.
fn parse_printed(stdout: &str) -> Printed {
    let lines: Vec<&str> = stdout.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    match lines.as_slice() {
        [] => Printed::default(),
        [filepath] => Printed {
            title: None,
            filepath: Some(PathBuf::from(filepath)),
        },
        [.., title, filepath] => Printed {
            title: Some((*title).to_string()),
            filepath: Some(PathBuf::from(filepath)),
        },
    }
}

/// Result of one yt-dlp run.
#[derive(Debug)]
pub struct ExtractedAudio {
    pub file: ScopedAudioFile,
    /// Title as yt-dlp reported it.
    pub title: Option<String>,
}

/// An extracted file that lives exactly as long as this value.
///
/// Owns the scratch directory; dropping it removes the directory and the file.
#[derive(Debug)]
pub struct ScopedAudioFile {
    path: PathBuf,
    size: u64,
    _dir: TempDir,
}

impl ScopedAudioFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub const fn size(&self) -> u64 {
        self.size
    }

    /// Open the file as a byte stream that keeps the file alive until it is dropped.
    pub async fn into_stream(self) -> Result<ScopedFileStream> {
        let file = tokio::fs::File::open(&self.path).await?;
        Ok(ScopedFileStream {
            inner: ReaderStream::new(file),
            file: self,
        })
    }
}

/// Byte stream over a [`ScopedAudioFile`].
///
/// A read failure is logged and ends the stream.
pub struct ScopedFileStream {
    inner: ReaderStream<tokio::fs::File>,
    file: ScopedAudioFile,
}

impl Stream for ScopedFileStream {
    type Item = Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match Pin::new(&mut self.inner).poll_next(cx) {
            Poll::Ready(Some(Ok(bytes))) => Poll::Ready(Some(Ok(bytes))),
            Poll::Ready(Some(Err(e))) => {
                warn!("Failed reading {}: {e}", self.file.path.display());
                Poll::Ready(None)
            }
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use futures::StreamExt;

    fn lossy(args: &[OsString]) -> Vec<String> {
        args.iter().map(|a| a.to_string_lossy().into_owned()).collect()
    }

    #[test]
    fn test_argument_vector() {
        let ytdlp = YtDlp::new("/usr/bin/yt-dlp");
        let args = lossy(&ytdlp.args(
            Path::new("/tmp/ytlatest-x/audio.%(ext)s"),
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
        ));
        assert_eq!(
            args,
            vec![
                "--no-playlist",
                "--no-warnings",
                "--no-progress",
                "-f",
                "bestaudio",
                "-x",
                "--audio-format",
                "mp3",
                "--audio-quality",
                "0",
                "--print",
                "after_move:title",
                "--print",
                "after_move:filepath",
                "-o",
                "/tmp/ytlatest-x/audio.%(ext)s",
                "--",
                "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            ]
        );
    }

    #[test]
    fn test_browser_cookie_args_precede_separator() {
        let ytdlp = YtDlp::default().with_auth_method(AuthMethod::BrowserCookies("firefox".into()));
        let args = lossy(&ytdlp.args(Path::new("/tmp/a.%(ext)s"), "https://youtu.be/dQw4w9WgXcQ"));
        let n = args.len();
        assert_eq!(
            args[n - 4..],
            ["--cookies-from-browser", "firefox", "--", "https://youtu.be/dQw4w9WgXcQ"]
        );
    }

    #[test]
    fn test_parse_printed() {
        assert_eq!(
            parse_printed("My Title\n/tmp/x/audio.mp3\n"),
            Printed {
                title: Some("My Title".to_string()),
                filepath: Some(PathBuf::from("/tmp/x/audio.mp3")),
            }
        );
        assert_eq!(
            parse_printed("/tmp/x/audio.mp3\n").filepath,
            Some(PathBuf::from("/tmp/x/audio.mp3"))
        );
        assert_eq!(parse_printed(""), Printed::default());
    }

    #[tokio::test]
    async fn test_missing_binary_is_extraction_failure() {
        let ytdlp = YtDlp::new("/nonexistent/yt-dlp");
        let reference = VideoReference::from_video_id("dQw4w9WgXcQ").unwrap();
        let err = ytdlp
            .extract(&reference, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ExtractionFailure(_)));
    }

    #[cfg(unix)]
    mod script {
        use super::*;
        use std::os::unix::fs::PermissionsExt;

        /// Stand-in for yt-dlp: writes the requested URL into the output file
        /// and prints a title and the file path like `--print after_move:*`.
        const FAKE_YTDLP: &str = r#"#!/bin/sh
out=""
url=""
while [ $# -gt 0 ]; do
  case "$1" in
    -o) out="$2"; shift 2 ;;
    --) url="$2"; shift 2 ;;
    *) shift ;;
  esac
done
sleep 0.2
file=$(printf '%s' "$out" | sed 's/%(ext)s/mp3/')
printf '%s' "$url" > "$file"
echo "Title of $url"
echo "$file"
"#;

        const SLOW_YTDLP: &str = "#!/bin/sh\nsleep 30\n";

        const FAILING_YTDLP: &str = "#!/bin/sh\necho 'ERROR: Video unavailable' >&2\nexit 1\n";

        fn install(dir: &Path, name: &str, body: &str) -> PathBuf {
            let path = dir.join(name);
            std::fs::write(&path, body).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            path
        }

        async fn read_all(file: ScopedAudioFile) -> Vec<u8> {
            file.into_stream()
                .await
                .unwrap()
                .map(|chunk| chunk.unwrap())
                .collect::<Vec<_>>()
                .await
                .concat()
        }

        #[tokio::test]
        async fn test_concurrent_extractions_are_isolated() {
            let bin = tempfile::tempdir().unwrap();
            let scratch = tempfile::tempdir().unwrap();
            let ytdlp = YtDlp::new(install(bin.path(), "yt-dlp", FAKE_YTDLP))
                .with_temp_root(scratch.path());

            let first = VideoReference::from_video_id("aaaaaaaaaaa").unwrap();
            let second = VideoReference::from_video_id("bbbbbbbbbbb").unwrap();
            let cancel = CancellationToken::new();

            let (a, b) = tokio::join!(
                ytdlp.extract(&first, &cancel),
                ytdlp.extract(&second, &cancel)
            );
            let (a, b) = (a.unwrap(), b.unwrap());

            assert_ne!(a.file.path(), b.file.path());
            assert_eq!(a.title.as_deref(), Some(format!("Title of {}", first.as_str()).as_str()));
            assert_eq!(a.file.size(), first.as_str().len() as u64);

            let dirs = [
                a.file.path().parent().unwrap().to_path_buf(),
                b.file.path().parent().unwrap().to_path_buf(),
            ];
            assert_eq!(read_all(a.file).await, first.as_str().as_bytes());
            assert_eq!(read_all(b.file).await, second.as_str().as_bytes());

            for dir in dirs {
                assert!(dir.starts_with(scratch.path()));
                assert!(!dir.exists(), "{} was not removed", dir.display());
            }
        }

        #[tokio::test]
        async fn test_timeout_kills_child() {
            let bin = tempfile::tempdir().unwrap();
            let ytdlp = YtDlp::new(install(bin.path(), "yt-dlp", SLOW_YTDLP))
                .with_timeout(Duration::from_millis(200));
            let reference = VideoReference::from_video_id("aaaaaaaaaaa").unwrap();

            let err = ytdlp
                .extract(&reference, &CancellationToken::new())
                .await
                .unwrap_err();
            assert!(matches!(err, Error::ExtractionFailure(msg) if msg.contains("timed out")));
        }

        #[tokio::test]
        async fn test_cancellation_ends_extraction() {
            let bin = tempfile::tempdir().unwrap();
            let ytdlp = YtDlp::new(install(bin.path(), "yt-dlp", SLOW_YTDLP));
            let reference = VideoReference::from_video_id("aaaaaaaaaaa").unwrap();
            let cancel = CancellationToken::new();
            let trigger = cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(100)).await;
                trigger.cancel();
            });

            let err = ytdlp.extract(&reference, &cancel).await.unwrap_err();
            assert!(err.is_cancelled());
        }

        #[tokio::test]
        async fn test_nonzero_exit() {
            let bin = tempfile::tempdir().unwrap();
            let ytdlp = YtDlp::new(install(bin.path(), "yt-dlp", FAILING_YTDLP));
            let reference = VideoReference::from_video_id("aaaaaaaaaaa").unwrap();

            let err = ytdlp
                .extract(&reference, &CancellationToken::new())
                .await
                .unwrap_err();
            assert!(matches!(err, Error::ExtractionFailure(msg) if msg.contains("Video unavailable")));
        }
    }
}
