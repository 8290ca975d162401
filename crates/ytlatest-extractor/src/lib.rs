//! # ytlatest-extractor
//!
//! Audio acquisition for a resolved video.
//!
//! Two strategies, fixed at startup:
//! - **Stream relay**: ask the platform for the rendition list, pick an
//!   audio-only rendition and relay its bytes as they arrive.
//! - **External tool**: run yt-dlp into a per-request temporary directory and
//!   serve the resulting MP3 file.

pub mod acquirer;
pub mod cookies;
#[cfg(any(test, feature = "test-util"))]
pub mod mock_source;
pub mod relay;
pub mod source;
pub mod ytdlp;

pub use acquirer::{AcquisitionStrategy, Acquired, AudioAcquirer, AudioAsset};
pub use cookies::{load_cookie_header, parse_cookie_header};
#[cfg(any(test, feature = "test-util"))]
pub use mock_source::MockMediaSource;
pub use relay::RelayStream;
pub use source::MediaSource;
pub use ytdlp::{AuthMethod, ExtractedAudio, ScopedAudioFile, ScopedFileStream, YtDlp};

// Re-exported so callers can build requests without naming the client crate.
pub use ytlatest_innertube::{ByteStream, MediaRequest};
