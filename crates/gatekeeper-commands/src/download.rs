//! Mocked download pipeline.
//!
//! Nothing is fetched. A [`DownloadSimulation`] is a timer-paced stream of
//! [`ProgressEvent`]s that front ends render by editing one message in
//! place. Each simulation owns its own progress sequence and stop token, so
//! running simulations never affect each other.

use futures::stream::{self, BoxStream, StreamExt};
use gatekeeper_config::DownloadSettings;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Cells in the rendered progress bar.
const BAR_CELLS: usize = 10;

/// Text of the message that is later edited with progress.
pub const STARTING_TEXT: &str = "📥 Starting download...";

/// Replacement text for the progress message once the bar is full.
pub const COMPLETE_TEXT: &str = "✅ Download complete!";

/// Media platforms the download commands pretend to fetch from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DownloadSource {
    /// Progress-bar download.
    YouTube,
    /// Single delayed step.
    Instagram,
    /// Single delayed step.
    TikTok,
}

impl DownloadSource {
    /// Display name of the platform.
    pub fn label(&self) -> &'static str {
        match self {
            Self::YouTube => "YouTube",
            Self::Instagram => "Instagram",
            Self::TikTok => "TikTok",
        }
    }

    /// Command token without arguments.
    pub fn command(&self) -> &'static str {
        match self {
            Self::YouTube => "/youtube",
            Self::Instagram => "/instagram",
            Self::TikTok => "/tiktok",
        }
    }

    fn emoji(&self) -> &'static str {
        match self {
            Self::YouTube => "🎥",
            Self::Instagram => "📸",
            Self::TikTok => "🎵",
        }
    }

    /// Whether progress is reported tick by tick.
    pub fn has_progress_bar(&self) -> bool {
        matches!(self, Self::YouTube)
    }

    /// Reply for a download command without a URL.
    pub fn usage_warning(&self) -> String {
        let article = match self {
            Self::Instagram => "an",
            Self::YouTube | Self::TikTok => "a",
        };
        format!(
            "⚠️ Please provide {article} {} URL. Usage: {} [url]",
            self.label(),
            self.command()
        )
    }

    /// Acknowledgement sent when the download is accepted.
    pub fn processing_text(&self, url: &str) -> String {
        match self {
            Self::YouTube => format!("🎥 Processing YouTube download: {url}"),
            Self::Instagram | Self::TikTok => {
                format!("{} Processing {} download for: {url}", self.emoji(), self.label())
            }
        }
    }

    /// Progress line for `percent`.
    pub fn progress_text(&self, percent: u8) -> String {
        format!(
            "{} Downloading from {}: {} {percent}%",
            self.emoji(),
            self.label(),
            render_progress_bar(percent)
        )
    }

    /// Canned result summary.
    pub fn summary(&self, url: &str) -> String {
        match self {
            Self::YouTube => format!(
                "🎥 YouTube download completed:\n🎬 Title: Sample YouTube Video\n⏱️ Length: 5:23\n📝 Quality: 1080p\n📦 Size: 45 MB\n🔗 Source: {url}"
            ),
            Self::Instagram => format!(
                "📸 Instagram post downloaded:\n👤 User: @sample_user\n📦 Size: 12 MB\n🔗 Source: {url}"
            ),
            Self::TikTok => format!(
                "🎵 TikTok video downloaded:\n👤 Creator: @tiktok_user\n⏱️ Duration: 30 seconds\n👁️ Views: 45,000\n📦 Size: 8 MB\n🔗 Source: {url}"
            ),
        }
    }
}

impl fmt::Display for DownloadSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A download accepted by a handler, waiting to be simulated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    /// Platform.
    pub source: DownloadSource,
    /// URL exactly as the user typed it.
    pub url: String,
}

impl DownloadRequest {
    /// Creates a request.
    pub fn new(source: DownloadSource, url: impl Into<String>) -> Self {
        Self {
            source,
            url: url.into(),
        }
    }
}

/// Renders `percent` as a ten-cell `▰`/`▱` bar.
pub fn render_progress_bar(percent: u8) -> String {
    let filled = usize::from(percent.min(100)) / (100 / BAR_CELLS);
    let mut bar = "▰".repeat(filled);
    bar.push_str(&"▱".repeat(BAR_CELLS - filled));
    bar
}

/// How far each tick advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepPolicy {
    /// Same increment every tick.
    Fixed(u8),
    /// Uniform increment in `min..=max`.
    Random {
        /// Smallest increment.
        min: u8,
        /// Largest increment.
        max: u8,
    },
}

impl StepPolicy {
    /// Smallest increment this policy can produce, never zero.
    pub fn min_step(&self) -> u8 {
        match *self {
            Self::Fixed(step) => step.max(1),
            Self::Random { min, max } => min.min(max).max(1),
        }
    }
}

/// Finite, non-decreasing progress values: `0`, then increments, ending at
/// exactly `100`.
#[derive(Debug, Clone)]
pub struct ProgressSequence {
    policy: StepPolicy,
    rng: StdRng,
    next: Option<u8>,
}

impl ProgressSequence {
    /// Sequence with a fixed increment.
    pub fn fixed(step: u8) -> Self {
        Self::with_rng(StepPolicy::Fixed(step), StdRng::seed_from_u64(0))
    }

    /// Sequence with random increments in `min..=max`.
    pub fn random(min: u8, max: u8) -> Self {
        Self::with_rng(StepPolicy::Random { min, max }, StdRng::from_os_rng())
    }

    /// Reproducible random sequence.
    pub fn seeded(min: u8, max: u8, seed: u64) -> Self {
        Self::with_rng(StepPolicy::Random { min, max }, StdRng::seed_from_u64(seed))
    }

    fn with_rng(policy: StepPolicy, rng: StdRng) -> Self {
        Self {
            policy,
            rng,
            next: Some(0),
        }
    }

    /// Upper bound on the number of values produced.
    pub fn max_len(&self) -> usize {
        usize::from(100_u8.div_ceil(self.policy.min_step())) + 1
    }

    fn step(&mut self) -> u8 {
        match self.policy {
            StepPolicy::Fixed(_) => self.policy.min_step(),
            StepPolicy::Random { min, max } => {
                let low = min.min(max).max(1);
                let high = min.max(max).max(low);
                self.rng.random_range(low..=high)
            }
        }
    }
}

impl Iterator for ProgressSequence {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        let current = self.next?;
        self.next = if current >= 100 {
            None
        } else {
            Some(current.saturating_add(self.step()).min(100))
        };
        Some(current)
    }
}

/// Pacing and step configuration for one simulation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationSettings {
    /// Delay before each progress update.
    pub tick_interval: Duration,
    /// Step policy for progress-bar sources.
    pub steps: StepPolicy,
    /// Delay before single-step sources complete.
    pub single_step_delay: Duration,
    /// Fixed RNG seed; `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self::from(&DownloadSettings::default())
    }
}

impl From<&DownloadSettings> for SimulationSettings {
    fn from(settings: &DownloadSettings) -> Self {
        Self {
            tick_interval: settings.tick_interval(),
            steps: StepPolicy::Random {
                min: settings.min_step,
                max: settings.max_step,
            },
            single_step_delay: settings.single_step_delay(),
            seed: None,
        }
    }
}

impl SimulationSettings {
    fn sequence(&self) -> ProgressSequence {
        match (self.steps, self.seed) {
            (StepPolicy::Fixed(step), _) => ProgressSequence::fixed(step),
            (StepPolicy::Random { min, max }, Some(seed)) => ProgressSequence::seeded(min, max, seed),
            (StepPolicy::Random { min, max }, None) => ProgressSequence::random(min, max),
        }
    }
}

/// One update from a running simulation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// Progress advanced; `text` replaces the progress message.
    Progress {
        /// Percentage, `0..=100`.
        percent: u8,
        /// Rendered progress line.
        text: String,
    },
    /// The download finished.
    Complete {
        /// Replacement for the progress message, when one exists.
        text: String,
        /// Result summary sent as a new message.
        summary: String,
    },
    /// The simulation was stopped before finishing.
    Stopped {
        /// Last reported percentage, if any progress was reported.
        percent: Option<u8>,
    },
}

impl ProgressEvent {
    /// Whether this event ends the stream.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Progress { .. })
    }
}

/// Stops a running [`DownloadSimulation`].
#[derive(Debug, Clone)]
pub struct StopHandle {
    token: CancellationToken,
}

impl StopHandle {
    /// Requests the simulation to stop; the stream then yields
    /// [`ProgressEvent::Stopped`] and ends.
    pub fn stop(&self) {
        self.token.cancel();
    }

    /// Whether a stop was requested.
    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// A simulated download that can be consumed as a stream.
#[derive(Debug)]
pub struct DownloadSimulation {
    request: DownloadRequest,
    settings: SimulationSettings,
    token: CancellationToken,
}

struct StreamState {
    request: DownloadRequest,
    sequence: Option<ProgressSequence>,
    tick: Duration,
    single_step_delay: Duration,
    token: CancellationToken,
    last: Option<u8>,
    finished: bool,
}

impl DownloadSimulation {
    /// Prepares a simulation; nothing runs until the stream is polled.
    pub fn new(request: DownloadRequest, settings: SimulationSettings) -> Self {
        Self {
            request,
            settings,
            token: CancellationToken::new(),
        }
    }

    /// The request being simulated.
    pub fn request(&self) -> &DownloadRequest {
        &self.request
    }

    /// Handle that stops this simulation.
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            token: self.token.clone(),
        }
    }

    /// Turns the simulation into its event stream.
    pub fn into_stream(self) -> BoxStream<'static, ProgressEvent> {
        let sequence = self
            .request
            .source
            .has_progress_bar()
            .then(|| self.settings.sequence());

        info!(
            source = %self.request.source,
            url = %self.request.url,
            "Starting simulated download"
        );

        let state = StreamState {
            request: self.request,
            sequence,
            tick: self.settings.tick_interval,
            single_step_delay: self.settings.single_step_delay,
            token: self.token,
            last: None,
            finished: false,
        };

        stream::unfold(state, |mut state| async move {
            if state.finished {
                return None;
            }

            let delay = if state.sequence.is_some() {
                state.tick
            } else {
                state.single_step_delay
            };

            let stopped = tokio::select! {
                biased;
                () = state.token.cancelled() => true,
                () = tokio::time::sleep(delay) => false,
            };

            let source = state.request.source;
            if stopped {
                state.finished = true;
                debug!(%source, percent = ?state.last, "Download stopped");
                let event = ProgressEvent::Stopped { percent: state.last };
                return Some((event, state));
            }

            let next = state.sequence.as_mut().and_then(|sequence| sequence.next());
            let event = match next {
                Some(percent) => {
                    state.last = Some(percent);
                    ProgressEvent::Progress {
                        percent,
                        text: source.progress_text(percent),
                    }
                }
                None => {
                    state.finished = true;
                    debug!(%source, "Download complete");
                    ProgressEvent::Complete {
                        text: COMPLETE_TEXT.to_string(),
                        summary: source.summary(&state.request.url),
                    }
                }
            };

            Some((event, state))
        })
        .boxed()
    }
}
