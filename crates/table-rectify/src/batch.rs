//! Frame sequences with an explicit failure policy.
//!
//! Frames are rectified independently; the only state carried from one frame
//! to the next is the failure count the policy looks at.

use crate::{RectifiedTable, RectifyError, TableRectifier, TableRectifyParams};
use log::warn;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use table_rectify_core::ColorImageView;

/// What to do when a frame cannot be rectified.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Record the failure and continue with the next frame.
    #[default]
    Skip,
    /// Stop at the first failure.
    Abort,
    /// Stop once this many consecutive frames have failed.
    AbortAfter(usize),
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailurePolicy::Skip => f.write_str("skip"),
            FailurePolicy::Abort => f.write_str("abort"),
            FailurePolicy::AbortAfter(n) => write!(f, "abort-after:{n}"),
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown failure policy '{0}', expected skip, abort or abort-after:N")]
pub struct ParsePolicyError(pub String);

impl FromStr for FailurePolicy {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "skip" => Ok(FailurePolicy::Skip),
            "abort" => Ok(FailurePolicy::Abort),
            _ => s
                .strip_prefix("abort-after:")
                .and_then(|n| n.parse::<usize>().ok())
                .map(FailurePolicy::AbortAfter)
                .ok_or_else(|| ParsePolicyError(s.to_string())),
        }
    }
}

/// A batch stopped because of its failure policy.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("frame {frame} failed ({consecutive} consecutive failures): {source}")]
pub struct BatchError {
    pub frame: usize,
    pub consecutive: usize,
    #[source]
    pub source: RectifyError,
}

/// Applies a [`FailurePolicy`] to a stream of per-frame results.
#[derive(Clone, Debug)]
pub struct FailureTracker {
    policy: FailurePolicy,
    consecutive: usize,
    failed: usize,
}

impl FailureTracker {
    pub fn new(policy: FailurePolicy) -> Self {
        Self {
            policy,
            consecutive: 0,
            failed: 0,
        }
    }

    /// Register the outcome of `frame`; `Err` means the batch must stop.
    pub fn record<T>(&mut self, frame: usize, result: &Result<T, RectifyError>) -> Result<(), BatchError> {
        let Err(err) = result else {
            self.consecutive = 0;
            return Ok(());
        };

        self.consecutive += 1;
        self.failed += 1;
        let stop = match self.policy {
            FailurePolicy::Skip => false,
            FailurePolicy::Abort => true,
            FailurePolicy::AbortAfter(n) => self.consecutive >= n.max(1),
        };

        if stop {
            return Err(BatchError {
                frame,
                consecutive: self.consecutive,
                source: err.clone(),
            });
        }
        warn!("skipping frame {}: {}", frame, err);
        Ok(())
    }

    /// Total number of failed frames so far.
    pub fn failed(&self) -> usize {
        self.failed
    }
}

/// Result of one frame in a batch.
#[derive(Debug)]
pub struct FrameOutcome {
    pub frame: usize,
    pub result: Result<RectifiedTable, RectifyError>,
}

/// Lazily rectified frame sequence, see [`rectify_frames`].
///
/// Yields one `Ok(FrameOutcome)` per frame, skipped failures included. When
/// the policy stops the batch it yields the [`BatchError`] once and then
/// ends. Nothing is retained between frames beyond the failure counters.
#[derive(Debug)]
pub struct RectifyFrames<I> {
    frames: std::iter::Enumerate<I>,
    rectifier: TableRectifier,
    tracker: FailureTracker,
    stopped: bool,
}

impl<I> RectifyFrames<I> {
    /// Failed frames seen so far, skipped or not.
    pub fn failed(&self) -> usize {
        self.tracker.failed()
    }
}

impl<'a, I> Iterator for RectifyFrames<I>
where
    I: Iterator<Item = ColorImageView<'a>>,
{
    type Item = Result<FrameOutcome, BatchError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.stopped {
            return None;
        }
        let (frame, view) = self.frames.next()?;
        let result = self.rectifier.rectify(&view);
        if let Err(err) = self.tracker.record(frame, &result) {
            self.stopped = true;
            return Some(Err(err));
        }
        Some(Ok(FrameOutcome { frame, result }))
    }
}

impl<'a, I> std::iter::FusedIterator for RectifyFrames<I> where I: Iterator<Item = ColorImageView<'a>> {}

/// Rectify every frame with the same parameters, one frame per `next()`.
///
/// Each output is dropped as soon as the caller is done with it, so long
/// sequences run in constant memory.
pub fn rectify_frames<'a, I>(
    frames: I,
    params: &TableRectifyParams,
    policy: FailurePolicy,
) -> RectifyFrames<I::IntoIter>
where
    I: IntoIterator<Item = ColorImageView<'a>>,
{
    RectifyFrames {
        frames: frames.into_iter().enumerate(),
        rectifier: TableRectifier::new(params.clone()),
        tracker: FailureTracker::new(policy),
        stopped: false,
    }
}
