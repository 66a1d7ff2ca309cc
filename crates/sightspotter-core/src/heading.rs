//! Heading stabilization
//!
//! Compass readings are unreliable right after the sensor subscription starts.
//! The stabilizer throws away the first reading and commits the second one;
//! once committed it ignores every further sample until it is reset.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Number of leading samples discarded before committing
pub const DISCARDED_SAMPLES: u32 = 1;

/// North reference of a heading reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeadingReference {
    Magnetic,
    True,
}

impl Default for HeadingReference {
    fn default() -> Self {
        Self::Magnetic
    }
}

/// A single raw reading from the heading sensor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeadingSample {
    /// Heading in degrees clockwise from north
    pub degrees: f64,
    #[serde(default)]
    pub reference: HeadingReference,
}

impl HeadingSample {
    pub fn magnetic(degrees: f64) -> Self {
        Self {
            degrees,
            reference: HeadingReference::Magnetic,
        }
    }

    pub fn true_north(degrees: f64) -> Self {
        Self {
            degrees,
            reference: HeadingReference::True,
        }
    }
}

/// The heading value the stabilizer settled on
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeadingCommit {
    pub heading: f64,
    pub reference: HeadingReference,
    /// Samples counted up to and including the committed one
    pub samples_seen: u32,
}

/// Stabilizer lifecycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StabilizerState {
    /// Not subscribed to heading updates
    Idle,
    /// Subscribed, nothing received yet
    AwaitingFirstSample,
    /// Early samples received and discarded
    AwaitingCommit,
    /// A heading has been committed; further samples are ignored
    Committed(HeadingCommit),
}

/// Turns a stream of raw heading samples into one committed heading.
///
/// Not thread-safe by itself: the owner must feed samples one at a time, in
/// arrival order, from a single execution context.
#[derive(Debug, Clone)]
pub struct HeadingStabilizer {
    state: StabilizerState,
    samples_seen: u32,
}

impl Default for HeadingStabilizer {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadingStabilizer {
    pub fn new() -> Self {
        Self {
            state: StabilizerState::Idle,
            samples_seen: 0,
        }
    }

    pub fn state(&self) -> StabilizerState {
        self.state
    }

    pub fn samples_seen(&self) -> u32 {
        self.samples_seen
    }

    /// Whether the owner should keep the heading sensor running
    pub fn is_subscribed(&self) -> bool {
        matches!(
            self.state,
            StabilizerState::AwaitingFirstSample | StabilizerState::AwaitingCommit
        )
    }

    pub fn committed(&self) -> Option<HeadingCommit> {
        match self.state {
            StabilizerState::Committed(commit) => Some(commit),
            _ => None,
        }
    }

    /// Start listening for samples. No-op unless idle.
    pub fn subscribe(&mut self) {
        if self.state == StabilizerState::Idle {
            self.samples_seen = 0;
            self.state = StabilizerState::AwaitingFirstSample;
            debug!("Heading stabilizer subscribed");
        }
    }

    /// Drop any progress or committed value and return to idle
    pub fn reset(&mut self) {
        self.state = StabilizerState::Idle;
        self.samples_seen = 0;
    }

    /// Feed one sample. Returns the commit exactly once, on the sample that
    /// causes it; every other call returns `None`.
    pub fn on_sample(&mut self, sample: HeadingSample) -> Option<HeadingCommit> {
        match self.state {
            StabilizerState::Idle | StabilizerState::Committed(_) => {
                trace!(heading = sample.degrees, "Ignoring heading sample");
                return None;
            }
            StabilizerState::AwaitingFirstSample | StabilizerState::AwaitingCommit => {}
        }

        if !sample.degrees.is_finite() {
            debug!(heading = sample.degrees, "Skipping non-finite heading sample");
            return None;
        }

        self.samples_seen += 1;

        if self.samples_seen <= DISCARDED_SAMPLES {
            trace!(
                heading = sample.degrees,
                count = self.samples_seen,
                "Discarding early heading sample"
            );
            self.state = StabilizerState::AwaitingCommit;
            return None;
        }

        let commit = HeadingCommit {
            heading: sample.degrees,
            reference: sample.reference,
            samples_seen: self.samples_seen,
        };
        self.state = StabilizerState::Committed(commit);
        debug!(heading = commit.heading, "Heading committed");
        Some(commit)
    }
}
