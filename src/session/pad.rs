// SPDX-License-Identifier: GPL-3.0-only

//! Dynamic source pad bookkeeping
//!
//! `rtspsrc` only exposes its output pad once the RTSP handshake completes,
//! and announces it from a streaming thread. [`PadSlot`] is the state those
//! callbacks consult (behind a mutex) to decide whether a pad may be linked:
//! every `start` arms a new generation, every `stop` disarms it, and pads
//! announced for a stale generation are ignored. The outcome of each callback
//! is posted to the event loop as a [`PadEvent`].

/// What a pad-added callback should do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PadDecision {
    /// Link the pad into the decode chain
    Link,
    /// The session was stopped or restarted since the pad was announced
    Stale,
    /// A source pad is already linked for this generation
    AlreadyLinked,
}

/// Generation-tagged record of the linked source pad
#[derive(Debug)]
pub struct PadSlot<P> {
    generation: u64,
    armed: bool,
    linked: Option<P>,
}

impl<P> Default for PadSlot<P> {
    fn default() -> Self {
        Self {
            generation: 0,
            armed: false,
            linked: None,
        }
    }
}

impl<P: PartialEq> PadSlot<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new generation; returns its tag for the callbacks to capture
    pub fn arm(&mut self) -> u64 {
        self.generation += 1;
        self.armed = true;
        self.linked = None;
        self.generation
    }

    /// End the current generation; returns the pad that was linked, if any
    pub fn disarm(&mut self) -> Option<P> {
        self.armed = false;
        self.generation += 1;
        self.linked.take()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.armed && generation == self.generation
    }

    /// Decide whether a newly announced pad may be linked
    pub fn on_added(&self, generation: u64) -> PadDecision {
        if !self.is_current(generation) {
            PadDecision::Stale
        } else if self.linked.is_some() {
            PadDecision::AlreadyLinked
        } else {
            PadDecision::Link
        }
    }

    /// Record a successful link
    pub fn record_linked(&mut self, pad: P) {
        self.linked = Some(pad);
    }

    /// Forget `pad` if it is the linked one; returns it so the caller can unlink
    pub fn on_removed(&mut self, generation: u64, pad: &P) -> Option<P> {
        if !self.is_current(generation) || self.linked.as_ref() != Some(pad) {
            return None;
        }
        self.linked.take()
    }

    /// Take the linked pad without ending the generation (address rebind)
    pub fn take_linked(&mut self) -> Option<P> {
        self.linked.take()
    }

    pub fn is_linked(&self) -> bool {
        self.linked.is_some()
    }
}

/// Outcome of a pad callback, delivered to the event loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PadEvent {
    pub generation: u64,
    pub kind: PadEventKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PadEventKind {
    Linked { pad: String },
    Unlinked { pad: String },
    LinkFailed { pad: String, reason: String },
}
