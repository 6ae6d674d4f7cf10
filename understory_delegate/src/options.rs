// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Listener options: flags and the cancellation signal handed to the host.
//!
//! A [`ListenerOptions`] record is resolved once per registration and shared by
//! reference for both attach and detach, so a listener is never detached with
//! options that differ from the ones it was attached with.

use alloc::rc::Rc;
use core::cell::Cell;
use core::fmt;

bitflags::bitflags! {
    /// Registration-time listener flags.
    ///
    /// An absent flag means the host default, which is off for all three.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ListenerFlags: u8 {
        /// Invoke during the capture phase instead of the bubble phase.
        const CAPTURE = 0b0000_0001;
        /// Remove the listener after its first invocation.
        const ONCE    = 0b0000_0010;
        /// The listener promises not to prevent the default action.
        const PASSIVE = 0b0000_0100;
    }
}

/// Owner side of a cancellation signal.
///
/// Aborting removes every listener that was attached with the controller's
/// [`signal`](Self::signal) the next time the host observes it.
#[derive(Debug, Default)]
pub struct AbortController {
    signal: AbortSignal,
}

impl AbortController {
    /// Create a controller with a fresh, non-aborted signal.
    pub fn new() -> Self {
        Self::default()
    }

    /// The signal to pass with listener options.
    pub fn signal(&self) -> AbortSignal {
        self.signal.clone()
    }

    /// Abort the signal. Aborting twice is a no-op.
    pub fn abort(&self) {
        self.signal.0.set(true);
    }
}

/// Observer side of a cancellation signal. Clones observe the same state.
#[derive(Clone, Default)]
pub struct AbortSignal(Rc<Cell<bool>>);

impl AbortSignal {
    /// Whether the owning controller has aborted.
    pub fn aborted(&self) -> bool {
        self.0.get()
    }
}

impl PartialEq for AbortSignal {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for AbortSignal {}

impl fmt::Debug for AbortSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AbortSignal")
            .field("aborted", &self.aborted())
            .finish()
    }
}

/// Immutable listener options passed to the host on attach and detach.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListenerOptions {
    /// Capture, once and passive flags.
    pub flags: ListenerFlags,
    /// Optional cancellation signal.
    pub signal: Option<AbortSignal>,
}

impl ListenerOptions {
    /// Resolve options from optional named flags, defaulting absent ones to off.
    pub fn resolve(
        capture: Option<bool>,
        once: Option<bool>,
        passive: Option<bool>,
        signal: Option<AbortSignal>,
    ) -> Rc<Self> {
        let mut flags = ListenerFlags::empty();
        flags.set(ListenerFlags::CAPTURE, capture.unwrap_or(false));
        flags.set(ListenerFlags::ONCE, once.unwrap_or(false));
        flags.set(ListenerFlags::PASSIVE, passive.unwrap_or(false));
        Rc::new(Self { flags, signal })
    }

    /// Whether the listener runs in the capture phase.
    #[inline]
    pub fn capture(&self) -> bool {
        self.flags.contains(ListenerFlags::CAPTURE)
    }

    /// Whether the listener is removed after its first invocation.
    #[inline]
    pub fn once(&self) -> bool {
        self.flags.contains(ListenerFlags::ONCE)
    }

    /// Whether the listener is passive.
    #[inline]
    pub fn passive(&self) -> bool {
        self.flags.contains(ListenerFlags::PASSIVE)
    }

    /// Whether the attached signal, if any, has been aborted.
    pub fn aborted(&self) -> bool {
        self.signal.as_ref().is_some_and(AbortSignal::aborted)
    }
}
