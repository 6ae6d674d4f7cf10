// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Registration errors.
//!
//! Only conditions that prevent a listener from being attached are errors.
//! Ambiguous or unplaceable arguments are recovered locally and reported as
//! [`Diagnostic`](crate::classify::Diagnostic)s instead.

use alloc::string::String;

/// Why a registration could not be created.
///
/// No listener is left attached when one of these is returned.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DelegateError {
    /// A delegated registration was rooted at a target that cannot root delegation.
    #[error("target {target} cannot root a delegated `{event_name}` listener")]
    InvalidTarget {
        /// Debug rendering of the rejected target.
        target: String,
        /// Event type of the rejected registration.
        event_name: String,
    },
    /// No target was supplied.
    #[error("registration has no target")]
    MissingTarget,
    /// No event name was supplied.
    #[error("registration has no event name")]
    MissingEventName,
    /// No handler was supplied.
    #[error("registration for `{event_name}` has no handler")]
    MissingHandler {
        /// Event type of the incomplete registration.
        event_name: String,
    },
}
