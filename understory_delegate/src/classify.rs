// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Argument classifier: resolve a heterogeneous argument list into registration fields.
//!
//! ## Priority table
//!
//! Arguments are visited in order. Each kind fills its slots first-come, first-served:
//!
//! | Kind | Slots, in order | When all are taken |
//! |------|-----------------|--------------------|
//! | [`Arg::Target`] | target | ambiguous, discarded |
//! | [`Arg::HandlerObject`] | handler | ambiguous, discarded |
//! | [`Arg::Callback`] | handler, selector, validator | ambiguous, discarded |
//! | [`Arg::Text`] | event name, selector | ambiguous, discarded |
//! | [`Arg::Options`] | every `Some` field overwrites | n/a |
//! | [`Arg::Targets`] | none | unrecognized, discarded |
//!
//! Kinds do not compete with each other except through shared slots, so
//! reordering arguments of different kinds does not change the result.
//! Named options always overwrite, whichever position they appear in.

use alloc::vec::Vec;
use core::fmt;

use crate::args::{Arg, Handler, Options, Selector};
use crate::types::DispatchTarget;

/// A non-fatal classification problem. The offending argument was discarded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Diagnostic {
    /// Every slot the argument's kind can fill was already taken.
    Ambiguous {
        /// Index of the argument in the list.
        position: usize,
        /// Kind of the discarded argument.
        kind: &'static str,
    },
    /// The argument's kind cannot be placed by a single registration.
    Unrecognized {
        /// Index of the argument in the list.
        position: usize,
        /// Kind of the discarded argument.
        kind: &'static str,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ambiguous { position, kind } => {
                write!(f, "argument {position}: extra {kind} discarded")
            }
            Self::Unrecognized { position, kind } => {
                write!(f, "argument {position}: {kind} not accepted here")
            }
        }
    }
}

/// Classifier output.
#[derive(Debug)]
pub struct Classified<T: DispatchTarget> {
    /// Gathered registration fields.
    pub fields: Options<T>,
    /// Problems recovered from while classifying.
    pub diagnostics: Vec<Diagnostic>,
}

/// Classify `args` into registration fields.
///
/// Every diagnostic is also logged at `warn` level.
pub fn classify<T: DispatchTarget>(args: impl IntoIterator<Item = Arg<T>>) -> Classified<T> {
    let mut fields = Options::new();
    let mut diagnostics = Vec::new();

    for (position, arg) in args.into_iter().enumerate() {
        let kind = arg.kind();
        let placed = match arg {
            Arg::Target(target) => fill(&mut fields.target, target),
            Arg::HandlerObject(obj) => fill(&mut fields.handler, Handler::Object(obj)),
            Arg::Callback(f) => {
                if fields.handler.is_none() {
                    fields.handler = Some(Handler::Callback(f));
                    true
                } else if fields.selector.is_none() {
                    fields.selector = Some(Selector::Predicate(f));
                    true
                } else {
                    fill(&mut fields.validator, f)
                }
            }
            Arg::Text(text) => {
                if fields.event_name.is_none() {
                    fields.event_name = Some(text);
                    true
                } else {
                    fill(&mut fields.selector, Selector::Structural(text))
                }
            }
            Arg::Options(named) => {
                merge(&mut fields, named);
                true
            }
            Arg::Targets(_) => {
                let d = Diagnostic::Unrecognized { position, kind };
                tracing::warn!(position, kind, "unrecognized registration argument discarded");
                diagnostics.push(d);
                continue;
            }
        };
        if !placed {
            tracing::warn!(position, kind, "ambiguous registration argument discarded");
            diagnostics.push(Diagnostic::Ambiguous { position, kind });
        }
    }

    Classified {
        fields,
        diagnostics,
    }
}

/// Put `value` in `slot` if it is empty. Returns whether it was placed.
fn fill<V>(slot: &mut Option<V>, value: V) -> bool {
    if slot.is_some() {
        return false;
    }
    *slot = Some(value);
    true
}

/// Simple merge: every `Some` field of `named` overwrites.
fn merge<T: DispatchTarget>(fields: &mut Options<T>, named: Options<T>) {
    let Options {
        target,
        event_name,
        handler,
        selector,
        validator,
        capture,
        once,
        passive,
        signal,
        detach,
    } = named;
    overwrite(&mut fields.target, target);
    overwrite(&mut fields.event_name, event_name);
    overwrite(&mut fields.handler, handler);
    overwrite(&mut fields.selector, selector);
    overwrite(&mut fields.validator, validator);
    overwrite(&mut fields.capture, capture);
    overwrite(&mut fields.once, once);
    overwrite(&mut fields.passive, passive);
    overwrite(&mut fields.signal, signal);
    overwrite(&mut fields.detach, detach);
}

#[inline]
fn overwrite<V>(slot: &mut Option<V>, value: Option<V>) {
    if value.is_some() {
        *slot = value;
    }
}
