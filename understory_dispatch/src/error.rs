// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::borrow::Cow;
use core::fmt;

use understory_event_path::PathError;
use understory_listener::ListenerError;

use crate::frame::FrameId;

/// Coarse classification of a [`DispatchError`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A bad target or root.
    InvalidArgument,
    /// An API call that is not valid in the current state.
    InvalidState,
    /// An internal invariant was broken. Not recoverable.
    InvariantViolation,
}

/// Errors returned synchronously by the dispatch API.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DispatchError {
    /// The path could not be built.
    Path(PathError),
    /// A listener registration violated the option invariants.
    Listener(ListenerError),
    /// The event object was already dispatched.
    AlreadyDispatched,
    /// `set_default` or `prevent_default` outside the target and bubble phases.
    WrongPhase,
    /// The dispatch stack was not unwound in LIFO order.
    StackOrder {
        /// The frame the caller expected on top.
        expected: FrameId,
        /// The frame actually on top, if any.
        found: Option<FrameId>,
    },
}

impl DispatchError {
    /// The error's classification.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Path(_) => ErrorKind::InvalidArgument,
            Self::Listener(_) | Self::AlreadyDispatched | Self::WrongPhase => {
                ErrorKind::InvalidState
            }
            Self::StackOrder { .. } => ErrorKind::InvariantViolation,
        }
    }
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(err) => write!(f, "invalid dispatch path: {err}"),
            Self::Listener(err) => write!(f, "invalid listener: {err}"),
            Self::AlreadyDispatched => f.write_str("the event has already been dispatched"),
            Self::WrongPhase => f.write_str(
                "default actions can only be set or prevented at the target or while bubbling",
            ),
            Self::StackOrder { expected, found } => write!(
                f,
                "dispatch stack unwound out of order: expected {expected:?}, found {found:?}"
            ),
        }
    }
}

impl core::error::Error for DispatchError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Path(err) => Some(err),
            Self::Listener(err) => Some(err),
            _ => None,
        }
    }
}

impl From<PathError> for DispatchError {
    fn from(err: PathError) -> Self {
        Self::Path(err)
    }
}

impl From<ListenerError> for DispatchError {
    fn from(err: ListenerError) -> Self {
        Self::Listener(err)
    }
}

/// A failure returned by a listener.
///
/// Failures never abort a dispatch. The engine reports them on the next turn
/// as an `error` event at `window`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListenerFailure {
    message: Cow<'static, str>,
}

impl ListenerFailure {
    /// A failure with a message.
    pub fn new(message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The failure message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ListenerFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl core::error::Error for ListenerFailure {}
