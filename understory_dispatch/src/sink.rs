// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Where unhandled listener failures end up.

use alloc::string::String;

/// A listener failure that was not handled by an `error` listener.
///
/// Also the detail of the `error` event the engine dispatches at `window`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ErrorReport {
    /// Type of the event whose listener failed.
    pub event_type: String,
    /// The failure message.
    pub message: String,
}

/// Receives unhandled [`ErrorReport`]s.
///
/// Closures taking `&ErrorReport` are sinks too.
pub trait ErrorSink {
    /// Record one report.
    fn report(&mut self, report: &ErrorReport);
}

impl<F: FnMut(&ErrorReport)> ErrorSink for F {
    fn report(&mut self, report: &ErrorReport) {
        self(report);
    }
}

/// The default sink: logs through `tracing` at error level.
#[derive(Copy, Clone, Debug, Default)]
pub struct TracingSink;

impl ErrorSink for TracingSink {
    fn report(&mut self, report: &ErrorReport) {
        tracing::error!(
            event_type = %report.event_type,
            message = %report.message,
            "uncaught listener failure"
        );
    }
}
