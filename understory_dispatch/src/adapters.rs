// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Integration with other Understory crates.

#[cfg(feature = "dom_adapter")]
pub mod dom;
