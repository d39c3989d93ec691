// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for epoch-second timestamps.

use chrono::Utc;

/// Current time as Unix epoch seconds.
pub fn now_epoch_secs() -> i64 {
    Utc::now().timestamp()
}
