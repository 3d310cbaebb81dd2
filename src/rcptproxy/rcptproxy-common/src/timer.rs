/*
 * vSMTP mail transfer agent
 * Copyright (C) 2022 viridIT SAS
 *
 * This program is free software: you can redistribute it and/or modify it under
 * the terms of the GNU General Public License as published by the Free Software
 * Foundation, either version 3 of the License, or any later version.
 *
 * This program is distributed in the hope that it will be useful, but WITHOUT
 * ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
 * FOR A PARTICULAR PURPOSE.  See the GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License along with
 * this program. If not, see https://www.gnu.org/licenses/.
 *
*/

/// Monotonic stopwatch used to bound requests and to age connections.
///
/// Built on [`tokio::time::Instant`] so that deadlines computed here can be
/// handed directly to [`tokio::time::timeout_at`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timer {
    started: tokio::time::Instant,
}

impl Default for Timer {
    fn default() -> Self {
        Self::start()
    }
}

impl Timer {
    /// Create a timer started now.
    #[must_use]
    pub fn start() -> Self {
        Self {
            started: tokio::time::Instant::now(),
        }
    }

    /// Restart the timer.
    pub fn reset(&mut self) {
        self.started = tokio::time::Instant::now();
    }

    /// Instant at which the timer was (re)started.
    #[must_use]
    pub const fn started(&self) -> tokio::time::Instant {
        self.started
    }

    /// Time elapsed since the timer was (re)started.
    #[must_use]
    pub fn elapsed(&self) -> std::time::Duration {
        self.started.elapsed()
    }

    /// Time left before `limit` is reached, floored at zero.
    #[must_use]
    pub fn remaining(&self, limit: std::time::Duration) -> std::time::Duration {
        limit.saturating_sub(self.elapsed())
    }

    /// Absolute deadline `limit` after the start of the timer.
    #[must_use]
    pub fn deadline(&self, limit: std::time::Duration) -> tokio::time::Instant {
        self.started + limit
    }

    /// Is the `limit` reached ?
    #[must_use]
    pub fn is_expired(&self, limit: std::time::Duration) -> bool {
        self.remaining(limit).is_zero()
    }
}
