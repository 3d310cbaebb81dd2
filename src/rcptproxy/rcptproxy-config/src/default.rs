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
use crate::ConfigurationSnapshot;

impl ConfigurationSnapshot {
    pub(crate) const fn default_refresh() -> bool {
        false
    }

    pub(crate) const fn default_port() -> u16 {
        rcptproxy_common::SMTP_PORT
    }

    pub(crate) fn default_helo() -> String {
        "world".to_string()
    }

    pub(crate) fn default_from() -> String {
        "rcptproxy@localhost".to_string()
    }

    pub(crate) const fn default_idle_timeout() -> std::time::Duration {
        std::time::Duration::from_secs(300)
    }

    pub(crate) const fn default_max_lifetime() -> std::time::Duration {
        std::time::Duration::from_secs(30 * 60)
    }

    pub(crate) const fn default_request_delay() -> std::time::Duration {
        std::time::Duration::from_millis(10_000)
    }

    pub(crate) const fn default_force_disconnect() -> bool {
        true
    }

    pub(crate) const fn default_deny_status() -> u16 {
        550
    }

    /// Template of the deny response, including the trailing marker.
    pub(crate) fn default_deny_template() -> String {
        "Unable to relay to @".to_string()
    }
}
