/*
Copyright (c) 2022 VMware, Inc.
SPDX-License-Identifier: MIT
Permission is hereby granted, free of charge, to any person obtaining a copy
of this software and associated documentation files (the "Software"), to deal
in the Software without restriction, including without limitation the rights
to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:
The above copyright notice and this permission notice shall be included in all
copies or substantial portions of the Software.
THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
SOFTWARE.
 */

use std::fmt;

use ovs::CommandError;
use thiserror::Error;

use crate::model::Cookie;

/// A fact that the agent looks up in the OVN southbound database.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Fact {
    PortBindingTunnelKey,
    PortBindingDatapath,
    DatapathTunnelKey,
    ServiceMonitorMac,
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Fact::PortBindingTunnelKey => "port_binding.tunnel_key",
            Fact::PortBindingDatapath => "port_binding.datapath",
            Fact::DatapathTunnelKey => "datapath_binding.tunnel_key",
            Fact::ServiceMonitorMac => "service_monitor.src_mac",
        })
    }
}

/// Error that can arise looking up a [`Fact`].
#[derive(Error, Debug)]
pub enum LookupError {
    /// No record holds the fact for `key` (a logical port or datapath UUID).
    #[error("{fact} not found for {key}")]
    NotFound { fact: Fact, key: String },

    /// A record exists but its value is empty or malformed.
    #[error("invalid {fact} for {key} ({value:?})")]
    Invalid { fact: Fact, key: String, value: String },

    /// The database could not be queried.
    #[error(transparent)]
    Command(#[from] CommandError),
}

/// Why an insertion or deletion was refused because of what's already in the flow table.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum Conflict {
    #[error("conflicting cookie already exists (cookie_value : {0})")]
    CookieInUse(Cookie),

    #[error("OpenFlow rule for this match already exists as LBaaS rule{}", CookieList(.0))]
    AlreadyInstalled(Vec<Cookie>),

    #[error("conflicting OpenFlow rule exists with the same match; refusing to override{}", CookieList(.0))]
    ForeignRule(Vec<Cookie>),

    #[error("too many OpenFlow rules found (cookie_value : {cookie}, {count} flows)")]
    Ambiguous { cookie: Cookie, count: usize },

    #[error("matched OpenFlow rule is not an LBaaS rule (cookie_value : {cookie}, missing {missing})")]
    NotOurs { cookie: Cookie, missing: String },
}

/// Formats ` (existing cookies: a, b)`, or nothing for an empty list.
struct CookieList<'a>(&'a [Cookie]);

impl fmt::Display for CookieList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.0.is_empty() {
            return Ok(());
        }
        write!(f, " (existing cookies: ")?;
        for (i, cookie) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{cookie}")?;
        }
        write!(f, ")")
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("cookie_value and bm_neutron_port_id are required")]
    MissingFields,

    #[error("malformed request: {0}")]
    BadRequest(String),

    #[error("cookie_value must be 1 to 16 hex digits without 0x (got {0:?})")]
    InvalidCookie(String),

    #[error("bm_neutron_port_id must be a UUID like xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx (got {0:?})")]
    InvalidPortId(String),

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error("OpenFlow rule not found (cookie_value : {0})")]
    FlowNotFound(Cookie),

    #[error(transparent)]
    Conflict(#[from] Conflict),

    #[error(transparent)]
    Command(#[from] CommandError),
}

/// Broad classes of [`Error`], each of which gets its own HTTP status.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or malformed input.
    Validation,
    /// The port couldn't be resolved in the southbound database.
    Resolution,
    /// No flow carries the cookie to delete.
    NotFound,
    Conflict,
    /// A database or flow table command failed.
    Upstream,
    /// A database or flow table command ran out of time.
    Timeout,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::MissingFields | Error::BadRequest(_) | Error::InvalidCookie(_)
                | Error::InvalidPortId(_) => ErrorKind::Validation,
            Error::Lookup(LookupError::Command(e)) | Error::Command(e) => if e.is_timeout() {
                ErrorKind::Timeout
            } else {
                ErrorKind::Upstream
            },
            Error::Lookup(_) => ErrorKind::Resolution,
            Error::FlowNotFound(_) => ErrorKind::NotFound,
            Error::Conflict(_) => ErrorKind::Conflict,
        }
    }
}
