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
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::Error;

lazy_static! {
    static ref COOKIE_RE: Regex = Regex::new("^[0-9a-fA-F]{1,16}$").unwrap();
    static ref UUID_RE: Regex = Regex::new(
        "^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$").unwrap();
    static ref MAC_RE: Regex = Regex::new("^[0-9a-fA-F]{2}(:[0-9a-fA-F]{2}){5}$").unwrap();
}

/// A 64-bit OpenFlow flow cookie.
///
/// Callers name cookies as 1 to 16 hex digits without a `0x` prefix.  `Display` gives the
/// canonical form: lower case, no prefix, no leading zeros.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cookie(pub u64);

impl Cookie {
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:x}", self.0)
    }
}

impl FromStr for Cookie {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !COOKIE_RE.is_match(s) {
            return Err(Error::InvalidCookie(s.into()));
        }
        u64::from_str_radix(s, 16)
            .map(Cookie)
            .map_err(|_| Error::InvalidCookie(s.into()))
    }
}

/// Everything OVN knows that's needed to build the redirect flow for one bare-metal port.
///
/// A context is built fresh for each request and never modified afterward.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OvnContext {
    /// `Port_Binding.tunnel_key`, written to `reg14` by the flow's actions.
    pub port_binding_tunnel_key: u32,

    /// `Port_Binding.datapath`: the logical switch the port is on.
    pub datapath_uuid: String,

    /// `Datapath_Binding.tunnel_key`, matched as OpenFlow `metadata`.
    pub datapath_tunnel_key: u64,

    /// `Service_Monitor.src_mac` in lower case, matched as `dl_dst`.
    pub service_mac: String,
}

/// Checks that `port_id` looks like a Neutron port ID, e.g. `3f2a0c3e-9b1d-4c55-8e2a-0d9f1b7c6a10`.
pub fn validate_port_id(port_id: &str) -> Result<(), Error> {
    if UUID_RE.is_match(port_id) {
        Ok(())
    } else {
        Err(Error::InvalidPortId(port_id.into()))
    }
}

pub fn is_uuid(s: &str) -> bool {
    UUID_RE.is_match(s)
}

/// Returns `mac` in canonical lower case if it has the form `xx:xx:xx:xx:xx:xx`.
pub fn canonical_mac(mac: &str) -> Option<String> {
    if MAC_RE.is_match(mac) {
        Some(mac.to_ascii_lowercase())
    } else {
        None
    }
}
