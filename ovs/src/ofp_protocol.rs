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

use thiserror::Error;

/// OpenFlow protocol versions, as named by the `-O` option of `ovs-ofctl`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Version {
    OFP10 = 0x01,
    OFP11 = 0x02,
    OFP12 = 0x03,
    OFP13 = 0x04,
    OFP14 = 0x05,
    OFP15 = 0x06,
}

impl Version {
    pub const ALL: [Version; 6] = [
        Version::OFP10,
        Version::OFP11,
        Version::OFP12,
        Version::OFP13,
        Version::OFP14,
        Version::OFP15,
    ];

    /// The name that `ovs-ofctl -O` accepts, e.g. `OpenFlow15`.
    pub fn name(self) -> &'static str {
        match self {
            Version::OFP10 => "OpenFlow10",
            Version::OFP11 => "OpenFlow11",
            Version::OFP12 => "OpenFlow12",
            Version::OFP13 => "OpenFlow13",
            Version::OFP14 => "OpenFlow14",
            Version::OFP15 => "OpenFlow15",
        }
    }
}

impl Default for Version {
    fn default() -> Self {
        Version::OFP15
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("unknown OpenFlow version {0:?} (expected OpenFlow10 through OpenFlow15)")]
pub struct UnknownVersion(pub String);

impl FromStr for Version {
    type Err = UnknownVersion;

    /// Accepts the `ovs-ofctl` spelling case-insensitively, plus the short `OF15` form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let digits = lower
            .strip_prefix("openflow")
            .or_else(|| lower.strip_prefix("of"))
            .ok_or_else(|| UnknownVersion(s.into()))?;
        Version::ALL
            .iter()
            .copied()
            .find(|v| v.name()["OpenFlow".len()..] == *digits)
            .ok_or_else(|| UnknownVersion(s.into()))
    }
}
