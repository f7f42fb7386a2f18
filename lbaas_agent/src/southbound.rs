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

//! The facts the agent needs from the OVN southbound database.

use std::sync::Arc;

use ovs::sbctl::{bare_values, string_condition};
use ovs::{CommandRunner, Sbctl};
use tracing::{event, Level};

use crate::error::{Fact, LookupError};
use crate::model::{canonical_mac, is_uuid};

/// Read-only view of the OVN southbound database.
///
/// Each method returns [`LookupError::NotFound`] when no record holds the fact and
/// [`LookupError::Invalid`] when the stored value can't be used.
pub trait Southbound: Send + Sync {
    /// `Port_Binding.tunnel_key` of `logical_port`.
    fn port_binding_tunnel_key(&self, logical_port: &str) -> Result<u32, LookupError>;

    /// UUID of the `Datapath_Binding` that `logical_port` is bound to.
    fn port_binding_datapath(&self, logical_port: &str) -> Result<String, LookupError>;

    /// `Datapath_Binding.tunnel_key` of the datapath with UUID `datapath`.
    fn datapath_binding_tunnel_key(&self, datapath: &str) -> Result<u64, LookupError>;

    /// `Service_Monitor.src_mac` of the monitor for `logical_port`, in lower case.
    fn service_monitor_src_mac(&self, logical_port: &str) -> Result<String, LookupError>;
}

impl<T: Southbound + ?Sized> Southbound for Arc<T> {
    fn port_binding_tunnel_key(&self, logical_port: &str) -> Result<u32, LookupError> {
        (**self).port_binding_tunnel_key(logical_port)
    }

    fn port_binding_datapath(&self, logical_port: &str) -> Result<String, LookupError> {
        (**self).port_binding_datapath(logical_port)
    }

    fn datapath_binding_tunnel_key(&self, datapath: &str) -> Result<u64, LookupError> {
        (**self).datapath_binding_tunnel_key(datapath)
    }

    fn service_monitor_src_mac(&self, logical_port: &str) -> Result<String, LookupError> {
        (**self).service_monitor_src_mac(logical_port)
    }
}

/// [`Southbound`] backed by `ovn-sbctl`.
pub struct SbctlSouthbound<R> {
    sbctl: Sbctl<R>,
}

impl<R: CommandRunner> SbctlSouthbound<R> {
    pub fn new(sbctl: Sbctl<R>) -> SbctlSouthbound<R> {
        SbctlSouthbound { sbctl }
    }

    fn lookup(&self, fact: Fact, table: &str, column: &str, condition: String, key: &str)
              -> Result<String, LookupError> {
        let output = self.sbctl.find(table, column, &[condition])?;
        first_value(fact, key, &output)
    }
}

impl<R: CommandRunner> Southbound for SbctlSouthbound<R> {
    fn port_binding_tunnel_key(&self, logical_port: &str) -> Result<u32, LookupError> {
        let fact = Fact::PortBindingTunnelKey;
        let value = self.lookup(fact, "port_binding", "tunnel_key",
                                string_condition("logical_port", logical_port), logical_port)?;
        let key = parse_int(&value)
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| invalid(fact, logical_port, &value))?;
        Ok(key)
    }

    fn port_binding_datapath(&self, logical_port: &str) -> Result<String, LookupError> {
        let fact = Fact::PortBindingDatapath;
        let value = self.lookup(fact, "port_binding", "datapath",
                                string_condition("logical_port", logical_port), logical_port)?;
        if !is_uuid(&value) {
            return Err(invalid(fact, logical_port, &value));
        }
        Ok(value)
    }

    fn datapath_binding_tunnel_key(&self, datapath: &str) -> Result<u64, LookupError> {
        let fact = Fact::DatapathTunnelKey;
        // `find` rather than `list`, so that a missing record is empty output instead of an
        // error exit.
        let value = self.lookup(fact, "datapath_binding", "tunnel_key",
                                format!("_uuid={datapath}"), datapath)?;
        parse_int(&value).ok_or_else(|| invalid(fact, datapath, &value))
    }

    fn service_monitor_src_mac(&self, logical_port: &str) -> Result<String, LookupError> {
        let fact = Fact::ServiceMonitorMac;
        let value = self.lookup(fact, "service_monitor", "src_mac",
                                string_condition("logical_port", logical_port), logical_port)?;
        canonical_mac(value.trim_matches('"')).ok_or_else(|| invalid(fact, logical_port, &value))
    }
}

/// Returns the first value in `--bare` output.  Several records can match, e.g. one
/// `Service_Monitor` per load balancer member; they all carry the same value for the columns
/// the agent reads, so the first one wins.
fn first_value(fact: Fact, key: &str, output: &str) -> Result<String, LookupError> {
    let values = bare_values(output);
    match values.as_slice() {
        [] => Err(LookupError::NotFound { fact, key: key.into() }),
        [value] => Ok((*value).into()),
        [value, ..] => {
            event!(Level::WARN, "{} records hold {fact} for {key}, using {value:?}", values.len());
            Ok((*value).into())
        }
    }
}

/// Parses an OVSDB integer, which `ovn-sbctl` prints in decimal.  Hex with `0x` is accepted too.
fn parse_int(s: &str) -> Option<u64> {
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => s.parse().ok(),
    }
}

fn invalid(fact: Fact, key: &str, value: &str) -> LookupError {
    LookupError::Invalid { fact, key: key.into(), value: value.into() }
}
