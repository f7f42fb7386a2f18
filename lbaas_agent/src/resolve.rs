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

use tracing::{event, Level};

use crate::error::{Fact, LookupError};
use crate::model::OvnContext;
use crate::southbound::Southbound;

/// Looks up everything needed to build the flow for `logical_port`.
///
/// The lookups run in a fixed order: port tunnel key, port datapath, datapath tunnel key, service
/// MAC.  The first one that fails ends the resolution.  A zero tunnel key or an empty datapath
/// or MAC counts as invalid, so the returned context never has a missing field.
pub fn resolve<S: Southbound + ?Sized>(sb: &S, logical_port: &str) -> Result<OvnContext, LookupError> {
    let invalid = |fact, key: &str, value: String| LookupError::Invalid { fact, key: key.into(), value };

    let port_binding_tunnel_key = sb.port_binding_tunnel_key(logical_port)?;
    if port_binding_tunnel_key == 0 {
        return Err(invalid(Fact::PortBindingTunnelKey, logical_port, "0".into()));
    }

    let datapath_uuid = sb.port_binding_datapath(logical_port)?;
    if datapath_uuid.trim().is_empty() {
        return Err(invalid(Fact::PortBindingDatapath, logical_port, datapath_uuid));
    }

    let datapath_tunnel_key = sb.datapath_binding_tunnel_key(&datapath_uuid)?;
    if datapath_tunnel_key == 0 {
        return Err(invalid(Fact::DatapathTunnelKey, &datapath_uuid, "0".into()));
    }

    let service_mac = sb.service_monitor_src_mac(logical_port)?.to_ascii_lowercase();
    if service_mac.trim().is_empty() {
        return Err(invalid(Fact::ServiceMonitorMac, logical_port, service_mac));
    }

    let ctx = OvnContext { port_binding_tunnel_key, datapath_uuid, datapath_tunnel_key, service_mac };
    event!(Level::DEBUG, "{logical_port}: resolved {ctx:?}");
    Ok(ctx)
}
