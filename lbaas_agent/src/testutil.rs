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

//! Fakes for the [`Southbound`] and [`FlowTable`] ports.

use std::collections::HashMap;
use std::sync::Mutex;

use ovs::CommandError;

use crate::error::{Fact, LookupError};
use crate::flow_table::FlowTable;
use crate::model::{Cookie, OvnContext};
use crate::rule::extract_cookie;
use crate::southbound::Southbound;

pub const PORT: &str = "3f2a0c3e-9b1d-4c55-8e2a-0d9f1b7c6a10";
pub const DATAPATH: &str = "0b5e5f0a-3c1d-4f8e-9a7b-2c6d8e0f1a2b";

pub fn context() -> OvnContext {
    OvnContext {
        port_binding_tunnel_key: 42,
        datapath_uuid: DATAPATH.into(),
        datapath_tunnel_key: 7,
        service_mac: "fa:16:3e:aa:bb:cc".into(),
    }
}

/// In-memory southbound database.  Records every query as `"<fact> <key>"`.
#[derive(Default)]
pub struct FakeSouthbound {
    pub port_keys: HashMap<String, u32>,
    pub port_datapaths: HashMap<String, String>,
    pub datapath_keys: HashMap<String, u64>,
    pub macs: HashMap<String, String>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeSouthbound {
    /// A database that knows about one port, whose facts are those of `ctx`.
    pub fn with_port(port: &str, ctx: &OvnContext) -> FakeSouthbound {
        let mut sb = FakeSouthbound::default();
        sb.port_keys.insert(port.into(), ctx.port_binding_tunnel_key);
        sb.port_datapaths.insert(port.into(), ctx.datapath_uuid.clone());
        sb.datapath_keys.insert(ctx.datapath_uuid.clone(), ctx.datapath_tunnel_key);
        sb.macs.insert(port.into(), ctx.service_mac.clone());
        sb
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn get<T: Clone>(&self, map: &HashMap<String, T>, fact: Fact, key: &str) -> Result<T, LookupError> {
        self.calls.lock().unwrap().push(format!("{fact} {key}"));
        map.get(key).cloned().ok_or_else(|| LookupError::NotFound { fact, key: key.into() })
    }
}

impl Southbound for FakeSouthbound {
    fn port_binding_tunnel_key(&self, logical_port: &str) -> Result<u32, LookupError> {
        self.get(&self.port_keys, Fact::PortBindingTunnelKey, logical_port)
    }

    fn port_binding_datapath(&self, logical_port: &str) -> Result<String, LookupError> {
        self.get(&self.port_datapaths, Fact::PortBindingDatapath, logical_port)
    }

    fn datapath_binding_tunnel_key(&self, datapath: &str) -> Result<u64, LookupError> {
        self.get(&self.datapath_keys, Fact::DatapathTunnelKey, datapath)
    }

    fn service_monitor_src_mac(&self, logical_port: &str) -> Result<String, LookupError> {
        self.get(&self.macs, Fact::ServiceMonitorMac, logical_port)
    }
}

/// Rewrites a flow in `add-flow` syntax the way `ovs-ofctl dump-flows` prints it, with
/// statistics between the cookie and the table and between the table and the rest of the match.
pub fn dump_line(flow: &str) -> String {
    let mut fields = flow.splitn(3, ',');
    let cookie = fields.next().unwrap_or_default();
    let table = fields.next().unwrap_or_default();
    let rest = fields.next().unwrap_or_default();
    format!(" {cookie}, duration=3.141s, {table}, n_packets=0, n_bytes=0, idle_age=3, {rest}")
}

/// In-memory flow table.  Records every mutation as `"add <flow>"` or `"del <cookie>"`.
#[derive(Default)]
pub struct FakeFlowTable {
    pub flows: Mutex<Vec<String>>,
    pub calls: Mutex<Vec<String>>,
    /// When set, every command fails.
    pub fail: bool,
}

impl FakeFlowTable {
    /// A table that already holds `flows`, given in dump syntax.
    pub fn with_flows<S: Into<String>>(flows: impl IntoIterator<Item = S>) -> FakeFlowTable {
        FakeFlowTable { flows: Mutex::new(flows.into_iter().map(Into::into).collect()), ..Default::default() }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn check(&self) -> Result<(), CommandError> {
        if self.fail {
            Err(CommandError::Empty)
        } else {
            Ok(())
        }
    }

    fn dump(lines: impl Iterator<Item = String>) -> String {
        let mut out = String::from("OFPST_FLOW reply (OF1.5) (xid=0x2):\n");
        for line in lines {
            out.push_str(&line);
            out.push('\n');
        }
        out
    }
}

impl FlowTable for FakeFlowTable {
    fn dump_flows(&self, _bridge: &str) -> Result<String, CommandError> {
        self.check()?;
        Ok(Self::dump(self.flows.lock().unwrap().iter().cloned()))
    }

    fn dump_flows_by_cookie(&self, _bridge: &str, cookie: Cookie) -> Result<String, CommandError> {
        self.check()?;
        let flows = self.flows.lock().unwrap();
        Ok(Self::dump(flows.iter().filter(|f| extract_cookie(f) == Some(cookie)).cloned()))
    }

    fn add_flow(&self, _bridge: &str, flow: &str) -> Result<(), CommandError> {
        self.check()?;
        self.calls.lock().unwrap().push(format!("add {flow}"));
        self.flows.lock().unwrap().push(dump_line(flow));
        Ok(())
    }

    fn del_flows_by_cookie(&self, _bridge: &str, cookie: Cookie) -> Result<(), CommandError> {
        self.check()?;
        self.calls.lock().unwrap().push(format!("del {cookie}"));
        self.flows.lock().unwrap().retain(|f| extract_cookie(f) != Some(cookie));
        Ok(())
    }
}
