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

use std::sync::Arc;

use ovs::ofctl::cookie_filter;
use ovs::{CommandError, CommandRunner, Ofctl};

use crate::model::Cookie;

/// The switch's OpenFlow flow table, as the agent uses it.
///
/// Dumps are returned as `ovs-ofctl dump-flows` text.
pub trait FlowTable: Send + Sync {
    fn dump_flows(&self, bridge: &str) -> Result<String, CommandError>;

    /// Dumps only the flows whose cookie is exactly `cookie`.
    fn dump_flows_by_cookie(&self, bridge: &str, cookie: Cookie) -> Result<String, CommandError>;

    /// Adds `flow`, in `ovs-ofctl add-flow` syntax.
    fn add_flow(&self, bridge: &str, flow: &str) -> Result<(), CommandError>;

    /// Deletes every flow whose cookie is exactly `cookie`.
    fn del_flows_by_cookie(&self, bridge: &str, cookie: Cookie) -> Result<(), CommandError>;
}

impl<T: FlowTable + ?Sized> FlowTable for Arc<T> {
    fn dump_flows(&self, bridge: &str) -> Result<String, CommandError> {
        (**self).dump_flows(bridge)
    }

    fn dump_flows_by_cookie(&self, bridge: &str, cookie: Cookie) -> Result<String, CommandError> {
        (**self).dump_flows_by_cookie(bridge, cookie)
    }

    fn add_flow(&self, bridge: &str, flow: &str) -> Result<(), CommandError> {
        (**self).add_flow(bridge, flow)
    }

    fn del_flows_by_cookie(&self, bridge: &str, cookie: Cookie) -> Result<(), CommandError> {
        (**self).del_flows_by_cookie(bridge, cookie)
    }
}

impl<R: CommandRunner> FlowTable for Ofctl<R> {
    fn dump_flows(&self, bridge: &str) -> Result<String, CommandError> {
        Ofctl::dump_flows(self, bridge)
    }

    fn dump_flows_by_cookie(&self, bridge: &str, cookie: Cookie) -> Result<String, CommandError> {
        self.dump_flows_filtered(bridge, &cookie_filter(cookie.value()))
    }

    fn add_flow(&self, bridge: &str, flow: &str) -> Result<(), CommandError> {
        Ofctl::add_flow(self, bridge, flow)
    }

    fn del_flows_by_cookie(&self, bridge: &str, cookie: Cookie) -> Result<(), CommandError> {
        self.del_flows(bridge, &cookie_filter(cookie.value()))
    }
}
