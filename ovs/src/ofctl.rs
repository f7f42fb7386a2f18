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

//! Flow table access through `ovs-ofctl`.

use super::ofp_protocol::Version;
use super::run::{CommandError, CommandRunner, Location};

use tracing::{event, Level};

const OVS_OFCTL: &str = "ovs-ofctl";

/// Returns the `ovs-ofctl` match that selects exactly the flows whose cookie is `cookie`, e.g.
/// `cookie=0xabc123/-1`.  The `-1` mask makes every cookie bit significant.
pub fn cookie_filter(cookie: u64) -> String {
    format!("cookie={:#x}/-1", cookie)
}

/// Splits `ovs-ofctl dump-flows` output into flow lines, trimming whitespace.  Drops blank lines
/// and the `OFPST_FLOW reply` header, which are the only lines that don't carry a cookie.
pub fn flow_lines(dump: &str) -> Vec<&str> {
    dump.lines()
        .map(str::trim)
        .filter(|line| line.contains("cookie="))
        .collect()
}

/// Issues `ovs-ofctl` commands for one OpenFlow version.
#[derive(Clone, Debug)]
pub struct Ofctl<R> {
    runner: R,
    location: Location,
    version: Version,
}

impl<R: CommandRunner> Ofctl<R> {
    pub fn new(runner: R, location: Location, version: Version) -> Ofctl<R> {
        Ofctl { runner, location, version }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn version(&self) -> Version {
        self.version
    }

    fn argv(&self, subcommand: &str, args: &[&str]) -> Vec<String> {
        let mut tail = vec!["-O", self.version.name(), subcommand];
        tail.extend_from_slice(args);
        self.location.argv(OVS_OFCTL, tail)
    }

    /// The command line that adds `flow` to `bridge`.  The flow text is passed as a single
    /// argument, never through a shell.
    pub fn add_flow_argv(&self, bridge: &str, flow: &str) -> Vec<String> {
        self.argv("add-flow", &[bridge, flow])
    }

    /// Dumps every flow in `bridge`.
    pub fn dump_flows(&self, bridge: &str) -> Result<String, CommandError> {
        self.runner.run(&self.argv("dump-flows", &[bridge]))
    }

    /// Dumps the flows in `bridge` that match `filter`, e.g. a [`cookie_filter`].
    pub fn dump_flows_filtered(&self, bridge: &str, filter: &str) -> Result<String, CommandError> {
        self.runner.run(&self.argv("dump-flows", &[bridge, filter]))
    }

    pub fn add_flow(&self, bridge: &str, flow: &str) -> Result<(), CommandError> {
        event!(Level::INFO, "{bridge}: add-flow {flow}");
        self.runner.run(&self.add_flow_argv(bridge, flow)).map(drop)
    }

    /// Deletes the flows in `bridge` that match `filter`.
    pub fn del_flows(&self, bridge: &str, filter: &str) -> Result<(), CommandError> {
        event!(Level::INFO, "{bridge}: del-flows {filter}");
        self.runner.run(&self.argv("del-flows", &[bridge, filter])).map(drop)
    }
}
