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

//! `lbaas_agent` installs and removes the OpenFlow flows that send an OVN load balancer's
//! health checks for a bare-metal port to the controller.
//!
//! A request names a flow cookie and a Neutron port.  The agent looks up the port's tunnel key,
//! datapath, and service MAC in the OVN southbound database ([`resolve`]), renders the flow
//! ([`rule`]), makes sure it doesn't collide with anything already on the bridge ([`conflict`]),
//! and adds it with `ovs-ofctl`.  Deletion checks that the cookie names exactly one flow and that
//! the flow is one of the agent's own ([`delete`]).

pub mod config;
pub mod conflict;
pub mod delete;
pub mod error;
pub mod flow_table;
pub mod model;
pub mod resolve;
pub mod rule;
pub mod server;
pub mod service;
pub mod southbound;

#[cfg(test)]
mod testutil;

pub use config::{AgentConfig, Args, ConfigError};
pub use error::{Conflict, Error, ErrorKind, Fact, LookupError};
pub use flow_table::FlowTable;
pub use model::{Cookie, OvnContext};
pub use rule::RuleClass;
pub use service::{FlowService, InstalledRule};
pub use southbound::{SbctlSouthbound, Southbound};
