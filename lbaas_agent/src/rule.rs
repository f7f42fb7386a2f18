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

//! Text form of the agent's flows, in `ovs-ofctl` syntax.
//!
//! Every flow the agent installs looks like this (on one line):
//!
//! ```text
//! cookie=0xabc123,table=36,priority=110,tcp,metadata=0x7,dl_dst=fa:16:3e:aa:bb:cc
//!     actions=set_field:0x2a->reg14,controller(userdata=00.00.00.12.00.00.00.00)
//! ```
//!
//! The table, priority, and `tcp` are the same for every flow and make up the [`RuleClass`].
//! The `userdata` marker in the `controller` action is what identifies a flow as one of ours;
//! nothing else that shares the table and priority carries it.
//!
//! `ovs-ofctl dump-flows` prints flows differently, with statistics mixed into the match, e.g.
//! ` cookie=0xabc123, duration=5.1s, table=36, n_packets=0, ..., priority=110,tcp,... actions=...`
//! so flows read back from a dump are compared token by token, not as whole strings.

use std::collections::HashSet;

use lazy_static::lazy_static;
use regex::Regex;

use crate::model::{Cookie, OvnContext};

/// The only protocol the agent's flows match.
pub const PROTOCOL: &str = "tcp";

/// The register that carries the destination port's tunnel key into the controller action.
pub const REGISTER: &str = "reg14";

lazy_static! {
    // `set_field` is how OpenFlow 1.2+ dumps show the write; `load` to the NXM name is the
    // OpenFlow 1.0 rendering of the same action.
    static ref REGISTER_WRITE_RE: Regex =
        Regex::new(r"(?:set_field:0x[0-9a-f]+->reg14\b|load:0x[0-9a-f]+->nxm_nx_reg14\[\])").unwrap();
}

/// The fixed part of every flow the agent manages.
#[derive(Clone, Debug)]
pub struct RuleClass {
    table: u8,
    priority: u16,
    userdata: String,
    controller_re: Regex,
}

impl RuleClass {
    /// `userdata` is the controller action's marker, as dot-separated hex bytes, e.g.
    /// `00.00.00.12.00.00.00.00`.  Returns `None` if it isn't in that form.
    pub fn new(table: u8, priority: u16, userdata: &str) -> Option<RuleClass> {
        lazy_static! {
            static ref USERDATA_RE: Regex = Regex::new("^[0-9a-f]{2}(\\.[0-9a-f]{2})*$").unwrap();
        }
        let userdata = userdata.trim().to_ascii_lowercase();
        if !USERDATA_RE.is_match(&userdata) {
            return None;
        }
        let controller_re = Regex::new(&format!(r"controller\([^)]*\buserdata={}[,)]",
                                                regex::escape(&userdata))).ok()?;
        Some(RuleClass { table, priority, userdata, controller_re })
    }

    pub fn table(&self) -> u8 {
        self.table
    }

    pub fn priority(&self) -> u16 {
        self.priority
    }

    pub fn userdata(&self) -> &str {
        &self.userdata
    }

    /// Renders the flow for `cookie` and `ctx`.  The field order is fixed, so equal inputs always
    /// produce identical text.
    pub fn build_rule(&self, cookie: Cookie, ctx: &OvnContext) -> String {
        format!("cookie={:#x},table={},priority={},{PROTOCOL},metadata={:#x},dl_dst={} \
                 actions=set_field:{:#x}->{REGISTER},controller(userdata={})",
                cookie.value(), self.table, self.priority, ctx.datapath_tunnel_key,
                ctx.service_mac, ctx.port_binding_tunnel_key, self.userdata)
    }

    /// The match tokens common to every flow in the class.
    pub fn class_tokens(&self) -> [String; 3] {
        [format!("table={}", self.table), format!("priority={}", self.priority), PROTOCOL.into()]
    }

    /// The match tokens of the flow that `ctx` yields: the class tokens plus `metadata` and
    /// `dl_dst`.
    pub fn match_tokens(&self, ctx: &OvnContext) -> [String; 5] {
        let [table, priority, protocol] = self.class_tokens();
        [table, priority, protocol,
         format!("metadata={:#x}", ctx.datapath_tunnel_key),
         format!("dl_dst={}", ctx.service_mac.to_ascii_lowercase())]
    }

    pub fn controller_action(&self) -> String {
        format!("controller(userdata={})", self.userdata)
    }

    /// Reports whether `line` writes a tunnel key to [`REGISTER`].
    pub fn has_register_write(&self, line: &str) -> bool {
        REGISTER_WRITE_RE.is_match(&line.to_ascii_lowercase())
    }

    /// Reports whether `line` has the controller action with this class's userdata marker.
    pub fn has_controller_action(&self, line: &str) -> bool {
        self.controller_re.is_match(&line.to_ascii_lowercase())
    }

    /// Reports whether `line` carries both of this class's actions.
    pub fn has_service_actions(&self, line: &str) -> bool {
        self.has_register_write(line) && self.has_controller_action(line)
    }
}

/// Returns the part of a flow line before `actions=`, which holds the cookie, statistics, and
/// match fields.
pub fn match_part(line: &str) -> &str {
    match line.find("actions=") {
        Some(i) => &line[..i],
        None => line,
    }
}

/// Splits the match part of `line` into lower-case tokens, e.g. `table=36`, `tcp`.  Dumps put
/// flow flags such as `send_flow_rem` before the match with only a space after them, so
/// whitespace separates tokens as well as commas.
pub fn line_tokens(line: &str) -> HashSet<String> {
    match_part(line)
        .split(|c: char| c == ',' || c.is_ascii_whitespace())
        .map(|t| t.to_ascii_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Reports whether the match part of `line` contains every token in `tokens`.
pub fn has_tokens<S: AsRef<str>>(line: &str, tokens: &[S]) -> bool {
    let found = line_tokens(line);
    tokens.iter().all(|t| found.contains(&t.as_ref().to_ascii_lowercase()))
}

/// Extracts the cookie from a flow line, either from `ovs-ofctl dump-flows` output or from
/// [`RuleClass::build_rule`].  Returns `None` if `line` has no `cookie=0x` field or its value
/// isn't a 64-bit hex number.
pub fn extract_cookie(line: &str) -> Option<Cookie> {
    // ASCII lowercasing keeps byte offsets unchanged.
    let lower = line.to_ascii_lowercase();
    let start = lower.find("cookie=0x")? + "cookie=0x".len();
    let digits: &str = {
        let rest = &lower[start..];
        let end = rest.find(|c: char| !c.is_ascii_hexdigit()).unwrap_or(rest.len());
        &rest[..end]
    };
    if digits.is_empty() || digits.len() > 16 {
        return None;
    }
    u64::from_str_radix(digits, 16).ok().map(Cookie)
}
