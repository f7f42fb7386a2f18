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

//! Checks made before a flow is deleted.
//!
//! Deletion is by cookie, so the agent must be sure that the cookie names exactly one flow and
//! that the flow is one of its own.  A foreign flow that happens to carry the same cookie is
//! never deleted.

use ovs::ofctl::flow_lines;

use crate::error::{Conflict, Error};
use crate::flow_table::FlowTable;
use crate::model::Cookie;
use crate::rule::{has_tokens, RuleClass, REGISTER};

/// A deletion that has passed every check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeletionRequest {
    pub cookie: Cookie,
    /// The flow to be deleted, as dumped.
    pub line: String,
}

/// Validates the flow named by `cookie_text` in `bridge` for deletion.
pub fn prepare_delete<F: FlowTable + ?Sized>(flows: &F, bridge: &str, class: &RuleClass,
                                              cookie_text: &str) -> Result<DeletionRequest, Error> {
    let cookie: Cookie = cookie_text.parse()?;
    let dump = flows.dump_flows_by_cookie(bridge, cookie)?;
    let line = match flow_lines(&dump).as_slice() {
        [] => return Err(Error::FlowNotFound(cookie)),
        [line] => line.to_string(),
        lines => return Err(Conflict::Ambiguous { cookie, count: lines.len() }.into()),
    };
    if let Some(missing) = missing_parts(class, &line) {
        return Err(Conflict::NotOurs { cookie, missing }.into());
    }
    Ok(DeletionRequest { cookie, line })
}

/// Names the first thing `line` lacks to be a flow of `class`, or `None` if it lacks nothing.
fn missing_parts(class: &RuleClass, line: &str) -> Option<String> {
    if let Some(token) = class.class_tokens().into_iter().find(|t| !has_tokens(line, &[t])) {
        return Some(token);
    }
    if !class.has_register_write(line) {
        return Some(format!("set_field->{REGISTER}"));
    }
    if !class.has_controller_action(line) {
        return Some(class.controller_action());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{context, dump_line, FakeFlowTable};

    fn class() -> RuleClass {
        RuleClass::new(36, 110, "00.00.00.12.00.00.00.00").unwrap()
    }

    fn ours(cookie: u64) -> String {
        dump_line(&class().build_rule(Cookie(cookie), &context()))
    }

    #[test]
    fn single_own_flow_is_deletable() {
        let table = FakeFlowTable::with_flows([ours(0xabc123), ours(0x1)]);
        let req = prepare_delete(&table, "br-int", &class(), "ABC123").unwrap();
        assert_eq!(req.cookie, Cookie(0xabc123));
        assert_eq!(req.line, ours(0xabc123).trim());
        assert!(table.calls().is_empty());
    }

    #[test]
    fn flagged_own_flow_is_deletable() {
        let line = " cookie=0xabc123, duration=2s, table=36, n_packets=0, n_bytes=0, \
                    send_flow_rem check_overlap priority=110,tcp,metadata=0x7,dl_dst=fa:16:3e:aa:bb:cc \
                    actions=set_field:0x2a->reg14,controller(userdata=00.00.00.12.00.00.00.00)";
        let table = FakeFlowTable::with_flows([line]);
        assert_eq!(prepare_delete(&table, "br-int", &class(), "abc123").unwrap().cookie, Cookie(0xabc123));
    }

    #[test]
    fn bad_cookie_is_validation_error() {
        let table = FakeFlowTable::default();
        assert!(matches!(prepare_delete(&table, "br-int", &class(), "0xabc"), Err(Error::InvalidCookie(_))));
        assert!(matches!(prepare_delete(&table, "br-int", &class(), "xyz"), Err(Error::InvalidCookie(_))));
    }

    #[test]
    fn zero_lines_is_not_found() {
        let table = FakeFlowTable::with_flows([ours(0x1)]);
        assert!(matches!(prepare_delete(&table, "br-int", &class(), "abc123"),
                         Err(Error::FlowNotFound(Cookie(0xabc123)))));
    }

    #[test]
    fn two_lines_is_ambiguous() {
        let table = FakeFlowTable::with_flows([ours(0xabc123), ours(0xabc123)]);
        match prepare_delete(&table, "br-int", &class(), "abc123") {
            Err(Error::Conflict(Conflict::Ambiguous { cookie, count })) => {
                assert_eq!(cookie, Cookie(0xabc123));
                assert_eq!(count, 2);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn foreign_flow_is_refused() {
        let cases = [
            (" cookie=0xabc123, table=36, priority=110,tcp actions=drop", "set_field->reg14"),
            (" cookie=0xabc123, table=0, priority=110,tcp \
             actions=set_field:0x2a->reg14,controller(userdata=00.00.00.12.00.00.00.00)", "table=36"),
            (" cookie=0xabc123, table=36, priority=110,udp \
             actions=set_field:0x2a->reg14,controller(userdata=00.00.00.12.00.00.00.00)", "tcp"),
            (" cookie=0xabc123, table=36, priority=110,tcp actions=set_field:0x2a->reg14,output:1",
             "controller(userdata=00.00.00.12.00.00.00.00)"),
        ];
        for (line, expected) in cases {
            let table = FakeFlowTable::with_flows([line]);
            match prepare_delete(&table, "br-int", &class(), "abc123") {
                Err(Error::Conflict(Conflict::NotOurs { missing, .. })) => assert_eq!(missing, expected),
                other => panic!("{line}: unexpected {other:?}"),
            }
            assert!(table.calls().is_empty());
        }
    }
}
