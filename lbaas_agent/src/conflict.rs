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

//! Checks made against the live flow table before a flow is added.

use ovs::ofctl::flow_lines;
use tracing::{event, Level};

use crate::error::{Conflict, Error};
use crate::flow_table::FlowTable;
use crate::model::{Cookie, OvnContext};
use crate::rule::{extract_cookie, has_tokens, RuleClass};

/// Fails if any flow in `bridge` already carries `cookie`, whatever its match and actions.
pub fn check_cookie<F: FlowTable + ?Sized>(flows: &F, bridge: &str, cookie: Cookie) -> Result<(), Error> {
    let dump = flows.dump_flows_by_cookie(bridge, cookie)?;
    if flow_lines(&dump).is_empty() {
        Ok(())
    } else {
        Err(Conflict::CookieInUse(cookie).into())
    }
}

/// Checks a full flow dump for flows with the match that `ctx` yields.
///
/// A matching flow with the class's actions means the flow is already installed, under the
/// cookies reported in [`Conflict::AlreadyInstalled`].  Matching flows without them belong to
/// someone else and are reported as [`Conflict::ForeignRule`].
pub fn check_match(dump: &str, class: &RuleClass, ctx: &OvnContext) -> Result<(), Conflict> {
    let tokens = class.match_tokens(ctx);
    let (mut ours, mut foreign) = (Vec::new(), Vec::new());
    let (mut found_ours, mut found_foreign) = (false, false);
    for line in dump.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if !has_tokens(line, &tokens) {
            continue;
        }
        let cookies = if class.has_service_actions(line) {
            found_ours = true;
            &mut ours
        } else {
            found_foreign = true;
            &mut foreign
        };
        match extract_cookie(line) {
            Some(cookie) => cookies.push(cookie),
            None => event!(Level::WARN, "flow without cookie has the same match: {line}"),
        }
    }
    if found_ours {
        ours.extend(foreign);
        Err(Conflict::AlreadyInstalled(ours))
    } else if found_foreign {
        Err(Conflict::ForeignRule(foreign))
    } else {
        Ok(())
    }
}

/// Runs both checks needed before adding the flow for `cookie` and `ctx` to `bridge`: first the
/// cookie, then the match.
pub fn check_conflicts<F: FlowTable + ?Sized>(flows: &F, bridge: &str, class: &RuleClass,
                                               cookie: Cookie, ctx: &OvnContext) -> Result<(), Error> {
    check_cookie(flows, bridge, cookie)?;
    let dump = flows.dump_flows(bridge)?;
    check_match(&dump, class, ctx)?;
    Ok(())
}
