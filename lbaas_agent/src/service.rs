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

//! Inserting and deleting flows.

use std::sync::{Mutex, PoisonError};

use tracing::{event, Level};

use crate::config::AgentConfig;
use crate::conflict::check_conflicts;
use crate::delete::prepare_delete;
use crate::error::Error;
use crate::flow_table::FlowTable;
use crate::model::{validate_port_id, Cookie};
use crate::resolve::resolve;
use crate::southbound::Southbound;

/// A flow that [`FlowService::insert`] added.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstalledRule {
    pub cookie: Cookie,
    /// The flow text passed to `ovs-ofctl add-flow`.
    pub rule: String,
}

/// Adds and removes the agent's flows on one bridge.
///
/// Southbound lookups run concurrently.  The checks against the flow table and the change that
/// follows them run under a lock held for the bridge, so two requests can never both pass their
/// checks before either one changes the table.
pub struct FlowService {
    config: AgentConfig,
    southbound: Box<dyn Southbound>,
    flows: Box<dyn FlowTable>,
    bridge_lock: Mutex<()>,
}

impl FlowService {
    pub fn new(config: AgentConfig, southbound: Box<dyn Southbound>, flows: Box<dyn FlowTable>) -> FlowService {
        FlowService { config, southbound, flows, bridge_lock: Mutex::new(()) }
    }

    /// Adds the flow that redirects LBaaS health checks for `port_id` to the controller, under
    /// `cookie_text`.
    pub fn insert(&self, cookie_text: &str, port_id: &str) -> Result<InstalledRule, Error> {
        let cookie: Cookie = cookie_text.parse()?;
        validate_port_id(port_id)?;

        let ctx = resolve(&*self.southbound, port_id)?;
        let bridge = &self.config.bridge;
        let class = &self.config.rule_class;

        // Nothing can change the bridge's flows between the checks and add-flow.
        let _guard = self.bridge_lock.lock().unwrap_or_else(PoisonError::into_inner);
        check_conflicts(&*self.flows, bridge, class, cookie, &ctx)?;
        let rule = class.build_rule(cookie, &ctx);
        self.flows.add_flow(bridge, &rule)?;
        event!(Level::INFO, "{bridge}: installed flow {cookie} for port {port_id}");
        Ok(InstalledRule { cookie, rule })
    }

    /// Deletes the agent's flow with cookie `cookie_text`.
    pub fn delete(&self, cookie_text: &str) -> Result<Cookie, Error> {
        let bridge = &self.config.bridge;

        let _guard = self.bridge_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let request = prepare_delete(&*self.flows, bridge, &self.config.rule_class, cookie_text)?;
        event!(Level::DEBUG, "{bridge}: deleting {}", request.line);
        self.flows.del_flows_by_cookie(bridge, request.cookie)?;
        event!(Level::INFO, "{bridge}: deleted flow {}", request.cookie);
        Ok(request.cookie)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Conflict, ErrorKind};
    use crate::testutil::{context, FakeFlowTable, FakeSouthbound, PORT};
    use std::sync::Arc;
    use std::thread;
    use tracing_test::traced_test;

    fn service(table: FakeFlowTable) -> (FlowService, Arc<FakeFlowTable>) {
        let table = Arc::new(table);
        let sb = FakeSouthbound::with_port(PORT, &context());
        let service = FlowService::new(AgentConfig::default(), Box::new(sb), Box::new(table.clone()));
        (service, table)
    }

    #[test]
    #[traced_test]
    fn insert_then_delete() {
        let (service, table) = service(FakeFlowTable::default());
        let installed = service.insert("abc123", PORT).unwrap();
        assert_eq!(installed.cookie, Cookie(0xabc123));
        assert_eq!(installed.rule,
                   "cookie=0xabc123,table=36,priority=110,tcp,metadata=0x7,dl_dst=fa:16:3e:aa:bb:cc \
                    actions=set_field:0x2a->reg14,controller(userdata=00.00.00.12.00.00.00.00)");
        assert!(logs_contain("installed flow abc123"));

        assert_eq!(service.delete("abc123").unwrap(), Cookie(0xabc123));
        assert_eq!(table.calls(), [format!("add {}", installed.rule), "del abc123".to_string()]);
        assert!(table.flows.lock().unwrap().is_empty());
    }

    #[test]
    fn second_insert_conflicts() {
        let (service, table) = service(FakeFlowTable::default());
        service.insert("abc123", PORT).unwrap();

        let err = service.insert("abc123", PORT).unwrap_err();
        assert!(matches!(err, Error::Conflict(Conflict::CookieInUse(_))), "{err}");
        let err = service.insert("abc124", PORT).unwrap_err();
        assert!(matches!(err, Error::Conflict(Conflict::AlreadyInstalled(_))), "{err}");
        assert_eq!(table.calls().len(), 1);
    }

    #[test]
    fn validation_happens_before_lookups() {
        let (service, table) = service(FakeFlowTable::default());
        assert_eq!(service.insert("0xabc", PORT).unwrap_err().kind(), ErrorKind::Validation);
        assert_eq!(service.insert("abc", "lsp-123").unwrap_err().kind(), ErrorKind::Validation);
        let unknown = "00000000-0000-0000-0000-000000000000";
        assert_eq!(service.insert("abc", unknown).unwrap_err().kind(), ErrorKind::Resolution);
        assert!(table.calls().is_empty());
    }

    #[test]
    fn flow_table_failure_is_upstream() {
        let (service, _) = service(FakeFlowTable { fail: true, ..Default::default() });
        assert_eq!(service.insert("abc", PORT).unwrap_err().kind(), ErrorKind::Upstream);
        assert_eq!(service.delete("abc").unwrap_err().kind(), ErrorKind::Upstream);
    }

    #[test]
    fn concurrent_inserts_add_one_flow() {
        let (service, table) = service(FakeFlowTable::default());
        let service = Arc::new(service);
        let handles: Vec<_> = (1..=8u64)
            .map(|i| {
                let service = service.clone();
                thread::spawn(move || service.insert(&format!("{i:x}"), PORT).is_ok())
            })
            .collect();
        let successes = handles.into_iter().map(|h| h.join().unwrap()).filter(|ok| *ok).count();
        assert_eq!(successes, 1);
        assert_eq!(table.flows.lock().unwrap().len(), 1);
    }
}
