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

//! Agent configuration.
//!
//! [`Args`] is the command-line (and environment) surface.  [`Args::into_config`] validates it
//! into an [`AgentConfig`], which is immutable from then on and handed to every component that
//! needs it.

use std::time::Duration;

use clap::Parser;
use ovs::Version;
use thiserror::Error;

use crate::rule::RuleClass;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("bridge name must not be empty")]
    EmptyBridge,

    #[error("invalid userdata marker {0:?} (expected dot-separated hex bytes, e.g. 00.00.00.12.00.00.00.00)")]
    BadUserdata(String),

    #[error("table 255 is reserved for \"all tables\"")]
    ReservedTable,

    #[error("command timeout must be at least one second")]
    ZeroTimeout,
}

#[derive(Clone, Debug, Parser, PartialEq, Eq)]
#[clap(version, about)]
pub struct Args {
    /// Address to listen on for HTTP requests
    #[clap(long, env = "LBAAS_AGENT_BIND", default_value = "0.0.0.0:9406")]
    pub bind: String,

    /// Integration bridge that receives the flows
    #[clap(long, default_value = "br-int")]
    pub bridge: String,

    /// OpenFlow version passed to ovs-ofctl -O
    #[clap(long, default_value = "OpenFlow15")]
    pub of_version: Version,

    /// OpenFlow table for LBaaS flows
    #[clap(long, default_value = "36")]
    pub table: u8,

    /// Priority of LBaaS flows
    #[clap(long, default_value = "110")]
    pub priority: u16,

    /// Userdata marker in the controller action that identifies LBaaS flows
    #[clap(long, default_value = "00.00.00.12.00.00.00.00")]
    pub userdata: String,

    /// Container that has ovs-ofctl (empty to run it on the host)
    #[clap(long, env = "OVS_CONTAINER", default_value = "openvswitch_vswitchd")]
    pub ovs_container: String,

    /// Container that has ovn-sbctl (empty to run it on the host)
    #[clap(long, env = "OVN_CONTAINER", default_value = "ovn_sb_db")]
    pub ovn_container: String,

    /// Seconds to wait for each ovs-ofctl or ovn-sbctl command
    #[clap(long, default_value = "10")]
    pub command_timeout: u64,
}

impl Args {
    pub fn into_config(self) -> Result<AgentConfig, ConfigError> {
        let bridge = self.bridge.trim().to_string();
        if bridge.is_empty() {
            return Err(ConfigError::EmptyBridge);
        }
        if self.table == u8::MAX {
            return Err(ConfigError::ReservedTable);
        }
        if self.command_timeout == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        let rule_class = RuleClass::new(self.table, self.priority, &self.userdata)
            .ok_or(ConfigError::BadUserdata(self.userdata))?;
        Ok(AgentConfig {
            bridge,
            of_version: self.of_version,
            rule_class,
            ovs_container: self.ovs_container,
            ovn_container: self.ovn_container,
            command_timeout: Duration::from_secs(self.command_timeout),
        })
    }
}

/// Validated agent configuration.
#[derive(Clone, Debug)]
pub struct AgentConfig {
    pub bridge: String,
    pub of_version: Version,
    pub rule_class: RuleClass,
    pub ovs_container: String,
    pub ovn_container: String,
    pub command_timeout: Duration,
}

impl Default for AgentConfig {
    /// The values used in a Kolla-Ansible deployment.
    fn default() -> Self {
        AgentConfig {
            bridge: "br-int".into(),
            of_version: Version::OFP15,
            rule_class: default_rule_class(),
            ovs_container: "openvswitch_vswitchd".into(),
            ovn_container: "ovn_sb_db".into(),
            command_timeout: Duration::from_secs(10),
        }
    }
}

fn default_rule_class() -> RuleClass {
    match RuleClass::new(36, 110, "00.00.00.12.00.00.00.00") {
        Some(class) => class,
        None => unreachable!("default userdata marker is well formed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("lbaas-ovs-agent").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults_match_default_config() {
        let config = parse(&[]).into_config().unwrap();
        let default = AgentConfig::default();
        assert_eq!(config.bridge, default.bridge);
        assert_eq!(config.of_version, default.of_version);
        assert_eq!(config.rule_class.table(), 36);
        assert_eq!(config.rule_class.priority(), 110);
        assert_eq!(config.rule_class.userdata(), "00.00.00.12.00.00.00.00");
        assert_eq!(config.command_timeout, default.command_timeout);
    }

    #[test]
    fn overrides() {
        let config = parse(&["--bridge", "br-test", "--of-version", "OpenFlow13", "--table", "40",
                             "--priority", "200", "--userdata", "AB.CD", "--ovs-container", "",
                             "--command-timeout", "3"])
            .into_config()
            .unwrap();
        assert_eq!(config.bridge, "br-test");
        assert_eq!(config.of_version, Version::OFP13);
        assert_eq!(config.rule_class.table(), 40);
        assert_eq!(config.rule_class.priority(), 200);
        assert_eq!(config.rule_class.userdata(), "ab.cd");
        assert_eq!(config.ovs_container, "");
        assert_eq!(config.command_timeout, Duration::from_secs(3));
    }

    #[test]
    fn rejects_bad_values() {
        assert_eq!(parse(&["--bridge", " "]).into_config().unwrap_err(), ConfigError::EmptyBridge);
        assert_eq!(parse(&["--table", "255"]).into_config().unwrap_err(), ConfigError::ReservedTable);
        assert_eq!(parse(&["--command-timeout", "0"]).into_config().unwrap_err(), ConfigError::ZeroTimeout);
        assert!(matches!(parse(&["--userdata", "zz"]).into_config(), Err(ConfigError::BadUserdata(_))));
        assert!(Args::try_parse_from(["lbaas-ovs-agent", "--of-version", "OpenFlow9"]).is_err());
    }
}
