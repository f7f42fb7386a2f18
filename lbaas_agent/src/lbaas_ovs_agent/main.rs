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

//! `lbaas-ovs-agent` serves the LBaaS flow API for one Open vSwitch bridge.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use lbaas_agent::server::serve;
use lbaas_agent::{Args, FlowService, SbctlSouthbound};
use ovs::{Location, Ofctl, ProcessRunner, Sbctl};
use tokio::net::TcpListener;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{event, Level};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    log_panics::init();

    let args = Args::parse();
    let bind = args.bind.clone();
    let config = args.into_config().context("invalid configuration")?;

    let runner = Arc::new(ProcessRunner::new(config.command_timeout));
    let sbctl = Sbctl::new(runner.clone(), Location::from_container(&config.ovn_container));
    let ofctl = Ofctl::new(runner, Location::from_container(&config.ovs_container), config.of_version);
    event!(Level::INFO, "managing table {} priority {} on {} with {}",
           config.rule_class.table(), config.rule_class.priority(), config.bridge, ofctl.version());
    let service = Arc::new(FlowService::new(config, Box::new(SbctlSouthbound::new(sbctl)), Box::new(ofctl)));

    let listener = TcpListener::bind(&bind).await.with_context(|| format!("{bind}: bind failed"))?;
    event!(Level::INFO, "listening on {}", listener.local_addr()?);

    let mut sigterm = signal(SignalKind::terminate()).context("could not install SIGTERM handler")?;
    let shutdown = async move {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => (),
            _ = sigterm.recv() => (),
        }
        event!(Level::INFO, "shutting down");
    };
    serve(listener, service, shutdown).await.context("HTTP server failed")?;
    Ok(())
}
