//! Probe strategies

use scalebench_config::{LoadConfig, ProbeConfig};
use scalebench_core::EndpointDescriptor;
use scalebench_execution::{ExternalTool, LoadTool, ToolInvocation};
use scalebench_http::{ColdStartProbe, ColdStartSettings, LoadGenerator, LoadSettings};
use std::time::Duration;

use crate::error::DriverError;

/// Tool name that selects the in-process generator
pub const INTERNAL_TOOL: &str = "default";

/// Which kind of traffic a session drives
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeStrategy {
    /// Single retrying request, ends at the first answer
    ColdStart(ColdStartSettings),
    /// In-process fixed-rate generator
    SustainedInternal(LoadSettings),
    /// External load tool named by `tool`
    SustainedExternal { tool: String, settings: LoadSettings },
}

impl ProbeStrategy {
    pub fn cold_start(config: &ProbeConfig) -> Self {
        ProbeStrategy::ColdStart(ColdStartSettings::from(config))
    }

    pub fn sustained(config: &LoadConfig) -> Self {
        let settings = LoadSettings::from(config);
        if config.tool == INTERNAL_TOOL {
            ProbeStrategy::SustainedInternal(settings)
        } else {
            ProbeStrategy::SustainedExternal {
                tool: config.tool.clone(),
                settings,
            }
        }
    }

    pub fn is_cold_start(&self) -> bool {
        matches!(self, ProbeStrategy::ColdStart(_))
    }
}

/// What a finished probe reports back to its session
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeOutcome {
    pub output: String,
    /// Time the first answer took, cold-start probes only
    pub answered_after: Option<Duration>,
}

/// A probe strategy ready to run, built once per session
#[derive(Debug, Clone)]
pub enum ProbeDriver {
    ColdStart(ColdStartProbe),
    Internal(LoadGenerator),
    External { tool: ExternalTool, settings: LoadSettings },
}

impl ProbeDriver {
    /// Build the driver for a strategy.
    ///
    /// Fails for unsupported tool names and when the HTTP client cannot be
    /// built.
    pub fn new(strategy: &ProbeStrategy) -> Result<Self, DriverError> {
        Ok(match strategy {
            ProbeStrategy::ColdStart(settings) => ProbeDriver::ColdStart(ColdStartProbe::new(settings)?),
            ProbeStrategy::SustainedInternal(settings) => ProbeDriver::Internal(LoadGenerator::new(settings.clone())?),
            ProbeStrategy::SustainedExternal { tool, settings } => {
                let tool: LoadTool = tool.parse()?;
                ProbeDriver::External {
                    tool: ExternalTool::new(tool),
                    settings: settings.clone(),
                }
            }
        })
    }

    /// Use a prepared external tool, e.g. one with a specific binary
    pub fn external(tool: ExternalTool, settings: LoadSettings) -> Self {
        ProbeDriver::External { tool, settings }
    }

    pub async fn run(&self, endpoint: &EndpointDescriptor) -> Result<ProbeOutcome, DriverError> {
        match self {
            ProbeDriver::ColdStart(probe) => {
                let answer = probe.run(endpoint).await?;
                Ok(ProbeOutcome {
                    output: format!(
                        "Answered with status {} after {} attempt(s) in {:.1?}",
                        answer.status, answer.attempts, answer.elapsed
                    ),
                    answered_after: Some(answer.elapsed),
                })
            }
            ProbeDriver::Internal(generator) => {
                let report = generator.run(endpoint).await;
                Ok(ProbeOutcome {
                    output: report.summary(),
                    answered_after: None,
                })
            }
            ProbeDriver::External { tool, settings } => {
                let invocation = ToolInvocation {
                    address: endpoint.address.clone(),
                    host_header: endpoint.host_header.clone(),
                    rate: settings.rate,
                    workers: settings.workers,
                    duration: settings.duration,
                };
                let output = tool.run(&invocation).await?;
                Ok(ProbeOutcome {
                    output,
                    answered_after: None,
                })
            }
        }
    }
}
