//! CLI argument parsing definitions

use clap::{Args, Parser, Subcommand};
use scalebench_config::{BenchConfig, ClusterConfig};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "scalebench", author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Set the log level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a fleet of workloads at a paced rate
    Generate {
        #[command(flatten)]
        target: TargetArgs,

        /// Number of workloads to create
        #[arg(long, value_name = "N")]
        count: Option<usize>,

        /// Workloads admitted per interval
        #[arg(long, value_name = "N")]
        batch_size: Option<usize>,

        /// Seconds between batches
        #[arg(long, value_name = "SECS")]
        interval: Option<u64>,

        /// Concurrent creation workers
        #[arg(long, value_name = "N")]
        concurrency: Option<usize>,

        /// Container image of the generated workloads
        #[arg(long, value_name = "IMAGE")]
        image: Option<String>,

        #[arg(long, value_name = "N")]
        min_scale: Option<u32>,

        #[arg(long, value_name = "N")]
        max_scale: Option<u32>,

        /// Wait for every workload to become ready
        #[arg(long)]
        wait_ready: bool,
    },

    /// Delete the generated workloads
    Clean {
        #[command(flatten)]
        target: TargetArgs,

        /// Concurrent delete workers
        #[arg(long, value_name = "N", default_value = "10")]
        concurrency: usize,

        /// Delete the target namespaces as well
        #[arg(long)]
        delete_namespaces: bool,
    },

    /// Measure scale-from-zero of every workload
    Scale {
        #[command(flatten)]
        target: TargetArgs,

        #[command(flatten)]
        measure: MeasureArgs,

        /// Cold-start request retries before giving up
        #[arg(long, value_name = "N")]
        max_retries: Option<u32>,

        /// Milliseconds between cold-start requests
        #[arg(long, value_name = "MILLIS")]
        request_interval: Option<u64>,

        /// Overall cold-start budget in seconds
        #[arg(long, value_name = "SECS")]
        request_timeout: Option<u64>,
    },

    /// Measure scaling under sustained load
    Load {
        #[command(flatten)]
        target: TargetArgs,

        #[command(flatten)]
        measure: MeasureArgs,

        /// Load tool: default, hey, wrk
        #[arg(long, value_name = "TOOL")]
        tool: Option<String>,

        /// Requests per second across all workers
        #[arg(long, value_name = "RPS")]
        rate: Option<u32>,

        #[arg(long, value_name = "N")]
        workers: Option<usize>,

        /// Load duration in seconds
        #[arg(long, value_name = "SECS")]
        duration: Option<u64>,
    },

    /// Configuration management commands
    Config {
        #[command(subcommand)]
        config_cmd: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print a sample configuration file
    Sample,

    /// Validate a configuration file
    Validate {
        /// Path to the configuration file
        #[arg(long, value_name = "PATH")]
        config_file: PathBuf,
    },

    /// Show the configuration in use
    Show,
}

/// Which namespaces and workloads a command targets
#[derive(Args, Debug, Default)]
pub struct TargetArgs {
    /// Single target namespace
    #[arg(long, value_name = "NAME")]
    pub namespace: Option<String>,

    /// Prefix of numbered target namespaces
    #[arg(long, value_name = "PREFIX")]
    pub namespace_prefix: Option<String>,

    /// Namespace index range, e.g. 1,10
    #[arg(long, value_name = "START,END")]
    pub namespace_range: Option<String>,

    /// Workload name prefix
    #[arg(long, value_name = "PREFIX")]
    pub service_prefix: Option<String>,
}

impl TargetArgs {
    pub fn apply(&self, cluster: &mut ClusterConfig) {
        if let Some(ns) = &self.namespace {
            cluster.namespace = Some(ns.clone());
        }
        if let Some(prefix) = &self.namespace_prefix {
            cluster.namespace_prefix = Some(prefix.clone());
        }
        if let Some(range) = &self.namespace_range {
            cluster.namespace_range = Some(range.clone());
        }
        if let Some(prefix) = &self.service_prefix {
            cluster.service_prefix = prefix.clone();
        }
    }
}

/// Flags shared by the measuring commands
#[derive(Args, Debug, Default)]
pub struct MeasureArgs {
    /// Use workload URLs directly instead of the ingress node port
    #[arg(long)]
    pub resolvable_domain: bool,

    /// Sessions measured at once
    #[arg(long, value_name = "N")]
    pub concurrency: Option<usize>,
}

impl Commands {
    /// Fold command flags into the loaded configuration
    pub fn apply_overrides(&self, config: &mut BenchConfig) {
        match self {
            Commands::Generate {
                target,
                count,
                batch_size,
                interval,
                concurrency,
                image,
                min_scale,
                max_scale,
                wait_ready,
            } => {
                target.apply(&mut config.cluster);
                let generate = &mut config.generate;
                set(&mut generate.count, *count);
                set(&mut generate.batch_size, *batch_size);
                set(&mut generate.interval, interval.map(Duration::from_secs));
                set(&mut generate.concurrency, *concurrency);
                set(&mut generate.image, image.clone());
                set(&mut generate.min_scale, *min_scale);
                set(&mut generate.max_scale, *max_scale);
                generate.wait_ready |= *wait_ready;
            }
            Commands::Clean { target, .. } => target.apply(&mut config.cluster),
            Commands::Scale {
                target,
                measure,
                max_retries,
                request_interval,
                request_timeout,
            } => {
                target.apply(&mut config.cluster);
                config.cluster.resolvable_domain |= measure.resolvable_domain;
                let probe = &mut config.probe;
                set(&mut probe.concurrency, measure.concurrency);
                set(&mut probe.max_retries, *max_retries);
                set(&mut probe.request_interval, request_interval.map(Duration::from_millis));
                set(&mut probe.request_timeout, request_timeout.map(Duration::from_secs));
            }
            Commands::Load {
                target,
                measure,
                tool,
                rate,
                workers,
                duration,
            } => {
                target.apply(&mut config.cluster);
                config.cluster.resolvable_domain |= measure.resolvable_domain;
                let load = &mut config.load;
                set(&mut load.concurrency, measure.concurrency);
                set(&mut load.tool, tool.clone());
                set(&mut load.rate, *rate);
                set(&mut load.workers, *workers);
                set(&mut load.duration, duration.map(Duration::from_secs));
            }
            Commands::Config { .. } => {}
        }
    }
}

fn set<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}
