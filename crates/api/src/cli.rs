//! Command-line options using clap derive macros.

use std::fmt;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use alerting::{PipelineConfig, DEFAULT_TOPIC};
use clap::{Parser, ValueHint};
use event_publisher::KafkaConfig;

/// Default HTTP listen port
pub const DEFAULT_PORT: u16 = 8086;

/// Alertpusher - forwards alert-manager notifications to Kafka
#[derive(Debug, Parser)]
#[command(name = "alertpusher", about, long_about = None, disable_version_flag = true)]
pub struct Cli {
    /// Kafka brokers (host[:port], comma separated or repeated)
    #[arg(
        short = 'k',
        long = "kafka-hosts",
        value_delimiter = ',',
        env = "ALERTPUSHER_KAFKA_HOSTS"
    )]
    pub kafka_hosts: Vec<String>,

    /// Kafka topic for the alerts
    #[arg(short = 't', long, default_value = DEFAULT_TOPIC, env = "ALERTPUSHER_TOPIC")]
    pub topic: String,

    /// Kafka partition
    #[arg(long, default_value_t = 0, env = "ALERTPUSHER_PARTITION")]
    pub partition: i32,

    /// Web server listen port
    #[arg(short = 'p', long, default_value_t = DEFAULT_PORT, env = "ALERTPUSHER_PORT")]
    pub port: u16,

    /// Debug level
    #[arg(short = 'd', long, default_value_t = 0)]
    pub debug: u8,

    /// Directory for log files, all log goes to stderr if unset
    #[arg(long = "log", value_name = "DIR", value_hint = ValueHint::DirPath)]
    pub log_dir: Option<PathBuf>,

    /// Prints version and build date
    #[arg(short = 'v', long)]
    pub version: bool,

    /// Skips messages for resolved alerts
    #[arg(short = 's', long)]
    pub skip_resolved: bool,
}

impl Cli {
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            topic: self.topic.clone(),
            partition: self.partition,
            skip_resolved: self.skip_resolved,
        }
    }

    pub fn kafka_config(&self) -> KafkaConfig {
        KafkaConfig::new(self.kafka_hosts.clone())
    }

    /// Listen on every interface
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port))
    }
}

/// Build metadata embedded at compile time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildInfo {
    pub revision: &'static str,
    pub branch: &'static str,
    pub build: &'static str,
}

impl BuildInfo {
    pub fn current() -> Self {
        Self {
            revision: env!("ALERTPUSHER_REVISION"),
            branch: env!("ALERTPUSHER_BRANCH"),
            build: env!("ALERTPUSHER_BUILD"),
        }
    }
}

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Revision:{} Branch:{} Build:{}",
            self.revision, self.branch, self.build
        )
    }
}
