//! CLI argument parsing
//!
//! Every flag is optional; with none given the generator emits the
//! built-in three-flow traffic every two seconds until interrupted.

use clap::Parser;
use mplsgen_core::{EmitterConfig, Error, Flow, Result};
use mplsgen_packet::local_label_for_prefix;
use std::net::Ipv4Addr;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "mpls-packet-gen")]
#[command(
    version,
    about = "Send MPLS-over-UDP encapsulated ICMP echo requests at a fixed cadence",
    long_about = None
)]
pub struct Cli {
    /// Outer IPv4 source, the encapsulating node [default: 192.168.57.30]
    #[arg(long, value_name = "ADDR")]
    pub outer_src: Option<Ipv4Addr>,

    /// Outer IPv4 destination, the decapsulating node [default: 192.168.57.10]
    #[arg(long, value_name = "ADDR")]
    pub outer_dst: Option<Ipv4Addr>,

    /// Inner IPv4 destination of the echo requests [default: 1.1.1.1]
    #[arg(long, value_name = "ADDR")]
    pub inner_dst: Option<Ipv4Addr>,

    /// Outer UDP destination port [default: 6635]
    #[arg(long, value_name = "PORT")]
    pub dst_port: Option<u16>,

    /// Flow as INNER_SRC:UDP_SRC_PORT, repeat for several flows
    /// [default: 100.64.0.1:5001 100.64.0.2:5002 100.64.0.3:5003]
    #[arg(short = 'f', long = "flow", value_name = "ADDR:PORT")]
    pub flows: Vec<Flow>,

    /// MPLS label [default: 1004051]
    #[arg(short = 'l', long, conflicts_with = "label_from_prefix")]
    pub label: Option<u32>,

    /// Derive the MPLS label from a VRF prefix (1000000 + last four digits)
    #[arg(long, value_name = "CIDR")]
    pub label_from_prefix: Option<String>,

    /// MPLS TTL [default: 64]
    #[arg(long, value_name = "TTL")]
    pub mpls_ttl: Option<u8>,

    /// ICMP payload as text [default: 123456789012345678901234567890]
    #[arg(long, value_name = "TEXT")]
    pub payload: Option<String>,

    /// Pause between cycles in milliseconds
    #[arg(short = 'i', long, value_name = "MS", default_value = "2000")]
    pub interval_ms: u64,

    /// Stop after this many cycles (0 = run until interrupted)
    #[arg(short = 'c', long, value_name = "CYCLES", default_value = "0")]
    pub count: u64,

    /// Stop after this many seconds (0 = no timeout)
    #[arg(short = 't', long, value_name = "SECONDS", default_value = "0")]
    pub timeout: u64,

    /// Trace packets without opening a raw socket
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Verbose output (-v, -vv, -vvv for increasing verbosity)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Overlay the given flags on the default configuration and validate it
    pub fn to_config(&self) -> Result<EmitterConfig> {
        let mut config = EmitterConfig::default();

        if let Some(addr) = self.outer_src {
            config.outer_source = addr;
        }
        if let Some(addr) = self.outer_dst {
            config.outer_destination = addr;
        }
        if let Some(addr) = self.inner_dst {
            config.inner_destination = addr;
        }
        if let Some(port) = self.dst_port {
            config.destination_port = port;
        }
        if !self.flows.is_empty() {
            config.flows = self.flows.clone();
        }

        match (&self.label_from_prefix, self.label) {
            (Some(prefix), _) => config.label = local_label_for_prefix(prefix)?,
            (None, Some(label)) => config.label = label,
            (None, None) => {}
        }

        if let Some(ttl) = self.mpls_ttl {
            config.mpls_ttl = ttl;
        }
        if let Some(ref payload) = self.payload {
            config.payload = payload.as_bytes().to_vec();
        }

        if self.interval_ms == 0 {
            return Err(Error::invalid_parameter("interval-ms", "must be positive"));
        }
        config.interval = Duration::from_millis(self.interval_ms);
        config.max_cycles = (self.count > 0).then_some(self.count);

        config.validate()?;
        Ok(config)
    }

    /// Timeout, if one was requested
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout > 0).then(|| Duration::from_secs(self.timeout))
    }

    /// Default log level for the verbosity count
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["mpls-packet-gen"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_no_flags_is_default_config() {
        let cli = parse(&[]);
        assert_eq!(cli.to_config().unwrap(), EmitterConfig::default());
        assert!(cli.timeout().is_none());
        assert!(!cli.dry_run);
    }

    #[test]
    fn test_overrides() {
        let cli = parse(&[
            "--outer-src",
            "10.0.0.1",
            "--outer-dst",
            "10.0.0.2",
            "--inner-dst",
            "8.8.8.8",
            "--dst-port",
            "7000",
            "-f",
            "172.16.0.1:6001",
            "-f",
            "172.16.0.2:6002",
            "--label",
            "16",
            "--mpls-ttl",
            "5",
            "--payload",
            "hello",
            "-i",
            "500",
            "-c",
            "4",
        ]);
        let config = cli.to_config().unwrap();

        assert_eq!(config.outer_source, Ipv4Addr::new(10, 0, 0, 1));
        assert_eq!(config.outer_destination, Ipv4Addr::new(10, 0, 0, 2));
        assert_eq!(config.inner_destination, Ipv4Addr::new(8, 8, 8, 8));
        assert_eq!(config.destination_port, 7000);
        assert_eq!(
            config.flows,
            vec![
                Flow::new(Ipv4Addr::new(172, 16, 0, 1), 6001),
                Flow::new(Ipv4Addr::new(172, 16, 0, 2), 6002),
            ]
        );
        assert_eq!(config.label, 16);
        assert_eq!(config.mpls_ttl, 5);
        assert_eq!(config.payload, b"hello");
        assert_eq!(config.interval, Duration::from_millis(500));
        assert_eq!(config.max_cycles, Some(4));
    }

    #[test]
    fn test_label_from_prefix() {
        let cli = parse(&["--label-from-prefix", "10.66.40.51/32"]);
        assert_eq!(cli.to_config().unwrap().label, 1_004_051);

        let cli = parse(&["--label-from-prefix", "10.66.40.51"]);
        assert!(cli.to_config().is_err());
    }

    #[test]
    fn test_label_conflicts_with_prefix() {
        let result = Cli::try_parse_from([
            "mpls-packet-gen",
            "--label",
            "16",
            "--label-from-prefix",
            "1.2.3.4/24",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_values() {
        assert!(parse(&["--label", "1048576"]).to_config().is_err());
        assert!(parse(&["-i", "0"]).to_config().is_err());
        assert!(Cli::try_parse_from(["mpls-packet-gen", "-f", "100.64.0.1"]).is_err());
        assert!(Cli::try_parse_from(["mpls-packet-gen", "--outer-dst", "bogus"]).is_err());
    }

    #[test]
    fn test_timeout_and_verbosity() {
        let cli = parse(&["-t", "30", "-vv"]);
        assert_eq!(cli.timeout(), Some(Duration::from_secs(30)));
        assert_eq!(cli.log_level(), "trace");
        assert_eq!(parse(&[]).log_level(), "info");
    }
}
