//! Error types for the MPLS-over-UDP packet generator

use std::net::Ipv4Addr;
use thiserror::Error;

/// Result type alias for generator operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the packet generator
#[derive(Error, Debug)]
pub enum Error {
    /// Local I/O error (trace output, socket setup)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid parameter error
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    /// Packet construction error
    #[error("Packet construction error: {0}")]
    PacketConstruction(String),

    /// Packet parsing error
    #[error("Packet parsing error: {0}")]
    PacketParsing(String),

    /// Raw socket could not be opened
    #[error("Transport error: {0}")]
    Transport(String),

    /// Insufficient privileges
    #[error("Insufficient privileges: {0}")]
    InsufficientPrivileges(String),

    /// A packet was handed to the network stack and rejected
    #[error("Transmission of flow {flow} to {destination} failed: {source}")]
    Transmission {
        flow: usize,
        destination: Ipv4Addr,
        #[source]
        source: std::io::Error,
    },

    /// Emitter task ended abnormally
    #[error("Emitter task failed: {0}")]
    Task(String),
}

impl Error {
    /// Create an invalid parameter error
    pub fn invalid_parameter<N: Into<String>, R: Into<String>>(name: N, reason: R) -> Self {
        Error::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create a packet parsing error with a custom message
    pub fn parsing<S: Into<String>>(msg: S) -> Self {
        Error::PacketParsing(msg.into())
    }

    /// Create a packet construction error with a custom message
    pub fn construction<S: Into<String>>(msg: S) -> Self {
        Error::PacketConstruction(msg.into())
    }

    /// Whether this error came from handing a packet to the network stack
    pub fn is_transmission(&self) -> bool {
        matches!(self, Error::Transmission { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_parameter_message() {
        let err = Error::invalid_parameter("label", "exceeds 20 bits");
        assert_eq!(
            err.to_string(),
            "Invalid parameter 'label': exceeds 20 bits"
        );
    }

    #[test]
    fn test_transmission_error() {
        let err = Error::Transmission {
            flow: 2,
            destination: Ipv4Addr::new(192, 168, 57, 10),
            source: std::io::Error::new(std::io::ErrorKind::Other, "network is down"),
        };

        assert!(err.is_transmission());
        assert_eq!(
            err.to_string(),
            "Transmission of flow 2 to 192.168.57.10 failed: network is down"
        );
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(!err.is_transmission());
    }
}
