use std::{fmt, str::FromStr};

use k8s_openapi::api::core::v1::ContainerPort;
use snafu::{OptionExt, ResultExt};

use super::error::{
    Error, InvalidPortFormatSnafu, InvalidPortSnafu, UnknownProtocolSnafu, ZeroContainerPortSnafu,
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Protocol {
    Tcp,
    Udp,
}

impl Protocol {
    /// Spelling accepted after the `/` of a port entry.
    const SUFFIXES: [(&'static str, Self); 4] =
        [("/tcp", Self::Tcp), ("/TCP", Self::Tcp), ("/udp", Self::Udp), ("/UDP", Self::Udp)];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tcp => "TCP",
            Self::Udp => "UDP",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// A `hostPort:containerPort/proto` entry.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PortBinding {
    /// `0` leaves the container port unpublished on the host.
    pub host_port: u16,

    pub container_port: u16,

    pub protocol: Protocol,
}

impl PortBinding {
    #[must_use]
    pub fn to_container_port(&self) -> ContainerPort {
        let Self { host_port, container_port, protocol } = *self;
        ContainerPort {
            container_port: i32::from(container_port),
            host_port: (host_port != 0).then(|| i32::from(host_port)),
            protocol: Some(protocol.to_string()),
            ..ContainerPort::default()
        }
    }
}

impl FromStr for PortBinding {
    type Err = Error;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let (ports, protocol) = Protocol::SUFFIXES
            .iter()
            .find_map(|(suffix, protocol)| input.strip_suffix(suffix).map(|rest| (rest, *protocol)))
            .context(UnknownProtocolSnafu { input })?;

        let (host_port, container_port) = ports
            .split_once(':')
            .filter(|(_, container_port)| !container_port.contains(':'))
            .context(InvalidPortFormatSnafu { input })?;

        let host_port = host_port.parse::<u16>().context(InvalidPortSnafu { value: host_port })?;
        let container_port =
            container_port.parse::<u16>().context(InvalidPortSnafu { value: container_port })?;
        if container_port == 0 {
            return ZeroContainerPortSnafu { input }.fail();
        }

        Ok(Self { host_port, container_port, protocol })
    }
}

/// Translates the port entries of a container, skipping malformed ones.
#[must_use]
pub fn container_ports(entries: &[String]) -> Vec<ContainerPort> {
    entries
        .iter()
        .filter_map(|entry| match entry.parse::<PortBinding>() {
            Ok(binding) => Some(binding.to_container_port()),
            Err(err) => {
                tracing::warn!("Skipping port: {err}");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ports(entries: &[&str]) -> Vec<ContainerPort> {
        container_ports(&entries.iter().map(ToString::to_string).collect::<Vec<_>>())
    }

    #[test]
    fn test_tcp_port() {
        assert_eq!(
            ports(&["8080:80/tcp"]),
            vec![ContainerPort {
                container_port: 80,
                host_port: Some(8080),
                protocol: Some("TCP".to_string()),
                ..ContainerPort::default()
            }]
        );
    }

    #[test]
    fn test_udp_port() {
        let binding = "53:53/udp".parse::<PortBinding>().expect("valid udp port");
        assert_eq!(binding, PortBinding { host_port: 53, container_port: 53, protocol: Protocol::Udp });
        assert_eq!(ports(&["53:53/UDP"])[0].protocol.as_deref(), Some("UDP"));
    }

    #[test]
    fn test_unpublished_host_port() {
        assert_eq!(ports(&["0:80/TCP"])[0].host_port, None);
    }

    #[test]
    fn test_invalid_ports_are_skipped() {
        assert!(ports(&["not-a-port"]).is_empty());
        assert!(ports(&["8080:80", "8080:80/sctp", "80/tcp", "a:80/tcp", "1:2:3/tcp"]).is_empty());
        assert_eq!(ports(&["bogus", "8080:80/tcp"]).len(), 1);
    }

    #[test]
    fn test_errors() {
        assert!(matches!("8080:80".parse::<PortBinding>(), Err(Error::UnknownProtocol { .. })));
        assert!(matches!("80/tcp".parse::<PortBinding>(), Err(Error::InvalidPortFormat { .. })));
        assert!(matches!("x:80/tcp".parse::<PortBinding>(), Err(Error::InvalidPort { .. })));
        assert!(matches!("70000:80/tcp".parse::<PortBinding>(), Err(Error::InvalidPort { .. })));
        assert!(matches!("80:0/tcp".parse::<PortBinding>(), Err(Error::ZeroContainerPort { .. })));
    }
}
