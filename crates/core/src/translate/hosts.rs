use std::str::FromStr;

use k8s_openapi::api::core::v1::HostAlias;
use snafu::OptionExt;

use super::error::{Error, InvalidExtraHostSnafu};

/// A `hostname:ip` entry. Everything after the first `:` is the address, so
/// IPv6 addresses need no brackets.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ExtraHost {
    pub hostname: String,

    pub ip: String,
}

impl FromStr for ExtraHost {
    type Err = Error;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let (hostname, ip) = input.split_once(':').context(InvalidExtraHostSnafu { input })?;
        Ok(Self { hostname: hostname.to_string(), ip: ip.to_string() })
    }
}

impl From<ExtraHost> for HostAlias {
    fn from(ExtraHost { hostname, ip }: ExtraHost) -> Self {
        Self { hostnames: Some(vec![hostname]), ip, ..Self::default() }
    }
}

/// Host aliases for the extra-host entries, skipping malformed ones.
#[must_use]
pub fn host_aliases(entries: &[String]) -> Vec<HostAlias> {
    entries
        .iter()
        .filter_map(|entry| match entry.parse::<ExtraHost>() {
            Ok(host) => Some(HostAlias::from(host)),
            Err(err) => {
                tracing::debug!("Skipping extra host: {err}");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_aliases() {
        let aliases = host_aliases(&[
            "db:10.0.0.5".to_string(),
            "broken".to_string(),
            "v6:fd00::1".to_string(),
        ]);
        assert_eq!(aliases.len(), 2);
        assert_eq!(aliases[0].hostnames, Some(vec!["db".to_string()]));
        assert_eq!(aliases[0].ip, "10.0.0.5");
        assert_eq!(aliases[1].ip, "fd00::1");
    }

    #[test]
    fn test_invalid_extra_host() {
        assert!(matches!("nohost".parse::<ExtraHost>(), Err(Error::InvalidExtraHost { .. })));
    }
}
