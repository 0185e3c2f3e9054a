use std::{fmt, time::Duration};

use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("Desired pod has no name"))]
    MissingPodName,

    #[snafu(display("Pod {pod_name} did not become ready within {timeout:?}"))]
    Timeout { pod_name: String, timeout: Duration },

    #[snafu(display("Reconciliation of pod {pod_name} was cancelled"))]
    Cancelled { pod_name: String },

    #[snafu(display("Reconciliation of pod {pod_name} failed, error: {source}"))]
    Rejected {
        pod_name: String,
        #[snafu(source(from(ClientError, Box::new)))]
        source: Box<ClientError>,
    },
}

/// Cluster operation issued by the reconciler.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Operation {
    CreatePod,
    DeletePod,
    EnsureSecret,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreatePod => f.write_str("create pod"),
            Self::DeletePod => f.write_str("delete pod"),
            Self::EnsureSecret => f.write_str("ensure secret"),
        }
    }
}

/// Failure of a single cluster operation.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ClientError {
    #[snafu(display("Failed to {operation} {name}, status {code}: {message}"))]
    Api { operation: Operation, name: String, code: u16, message: String },

    #[snafu(display("Failed to {operation} {name}, error: {source}"))]
    Transport {
        operation: Operation,
        name: String,
        #[snafu(source(from(kube::Error, Box::new)))]
        source: Box<kube::Error>,
    },
}

impl ClientError {
    /// Wraps a `kube` error, keeping the status of API rejections.
    #[must_use]
    pub fn from_kube(operation: Operation, name: &str, error: kube::Error) -> Self {
        match error {
            kube::Error::Api(response) => Self::Api {
                operation,
                name: name.to_string(),
                code: response.code,
                message: response.message.clone(),
            },
            source => Self::Transport { operation, name: name.to_string(), source: Box::new(source) },
        }
    }

    /// Client errors other than not-found, conflict and throttling are
    /// permanent; everything else may succeed on a later pass.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Api { code, .. } => !matches!(code, 400..=499) || matches!(code, 404 | 409 | 429),
            Self::Transport { .. } => true,
        }
    }

    #[must_use]
    pub const fn code(&self) -> Option<u16> {
        match self {
            Self::Api { code, .. } => Some(*code),
            Self::Transport { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_error(code: u16) -> ClientError {
        ClientError::Api {
            operation: Operation::CreatePod,
            name: "web-abcdef12".to_string(),
            code,
            message: "invalid".to_string(),
        }
    }

    #[test]
    fn test_is_retryable() {
        for code in [404, 409, 429, 500, 503] {
            assert!(api_error(code).is_retryable(), "{code} should be retryable");
        }
        for code in [400, 401, 403, 422] {
            assert!(!api_error(code).is_retryable(), "{code} should be permanent");
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(api_error(422).to_string(), "Failed to create pod web-abcdef12, status 422: invalid");
        assert_eq!(api_error(422).code(), Some(422));
    }
}
