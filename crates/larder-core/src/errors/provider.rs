// ABOUTME: Error taxonomy for external nutrition data sources
// ABOUTME: Distinguishes network, auth, quota, and malformed-response failures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Larder Culinary Intelligence

use thiserror::Error;

use super::{AppError, ErrorCode};

/// Failure raised by an outbound nutrition data source.
///
/// The nutrition aggregator never propagates these; every variant is treated as
/// "this tier produced nothing". The variants exist so logs and callers of the
/// raw client can tell the failure modes apart.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Transport failure (DNS, connect, timeout, body read)
    #[error("network error talking to {provider}: {message}")]
    Network {
        /// Provider name
        provider: String,
        /// Transport error detail
        message: String,
    },

    /// Credentials missing or rejected
    #[error("{provider} rejected credentials: {message}")]
    Authentication {
        /// Provider name
        provider: String,
        /// Detail returned by the provider
        message: String,
    },

    /// Provider quota or rate limit exhausted
    #[error("{provider} quota exceeded (retry after {retry_after_secs:?}s)")]
    QuotaExceeded {
        /// Provider name
        provider: String,
        /// Seconds until retry is allowed, when the provider says
        retry_after_secs: Option<u64>,
    },

    /// Response body did not match the expected shape
    #[error("{provider} returned a malformed response: {message}")]
    MalformedResponse {
        /// Provider name
        provider: String,
        /// Parse error detail
        message: String,
    },

    /// Non-success status not covered above
    #[error("{provider} API error {status}: {message}")]
    Api {
        /// Provider name
        provider: String,
        /// HTTP status code
        status: u16,
        /// Error body excerpt
        message: String,
    },

    /// Provider is not configured (no credentials)
    #[error("{0} is not configured")]
    NotConfigured(String),
}

impl ProviderError {
    /// Whether retrying the same request later could succeed
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Network { .. } | Self::QuotaExceeded { .. } => true,
            Self::Api { status, .. } => *status >= 500,
            Self::Authentication { .. } | Self::MalformedResponse { .. } | Self::NotConfigured(_) => {
                false
            }
        }
    }
}

impl From<ProviderError> for AppError {
    fn from(error: ProviderError) -> Self {
        let code = match &error {
            ProviderError::Network { .. } => ErrorCode::ExternalServiceUnavailable,
            ProviderError::Authentication { .. } => ErrorCode::ExternalAuthFailed,
            ProviderError::QuotaExceeded { .. } => ErrorCode::ExternalRateLimited,
            ProviderError::MalformedResponse { .. } | ProviderError::Api { .. } => {
                ErrorCode::ExternalServiceError
            }
            ProviderError::NotConfigured(_) => ErrorCode::ConfigError,
        };
        Self::new(code, error.to_string()).with_source(error)
    }
}

#[cfg(feature = "provider-errors")]
impl ProviderError {
    /// Classify a reqwest transport error for the named provider
    #[must_use]
    pub fn from_reqwest(provider: &str, error: &reqwest::Error) -> Self {
        if error.is_decode() {
            return Self::MalformedResponse {
                provider: provider.to_owned(),
                message: error.to_string(),
            };
        }
        Self::Network {
            provider: provider.to_owned(),
            message: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_maps_to_rate_limited() {
        let error: AppError = ProviderError::QuotaExceeded {
            provider: "nutritionix".into(),
            retry_after_secs: Some(30),
        }
        .into();
        assert_eq!(error.code, ErrorCode::ExternalRateLimited);
        assert_eq!(error.http_status(), 429);
    }

    #[test]
    fn test_transient_classification() {
        assert!(ProviderError::Network {
            provider: "x".into(),
            message: "reset".into()
        }
        .is_transient());
        assert!(!ProviderError::NotConfigured("x".into()).is_transient());
        assert!(ProviderError::Api {
            provider: "x".into(),
            status: 503,
            message: String::new()
        }
        .is_transient());
    }
}
