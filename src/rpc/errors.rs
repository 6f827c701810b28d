use solana_client::client_error::ClientError;
use solana_sdk::transaction::TransactionError;
use thiserror::Error;

/// Failures talking to the ledger node
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RpcError {
    /// Transport-level errors (network, connection)
    #[error("Transport error: {message} (endpoint: {endpoint})")]
    Transport { endpoint: String, message: String },

    #[error("Timeout after {timeout_ms}ms (endpoint: {endpoint})")]
    Timeout { endpoint: String, timeout_ms: u64 },

    /// Error object returned by the node
    #[error("RPC response error: {message} (endpoint: {endpoint}, code: {code:?})")]
    RpcResponse {
        endpoint: String,
        message: String,
        code: Option<i64>,
    },

    #[error("Rate limit exceeded (endpoint: {endpoint})")]
    RateLimitExceeded { endpoint: String },

    #[error("Blockhash not found (endpoint: {endpoint})")]
    BlockhashNotFound { endpoint: String },

    #[error("Insufficient funds (endpoint: {endpoint})")]
    InsufficientFunds { endpoint: String },

    /// Preflight simulation or execution rejected the transaction
    #[error("Transaction rejected: {error} (endpoint: {endpoint})")]
    TransactionRejected {
        endpoint: String,
        error: TransactionError,
    },

    #[error("Malformed response: {0}")]
    InvalidResponse(String),
}

impl RpcError {
    /// Whether repeating the same read could succeed
    ///
    /// The client never repeats a submission on its own; this only guides
    /// callers deciding what to do next.
    pub fn is_retryable(&self) -> bool {
        match self {
            RpcError::Transport { .. } => true,
            RpcError::Timeout { .. } => true,
            RpcError::RateLimitExceeded { .. } => true,
            RpcError::BlockhashNotFound { .. } => true,

            RpcError::InsufficientFunds { .. } => false,
            RpcError::TransactionRejected { .. } => false,
            RpcError::InvalidResponse(_) => false,

            // Retry on server errors (5xx)
            RpcError::RpcResponse { code, .. } => matches!(code, Some(c) if (500..600).contains(c)),
        }
    }

    /// Whether a failed submission may still have reached the cluster
    pub fn delivery_uncertain(&self) -> bool {
        matches!(self, RpcError::Transport { .. } | RpcError::Timeout { .. })
    }

    pub fn category(&self) -> &'static str {
        match self {
            RpcError::Transport { .. } => "transport",
            RpcError::Timeout { .. } => "timeout",
            RpcError::RpcResponse { .. } => "rpc_response",
            RpcError::RateLimitExceeded { .. } => "rate_limit",
            RpcError::BlockhashNotFound { .. } => "blockhash_not_found",
            RpcError::InsufficientFunds { .. } => "insufficient_funds",
            RpcError::TransactionRejected { .. } => "transaction_rejected",
            RpcError::InvalidResponse(_) => "invalid_response",
        }
    }

    pub fn endpoint(&self) -> Option<&str> {
        match self {
            RpcError::Transport { endpoint, .. }
            | RpcError::Timeout { endpoint, .. }
            | RpcError::RpcResponse { endpoint, .. }
            | RpcError::RateLimitExceeded { endpoint }
            | RpcError::BlockhashNotFound { endpoint }
            | RpcError::InsufficientFunds { endpoint }
            | RpcError::TransactionRejected { endpoint, .. } => Some(endpoint),
            RpcError::InvalidResponse(_) => None,
        }
    }

    /// The ledger's verdict on a rejected transaction, if that is what this is
    pub fn transaction_error(&self) -> Option<&TransactionError> {
        match self {
            RpcError::TransactionRejected { error, .. } => Some(error),
            _ => None,
        }
    }

    /// Classify a client error
    pub fn from_client_error(err: ClientError, endpoint: &str) -> Self {
        if let Some(error) = err.get_transaction_error() {
            return RpcError::TransactionRejected {
                endpoint: endpoint.to_string(),
                error,
            };
        }
        Self::from_message(&err.to_string(), endpoint)
    }

    /// Classify based on the error message
    pub(crate) fn from_message(message: &str, endpoint: &str) -> Self {
        let lower = message.to_lowercase();
        let endpoint = endpoint.to_string();

        if lower.contains("blockhash not found") {
            RpcError::BlockhashNotFound { endpoint }
        } else if lower.contains("insufficient funds") || lower.contains("insufficient lamports") {
            RpcError::InsufficientFunds { endpoint }
        } else if lower.contains("rate limit") || lower.contains("too many requests") || lower.contains("429") {
            RpcError::RateLimitExceeded { endpoint }
        } else if lower.contains("timeout") || lower.contains("timed out") {
            RpcError::Timeout {
                endpoint,
                timeout_ms: 0,
            }
        } else if lower.contains("connection") || lower.contains("dns error") || lower.contains("error sending request") {
            RpcError::Transport {
                endpoint,
                message: message.to_string(),
            }
        } else {
            let code = lower
                .split("code:")
                .nth(1)
                .and_then(|s| s.split_whitespace().next())
                .and_then(|s| s.trim_end_matches(|c: char| !c.is_ascii_digit()).parse::<i64>().ok());

            RpcError::RpcResponse {
                endpoint,
                message: message.to_string(),
                code,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::instruction::InstructionError;

    #[test]
    fn test_error_is_retryable() {
        assert!(RpcError::Transport {
            endpoint: "test".to_string(),
            message: "connection failed".to_string(),
        }
        .is_retryable());

        assert!(RpcError::Timeout {
            endpoint: "test".to_string(),
            timeout_ms: 5000,
        }
        .is_retryable());

        assert!(!RpcError::TransactionRejected {
            endpoint: "test".to_string(),
            error: TransactionError::InstructionError(0, InstructionError::Custom(6006)),
        }
        .is_retryable());

        assert!(RpcError::RpcResponse {
            endpoint: "test".to_string(),
            message: "bad gateway".to_string(),
            code: Some(502),
        }
        .is_retryable());
        assert!(!RpcError::InvalidResponse("x".to_string()).is_retryable());
    }

    #[test]
    fn test_classification_by_message() {
        let ep = "http://localhost:8899";
        assert!(matches!(
            RpcError::from_message("Blockhash not found", ep),
            RpcError::BlockhashNotFound { .. }
        ));
        assert!(matches!(
            RpcError::from_message("HTTP status client error (429 Too Many Requests)", ep),
            RpcError::RateLimitExceeded { .. }
        ));
        assert!(matches!(
            RpcError::from_message("operation timed out", ep),
            RpcError::Timeout { .. }
        ));
        assert!(matches!(
            RpcError::from_message("error sending request for url", ep),
            RpcError::Transport { .. }
        ));
        match RpcError::from_message("RPC response error code: -32002 something", ep) {
            RpcError::RpcResponse { code, .. } => assert_eq!(code, Some(-32002)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_delivery_uncertain() {
        let timeout = RpcError::Timeout {
            endpoint: "e".to_string(),
            timeout_ms: 1,
        };
        assert!(timeout.delivery_uncertain());
        assert_eq!(timeout.category(), "timeout");
        assert_eq!(timeout.endpoint(), Some("e"));
        assert!(!RpcError::BlockhashNotFound {
            endpoint: "e".to_string()
        }
        .delivery_uncertain());
    }
}
