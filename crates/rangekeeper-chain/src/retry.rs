//! Bounded-retry wrapper for idempotent RPC reads, and a deadline-bound
//! transaction confirmation helper.

use std::future::Future;
use std::time::Duration;

use alloy::primitives::{TxHash, U256};
use alloy::providers::Provider;
use tracing::warn;

use crate::error::{ChainError, Result};

/// Retries `op` up to `max_retries` times with linear backoff
/// (`1000ms * attempt`). Surfaces the last error once exhausted.
pub async fn with_retry<T, F, Fut>(mut op: F, max_retries: u32) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt >= max_retries => {
                return Err(ChainError::RetryExhausted {
                    attempts: attempt,
                    source: Box::new(e),
                });
            }
            Err(e) => {
                warn!(attempt, error = %e, "rpc call failed, retrying");
                tokio::time::sleep(Duration::from_millis(1000 * attempt as u64)).await;
            }
        }
    }
}

/// Races a transaction receipt against a deadline. A timeout does NOT imply
/// the transaction failed to land — callers must not assume finality either
/// way and should treat this as a hard pipeline abort.
pub async fn wait_for_confirmation<P: Provider>(
    provider: &P,
    tx_hash: TxHash,
    timeout_ms: u64,
) -> Result<U256> {
    let fut = async {
        loop {
            if let Ok(Some(receipt)) = provider.get_transaction_receipt(tx_hash).await {
                return Ok(U256::from(receipt.block_number.unwrap_or_default()));
            }
            tokio::time::sleep(Duration::from_millis(500)).await;
        }
    };

    match tokio::time::timeout(Duration::from_millis(timeout_ms), fut).await {
        Ok(result) => result,
        Err(_) => Err(ChainError::TxTimeout { timeout_ms }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn with_retry_succeeds_on_second_attempt() {
        let attempts = AtomicU32::new(0);
        let result: Result<u32> = with_retry(
            || async {
                let n = attempts.fetch_add(1, Ordering::SeqCst);
                if n == 0 {
                    Err(ChainError::Provider("transient".to_string()))
                } else {
                    Ok(42)
                }
            },
            3,
        )
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn with_retry_exhausts_after_max_attempts() {
        let attempts = AtomicU32::new(0);
        let result: Result<u32> = with_retry(
            || async {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(ChainError::Provider("always fails".to_string()))
            },
            3,
        )
        .await;
        assert!(matches!(result, Err(ChainError::RetryExhausted { attempts: 3, .. })));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }
}
