//! Operator wallet: a signer that can be rebuilt against a new provider
//! after the connection supervisor rotates endpoints.

use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::Signer as AlloySigner;
use zeroize::Zeroizing;

use crate::error::{ChainError, Result};
use crate::nonce::NonceManager;

/// Where the operator's secret key comes from.
pub enum KeySource {
    EnvVar { var_name: String },
    File { path: String },
}

impl KeySource {
    fn load_raw(&self) -> Result<Zeroizing<String>> {
        let raw = match self {
            KeySource::EnvVar { var_name } => std::env::var(var_name)
                .map_err(|_| ChainError::Signer(format!("env var {var_name} not set")))?,
            KeySource::File { path } => std::fs::read_to_string(path)
                .map_err(|e| ChainError::Signer(format!("reading {path}: {e}")))?,
        };
        Ok(Zeroizing::new(raw.trim().to_string()))
    }
}

/// Wraps the signing key and exposes the derived address. Rebuilding for a
/// new provider is just constructing a fresh `Wallet` with the same key —
/// alloy signers are not bound to a provider, only the nonce tracking is.
pub struct Wallet {
    signer: PrivateKeySigner,
    pub nonce_manager: NonceManager,
}

impl Wallet {
    /// Loads the private key from `source`, deriving (and, if `expected`
    /// is set, verifying) the wallet address.
    pub fn load(source: KeySource, expected: Option<Address>, starting_nonce: u64) -> Result<Self> {
        let raw = source.load_raw()?;
        let hex_str = raw.trim_start_matches("0x");
        let bytes = Zeroizing::new(
            hex::decode(hex_str).map_err(|e| ChainError::Signer(format!("invalid hex key: {e}")))?,
        );
        let signer = PrivateKeySigner::from_slice(&bytes)
            .map_err(|e| ChainError::Signer(format!("invalid private key: {e}")))?;

        if let Some(expected_addr) = expected {
            if signer.address() != expected_addr {
                return Err(ChainError::Signer(format!(
                    "derived address {} does not match expected {expected_addr}",
                    signer.address()
                )));
            }
        }

        Ok(Self {
            signer,
            nonce_manager: NonceManager::new(starting_nonce),
        })
    }

    #[must_use]
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    #[must_use]
    pub fn signer(&self) -> &PrivateKeySigner {
        &self.signer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_rejects_malformed_hex() {
        std::env::set_var("RK_TEST_KEY_BAD", "0xzzzz");
        let result = Wallet::load(
            KeySource::EnvVar {
                var_name: "RK_TEST_KEY_BAD".to_string(),
            },
            None,
            0,
        );
        assert!(result.is_err());
        std::env::remove_var("RK_TEST_KEY_BAD");
    }

    #[test]
    fn load_derives_address_from_valid_key() {
        // A well-known test private key (Anvil account #0) — never used on
        // any real network, safe to bake into a test.
        std::env::set_var(
            "RK_TEST_KEY_OK",
            "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
        );
        let result = Wallet::load(
            KeySource::EnvVar {
                var_name: "RK_TEST_KEY_OK".to_string(),
            },
            None,
            7,
        );
        assert!(result.is_ok());
        assert_eq!(result.unwrap().nonce_manager.current(), 7);
        std::env::remove_var("RK_TEST_KEY_OK");
    }
}
