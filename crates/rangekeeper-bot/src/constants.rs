//! The constant address table `NETWORK` selects between. This bot targets
//! a single fixed USDC/WETH pool per deployment, not arbitrary pool
//! discovery, so the pool address lives here alongside the periphery
//! contracts rather than in `AppConfig`.

use alloy::primitives::{address, Address};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    Mainnet,
    Testnet,
}

impl Network {
    #[must_use]
    pub fn from_env_str(value: &str) -> Self {
        if value.eq_ignore_ascii_case("MAINNET") {
            Network::Mainnet
        } else {
            Network::Testnet
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ContractAddresses {
    pub pool: Address,
    pub usdc: Address,
    pub weth: Address,
    pub position_manager: Address,
    pub swap_router: Address,
    pub quoter: Address,
}

impl ContractAddresses {
    #[must_use]
    pub fn for_network(network: Network) -> Self {
        match network {
            // Arbitrum One. `position_manager`/`swap_router`/`quoter` are
            // Uniswap's canonical deterministic deployments, identical
            // across most of its chains.
            Network::Mainnet => Self {
                pool: address!("C6962004f452bE9203591991D15f6b388e09E8D0"),
                usdc: address!("af88d065e77c8cC2239327C5EDb3A432268e5831"),
                weth: address!("82aF49447D8a07e3bd95BD0d56f35241523fBab1"),
                position_manager: address!("C36442b4a4522E871399CD717aBDD847Ab11FE88"),
                swap_router: address!("68b3465833fb72A70ecDF485E0e4C7bD8665Fc45"),
                quoter: address!("61fFE014bA17989E743c5F6cB21bF9697530B21e"),
            },
            // Arbitrum Sepolia test deployment.
            Network::Testnet => Self {
                pool: address!("0000000000000000000000000000000000000001"),
                usdc: address!("75faf114eafb1BDbe2F0316DF893fd58CE46AA4d"),
                weth: address!("980B62Da83eFf3D4576C647993b0c1D7faf17c73"),
                position_manager: address!("6b2937Bde17889EDCf8fbD8dE31C3C2a70Bc4d65"),
                swap_router: address!("101F443B4d1b059569D643917553c771E1b9663E"),
                quoter: address!("2779a0CC1c3e0E44D2542EC3e79e3864Ae93Ef0B"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unrecognized_network_string_defaults_to_testnet() {
        assert_eq!(Network::from_env_str("anything-else"), Network::Testnet);
    }

    #[test]
    fn mainnet_string_is_case_insensitive() {
        assert_eq!(Network::from_env_str("mainnet"), Network::Mainnet);
        assert_eq!(Network::from_env_str("MAINNET"), Network::Mainnet);
    }

    #[test]
    fn mainnet_and_testnet_tables_use_distinct_addresses() {
        let main = ContractAddresses::for_network(Network::Mainnet);
        let test = ContractAddresses::for_network(Network::Testnet);
        assert_ne!(main.pool, test.pool);
        assert_ne!(main.usdc, test.usdc);
    }
}
