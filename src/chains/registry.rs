// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Compiled-in table of chains with swap liquidity and routing support.

use std::collections::HashSet;
use std::sync::LazyLock;

/// A chain that supports swaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupportedChain {
    /// EIP-155 chain ID
    pub chain_id: u64,
    /// Network name for display
    pub name: &'static str,
}

/// Chains eligible for swap requests, in display order.
pub const SWAP_CHAINS: [SupportedChain; 19] = [
    SupportedChain { chain_id: 1, name: "Ethereum" },
    SupportedChain { chain_id: 10, name: "Optimism" },
    SupportedChain { chain_id: 56, name: "BNB Smart Chain" },
    SupportedChain { chain_id: 130, name: "Unichain" },
    SupportedChain { chain_id: 137, name: "Polygon" },
    SupportedChain { chain_id: 146, name: "Sonic" },
    SupportedChain { chain_id: 480, name: "World Chain" },
    SupportedChain { chain_id: 999, name: "HyperEVM" },
    SupportedChain { chain_id: 2741, name: "Abstract" },
    SupportedChain { chain_id: 5000, name: "Mantle" },
    SupportedChain { chain_id: 8453, name: "Base" },
    SupportedChain { chain_id: 34443, name: "Mode" },
    SupportedChain { chain_id: 42161, name: "Arbitrum One" },
    SupportedChain { chain_id: 43114, name: "Avalanche C-Chain" },
    SupportedChain { chain_id: 57073, name: "Ink" },
    SupportedChain { chain_id: 59144, name: "Linea" },
    SupportedChain { chain_id: 80094, name: "Berachain" },
    SupportedChain { chain_id: 81457, name: "Blast" },
    SupportedChain { chain_id: 534352, name: "Scroll" },
];

static GLOBAL: LazyLock<ChainSupportRegistry> =
    LazyLock::new(|| ChainSupportRegistry::new(&SWAP_CHAINS));

/// Static lookup for chain eligibility.
///
/// Built once at startup and read-only afterwards. Lookups are set
/// membership checks; nothing here touches the network.
#[derive(Debug)]
pub struct ChainSupportRegistry {
    chains: &'static [SupportedChain],
    swap_ids: HashSet<u64>,
}

impl ChainSupportRegistry {
    /// Build a registry over the given chain table.
    pub fn new(chains: &'static [SupportedChain]) -> Self {
        Self {
            chains,
            swap_ids: chains.iter().map(|c| c.chain_id).collect(),
        }
    }

    /// The process-wide registry over [`SWAP_CHAINS`].
    pub fn global() -> &'static ChainSupportRegistry {
        &GLOBAL
    }

    pub fn chains(&self) -> &'static [SupportedChain] {
        self.chains
    }

    /// Whether swaps may be requested on `chain_id`.
    pub fn is_swap_supported(&self, chain_id: u64) -> bool {
        self.swap_ids.contains(&chain_id)
    }

    /// Display name of a supported chain.
    pub fn chain_name(&self, chain_id: u64) -> Option<&'static str> {
        self.chains
            .iter()
            .find(|c| c.chain_id == chain_id)
            .map(|c| c.name)
    }

    /// Names of all swap-capable chains, in display order.
    pub fn list_supported_chain_names(&self) -> Vec<&'static str> {
        self.chains.iter().map(|c| c.name).collect()
    }

    /// User-facing explanation for a swap attempted on an unsupported chain.
    ///
    /// `chain_name` is whatever the caller displays for the chain; when it is
    /// empty the chain ID is used instead.
    pub fn unsupported_message(&self, chain_id: u64, chain_name: &str) -> String {
        let name = chain_name.trim();
        let label = if name.is_empty() {
            format!("chain {chain_id}")
        } else {
            name.to_string()
        };
        format!(
            "Swaps are not supported on {label} (chain ID {chain_id}). \
             Switch to one of: {}.",
            self.list_supported_chain_names().join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPECTED_IDS: [u64; 19] = [
        1, 10, 56, 130, 137, 146, 480, 999, 2741, 5000, 8453, 34443, 42161, 43114, 57073,
        59144, 80094, 81457, 534352,
    ];

    #[test]
    fn every_listed_chain_supports_swaps() {
        let registry = ChainSupportRegistry::global();
        for id in EXPECTED_IDS {
            assert!(registry.is_swap_supported(id), "chain {id} should support swaps");
        }
    }

    #[test]
    fn unlisted_chains_do_not_support_swaps() {
        let registry = ChainSupportRegistry::global();
        for id in [0, 2, 5, 100, 250, 324, 1101, 9999, 11155111, u64::MAX] {
            assert!(!registry.is_swap_supported(id), "chain {id} should not support swaps");
        }
    }

    #[test]
    fn table_has_nineteen_unique_entries() {
        let registry = ChainSupportRegistry::global();
        assert_eq!(registry.swap_ids.len(), 19);
        assert_eq!(registry.list_supported_chain_names().len(), 19);
    }

    #[test]
    fn names_are_listed_in_declaration_order() {
        let names = ChainSupportRegistry::global().list_supported_chain_names();
        assert_eq!(names.first(), Some(&"Ethereum"));
        assert_eq!(names[1], "Optimism");
        assert_eq!(names.last(), Some(&"Scroll"));
    }

    #[test]
    fn chain_name_resolves_known_chains() {
        let registry = ChainSupportRegistry::global();
        assert_eq!(registry.chain_name(8453), Some("Base"));
        assert_eq!(registry.chain_name(9999), None);
    }

    #[test]
    fn unsupported_message_names_chain_and_alternatives() {
        let registry = ChainSupportRegistry::global();
        let msg = registry.unsupported_message(250, "Fantom");
        assert!(msg.starts_with("Swaps are not supported on Fantom (chain ID 250)."));
        assert!(msg.contains("Ethereum, Optimism"));
        assert!(msg.ends_with("Scroll."));
    }

    #[test]
    fn unsupported_message_falls_back_to_chain_id() {
        let msg = ChainSupportRegistry::global().unsupported_message(9999, "  ");
        assert!(msg.starts_with("Swaps are not supported on chain 9999 (chain ID 9999)."));
    }
}
