// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::chains::ChainSupportRegistry;
use crate::config::BridgeConfig;
use crate::session::ConnectionModeController;
use crate::signing::SigningCoordinator;
use crate::transport::{DefaultTransportFactory, TransportFactory};

#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<ConnectionModeController>,
    pub coordinator: Arc<SigningCoordinator>,
    pub registry: &'static ChainSupportRegistry,
}

impl AppState {
    pub fn new(config: &BridgeConfig) -> Self {
        let factory = Arc::new(DefaultTransportFactory::new(config.transport.clone()));
        Self::with_factory(factory, config)
    }

    /// Build the state around a custom transport factory.
    pub fn with_factory(factory: Arc<dyn TransportFactory>, config: &BridgeConfig) -> Self {
        let registry = ChainSupportRegistry::global();
        let controller = Arc::new(ConnectionModeController::new(factory, config.session));
        let coordinator = Arc::new(SigningCoordinator::new(
            controller.clone(),
            registry,
            config.session.key_slot,
        ));
        Self {
            controller,
            coordinator,
            registry,
        }
    }
}
