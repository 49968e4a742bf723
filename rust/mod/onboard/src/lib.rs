//! Onboard module — fresher onboarding workflows for HexaBoard.
//!
//! # Resources
//!
//! - **Department** — organizational grouping with a derived member count
//! - **Fresher** — provisioned new-hire profile (id == identity id)
//! - **Course assignment** — per-fresher course with lecture progress
//! - **Assessment task** — unlocked when a course is finished
//! - **Chat** — scripted assistant with a generative fallback
//! - **Mail outbox** — durable queue for welcome notifications
//!
//! # Usage
//!
//! ```ignore
//! use onboard::{OnboardModule, service::{OnboardConfig, OnboardService}};
//!
//! let service = OnboardService::new(store, identity, media, completer, OnboardConfig::default());
//! let module = OnboardModule::new(service);
//! let router = module.routes(); // Mount under /onboard
//! ```

pub mod api;
pub mod model;
pub mod service;
pub mod worker;

use std::sync::Arc;

use axum::Router;

use hexaboard_core::Module;

use crate::service::OnboardService;

/// Onboard module implementing the Module trait.
pub struct OnboardModule {
    service: Arc<OnboardService>,
}

impl OnboardModule {
    pub fn new(service: Arc<OnboardService>) -> Self {
        Self { service }
    }

    pub fn service(&self) -> Arc<OnboardService> {
        Arc::clone(&self.service)
    }
}

impl Module for OnboardModule {
    fn name(&self) -> &str {
        "onboard"
    }

    fn routes(&self) -> Router {
        api::build_router(Arc::clone(&self.service))
    }
}
