//! # Profiling Service
//!
//! ```text
//! customer.onboarded ──→ onboarding_profile ──→ customer.profiled { profile }
//! customer.activated ──→ activation_profile ──→ customer.profiled { profile }
//! promote_customer() ───────────────────────→ customer.profiled { promotion }
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use serde::{Deserialize, Serialize};
use shared_bus::{BrokerClient, HandlerError};
use shared_types::validation::require;
use shared_types::{
    topics, CustomerActivated, CustomerOnboarded, CustomerProfiled, Profile, Promotion,
    ValidationError,
};
use tracing::info;

use crate::errors::ProfilingError;
use crate::scoring::{activation_profile, onboarding_profile};

/// Manual tier change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromoteCustomer {
    pub customer_id: String,
    pub new_tier: String,
    pub reason: String,
}

impl PromoteCustomer {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("customerId", &self.customer_id)?;
        require("newTier", &self.new_tier)?;
        require("reason", &self.reason)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionReceipt {
    pub customer_id: String,
    pub message: String,
}

pub struct ProfilingService {
    bus: Arc<BrokerClient>,
    rng: Mutex<Box<dyn RngCore + Send>>,
    profiles: RwLock<HashMap<String, Profile>>,
}

impl ProfilingService {
    pub fn new(bus: Arc<BrokerClient>) -> Arc<Self> {
        Self::with_rng(bus, StdRng::from_entropy())
    }

    /// Use a caller-supplied RNG, e.g. a seeded one.
    pub fn with_rng(bus: Arc<BrokerClient>, rng: impl RngCore + Send + 'static) -> Arc<Self> {
        Arc::new(Self {
            bus,
            rng: Mutex::new(Box::new(rng)),
            profiles: RwLock::new(HashMap::new()),
        })
    }

    /// Latest profile computed for `customer_id`.
    #[must_use]
    pub fn profile(&self, customer_id: &str) -> Option<Profile> {
        self.profiles.read().get(customer_id).cloned()
    }

    pub(crate) async fn on_customer_onboarded(
        &self,
        event: CustomerOnboarded,
    ) -> Result<(), HandlerError> {
        info!(customer_id = %event.customer_id, "Profiling onboarded customer");
        let now = Utc::now();
        let profile = onboarding_profile(&event.customer_id, now, &mut *self.rng.lock());
        self.emit_profile(profile).await?;
        info!(customer_id = %event.customer_id, "Profile generated");
        Ok(())
    }

    pub(crate) async fn on_customer_activated(
        &self,
        event: CustomerActivated,
    ) -> Result<(), HandlerError> {
        info!(customer_id = %event.customer_id, "Updating profile of activated customer");
        let now = Utc::now();
        let profile = activation_profile(&event.customer_id, now, &mut *self.rng.lock());
        self.emit_profile(profile).await?;
        info!(customer_id = %event.customer_id, "Profile updated");
        Ok(())
    }

    /// Publish a manual promotion.
    pub async fn promote_customer(
        &self,
        command: PromoteCustomer,
    ) -> Result<PromotionReceipt, ProfilingError> {
        command.validate()?;
        info!(
            customer_id = %command.customer_id,
            new_tier = %command.new_tier,
            "Promoting customer manually"
        );

        let now = Utc::now();
        let event = CustomerProfiled {
            customer_id: command.customer_id.clone(),
            profile: None,
            promotion: Some(Promotion {
                customer_id: command.customer_id.clone(),
                new_tier: command.new_tier.clone(),
                reason: command.reason,
                promoted_at: now,
            }),
            timestamp: now,
        };
        self.bus.publish(topics::CUSTOMER_PROFILED, &event, None).await?;

        Ok(PromotionReceipt {
            customer_id: command.customer_id,
            message: format!("Customer promoted to {} successfully", command.new_tier),
        })
    }

    async fn emit_profile(&self, profile: Profile) -> Result<(), HandlerError> {
        self.profiles
            .write()
            .insert(profile.customer_id.clone(), profile.clone());

        let event = CustomerProfiled {
            customer_id: profile.customer_id.clone(),
            profile: Some(profile),
            promotion: None,
            timestamp: Utc::now(),
        };
        self.bus.publish(topics::CUSTOMER_PROFILED, &event, None).await?;
        Ok(())
    }
}
