//! Scripted walk through the customer lifecycle, enabled with `BUS_DEMO=1`.

use anyhow::{Context, Result};
use serde_json::json;
use svc_customer::{ActivateCustomer, FirstPayment, OnboardCustomer, PromoteCustomer};
use svc_notifications::SendSms;
use tracing::info;

use crate::runtime::ServiceRuntime;

/// Run the lifecycle for one customer and return its id.
pub async fn run_demo(runtime: &ServiceRuntime) -> Result<String> {
    info!("Running demo flow");

    let customer_id = runtime
        .customer
        .onboard(OnboardCustomer {
            name: "Ana Torres".into(),
            email: "ana.torres@example.com".into(),
            phone: "+34600111222".into(),
            city: Some("Sevilla".into()),
            country: Some("ES".into()),
            ..OnboardCustomer::default()
        })
        .await
        .context("Demo onboarding failed")?
        .customer_id;

    runtime
        .customer
        .activate(ActivateCustomer {
            customer_id: customer_id.clone(),
            activation_reason: "identity verified".into(),
        })
        .await
        .context("Demo activation failed")?;

    runtime
        .customer
        .first_payment(FirstPayment {
            customer_id: customer_id.clone(),
            amount: 120.0,
            payment_method: Some("card".into()),
            description: Some("welcome bundle".into()),
        })
        .await
        .context("Demo first payment failed")?;

    runtime
        .customer
        .promote(PromoteCustomer {
            customer_id: customer_id.clone(),
        })
        .await
        .context("Demo promotion failed")?;

    runtime
        .profiling
        .promote_customer(svc_profiling::PromoteCustomer {
            customer_id: customer_id.clone(),
            new_tier: "vip".into(),
            reason: "first payment above threshold".into(),
        })
        .await
        .context("Demo manual promotion failed")?;

    runtime
        .notifications
        .send_sms(SendSms {
            customer_id: customer_id.clone(),
            phone: "+34600111222".into(),
            template: "payment-received".into(),
            data: json!({ "amount": 120.0 }),
        })
        .await
        .context("Demo SMS failed")?;

    info!(customer_id = %customer_id, "Demo flow published");
    Ok(customer_id)
}
