use std::str::FromStr;

use {anyhow::Context, clap::Subcommand, secrecy::ExposeSecret};

use {
    mirrorplane_billing::{compute_signature, format_order_id, price_of},
    mirrorplane_common::time::now_ms,
    mirrorplane_config::MirrorplaneConfig,
    mirrorplane_entitlement::PlanTier,
};

#[derive(Subcommand)]
pub enum BillingAction {
    /// Print a provider order id for a manual invoice or a webhook test.
    Order {
        /// User the order is issued for.
        #[arg(long)]
        user: String,
        /// Plan tier being purchased.
        #[arg(long)]
        tier: String,
    },
}

pub fn handle_billing(action: BillingAction, config: &MirrorplaneConfig) -> anyhow::Result<()> {
    match action {
        BillingAction::Order { user, tier } => print_order(&user, &tier, config),
    }
}

fn print_order(user: &str, tier: &str, config: &MirrorplaneConfig) -> anyhow::Result<()> {
    let tier = PlanTier::from_str(tier)?;
    let price = price_of(tier).context("the free tier has no invoice price")?;
    let order_id = format_order_id(user, now_ms());
    let gross_amount = format!("{price}.00");

    println!("Order id:     {order_id}");
    println!("Tier:         {tier}");
    println!("Gross amount: {gross_amount}");
    if let Some(key) = &config.billing.server_key {
        let signature = compute_signature(&order_id, "200", &gross_amount, key.expose_secret());
        println!("Signature:    {signature}");
    }
    Ok(())
}
