//! Catalog command handlers
//!
//! Handles the public product lists and the authenticated recommendation
//! endpoint.

use anyhow::Result;
use clap::Subcommand;
use colored::*;
use probe_client::BackendClient;
use serde_json::Value;

use crate::config::Config;

/// Catalog subcommands
#[derive(Subcommand)]
pub enum CatalogCommands {
    /// List all plans
    Plans {
        /// Print the raw JSON items
        #[arg(long)]
        json: bool,
    },
    /// List all value-added services
    Vass {
        /// Print the raw JSON items
        #[arg(long)]
        json: bool,
    },
    /// List all life coupons
    Coupons {
        /// Print the raw JSON items
        #[arg(long)]
        json: bool,
    },
}

/// Handle catalog commands
pub async fn handle_catalog_command(command: CatalogCommands, config: &Config) -> Result<()> {
    let client = BackendClient::new(&config.base_url);

    match command {
        CatalogCommands::Plans { json } => print_list("plan", client.list_plans().await?, json),
        CatalogCommands::Vass { json } => {
            print_list("value-added service", client.list_vass().await?, json)
        }
        CatalogCommands::Coupons { json } => {
            print_list("coupon", client.list_coupons().await?, json)
        }
    }
}

/// Fetch and display recommendations
pub async fn handle_recommend(config: &Config) -> Result<()> {
    let client = BackendClient::new(&config.base_url);
    let credential = config.credential(&client).await?;

    let recommendation = client.recommend(&credential).await?;

    println!("{}", "Recommendation:".bold());
    println!("  Plans:    {}", recommendation.plans.len());
    println!("  Vass:     {}", recommendation.vass.len());
    println!("  Coupons:  {}", recommendation.coupons.len());

    if let Some(description) = &recommendation.description {
        println!("\n{}", "Description:".bold());
        println!("{}", description);
    }

    Ok(())
}

fn print_list(kind: &str, items: Vec<Value>, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    if items.is_empty() {
        println!("{}", format!("No {}s found.", kind).yellow());
    } else {
        println!("{}", format!("Found {} {}(s):", items.len(), kind).bold());
        println!();
        for item in &items {
            println!("  {} {}", "▸".cyan(), summarize_item(item));
        }
    }

    Ok(())
}

/// One-line description of an opaque catalog item
fn summarize_item(item: &Value) -> String {
    let name = ["name", "planName", "vasName", "couponName"]
        .iter()
        .find_map(|key| item.get(*key).and_then(Value::as_str));

    match name {
        Some(name) => name.to_string(),
        None => item.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_summarize_item_uses_name_fields() {
        assert_eq!(summarize_item(&json!({ "planName": "5G Max", "price": 1 })), "5G Max");
        assert_eq!(summarize_item(&json!({ "couponName": "Cafe" })), "Cafe");
        assert_eq!(summarize_item(&json!({ "id": 3 })), r#"{"id":3}"#);
    }
}
