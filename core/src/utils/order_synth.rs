//! Synthetic order-webhook payload generator for the dispatcher.
//!
//! The shapes mirror the commerce-platform `orders/create` webhook closely
//! enough for the receiving API to accept them; the field values are
//! randomized from injected data tables rather than module-level globals so
//! tests can pin them down.

use chrono::{Duration as ChronoDuration, SecondsFormat, Utc};
use rand::prelude::IndexedRandom;
use rand::Rng;
use serde::Serialize;

use crate::utils::fixtures::{sample_print_files, SAMPLE_VARIANTS};

const MAX_BACKDATE_SECS: i64 = 60 * 24 * 60 * 60;

fn jitter(coord: f64, rng: &mut rand::rngs::ThreadRng) -> f64 {
    coord + (rng.random_range(0.0..1.0) - 0.5) * 0.1
}

#[derive(Debug, Clone, Serialize)]
pub struct Money {
    pub amount: String,
    pub currency_code: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PriceSet {
    pub shop_money: Money,
    pub presentment_money: Money,
}

impl PriceSet {
    /// Same USD amount on both sides, the common case for synthetic orders.
    fn usd(amount: &str) -> Self {
        let money = Money {
            amount: amount.to_string(),
            currency_code: "USD".to_string(),
        };
        Self { shop_money: money.clone(), presentment_money: money }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Property {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LineItem {
    pub id: i64,
    pub admin_graphql_api_id: String,
    pub current_quantity: i32,
    pub fulfillable_quantity: i32,
    pub product_id: i64,
    pub title: String,
    pub name: String,
    pub variant_title: String,
    pub price: String,
    pub quantity: i32,
    pub vendor: String,
    pub price_set: PriceSet,
    pub grams: i32,
    pub properties: Vec<Property>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Address {
    pub address1: String,
    pub first_name: String,
    pub last_name: String,
    pub name: String,
    pub city: String,
    pub zip: String,
    pub province: String,
    pub country: String,
    pub country_code: String,
    pub province_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Customer {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub default_address: Address,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShippingLine {
    pub id: i64,
    pub code: String,
    pub price: String,
    pub price_set: PriceSet,
    pub discounted_price: String,
    pub discounted_price_set: PriceSet,
    pub source: String,
    pub title: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct WebhookOrder {
    pub id: i64,
    pub admin_graphql_api_id: String,
    pub contact_email: String,
    pub created_at: String,
    pub currency: String,
    pub current_total_price: String,
    pub current_total_price_set: PriceSet,
    pub name: String,
    pub order_number: u64,
    pub billing_address: Address,
    pub customer: Customer,
    pub shipping_address: Address,
    pub total_line_items_price: String,
    pub subtotal_price: String,
    pub total_weight: i32,
    pub line_items: Vec<LineItem>,
    pub shipping_lines: Vec<ShippingLine>,
    pub financial_status: String,
    pub fulfillment_status: Option<String>,
}

/// One row of city fixture data used for billing/shipping addresses.
#[derive(Debug, Clone)]
pub struct CityRecord {
    pub city: String,
    pub state_code: String,
    pub state: String,
    pub zip: String,
    pub street: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Data tables the synthesizer draws from. Passed in at construction time;
/// `Default` carries the stock tables for the hosted sample set.
#[derive(Debug, Clone)]
pub struct SynthTables {
    pub first_names: Vec<String>,
    pub last_names: Vec<String>,
    pub cities: Vec<CityRecord>,
    pub variants: Vec<String>,
    pub print_files: Vec<String>,
}

impl Default for SynthTables {
    fn default() -> Self {
        let city = |city: &str, code: &str, state: &str, zip: &str, street: &str, lat, lon| {
            CityRecord {
                city: city.to_string(),
                state_code: code.to_string(),
                state: state.to_string(),
                zip: zip.to_string(),
                street: street.to_string(),
                latitude: lat,
                longitude: lon,
            }
        };

        Self {
            first_names: ["John", "Jane", "Michael", "Sarah", "David", "Emily", "Robert", "Lisa", "James", "Mary"]
                .map(String::from)
                .to_vec(),
            last_names: ["Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis", "Rodriguez", "Martinez"]
                .map(String::from)
                .to_vec(),
            cities: vec![
                city("New York", "NY", "New York", "10003", "20 Cooper Square", 40.7291, -73.9906),
                city("Brooklyn", "NY", "New York", "11201", "6 Metrotech Center", 40.6942, -73.9866),
                city("Houston", "TX", "Texas", "77001", "1234 Main Street", 29.7604, -95.3698),
                city("Glen Allen", "VA", "Virginia", "23060", "10260 W Broad St", 37.6660, -77.5064),
            ],
            variants: SAMPLE_VARIANTS.iter().map(|v| v.to_string()).collect(),
            print_files: sample_print_files(),
        }
    }
}

pub struct OrderSynthesizer {
    tables: SynthTables,
    vendor: String,
}

impl OrderSynthesizer {
    pub fn new(tables: SynthTables) -> Self {
        Self { tables, vendor: "DTFsheet and custom shirts".to_string() }
    }

    /// Builds one well-formed order payload for the given job id. Line items,
    /// customer identity, address, and creation time (back-dated up to 60
    /// days) are randomized per call.
    pub fn generate(&self, order_id: u64) -> WebhookOrder {
        let mut rng = rand::rng();
        let tables = &self.tables;

        let first_name = tables.first_names.choose(&mut rng).cloned().unwrap_or_default();
        let last_name = tables.last_names.choose(&mut rng).cloned().unwrap_or_default();
        let full_name = format!("{} {}", first_name, last_name);
        let email = format!("{}.{}{}@example.com", first_name, last_name, order_id);

        let city = tables.cities.choose(&mut rng).cloned().unwrap_or_else(|| CityRecord {
            city: "Houston".to_string(),
            state_code: "TX".to_string(),
            state: "Texas".to_string(),
            zip: "77001".to_string(),
            street: "1234 Main Street".to_string(),
            latitude: 29.7604,
            longitude: -95.3698,
        });

        let price = format!("{:.2}", 10.0 + rng.random_range(0.0..90.0));
        let shipping_price = "4.90".to_string();
        let total_price = format!(
            "{:.2}",
            price.parse::<f64>().unwrap_or(0.0) + shipping_price.parse::<f64>().unwrap_or(0.0)
        );

        let num_items = rng.random_range(1..=5);
        let mut line_items = Vec::with_capacity(num_items);
        for i in 0..num_items {
            let pick = rng.random_range(0..tables.variants.len().max(1));
            let variant = tables.variants.get(pick).cloned().unwrap_or_default();
            let print_file = tables.print_files.get(pick).cloned().unwrap_or_default();
            let item_id = 15_573_094_760_617 + order_id as i64 + i as i64;

            line_items.push(LineItem {
                id: item_id,
                admin_graphql_api_id: format!("gid://shopify/LineItem/{}", item_id),
                current_quantity: 1,
                fulfillable_quantity: 1,
                product_id: 8_779_236_999_337,
                title: "DTF GANG SHEET BUILDER".to_string(),
                name: format!("DTF Gangsheet {}", variant),
                variant_title: variant,
                price: price.clone(),
                quantity: rng.random_range(1..=10),
                vendor: self.vendor.clone(),
                price_set: PriceSet::usd(&price),
                grams: 0,
                properties: vec![
                    Property {
                        name: "_Print Ready File".to_string(),
                        value: print_file,
                    },
                    Property {
                        name: "_Actual Height".to_string(),
                        value: "3.76 in".to_string(),
                    },
                    Property {
                        name: "Additional Note".to_string(),
                        value: format!("Test Order {}", order_id),
                    },
                    Property {
                        name: "Background Removal".to_string(),
                        value: "No".to_string(),
                    },
                ],
            });
        }

        // Default address carries no coordinates; billing/shipping get the
        // city's coordinates with a little jitter per order.
        let base_address = Address {
            address1: city.street.clone(),
            first_name: first_name.clone(),
            last_name: last_name.clone(),
            name: full_name,
            city: city.city.clone(),
            zip: city.zip.clone(),
            province: city.state.clone(),
            country: "United States".to_string(),
            country_code: "US".to_string(),
            province_code: city.state_code.clone(),
            latitude: None,
            longitude: None,
        };
        let mut billing_address = base_address.clone();
        billing_address.latitude = Some(jitter(city.latitude, &mut rng));
        billing_address.longitude = Some(jitter(city.longitude, &mut rng));
        let mut shipping_address = base_address.clone();
        shipping_address.latitude = Some(jitter(city.latitude, &mut rng));
        shipping_address.longitude = Some(jitter(city.longitude, &mut rng));

        let created_at = Utc::now()
            - ChronoDuration::seconds(rng.random_range(0..MAX_BACKDATE_SECS));
        let order_base_id = 6_574_664_908_969 + order_id as i64;

        WebhookOrder {
            id: order_base_id,
            admin_graphql_api_id: format!("gid://shopify/Order/{}", order_base_id),
            contact_email: email.clone(),
            created_at: created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            currency: "USD".to_string(),
            current_total_price: total_price.clone(),
            current_total_price_set: PriceSet::usd(&total_price),
            name: format!("#{}-{}", order_id, first_name),
            order_number: order_id,
            billing_address,
            customer: Customer {
                id: 8_909_317_734_569 + order_id as i64,
                email,
                first_name,
                last_name,
                default_address: base_address,
            },
            shipping_address,
            total_line_items_price: price.clone(),
            subtotal_price: price,
            total_weight: 0,
            line_items,
            shipping_lines: vec![ShippingLine {
                id: 5_468_266_823_849 + order_id as i64,
                code: "Economy".to_string(),
                price: shipping_price.clone(),
                price_set: PriceSet::usd(&shipping_price),
                discounted_price: shipping_price.clone(),
                discounted_price_set: PriceSet::usd(&shipping_price),
                source: "shopify".to_string(),
                title: "Economy".to_string(),
            }],
            financial_status: "paid".to_string(),
            fulfillment_status: None,
        }
    }
}

impl Default for OrderSynthesizer {
    fn default() -> Self {
        Self::new(SynthTables::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_order_is_well_formed() {
        let synth = OrderSynthesizer::default();
        let order = synth.generate(42);

        assert_eq!(order.order_number, 42);
        assert_eq!(order.currency, "USD");
        assert_eq!(order.financial_status, "paid");
        assert!(!order.line_items.is_empty() && order.line_items.len() <= 5);
        assert!(order.contact_email.ends_with("42@example.com"));

        for item in &order.line_items {
            assert!((1..=10).contains(&item.quantity));
            let print_file = item
                .properties
                .iter()
                .find(|p| p.name == "_Print Ready File")
                .expect("line item missing print-ready file property");
            assert!(print_file.value.ends_with(".png"));
        }
    }

    #[test]
    fn test_order_serializes_to_webhook_json() {
        let order = OrderSynthesizer::default().generate(7);
        let value = serde_json::to_value(&order).unwrap();

        assert_eq!(value["order_number"], 7);
        assert!(value["line_items"].as_array().unwrap().len() >= 1);
        assert!(value["billing_address"]["latitude"].is_number());
        // Default address carries no coordinates, matching the webhook shape.
        assert!(value["customer"]["default_address"].get("latitude").is_none());
        assert!(value["created_at"].as_str().unwrap().contains('T'));
    }

    #[test]
    fn test_injected_tables_are_honored() {
        let tables = SynthTables {
            first_names: vec!["Ada".to_string()],
            last_names: vec!["Lovelace".to_string()],
            variants: vec!["22x5".to_string()],
            print_files: vec!["https://cdn.example.com/only.png".to_string()],
            ..SynthTables::default()
        };
        let order = OrderSynthesizer::new(tables).generate(1);

        assert_eq!(order.customer.first_name, "Ada");
        assert_eq!(order.customer.last_name, "Lovelace");
        for item in &order.line_items {
            assert_eq!(item.variant_title, "22x5");
        }
    }
}
