//! Synthetic sales data.
//!
//! Used when no input file is available. The generated table has the same
//! shape as a typical sales-order export (order date, product description,
//! customer names, city, order quantity, unit selling price, unit cost) and
//! goes through the exact same cleaning path as a loaded file. A small share
//! of rows is deliberately broken so that the cleaning summary has something
//! to report.

use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{Map, Value};

use crate::parser::{ParseResult, SourceFormat};

pub const DEFAULT_SAMPLE_SIZE: usize = 5000;
pub const DEFAULT_SEED: u64 = 42;

/// First day covered by generated orders.
const SAMPLE_START: (i32, u32, u32) = (2023, 1, 1);
/// Two full calendar years.
const SAMPLE_DAYS: i64 = 731;

pub const SAMPLE_HEADERS: [&str; 7] = [
    "OrderDate",
    "Product Description",
    "Customer Names",
    "City",
    "Order Quantity",
    "Unit Selling Price",
    "Unit Cost",
];

/// Product name and list price.
const PRODUCTS: [(&str, f64); 10] = [
    ("Bathroom Furniture", 1450.0),
    ("Bedroom Furniture", 2310.0),
    ("Computers", 1899.0),
    ("Cookware", 185.5),
    ("Dinnerware", 240.0),
    ("Outdoor Furniture", 980.0),
    ("Photo Frames", 42.9),
    ("Table Lamps", 129.0),
    ("Wall Clocks", 64.5),
    ("Wardrobes", 1725.0),
];

const CUSTOMERS: [&str; 20] = [
    "Avon Corp",
    "Burke Ltd",
    "Cedar Partners",
    "Dalton Group",
    "Elm & Co",
    "Fenwick Stores",
    "Glenn Retail",
    "Harbor Supply",
    "Iris Trading",
    "Juniper Home",
    "Keystone Ltd",
    "Larch Outlet",
    "Maple Direct",
    "Norwood Inc",
    "Oakridge Co",
    "Pine Valley",
    "Quarry Goods",
    "Redwood Mart",
    "Spruce & Sons",
    "Thistle Market",
];

const CITIES: [&str; 8] = [
    "Paris",
    "Lyon",
    "Marseille",
    "Toulouse",
    "Nice",
    "Nantes",
    "Bordeaux",
    "Lille",
];

/// Generate `rows` raw sales rows, deterministically from `seed`.
///
/// Roughly 1% of rows carry an unparseable date, 1% a negative price, 2% an
/// empty customer, and 0.5% repeat the previous row verbatim.
pub fn generate_sample(rows: usize, seed: u64) -> ParseResult {
    let mut rng = StdRng::seed_from_u64(seed);
    let start = NaiveDate::from_ymd_opt(SAMPLE_START.0, SAMPLE_START.1, SAMPLE_START.2)
        .unwrap_or(NaiveDate::MIN);

    let mut records: Vec<Value> = Vec::with_capacity(rows);
    while records.len() < rows {
        if let Some(last) = records.last() {
            if rng.gen_bool(0.005) {
                records.push(last.clone());
                continue;
            }
        }

        let date = start + Duration::days(rng.gen_range(0..SAMPLE_DAYS));
        let (product, list_price) = PRODUCTS[rng.gen_range(0..PRODUCTS.len())];
        let customer = CUSTOMERS[rng.gen_range(0..CUSTOMERS.len())];
        let city = CITIES[rng.gen_range(0..CITIES.len())];
        let quantity: u32 = rng.gen_range(1..=12);
        let price = list_price * rng.gen_range(0.9..1.1);
        let cost = price * rng.gen_range(0.55..0.8);

        let date_cell = if rng.gen_bool(0.01) {
            "not a date".to_string()
        } else {
            date.format("%Y-%m-%d").to_string()
        };
        let price_cell = if rng.gen_bool(0.01) {
            format!("-{:.2}", price)
        } else {
            format!("{:.2}", price)
        };
        let customer_cell = if rng.gen_bool(0.02) { "" } else { customer };

        let cells = [
            date_cell,
            product.to_string(),
            customer_cell.to_string(),
            city.to_string(),
            quantity.to_string(),
            price_cell,
            format!("{:.2}", cost),
        ];

        let row: Map<String, Value> = SAMPLE_HEADERS
            .iter()
            .zip(cells)
            .map(|(h, c)| (h.to_string(), Value::String(c)))
            .collect();
        records.push(Value::Object(row));
    }

    ParseResult {
        records,
        encoding: "utf-8".to_string(),
        delimiter: ',',
        headers: SAMPLE_HEADERS.iter().map(|h| h.to_string()).collect(),
        format: SourceFormat::Sample,
        sheet: None,
    }
}
