//! # Seed Data Generator
//!
//! Populates a database with demo users and a garden catalog, then places
//! one demo order through the checkout workflow.
//!
//! ## Usage
//! ```bash
//! # Seed ./verdant_dev.db (or $DATABASE_PATH)
//! cargo run -p verdant-db --bin seed
//!
//! # Specify database path
//! cargo run -p verdant-db --bin seed -- --db ./data/verdant.db
//!
//! # Skip the demo order
//! cargo run -p verdant-db --bin seed -- --no-order
//! ```

use std::env;

use anyhow::{bail, Context};
use chrono::Utc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use verdant_checkout::{CheckoutConfig, PlaceOrderRequest};
use verdant_core::{
    OrderLineRequest, Product, ProductCategory, ProductStatus, ShippingAddress, User, UserRole,
};
use verdant_db::repository::product::generate_product_id;
use verdant_db::repository::user::generate_user_id;
use verdant_db::{Database, DbConfig};

const DEFAULT_DB_PATH: &str = "./verdant_dev.db";

/// (sku, name, category, price_cents, stock)
const CATALOG: &[(&str, &str, ProductCategory, i64, i64)] = &[
    ("PLT-MONSTERA", "Monstera Deliciosa", ProductCategory::Plants, 8990, 14),
    ("PLT-FERN", "Boston Fern", ProductCategory::Plants, 4590, 25),
    ("PLT-SNAKE", "Snake Plant", ProductCategory::Plants, 5990, 18),
    ("PLT-ORCHID", "Phalaenopsis Orchid", ProductCategory::Plants, 7490, 6),
    ("PLT-BONSAI", "Juniper Bonsai", ProductCategory::Plants, 24990, 1),
    ("TLS-PRUNER", "Bypass Pruner", ProductCategory::Tools, 6290, 30),
    ("TLS-TROWEL", "Hand Trowel", ProductCategory::Tools, 2990, 40),
    ("TLS-CAN-5L", "Watering Can 5L", ProductCategory::Tools, 3990, 20),
    ("POT-CLAY-20", "Terracotta Pot 20cm", ProductCategory::Pots, 3490, 50),
    ("POT-CERAMIC-30", "Glazed Ceramic Pot 30cm", ProductCategory::Pots, 9990, 8),
    ("FRT-NPK-1KG", "NPK 10-10-10 Fertilizer 1kg", ProductCategory::Fertilizers, 2790, 60),
    ("FRT-WORM-2KG", "Worm Castings 2kg", ProductCategory::Fertilizers, 3290, 35),
    ("SED-BASIL", "Basil Seeds", ProductCategory::Seeds, 590, 200),
    ("SED-TOMATO", "Cherry Tomato Seeds", ProductCategory::Seeds, 690, 150),
    ("ACC-GLOVES", "Gardening Gloves", ProductCategory::Accessories, 2490, 45),
    ("ACC-MISTER", "Plant Mister", ProductCategory::Accessories, 1990, 0),
];

/// (name, email, role)
const USERS: &[(&str, &str, UserRole)] = &[
    ("Verdant Admin", "admin@verdant.dev", UserRole::Admin),
    ("Ana Souza", "ana@verdant.dev", UserRole::Customer),
    ("Bruno Lima", "bruno@verdant.dev", UserRole::Customer),
];

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,verdant=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args: Vec<String> = env::args().collect();

    let mut db_path = env::var("DATABASE_PATH").unwrap_or_else(|_| DEFAULT_DB_PATH.to_string());
    let mut place_demo_order = true;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                let Some(path) = args.get(i + 1) else {
                    bail!("--db requires a path");
                };
                db_path = path.clone();
                i += 1;
            }
            "--no-order" => place_demo_order = false,
            "--help" | "-h" => {
                println!("Verdant Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: $DATABASE_PATH or {DEFAULT_DB_PATH})");
                println!("      --no-order     Do not place the demo order");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            other => bail!("unknown argument: {other}"),
        }
        i += 1;
    }

    info!(path = %db_path, "Seeding database");

    let db = Database::new(DbConfig::new(&db_path))
        .await
        .with_context(|| format!("opening {db_path}"))?;

    let existing = db.products().count().await?;
    if existing > 0 {
        warn!(existing, "Database already has products; skipping seed");
        return Ok(());
    }

    let now = Utc::now();

    let mut customer_id = None;
    for (name, email, role) in USERS {
        let user = User {
            id: generate_user_id(),
            name: name.to_string(),
            email: email.to_string(),
            role: *role,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.users()
            .insert(&user)
            .await
            .with_context(|| format!("inserting user {email}"))?;
        if *role == UserRole::Customer && customer_id.is_none() {
            customer_id = Some(user.id);
        }
    }

    let mut product_ids = Vec::with_capacity(CATALOG.len());
    for (sku, name, category, price_cents, stock) in CATALOG {
        let product = Product {
            id: generate_product_id(),
            sku: sku.to_string(),
            name: name.to_string(),
            description: String::new(),
            category: *category,
            price_cents: *price_cents,
            currency: "BRL".to_string(),
            stock: *stock,
            status: if *stock == 0 {
                ProductStatus::OutOfStock
            } else {
                ProductStatus::Active
            },
            created_at: now,
            updated_at: now,
        };
        db.products()
            .insert(&product)
            .await
            .with_context(|| format!("inserting product {sku}"))?;
        product_ids.push(product.id);
    }

    info!(
        users = db.users().count().await?,
        products = db.products().count().await?,
        "Catalog seeded"
    );

    if place_demo_order {
        let Some(user_id) = customer_id else {
            bail!("no customer account to place the demo order");
        };

        let checkout = db.checkout_service(CheckoutConfig::load()?);
        let order = checkout
            .place_order(PlaceOrderRequest {
                user_id,
                items: vec![
                    OrderLineRequest::new(product_ids[1].clone(), 2),
                    OrderLineRequest::new(product_ids[8].clone(), 2),
                    OrderLineRequest::new(product_ids[12].clone(), 3),
                ],
                shipping_address: ShippingAddress {
                    street: "Rua dos Ipês".to_string(),
                    number: "120".to_string(),
                    complement: None,
                    neighborhood: "Jardim Botânico".to_string(),
                    city: "Curitiba".to_string(),
                    state: "PR".to_string(),
                    zip_code: "80210-390".to_string(),
                    country: "Brasil".to_string(),
                },
                notes: Some("Demo order from seed".to_string()),
            })
            .await?;

        info!(order_id = %order.id, total = %order.total_amount, "Demo order placed");
    }

    db.close().await;
    println!("✓ Seed complete: {db_path}");

    Ok(())
}
