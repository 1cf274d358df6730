//! shop-runner: headless pricing runner for the print shop.
//!
//! Usage:
//!   shop-runner --product flyers --variant a5-135g --qty 150 --country FR
//!   shop-runner --clients clients.json
//!   shop-runner --ipc-mode --db shop.db

use anyhow::Result;
use printshop_core::{
    cart::{add_to_cart, CartItem, CartStore, Checkout},
    commission::{BillingReport, ClientBilling},
    config::ShopConfig,
    idempotency::{ChargeRequest, IdempotencyKey},
    quote::Quote,
    store::ShopStore,
    tier_pricing::{compute_tier_price, price_break_table},
    vat::{Customer, CustomerType},
};
use rust_decimal::Decimal;
use std::env;
use std::io::{self, BufRead, Write};

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    Price {
        product_id: String,
        variant_id: String,
        quantity:   u32,
    },
    PriceTable {
        product_id: String,
        variant_id: String,
    },
    Vat {
        amount_ht: Decimal,
        customer:  Customer,
    },
    Billing {
        clients: Vec<ClientBilling>,
    },
    Quote {
        quote:    Quote,
        customer: Customer,
    },
    AddToCart {
        item: CartItem,
    },
    Checkout {
        customer: Customer,
    },
    /// Resend the charge for a placed order under the key the client holds.
    RetryCharge {
        order_id: String,
        key:      String,
    },
    Quit,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let data_dir = str_arg(&args, "--data-dir").unwrap_or("./data");
    let db = str_arg(&args, "--db").unwrap_or(":memory:");

    let config = ShopConfig::load(data_dir)?;
    let mut store = ShopStore::open(db)?;
    store.migrate()?;

    if ipc_mode {
        return run_ipc_loop(&config, &mut store);
    }

    if let Some(path) = str_arg(&args, "--clients") {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let clients: Vec<ClientBilling> = serde_json::from_str(&content)?;
        print_billing(&BillingReport::build(&clients, &config.commission));
        return Ok(());
    }

    let product = str_arg(&args, "--product").unwrap_or("flyers");
    let variant = str_arg(&args, "--variant").unwrap_or("a5-135g");
    let qty = parse_arg(&args, "--qty", 100u32);
    let customer = Customer {
        country: str_arg(&args, "--country").unwrap_or("LU").to_string(),
        vat_number: str_arg(&args, "--vat-number").map(str::to_string),
        customer_type: match str_arg(&args, "--customer-type") {
            Some("company") => CustomerType::Company,
            _ => CustomerType::Private,
        },
        customer_handles_vat: args.iter().any(|a| a == "--customer-handles-vat"),
    };

    print_quote(&config, product, variant, qty, &customer)
}

fn run_ipc_loop(config: &ShopConfig, store: &mut ShopStore) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();
    let checkout = Checkout::new(config.vat.clone());

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                writeln!(stdout, "{}", serde_json::json!({ "error": e.to_string() }))?;
                stdout.flush()?;
                continue;
            }
        };

        let reply = match cmd {
            IpcCommand::Quit => break,
            IpcCommand::Price { product_id, variant_id, quantity } => {
                match config.catalog.variant(&product_id, &variant_id) {
                    Ok(v) => serde_json::to_value(compute_tier_price(quantity, &v.pricing_tiers))?,
                    Err(e) => serde_json::json!({ "error": e.to_string() }),
                }
            }
            IpcCommand::PriceTable { product_id, variant_id } => {
                match config.catalog.variant(&product_id, &variant_id) {
                    Ok(v) => serde_json::to_value(price_break_table(&v.pricing_tiers))?,
                    Err(e) => serde_json::json!({ "error": e.to_string() }),
                }
            }
            IpcCommand::Vat { amount_ht, customer } => {
                serde_json::to_value(config.vat.compute(amount_ht, &customer))?
            }
            IpcCommand::Billing { clients } => {
                serde_json::to_value(BillingReport::build(&clients, &config.commission))?
            }
            IpcCommand::Quote { quote, customer } => {
                serde_json::to_value(quote.totals(&config.vat, &customer))?
            }
            IpcCommand::AddToCart { item } => match add_to_cart(store, item) {
                Ok(items) => serde_json::to_value(items)?,
                Err(e) => serde_json::json!({ "error": e.to_string() }),
            },
            // The order is committed before charging; a failed charge is
            // reported with its key so the client can resend it.
            IpcCommand::Checkout { customer } => match checkout.place_order(store, &customer) {
                Ok(order) => match store.record_charge(&order.charge) {
                    Ok(outcome) => serde_json::json!({ "order": order, "charge": outcome }),
                    Err(e) => {
                        log::error!("ipc: charge for order {} failed: {e}", order.order_id);
                        serde_json::json!({
                            "order": order,
                            "error": e.to_string(),
                            "retry_key": order.charge.key,
                        })
                    }
                },
                Err(e) => serde_json::json!({ "error": e.to_string() }),
            },
            IpcCommand::RetryCharge { order_id, key } => match store.order(&order_id) {
                Ok(Some(order)) => {
                    let req = ChargeRequest::with_key(
                        IdempotencyKey::from_existing(key),
                        &order.order_id,
                        order.total_ttc,
                    );
                    match store.record_charge(&req) {
                        Ok(outcome) => serde_json::json!({ "order_id": order_id, "charge": outcome }),
                        Err(e) => serde_json::json!({ "error": e.to_string(), "retry_key": req.key }),
                    }
                }
                Ok(None) => serde_json::json!({ "error": format!("Order '{order_id}' not found") }),
                Err(e) => serde_json::json!({ "error": e.to_string() }),
            },
        };

        writeln!(stdout, "{reply}")?;
        stdout.flush()?;
    }

    log::info!("ipc: loop ended, {} items left in cart", store.get()?.len());
    Ok(())
}

fn print_quote(
    config: &ShopConfig,
    product_id: &str,
    variant_id: &str,
    qty: u32,
    customer: &Customer,
) -> Result<()> {
    let product = config.catalog.product(product_id)?;
    let variant = config.catalog.variant(product_id, variant_id)?;
    let quote = compute_tier_price(qty, &variant.pricing_tiers);

    println!("=== QUOTE ===");
    println!("  product:     {} / {}", product.name, variant.label);
    println!("  quantity:    {qty}");
    println!("  unit price:  {} EUR HT", quote.unit_selling_price);
    println!("  total:       {} EUR HT", quote.total_ht);
    if let Some(w) = quote.status.warning() {
        println!("  warning:     {w}");
    }

    println!();
    println!("=== PRICE BREAKS ===");
    for row in price_break_table(&variant.pricing_tiers) {
        let band = match row.max_quantity {
            Some(max) => format!("{}-{}", row.min_quantity, max),
            None => format!("{}+", row.min_quantity),
        };
        println!("  {band:>10} | {} EUR/u | {} EUR", row.unit_selling_price, row.total_ht);
    }

    let vat = config.vat.compute(quote.total_ht, customer);
    println!();
    println!("=== VAT ({}) ===", customer.country);
    println!("  {}:  {} EUR", vat.vat_label, vat.vat_amount);
    println!("  total TTC:   {} EUR", vat.amount_ttc);
    if let Some(w) = &vat.warning {
        println!("  warning:     {w}");
    }
    if !vat.vat_number_status.label().is_empty() {
        println!("  VAT number:  {}", vat.vat_number_status.label());
    }
    Ok(())
}

fn print_billing(report: &BillingReport) {
    println!("=== BILLING ===");
    for line in &report.lines {
        println!(
            "  {:<24} {:<15} revenue {:>10} | commission {:>8} | hosting {:>5} | due {:>8}",
            line.name, line.mode, line.monthly_revenue, line.commission, line.hosting, line.total_due
        );
    }
    println!();
    println!("  clients:     {}", report.lines.len());
    println!("  revenue:     {} EUR", report.total_revenue);
    println!("  commission:  {} EUR", report.total_commission);
    println!("  hosting:     {} EUR", report.total_hosting);
    println!("  total due:   {} EUR", report.grand_total);
    if report.totals_overflowed {
        println!("  warning:     totals out of range, not reliable");
    }
}

fn str_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
