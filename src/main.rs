use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use shop_orders::config::Config;
use shop_orders::{
    Money, NewProduct, OrderDetails, OrderError, OrderId, OrderLine, OrderQueryService,
    OrderWorkflow, PageRequest, Principal, ProductId, Store, UserId,
};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "shopctl")]
#[command(about = "Storefront order workflow CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Catalog maintenance
    Product {
        #[command(subcommand)]
        cmd: ProductCmd,
    },

    /// Order placement and lifecycle
    Order {
        /// Acting user id (user_1...)
        #[arg(long, global = true)]
        user: Option<UserId>,

        /// Act with admin privileges
        #[arg(long, global = true, default_value_t = false)]
        admin: bool,

        #[command(subcommand)]
        cmd: OrderCmd,
    },

    /// Print a fresh user id
    NewUser,
}

#[derive(Subcommand)]
enum ProductCmd {
    /// Add a product and print its id
    Add {
        #[arg(long)]
        name: String,

        /// Unit price, e.g. 12.50
        #[arg(long)]
        price: Money,

        #[arg(long, default_value_t = 0)]
        stock: u32,

        #[arg(long, default_value = "")]
        description: String,
    },

    Show {
        id: ProductId,
    },

    /// Change the catalog price. Placed orders keep their price.
    Reprice {
        id: ProductId,

        #[arg(long)]
        price: Money,
    },

    /// Soft delete: the product stays on record but can no longer be ordered
    Deactivate {
        id: ProductId,
    },
}

#[derive(Subcommand)]
enum OrderCmd {
    /// Place an order from PRODUCT_ID=QUANTITY pairs
    Create {
        #[arg(required = true, value_parser = parse_line)]
        lines: Vec<OrderLine>,
    },

    Show {
        id: OrderId,
    },

    /// List the acting user's orders, newest first
    List {
        #[arg(long)]
        page: Option<String>,

        #[arg(long)]
        page_size: Option<String>,
    },

    /// Cancel a pending order and restore its stock
    Cancel {
        id: OrderId,
    },

    /// Set an order's status (admin only)
    Status {
        id: OrderId,

        /// pending | processing | shipped | delivered | cancelled
        status: String,
    },
}

fn main() -> Result<()> {
    setup_tracing();

    let cli = Cli::parse();
    let config = Config::from_env().context("invalid configuration")?;
    let store = Arc::new(
        Store::open(&config)
            .with_context(|| format!("failed to open store at {}", config.db_path.display()))?,
    );

    match cli.cmd {
        Commands::NewUser => println!("{}", UserId::new()),
        Commands::Product { cmd } => run_product(&store, cmd)?,
        Commands::Order { user, admin, cmd } => {
            let user = user.context("--user is required for order commands")?;
            let principal = if admin {
                Principal::admin(user)
            } else {
                Principal::customer(user)
            };
            run_order(&store, &principal, cmd)?;
        }
    }

    store.flush()?;
    Ok(())
}

fn run_product(store: &Store, cmd: ProductCmd) -> Result<()> {
    let product = match cmd {
        ProductCmd::Add {
            name,
            price,
            stock,
            description,
        } => store.insert_product(
            NewProduct::new(name, price)
                .set_description(description)
                .set_stock(stock),
        )?,
        ProductCmd::Show { id } => store
            .product(id)?
            .ok_or(OrderError::ProductNotFound(id))?,
        ProductCmd::Reprice { id, price } => store.reprice_product(id, price)?,
        ProductCmd::Deactivate { id } => store.set_product_active(id, false)?,
    };

    println!(
        "{}  {}  price={}  stock={}  active={}",
        product.id, product.name, product.price, product.stock, product.is_active
    );
    Ok(())
}

fn run_order(store: &Arc<Store>, principal: &Principal, cmd: OrderCmd) -> Result<()> {
    let workflow = OrderWorkflow::new(Arc::clone(store));
    let queries = OrderQueryService::new(Arc::clone(store));

    match cmd {
        OrderCmd::Create { lines } => match workflow.create_order(principal, &lines) {
            Ok(details) => print_order(&details),
            Err(OrderError::InsufficientStock(shortfalls)) => {
                for s in &shortfalls {
                    eprintln!(
                        "{} ({}): requested {}, available {}",
                        s.product_name, s.product_id, s.requested, s.available
                    );
                }
                anyhow::bail!("insufficient stock for {} product(s)", shortfalls.len());
            }
            Err(err) => return Err(err.into()),
        },
        OrderCmd::Show { id } => print_order(&queries.get_order(principal, id)?),
        OrderCmd::List { page, page_size } => {
            let request = PageRequest::from_query(page.as_deref(), page_size.as_deref());
            let page = queries.list_orders(principal, request)?;
            println!(
                "page {}/{} ({} orders, {} per page)",
                page.page, page.total_pages, page.total_items, page.page_size
            );
            for details in &page.items {
                print_order(details);
            }
        }
        OrderCmd::Cancel { id } => print_order(&workflow.cancel_order(principal, id)?),
        OrderCmd::Status { id, status } => {
            print_order(&workflow.update_status(principal, id, &status)?)
        }
    }
    Ok(())
}

fn print_order(details: &OrderDetails) {
    let order = &details.order;
    println!(
        "{}  {}  total={}  created={}",
        order.id, order.status, order.total_amount, order.created_at
    );
    for line in &details.items {
        println!(
            "    {} x {} @ {}",
            line.item.quantity, line.product.name, line.item.price
        );
    }
}

fn parse_line(raw: &str) -> Result<OrderLine, String> {
    let (product, quantity) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected PRODUCT_ID=QUANTITY, got {raw:?}"))?;
    let product_id: ProductId = product.parse().map_err(|e| format!("{e}"))?;
    let quantity: u32 = quantity
        .trim()
        .parse()
        .map_err(|_| format!("quantity must be a positive integer, got {quantity:?}"))?;
    Ok(OrderLine::new(product_id, quantity))
}

fn setup_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
