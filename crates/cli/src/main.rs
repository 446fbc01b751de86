use std::env;
use std::ffi::OsStr;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use log::LevelFilter;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use registry::{Customer, Goods, Order, OrderDetail, OrderRegistry};
use serde::Serialize;

const COMMANDS: [&str; 8] = [
    "list",
    "get <id>",
    "add <id> <customer> <goods> <price> [quantity]",
    "remove <id>",
    "find customer|goods|price <value>",
    "update-customer <id> <name>",
    "export [file]",
    "import <file>",
];

#[derive(Debug, PartialEq)]
enum Command {
    List,
    Get(i64),
    Add(Order),
    Remove(i64),
    FindByCustomer(String),
    FindByGoods(String),
    FindByPrice(f64),
    UpdateCustomer(i64, Customer),
    Export(Option<PathBuf>),
    Import(PathBuf),
}

impl Command {
    fn mutates(&self) -> bool {
        matches!(
            self,
            Command::Add(_)
                | Command::Remove(_)
                | Command::UpdateCustomer(..)
                | Command::Import(_)
        )
    }
}

#[derive(Debug, Serialize)]
struct ImportSummary<'a> {
    file: &'a str,
    added: &'a [Order],
}

fn parse_id(arg: Option<&String>) -> Result<i64> {
    let arg = arg.ok_or_else(|| anyhow!("Order id is required"))?;
    arg.parse::<i64>()
        .with_context(|| format!("{arg} is not a valid order id"))
}

fn required<'a>(arg: Option<&'a String>, usage: &str) -> Result<&'a String> {
    arg.ok_or_else(|| anyhow!("Invalid usage! Example: {usage}"))
}

fn parse_command(args: &[String]) -> Result<Option<Command>> {
    let Some(name) = args.first() else {
        return Ok(None);
    };

    let command = match name.as_str() {
        "list" => Command::List,
        "get" => Command::Get(parse_id(args.get(1))?),
        "add" => {
            let usage = "add 1 alice pen 2.5 [[price]] 3 [[quantity]] (default: 1)";
            let id = parse_id(args.get(1))?;
            let customer = required(args.get(2), usage)?;
            let goods = required(args.get(3), usage)?;
            let price = required(args.get(4), usage)?
                .parse::<f64>()
                .context("Please provide a number for price")?;
            let quantity = match args.get(5) {
                Some(q) => q
                    .parse::<u32>()
                    .context("Please provide a number for quantity")?,
                None => 1,
            };
            Command::Add(Order::new(
                id.to_string(),
                Customer::new(customer.clone(), customer.clone()),
                vec![OrderDetail::new(Goods::new(goods.clone(), price), quantity)],
            ))
        }
        "remove" => Command::Remove(parse_id(args.get(1))?),
        "find" => {
            let usage = "find customer alice | find goods pen | find price 100";
            let value = required(args.get(2), usage)?;
            match required(args.get(1), usage)?.as_str() {
                "customer" => Command::FindByCustomer(value.clone()),
                "goods" => Command::FindByGoods(value.clone()),
                "price" => Command::FindByPrice(
                    value
                        .parse::<f64>()
                        .context("Please provide a number for price")?,
                ),
                other => bail!("Unknown filter {other}. Example: {usage}"),
            }
        }
        "update-customer" => {
            let id = parse_id(args.get(1))?;
            let name = required(args.get(2), "update-customer 1 bob")?;
            Command::UpdateCustomer(id, Customer::new(name.clone(), name.clone()))
        }
        "export" => Command::Export(args.get(1).map(PathBuf::from)),
        "import" => Command::Import(PathBuf::from(required(args.get(1), "import orders.xml")?)),
        other => bail!("Unknown command {other}"),
    };

    Ok(Some(command))
}

fn print_orders(orders: &[Order]) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(orders)?);
    Ok(())
}

fn run(registry: &mut OrderRegistry, command: Command) -> Result<()> {
    match command {
        Command::List => print_orders(&registry.query_all())?,
        Command::Get(id) => match registry.get_by_id(id) {
            Some(order) => println!("{}", serde_json::to_string_pretty(order)?),
            None => println!("order-{id} does not exist"),
        },
        Command::Add(order) => registry.add(order)?,
        Command::Remove(id) => {
            if registry.remove(id).is_none() {
                log::warn!("order-{id} was not registered");
            }
        }
        Command::FindByCustomer(name) => print_orders(&registry.query_by_customer_name(&name))?,
        Command::FindByGoods(name) => print_orders(&registry.query_by_goods_name(&name))?,
        Command::FindByPrice(price) => print_orders(&registry.query_by_price(price))?,
        Command::UpdateCustomer(id, customer) => registry.update_customer(id, customer)?,
        Command::Export(file) => {
            registry.set_html_path(Some(PathBuf::from(registry::export::DEFAULT_HTML_FILE)));
            let written = registry.export(file.as_deref())?;
            println!("Exported to {}", written.display());
        }
        Command::Import(file) => {
            let added = registry.import(&file)?;
            let file_name = file.to_string_lossy();
            let summary = ImportSummary {
                file: &file_name,
                added: &added,
            };
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }
    Ok(())
}

/// The state file is reloaded through `import`, which only reads `.xml` files.
fn state_store(orders_file: Option<String>) -> Result<db::XmlStore> {
    let store = db::XmlStore::new(orders_file.map(PathBuf::from));
    if store.path().extension().and_then(OsStr::to_str) != Some("xml") {
        bail!(
            "ORDERS_FILE must end with .xml, got {}",
            store.path().display()
        );
    }
    Ok(store)
}

fn init_logging(level: &str) -> Result<()> {
    let level = level.parse::<LevelFilter>().unwrap_or(LevelFilter::Info);
    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} {l} {t} - {m}{n}",
        )))
        .build();
    let config = Config::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr)))
        .build(Root::builder().appender("stderr").build(level))?;
    log4rs::init_config(config)?;
    Ok(())
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    init_logging(&dotenv::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()))?;

    let args: Vec<String> = env::args().skip(1).collect();
    let command = match parse_command(&args)? {
        Some(command) => command,
        None => {
            for cmd in COMMANDS {
                println!("Command={cmd}");
            }
            return Ok(());
        }
    };

    let state = state_store(dotenv::var("ORDERS_FILE").ok())?;
    let mut registry = OrderRegistry::new();
    registry.set_html_path(None);
    if state.exists() {
        registry.import(state.path())?;
    }

    let mutates = command.mutates();
    run(&mut registry, command)?;

    if mutates {
        registry.set_html_path(None);
        registry.export(Some(state.path()))?;
    }
    Ok(())
}
