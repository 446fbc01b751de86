pub mod error;
pub mod export;
pub mod order;
pub mod order_registry;

pub use error::RegistryError;
pub use export::{timestamped_file_name, HtmlTable, Transform};
pub use order::{Customer, Goods, Order, OrderDetail};
pub use order_registry::OrderRegistry;
