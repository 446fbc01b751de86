use std::collections::btree_map::Entry;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{Datelike, Local, Timelike};
use db::XmlStore;
use serde::{Deserialize, Serialize};

use crate::error::RegistryError;
use crate::order::Order;
use crate::order_registry::OrderRegistry;

mod html;

pub use html::{HtmlTable, Transform};

pub const DEFAULT_HTML_FILE: &str = "orders.html";

/// Document root of an export.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename = "ArrayOfOrder")]
struct OrderList {
    #[serde(rename = "Order", default)]
    orders: Vec<Order>,
}

pub(crate) struct Companion {
    pub(crate) html_path: Option<PathBuf>,
    pub(crate) transform: Box<dyn Transform>,
}

impl Default for Companion {
    fn default() -> Self {
        Self {
            html_path: Some(PathBuf::from(DEFAULT_HTML_FILE)),
            transform: Box::new(HtmlTable),
        }
    }
}

impl Companion {
    fn render(&self, store: &XmlStore, html_path: &Path) -> anyhow::Result<()> {
        let list: OrderList = store.get()?;
        let html = self.transform.apply(&list.orders)?;
        fs::write(html_path, html)
            .with_context(|| format!("Failed to write {}", html_path.display()))
    }
}

/// `orders_{year}_{month}_{day}_{hour}_{minute}_{second}.xml`, unpadded.
pub fn timestamped_file_name<T>(time: &T) -> String
where
    T: Datelike + Timelike,
{
    format!(
        "orders_{}_{}_{}_{}_{}_{}.xml",
        time.year(),
        time.month(),
        time.day(),
        time.hour(),
        time.minute(),
        time.second()
    )
}

impl OrderRegistry {
    /// Writes every order to `file_name`, or to a timestamped file in the
    /// working directory, and returns the path written.
    ///
    /// The HTML companion page is rendered afterwards from the written file.
    /// Its failures are logged and do not fail the export.
    pub fn export(&self, file_name: Option<&Path>) -> Result<PathBuf, RegistryError> {
        let path = match file_name {
            Some(file_name) => file_name.to_path_buf(),
            None => PathBuf::from(timestamped_file_name(&Local::now())),
        };

        let store = XmlStore::new(Some(path.clone()));
        store.set(&OrderList {
            orders: self.query_all(),
        })?;
        log::info!("exported {} orders to {}", self.len(), path.display());

        if let Some(html_path) = &self.companion.html_path {
            match self.companion.render(&store, html_path) {
                Ok(()) => log::info!("rendered {}", html_path.display()),
                Err(error) => log::error!(
                    "failed to render {} from {}: {error:#}",
                    html_path.display(),
                    path.display()
                ),
            }
        }

        Ok(path)
    }

    /// Merges the orders stored at `path` and returns the ones that were
    /// added. Orders whose id is already registered are left untouched.
    pub fn import(&mut self, path: impl AsRef<Path>) -> Result<Vec<Order>, RegistryError> {
        let path = path.as_ref();
        if path.extension().and_then(OsStr::to_str) != Some("xml") {
            return Err(RegistryError::InvalidFormat(path.to_path_buf()));
        }

        let list: OrderList = XmlStore::new(Some(path.to_path_buf())).get()?;
        let total = list.orders.len();
        let keyed = list
            .orders
            .into_iter()
            .map(|order| order.key().map(|key| (key, order)))
            .collect::<Result<Vec<(i64, Order)>, RegistryError>>()?;

        let mut added = Vec::new();
        for (key, order) in keyed {
            match self.orders.entry(key) {
                Entry::Vacant(slot) => {
                    slot.insert(order.clone());
                    added.push(order);
                }
                Entry::Occupied(_) => log::debug!("skipped order-{key}, already registered"),
            }
        }

        log::info!(
            "imported {} of {} orders from {}",
            added.len(),
            total,
            path.display()
        );
        Ok(added)
    }
}
