use std::fmt::Write;

use anyhow::Result;
use quick_xml::escape::escape;

use crate::order::Order;

/// Renders the orders reloaded from an export into the companion page.
pub trait Transform {
    fn apply(&self, orders: &[Order]) -> Result<String>;
}

/// One table row per order: id, customer, goods and amount.
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlTable;

impl Transform for HtmlTable {
    fn apply(&self, orders: &[Order]) -> Result<String> {
        let mut html = String::new();
        writeln!(html, "<!DOCTYPE html>")?;
        writeln!(html, "<html>")?;
        writeln!(html, "<head><meta charset=\"utf-8\"><title>Orders</title></head>")?;
        writeln!(html, "<body>")?;
        writeln!(html, "<table>")?;
        writeln!(
            html,
            "<tr><th>Id</th><th>Customer</th><th>Goods</th><th>Amount</th></tr>"
        )?;

        for order in orders {
            let goods = order
                .details
                .iter()
                .map(|d| format!("{} x{}", d.goods.name, d.quantity))
                .collect::<Vec<String>>()
                .join(", ");
            writeln!(
                html,
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{:.2}</td></tr>",
                escape(&order.id),
                escape(&order.customer.name),
                escape(&goods),
                order.amount
            )?;
        }

        writeln!(html, "</table>")?;
        writeln!(html, "</body>")?;
        writeln!(html, "</html>")?;
        Ok(html)
    }
}
