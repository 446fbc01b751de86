use std::fs;
use std::path::Path;

use anyhow::anyhow;
use log::Level;
use registry::{Customer, Goods, Order, OrderDetail, OrderRegistry, RegistryError, Transform};
use tempfile::TempDir;

fn sample_orders() -> Vec<Order> {
    vec![
        Order::new(
            "1",
            Customer::new("c1", "Alice"),
            vec![
                OrderDetail::new(Goods::new("pen", 2.5), 3),
                OrderDetail::new(Goods::new("book", 30.0), 1),
            ],
        ),
        Order::new(
            "2",
            Customer::new("c2", "Bob & Sons"),
            vec![OrderDetail::new(Goods::new("ink", 12.25), 2)],
        ),
        Order::new("3", Customer::new("c3", "Carol"), vec![]),
    ]
}

fn registry_in(dir: &TempDir) -> OrderRegistry {
    let mut registry = OrderRegistry::new();
    registry.set_html_path(Some(dir.path().join("orders.html")));
    registry
}

struct FailingTransform;

impl Transform for FailingTransform {
    fn apply(&self, _orders: &[Order]) -> anyhow::Result<String> {
        Err(anyhow!("stylesheet unavailable"))
    }
}

#[test]
fn should_round_trip_orders_through_xml() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("orders.xml");

    let mut source = registry_in(&dir);
    for order in sample_orders() {
        source.add(order).unwrap();
    }

    let written = source.export(Some(file.as_path())).expect("failed to export");
    assert_eq!(written, file);

    let mut target = OrderRegistry::new();
    let added = target.import(&file).expect("failed to import");

    assert_eq!(added, sample_orders());
    assert_eq!(target.query_all(), source.query_all());
    assert_eq!(target.query_by_goods_name("pen").len(), 1);
}

#[test]
fn should_round_trip_names_with_spaces_and_markup() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("spaced.xml");
    let original = vec![
        Order::new(
            "1",
            Customer::new(" c1 ", "  Alice  "),
            vec![
                OrderDetail::new(Goods::new(" pen ", 2.5), 2),
                OrderDetail::new(Goods::new("<ink> & \"paper\" ]]>", 1.0), 1),
            ],
        ),
        Order::new(
            "2",
            Customer::new("c2", "\tBob\n"),
            vec![OrderDetail::new(Goods::new("   ", 0.1 + 0.2), 1)],
        ),
    ];

    let mut source = registry_in(&dir);
    for order in original.clone() {
        source.add(order).unwrap();
    }
    source.export(Some(file.as_path())).unwrap();

    let mut target = OrderRegistry::new();
    let added = target.import(&file).unwrap();

    assert_eq!(added, original);
    assert_eq!(target.query_by_customer_name("  Alice  ").len(), 1);
    assert!(target.query_by_customer_name("Alice").is_empty());
    assert_eq!(target.query_by_customer_name("\tBob\n").len(), 1);
    assert_eq!(target.query_by_goods_name(" pen ").len(), 1);
    assert_eq!(target.query_by_goods_name("   ").len(), 1);
}

#[test]
fn should_round_trip_empty_registry() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("empty.xml");

    registry_in(&dir).export(Some(file.as_path())).unwrap();

    let mut target = OrderRegistry::new();
    assert!(target.import(&file).unwrap().is_empty());
    assert!(target.is_empty());
}

#[test]
fn export_should_render_companion_page() {
    let dir = TempDir::new().unwrap();
    let mut registry = registry_in(&dir);
    for order in sample_orders() {
        registry.add(order).unwrap();
    }

    registry.export(Some(dir.path().join("orders.xml").as_path())).unwrap();

    let html = fs::read_to_string(dir.path().join("orders.html")).unwrap();
    assert_eq!(html.matches("<tr><td>").count(), 3);
    assert!(html.contains("Bob &amp; Sons"));
}

#[test]
fn export_without_html_path_writes_only_xml() {
    let dir = TempDir::new().unwrap();
    let mut registry = OrderRegistry::new();
    registry.set_html_path(None);
    registry.add(sample_orders().remove(0)).unwrap();

    registry.export(Some(dir.path().join("orders.xml").as_path())).unwrap();

    assert!(dir.path().join("orders.xml").is_file());
    assert!(!dir.path().join("orders.html").exists());
}

#[test]
fn failed_companion_page_is_logged_and_export_survives() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("orders.xml");
    let mut registry = registry_in(&dir);
    registry.set_transform(Box::new(FailingTransform));
    for order in sample_orders() {
        registry.add(order).unwrap();
    }

    testing_logger::setup();
    let written = registry.export(Some(file.as_path()));

    assert!(written.is_ok());
    assert!(!dir.path().join("orders.html").exists());

    testing_logger::validate(|captured_logs| {
        let errors: Vec<&String> = captured_logs
            .iter()
            .filter(|log| matches!(log.level, Level::Error))
            .map(|log| &log.body)
            .collect();

        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("stylesheet unavailable"));
    });

    let mut target = OrderRegistry::new();
    assert_eq!(target.import(&file).unwrap().len(), 3);
}

#[test]
fn export_without_file_name_uses_timestamp() {
    let mut registry = OrderRegistry::new();
    registry.set_html_path(None);

    let written = registry.export(None).unwrap();
    let name = written.to_str().unwrap().to_string();
    let exists = written.is_file();
    fs::remove_file(&written).unwrap();

    assert!(exists);
    assert!(name.starts_with("orders_"));
    assert!(name.ends_with(".xml"));
    assert_eq!(name.trim_end_matches(".xml").split('_').count(), 7);
}

#[test]
fn import_should_skip_existing_orders() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("orders.xml");

    let mut source = registry_in(&dir);
    for order in sample_orders() {
        source.add(order).unwrap();
    }
    source.export(Some(file.as_path())).unwrap();

    let mut target = OrderRegistry::new();
    let existing = Order::new(
        "2",
        Customer::new("c9", "Dave"),
        vec![OrderDetail::new(Goods::new("stamp", 1.0), 1)],
    );
    target.add(existing.clone()).unwrap();

    let added = target.import(&file).unwrap();

    let added_ids: Vec<&str> = added.iter().map(|o| o.id.as_str()).collect();
    assert_eq!(added_ids, vec!["1", "3"]);
    assert_eq!(target.len(), 3);
    assert_eq!(target.get_by_id(2), Some(&existing));

    // a second import adds nothing
    assert!(target.import(&file).unwrap().is_empty());
}

#[test]
fn import_should_reject_non_xml_without_reading() {
    let dir = TempDir::new().unwrap();
    let json = dir.path().join("data.json");
    fs::write(&json, "[]").unwrap();

    let mut registry = OrderRegistry::new();
    let error = registry.import(&json).unwrap_err();

    assert!(matches!(error, RegistryError::InvalidFormat(ref path) if path == &json));
    assert!(registry.is_empty());
}

fn write_document(path: &Path, orders: &str) {
    fs::write(
        path,
        format!("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<ArrayOfOrder>{orders}</ArrayOfOrder>"),
    )
    .unwrap();
}

#[test]
fn import_should_read_hand_written_document() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("hand.xml");
    write_document(
        &file,
        "<Order><Id>10</Id><Customer><Id>c1</Id><Name>Ann</Name></Customer>\
         <Detail><Goods><Name>pen</Name><Price>1.5</Price></Goods><Quantity>2</Quantity></Detail>\
         <Amount>3</Amount></Order>",
    );

    let mut registry = OrderRegistry::new();
    let added = registry.import(&file).unwrap();

    assert_eq!(
        added,
        vec![Order::new(
            "10",
            Customer::new("c1", "Ann"),
            vec![OrderDetail::new(Goods::new("pen", 1.5), 2)],
        )]
    );
    assert_eq!(registry.query_by_customer_name("Ann").len(), 1);
}

#[test]
fn import_with_invalid_id_has_no_partial_effect() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("broken.xml");
    write_document(
        &file,
        "<Order><Id>1</Id><Customer><Id>c1</Id><Name>Ann</Name></Customer><Amount>1</Amount></Order>\
         <Order><Id>two</Id><Customer><Id>c2</Id><Name>Ben</Name></Customer><Amount>2</Amount></Order>",
    );

    let mut registry = OrderRegistry::new();
    let error = registry.import(&file).unwrap_err();

    assert!(matches!(error, RegistryError::InvalidId(ref id) if id == "two"));
    assert!(registry.is_empty());
}
