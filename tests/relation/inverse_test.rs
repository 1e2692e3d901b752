//! Collapsing natural keys on write and expanding ids on read recover the
//! same natural keys.

use std::sync::Arc;

use odoo_rpc::prelude::*;
use serde_json::{json, Value};

fn service() -> Arc<MockTransport> {
    Arc::new(
        MockTransport::new()
            .with_relation("res.partner", "company_id", "many2one", "res.company")
            .with_relation("res.partner", "category_id", "many2many", "res.partner.category")
            .with_record("res.company", json!({"id": 3, "name": "Acme"}))
            .with_record("res.company", json!({"id": 4, "name": "Globex"}))
            .with_record("res.partner.category", json!({"id": 4, "name": "VIP"}))
            .with_record("res.partner.category", json!({"id": 5, "name": "Supplier"}))
            .with_record("res.partner.category", json!({"id": 6, "name": "Reseller"})),
    )
}

fn values(value: Value) -> Values {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {other}"),
    }
}

#[tokio::test]
async fn test_single_relation_round_trip() {
    let client = OdooClient::new(service());
    let specs = [RelationSpec::new("company_id", "name").with_alias("company")];

    let id = client
        .create(
            "res.partner",
            &values(json!({"name": "Ada", "company": "Globex"})),
            &specs,
        )
        .await
        .unwrap();
    let partner = client
        .read("res.partner", id, &ReadOptions::new().resolve(["company_id"]))
        .await
        .unwrap();

    assert_eq!(partner.get("company_id").unwrap()["name"], json!("Globex"));
}

#[tokio::test]
async fn test_multiple_relation_round_trip() {
    let client = OdooClient::new(service());
    let specs = [RelationSpec::new("category_id", "name").with_alias("tags")];
    let tags = json!(["Reseller", "VIP"]);

    let id = client
        .create(
            "res.partner",
            &values(json!({"name": "Ada", "tags": tags})),
            &specs,
        )
        .await
        .unwrap();
    let partner = client
        .read("res.partner", id, &ReadOptions::new().resolve(["category_id"]))
        .await
        .unwrap();

    let names: Vec<Value> = partner
        .get("category_id")
        .and_then(Value::as_array)
        .unwrap()
        .iter()
        .map(|tag| tag["name"].clone())
        .collect();
    assert_eq!(Value::Array(names), tags);
}

#[tokio::test]
async fn test_round_trip_through_write() {
    let mock = service();
    let client = OdooClient::new(mock.clone());
    let specs = [
        RelationSpec::new("company_id", "name"),
        RelationSpec::new("category_id", "name"),
    ];

    let id = client
        .create(
            "res.partner",
            &values(json!({"name": "Ada", "company_id": "Acme", "category_id": ["VIP"]})),
            &specs,
        )
        .await
        .unwrap();
    client
        .write(
            "res.partner",
            id,
            &values(json!({"company_id": "Globex", "category_id": ["Supplier", "Reseller"]})),
            &specs,
        )
        .await
        .unwrap();

    let stored = mock.records("res.partner");
    assert_eq!(stored[0]["company_id"], json!(4));
    assert_eq!(stored[0]["category_id"], json!([5, 6]));

    let partner = client
        .read(
            "res.partner",
            id,
            &ReadOptions::new().resolve(["company_id", "category_id"]),
        )
        .await
        .unwrap();
    assert_eq!(partner.get("company_id").unwrap()["name"], json!("Globex"));
    assert_eq!(partner.get("category_id").unwrap()[1]["name"], json!("Reseller"));
}
