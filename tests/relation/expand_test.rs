use std::sync::Arc;

use odoo_rpc::error::{Error, ErrorKind};
use odoo_rpc::record::{Batch, Record};
use odoo_rpc::relation::{MissingMatch, RelationResolver, ResolutionPolicy};
use odoo_rpc::transport::protocol::methods;
use odoo_rpc::transport::{MockTransport, RemoteFault};
use serde_json::json;

fn service() -> MockTransport {
    MockTransport::new()
        .with_relation("res.users", "company_id", "many2one", "res.company")
        .with_relation("res.partner", "category_id", "many2many", "res.partner.category")
        .with_relation("res.partner", "company_id", "many2one", "res.company")
        .with_record("res.company", json!({"id": 3, "name": "Acme"}))
        .with_record("res.company", json!({"id": 4, "name": "Globex"}))
        .with_record("res.partner.category", json!({"id": 4, "name": "VIP"}))
        .with_record("res.partner.category", json!({"id": 5, "name": "Supplier"}))
}

fn fields(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

fn user(id: i64, company: serde_json::Value) -> Record {
    Record::new(id).with("login", format!("user{id}")).with("company_id", company)
}

#[tokio::test]
async fn test_expand_single_reference() {
    let resolver = RelationResolver::new(Arc::new(service()));
    let record = user(7, json!([3, "Acme"]));

    let expanded = resolver
        .expand_one("res.users", record, &fields(&["company_id"]))
        .await
        .unwrap();

    assert_eq!(expanded.id, 7);
    assert_eq!(expanded.get("login"), Some(&json!("user7")));
    assert_eq!(expanded.get("company_id"), Some(&json!({"id": 3, "name": "Acme"})));
}

#[tokio::test]
async fn test_expand_preserves_batch_shape() {
    let resolver = RelationResolver::new(Arc::new(service()));

    let one = resolver
        .expand("res.users", Batch::from(user(7, json!([3, "Acme"]))), &fields(&["company_id"]))
        .await
        .unwrap();
    let many = resolver
        .expand(
            "res.users",
            Batch::from(vec![user(7, json!([3, "Acme"]))]),
            &fields(&["company_id"]),
        )
        .await
        .unwrap();

    assert!(!one.is_many());
    assert!(many.is_many());
    assert_eq!(many.len(), 1);
    assert_eq!(
        one.into_one().unwrap().get("company_id"),
        many.into_many().unwrap()[0].get("company_id")
    );
}

#[tokio::test]
async fn test_expand_batches_one_fetch_per_field() {
    let mock = Arc::new(service());
    let resolver = RelationResolver::new(mock.clone());
    let users = vec![
        user(1, json!([4, "Globex"])),
        user(2, json!([3, "Acme"])),
        user(3, json!([4, "Globex"])),
    ];

    let expanded = resolver
        .expand_many("res.users", users, &fields(&["company_id"]))
        .await
        .unwrap();

    let names: Vec<_> = expanded
        .iter()
        .map(|record| record.get("company_id").unwrap()["name"].clone())
        .collect();
    assert_eq!(names, vec![json!("Globex"), json!("Acme"), json!("Globex")]);

    let reads: Vec<_> = mock
        .calls()
        .into_iter()
        .filter(|call| call.model == "res.company" && call.method == methods::READ)
        .collect();
    assert_eq!(reads.len(), 1);
    assert_eq!(reads[0].args, vec![json!([4, 3])]);
}

#[tokio::test]
async fn test_multiple_follows_record_id_order() {
    let resolver = RelationResolver::new(Arc::new(service()));
    let partner = Record::new(10).with("category_id", json!([5, 4]));

    let expanded = resolver
        .expand_one("res.partner", partner, &fields(&["category_id"]))
        .await
        .unwrap();

    assert_eq!(
        expanded.get("category_id"),
        Some(&json!([
            {"id": 5, "name": "Supplier"},
            {"id": 4, "name": "VIP"}
        ]))
    );
}

#[tokio::test]
async fn test_expand_several_fields() {
    let mock = Arc::new(service());
    let resolver = RelationResolver::new(mock.clone());
    let partner = Record::new(10)
        .with("company_id", json!([3, "Acme"]))
        .with("category_id", json!([4]));

    let expanded = resolver
        .expand_one("res.partner", partner, &fields(&["company_id", "category_id"]))
        .await
        .unwrap();

    assert_eq!(expanded.get("company_id").unwrap()["name"], json!("Acme"));
    assert_eq!(expanded.get("category_id").unwrap()[0]["name"], json!("VIP"));
    assert_eq!(mock.call_count("res.company", methods::READ), 1);
    assert_eq!(mock.call_count("res.partner.category", methods::READ), 1);
}

#[tokio::test]
async fn test_empty_references_are_untouched() {
    let mock = Arc::new(service());
    let resolver = RelationResolver::new(mock.clone());
    let partners = vec![
        Record::new(1).with("company_id", false).with("category_id", json!([])),
        Record::new(2),
    ];

    let expanded = resolver
        .expand_many("res.partner", partners, &fields(&["company_id", "category_id"]))
        .await
        .unwrap();

    assert_eq!(expanded[0].get("company_id"), Some(&json!(false)));
    assert_eq!(expanded[0].get("category_id"), Some(&json!([])));
    assert_eq!(expanded[1].get("company_id"), None);
    assert_eq!(mock.call_count("res.company", methods::READ), 0);
    assert_eq!(mock.call_count("res.partner.category", methods::READ), 0);
}

#[tokio::test]
async fn test_expanding_twice_is_a_no_op() {
    let mock = Arc::new(service());
    let resolver = RelationResolver::new(mock.clone());
    let partner = Record::new(10)
        .with("company_id", json!([3, "Acme"]))
        .with("category_id", json!([4, 5]));
    let names = fields(&["company_id", "category_id"]);

    let once = resolver
        .expand_one("res.partner", partner, &names)
        .await
        .unwrap();
    let twice = resolver
        .expand_one("res.partner", once.clone(), &names)
        .await
        .unwrap();

    assert_eq!(once, twice);
    assert_eq!(mock.call_count("res.company", methods::READ), 1);
    assert_eq!(mock.call_count("res.partner.category", methods::READ), 1);
}

#[tokio::test]
async fn test_missing_match_is_omitted_by_default() {
    let resolver = RelationResolver::new(Arc::new(service()));
    let partner = Record::new(10)
        .with("company_id", json!([99, "Gone"]))
        .with("category_id", json!([4, 98, 5]));

    let expanded = resolver
        .expand_one("res.partner", partner, &fields(&["company_id", "category_id"]))
        .await
        .unwrap();

    assert_eq!(expanded.get("company_id"), Some(&json!(null)));
    assert_eq!(
        expanded.get("category_id"),
        Some(&json!([
            {"id": 4, "name": "VIP"},
            {"id": 5, "name": "Supplier"}
        ]))
    );
}

#[tokio::test]
async fn test_missing_match_fails_when_strict() {
    let policy = ResolutionPolicy {
        on_missing_match: MissingMatch::Fail,
        ..ResolutionPolicy::default()
    };
    let resolver = RelationResolver::with_policy(Arc::new(service()), policy);

    let single = resolver
        .expand_one("res.users", user(7, json!([99, "Gone"])), &fields(&["company_id"]))
        .await
        .unwrap_err();
    let multiple = resolver
        .expand_one(
            "res.partner",
            Record::new(10).with("category_id", json!([4, 98])),
            &fields(&["category_id"]),
        )
        .await
        .unwrap_err();

    assert!(matches!(single, Error::NotFound { ref model, .. } if model == "res.company"));
    match multiple {
        Error::NotFound { model, domain } => {
            assert_eq!(model, "res.partner.category");
            assert_eq!(domain.to_string(), r#"[["id","in",[98]]]"#);
        }
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn test_one_failing_field_fails_everything() {
    let mock = service().with_failure(
        "res.partner.category",
        methods::READ,
        RemoteFault::new(200, "Odoo Server Error"),
    );
    let resolver = RelationResolver::new(Arc::new(mock));
    let partner = Record::new(10)
        .with("company_id", json!([3, "Acme"]))
        .with("category_id", json!([4]));

    let err = resolver
        .expand_one("res.partner", partner, &fields(&["company_id", "category_id"]))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::RemoteError);
}

#[tokio::test]
async fn test_unexpected_raw_value_is_malformed() {
    let resolver = RelationResolver::new(Arc::new(service()));

    let err = resolver
        .expand_one("res.users", user(7, json!("Acme")), &fields(&["company_id"]))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::MalformedInput);
}
