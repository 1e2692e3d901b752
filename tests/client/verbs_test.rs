use std::sync::Arc;

use odoo_rpc::prelude::*;
use odoo_rpc::transport::protocol::methods;
use serde_json::{json, Map, Value};

fn service() -> Arc<MockTransport> {
    Arc::new(
        MockTransport::new()
            .with_relation("res.partner", "company_id", "many2one", "res.company")
            .with_record("res.company", json!({"id": 3, "name": "Acme"}))
            .with_record(
                "res.partner",
                json!({"id": 10, "name": "Ada", "is_company": false, "company_id": [3, "Acme"]}),
            )
            .with_record(
                "res.partner",
                json!({"id": 11, "name": "Grace", "is_company": false, "company_id": false}),
            )
            .with_record(
                "res.partner",
                json!({"id": 12, "name": "Acme", "is_company": true, "company_id": [3, "Acme"]}),
            ),
    )
}

fn values(value: Value) -> Values {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {other}"),
    }
}

#[tokio::test]
async fn test_read_with_fields_and_resolve() {
    let mock = service();
    let client = OdooClient::new(mock.clone());

    let partner = client
        .read(
            "res.partner",
            10,
            &ReadOptions::new().fields(["name", "company_id"]).resolve(["company_id"]),
        )
        .await
        .unwrap();

    assert_eq!(partner.get("name"), Some(&json!("Ada")));
    assert_eq!(partner.get("is_company"), None);
    assert_eq!(partner.get("company_id"), Some(&json!({"id": 3, "name": "Acme"})));

    let read = &mock.calls()[0];
    assert_eq!(read.method, methods::READ);
    assert_eq!(read.args, vec![json!([10])]);
    assert_eq!(read.kwargs["fields"], json!(["name", "company_id"]));
}

#[tokio::test]
async fn test_extra_kwargs_are_passed_verbatim() {
    let mock = service();
    let client = OdooClient::new(mock.clone());

    client
        .read(
            "res.partner",
            10,
            &ReadOptions::new().extra("context", json!({"lang": "fr_FR"})),
        )
        .await
        .unwrap();

    let read = &mock.calls()[0];
    assert_eq!(Value::Object(read.kwargs.clone()), json!({"context": {"lang": "fr_FR"}}));
}

#[tokio::test]
async fn test_read_many_not_found_carries_ids() {
    let client = OdooClient::new(service());

    let err = client
        .read_many("res.partner", &[98, 99], &ReadOptions::new())
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        r#"[["id","in",[98,99]]] not found on model: res.partner"#
    );
}

#[tokio::test]
async fn test_read_many_keeps_service_order() {
    let client = OdooClient::new(service());

    let partners = client
        .read_many("res.partner", &[11, 10], &ReadOptions::new().resolve(["company_id"]))
        .await
        .unwrap();

    assert_eq!(partners.len(), 2);
    assert_eq!(partners[0].id, 10);
    assert_eq!(partners[0].get("company_id").unwrap()["name"], json!("Acme"));
    assert_eq!(partners[1].get("company_id"), Some(&json!(false)));
}

#[tokio::test]
async fn test_list_sends_paging_defaults() {
    let mock = service();
    let client = OdooClient::new(mock.clone());

    let partners = client.list("res.partner", &ListOptions::new()).await.unwrap();

    assert_eq!(partners.len(), 3);
    let call = &mock.calls()[0];
    assert_eq!(call.method, methods::SEARCH_READ);
    assert_eq!(call.args, vec![json!([])]);
    assert_eq!(call.kwargs["offset"], json!(0));
    assert_eq!(call.kwargs["limit"], json!(100));
}

#[tokio::test]
async fn test_list_pages() {
    let client = OdooClient::new(service());

    let page = client
        .list("res.partner", &ListOptions::new().offset(1).limit(1))
        .await
        .unwrap();

    assert_eq!(page.len(), 1);
    assert_eq!(page[0].id, 11);
}

#[tokio::test]
async fn test_list_empty_model_is_not_found() {
    let client = OdooClient::new(service());

    let err = client.list("res.bank", &ListOptions::new()).await.unwrap_err();

    match err {
        Error::NotFound { model, domain } => {
            assert_eq!(model, "res.bank");
            assert!(domain.is_empty());
        }
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn test_search_ids_and_id() {
    let client = OdooClient::new(service());
    let people = Domain::eq("is_company", false);

    let ids = client
        .search_ids("res.partner", &people, &Map::new())
        .await
        .unwrap();
    let first = client
        .search_id("res.partner", &people, &Map::new())
        .await
        .unwrap();

    assert_eq!(ids, vec![10, 11]);
    assert_eq!(first, 10);
}

#[tokio::test]
async fn test_search_ids_not_found_names_domain_and_model() {
    let client = OdooClient::new(service());
    let domain = Domain::eq("name", "Nobody");

    let err = client
        .search_ids("res.partner", &domain, &Map::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
    match err {
        Error::NotFound { model, domain: sent } => {
            assert_eq!(model, "res.partner");
            assert_eq!(sent, domain);
        }
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn test_search_one_and_many() {
    let client = OdooClient::new(service());
    let with_company = Domain::eq("company_id", 3);
    let options = ReadOptions::new().fields(["name", "company_id"]).resolve(["company_id"]);

    let one = client
        .search_one("res.partner", &with_company, &options)
        .await
        .unwrap();
    let many = client
        .search_many("res.partner", &with_company, &options)
        .await
        .unwrap();

    assert_eq!(one.id, 10);
    assert_eq!(one.get("company_id").unwrap()["name"], json!("Acme"));
    assert_eq!(many.iter().map(|r| r.id).collect::<Vec<_>>(), vec![10, 12]);
}

#[tokio::test]
async fn test_search_with_or_domain() {
    let client = OdooClient::new(service());
    let domain = Domain::eq("name", "Grace").or(Domain::eq("is_company", true));

    let ids = client
        .search_ids("res.partner", &domain, &Map::new())
        .await
        .unwrap();

    assert_eq!(ids, vec![11, 12]);
}

#[tokio::test]
async fn test_create_returns_id_not_values() {
    let mock = service();
    let client = OdooClient::new(mock.clone());
    let specs = [RelationSpec::new("company_id", "name")];

    let id = client
        .create(
            "res.partner",
            &values(json!({"name": "Linus", "company_id": "Acme"})),
            &specs,
        )
        .await
        .unwrap();

    let created = mock
        .records("res.partner")
        .into_iter()
        .find(|row| row["id"] == json!(id))
        .unwrap();
    assert_eq!(created["name"], json!("Linus"));
    assert_eq!(created["company_id"], json!(3));
}

#[tokio::test]
async fn test_write_accepts_one_or_many_ids() {
    let mock = service();
    let client = OdooClient::new(mock.clone());
    let rename = values(json!({"name": "Renamed"}));

    assert!(client.write("res.partner", 10_i64, &rename, &[]).await.unwrap());
    assert!(client.write("res.partner", [11_i64, 12], &rename, &[]).await.unwrap());

    let writes: Vec<_> = mock
        .calls()
        .into_iter()
        .filter(|call| call.method == methods::WRITE)
        .map(|call| call.args[0].clone())
        .collect();
    assert_eq!(writes, vec![json!([10]), json!([11, 12])]);
    assert!(mock
        .records("res.partner")
        .iter()
        .all(|row| row["name"] == json!("Renamed")));
}

#[tokio::test]
async fn test_search_and_write_returns_matched_ids() {
    let mock = service();
    let client = OdooClient::new(mock.clone());

    let ids = client
        .search_and_write(
            "res.partner",
            &Domain::eq("is_company", false),
            &values(json!({"comment": "person"})),
            &[],
            &Map::new(),
        )
        .await
        .unwrap();

    assert_eq!(ids, vec![10, 11]);
    let commented: Vec<_> = mock
        .records("res.partner")
        .into_iter()
        .filter(|row| row.get("comment") == Some(&json!("person")))
        .collect();
    assert_eq!(commented.len(), 2);
}

#[tokio::test]
async fn test_search_and_write_without_match_writes_nothing() {
    let mock = service();
    let client = OdooClient::new(mock.clone());

    let err = client
        .search_and_write(
            "res.partner",
            &Domain::eq("name", "Nobody"),
            &values(json!({"comment": "x"})),
            &[],
            &Map::new(),
        )
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(mock.call_count("res.partner", methods::WRITE), 0);
}

#[tokio::test]
async fn test_unlink() {
    let mock = service();
    let client = OdooClient::new(mock.clone());

    assert!(client.unlink("res.partner", vec![10_i64, 11]).await.unwrap());

    let remaining: Vec<_> = mock
        .records("res.partner")
        .iter()
        .map(|row| row["id"].clone())
        .collect();
    assert_eq!(remaining, vec![json!(12)]);
}

#[tokio::test]
async fn test_send_message_posts_comment() {
    let mock = service();
    let client = OdooClient::new(mock.clone());

    let message_id = client
        .send_message("res.partner", 10, "Welcome aboard")
        .await
        .unwrap();

    let message = mock
        .records("mail.message")
        .into_iter()
        .find(|row| row["id"] == json!(message_id))
        .unwrap();
    assert_eq!(message["body"], json!("Welcome aboard"));
    assert_eq!(message["subtype"], json!("mail.mt_comment"));
    assert_eq!(message["message_type"], json!("comment"));
    assert_eq!(message["res_id"], json!(10));
}

#[tokio::test]
async fn test_call_passthrough_and_remote_fault() {
    let client = OdooClient::new(service());

    let count = client
        .call("res.partner", methods::SEARCH, vec![json!([])], Map::new())
        .await
        .unwrap();
    let err = client
        .call("res.partner", "no_such_method", vec![], Map::new())
        .await
        .unwrap_err();

    assert_eq!(count, json!([10, 11, 12]));
    assert_eq!(err.kind(), ErrorKind::RemoteError);
    assert_eq!(
        err.remote_fault().and_then(|fault| fault.exception_name()),
        Some("builtins.AttributeError")
    );
}

#[tokio::test]
async fn test_client_policy_reaches_expansion() {
    let mock = Arc::new(
        MockTransport::new()
            .with_relation("res.partner", "company_id", "many2one", "res.company")
            .with_record(
                "res.partner",
                json!({"id": 10, "name": "Ada", "company_id": [99, "Gone"]}),
            ),
    );
    let lenient = OdooClient::new(mock.clone());
    let strict = OdooClient::with_policy(mock, ResolutionPolicy::strict());
    let options = ReadOptions::new().resolve(["company_id"]);

    let partner = lenient.read("res.partner", 10, &options).await.unwrap();
    let err = strict.read("res.partner", 10, &options).await.unwrap_err();

    assert_eq!(partner.get("company_id"), Some(&Value::Null));
    assert_eq!(strict.resolver().policy(), ResolutionPolicy::strict());
    assert!(matches!(err, Error::NotFound { ref model, .. } if model == "res.company"));
}
