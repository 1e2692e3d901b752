use std::sync::Arc;

use odoo_rpc::domain::Domain;
use odoo_rpc::error::{Error, ErrorKind};
use odoo_rpc::metadata::{Cardinality, MetadataProvider, RelationDescriptor, RpcMetadataProvider};
use odoo_rpc::relation::{AmbiguityPolicy, RelationResolver};
use odoo_rpc::transport::protocol::{methods, models};
use odoo_rpc::transport::{MockTransport, RemoteFault};
use serde_json::json;

fn catalog() -> MockTransport {
    MockTransport::new()
        .with_relation("res.users", "company_id", "many2one", "res.company")
        .with_relation("res.partner", "category_id", "many2many", "res.partner.category")
        .with_relation("res.partner", "child_ids", "one2many", "res.partner")
        .with_relation("res.partner", "parent_id", "many2one", "res.partner")
        .with_field("res.partner", "name", "char")
}

#[tokio::test]
async fn test_many2one_is_single() {
    let resolver = RelationResolver::new(Arc::new(catalog()));

    let descriptor = resolver
        .resolve_relation("res.users", "company_id")
        .await
        .unwrap();

    assert_eq!(descriptor, RelationDescriptor::Single("res.company".to_string()));
}

#[tokio::test]
async fn test_to_many_fields_are_multiple() {
    let resolver = RelationResolver::new(Arc::new(catalog()));

    let tags = resolver
        .resolve_relation("res.partner", "category_id")
        .await
        .unwrap();
    let children = resolver
        .resolve_relation("res.partner", "child_ids")
        .await
        .unwrap();

    assert_eq!(tags.cardinality(), Cardinality::Multiple);
    assert_eq!(tags.target(), "res.partner.category");
    assert_eq!(children, RelationDescriptor::Multiple("res.partner".to_string()));
}

#[tokio::test]
async fn test_self_referencing_relation() {
    let resolver = RelationResolver::new(Arc::new(catalog()));

    let parent = resolver
        .resolve_relation("res.partner", "parent_id")
        .await
        .unwrap();

    assert_eq!(parent.target(), "res.partner");
    assert!(!parent.is_multiple());
}

#[tokio::test]
async fn test_char_field_is_not_relational() {
    let resolver = RelationResolver::new(Arc::new(catalog()));

    let err = resolver.resolve_relation("res.partner", "name").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotRelational);
    assert!(err.to_string().contains("name"));
}

#[tokio::test]
async fn test_unknown_field_names_model_and_field() {
    let resolver = RelationResolver::new(Arc::new(catalog()));

    let err = resolver
        .resolve_relation("res.partner", "missing_id")
        .await
        .unwrap_err();

    match err {
        Error::NotFound { model, domain } => {
            assert_eq!(model, "res.partner");
            assert_eq!(domain, Domain::eq("name", "missing_id"));
        }
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn test_resolving_twice_queries_twice() {
    let mock = Arc::new(catalog());
    let resolver = RelationResolver::new(mock.clone());

    resolver.resolve_relation("res.users", "company_id").await.unwrap();
    resolver.resolve_relation("res.users", "company_id").await.unwrap();

    assert_eq!(mock.call_count(models::IR_MODEL, methods::SEARCH_READ), 2);
    assert_eq!(mock.call_count(models::IR_MODEL_FIELDS, methods::SEARCH_READ), 2);
}

#[tokio::test]
async fn test_resolve_relations_keeps_field_order() {
    let provider = RpcMetadataProvider::new(Arc::new(catalog()));
    let fields = vec!["parent_id".to_string(), "category_id".to_string()];

    let descriptors = provider.resolve_relations("res.partner", &fields).await.unwrap();

    assert_eq!(
        descriptors,
        vec![
            RelationDescriptor::Single("res.partner".to_string()),
            RelationDescriptor::Multiple("res.partner.category".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_resolve_relations_fails_as_a_whole() {
    let provider = RpcMetadataProvider::new(Arc::new(catalog()));
    let fields = vec!["parent_id".to_string(), "name".to_string()];

    let err = provider.resolve_relations("res.partner", &fields).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotRelational);
}

#[tokio::test]
async fn test_remote_fault_passes_through() {
    let fault = RemoteFault {
        code: 200,
        message: "Odoo Server Error".to_string(),
        data: json!({"name": "odoo.exceptions.AccessError", "message": "no access"}),
    };
    let mock = catalog().with_failure(models::IR_MODEL, methods::SEARCH_READ, fault.clone());
    let resolver = RelationResolver::new(Arc::new(mock));

    let err = resolver
        .resolve_relation("res.users", "company_id")
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::RemoteError);
    assert_eq!(err.remote_fault(), Some(&fault));
    assert_eq!(
        err.remote_fault().and_then(RemoteFault::exception_name),
        Some("odoo.exceptions.AccessError")
    );
}

#[tokio::test]
async fn test_duplicate_catalog_rows_follow_policy() {
    let duplicated = || {
        catalog().with_record(
            models::IR_MODEL_FIELDS,
            json!({
                "model_id": [1, "res.users"],
                "model": "res.users",
                "name": "company_id",
                "ttype": "many2one",
                "relation": "res.company.shadow",
            }),
        )
    };

    let lenient = RpcMetadataProvider::new(Arc::new(duplicated()));
    let strict = RpcMetadataProvider::new(Arc::new(duplicated()))
        .with_ambiguity_policy(AmbiguityPolicy::Reject);

    let first = lenient.resolve_relation("res.users", "company_id").await.unwrap();
    let err = strict.resolve_relation("res.users", "company_id").await.unwrap_err();

    assert_eq!(first.target(), "res.company");
    assert!(matches!(err, Error::AmbiguousMetadata { matches: 2, .. }));
}
