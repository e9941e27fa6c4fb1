use appointly_common::services::{DocumentStore, FieldFilter, Fields, ServiceError};
use appointly_firebase::auth::TokenSource;
use appointly_firebase::FirestoreClient;
use serde_json::{json, Value};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DOCS: &str = "/v1/projects/demo/databases/(default)/documents";

fn fields(value: Value) -> Fields {
    match value {
        Value::Object(map) => map,
        _ => panic!("expected object"),
    }
}

async fn client(server: &MockServer) -> FirestoreClient {
    FirestoreClient::with_base_url(
        format!("{}{}", server.uri(), DOCS),
        TokenSource::Static("test-token".to_string()),
    )
}

#[tokio::test]
async fn test_get_decodes_document() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{}/sellers/s1", DOCS)))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "projects/demo/databases/(default)/documents/sellers/s1",
            "fields": {
                "name": {"stringValue": "Grace"},
                "calendarConnected": {"booleanValue": true}
            }
        })))
        .mount(&server)
        .await;

    let doc = client(&server)
        .await
        .get("sellers", "s1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(doc.id, "s1");
    assert_eq!(doc.fields["name"], json!("Grace"));
    assert_eq!(doc.fields["calendarConnected"], json!(true));
}

#[tokio::test]
async fn test_get_missing_document_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{}/sellers/nobody", DOCS)))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {"code": 404, "status": "NOT_FOUND"}
        })))
        .mount(&server)
        .await;

    let doc = client(&server).await.get("sellers", "nobody").await.unwrap();
    assert!(doc.is_none());
}

#[tokio::test]
async fn test_merge_sends_update_mask() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path(format!("{}/users/u1", DOCS)))
        .and(query_param("updateMask.fieldPaths", "role"))
        .and(body_json(json!({"fields": {"role": {"stringValue": "seller"}}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "projects/demo/databases/(default)/documents/users/u1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    client(&server)
        .await
        .set("users", "u1", fields(json!({"role": "seller"})), true)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_create_conflict_maps_to_already_exists() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{}/appointments", DOCS)))
        .and(query_param("documentId", "s1_1746432000"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "error": {"code": 409, "status": "ALREADY_EXISTS"}
        })))
        .mount(&server)
        .await;

    let result = client(&server)
        .await
        .create("appointments", "s1_1746432000", fields(json!({"buyerUid": "b1"})))
        .await;
    assert_eq!(
        result,
        Err(ServiceError::AlreadyExists(
            "appointments/s1_1746432000".to_string()
        ))
    );
}

#[tokio::test]
async fn test_query_skips_read_time_only_rows() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{}:runQuery", DOCS)))
        .and(body_json(json!({
            "structuredQuery": {
                "from": [{"collectionId": "users"}],
                "where": {"fieldFilter": {
                    "field": {"fieldPath": "role"},
                    "op": "EQUAL",
                    "value": {"stringValue": "seller"}
                }}
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "document": {
                    "name": "projects/demo/databases/(default)/documents/users/s1",
                    "fields": {"role": {"stringValue": "seller"}}
                },
                "readTime": "2025-05-05T08:00:00Z"
            },
            {"readTime": "2025-05-05T08:00:00Z"}
        ])))
        .mount(&server)
        .await;

    let docs = client(&server)
        .await
        .query("users", FieldFilter::equal("role", "seller"))
        .await
        .unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].id, "s1");
}

#[tokio::test]
async fn test_server_error_is_a_service_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403).set_body_string("PERMISSION_DENIED"))
        .mount(&server)
        .await;

    let result = client(&server).await.get("users", "u1").await;
    assert!(matches!(
        result,
        Err(ServiceError::Failed {
            service: "firestore",
            ..
        })
    ));
}
