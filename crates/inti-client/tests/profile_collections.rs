use std::sync::Arc;

use inti_client::{ApiClient, ClientConfig, Collection, ProfileView, Unavailable};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn view_for(server: &MockServer) -> ProfileView {
    let client = ApiClient::new(&ClientConfig::new(server.uri()))
        .unwrap()
        .with_token(Some("tok".into()));
    ProfileView::new(Arc::new(client))
}

async fn mount_profile(server: &MockServer, username: &str, record: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(format!("/profile/{username}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(record))
        .mount(server)
        .await;
}

#[tokio::test]
async fn products_are_fetched_once_per_session() {
    let server = MockServer::start().await;
    mount_profile(&server, "ana", json!({ "id": "a1", "username": "ana" })).await;
    Mock::given(method("GET"))
        .and(path("/products/profile/a1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "id": "p1", "title": "Bolo" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let view = view_for(&server);
    view.load("ana").await.unwrap();

    let first = view.products().await.unwrap();
    let second = view.products().await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first, Collection::Loaded(vec![json!({ "id": "p1", "title": "Bolo" })]));
}

#[tokio::test]
async fn refresh_fetches_products_again() {
    let server = MockServer::start().await;
    mount_profile(&server, "ana", json!({ "id": "a1", "username": "ana" })).await;
    Mock::given(method("GET"))
        .and(path("/products/profile/a1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": "p1" }])))
        .expect(2)
        .mount(&server)
        .await;

    let view = view_for(&server);
    view.navigate("ana");
    view.load_profile().await.unwrap();
    view.products().await.unwrap();
    let refreshed = view.refresh_products().await.unwrap();
    assert_eq!(refreshed.entries().len(), 1);
}

#[tokio::test]
async fn unresolved_identity_uses_embedded_products() {
    let server = MockServer::start().await;
    mount_profile(
        &server,
        "ana",
        json!({ "username": "ana", "products": [{ "title": "Bolo" }] }),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/search/ana"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{ "username": "other", "id": "x" }])),
        )
        .mount(&server)
        .await;

    let view = view_for(&server);
    view.navigate("ana");
    view.load_profile().await.unwrap();

    assert_eq!(view.resolve_identity().await.unwrap(), None);
    assert_eq!(
        view.products().await.unwrap(),
        Collection::Embedded(vec![json!({ "title": "Bolo" })])
    );
}

#[tokio::test]
async fn unresolved_identity_without_embedded_data() {
    let server = MockServer::start().await;
    mount_profile(&server, "ana", json!({ "username": "ana" })).await;
    Mock::given(method("GET"))
        .and(path("/search/ana"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let view = view_for(&server);
    view.navigate("ana");
    view.load_profile().await.unwrap();

    assert_eq!(
        view.products().await.unwrap(),
        Collection::Unavailable(Unavailable::IdentityUnresolved)
    );
}

#[tokio::test]
async fn missing_products_endpoint_is_not_found() {
    let server = MockServer::start().await;
    mount_profile(&server, "ana", json!({ "id": "a1", "username": "ana" })).await;
    Mock::given(method("GET"))
        .and(path("/products/profile/a1"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let view = view_for(&server);
    view.navigate("ana");
    view.load_profile().await.unwrap();

    assert_eq!(
        view.products().await.unwrap(),
        Collection::Unavailable(Unavailable::NotFound)
    );
}

#[tokio::test]
async fn failing_products_endpoint_falls_back_to_embedded() {
    let server = MockServer::start().await;
    mount_profile(
        &server,
        "ana",
        json!({ "id": "a1", "username": "ana", "products": [{ "id": "p9" }] }),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/products/profile/a1"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let view = view_for(&server);
    view.navigate("ana");
    view.load_profile().await.unwrap();

    assert_eq!(
        view.products().await.unwrap(),
        Collection::Embedded(vec![json!({ "id": "p9" })])
    );
}

#[tokio::test]
async fn organization_events_are_keyed_by_username() {
    let server = MockServer::start().await;
    mount_profile(
        &server,
        "feira",
        json!({ "id": "o1", "username": "feira", "type": "ORGANIZATION" }),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/org/feira/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [{ "id": "e1", "title": "Feira de Domingo" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let view = view_for(&server);
    view.navigate("feira");
    view.load_profile().await.unwrap();

    let events = view.organization_events().await.unwrap();
    assert_eq!(events.entries().len(), 1);
    view.organization_events().await.unwrap();
}

#[tokio::test]
async fn user_profiles_have_no_organization_events() {
    let server = MockServer::start().await;
    mount_profile(&server, "ana", json!({ "id": "a1", "username": "ana", "type": "USER" })).await;
    Mock::given(method("GET"))
        .and(path("/org/ana/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let view = view_for(&server);
    view.navigate("ana");
    view.load_profile().await.unwrap();

    assert_eq!(
        view.organization_events().await.unwrap(),
        Collection::Unavailable(Unavailable::NotOrganization)
    );
}

#[tokio::test]
async fn own_organization_uses_own_events_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/profile/me"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "id": "o1", "type": "ORGANIZATION", "posts": [] })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/org/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": "e1" }])))
        .expect(1)
        .mount(&server)
        .await;

    let view = view_for(&server);
    view.navigate_own(None);
    view.load_profile().await.unwrap();
    assert_eq!(view.organization_events().await.unwrap().entries().len(), 1);
}
