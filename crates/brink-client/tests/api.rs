//! Portal API calls against a mock server, including the 401 recovery path.

use brink_client::{BrinkClient, Error};
use serde_json::json;
use wiremock::matchers::{body_json, body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const AUTHORIZE: &str = "/idsrv/connect/authorize";
const TOKEN: &str = "/idsrv/connect/token";

/// Identity server that hands out a code straight away and answers the
/// code exchange with `access_token`.
async fn mount_login(server: &MockServer, access_token: &str) {
    Mock::given(method("GET"))
        .and(path(AUTHORIZE))
        .respond_with(
            ResponseTemplate::new(302).insert_header("Location", "https://host/app?code=XYZ"),
        )
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path(TOKEN))
        .and(body_string_contains("grant_type=authorization_code"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access_token": access_token, "refresh_token": "R1"})),
        )
        .mount(server)
        .await;
}

fn client_for(server: &MockServer) -> BrinkClient {
    BrinkClient::builder()
        .base_url(server.uri())
        .username("user@example.com")
        .password("secret")
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_list_systems_logs_in_lazily() {
    let server = MockServer::start().await;
    mount_login(&server, "T1").await;
    Mock::given(method("GET"))
        .and(path("/portal/api/v1.1/systems"))
        .and(query_param("pageSize", "10"))
        .and(header("Authorization", "Bearer T1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{
                "systemShareId": 1234,
                "systemName": "Flair 300",
                "serialNumber": "BR-001",
                "isSystemOwner": true,
                "accessLevel": 2
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert!(!client.is_authenticated().await);

    let systems = client.systems().list().await.unwrap();

    assert!(client.is_authenticated().await);
    assert_eq!(systems.len(), 1);
    assert_eq!(systems[0].system_id, 1234);
    assert_eq!(systems[0].gateway_id, 1234);
    assert_eq!(systems[0].name, "Flair 300");
    assert_eq!(systems[0].serial_number, "BR-001");
    assert!(systems[0].is_owner);
    assert_eq!(systems[0].access_level, 2);
    server.verify().await;
}

#[tokio::test]
async fn test_list_parameters() {
    let server = MockServer::start().await;
    mount_login(&server, "T1").await;
    Mock::given(method("GET"))
        .and(path("/portal/api/v1.1/systems/1234/uidescription"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "root": {
                "navigationItems": [{
                    "name": "Flair",
                    "componentId": 1,
                    "navigationItems": [{
                        "parameterGroups": [{
                            "parameters": [{
                                "id": 55,
                                "name": "Betriebsart",
                                "value": "1",
                                "controlType": 2,
                                "readWrite": true,
                                "listItems": [
                                    {"value": "0", "text": "Automatik"},
                                    {"value": "1", "text": "Handbetrieb"}
                                ]
                            }, {
                                "id": 56,
                                "name": "Relative Feuchte",
                                "value": "48",
                                "unit": "%"
                            }]
                        }]
                    }]
                }]
            }
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let parameters = client.parameters().list(1234).await.unwrap();

    assert_eq!(parameters.len(), 2);
    assert_eq!(parameters["Betriebsart"].id, 55);
    assert_eq!(parameters["Betriebsart"].display_value(), "Handbetrieb");
    assert_eq!(parameters["Relative Feuchte"].unit, "%");
    assert_eq!(parameters["Relative Feuchte"].component_id, Some(1));
}

#[tokio::test]
async fn test_set_parameter_sends_string_value() {
    let server = MockServer::start().await;
    mount_login(&server, "T1").await;
    Mock::given(method("PUT"))
        .and(path("/portal/api/v1.1/parameters/55"))
        .and(header("Authorization", "Bearer T1"))
        .and(body_json(json!({"value": "3"})))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.parameters().set(55, 3).await.unwrap();
    client.parameters().set_ventilation_level(55, 3).await.unwrap();
    server.verify().await;
}

#[tokio::test]
async fn test_set_parameter_failure() {
    let server = MockServer::start().await;
    mount_login(&server, "T1").await;
    Mock::given(method("PUT"))
        .and(path("/portal/api/v1.1/parameters/55"))
        .respond_with(ResponseTemplate::new(400).set_body_string("value out of range"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.parameters().set_mode(55, 99).await.unwrap_err();

    match err {
        Error::Api { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "value out of range");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_unauthorized_refreshes_and_retries_once() {
    let server = MockServer::start().await;
    mount_login(&server, "T1").await;
    Mock::given(method("POST"))
        .and(path(TOKEN))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=R1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "T2"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/portal/api/v1.1/systems"))
        .and(header("Authorization", "Bearer T1"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/portal/api/v1.1/systems"))
        .and(header("Authorization", "Bearer T2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let systems = client.systems().list().await.unwrap();

    assert!(systems.is_empty());
    server.verify().await;
}

#[tokio::test]
async fn test_second_unauthorized_is_reported() {
    let server = MockServer::start().await;
    mount_login(&server, "T1").await;
    Mock::given(method("POST"))
        .and(path(TOKEN))
        .and(body_string_contains("grant_type=refresh_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "T1"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/portal/api/v1.1/systems"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.systems().list().await.unwrap_err();

    assert!(err.is_auth_error());
    server.verify().await;
}

#[tokio::test]
async fn test_login_failure_surfaces_as_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(AUTHORIZE))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>down</html>"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.systems().list().await.unwrap_err();

    assert!(matches!(
        err,
        Error::Auth(brink_client::OAuthError::LoginFormNotFound)
    ));
}

#[tokio::test]
async fn test_missing_system_is_not_found() {
    let server = MockServer::start().await;
    mount_login(&server, "T1").await;
    Mock::given(method("GET"))
        .and(path("/portal/api/v1.1/systems/9/uidescription"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.parameters().list(9).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_explicit_login_and_refresh() {
    let server = MockServer::start().await;
    mount_login(&server, "T1").await;
    Mock::given(method("POST"))
        .and(path(TOKEN))
        .and(body_string_contains("grant_type=refresh_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "T2"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.login().await.unwrap();
    assert!(client.is_authenticated().await);

    client.refresh_token().await.unwrap();
    assert!(client.is_authenticated().await);
    server.verify().await;
}
