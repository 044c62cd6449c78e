//! HTTP surface: token issuance, key publication, method handling and CORS.

use common::jwt::{verify_assertion_now, Jwks};
use issuer_test_utils::*;
use reqwest::header::{
    ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_REQUEST_METHOD,
    CACHE_CONTROL, CONTENT_TYPE, ORIGIN,
};
use reqwest::StatusCode;
use serde_json::{json, Value};

const TOKEN_PATH: &str = "/api/get-es256-jwt";

async fn post_token(server: &TestIssuerServer, body: Value) -> Result<reqwest::Response, anyhow::Error> {
    Ok(reqwest::Client::new()
        .post(format!("{}{TOKEN_PATH}", server.url()))
        .json(&body)
        .send()
        .await?)
}

async fn token_from(response: reqwest::Response) -> Result<String, anyhow::Error> {
    let body: Value = response.json().await?;
    body["token"]
        .as_str()
        .map(ToString::to_string)
        .ok_or_else(|| anyhow::anyhow!("response has no token: {body}"))
}

async fn fetch_jwks(server: &TestIssuerServer, path: &str) -> Result<Jwks, anyhow::Error> {
    Ok(reqwest::get(format!("{}{path}", server.url()))
        .await?
        .json()
        .await?)
}

// ============================================================================
// Token endpoint
// ============================================================================

#[tokio::test]
async fn test_issue_with_flat_did() -> Result<(), anyhow::Error> {
    let server = TestIssuerServer::spawn(1).await?;

    let response = post_token(&server, json!({ "did": TEST_DID_ALICE })).await?;
    assert_eq!(response.status(), StatusCode::OK);

    let token = token_from(response).await?;
    let jwks = fetch_jwks(&server, "/api/jwks").await?;

    token
        .assert_valid_es256_jwt()
        .assert_for_subject(TEST_DID_ALICE)
        .assert_signed_by(TEST_KEY_ID_1);
    let claims = verify_assertion_now(&token, &jwks)
        .map_err(|e| anyhow::anyhow!("issued token failed to verify: {e:?}"))?;
    assert_eq!(claims.exp - claims.iat, 3600);
    assert_eq!(claims.iat % 3600, 0);

    Ok(())
}

#[tokio::test]
async fn test_issue_with_nested_did() -> Result<(), anyhow::Error> {
    let server = TestIssuerServer::spawn(1).await?;

    let response = post_token(&server, json!({ "did": { "did": TEST_DID_KEY } })).await?;
    assert_eq!(response.status(), StatusCode::OK);

    token_from(response).await?.assert_for_subject(TEST_DID_KEY);

    Ok(())
}

#[tokio::test]
async fn test_repeat_request_returns_same_token() -> Result<(), anyhow::Error> {
    let server = TestIssuerServer::spawn(1).await?;

    let first = token_from(post_token(&server, json!({ "did": TEST_DID_BOB })).await?).await?;
    let second = token_from(post_token(&server, json!({ "did": TEST_DID_BOB })).await?).await?;

    // Only differs if the requests straddle an hour boundary
    if first != second {
        first.assert_for_subject(TEST_DID_BOB);
        second.assert_for_subject(TEST_DID_BOB);
    }
    assert!(server.state().issuer.cache().len() <= 1);

    Ok(())
}

#[tokio::test]
async fn test_text_plain_body_is_accepted() -> Result<(), anyhow::Error> {
    let server = TestIssuerServer::spawn(1).await?;

    let response = reqwest::Client::new()
        .post(format!("{}{TOKEN_PATH}", server.url()))
        .header(CONTENT_TYPE, "text/plain;charset=UTF-8")
        .body(json!({ "did": TEST_DID_ALICE }).to_string())
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    token_from(response).await?.assert_for_subject(TEST_DID_ALICE);

    Ok(())
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() -> Result<(), anyhow::Error> {
    let server = TestIssuerServer::spawn(1).await?;

    let response = reqwest::Client::new()
        .post(format!("{}{TOKEN_PATH}", server.url()))
        .header(CONTENT_TYPE, "application/json")
        .body("{\"did\": ")
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await?;
    assert_eq!(body["error"]["code"], "INVALID_INPUT");
    assert_eq!(body["error"]["message"], "Malformed JSON body");

    Ok(())
}

#[tokio::test]
async fn test_missing_did_is_bad_request() -> Result<(), anyhow::Error> {
    let server = TestIssuerServer::spawn(1).await?;

    for body in [
        json!({}),
        json!({ "did": "" }),
        json!({ "did": "   " }),
        json!({ "did": null }),
        json!({ "did": {} }),
        json!({ "did": { "did": "" } }),
    ] {
        let response = post_token(&server, body.clone()).await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {body}");

        let error: Value = response.json().await?;
        assert_eq!(error["error"]["message"], "Missing DID", "body: {body}");
    }

    assert!(server.state().issuer.cache().is_empty());

    Ok(())
}

#[tokio::test]
async fn test_get_on_token_route_is_method_not_allowed() -> Result<(), anyhow::Error> {
    let server = TestIssuerServer::spawn(1).await?;

    let response = reqwest::get(format!("{}{TOKEN_PATH}", server.url())).await?;

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    let body: Value = response.json().await?;
    assert_eq!(body["error"]["code"], "METHOD_NOT_ALLOWED");

    Ok(())
}

#[tokio::test]
async fn test_post_on_jwks_route_is_method_not_allowed() -> Result<(), anyhow::Error> {
    let server = TestIssuerServer::spawn(1).await?;

    let response = reqwest::Client::new()
        .post(format!("{}/api/jwks", server.url()))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

    Ok(())
}

// ============================================================================
// CORS
// ============================================================================

#[tokio::test]
async fn test_preflight_is_allowed_from_any_origin() -> Result<(), anyhow::Error> {
    let server = TestIssuerServer::spawn(1).await?;

    let response = reqwest::Client::new()
        .request(reqwest::Method::OPTIONS, format!("{}{TOKEN_PATH}", server.url()))
        .header(ORIGIN, "https://app.example.com")
        .header(ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
    let methods = response
        .headers()
        .get(ACCESS_CONTROL_ALLOW_METHODS)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(methods.contains("POST"), "allowed methods: {methods}");

    Ok(())
}

#[tokio::test]
async fn test_cors_header_on_token_response() -> Result<(), anyhow::Error> {
    let server = TestIssuerServer::spawn(1).await?;

    let response = reqwest::Client::new()
        .post(format!("{}{TOKEN_PATH}", server.url()))
        .header(ORIGIN, "https://app.example.com")
        .json(&json!({ "did": TEST_DID_ALICE }))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );

    Ok(())
}

// ============================================================================
// Key publication
// ============================================================================

#[tokio::test]
async fn test_jwks_served_at_both_paths() -> Result<(), anyhow::Error> {
    let server = TestIssuerServer::spawn(1).await?;

    let api = fetch_jwks(&server, "/api/jwks").await?;
    let well_known = fetch_jwks(&server, "/.well-known/jwks.json").await?;

    assert_eq!(api, well_known);
    assert_eq!(api, server.state().publisher.publish());

    let (x, y) = test_public_point(1)?;
    let jwk = api
        .find_key(TEST_KEY_ID_1)
        .ok_or_else(|| anyhow::anyhow!("published key-set is missing the issuer kid"))?;
    assert_eq!(jwk.coordinates()?, (x, y));

    Ok(())
}

#[tokio::test]
async fn test_jwks_response_shape_and_caching() -> Result<(), anyhow::Error> {
    let server = TestIssuerServer::spawn(1).await?;

    let response = reqwest::get(format!("{}/.well-known/jwks.json", server.url())).await?;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(CACHE_CONTROL)
            .and_then(|v| v.to_str().ok()),
        Some("public, max-age=3600")
    );

    let body: Value = response.json().await?;
    let key = &body["keys"][0];
    assert_eq!(key["kty"], "EC");
    assert_eq!(key["crv"], "P-256");
    assert_eq!(key["alg"], "ES256");
    assert_eq!(key["use"], "sig");
    assert_eq!(key["kid"], TEST_KEY_ID_1);
    assert!(key.get("d").is_none(), "private scalar must never be published");

    Ok(())
}

#[tokio::test]
async fn test_jwks_max_age_follows_config() -> Result<(), anyhow::Error> {
    let mut config = test_config(1)?;
    config.jwks_max_age_seconds = 300;
    let server = TestIssuerServer::spawn_with_config(config).await?;

    let response = reqwest::get(format!("{}/api/jwks", server.url())).await?;

    assert_eq!(
        response
            .headers()
            .get(CACHE_CONTROL)
            .and_then(|v| v.to_str().ok()),
        Some("public, max-age=300")
    );

    Ok(())
}

// ============================================================================
// Operational endpoints
// ============================================================================

#[tokio::test]
async fn test_health_endpoint_returns_ok() -> Result<(), anyhow::Error> {
    let server = TestIssuerServer::spawn(1).await?;

    let response = reqwest::get(format!("{}/health", server.url())).await?;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await?, "OK");

    Ok(())
}

#[tokio::test]
async fn test_metrics_endpoint_returns_ok() -> Result<(), anyhow::Error> {
    let server = TestIssuerServer::spawn(1).await?;

    let response = reqwest::get(format!("{}/metrics", server.url())).await?;

    assert_eq!(response.status(), StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn test_unknown_path_is_not_found() -> Result<(), anyhow::Error> {
    let server = TestIssuerServer::spawn(1).await?;

    let response = reqwest::get(format!("{}/api/unknown", server.url())).await?;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    Ok(())
}
