// Backend client tests against a mock Supabase server

use jsonwebtoken::{encode, EncodingKey, Header};
use mockito::{Matcher, Server, ServerGuard};
use serde_json::json;
use soloconnect::models::{Decision, Direction, Profile, SignInRequest, SignUpRequest, SwipeRecord};
use soloconnect::services::{
    CandidateFeed, ProfileCache, SupabaseClient, SupabaseError, SupabaseTables,
};
use std::sync::Arc;
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};

const ANON_KEY: &str = "anon-key";

fn client_for(server: &ServerGuard) -> SupabaseClient {
    SupabaseClient::new(
        server.url(),
        ANON_KEY.to_string(),
        SupabaseTables::default(),
        Duration::from_secs(5),
    )
    .unwrap()
}

fn session_body(access_token: &str) -> String {
    json!({
        "access_token": access_token,
        "refresh_token": "refresh-1",
        "token_type": "bearer",
        "expires_in": 3600,
        "user": {
            "id": "u-1",
            "email": "traveller@example.com",
            "user_metadata": { "name": "Sarah" }
        }
    })
    .to_string()
}

fn profile_row(id: &str, age: Option<u8>, photo: Option<&str>) -> serde_json::Value {
    json!({
        "id": id,
        "name": format!("Traveller {}", id),
        "age": age,
        "gender": "female",
        "photo": photo,
        "city": "Barcelona",
        "country": "Spain",
        "interests": ["Beach"],
        "languages": ["Spanish"],
        "bio": null,
        "created_at": "2024-05-01T10:00:00+00:00"
    })
}

fn expired_token() -> String {
    #[derive(serde::Serialize)]
    struct Claims {
        sub: String,
        exp: i64,
    }

    encode(
        &Header::default(),
        &Claims {
            sub: "u-1".to_string(),
            exp: chrono::Utc::now().timestamp() - 60,
        },
        &EncodingKey::from_secret(b"secret"),
    )
    .unwrap()
}

async fn signed_in(server: &mut ServerGuard, access_token: &str) -> SupabaseClient {
    server
        .mock("POST", "/auth/v1/token")
        .match_query(Matcher::UrlEncoded("grant_type".into(), "password".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(session_body(access_token))
        .create_async()
        .await;

    let client = client_for(server);
    client
        .sign_in(&SignInRequest {
            email: "traveller@example.com".to_string(),
            password: "secret1".to_string(),
        })
        .await
        .unwrap();
    client
}

#[tokio::test]
async fn test_sign_in_stores_session() {
    let mut server = Server::new_async().await;
    let token_mock = server
        .mock("POST", "/auth/v1/token")
        .match_query(Matcher::UrlEncoded("grant_type".into(), "password".into()))
        .match_header("apikey", ANON_KEY)
        .match_body(Matcher::PartialJson(json!({ "email": "traveller@example.com" })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(session_body("token-1"))
        .create_async()
        .await;

    let client = client_for(&server);
    let session = assert_ok!(
        client
            .sign_in(&SignInRequest {
                email: "traveller@example.com".to_string(),
                password: "secret1".to_string(),
            })
            .await
    );

    token_mock.assert_async().await;
    assert_eq!(session.user.id, "u-1");
    assert_eq!(session.user.name(), Some("Sarah"));
    assert_eq!(client.session().await.unwrap().access_token, "token-1");
}

#[tokio::test]
async fn test_sign_in_bad_credentials() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/auth/v1/token")
        .match_query(Matcher::Any)
        .with_status(400)
        .with_body(r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#)
        .create_async()
        .await;

    let client = client_for(&server);
    let err = assert_err!(
        client
            .sign_in(&SignInRequest {
                email: "traveller@example.com".to_string(),
                password: "wrong".to_string(),
            })
            .await
    );

    match err {
        SupabaseError::ApiError { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "Invalid login credentials");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(client.session().await.is_none());
}

#[tokio::test]
async fn test_sign_in_rejects_invalid_email_locally() {
    let mut server = Server::new_async().await;
    let token_mock = server
        .mock("POST", "/auth/v1/token")
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let client = client_for(&server);
    let result = client
        .sign_in(&SignInRequest {
            email: "not-an-email".to_string(),
            password: "secret1".to_string(),
        })
        .await;

    assert!(matches!(result, Err(SupabaseError::Validation(_))));
    token_mock.assert_async().await;
}

#[tokio::test]
async fn test_create_account_inserts_profile() {
    let mut server = Server::new_async().await;
    let signup_mock = server
        .mock("POST", "/auth/v1/signup")
        .match_body(Matcher::PartialJson(json!({ "data": { "name": "Sarah" } })))
        .with_status(200)
        .with_body(session_body("token-1"))
        .create_async()
        .await;
    let profile_mock = server
        .mock("POST", "/rest/v1/profiles")
        .match_header("authorization", "Bearer token-1")
        .match_body(Matcher::PartialJson(json!({ "id": "u-1", "name": "Sarah" })))
        .with_status(201)
        .create_async()
        .await;

    let client = client_for(&server);
    let user = assert_ok!(
        client
            .create_account(&SignUpRequest {
                email: "traveller@example.com".to_string(),
                password: "secret1".to_string(),
                name: "Sarah".to_string(),
            })
            .await
    );

    signup_mock.assert_async().await;
    profile_mock.assert_async().await;
    assert_eq!(user.id, "u-1");
    assert!(client.session().await.is_some());
}

#[tokio::test]
async fn test_create_account_profile_failure_signs_out() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/auth/v1/signup")
        .with_status(200)
        .with_body(session_body("token-1"))
        .create_async()
        .await;
    server
        .mock("POST", "/rest/v1/profiles")
        .with_status(500)
        .with_body(r#"{"message":"internal error"}"#)
        .create_async()
        .await;

    let client = client_for(&server);
    let result = client
        .create_account(&SignUpRequest {
            email: "traveller@example.com".to_string(),
            password: "secret1".to_string(),
            name: "Sarah".to_string(),
        })
        .await;

    assert!(matches!(result, Err(SupabaseError::ApiError { status: 500, .. })));
    assert!(client.session().await.is_none());
}

#[tokio::test]
async fn test_create_account_awaiting_confirmation() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/auth/v1/signup")
        .with_status(200)
        .with_body(r#"{"id":"u-9","email":"new@example.com","user_metadata":{"name":"Kenji"}}"#)
        .create_async()
        .await;
    let profile_mock = server
        .mock("POST", "/rest/v1/profiles")
        .expect(0)
        .create_async()
        .await;

    let client = client_for(&server);
    let user = client
        .create_account(&SignUpRequest {
            email: "new@example.com".to_string(),
            password: "secret1".to_string(),
            name: "Kenji".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(user.id, "u-9");
    assert!(client.session().await.is_none());
    profile_mock.assert_async().await;
}

#[tokio::test]
async fn test_get_current_user_requires_session() {
    let server = Server::new_async().await;
    let client = client_for(&server);

    let result = client.get_current_user().await;
    assert!(matches!(result, Err(SupabaseError::NoSession)));
}

#[tokio::test]
async fn test_expired_token_is_refreshed() {
    let mut server = Server::new_async().await;
    let client = signed_in(&mut server, &expired_token()).await;

    let refresh_mock = server
        .mock("POST", "/auth/v1/token")
        .match_query(Matcher::UrlEncoded("grant_type".into(), "refresh_token".into()))
        .match_body(Matcher::PartialJson(json!({ "refresh_token": "refresh-1" })))
        .with_status(200)
        .with_body(session_body("token-2"))
        .create_async()
        .await;
    let user_mock = server
        .mock("GET", "/auth/v1/user")
        .match_header("authorization", "Bearer token-2")
        .with_status(200)
        .with_body(r#"{"id":"u-1","email":"traveller@example.com"}"#)
        .create_async()
        .await;

    let user = client.get_current_user().await.unwrap();

    refresh_mock.assert_async().await;
    user_mock.assert_async().await;
    assert_eq!(user.id, "u-1");
    assert_eq!(client.session().await.unwrap().access_token, "token-2");
}

#[tokio::test]
async fn test_failed_refresh_is_not_sent_as_anon() {
    let mut server = Server::new_async().await;
    let client = signed_in(&mut server, &expired_token()).await;

    let refresh_mock = server
        .mock("POST", "/auth/v1/token")
        .match_query(Matcher::UrlEncoded("grant_type".into(), "refresh_token".into()))
        .with_status(400)
        .with_body(r#"{"error":"invalid_grant","error_description":"Invalid Refresh Token"}"#)
        .create_async()
        .await;
    let anon_mock = server
        .mock("GET", "/rest/v1/profiles")
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    match client.list_profiles(Some("u-1"), 10).await {
        Err(SupabaseError::ApiError { status, message }) => {
            assert_eq!(status, 400);
            assert_eq!(message, "Invalid Refresh Token");
        }
        other => panic!("unexpected result: {other:?}"),
    }

    refresh_mock.assert_async().await;
    anon_mock.assert_async().await;
}

#[tokio::test]
async fn test_signed_out_reads_use_anon_key() {
    let mut server = Server::new_async().await;
    let list_mock = server
        .mock("GET", "/rest/v1/profiles")
        .match_query(Matcher::Any)
        .match_header("authorization", format!("Bearer {}", ANON_KEY).as_str())
        .with_status(200)
        .with_body("[]")
        .create_async()
        .await;

    let client = client_for(&server);
    let profiles = client.list_profiles(None, 5).await.unwrap();

    assert!(profiles.is_empty());
    list_mock.assert_async().await;
}

#[tokio::test]
async fn test_get_profile() {
    let mut server = Server::new_async().await;
    let client = signed_in(&mut server, "token-1").await;

    server
        .mock("GET", "/rest/v1/profiles")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("id".into(), "eq.u-2".into()),
            Matcher::UrlEncoded("select".into(), "*".into()),
        ]))
        .match_header("authorization", "Bearer token-1")
        .with_status(200)
        .with_body(json!([profile_row("u-2", Some(29), Some("https://images.example.com/u2.jpg"))]).to_string())
        .create_async()
        .await;

    let profile = client.get_profile("u-2").await.unwrap();
    assert_eq!(profile.age, Some(29));
    assert_eq!(profile.city.as_deref(), Some("Barcelona"));
    assert!(profile.created_at.is_some());
}

#[tokio::test]
async fn test_get_profile_not_found() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/rest/v1/profiles")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("[]")
        .create_async()
        .await;

    let client = client_for(&server);
    let result = client.get_profile("missing").await;
    assert!(matches!(result, Err(SupabaseError::NotFound(_))));
}

#[tokio::test]
async fn test_rest_errors_are_mapped() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/rest/v1/profiles")
        .match_query(Matcher::Any)
        .with_status(401)
        .with_body(r#"{"message":"JWT expired","code":"PGRST301"}"#)
        .create_async()
        .await;

    let client = client_for(&server);
    match client.get_profile("u-2").await {
        Err(SupabaseError::Unauthorized(message)) => assert_eq!(message, "JWT expired"),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn test_upsert_profile_merges_duplicates() {
    let mut server = Server::new_async().await;
    let client = signed_in(&mut server, "token-1").await;

    let upsert_mock = server
        .mock("POST", "/rest/v1/profiles")
        .match_header("prefer", "resolution=merge-duplicates,return=representation")
        .match_body(Matcher::PartialJson(json!({ "id": "u-1", "age": 28 })))
        .with_status(201)
        .with_body(json!([profile_row("u-1", Some(28), None)]).to_string())
        .create_async()
        .await;

    let mut profile = Profile::new("u-1", "Sarah");
    profile.age = Some(28);
    let saved = client.upsert_profile(&profile).await.unwrap();

    upsert_mock.assert_async().await;
    assert_eq!(saved.id, "u-1");
}

#[tokio::test]
async fn test_upsert_invalid_profile_is_not_sent() {
    let mut server = Server::new_async().await;
    let upsert_mock = server
        .mock("POST", "/rest/v1/profiles")
        .expect(0)
        .create_async()
        .await;

    let client = client_for(&server);
    let mut profile = Profile::new("u-1", "Sarah");
    profile.age = Some(12);

    let result = client.upsert_profile(&profile).await;
    assert!(matches!(result, Err(SupabaseError::Validation(_))));
    upsert_mock.assert_async().await;
}

#[tokio::test]
async fn test_record_swipe() {
    let mut server = Server::new_async().await;
    let client = signed_in(&mut server, "token-1").await;

    let swipe_mock = server
        .mock("POST", "/rest/v1/swipes")
        .match_header("authorization", "Bearer token-1")
        .match_header("prefer", "return=minimal")
        .match_body(Matcher::PartialJson(json!({
            "user_id": "u-1",
            "target_id": "c-3",
            "direction": "accept"
        })))
        .with_status(201)
        .create_async()
        .await;

    let decision = Decision::new("c-3", Direction::Accept);
    let record = SwipeRecord::from_decision("u-1", &decision);
    assert_ok!(client.record_swipe(&record).await);
    swipe_mock.assert_async().await;
}

#[tokio::test]
async fn test_record_swipe_conflict() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/rest/v1/swipes")
        .with_status(409)
        .with_body(r#"{"message":"duplicate key value violates unique constraint"}"#)
        .create_async()
        .await;

    let client = client_for(&server);
    let record = SwipeRecord::from_decision("u-1", &Decision::new("c-3", Direction::Reject));

    match client.record_swipe(&record).await {
        Err(SupabaseError::ApiError { status, .. }) => assert_eq!(status, 409),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn test_sign_out_clears_session() {
    let mut server = Server::new_async().await;
    let client = signed_in(&mut server, "token-1").await;

    let logout_mock = server
        .mock("POST", "/auth/v1/logout")
        .match_header("authorization", "Bearer token-1")
        .with_status(204)
        .create_async()
        .await;

    assert_ok!(client.sign_out().await);
    logout_mock.assert_async().await;
    assert!(client.session().await.is_none());

    // Already signed out: nothing to do
    assert_ok!(client.sign_out().await);
}

#[tokio::test]
async fn test_sign_out_clears_session_when_logout_fails() {
    let mut server = Server::new_async().await;
    let client = signed_in(&mut server, "token-1").await;

    let logout_mock = server
        .mock("POST", "/auth/v1/logout")
        .with_status(500)
        .with_body(r#"{"msg":"logout failed"}"#)
        .create_async()
        .await;

    let err = assert_err!(client.sign_out().await);
    assert!(matches!(err, SupabaseError::ApiError { status: 500, .. }));
    logout_mock.assert_async().await;
    assert!(client.session().await.is_none());
}

#[tokio::test]
async fn test_feed_skips_incomplete_profiles_and_caches() {
    let mut server = Server::new_async().await;
    let client = signed_in(&mut server, "token-1").await;

    server
        .mock("GET", "/rest/v1/profiles")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("id".into(), "neq.u-1".into()),
            Matcher::UrlEncoded("limit".into(), "10".into()),
        ]))
        .with_status(200)
        .with_body(
            json!([
                profile_row("u-2", Some(29), Some("https://images.example.com/u2.jpg")),
                profile_row("u-3", None, Some("https://images.example.com/u3.jpg")),
                profile_row("u-4", Some(41), None),
            ])
            .to_string(),
        )
        .create_async()
        .await;
    let single_mock = server
        .mock("GET", "/rest/v1/profiles")
        .match_query(Matcher::UrlEncoded("id".into(), "eq.u-3".into()))
        .expect(0)
        .create_async()
        .await;

    let feed = CandidateFeed::new(Arc::new(client), Arc::new(ProfileCache::new(100, 60)));
    let candidates = feed.load(Some("u-1"), 10).await.unwrap();

    let ids: Vec<_> = candidates.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["u-2"]);

    // Skipped profiles are still cached for profile views
    let cached = feed.profile("u-3").await.unwrap();
    assert_eq!(cached.age, None);
    single_mock.assert_async().await;
}
