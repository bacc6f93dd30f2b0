//! GitHub client tests against a wiremock server.

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use teamsync_core::provider::{GroupProvider, NewGroup, ProviderError};
use teamsync_github::{GithubClient, GithubConfig};

// =============================================================================
// Helpers
// =============================================================================

async fn setup() -> (MockServer, GithubClient) {
    let server = MockServer::start().await;
    let client = GithubClient::new(GithubConfig::new("test-token").with_api_url(server.uri()))
        .expect("client should build");
    (server, client)
}

fn team(id: u64, name: &str, slug: &str) -> serde_json::Value {
    json!({"id": id, "name": name, "slug": slug, "privacy": "closed"})
}

// =============================================================================
// Headers
// =============================================================================

#[tokio::test]
async fn requests_carry_auth_and_api_headers() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/user"))
        .and(header("Authorization", "Bearer test-token"))
        .and(header("Accept", "application/vnd.github+json"))
        .and(header("X-GitHub-Api-Version", "2022-11-28"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"login": "octocat"})))
        .expect(1)
        .mount(&server)
        .await;

    let identity = client.current_identity().await.unwrap();
    assert_eq!(identity.as_deref(), Some("octocat"));
}

// =============================================================================
// Reads
// =============================================================================

#[tokio::test]
async fn list_groups_follows_pages() {
    let (server, client) = setup().await;

    let first: Vec<_> = (1..=100).map(|i| team(i, &format!("t{i}"), &format!("t{i}"))).collect();
    Mock::given(method("GET"))
        .and(path("/orgs/acme/teams"))
        .and(query_param("page", "1"))
        .and(query_param("per_page", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(first))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/orgs/acme/teams"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![team(101, "last", "last")]))
        .mount(&server)
        .await;

    let groups = client.list_groups("acme").await.unwrap();
    assert_eq!(groups.len(), 101);
    assert_eq!(groups[100].name, "last");
}

#[tokio::test]
async fn get_group_returns_none_on_404() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/orgs/acme/teams/ghost"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Not Found"})))
        .mount(&server)
        .await;

    assert!(client.get_group_by_slug("acme", "ghost").await.unwrap().is_none());
}

#[tokio::test]
async fn get_group_propagates_other_errors() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/orgs/acme/teams/core"))
        .respond_with(
            ResponseTemplate::new(403).set_body_json(json!({"message": "API rate limit exceeded"})),
        )
        .mount(&server)
        .await;

    let err = client.get_group_by_slug("acme", "core").await.unwrap_err();
    match err {
        ProviderError::Http { status, message } => {
            assert_eq!(status, 403);
            assert_eq!(message, "API rate limit exceeded");
        }
        other => panic!("expected Http error, got: {other}"),
    }
}

#[tokio::test]
async fn get_group_returns_summary() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/orgs/acme/teams/core"))
        .respond_with(ResponseTemplate::new(200).set_body_json(team(9, "Core", "core")))
        .mount(&server)
        .await;

    let group = client.get_group_by_slug("acme", "core").await.unwrap().unwrap();
    assert_eq!(group.id, 9);
    assert_eq!(group.name, "Core");
}

#[tokio::test]
async fn list_members_returns_logins() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/orgs/acme/teams/core/members"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"login": "alice", "id": 1}, {"login": "bob", "id": 2}])),
        )
        .mount(&server)
        .await;

    let members = client.list_group_members("acme", "core").await.unwrap();
    assert_eq!(members, vec!["alice", "bob"]);
}

#[tokio::test]
async fn malformed_body_is_a_decode_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/orgs/acme/teams/core/members"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = client.list_group_members("acme", "core").await.unwrap_err();
    assert!(matches!(err, ProviderError::Decode(_)), "got: {err}");
}

#[tokio::test]
async fn scope_membership_maps_204_and_404() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/orgs/acme/members/inside"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/orgs/acme/members/outside"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    assert!(client.is_scope_member("acme", "inside").await.unwrap());
    assert!(!client.is_scope_member("acme", "outside").await.unwrap());
}

#[tokio::test]
async fn scope_membership_server_error_propagates() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/orgs/acme/members/someone"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    let err = client.is_scope_member("acme", "someone").await.unwrap_err();
    assert!(err.is_status(502), "got: {err}");
}

// =============================================================================
// Writes
// =============================================================================

#[tokio::test]
async fn create_sends_parent_and_privacy() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/orgs/acme/teams"))
        .and(body_json(json!({
            "name": "Core",
            "description": "Core team",
            "parent_team_id": 4,
            "privacy": "closed"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(team(12, "Core", "core")))
        .expect(1)
        .mount(&server)
        .await;

    let created = client
        .create_group(
            "acme",
            &NewGroup {
                name: "Core".into(),
                description: Some("Core team".into()),
                parent_id: Some(4),
            },
        )
        .await
        .unwrap();
    assert_eq!(created.id, 12);
    assert_eq!(created.slug, "core");
}

#[tokio::test]
async fn update_patches_name_and_description() {
    let (server, client) = setup().await;

    Mock::given(method("PATCH"))
        .and(path("/orgs/acme/teams/core"))
        .and(body_json(json!({"name": "Core", "description": "d"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(team(12, "Core", "core")))
        .expect(1)
        .mount(&server)
        .await;

    client.update_group("acme", "core", "Core", Some("d")).await.unwrap();
}

#[tokio::test]
async fn add_membership_puts_member_role() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/orgs/acme/teams/core/memberships/alice"))
        .and(body_json(json!({"role": "member"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"role": "member", "state": "active"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    client.add_membership("acme", "core", "alice").await.unwrap();
}

#[tokio::test]
async fn remove_membership_deletes() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/orgs/acme/teams/core/memberships/alice"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client.remove_membership("acme", "core", "alice").await.unwrap();
}

#[tokio::test]
async fn write_failure_carries_status() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/orgs/acme/teams/core/memberships/ghost"))
        .respond_with(
            ResponseTemplate::new(422).set_body_json(json!({"message": "Validation Failed"})),
        )
        .mount(&server)
        .await;

    let err = client.add_membership("acme", "core", "ghost").await.unwrap_err();
    assert!(err.is_status(422), "got: {err}");
}

// =============================================================================
// URL construction
// =============================================================================

#[tokio::test]
async fn login_with_separators_stays_in_one_path_segment() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/orgs/acme/teams/core/memberships/..%2F..%2Fx"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"role": "member"})))
        .expect(1)
        .mount(&server)
        .await;

    client.add_membership("acme", "core", "../../x").await.unwrap();
}

#[tokio::test]
async fn api_url_path_prefix_is_kept() {
    let server = MockServer::start().await;
    let client = GithubClient::new(
        GithubConfig::new("test-token").with_api_url(format!("{}/api/v3/", server.uri())),
    )
    .unwrap();

    Mock::given(method("GET"))
        .and(path("/api/v3/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"login": "octocat"})))
        .expect(1)
        .mount(&server)
        .await;

    assert_eq!(client.current_identity().await.unwrap().as_deref(), Some("octocat"));
}

#[tokio::test]
async fn invalid_api_url_is_a_config_error() {
    let client = GithubClient::new(GithubConfig::new("t").with_api_url("not a url")).unwrap();

    let err = client.list_groups("acme").await.unwrap_err();
    assert!(matches!(err, ProviderError::Config(_)), "got: {err}");
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    let client = GithubClient::new(GithubConfig::new("t").with_api_url("http://127.0.0.1:9"))
        .unwrap();

    let err = client.list_groups("acme").await.unwrap_err();
    assert!(matches!(err, ProviderError::Transport(_)), "got: {err}");
}
