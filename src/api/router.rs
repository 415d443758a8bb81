use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use super::admin;
use super::auth;
use super::health;
use super::state::AppState;
use super::v1;

/// Create the full router with application state
pub fn create_router_with_state(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        .route("/live", get(health::live_check))
        .nest("/auth", auth::create_auth_router())
        .nest("/v1", v1::create_v1_router())
        .nest("/admin", admin::create_admin_router())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::domain::group_mapping::{GroupMapping, GroupMappingConfig};
    use crate::domain::organization::{Organization, OrganizationId, OrganizationRepository};
    use crate::infrastructure::api_key::{ApiKeyService, InMemoryApiKeyRepository};
    use crate::infrastructure::auth::{
        IdTokenAlgorithm, IdTokenConfig, JwtConfig, JwtGenerator, JwtIdTokenVerifier, JwtService,
    };
    use crate::infrastructure::group_mapping::{GroupRoleResolver, InMemoryGroupMappingSource};
    use crate::infrastructure::oauth::InMemoryOAuthStateStore;
    use crate::infrastructure::organization::InMemoryOrganizationRepository;

    const IDP_ISSUER: &str = "https://idp.test";
    const IDP_CLIENT_ID: &str = "registry";
    const IDP_SECRET: &str = "idp-test-secret";

    struct TestApp {
        state: AppState,
        router: Router,
        jwt: JwtService,
        organizations: InMemoryOrganizationRepository,
        default_org: OrganizationId,
    }

    async fn test_app() -> TestApp {
        let organizations = InMemoryOrganizationRepository::with_default_organization("default");
        organizations
            .add_organization(Organization::new(OrganizationId::new("org-infra"), "infra"))
            .await
            .unwrap();
        let default_org = organizations
            .get_default_organization()
            .await
            .unwrap()
            .unwrap()
            .id()
            .clone();
        organizations
            .add_member(&default_org, "alice", "publisher")
            .await
            .unwrap();

        let jwt = JwtService::new(JwtConfig::new("router-test-secret", 1)).unwrap();
        let group_mappings = Arc::new(InMemoryGroupMappingSource::new());
        let static_config = GroupMappingConfig::new("groups")
            .with_mapping(GroupMapping::new("ops", "infra", "devops"));

        let state = AppState {
            api_key_service: Arc::new(ApiKeyService::new(
                Arc::new(InMemoryApiKeyRepository::new()),
                Arc::new(organizations.clone()),
            )),
            jwt_service: Arc::new(jwt.clone()),
            oauth_states: Arc::new(InMemoryOAuthStateStore::default()),
            id_tokens: Some(Arc::new(
                JwtIdTokenVerifier::new(&IdTokenConfig {
                    issuer: IDP_ISSUER.to_string(),
                    client_id: IDP_CLIENT_ID.to_string(),
                    algorithm: IdTokenAlgorithm::Hs256,
                    verification_key: Some(IDP_SECRET.to_string()),
                })
                .unwrap(),
            )),
            organizations: Arc::new(organizations.clone()),
            group_roles: Arc::new(
                GroupRoleResolver::new(Arc::new(organizations.clone()), static_config)
                    .with_dynamic_source(group_mappings.clone()),
            ),
            group_mappings,
        };

        TestApp {
            router: create_router_with_state(state.clone()),
            state,
            jwt,
            organizations,
            default_org,
        }
    }

    impl TestApp {
        fn token(&self, user: &str, scopes: &[&str]) -> String {
            let scopes: Vec<String> = scopes.iter().map(|s| s.to_string()).collect();
            self.jwt.generate(user, &scopes).unwrap()
        }

        fn id_token_signed_with(&self, user: &str, groups: &[&str], secret: &str) -> String {
            let claims = json!({
                "iss": IDP_ISSUER,
                "aud": IDP_CLIENT_ID,
                "sub": user,
                "exp": chrono::Utc::now().timestamp() + 600,
                "groups": groups,
            });

            jsonwebtoken::encode(
                &jsonwebtoken::Header::new(jsonwebtoken::Algorithm::HS256),
                &claims,
                &jsonwebtoken::EncodingKey::from_secret(secret.as_bytes()),
            )
            .unwrap()
        }

        fn id_token(&self, user: &str, groups: &[&str]) -> String {
            self.id_token_signed_with(user, groups, IDP_SECRET)
        }

        async fn login_state(&self) -> String {
            let (status, login) = self.send(Method::GET, "/auth/login", None, None).await;
            assert_eq!(status, StatusCode::OK);
            login["state"].as_str().unwrap().to_string()
        }

        async fn send(
            &self,
            method: Method,
            uri: &str,
            bearer: Option<&str>,
            body: Option<Value>,
        ) -> (StatusCode, Value) {
            let mut builder = Request::builder().method(method).uri(uri);
            if let Some(token) = bearer {
                builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
            }
            let request = match body {
                Some(body) => builder
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
                None => builder.body(Body::empty()).unwrap(),
            };

            let response = self.router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = response.into_body().collect().await.unwrap().to_bytes();
            let value = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap()
            };

            (status, value)
        }
    }

    #[tokio::test]
    async fn test_health() {
        let app = test_app().await;
        let (status, body) = app.send(Method::GET, "/health", None, None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_api_keys_require_authentication() {
        let app = test_app().await;
        let (status, _) = app.send(Method::GET, "/v1/apikeys", None, None).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_key_lifecycle_over_http() {
        let app = test_app().await;
        let token = app.token("alice", &["modules:read", "modules:write"]);

        let (status, created) = app
            .send(
                Method::POST,
                "/v1/apikeys",
                Some(token.as_str()),
                Some(json!({"name": "ci", "scopes": ["modules:read"]})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let secret = created["key"].as_str().unwrap().to_string();
        let id = created["id"].as_str().unwrap().to_string();
        assert!(secret.starts_with("tfr_"));
        assert!(created.get("secret_hash").is_none());

        // the new key authenticates as its owner with its own scopes
        let (status, listed) = app
            .send(Method::GET, "/v1/apikeys", Some(secret.as_str()), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed.as_array().unwrap().len(), 1);

        let (status, rotated) = app
            .send(
                Method::POST,
                &format!("/v1/apikeys/{}/rotate", id),
                Some(token.as_str()),
                Some(json!({"grace_period_hours": 0})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(rotated["old_key_status"], "revoked");
        assert_eq!(rotated["new_key"]["name"], "ci (rotated)");

        let (status, _) = app
            .send(Method::GET, "/v1/apikeys", Some(secret.as_str()), None)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = app
            .send(Method::GET, &format!("/v1/apikeys/{}", id), Some(token.as_str()), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_scope_escalation_is_forbidden_with_details() {
        let app = test_app().await;
        let token = app.token("alice", &["modules:read"]);

        let (status, body) = app
            .send(
                Method::POST,
                "/v1/apikeys",
                Some(token.as_str()),
                Some(json!({"name": "ci", "scopes": ["mirrors:manage"]})),
            )
            .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["code"], "scope_exceeds_role");
        assert_eq!(body["error"]["role_template"], "publisher");
    }

    #[tokio::test]
    async fn test_unknown_scope_is_bad_request() {
        let app = test_app().await;
        let token = app.token("alice", &[]);

        let (status, body) = app
            .send(
                Method::POST,
                "/v1/apikeys",
                Some(token.as_str()),
                Some(json!({"name": "ci", "scopes": ["modules:delete"]})),
            )
            .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "invalid_scope");
    }

    #[tokio::test]
    async fn test_malformed_key_id_is_not_found() {
        let app = test_app().await;
        let token = app.token("alice", &[]);

        let (status, _) = app
            .send(Method::GET, "/v1/apikeys/not-a-key", Some(token.as_str()), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_oauth_state_is_single_use() {
        let app = test_app().await;

        let (status, login) = app.send(Method::GET, "/auth/login?provider=oidc", None, None).await;
        assert_eq!(status, StatusCode::OK);
        let state = login["state"].as_str().unwrap().to_string();

        let callback = json!({
            "state": state,
            "id_token": app.id_token("bob", &["ops"]),
        });

        let (status, body) = app
            .send(Method::POST, "/auth/callback", None, Some(callback.clone()))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user_id"], "bob");
        assert_eq!(body["assignments"][0]["role"], "devops");
        assert_eq!(body["assignments"][0]["change"], "added");

        let membership = app
            .organizations
            .check_membership(&OrganizationId::new("org-infra"), "bob")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(membership.role.as_deref(), Some("devops"));

        let (status, body) = app
            .send(Method::POST, "/auth/callback", None, Some(callback))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "invalid_state");
    }

    #[tokio::test]
    async fn test_callback_issues_session_with_role_scopes() {
        let app = test_app().await;
        let state = app.login_state().await;

        let (status, body) = app
            .send(
                Method::POST,
                "/auth/callback",
                None,
                Some(json!({"state": state, "id_token": app.id_token("bob", &["ops"])})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["scopes"]
            .as_array()
            .unwrap()
            .contains(&json!("mirrors:manage")));
        assert_eq!(body["expires_in"], 3600);

        let session = body["token"].as_str().unwrap().to_string();
        let claims = app.jwt.validate(&session).unwrap();
        assert_eq!(claims.user_id(), "bob");

        let (status, listed) = app
            .send(Method::GET, "/v1/apikeys", Some(session.as_str()), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed, json!([]));

        let (status, created) = app
            .send(
                Method::POST,
                "/v1/apikeys",
                Some(session.as_str()),
                Some(json!({
                    "name": "mirror-sync",
                    "organization_id": "org-infra",
                    "scopes": ["mirrors:manage"]
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["scopes"], json!(["mirrors:manage"]));
    }

    #[tokio::test]
    async fn test_forged_identity_cannot_claim_roles() {
        let app = test_app().await;

        // bare claims instead of a signed ID token
        let state = app.login_state().await;
        let (status, _) = app
            .send(
                Method::POST,
                "/auth/callback",
                None,
                Some(json!({
                    "state": state,
                    "claims": {"sub": "mallory", "groups": ["ops"]}
                })),
            )
            .await;
        assert!(status.is_client_error());

        // token signed by someone other than the identity provider
        let state = app.login_state().await;
        let forged = app.id_token_signed_with("mallory", &["ops"], "attacker-secret");
        let (status, body) = app
            .send(
                Method::POST,
                "/auth/callback",
                None,
                Some(json!({"state": state, "id_token": forged})),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "invalid_id_token");

        assert!(app
            .organizations
            .check_membership(&OrganizationId::new("org-infra"), "mallory")
            .await
            .unwrap()
            .is_none());

        let session = app.token("mallory", &[]);
        let (status, body) = app
            .send(
                Method::POST,
                "/v1/apikeys",
                Some(session.as_str()),
                Some(json!({
                    "name": "escalate",
                    "organization_id": "org-infra",
                    "scopes": ["mirrors:manage", "scm:manage"]
                })),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["code"], "not_a_member");
    }

    #[tokio::test]
    async fn test_callback_refused_without_identity_provider() {
        let app = test_app().await;
        let mut state = app.state.clone();
        state.id_tokens = None;
        let router = create_router_with_state(state);

        let pending = app.login_state().await;
        let request = Request::builder()
            .method(Method::POST)
            .uri("/auth/callback")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({"state": pending, "id_token": app.id_token("bob", &["ops"])}).to_string(),
            ))
            .unwrap();

        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        // the pending login was left untouched
        assert!(app.state.oauth_states.consume(&pending).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_login_rejects_unknown_provider() {
        let app = test_app().await;
        let (status, _) = app
            .send(Method::GET, "/auth/login?provider=github", None, None)
            .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_group_mapping_admin_requires_admin() {
        let app = test_app().await;
        let token = app.token("alice", &["api_keys:manage"]);

        let (status, _) = app
            .send(Method::GET, "/admin/oidc/group-mapping", Some(token.as_str()), None)
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_stored_group_mapping_replaces_static() {
        let app = test_app().await;
        let admin = app.token("root", &["admin"]);

        let (status, body) = app
            .send(
                Method::PUT,
                "/admin/oidc/group-mapping",
                Some(admin.as_str()),
                Some(json!({"group_claim_name": "roles", "default_role": "viewer"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["effective"]["group_claim_name"], "roles");
        assert_eq!(body["effective"]["group_mappings"], json!([]));

        // "ops" only maps statically, so the stored default role applies
        let (status, preview) = app
            .send(
                Method::POST,
                "/admin/oidc/group-mapping/preview",
                Some(admin.as_str()),
                Some(json!({"groups": ["ops"]})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(preview["assignments"][0]["role"], "viewer");
        assert_eq!(
            preview["assignments"][0]["organization_id"],
            app.default_org.as_str()
        );

        let (status, _) = app
            .send(Method::DELETE, "/admin/oidc/group-mapping", Some(admin.as_str()), None)
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (_, body) = app
            .send(Method::GET, "/admin/oidc/group-mapping", Some(admin.as_str()), None)
            .await;
        assert_eq!(body["stored"], Value::Null);
        assert_eq!(body["effective"]["group_claim_name"], "groups");
    }

    #[tokio::test]
    async fn test_invalid_group_mapping_rejected() {
        let app = test_app().await;
        let admin = app.token("root", &["admin"]);

        let (status, _) = app
            .send(
                Method::PUT,
                "/admin/oidc/group-mapping",
                Some(admin.as_str()),
                Some(json!({"group_mappings": [{"group": "", "organization": "infra", "role": "viewer"}]})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
