use crate::gateway::error::ApiError;
use crate::gateway::http::ReqwestTransport;
use crate::gateway::traits::Transport;
use crate::gateway::types::{ApiRequest, ClientConfig};
use crate::models::{
    Amenity, Credentials, LoginResponse, NewAmenity, NewPlace, NewReview, NewUser, Place, Review,
    ReviewUpdate, User,
};
use crate::session::SessionStore;
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// The one HTTP client every page goes through.
///
/// It reads the session store before each request to attach the bearer
/// token, and never writes it: persisting a login or dropping a rejected
/// token is the caller's job.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    transport: Arc<dyn Transport>,
    session: Arc<dyn SessionStore>,
}

impl ApiClient {
    pub fn new(
        base_url: impl Into<String>,
        transport: Arc<dyn Transport>,
        session: Arc<dyn SessionStore>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            transport,
            session,
        }
    }

    /// Create a client talking HTTP to `config.base_url`
    pub fn configure(config: &ClientConfig, session: Arc<dyn SessionStore>) -> anyhow::Result<Self> {
        let transport = ReqwestTransport::new(config)?;
        Ok(Self::new(config.base_url.clone(), Arc::new(transport), session))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Arc<dyn SessionStore> {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Send a request and decode the 2xx body as `T`.
    ///
    /// An empty 2xx body decodes as JSON `null`, so `T = ()` works for
    /// endpoints that answer with nothing.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<T, ApiError> {
        let mut headers = vec![("Accept".to_string(), "application/json".to_string())];
        if body.is_some() {
            headers.push(("Content-Type".to_string(), "application/json".to_string()));
        }
        match self.session.token() {
            Some(token) => headers.push(("Authorization".to_string(), format!("Bearer {}", token))),
            None => debug!("No session token, sending {} {} unauthenticated", method, path),
        }

        let request = ApiRequest {
            method: method.clone(),
            url: self.url(path),
            headers,
            body,
        };

        debug!("{} {} via {}", method, path, self.transport.name());

        let response = self.transport.send(request).await.map_err(|e| {
            warn!("{} {} failed without a response: {:#}", method, path, e);
            ApiError::network(format!("{:#}", e))
        })?;

        if !response.is_success() {
            let err = ApiError::from_response(response.status, &response.body);
            warn!("{} {} returned {}: {}", method, path, response.status, err.message);
            return Err(err);
        }

        let text = if response.body.trim().is_empty() {
            "null"
        } else {
            response.body.as_str()
        };

        serde_json::from_str(text).map_err(|e| {
            warn!("{} {} returned an unexpected body: {}", method, path, e);
            ApiError::serialization(
                Some(response.status),
                format!("Unexpected response body: {}", e),
                Some(response.body.clone()),
            )
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(Method::GET, path, None).await
    }

    async fn send_json<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let value = serde_json::to_value(body).map_err(|e| {
            ApiError::serialization(None, format!("Failed to encode request body: {}", e), None)
        })?;
        self.request(method, path, Some(value)).await
    }

    // Places

    pub async fn list_places(&self) -> Result<Vec<Place>, ApiError> {
        self.get("/places").await
    }

    pub async fn get_place(&self, id: &str) -> Result<Place, ApiError> {
        self.get(&format!("/places/{}", segment(id))).await
    }

    pub async fn create_place(&self, place: &NewPlace) -> Result<Place, ApiError> {
        self.send_json(Method::POST, "/places", place).await
    }

    pub async fn add_amenity_to_place(
        &self,
        place_id: &str,
        amenity_id: &str,
    ) -> Result<serde_json::Value, ApiError> {
        let body = serde_json::json!({ "amenity_id": amenity_id });
        self.send_json(Method::POST, &format!("/places/{}/amenities", segment(place_id)), &body)
            .await
    }

    // Amenities

    pub async fn list_amenities(&self) -> Result<Vec<Amenity>, ApiError> {
        self.get("/amenities").await
    }

    pub async fn create_amenity(&self, amenity: &NewAmenity) -> Result<Amenity, ApiError> {
        self.send_json(Method::POST, "/amenities", amenity).await
    }

    // Users and auth

    /// Exchange credentials for a token. Does not touch the session store.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let credentials = Credentials {
            email: email.to_string(),
            password: password.to_string(),
        };
        self.send_json(Method::POST, "/auth/login", &credentials).await
    }

    pub async fn register(&self, user: &NewUser) -> Result<User, ApiError> {
        self.send_json(Method::POST, "/users", user).await
    }

    pub async fn get_user(&self, id: &str) -> Result<User, ApiError> {
        self.get(&format!("/users/{}", segment(id))).await
    }

    /// Whoever the current token belongs to
    pub async fn current_user(&self) -> Result<User, ApiError> {
        self.get("/users/me").await
    }

    pub async fn list_user_places(&self, user_id: &str) -> Result<Vec<Place>, ApiError> {
        self.get(&format!("/users/{}/places", segment(user_id))).await
    }

    // Reviews

    pub async fn list_reviews(&self, place_id: &str) -> Result<Vec<Review>, ApiError> {
        self.get(&format!("/places/{}/reviews", segment(place_id))).await
    }

    pub async fn create_review(&self, review: &NewReview) -> Result<Review, ApiError> {
        review.validate()?;
        self.send_json(Method::POST, "/reviews", review).await
    }

    pub async fn update_review(&self, id: &str, update: &ReviewUpdate) -> Result<Review, ApiError> {
        update.validate()?;
        self.send_json(Method::PUT, &format!("/reviews/{}", segment(id)), update)
            .await
    }

    pub async fn delete_review(&self, id: &str) -> Result<(), ApiError> {
        let _: serde_json::Value = self
            .request(Method::DELETE, &format!("/reviews/{}", segment(id)), None)
            .await?;
        Ok(())
    }
}

/// Percent-encode an id for use as one path segment, so `/`, `?` or `#`
/// inside it can't change the route
fn segment(raw: &str) -> String {
    let Ok(mut url) = Url::parse("http://localhost/") else {
        return raw.to_string();
    };
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.push(raw);
    }
    url.path().trim_start_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::error::ApiErrorKind;
    use crate::gateway::types::ApiResponse;
    use crate::session::{MemorySessionStore, Session};
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Answers with queued responses and remembers what was sent
    #[derive(Default)]
    struct ScriptedTransport {
        responses: Mutex<VecDeque<anyhow::Result<ApiResponse>>>,
        sent: Mutex<Vec<ApiRequest>>,
    }

    impl ScriptedTransport {
        fn reply(&self, status: u16, body: serde_json::Value) {
            self.responses.lock().unwrap().push_back(Ok(ApiResponse {
                status,
                body: body.to_string(),
            }));
        }

        fn reply_raw(&self, status: u16, body: &str) {
            self.responses.lock().unwrap().push_back(Ok(ApiResponse {
                status,
                body: body.to_string(),
            }));
        }

        fn fail(&self, message: &str) {
            self.responses
                .lock()
                .unwrap()
                .push_back(Err(anyhow::anyhow!(message.to_string())));
        }

        fn sent(&self) -> Vec<ApiRequest> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn send(&self, request: ApiRequest) -> anyhow::Result<ApiResponse> {
            self.sent.lock().unwrap().push(request);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(anyhow::anyhow!("no scripted response")))
        }

        fn name(&self) -> &'static str {
            "scripted"
        }
    }

    fn client_with(
        session: Option<Session>,
    ) -> (ApiClient, Arc<ScriptedTransport>, Arc<MemorySessionStore>) {
        let transport = Arc::new(ScriptedTransport::default());
        let store = Arc::new(match session {
            Some(session) => MemorySessionStore::with_session(session),
            None => MemorySessionStore::new(),
        });
        let client = ApiClient::new(
            "http://localhost:8000/api/v1/",
            transport.clone(),
            store.clone(),
        );
        (client, transport, store)
    }

    #[tokio::test]
    async fn attaches_bearer_token_when_present() {
        let (client, transport, _) = client_with(Some(Session::new("abc123", None)));
        transport.reply(200, json!([]));

        let places = client.list_places().await.unwrap();
        assert!(places.is_empty());

        let sent = transport.sent();
        assert_eq!(sent[0].method, Method::GET);
        assert_eq!(sent[0].url, "http://localhost:8000/api/v1/places");
        assert_eq!(sent[0].header("authorization"), Some("Bearer abc123"));
    }

    #[tokio::test]
    async fn sends_unauthenticated_without_token() {
        let (client, transport, _) = client_with(None);
        transport.reply(200, json!({"id": "p1", "title": "Loft"}));

        let place = client.get_place("p1").await.unwrap();
        assert_eq!(place.title, "Loft");

        let sent = transport.sent();
        assert_eq!(sent[0].url, "http://localhost:8000/api/v1/places/p1");
        assert!(sent[0].header("Authorization").is_none());
    }

    #[tokio::test]
    async fn login_returns_token_without_storing_it() {
        let (client, transport, store) = client_with(None);
        transport.reply(200, json!({"access_token": "tok", "user_id": "u1"}));

        let response = client.login("a@b.c", "secret").await.unwrap();
        assert_eq!(response.access_token, "tok");
        assert_eq!(response.user_id.as_deref(), Some("u1"));
        assert!(store.get().is_none());

        let sent = transport.sent();
        assert_eq!(sent[0].method, Method::POST);
        assert!(sent[0].url.ends_with("/auth/login"));
        assert_eq!(sent[0].body, Some(json!({"email": "a@b.c", "password": "secret"})));
        assert_eq!(sent[0].header("content-type"), Some("application/json"));
    }

    #[tokio::test]
    async fn maps_statuses_to_error_kinds() {
        let (client, transport, _) = client_with(None);
        transport.reply(401, json!({"error": "Token expired"}));
        transport.reply(403, json!({"error": "Admin only"}));
        transport.reply(404, json!({"error": "Place not found"}));
        transport.reply(400, json!({"error": "Invalid input data"}));
        transport.reply_raw(500, "boom");

        let err = client.list_places().await.unwrap_err();
        assert_eq!(err.kind, ApiErrorKind::Unauthorized);
        assert!(err.is_unauthorized());

        let err = client.list_amenities().await.unwrap_err();
        assert_eq!(err.kind, ApiErrorKind::Forbidden);

        let err = client.get_place("missing").await.unwrap_err();
        assert_eq!(err.kind, ApiErrorKind::NotFound);
        assert_eq!(err.message, "Place not found");

        let err = client
            .create_amenity(&NewAmenity {
                name: String::new(),
                description: String::new(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind, ApiErrorKind::Validation);
        assert_eq!(err.message, "Invalid input data");

        let err = client.get_user("u1").await.unwrap_err();
        assert_eq!(err.kind, ApiErrorKind::Unknown);
        assert_eq!(err.status(), Some(500));
        assert_eq!(err.raw_body.as_deref(), Some("boom"));
    }

    #[test]
    fn ids_are_encoded_as_single_segments() {
        assert_eq!(segment("p1"), "p1");
        assert_eq!(segment("a/b?c#d"), "a%2Fb%3Fc%23d");
        assert_eq!(segment("two words"), "two%20words");
    }

    #[tokio::test]
    async fn ids_cannot_change_the_route() {
        let (client, transport, _) = client_with(Some(Session::new("tok", None)));
        transport.reply(200, json!({"id": "x", "title": "Loft"}));
        transport.reply_raw(204, "");

        client.get_place("../users/me?x=1").await.unwrap();
        client.delete_review("r1/../../places").await.unwrap();

        let sent = transport.sent();
        assert_eq!(
            sent[0].url,
            "http://localhost:8000/api/v1/places/..%2Fusers%2Fme%3Fx=1"
        );
        assert_eq!(
            sent[1].url,
            "http://localhost:8000/api/v1/reviews/r1%2F..%2F..%2Fplaces"
        );
    }

    #[tokio::test]
    async fn transport_failure_is_network_error() {
        let (client, transport, _) = client_with(None);
        transport.fail("connection refused");

        let err = client.list_places().await.unwrap_err();
        assert_eq!(err.kind, ApiErrorKind::Network);
        assert!(err.status().is_none());
        assert!(err.message.contains("connection refused"));
    }

    #[tokio::test]
    async fn unexpected_body_is_serialization_error() {
        let (client, transport, _) = client_with(None);
        transport.reply(200, json!({"not": "a list"}));

        let err = client.list_places().await.unwrap_err();
        assert_eq!(err.kind, ApiErrorKind::Serialization);
        assert_eq!(err.status(), Some(200));
    }

    #[tokio::test]
    async fn delete_accepts_empty_body() {
        let (client, transport, _) = client_with(Some(Session::new("tok", None)));
        transport.reply_raw(204, "");
        transport.reply(200, json!({"message": "Review deleted successfully"}));

        client.delete_review("r1").await.unwrap();
        client.delete_review("r2").await.unwrap();

        let sent = transport.sent();
        assert_eq!(sent[0].method, Method::DELETE);
        assert!(sent[0].url.ends_with("/reviews/r1"));
        assert!(sent[0].body.is_none());
    }

    #[tokio::test]
    async fn invalid_review_never_leaves_the_client() {
        let (client, transport, _) = client_with(Some(Session::new("tok", None)));
        let review = NewReview {
            text: "Nice".to_string(),
            rating: 9,
            place_id: "p1".to_string(),
            user_id: "u1".to_string(),
        };

        let err = client.create_review(&review).await.unwrap_err();
        assert_eq!(err.kind, ApiErrorKind::Validation);
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn review_routes_and_payloads() {
        let (client, transport, _) = client_with(Some(Session::new("tok", None)));
        transport.reply(200, json!([{"id": "r1", "text": "ok", "rating": 3}]));
        transport.reply(201, json!({"id": "r2", "text": "Great", "rating": 5}));
        transport.reply(200, json!({"id": "r2", "text": "Great", "rating": 4}));

        let reviews = client.list_reviews("p1").await.unwrap();
        assert_eq!(reviews.len(), 1);

        let created = client
            .create_review(&NewReview {
                text: "Great".to_string(),
                rating: 5,
                place_id: "p1".to_string(),
                user_id: "u1".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(created.id, "r2");

        let updated = client
            .update_review(
                "r2",
                &ReviewUpdate {
                    text: None,
                    rating: Some(4),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.rating, 4);

        let sent = transport.sent();
        assert!(sent[0].url.ends_with("/places/p1/reviews"));
        assert_eq!(sent[1].method, Method::POST);
        assert!(sent[1].url.ends_with("/reviews"));
        assert_eq!(sent[2].method, Method::PUT);
        assert!(sent[2].url.ends_with("/reviews/r2"));
        assert_eq!(sent[2].body, Some(json!({"rating": 4})));
    }

    #[tokio::test]
    async fn user_routes() {
        let (client, transport, _) = client_with(Some(Session::new("tok", Some("u1".into()))));
        let user = json!({
            "id": "u1",
            "first_name": "Ada",
            "last_name": "Lovelace",
            "email": "ada@example.com"
        });
        transport.reply(200, user.clone());
        transport.reply(200, user.clone());
        transport.reply(200, json!([{"id": "p1", "title": "Loft", "owner_id": "u1"}]));
        transport.reply(201, user);

        assert_eq!(client.current_user().await.unwrap().full_name(), "Ada Lovelace");
        assert!(!client.get_user("u1").await.unwrap().is_admin);
        assert_eq!(client.list_user_places("u1").await.unwrap().len(), 1);
        client
            .register(&NewUser {
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
                email: "ada@example.com".to_string(),
                password: "hunter22".to_string(),
                bio: None,
            })
            .await
            .unwrap();

        let urls: Vec<String> = transport.sent().into_iter().map(|r| r.url).collect();
        assert_eq!(
            urls,
            vec![
                "http://localhost:8000/api/v1/users/me",
                "http://localhost:8000/api/v1/users/u1",
                "http://localhost:8000/api/v1/users/u1/places",
                "http://localhost:8000/api/v1/users",
            ]
        );
    }

    #[tokio::test]
    async fn place_creation_and_amenity_link() {
        let (client, transport, _) = client_with(Some(Session::new("tok", Some("u1".into()))));
        transport.reply(201, json!({"id": "p9", "title": "Cabin", "price": 120.0}));
        transport.reply(200, json!({"message": "Amenity added"}));

        let place = client
            .create_place(&NewPlace {
                title: "Cabin".to_string(),
                description: "In the woods".to_string(),
                price: 120.0,
                latitude: 61.0,
                longitude: 14.5,
                bedrooms: Some(2),
                property_type: Some(crate::models::PropertyType::Cabin),
                owner_id: "u1".to_string(),
                amenities: vec![],
            })
            .await
            .unwrap();
        assert_eq!(place.price, Some(120.0));

        client.add_amenity_to_place("p9", "a1").await.unwrap();

        let sent = transport.sent();
        assert_eq!(sent[0].body.as_ref().unwrap()["property_type"], json!("cabin"));
        assert!(sent[1].url.ends_with("/places/p9/amenities"));
        assert_eq!(sent[1].body, Some(json!({"amenity_id": "a1"})));
    }
}
