pub mod users_create;
pub mod users_delete;
pub mod users_get;
pub mod users_list;
pub mod users_search;
pub mod users_update;

// ***************************************************************************
//                                  Tests
// ***************************************************************************
#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use poem::http::StatusCode;
    use poem::test::{TestClient, TestResponse};
    use poem::Endpoint;
    use serde_json::{json, Value};

    use crate::api::make_app;
    use crate::utils::directory::UserDirectory;

    fn client() -> TestClient<impl Endpoint> {
        let directory = Arc::new(UserDirectory::with_seed_users());
        TestClient::new(make_app(directory, "User Directory Test", "http://localhost:3000/api"))
    }

    async fn body(resp: TestResponse) -> Value {
        resp.0.into_body().into_json().await.unwrap()
    }

    fn ids(v: &Value) -> Vec<&str> {
        v.as_array().unwrap().iter().map(|u| u["id"].as_str().unwrap()).collect()
    }

    fn ana() -> Value {
        json!({
            "name": "Ana Souza",
            "email": "ana@exemplo.com",
            "phone": "(31) 91234-5678",
            "age": 41,
            "gender": "Feminino",
            "address": "Rua da Bahia, 20 - Belo Horizonte, MG"
        })
    }

    #[tokio::test]
    async fn list_returns_seed_users() {
        let cli = client();
        let resp = cli.get("/api/users").send().await;
        resp.assert_status_is_ok();
        let v = body(resp).await;
        assert_eq!(ids(&v), vec!["1", "2"]);
        assert_eq!(v[0]["email"], "joao@exemplo.com");
        assert_eq!(v[1]["age"], 35);
    }

    #[tokio::test]
    async fn search_route_is_not_captured_by_id() {
        let cli = client();
        let resp = cli.get("/api/users/search").query("q", &"rio").send().await;
        resp.assert_status_is_ok();
        assert_eq!(ids(&body(resp).await), vec!["2"]);
    }

    #[tokio::test]
    async fn search_without_query_lists_everyone() {
        let cli = client();
        let resp = cli.get("/api/users/search").send().await;
        resp.assert_status_is_ok();
        assert_eq!(ids(&body(resp).await), vec!["1", "2"]);

        let resp = cli.get("/api/users/search").query("q", &"").send().await;
        resp.assert_status_is_ok();
        assert_eq!(ids(&body(resp).await), vec!["1", "2"]);
    }

    #[tokio::test]
    async fn search_ignores_case() {
        let cli = client();
        let resp = cli.get("/api/users/search").query("q", &"MARIA").send().await;
        assert_eq!(ids(&body(resp).await), vec!["2"]);
    }

    #[tokio::test]
    async fn get_by_id() {
        let cli = client();
        let resp = cli.get("/api/users/1").send().await;
        resp.assert_status_is_ok();
        assert_eq!(body(resp).await["name"], "João Silva");

        let resp = cli.get("/api/users/99").send().await;
        resp.assert_status(StatusCode::NOT_FOUND);
        assert_eq!(body(resp).await, json!({"message": "not found"}));
    }

    #[tokio::test]
    async fn create_assigns_id() {
        let cli = client();
        let mut payload = ana();
        payload["id"] = json!("client-chosen");
        let resp = cli.post("/api/users").body_json(&payload).send().await;
        resp.assert_status(StatusCode::CREATED);
        let created = body(resp).await;
        let id = created["id"].as_str().unwrap().to_string();
        assert_ne!(id, "client-chosen");

        let mut expected = ana();
        expected["id"] = json!(id);
        assert_eq!(created, expected);

        let resp = cli.get(format!("/api/users/{}", id)).send().await;
        resp.assert_status_is_ok();
        assert_eq!(body(resp).await, expected);
    }

    #[tokio::test]
    async fn create_duplicate_email() {
        let cli = client();
        let resp = cli.post("/api/users")
            .body_json(&json!({"name": "X", "email": "joao@exemplo.com"}))
            .send().await;
        resp.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(body(resp).await, json!({"message": "duplicate email"}));

        let resp = cli.get("/api/users").send().await;
        assert_eq!(ids(&body(resp).await).len(), 2);
    }

    #[tokio::test]
    async fn create_keeps_attributes_of_any_type() {
        let cli = client();
        let payload = json!({
            "name": 123,
            "email": "tipos@exemplo.com",
            "phone": 11987654321_i64,
            "age": "28",
            "address": ["Rua A", 1]
        });
        let resp = cli.post("/api/users").body_json(&payload).send().await;
        resp.assert_status(StatusCode::CREATED);
        let created = body(resp).await;
        assert_eq!(created["age"], "28");
        assert_eq!(created["phone"], 11987654321_i64);
        assert_eq!(created["name"], 123);
        assert_eq!(created["address"], json!(["Rua A", 1]));

        let resp = cli.get(format!("/api/users/{}", created["id"].as_str().unwrap())).send().await;
        assert_eq!(body(resp).await, created);
    }

    #[tokio::test]
    async fn update_is_full_replace() {
        let cli = client();
        let resp = cli.put("/api/users/1")
            .body_json(&json!({"id": "7", "name": "João S.", "email": "new@x.com"}))
            .send().await;
        resp.assert_status_is_ok();

        let expected = json!({"id": "1", "name": "João S.", "email": "new@x.com"});
        assert_eq!(body(resp).await, expected);

        let resp = cli.get("/api/users/1").send().await;
        assert_eq!(body(resp).await, expected);
    }

    #[tokio::test]
    async fn update_failures() {
        let cli = client();
        let resp = cli.put("/api/users/2")
            .body_json(&json!({"name": "Maria", "email": "joao@exemplo.com"}))
            .send().await;
        resp.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(body(resp).await, json!({"message": "duplicate email"}));

        let resp = cli.put("/api/users/404").body_json(&ana()).send().await;
        resp.assert_status(StatusCode::NOT_FOUND);
        assert_eq!(body(resp).await, json!({"message": "not found"}));

        // Keeping one's own email is fine.
        let resp = cli.put("/api/users/2")
            .body_json(&json!({"name": "Maria O.", "email": "maria@exemplo.com"}))
            .send().await;
        resp.assert_status_is_ok();
    }

    #[tokio::test]
    async fn delete_then_get() {
        let cli = client();
        let resp = cli.delete("/api/users/1").send().await;
        resp.assert_status_is_ok();
        assert_eq!(body(resp).await, json!({"message": "deleted"}));

        cli.get("/api/users/1").send().await.assert_status(StatusCode::NOT_FOUND);
        cli.delete("/api/users/1").send().await.assert_status(StatusCode::NOT_FOUND);

        let resp = cli.get("/api/users").send().await;
        assert_eq!(ids(&body(resp).await), vec!["2"]);
    }

    #[tokio::test]
    async fn version_and_spec() {
        let cli = client();
        let resp = cli.get("/api/version").send().await;
        resp.assert_status_is_ok();
        assert_eq!(body(resp).await["server_version"], env!("CARGO_PKG_VERSION"));

        cli.get("/spec").send().await.assert_status_is_ok();
    }

    #[tokio::test]
    async fn cors_allows_any_origin() {
        let cli = client();
        let resp = cli.get("/api/users")
            .header("Origin", "http://example.com")
            .send().await;
        resp.assert_status_is_ok();
        assert!(resp.0.headers().contains_key("access-control-allow-origin"));
    }
}
