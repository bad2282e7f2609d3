//! Integration tests for the property listings server
//!
//! Each test boots the full router on a random local port with an in-memory
//! database and drives it over HTTP, the way the front end does.

use std::path::Path;
use std::sync::Arc;

use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::net::TcpListener;

use property_listings::{
    config::Config,
    db::Database,
    notify::{MemoryNotifier, Notification},
    server::{router, AppState},
};

// ==================== Test Helpers ====================

const PASSWORD: &str = "correct horse 42";
const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

struct TestApp {
    base_url: String,
    http: Client,
    notifier: Arc<MemoryNotifier>,
    uploads: TempDir,
}

fn create_test_config(app_url: &str, temp_dir: &TempDir) -> Config {
    Config {
        port: 0,
        app_name: "Property Listings".to_string(),
        app_url: app_url.to_string(),
        database_url: "sqlite::memory:".to_string(),
        upload_dir: temp_dir.path().to_str().unwrap().to_string(),
        max_upload_bytes: 1024 * 1024,
        session_lifetime_minutes: 120,
        remember_days: 30,
        reset_token_ttl_minutes: 60,
        per_page: 12,
        default_locale: "en".to_string(),
        admin_email: Some("admin@example.com".to_string()),
        prune_schedule: "0 0 * * * *".to_string(),
    }
}

async fn spawn_app() -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let base_url = format!("http://{}", listener.local_addr().expect("addr"));

    let uploads = TempDir::new().expect("temp dir");
    let config = create_test_config(&base_url, &uploads);
    let db = Database::new(&config.database_url).await.expect("db");
    let notifier = Arc::new(MemoryNotifier::default());
    let state = AppState::new(config, db, notifier.clone());

    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.expect("server");
    });

    TestApp {
        base_url,
        http: Client::new(),
        notifier,
        uploads,
    }
}

impl TestApp {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get(&self, path: &str, token: Option<&str>) -> reqwest::Response {
        let mut request = self.http.get(self.url(path));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        request.send().await.expect("request")
    }

    async fn send_json(
        &self,
        method: reqwest::Method,
        path: &str,
        token: Option<&str>,
        body: Value,
    ) -> reqwest::Response {
        let mut request = self.http.request(method, self.url(path)).json(&body);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        request.send().await.expect("request")
    }

    async fn post(&self, path: &str, token: Option<&str>, body: Value) -> reqwest::Response {
        self.send_json(reqwest::Method::POST, path, token, body).await
    }

    /// POST each file in `files` as a multipart part named `field`
    async fn upload(&self, path: &str, token: &str, field: &str, files: &[&[u8]]) -> reqwest::Response {
        let mut form = Form::new();
        for (i, bytes) in files.iter().enumerate() {
            let part = Part::bytes(bytes.to_vec()).file_name(format!("upload-{}.bin", i));
            form = form.part(field.to_string(), part);
        }
        self.http
            .post(self.url(path))
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await
            .expect("request")
    }

    fn upload_root(&self) -> &Path {
        self.uploads.path()
    }

    /// Register an account and return its session token and user id
    async fn register(&self, name: &str, email: &str) -> (String, i64) {
        let response = self
            .post(
                "/register",
                None,
                json!({
                    "name": name,
                    "email": email,
                    "password": PASSWORD,
                    "password_confirmation": PASSWORD,
                }),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let body: Value = response.json().await.expect("json");
        let token = body["token"].as_str().expect("token").to_string();
        let id = body["user"]["id"].as_i64().expect("id");
        (token, id)
    }

    /// Follow the most recent verification link sent to `email`
    async fn verify(&self, email: &str) {
        let url = self
            .notifier
            .sent()
            .into_iter()
            .rev()
            .find_map(|n| match n {
                Notification::VerifyEmail { to, url } if to == email => Some(url),
                _ => None,
            })
            .expect("verification link");

        let response = self.http.get(url).send().await.expect("request");
        assert_eq!(response.status(), StatusCode::OK);
    }

    async fn verified_user(&self, name: &str, email: &str) -> (String, i64) {
        let (token, id) = self.register(name, email).await;
        self.verify(email).await;
        (token, id)
    }

    async fn create_listing(&self, token: &str, title: &str) -> i64 {
        let response = self.post("/properties", Some(token), listing(title)).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body: Value = response.json().await.expect("json");
        body["property"]["id"].as_i64().expect("property id")
    }
}

fn listing(title: &str) -> Value {
    json!({
        "title": title,
        "description": "Two bedrooms with a balcony over the square.",
        "price": 250000,
        "location": "Lisbon",
        "property_type": "apartment",
        "listing_type": "sale",
        "bedrooms": 2,
        "bathrooms": 1,
        "surface": 85,
    })
}

// ==================== Meta Endpoint Tests ====================

#[tokio::test]
async fn test_health_and_translations() {
    let app = spawn_app().await;

    assert_eq!(app.get("/health", None).await.status(), StatusCode::OK);

    let response = app.get("/translations/es", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let strings: Value = response.json().await.expect("json");
    assert_eq!(strings["registered"], "¡Bienvenido! Tu cuenta ha sido creada.");

    assert_eq!(
        app.get("/translations/xx", None).await.status(),
        StatusCode::NOT_FOUND
    );

    let languages: Value = app.get("/languages", None).await.json().await.expect("json");
    assert_eq!(languages["default"], "en");
    assert!(languages["languages"].as_array().expect("array").len() >= 2);
}

#[tokio::test]
async fn test_errors_answer_in_requested_language() {
    let app = spawn_app().await;

    let spanish = |path: &str| {
        app.http
            .get(app.url(path))
            .header(reqwest::header::ACCEPT_LANGUAGE, "es")
            .send()
    };

    let missing = spanish("/properties/9999").await.expect("request");
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    let body: Value = missing.json().await.expect("json");
    assert_eq!(body["message"], "No encontrado.");

    let guest = spanish("/dashboard").await.expect("request");
    assert_eq!(guest.status(), StatusCode::UNAUTHORIZED);
    let body: Value = guest.json().await.expect("json");
    assert_eq!(body["message"], "No autenticado.");

    let unknown = spanish("/translations/xx").await.expect("request");
    let body: Value = unknown.json().await.expect("json");
    assert_eq!(body["message"], "No encontrado.");

    let english: Value = app.get("/properties/9999", None).await.json().await.expect("json");
    assert_eq!(english["message"], "Not found.");
}

// ==================== Account Tests ====================

#[tokio::test]
async fn test_register_validation_errors() {
    let app = spawn_app().await;

    let response = app.post("/register", None, json!({})).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body: Value = response.json().await.expect("json");
    assert!(body["errors"]["name"].is_string());
    assert!(body["errors"]["email"].is_string());
    assert!(body["errors"]["password"].is_string());
}

#[tokio::test]
async fn test_register_login_logout() {
    let app = spawn_app().await;
    let (first_token, _) = app.register("Ana", "ana@example.com").await;

    // Same address again, different case
    let duplicate = app
        .post(
            "/register",
            None,
            json!({
                "name": "Ana Again",
                "email": "ANA@example.com",
                "password": PASSWORD,
                "password_confirmation": PASSWORD,
            }),
        )
        .await;
    assert_eq!(duplicate.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let wrong = app
        .post(
            "/login",
            None,
            json!({ "email": "ana@example.com", "password": "not the password" }),
        )
        .await;
    assert_eq!(wrong.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = wrong.json().await.expect("json");
    assert_eq!(body["errors"]["email"], "These credentials do not match our records.");

    let login = app
        .post(
            "/login",
            None,
            json!({ "email": "ana@example.com", "password": PASSWORD, "remember": true }),
        )
        .await;
    assert_eq!(login.status(), StatusCode::OK);
    let cookie = login
        .headers()
        .get(reqwest::header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .expect("session cookie")
        .to_string();
    assert!(cookie.starts_with("session="));
    assert!(cookie.contains("HttpOnly"));
    let body: Value = login.json().await.expect("json");
    let token = body["token"].as_str().expect("token").to_string();

    assert_eq!(app.post("/logout", Some(token.as_str()), json!({})).await.status(), StatusCode::OK);
    assert_eq!(
        app.get("/dashboard", Some(token.as_str())).await.status(),
        StatusCode::UNAUTHORIZED
    );

    // The registration session is independent
    assert_eq!(
        app.get("/dashboard", Some(first_token.as_str())).await.status(),
        StatusCode::OK
    );
}

#[tokio::test]
async fn test_session_cookie_is_accepted() {
    let app = spawn_app().await;
    let (token, _) = app.register("Bruno", "bruno@example.com").await;

    let response = app
        .http
        .get(app.url("/dashboard"))
        .header(reqwest::header::COOKIE, format!("session={}", token))
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_flash_is_shown_once() {
    let app = spawn_app().await;
    let (token, _) = app.register("Carla", "carla@example.com").await;

    let page: Value = app.get("/dashboard", Some(token.as_str())).await.json().await.expect("json");
    assert_eq!(page["component"], "Dashboard");
    assert_eq!(page["flash"], "Welcome! Your account has been created.");
    assert_eq!(page["auth"]["email"], "carla@example.com");

    let page: Value = app.get("/dashboard", Some(token.as_str())).await.json().await.expect("json");
    assert!(page["flash"].is_null());
}

#[tokio::test]
async fn test_password_reset_flow() {
    let app = spawn_app().await;
    let (old_token, _) = app.register("Dora", "dora@example.com").await;

    // Unknown addresses get the same answer
    let unknown = app
        .post("/forgot-password", None, json!({ "email": "nobody@example.com" }))
        .await;
    assert_eq!(unknown.status(), StatusCode::OK);

    let known = app
        .post("/forgot-password", None, json!({ "email": "dora@example.com" }))
        .await;
    assert_eq!(known.status(), StatusCode::OK);

    let url = match app.notifier.last() {
        Some(Notification::ResetPassword { to, url }) => {
            assert_eq!(to, "dora@example.com");
            url
        }
        other => panic!("expected reset link, got {:?}", other),
    };
    let token = url
        .split("/reset-password/")
        .nth(1)
        .and_then(|rest| rest.split('?').next())
        .expect("token in url")
        .to_string();

    // The emailed link opens the reset form with the token and address filled in
    let form = app.http.get(url.as_str()).send().await.expect("request");
    assert_eq!(form.status(), StatusCode::OK);
    let form: Value = form.json().await.expect("json");
    assert_eq!(form["component"], "Auth/ResetPassword");
    assert_eq!(form["props"]["token"], token.as_str());
    assert_eq!(form["props"]["email"], "dora@example.com");

    let bad = app
        .post(
            "/reset-password",
            None,
            json!({
                "token": "forged",
                "email": "dora@example.com",
                "password": "a brand new pass",
                "password_confirmation": "a brand new pass",
            }),
        )
        .await;
    assert_eq!(bad.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let reset = app
        .post(
            "/reset-password",
            None,
            json!({
                "token": token,
                "email": "dora@example.com",
                "password": "a brand new pass",
                "password_confirmation": "a brand new pass",
            }),
        )
        .await;
    assert_eq!(reset.status(), StatusCode::OK);

    // Existing sessions are revoked
    assert_eq!(
        app.get("/dashboard", Some(old_token.as_str())).await.status(),
        StatusCode::UNAUTHORIZED
    );

    let old_password = app
        .post("/login", None, json!({ "email": "dora@example.com", "password": PASSWORD }))
        .await;
    assert_eq!(old_password.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let new_password = app
        .post(
            "/login",
            None,
            json!({ "email": "dora@example.com", "password": "a brand new pass" }),
        )
        .await;
    assert_eq!(new_password.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_invalid_verification_link_is_forbidden() {
    let app = spawn_app().await;
    let (_, id) = app.register("Eva", "eva@example.com").await;

    let response = app.get(&format!("/verify-email/{}/wrong-token", id), None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_password_change_revokes_other_sessions() {
    let app = spawn_app().await;
    let (other_device, _) = app.register("Teresa", "teresa@example.com").await;
    let login: Value = app
        .post("/login", None, json!({ "email": "teresa@example.com", "password": PASSWORD }))
        .await
        .json()
        .await
        .expect("json");
    let current = login["token"].as_str().expect("token").to_string();

    let change = |current_password: &str| {
        json!({
            "current_password": current_password,
            "password": "a fresh passphrase",
            "password_confirmation": "a fresh passphrase",
        })
    };

    let wrong = app
        .send_json(reqwest::Method::PUT, "/password", Some(current.as_str()), change("not it"))
        .await;
    assert_eq!(wrong.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = wrong.json().await.expect("json");
    assert!(body["errors"]["current_password"].is_string());

    let changed = app
        .send_json(reqwest::Method::PUT, "/password", Some(current.as_str()), change(PASSWORD))
        .await;
    assert_eq!(changed.status(), StatusCode::OK);

    assert_eq!(
        app.get("/dashboard", Some(current.as_str())).await.status(),
        StatusCode::OK
    );
    assert_eq!(
        app.get("/dashboard", Some(other_device.as_str())).await.status(),
        StatusCode::UNAUTHORIZED
    );

    let relogin = app
        .post(
            "/login",
            None,
            json!({ "email": "teresa@example.com", "password": "a fresh passphrase" }),
        )
        .await;
    assert_eq!(relogin.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_password_strength_endpoint() {
    let app = spawn_app().await;

    let weak: Value = app
        .post("/password/strength", None, json!({ "password": "abc" }))
        .await
        .json()
        .await
        .expect("json");
    assert_eq!(weak["score"], 1);
    assert_eq!(weak["color"], "red");
    assert_eq!(weak["label"], "Very weak");
    assert_eq!(weak["checks"]["lowercase"], true);
    assert_eq!(weak["checks"]["length"], false);

    let strong: Value = app
        .post("/password/strength", None, json!({ "password": "Abcdef1!x" }))
        .await
        .json()
        .await
        .expect("json");
    assert_eq!(strong["score"], 5);
    assert_eq!(strong["color"], "green");

    let spanish: Value = app
        .http
        .post(app.url("/password/strength"))
        .header(reqwest::header::ACCEPT_LANGUAGE, "es-ES,es;q=0.9")
        .json(&json!({ "password": "abc" }))
        .send()
        .await
        .expect("request")
        .json()
        .await
        .expect("json");
    assert_eq!(spanish["label"], "Muy débil");
}

// ==================== Profile Tests ====================

#[tokio::test]
async fn test_profile_email_change_requires_new_verification() {
    let app = spawn_app().await;
    let (token, _) = app.verified_user("Ulisses", "ulisses@example.com").await;

    let invalid = app
        .send_json(
            reqwest::Method::PATCH,
            "/profile",
            Some(token.as_str()),
            json!({ "name": "", "email": "ulisses@example.com", "facebook": "not a url" }),
        )
        .await;
    assert_eq!(invalid.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = invalid.json().await.expect("json");
    assert!(body["errors"]["name"].is_string());
    assert!(body["errors"]["facebook"].is_string());

    // Same address, new name: verification survives
    let renamed: Value = app
        .send_json(
            reqwest::Method::PATCH,
            "/profile",
            Some(token.as_str()),
            json!({ "name": "Ulisses Costa", "email": "ulisses@example.com" }),
        )
        .await
        .json()
        .await
        .expect("json");
    assert_eq!(renamed["user"]["name"], "Ulisses Costa");
    assert!(renamed["user"]["email_verified_at"].is_string());

    let moved = app
        .send_json(
            reqwest::Method::PATCH,
            "/profile",
            Some(token.as_str()),
            json!({ "name": "Ulisses Costa", "email": "ULISSES@new.example", "locale": "es" }),
        )
        .await;
    assert_eq!(moved.status(), StatusCode::OK);
    let body: Value = moved.json().await.expect("json");
    assert_eq!(body["user"]["email"], "ulisses@new.example");
    assert!(body["user"]["email_verified_at"].is_null());
    assert_eq!(body["message"], "Perfil actualizado.");

    match app.notifier.last() {
        Some(Notification::VerifyEmail { to, .. }) => assert_eq!(to, "ulisses@new.example"),
        other => panic!("expected verification link, got {:?}", other),
    }

    let page: Value = app.get("/profile", Some(token.as_str())).await.json().await.expect("json");
    assert_eq!(page["props"]["must_verify_email"], true);

    // The unverified address cannot publish until the new link is followed
    assert_eq!(
        app.post("/properties", Some(token.as_str()), listing("Loft")).await.status(),
        StatusCode::FORBIDDEN
    );
    app.verify("ulisses@new.example").await;
    assert_eq!(
        app.post("/properties", Some(token.as_str()), listing("Loft")).await.status(),
        StatusCode::CREATED
    );
}

#[tokio::test]
async fn test_profile_photo_replaces_previous_file() {
    let app = spawn_app().await;
    let (token, _) = app.register("Vera", "vera@example.com").await;

    let rejected = app.upload("/profile/photo", &token, "photo", &[b"GIF89a"]).await;
    assert_eq!(rejected.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = rejected.json().await.expect("json");
    assert!(body["errors"]["photo"].is_string());

    let first: Value = app
        .upload("/profile/photo", &token, "photo", &[PNG])
        .await
        .json()
        .await
        .expect("json");
    let first_url = first["user"]["photo_url"].as_str().expect("photo url").to_string();
    let first_file = app
        .upload_root()
        .join(first_url.trim_start_matches("/storage/"));
    assert!(first_file.exists());

    let served = app.get(&first_url, None).await;
    assert_eq!(served.status(), StatusCode::OK);
    assert_eq!(served.bytes().await.expect("bytes").as_ref(), PNG);

    let second: Value = app
        .upload("/profile/photo", &token, "photo", &[PNG])
        .await
        .json()
        .await
        .expect("json");
    let second_url = second["user"]["photo_url"].as_str().expect("photo url");
    assert_ne!(second_url, first_url);
    assert!(!first_file.exists());
    assert!(app
        .upload_root()
        .join(second_url.trim_start_matches("/storage/"))
        .exists());
}

#[tokio::test]
async fn test_account_deletion_checks_password_and_removes_files() {
    let app = spawn_app().await;
    let (token, _) = app.verified_user("Wanda", "wanda@example.com").await;
    let id = app.create_listing(&token, "Courtyard house").await;

    let photo: Value = app
        .upload("/profile/photo", &token, "photo", &[PNG])
        .await
        .json()
        .await
        .expect("json");
    let photo_file = app.upload_root().join(
        photo["user"]["photo_url"]
            .as_str()
            .expect("photo url")
            .trim_start_matches("/storage/"),
    );
    let uploaded = app
        .upload(&format!("/properties/{}/images", id), &token, "images", &[PNG])
        .await;
    assert_eq!(uploaded.status(), StatusCode::OK);
    let gallery = app.upload_root().join(format!("properties/{}", id));
    assert!(gallery.exists());

    let wrong = app
        .send_json(reqwest::Method::DELETE, "/profile", Some(token.as_str()), json!({ "password": "nope" }))
        .await;
    assert_eq!(wrong.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = wrong.json().await.expect("json");
    assert!(body["errors"]["password"].is_string());
    assert!(photo_file.exists());

    let deleted = app
        .send_json(reqwest::Method::DELETE, "/profile", Some(token.as_str()), json!({ "password": PASSWORD }))
        .await;
    assert_eq!(deleted.status(), StatusCode::OK);

    assert!(!photo_file.exists());
    assert!(!gallery.exists());
    assert_eq!(
        app.get("/dashboard", Some(token.as_str())).await.status(),
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(
        app.get(&format!("/properties/{}", id), None).await.status(),
        StatusCode::NOT_FOUND
    );
    let login = app
        .post("/login", None, json!({ "email": "wanda@example.com", "password": PASSWORD }))
        .await;
    assert_eq!(login.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// ==================== Listing Tests ====================

#[tokio::test]
async fn test_unverified_user_cannot_list() {
    let app = spawn_app().await;
    let (token, _) = app.register("Filipe", "filipe@example.com").await;

    let response = app.post("/properties", Some(token.as_str()), listing("Loft")).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_listing_lifecycle() {
    let app = spawn_app().await;
    let (owner, _) = app.verified_user("Gil", "gil@example.com").await;
    let (other, _) = app.verified_user("Helena", "helena@example.com").await;

    let invalid = app
        .post("/properties", Some(owner.as_str()), json!({ "title": "", "price": 0 }))
        .await;
    assert_eq!(invalid.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let id = app.create_listing(&owner, "Sunny two-bedroom").await;

    let index: Value = app.get("/properties", None).await.json().await.expect("json");
    assert_eq!(index["component"], "Properties/Index");
    assert_eq!(index["props"]["properties"]["total"], 1);
    assert_eq!(index["props"]["properties"]["data"][0]["title"], "Sunny two-bedroom");

    let filtered: Value = app
        .get("/properties?location=porto", None)
        .await
        .json()
        .await
        .expect("json");
    assert_eq!(filtered["props"]["properties"]["total"], 0);

    // A guest view counts
    let show: Value = app
        .get(&format!("/properties/{}", id), None)
        .await
        .json()
        .await
        .expect("json");
    assert_eq!(show["props"]["property"]["views"], 1);
    assert_eq!(show["props"]["owner"]["name"], "Gil");

    let mut changes = listing("Sunny two-bedroom, renovated");
    changes["price"] = json!(265000);
    let forbidden = app
        .send_json(reqwest::Method::PUT, &format!("/properties/{}", id), Some(other.as_str()), changes.clone())
        .await;
    assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);

    let updated = app
        .send_json(reqwest::Method::PUT, &format!("/properties/{}", id), Some(owner.as_str()), changes)
        .await;
    assert_eq!(updated.status(), StatusCode::OK);
    let body: Value = updated.json().await.expect("json");
    assert_eq!(body["property"]["price"], 265000);

    let forbidden = app
        .send_json(reqwest::Method::DELETE, &format!("/properties/{}", id), Some(other.as_str()), json!({}))
        .await;
    assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);

    let deleted = app
        .send_json(reqwest::Method::DELETE, &format!("/properties/{}", id), Some(owner.as_str()), json!({}))
        .await;
    assert_eq!(deleted.status(), StatusCode::OK);
    assert_eq!(
        app.get(&format!("/properties/{}", id), None).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn test_listing_numbers_must_be_integers() {
    let app = spawn_app().await;
    let (owner, _) = app.verified_user("Xavier", "xavier@example.com").await;

    let mut blank_price = listing("Attic room");
    blank_price["price"] = json!("");
    let response = app.post("/properties", Some(owner.as_str()), blank_price).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json().await.expect("json");
    assert_eq!(body["errors"]["price"], "The price field must be an integer.");

    let malformed = app
        .http
        .post(app.url("/properties"))
        .bearer_auth(&owner)
        .header(reqwest::header::CONTENT_TYPE, "application/json")
        .body("{\"title\": ")
        .send()
        .await
        .expect("request");
    assert_eq!(malformed.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = malformed.json().await.expect("json");
    assert!(body["errors"]["body"].is_string());
}

#[tokio::test]
async fn test_browse_filters_and_sort() {
    let app = spawn_app().await;
    let (owner, _) = app.verified_user("Yara", "yara@example.com").await;
    app.create_listing(&owner, "City apartment").await;

    let mut rental = listing("Family house");
    rental["property_type"] = json!("house");
    rental["listing_type"] = json!("rent");
    rental["price"] = json!(1200);
    rental["location"] = json!("Porto");
    rental["bedrooms"] = json!(3);
    let response = app.post("/properties", Some(owner.as_str()), rental).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let titles = |page: &Value| -> Vec<String> {
        page["props"]["properties"]["data"]
            .as_array()
            .expect("data")
            .iter()
            .map(|p| p["title"].as_str().unwrap_or_default().to_string())
            .collect()
    };
    let browse = |query: &'static str| {
        let app = &app;
        async move {
            let response = app.get(&format!("/properties{}", query), None).await;
            assert_eq!(response.status(), StatusCode::OK, "query {}", query);
            response.json::<Value>().await.expect("json")
        }
    };

    // An untouched search form submits every field empty
    let all = browse("?search=&location=&type=&listing=&min_price=&max_price=&bedrooms=&sort=&page=").await;
    assert_eq!(all["props"]["properties"]["total"], 2);

    assert_eq!(titles(&browse("?type=house").await), vec!["Family house"]);
    assert_eq!(titles(&browse("?listing=sale&type=").await), vec!["City apartment"]);
    assert_eq!(titles(&browse("?min_price=100000").await), vec!["City apartment"]);
    assert_eq!(titles(&browse("?max_price=5000&min_price=").await), vec!["Family house"]);
    assert_eq!(titles(&browse("?bedrooms=3").await), vec!["Family house"]);
    assert_eq!(titles(&browse("?search=porto").await), vec!["Family house"]);

    assert_eq!(
        titles(&browse("?sort=price_asc").await),
        vec!["Family house", "City apartment"]
    );
    assert_eq!(
        titles(&browse("?sort=price_desc").await),
        vec!["City apartment", "Family house"]
    );

    let filters = browse("?type=house&sort=price_asc").await;
    assert_eq!(filters["props"]["filters"]["type"], "house");
    assert_eq!(filters["props"]["filters"]["sort"], "price_asc");

    let unknown = app.get("/properties?type=castle", None).await;
    assert_eq!(unknown.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = unknown.json().await.expect("json");
    assert!(body["errors"]["query"].is_string());
}

#[tokio::test]
async fn test_listing_image_upload() {
    let app = spawn_app().await;
    let (owner, _) = app.verified_user("Zelia", "zelia@example.com").await;
    let (other, _) = app.verified_user("Abel", "abel@example.com").await;
    let id = app.create_listing(&owner, "Loft with a view").await;
    let path = format!("/properties/{}/images", id);

    let forbidden = app.upload(&path, &other, "images", &[PNG]).await;
    assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);

    let not_an_image = app.upload(&path, &owner, "images[]", &[PNG, b"%PDF-1.7"]).await;
    assert_eq!(not_an_image.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = not_an_image.json().await.expect("json");
    assert!(body["errors"]["images"].is_string());
    assert!(!app.upload_root().join(format!("properties/{}", id)).exists());

    let uploaded = app.upload(&path, &owner, "images[]", &[PNG, PNG]).await;
    assert_eq!(uploaded.status(), StatusCode::OK);
    let body: Value = uploaded.json().await.expect("json");
    let images: Vec<String> = body["property"]["images"]
        .as_array()
        .expect("images")
        .iter()
        .map(|v| v.as_str().expect("url").to_string())
        .collect();
    assert_eq!(images.len(), 2);

    for url in &images {
        assert!(url.starts_with(&format!("/storage/properties/{}/", id)));
        assert!(app.upload_root().join(url.trim_start_matches("/storage/")).exists());
    }
    let served = app.get(&images[0], None).await;
    assert_eq!(served.status(), StatusCode::OK);

    // Later uploads append to the gallery
    let more: Value = app.upload(&path, &owner, "images", &[PNG]).await.json().await.expect("json");
    let gallery = more["property"]["images"].as_array().expect("images");
    assert_eq!(gallery.len(), 3);
    assert_eq!(gallery[0], images[0].as_str());
    assert_eq!(gallery[1], images[1].as_str());

    let missing = app.upload("/properties/9999/images", &owner, "images", &[PNG]).await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_drafts_are_hidden_from_guests() {
    let app = spawn_app().await;
    let (owner, _) = app.verified_user("Ines", "ines@example.com").await;

    let mut draft = listing("Not ready yet");
    draft["is_published"] = json!(false);
    let response = app.post("/properties", Some(owner.as_str()), draft).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let id = response.json::<Value>().await.expect("json")["property"]["id"]
        .as_i64()
        .expect("id");

    let path = format!("/properties/{}", id);
    assert_eq!(app.get(&path, None).await.status(), StatusCode::NOT_FOUND);
    assert_eq!(app.get(&path, Some(owner.as_str())).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_contact_notifies_owner() {
    let app = spawn_app().await;
    let (owner, _) = app.verified_user("Joana", "joana@example.com").await;
    let id = app.create_listing(&owner, "Garden flat").await;

    let response = app
        .post(
            &format!("/properties/{}/contact", id),
            None,
            json!({
                "name": "Karl",
                "email": "karl@example.com",
                "message": "Is the flat still available in June?",
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    match app.notifier.last() {
        Some(Notification::PropertyInquiry { to, property_id, from_email, .. }) => {
            assert_eq!(to, "joana@example.com");
            assert_eq!(property_id, id);
            assert_eq!(from_email, "karl@example.com");
        }
        other => panic!("expected inquiry, got {:?}", other),
    }
}

// ==================== Favorite Tests ====================

#[tokio::test]
async fn test_favorite_toggle() {
    let app = spawn_app().await;
    let (owner, _) = app.verified_user("Luis", "luis@example.com").await;
    let (fan, _) = app.register("Marta", "marta@example.com").await;
    let id = app.create_listing(&owner, "Riverside studio").await;

    let path = format!("/favorites/{}/toggle", id);

    let on: Value = app.post(&path, Some(fan.as_str()), json!({})).await.json().await.expect("json");
    assert_eq!(on["favorited"], true);
    assert_eq!(on["count"], 1);
    assert_eq!(on["message"], "Added to favorites.");

    let page: Value = app.get("/favorites", Some(fan.as_str())).await.json().await.expect("json");
    assert_eq!(page["component"], "Favorites/Index");

    let off: Value = app.post(&path, Some(fan.as_str()), json!({})).await.json().await.expect("json");
    assert_eq!(off["favorited"], false);
    assert_eq!(off["count"], 0);

    // PUT is idempotent
    for _ in 0..2 {
        let put = app
            .send_json(reqwest::Method::PUT, &format!("/favorites/{}", id), Some(fan.as_str()), json!({}))
            .await;
        assert_eq!(put.status(), StatusCode::OK);
    }
    let state: Value = app
        .send_json(reqwest::Method::PUT, &format!("/favorites/{}", id), Some(fan.as_str()), json!({}))
        .await
        .json()
        .await
        .expect("json");
    assert_eq!(state["count"], 1);

    assert_eq!(
        app.post(&path, None, json!({})).await.status(),
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(
        app.post("/favorites/9999/toggle", Some(fan.as_str()), json!({})).await.status(),
        StatusCode::NOT_FOUND
    );
}

// ==================== Admin Tests ====================

#[tokio::test]
async fn test_role_change_requires_password_confirmation() {
    let app = spawn_app().await;
    let (admin, admin_id) = app.register("Nuno", "admin@example.com").await;
    let (user, user_id) = app.register("Olga", "olga@example.com").await;

    let path = format!("/admin/users/{}/role", user_id);

    let not_admin = app
        .send_json(reqwest::Method::PATCH, &path, Some(user.as_str()), json!({ "role": "agent" }))
        .await;
    assert_eq!(not_admin.status(), StatusCode::FORBIDDEN);

    let locked = app
        .send_json(reqwest::Method::PATCH, &path, Some(admin.as_str()), json!({ "role": "agent" }))
        .await;
    assert_eq!(locked.status(), StatusCode::LOCKED);

    let wrong = app
        .post("/confirm-password", Some(admin.as_str()), json!({ "password": "nope" }))
        .await;
    assert_eq!(wrong.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let confirmed = app
        .post("/confirm-password", Some(admin.as_str()), json!({ "password": PASSWORD }))
        .await;
    assert_eq!(confirmed.status(), StatusCode::OK);

    let changed = app
        .send_json(reqwest::Method::PATCH, &path, Some(admin.as_str()), json!({ "role": "agent" }))
        .await;
    assert_eq!(changed.status(), StatusCode::OK);
    let body: Value = changed.json().await.expect("json");
    assert_eq!(body["user"]["role"], "agent");

    let invalid = app
        .send_json(reqwest::Method::PATCH, &path, Some(admin.as_str()), json!({ "role": "owner" }))
        .await;
    assert_eq!(invalid.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let own = app
        .send_json(
            reqwest::Method::PATCH,
            &format!("/admin/users/{}/role", admin_id),
            Some(admin.as_str()),
            json!({ "role": "user" }),
        )
        .await;
    assert_eq!(own.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_updates_site_settings() {
    let app = spawn_app().await;
    let (admin, _) = app.register("Paula", "admin@example.com").await;
    let (user, _) = app.register("Rui", "rui@example.com").await;

    let settings = json!({ "site_name": "Casa Nova", "contact_email": "hello@casa.example" });

    let forbidden = app
        .send_json(reqwest::Method::PUT, "/admin/settings", Some(user.as_str()), settings.clone())
        .await;
    assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);

    let saved = app
        .send_json(reqwest::Method::PUT, "/admin/settings", Some(admin.as_str()), settings)
        .await;
    assert_eq!(saved.status(), StatusCode::OK);

    let current: Value = app.get("/settings", None).await.json().await.expect("json");
    assert_eq!(current["site_name"], "Casa Nova");
}

// ==================== Feed Tests ====================

#[tokio::test]
async fn test_feed_lists_published_properties() {
    let app = spawn_app().await;
    let (owner, _) = app.verified_user("Sara", "sara@example.com").await;
    app.create_listing(&owner, "Harbour view loft").await;

    let response = app.get("/feed.xml", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("application/rss+xml"));

    let body = response.text().await.expect("body");
    let channel = rss::Channel::read_from(body.as_bytes()).expect("valid RSS");
    assert_eq!(channel.items().len(), 1);
    assert_eq!(channel.items()[0].title(), Some("Harbour view loft"));
}
