#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use cafeteria_rs::{build_app, security::CsrfGuard, Config, Metrics};
use reqwest::{multipart, redirect::Policy, Client, Response};
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub const TEST_SECRET_KEY: &str = "integration-test-secret";

/// A running application backed by a throwaway database and upload directory
pub struct TestEnvironment {
    pub client: Client,
    pub base_url: String,
    pub config: Config,
    csrf: CsrfGuard,
    server: JoinHandle<()>,
    _temp_dir: TempDir,
}

impl TestEnvironment {
    pub async fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let root = temp_dir.path().display().to_string();

        let database_url = format!("sqlite://{}/cafeteria.db?mode=rwc", root);
        let static_dir = format!("{}/static", root);
        // Absolute and outside the static tree, so image links must not depend on it
        let upload_dir = format!("{}/uploads", root);
        let templates_dir = concat!(env!("CARGO_MANIFEST_DIR"), "/templates");

        let settings = config::Config::builder()
            .set_override("host", "127.0.0.1")
            .and_then(|b| b.set_override("database_url", database_url.as_str()))
            .and_then(|b| b.set_override("max_connections", "1"))
            .and_then(|b| b.set_override("static_dir", static_dir.as_str()))
            .and_then(|b| b.set_override("upload_dir", upload_dir.as_str()))
            .and_then(|b| b.set_override("templates_dir", templates_dir))
            .and_then(|b| b.set_override("secret_key", TEST_SECRET_KEY))
            .and_then(|b| b.build())
            .expect("Failed to build test settings");

        let config = Config::from_settings(&settings).expect("Invalid test configuration");
        let metrics = Arc::new(Metrics::new().expect("Failed to create metrics"));
        let app = build_app(&config, metrics)
            .await
            .expect("Failed to build application");

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Failed to read local address");

        let server = tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Test server failed");
        });

        let client = Client::builder()
            .redirect(Policy::none())
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to build HTTP client");

        let csrf = CsrfGuard::new(TEST_SECRET_KEY, config.security.csrf_time_limit())
            .expect("Failed to build CSRF guard");

        Self {
            client,
            base_url: format!("http://{}", addr),
            config,
            csrf,
            server,
            _temp_dir: temp_dir,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// A token the running app will accept
    pub fn csrf_token(&self) -> String {
        self.csrf.generate()
    }

    pub fn upload_dir(&self) -> PathBuf {
        self.config.storage.upload_path()
    }

    /// Files currently stored in the upload directory, staging excluded
    pub fn stored_files(&self) -> Vec<String> {
        let Ok(entries) = std::fs::read_dir(self.upload_dir()) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_file())
            .map(|entry| entry.file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    /// Multipart body for the registration and edit forms
    pub fn item_form(
        &self,
        nome: &str,
        preco: &str,
        categoria: &str,
        image: Option<(&str, &[u8])>,
    ) -> multipart::Form {
        let mut form = multipart::Form::new()
            .text("csrf_token", self.csrf_token())
            .text("nome", nome.to_string())
            .text("preco", preco.to_string())
            .text("categoria", categoria.to_string());

        if let Some((file_name, bytes)) = image {
            form = form.part(
                "imagem",
                multipart::Part::bytes(bytes.to_vec()).file_name(file_name.to_string()),
            );
        }
        form
    }

    pub async fn post_form(&self, path: &str, form: multipart::Form) -> Response {
        self.client
            .post(self.url(path))
            .multipart(form)
            .send()
            .await
            .expect("Failed to send request")
    }

    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send request")
    }

    /// Register an item through the HTML form and return its id from the JSON listing
    pub async fn create_item(&self, nome: &str, preco: &str, categoria: &str, file: &str) -> i64 {
        let form = self.item_form(nome, preco, categoria, Some((file, b"fake image bytes")));
        let response = self.post_form("/cadastro", form).await;
        assert_eq!(response.status().as_u16(), 303, "registration failed");

        let items: serde_json::Value = self
            .get("/api/items")
            .await
            .json()
            .await
            .expect("Failed to parse item list");

        items
            .as_array()
            .and_then(|items| items.iter().rev().find(|item| item["name"] == nome))
            .and_then(|item| item["id"].as_i64())
            .expect("Created item not listed")
    }
}

impl Drop for TestEnvironment {
    fn drop(&mut self) {
        self.server.abort();
    }
}
