use std::sync::{Arc, Mutex};

use api::routes::routes;
use api::state::{AppState, ServiceSettings};
use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use db::test_utils::setup_test_db;
use sea_orm::DatabaseConnection;
use serde_json::Value;
use services::password_reset::{MailError, ResetMailer};
use tower::ServiceExt;

/// Captures reset codes instead of mailing them.
#[derive(Default)]
pub struct CapturedMail {
    pub codes: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl ResetMailer for CapturedMail {
    async fn send_reset_code(&self, to_email: &str, code: &str, _: i64) -> Result<(), MailError> {
        self.codes
            .lock()
            .unwrap()
            .push((to_email.to_owned(), code.to_owned()));
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub db: DatabaseConnection,
    pub mail: Arc<CapturedMail>,
}

impl TestApp {
    pub async fn send(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("Content-Type", "application/json");
        let request = match body {
            Some(json) => request.body(Body::from(json.to_string())).unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    pub fn last_code(&self) -> Option<String> {
        self.mail.codes.lock().unwrap().last().map(|(_, c)| c.clone())
    }
}

pub async fn make_test_app() -> TestApp {
    let db = setup_test_db().await;
    let mail = Arc::new(CapturedMail::default());
    let state = AppState::new(db.clone(), mail.clone(), ServiceSettings::default());

    TestApp {
        router: Router::new().nest("/api", routes(state)),
        db,
        mail,
    }
}
