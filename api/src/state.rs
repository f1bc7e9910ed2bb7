//! Shared handler state: the two store capabilities and the services built on them.

use std::sync::Arc;
use std::time::Duration;

use db::{AdminClient, ReadClient};
use sea_orm::DatabaseConnection;
use services::content::ContentService;
use services::password_reset::{PasswordResetService, ResetMailer, ResetPolicy};
use services::progress_service::ProgressService;
use util::config;

/// Limits handed to the services at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceSettings {
    pub fetch_timeout: Duration,
    pub max_quiz_attempts: u32,
    pub reset_policy: ResetPolicy,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_millis(5_000),
            max_quiz_attempts: 3,
            reset_policy: ResetPolicy::default(),
        }
    }
}

impl ServiceSettings {
    pub fn from_config() -> Self {
        Self {
            fetch_timeout: Duration::from_millis(config::fetch_timeout_ms()),
            max_quiz_attempts: config::max_quiz_attempts(),
            reset_policy: ResetPolicy {
                code_ttl_minutes: config::reset_code_expiry_minutes() as i64,
                max_requests_per_hour: config::max_password_reset_requests_per_hour(),
            },
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    read: ReadClient,
    progress: ProgressService,
    content: ContentService,
    password_reset: PasswordResetService,
}

impl AppState {
    pub fn new(
        db: DatabaseConnection,
        mailer: Arc<dyn ResetMailer>,
        settings: ServiceSettings,
    ) -> Self {
        let admin = AdminClient::new(db);
        let read = admin.read_only();

        Self {
            progress: ProgressService::new(read.clone(), settings.fetch_timeout),
            content: ContentService::new(admin.clone(), settings.max_quiz_attempts),
            password_reset: PasswordResetService::new(admin, mailer, settings.reset_policy),
            read,
        }
    }

    pub fn read(&self) -> &ReadClient {
        &self.read
    }

    pub fn progress(&self) -> &ProgressService {
        &self.progress
    }

    pub fn content(&self) -> &ContentService {
        &self.content
    }

    pub fn password_reset(&self) -> &PasswordResetService {
        &self.password_reset
    }
}
