use std::path::PathBuf;
use std::sync::Arc;

use shared_config::{AppConfig, ConflictScope};
use shared_models::auth::{AuthUser, Role};

use crate::jwt::issue_token;

pub struct TestConfig {
    pub jwt_secret: String,
    pub data_dir: PathBuf,
    pub conflict_scope: ConflictScope,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            data_dir: std::env::temp_dir().join("bookwell-tests"),
            conflict_scope: ConflictScope::Global,
        }
    }
}

impl TestConfig {
    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            data_dir: self.data_dir.clone(),
            jwt_secret: self.jwt_secret.clone(),
            token_ttl_hours: 1,
            bind_addr: ([127, 0, 0, 1], 0).into(),
            conflict_scope: self.conflict_scope,
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: i64,
    pub username: String,
    pub role: Role,
}

impl TestUser {
    pub fn new(id: i64, username: &str, role: Role) -> Self {
        Self {
            id,
            username: username.to_string(),
            role,
        }
    }

    pub fn consumer(id: i64, username: &str) -> Self {
        Self::new(id, username, Role::Consumer)
    }

    pub fn provider(id: i64, username: &str) -> Self {
        Self::new(id, username, Role::Provider)
    }

    pub fn to_auth_user(&self) -> AuthUser {
        AuthUser {
            id: self.id,
            username: self.username.clone(),
            role: self.role,
        }
    }

    /// A valid bearer token for this user signed with the test secret.
    pub fn token(&self, config: &TestConfig) -> String {
        match issue_token(&self.to_auth_user(), &config.jwt_secret, 1) {
            Ok(token) => token,
            Err(e) => panic!("test token could not be issued: {}", e),
        }
    }

    pub fn bearer(&self, config: &TestConfig) -> String {
        format!("Bearer {}", self.token(config))
    }
}
