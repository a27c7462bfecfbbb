use reelhouse_api::auth::JwtService;
use uuid::Uuid;

/// Signing secret shared by the test config and issued tokens.
pub const TEST_JWT_SECRET: &str = "test-jwt-secret-at-least-32-characters-long";
pub const TEST_JWT_ISSUER: &str = "reelhouse-access";

pub fn token_for(owner_id: Uuid) -> String {
    JwtService::new(TEST_JWT_SECRET, TEST_JWT_ISSUER)
        .issue(owner_id, chrono::Duration::minutes(15))
        .expect("Failed to issue test token")
}

pub fn bearer(owner_id: Uuid) -> String {
    format!("Bearer {}", token_for(owner_id))
}
