//! Constants shared by the behavioural suites.

/// Project the scripted tenant is scoped to.
pub const PROJECT_ID: &str = "b8b6a2f0c1d34e7e9f0a1b2c3d4e5f60";
/// Token carried by the scripted tenant.
pub const AUTH_TOKEN: &str = "gAAAAAB-test-token";
