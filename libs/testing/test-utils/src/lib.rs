//! Shared test utilities for domain testing
//!
//! - `TestDatabase`: PostgreSQL container with migrations applied
//! - `TestDataBuilder`: deterministic, collision-free subscriber data
//! - `assertions`: small assertion helpers
//!
//! ```rust,ignore
//! use test_utils::{TestDatabase, TestDataBuilder};
//!
//! #[tokio::test]
//! async fn my_postgres_test() {
//!     let db = TestDatabase::new().await;
//!     let builder = TestDataBuilder::from_test_name("my_test");
//!     let email = builder.email("ana");
//! }
//! ```

mod postgres;

pub use postgres::TestDatabase;

/// Builder for test data derived from a seed
pub struct TestDataBuilder {
    seed: u64,
}

impl TestDataBuilder {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Seed from the test name so each test gets its own addresses
    pub fn from_test_name(name: &str) -> Self {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        Self::new(hasher.finish())
    }

    /// Subscriber display name, e.g. `ana-12345`
    pub fn name(&self, who: &str) -> String {
        format!("{}-{}", who, self.seed)
    }

    /// Lowercase subscriber address, e.g. `ana+12345@example.com`
    pub fn email(&self, who: &str) -> String {
        format!("{}+{}@example.com", who.to_lowercase(), self.seed)
    }
}

/// Test assertion helpers
pub mod assertions {
    /// Unwrap an option with a readable failure message
    pub fn assert_some<T>(value: Option<T>, context: &str) -> T {
        value.unwrap_or_else(|| panic!("{}: expected Some, got None", context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_builder_deterministic() {
        let a = TestDataBuilder::from_test_name("my_test");
        let b = TestDataBuilder::from_test_name("my_test");
        assert_eq!(a.email("ana"), b.email("ana"));
    }

    #[test]
    fn test_data_builder_different_names() {
        let a = TestDataBuilder::from_test_name("test1");
        let b = TestDataBuilder::from_test_name("test2");
        assert_ne!(a.email("ana"), b.email("ana"));
        assert!(a.email("ANA").starts_with("ana+"));
    }
}
