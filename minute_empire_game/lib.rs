pub mod combat;
pub mod models;
pub mod world;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
