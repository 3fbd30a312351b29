// Test helper modules
pub mod fake_llm;
pub mod offline_store;
pub mod test_harness;
pub mod test_utils;

pub use fake_llm::FakeLlm;
pub use offline_store::OfflineStore;
pub use test_harness::TestHarness;
