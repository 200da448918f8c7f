pub mod assertions;
pub mod mocks;
pub mod setup;

// Re-export main utilities for use by test files
#[allow(unused_imports)]
pub use assertions::{eventually, expect_event, expect_no_event, expect_stream_end};
#[allow(unused_imports)]
pub use mocks::{MockClient, MockSocket};
#[allow(unused_imports)]
pub use setup::{TestSetup, TestSetupBuilder};
