pub mod fixtures;

use verity::{Bindings, Message};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

/// Route engine logs through the test harness.
pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Variables shared by the scenarios.
pub fn bindings() -> Bindings {
    Bindings::new()
        .with_variable("orderId", "4711")
        .with_variable("customer", "ACME")
}

pub fn message(payload: &str) -> Message {
    Message::new(payload)
}
