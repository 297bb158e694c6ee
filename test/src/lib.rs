//! Test fixtures for the tether stack: a lossy network simulator and a
//! small message protocol used by the end-to-end suites.

mod simulator;
mod test_protocol;

pub use simulator::{NetworkSimulator, SimulatorConfig};
pub use test_protocol::{test_message_kinds, TestMessage, TEST_MESSAGE_KIND};
