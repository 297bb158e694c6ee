pub mod block_message;
pub mod channels;
pub mod error;
pub mod message;
pub mod message_kinds;
