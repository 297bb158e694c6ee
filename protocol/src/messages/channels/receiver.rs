use log::{debug, info};

use crate::{
    messages::{
        block_message::BlockMessage,
        channels::{channel_config::ReliableChannelConfig, reliable_channel::FragmentData},
        message::BoxedMessage,
    },
    sequence_buffer::SequenceBuffer,
    types::MessageId,
    wrapping_number::{sequence_less_than, wrapping_diff},
};

/// Verdict on an arriving message or fragment. Duplicates are silently
/// idempotent; early arrivals are dropped for the sender to retransmit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BufferOutcome {
    Buffered,
    Duplicate,
    Early,
}

/// Receive-side state for the one block currently being reassembled.
struct BlockReceiveState {
    block_id: MessageId,
    num_fragments: usize,
    received: Vec<bool>,
    num_received: usize,
    buffer: Vec<u8>,
    // exact size, known once the final fragment lands
    block_size: Option<usize>,
}

/// Buffers out-of-order arrivals in a ring keyed by message id and hands
/// them to the consumer in strictly ascending contiguous id order.
pub(crate) struct ReliableMessageReceiver {
    config: ReliableChannelConfig,
    receive_queue: SequenceBuffer<BoxedMessage>,
    next_receive_id: MessageId,
    block: Option<BlockReceiveState>,
}

impl ReliableMessageReceiver {
    pub fn new(config: &ReliableChannelConfig) -> Self {
        Self {
            config: config.clone(),
            receive_queue: SequenceBuffer::with_capacity(config.receive_queue_size),
            next_receive_id: 0,
            block: None,
        }
    }

    pub fn buffer_message(&mut self, id: MessageId, message: BoxedMessage) -> BufferOutcome {
        if sequence_less_than(id, self.next_receive_id) {
            return BufferOutcome::Duplicate;
        }
        if wrapping_diff(self.next_receive_id, id) >= self.config.receive_queue_size as i16 {
            return BufferOutcome::Early;
        }
        if self.receive_queue.exists(id) {
            return BufferOutcome::Duplicate;
        }

        self.receive_queue.insert(id, message);
        BufferOutcome::Buffered
    }

    pub fn buffer_fragment(&mut self, fragment: FragmentData) -> BufferOutcome {
        match &self.block {
            None => {
                if sequence_less_than(fragment.block_id, self.next_receive_id) {
                    return BufferOutcome::Duplicate;
                }
                if self.receive_queue.exists(fragment.block_id) {
                    // reassembled already, awaiting delivery
                    return BufferOutcome::Duplicate;
                }
                if wrapping_diff(self.next_receive_id, fragment.block_id)
                    >= self.config.receive_queue_size as i16
                {
                    return BufferOutcome::Early;
                }

                debug!(
                    "receiving block message {} ({} fragments)",
                    fragment.block_id, fragment.num_fragments
                );
                self.block = Some(BlockReceiveState {
                    block_id: fragment.block_id,
                    num_fragments: fragment.num_fragments,
                    received: vec![false; fragment.num_fragments],
                    num_received: 0,
                    buffer: vec![0u8; fragment.num_fragments * self.config.fragment_size],
                    block_size: None,
                });
            }
            Some(state) => {
                // anything not matching the block in progress is stale
                if state.block_id != fragment.block_id
                    || state.num_fragments != fragment.num_fragments
                {
                    return BufferOutcome::Duplicate;
                }
            }
        }

        let Some(state) = &mut self.block else {
            return BufferOutcome::Duplicate;
        };
        if state.received[fragment.fragment_id] {
            return BufferOutcome::Duplicate;
        }

        let offset = fragment.fragment_id * self.config.fragment_size;
        state.buffer[offset..offset + fragment.bytes.len()].copy_from_slice(&fragment.bytes);
        state.received[fragment.fragment_id] = true;
        state.num_received += 1;

        if fragment.fragment_id == state.num_fragments - 1 {
            state.block_size = Some(offset + fragment.bytes.len());
        }

        if state.num_received == state.num_fragments {
            self.complete_block();
        }
        BufferOutcome::Buffered
    }

    fn complete_block(&mut self) {
        let Some(state) = self.block.take() else {
            return;
        };
        let Some(block_size) = state.block_size else {
            unreachable!("completed a block without its final fragment");
        };

        let mut buffer = state.buffer;
        buffer.truncate(block_size);
        info!(
            "received block message {} ({} bytes)",
            state.block_id, block_size
        );

        self.receive_queue
            .insert(state.block_id, Box::new(BlockMessage::new(buffer)));
    }

    /// Pops the next in-order message, if it has arrived.
    pub fn receive_message(&mut self) -> Option<(MessageId, BoxedMessage)> {
        let id = self.next_receive_id;
        let message = self.receive_queue.remove(id)?;
        self.next_receive_id = id.wrapping_add(1);
        Some((id, message))
    }
}
