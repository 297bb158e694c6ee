use log::debug;

use tether_serde::{
    bits_required, ser_ranged_int, ser_raw_bytes, BitWrite, BitWriter, Serde,
};

use crate::{
    messages::{
        block_message::BlockMessage,
        channels::{channel_config::ReliableChannelConfig, error::SendError},
        message::BoxedMessage,
        message_kinds::MessageKinds,
    },
    sequence_buffer::SequenceBuffer,
    types::MessageId,
};

/// What a channel contributed to one outbound packet; consulted when the
/// packet is later acked or declared lost.
pub(crate) enum SentRecord {
    Messages(Vec<MessageId>),
    Fragment {
        block_id: MessageId,
        fragment_index: usize,
    },
}

pub(crate) struct SendQueueEntry {
    pub message: BoxedMessage,
    pub large_block: bool,
    pub acked: bool,
    pub time_last_sent: Option<f64>,
}

/// Send-side state for the one block currently being fragmented. At most
/// one block is in flight per channel.
struct BlockSendState {
    block_id: MessageId,
    block_size: usize,
    num_fragments: usize,
    acked: Vec<bool>,
    num_acked: usize,
    time_sent: Vec<Option<f64>>,
}

/// Owns the send queue: assigns message ids, packs eligible messages (or
/// one block fragment) into each outbound packet, and retires entries as
/// the peer acknowledges them.
pub(crate) struct ReliableMessageSender {
    config: ReliableChannelConfig,
    send_queue: SequenceBuffer<SendQueueEntry>,
    next_send_id: MessageId,
    oldest_unacked_id: MessageId,
    block: Option<BlockSendState>,
}

impl ReliableMessageSender {
    pub fn new(config: &ReliableChannelConfig) -> Self {
        Self {
            config: config.clone(),
            send_queue: SequenceBuffer::with_capacity(config.send_queue_size),
            next_send_id: 0,
            oldest_unacked_id: 0,
            block: None,
        }
    }

    pub fn send_message(&mut self, message: BoxedMessage) -> Result<MessageId, SendError> {
        self.enqueue(message, false)
    }

    pub fn send_block(&mut self, bytes: Vec<u8>) -> Result<MessageId, SendError> {
        debug_assert!(!bytes.is_empty());

        if bytes.len() > self.config.max_block_size {
            return Err(SendError::BlockTooLarge {
                size: bytes.len(),
                max: self.config.max_block_size,
            });
        }

        let large_block = bytes.len() > self.config.max_small_block_size;
        self.enqueue(Box::new(BlockMessage::new(bytes)), large_block)
    }

    fn enqueue(&mut self, message: BoxedMessage, large_block: bool) -> Result<MessageId, SendError> {
        let id = self.next_send_id;
        if self.send_queue.is_slot_occupied(id) {
            return Err(SendError::SendQueueFull);
        }

        self.send_queue.insert(
            id,
            SendQueueEntry {
                message,
                large_block,
                acked: false,
                time_last_sent: None,
            },
        );
        self.next_send_id = id.wrapping_add(1);
        Ok(id)
    }

    /// Writes this channel's share of an outbound packet. Always emits at
    /// least the empty marker so the channel data stays self-delimiting;
    /// `reserved_bits` is writer space promised to the channels that come
    /// after this one and must not be consumed.
    pub fn write_data(
        &mut self,
        kinds: &MessageKinds,
        writer: &mut BitWriter,
        reserved_bits: u32,
        now: f64,
    ) -> Option<SentRecord> {
        self.maybe_enter_block_mode();

        if self.block.is_some() {
            return self.write_fragment(writer, reserved_bits, now);
        }
        self.write_message_run(kinds, writer, reserved_bits, now)
    }

    /// Bits the empty marker occupies; every packet carries at least this
    /// much for the channel.
    pub fn empty_data_bits(&self) -> u32 {
        1 + bits_required(0, self.config.max_messages_per_packet as i32)
    }

    /// Switches to fragmenting when the head of the queue is a large
    /// block. While a block is in flight the channel emits only fragments.
    fn maybe_enter_block_mode(&mut self) {
        if self.block.is_some() {
            return;
        }
        let Some(entry) = self.send_queue.get(self.oldest_unacked_id) else {
            return;
        };
        if !entry.large_block {
            return;
        }
        let Some(block_message) = entry.message.as_any().downcast_ref::<BlockMessage>() else {
            return;
        };

        let block_size = block_message.len();
        let fragment_size = self.config.fragment_size;
        let num_fragments = (block_size + fragment_size - 1) / fragment_size;

        debug!(
            "fragmenting block message {} ({} bytes, {} fragments)",
            self.oldest_unacked_id, block_size, num_fragments
        );

        self.block = Some(BlockSendState {
            block_id: self.oldest_unacked_id,
            block_size,
            num_fragments,
            acked: vec![false; num_fragments],
            num_acked: 0,
            time_sent: vec![None; num_fragments],
        });
    }

    fn write_fragment(
        &mut self,
        writer: &mut BitWriter,
        reserved_bits: u32,
        now: f64,
    ) -> Option<SentRecord> {
        let count_max = self.config.max_messages_per_packet as i32;
        let fragment_size = self.config.fragment_size;
        let max_fragments = self.config.max_fragments();
        let available = writer.bits_free().saturating_sub(reserved_bits);

        let Some(block) = &mut self.block else {
            return None;
        };

        let choice = choose_fragment(block, self.config.resend_rate, now).filter(|&index| {
            fragment_bits(block, index, fragment_size, max_fragments) <= available
        });
        let Some(index) = choice else {
            // nothing eligible this tick; emit the empty marker
            writer.write_bit(false);
            ser_ranged_int(0, 0, count_max, writer);
            return None;
        };

        let Some(entry) = self.send_queue.get(block.block_id) else {
            unreachable!("block send state without a matching queue entry");
        };
        let Some(block_message) = entry.message.as_any().downcast_ref::<BlockMessage>() else {
            unreachable!("block send state over a non-block message");
        };

        let last = index == block.num_fragments - 1;
        let offset = index * fragment_size;
        let num_bytes = if last {
            block.block_size - offset
        } else {
            fragment_size
        };

        writer.write_bit(true);
        block.block_id.ser(writer);
        ser_ranged_int(
            (block.num_fragments - 1) as i32,
            0,
            (max_fragments - 1) as i32,
            writer,
        );
        ser_ranged_int(
            index as i32,
            0,
            (block.num_fragments - 1).max(1) as i32,
            writer,
        );
        if last {
            ser_ranged_int((num_bytes - 1) as i32, 0, (fragment_size - 1) as i32, writer);
        }
        ser_raw_bytes(&block_message.bytes()[offset..offset + num_bytes], writer);

        block.time_sent[index] = Some(now);
        Some(SentRecord::Fragment {
            block_id: block.block_id,
            fragment_index: index,
        })
    }

    fn write_message_run(
        &mut self,
        kinds: &MessageKinds,
        writer: &mut BitWriter,
        reserved_bits: u32,
        now: f64,
    ) -> Option<SentRecord> {
        let count_max = self.config.max_messages_per_packet as i32;
        let tag_bits = kinds.tag_bit_length();
        let available = writer.bits_free().saturating_sub(reserved_bits);

        // bits that frame a non-empty run: marker, count, first id
        let overhead = 1 + bits_required(0, count_max) + 16;
        let mut budget = i64::from(available) - i64::from(overhead);

        // the run is the first maximal stretch of consecutive eligible ids
        let mut run: Vec<MessageId> = Vec::new();
        let mut id = self.oldest_unacked_id;
        while id != self.next_send_id {
            let Some(entry) = self.send_queue.get(id) else {
                break;
            };
            let eligible = message_eligible(entry, self.config.resend_rate, now);
            if eligible {
                if run.len() >= count_max as usize {
                    break;
                }
                let cost = i64::from(tag_bits + entry.message.bit_length());
                if cost > budget {
                    break;
                }
                budget -= cost;
                run.push(id);
            } else if !run.is_empty() {
                break;
            }
            id = id.wrapping_add(1);
        }

        writer.write_bit(false);
        ser_ranged_int(run.len() as i32, 0, count_max, writer);
        if run.is_empty() {
            return None;
        }

        run[0].ser(writer);
        for &id in &run {
            let Some(entry) = self.send_queue.get_mut(id) else {
                unreachable!("send queue entry vanished during write");
            };
            kinds.ser_kind(entry.message.kind(), writer);
            entry.message.ser(writer);
            entry.time_last_sent = Some(now);
        }
        Some(SentRecord::Messages(run))
    }

    /// The packet carrying these messages was acknowledged.
    pub fn ack_messages(&mut self, ids: &[MessageId]) {
        for &id in ids {
            if let Some(entry) = self.send_queue.get_mut(id) {
                entry.acked = true;
            }
        }
        self.advance_head();
    }

    /// The packet carrying this fragment was acknowledged.
    pub fn ack_fragment(&mut self, block_id: MessageId, fragment_index: usize) {
        let Some(block) = &mut self.block else {
            return;
        };
        if block.block_id != block_id || fragment_index >= block.num_fragments {
            return;
        }
        if block.acked[fragment_index] {
            return;
        }

        block.acked[fragment_index] = true;
        block.num_acked += 1;

        if block.num_acked == block.num_fragments {
            debug!("block message {} fully acked", block_id);
            if let Some(entry) = self.send_queue.get_mut(block_id) {
                entry.acked = true;
            }
            self.block = None;
            self.advance_head();
        }
    }

    /// The packet carrying these messages was declared lost; make them
    /// immediately eligible for resend.
    pub fn drop_messages(&mut self, ids: &[MessageId]) {
        for &id in ids {
            if let Some(entry) = self.send_queue.get_mut(id) {
                if !entry.acked {
                    entry.time_last_sent = None;
                }
            }
        }
    }

    /// The packet carrying this fragment was declared lost.
    pub fn drop_fragment(&mut self, block_id: MessageId, fragment_index: usize) {
        let Some(block) = &mut self.block else {
            return;
        };
        if block.block_id != block_id || fragment_index >= block.num_fragments {
            return;
        }
        if !block.acked[fragment_index] {
            block.time_sent[fragment_index] = None;
        }
    }

    fn advance_head(&mut self) {
        while self.oldest_unacked_id != self.next_send_id {
            let acked = matches!(
                self.send_queue.get(self.oldest_unacked_id),
                Some(entry) if entry.acked
            );
            if !acked {
                break;
            }
            self.send_queue.remove(self.oldest_unacked_id);
            self.oldest_unacked_id = self.oldest_unacked_id.wrapping_add(1);
        }
    }
}

fn message_eligible(entry: &SendQueueEntry, resend_rate: f64, now: f64) -> bool {
    if entry.acked || entry.large_block {
        return false;
    }
    match entry.time_last_sent {
        None => true,
        Some(time_sent) => now - time_sent >= resend_rate,
    }
}

fn choose_fragment(block: &BlockSendState, resend_rate: f64, now: f64) -> Option<usize> {
    for index in 0..block.num_fragments {
        if block.acked[index] {
            continue;
        }
        let eligible = match block.time_sent[index] {
            None => true,
            Some(time_sent) => now - time_sent >= resend_rate,
        };
        if eligible {
            return Some(index);
        }
    }
    None
}

fn fragment_bits(
    block: &BlockSendState,
    index: usize,
    fragment_size: usize,
    max_fragments: usize,
) -> u32 {
    let last = index == block.num_fragments - 1;
    let num_bytes = if last {
        block.block_size - index * fragment_size
    } else {
        fragment_size
    };

    let mut bits = 1 + 16;
    bits += bits_required(0, (max_fragments - 1) as i32);
    bits += bits_required(0, (block.num_fragments - 1).max(1) as i32);
    if last {
        bits += bits_required(0, (fragment_size - 1) as i32);
    }
    bits + (num_bytes as u32) * 8
}
