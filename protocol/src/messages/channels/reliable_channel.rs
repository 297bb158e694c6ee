use std::collections::HashMap;

use log::warn;

use tether_serde::{de_ranged_int, de_raw_bytes, BitReader, BitWriter, Serde, SerdeErr};

use crate::{
    connection::packet_notifiable::PacketNotifiable,
    messages::{
        channels::{
            channel_config::ReliableChannelConfig,
            error::SendError,
            receiver::{BufferOutcome, ReliableMessageReceiver},
            sender::{ReliableMessageSender, SentRecord},
        },
        error::MessageReadError,
        message::BoxedMessage,
        message_kinds::MessageKinds,
    },
    time::TimeBase,
    types::{MessageId, PacketIndex},
};

/// Channel statistics, exposed via [`ReliableMessageChannel::counter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelCounter {
    MessagesSent = 0,
    MessagesReceived = 1,
    MessagesEarly = 2,
}

const CHANNEL_COUNTER_COUNT: usize = 3;

/// One block fragment, decoded off the wire.
pub(crate) struct FragmentData {
    pub block_id: MessageId,
    pub num_fragments: usize,
    pub fragment_id: usize,
    pub bytes: Vec<u8>,
}

/// A channel's fully parsed share of one inbound packet. Parsing is pure;
/// nothing is applied until the whole packet has decoded cleanly.
pub(crate) enum ChannelData {
    Messages {
        first_id: MessageId,
        messages: Vec<BoxedMessage>,
    },
    Fragment(FragmentData),
}

/// A reliable, in-order message channel: multiplexes small messages and
/// arbitrarily large blocks over the connection, surviving loss,
/// reordering and duplication.
pub struct ReliableMessageChannel {
    config: ReliableChannelConfig,
    sender: ReliableMessageSender,
    receiver: ReliableMessageReceiver,
    sent_records: HashMap<PacketIndex, SentRecord>,
    counters: [u64; CHANNEL_COUNTER_COUNT],
    time: f64,
}

impl ReliableMessageChannel {
    pub fn new(config: ReliableChannelConfig) -> Self {
        config.validate();
        Self {
            sender: ReliableMessageSender::new(&config),
            receiver: ReliableMessageReceiver::new(&config),
            config,
            sent_records: HashMap::new(),
            counters: [0; CHANNEL_COUNTER_COUNT],
            time: 0.0,
        }
    }

    pub fn config(&self) -> &ReliableChannelConfig {
        &self.config
    }

    /// Queues a message for reliable in-order delivery, assigning it the
    /// next message id.
    pub fn send_message(&mut self, message: BoxedMessage) -> Result<MessageId, SendError> {
        let id = self.sender.send_message(message)?;
        self.counters[ChannelCounter::MessagesSent as usize] += 1;
        Ok(id)
    }

    /// Queues a block of bytes. Small blocks travel inline as one message;
    /// large blocks are fragmented. Either way the block consumes one
    /// message id and is delivered in order with its neighbors.
    pub fn send_block(&mut self, bytes: Vec<u8>) -> Result<MessageId, SendError> {
        let id = self.sender.send_block(bytes)?;
        self.counters[ChannelCounter::MessagesSent as usize] += 1;
        Ok(id)
    }

    /// Returns the next in-order message, or `None` if it has not arrived.
    pub fn receive_message(&mut self) -> Option<(MessageId, BoxedMessage)> {
        let received = self.receiver.receive_message();
        if received.is_some() {
            self.counters[ChannelCounter::MessagesReceived as usize] += 1;
        }
        received
    }

    pub fn counter(&self, counter: ChannelCounter) -> u64 {
        self.counters[counter as usize]
    }

    pub(crate) fn update(&mut self, time_base: TimeBase) {
        self.time = time_base.time;
    }

    /// Bits this channel writes even when it has nothing to send.
    pub(crate) fn empty_data_bits(&self) -> u32 {
        self.sender.empty_data_bits()
    }

    pub(crate) fn write_data(
        &mut self,
        kinds: &MessageKinds,
        packet_index: PacketIndex,
        writer: &mut BitWriter,
        reserved_bits: u32,
    ) {
        if let Some(record) = self.sender.write_data(kinds, writer, reserved_bits, self.time) {
            self.sent_records.insert(packet_index, record);
        }
    }

    /// Pure parse of this channel's data; applies nothing.
    pub(crate) fn read_data(
        &self,
        kinds: &MessageKinds,
        reader: &mut BitReader,
    ) -> Result<ChannelData, MessageReadError> {
        let is_fragment = bool::de(reader)?;

        if !is_fragment {
            let count = de_ranged_int(reader, 0, self.config.max_messages_per_packet as i32)?
                as usize;
            if count == 0 {
                return Ok(ChannelData::Messages {
                    first_id: 0,
                    messages: Vec::new(),
                });
            }

            let first_id = MessageId::de(reader)?;
            let mut messages = Vec::with_capacity(count);
            for _ in 0..count {
                messages.push(kinds.read(reader)?);
            }
            return Ok(ChannelData::Messages { first_id, messages });
        }

        let max_fragments = self.config.max_fragments();
        if max_fragments < 2 {
            // this channel cannot carry fragments at all
            return Err(MessageReadError::Serde(SerdeErr));
        }

        let block_id = MessageId::de(reader)?;
        let num_fragments = de_ranged_int(reader, 0, (max_fragments - 1) as i32)? as usize + 1;
        let fragment_id =
            de_ranged_int(reader, 0, (num_fragments - 1).max(1) as i32)? as usize;
        if fragment_id >= num_fragments {
            return Err(MessageReadError::Serde(SerdeErr));
        }

        let num_bytes = if fragment_id == num_fragments - 1 {
            de_ranged_int(reader, 0, (self.config.fragment_size - 1) as i32)? as usize + 1
        } else {
            self.config.fragment_size
        };
        let bytes = de_raw_bytes(reader, num_bytes)?;

        Ok(ChannelData::Fragment(FragmentData {
            block_id,
            num_fragments,
            fragment_id,
            bytes,
        }))
    }

    pub(crate) fn process_data(&mut self, data: ChannelData) {
        match data {
            ChannelData::Messages { first_id, messages } => {
                for (offset, message) in messages.into_iter().enumerate() {
                    let id = first_id.wrapping_add(offset as MessageId);
                    if self.receiver.buffer_message(id, message) == BufferOutcome::Early {
                        self.counters[ChannelCounter::MessagesEarly as usize] += 1;
                        warn!("message {} arrived too far ahead, dropped", id);
                    }
                }
            }
            ChannelData::Fragment(fragment) => {
                let block_id = fragment.block_id;
                if self.receiver.buffer_fragment(fragment) == BufferOutcome::Early {
                    self.counters[ChannelCounter::MessagesEarly as usize] += 1;
                    warn!("fragment of block {} arrived too far ahead, dropped", block_id);
                }
            }
        }
    }
}

impl PacketNotifiable for ReliableMessageChannel {
    fn notify_packet_delivered(&mut self, packet_index: PacketIndex) {
        let Some(record) = self.sent_records.remove(&packet_index) else {
            return;
        };
        match record {
            SentRecord::Messages(ids) => self.sender.ack_messages(&ids),
            SentRecord::Fragment {
                block_id,
                fragment_index,
            } => self.sender.ack_fragment(block_id, fragment_index),
        }
    }

    fn notify_packet_dropped(&mut self, packet_index: PacketIndex) {
        let Some(record) = self.sent_records.remove(&packet_index) else {
            return;
        };
        match record {
            SentRecord::Messages(ids) => self.sender.drop_messages(&ids),
            SentRecord::Fragment {
                block_id,
                fragment_index,
            } => self.sender.drop_fragment(block_id, fragment_index),
        }
    }
}
