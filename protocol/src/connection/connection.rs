use log::warn;

use tether_serde::{de_ranged_int, ser_ranged_int, BitReader, BitWriter, Serde};

use crate::{
    connection::{
        ack_manager::AckManager, connection_config::ConnectionConfig, error::PacketReadError,
        packet_notifiable::PacketNotifiable, standard_header::StandardHeader,
    },
    messages::{
        channels::{channel_config::ReliableChannelConfig, reliable_channel::ReliableMessageChannel},
        message_kinds::MessageKinds,
    },
    time::TimeBase,
};

/// Connection statistics, exposed via [`Connection::counter`]. Discards
/// (stale or duplicate sequence) are tallied separately from read failures
/// (malformed input).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionCounter {
    PacketsRead = 0,
    PacketsWritten = 1,
    PacketsAcked = 2,
    PacketsDiscarded = 3,
    ReadPacketFailures = 4,
}

const CONNECTION_COUNTER_COUNT: usize = 5;

/// A bidirectional connection to one remote endpoint, multiplexing a fixed
/// set of channels over sequenced, acked packets. Usable immediately; no
/// handshake at this layer.
pub struct Connection {
    config: ConnectionConfig,
    message_kinds: MessageKinds,
    ack_manager: AckManager,
    channels: Vec<ReliableMessageChannel>,
    time_base: TimeBase,
    counters: [u64; CONNECTION_COUNTER_COUNT],
}

impl Connection {
    /// Builds a connection with one channel per config, in declared order.
    /// The channel order is part of the wire format and must match on both
    /// peers, as must the (locked) message registry.
    pub fn new(
        config: ConnectionConfig,
        channel_configs: &[ReliableChannelConfig],
        mut message_kinds: MessageKinds,
    ) -> Self {
        config.validate();
        assert!(!channel_configs.is_empty());
        message_kinds.lock();

        let channels: Vec<ReliableMessageChannel> = channel_configs
            .iter()
            .map(|channel_config| ReliableMessageChannel::new(channel_config.clone()))
            .collect();

        // the packet must fit the framing, the header and one empty marker
        // per channel, or write_packet could never produce a legal packet
        let marker_bits: u32 = channels.iter().map(|channel| channel.empty_data_bits()).sum();
        assert!((config.max_packet_size as u32) * 8 >= 128 + marker_bits);

        Self {
            ack_manager: AckManager::new(&config),
            config,
            message_kinds,
            channels,
            time_base: TimeBase::default(),
            counters: [0; CONNECTION_COUNTER_COUNT],
        }
    }

    pub fn channel(&self, index: usize) -> Option<&ReliableMessageChannel> {
        self.channels.get(index)
    }

    pub fn channel_mut(&mut self, index: usize) -> Option<&mut ReliableMessageChannel> {
        self.channels.get_mut(index)
    }

    pub fn counter(&self, counter: ConnectionCounter) -> u64 {
        self.counters[counter as usize]
    }

    /// Smoothed round-trip estimate in seconds; zero until the first ack.
    pub fn rtt(&self) -> f64 {
        self.ack_manager.rtt()
    }

    /// Clock time of the newest packet accepted from the peer. The core
    /// has no liveness timeout; hosts build theirs on this.
    pub fn time_last_heard(&self) -> Option<f64> {
        self.ack_manager.time_last_received()
    }

    /// Advances the connection clock. Resend timers key off this; call it
    /// once per host tick.
    pub fn update(&mut self, time_base: TimeBase) {
        self.time_base = time_base;
        for channel in &mut self.channels {
            channel.update(time_base);
        }
    }

    /// Produces the next outbound packet: framing, reliability header,
    /// then each channel's data in declared order. Never fails.
    pub fn write_packet(&mut self) -> Vec<u8> {
        let now = self.time_base.time;
        let (header, lost) = self.ack_manager.next_header(now);
        if let Some(lost_sequence) = lost {
            for channel in &mut self.channels {
                channel.notify_packet_dropped(lost_sequence);
            }
        }

        let mut writer = BitWriter::with_capacity(self.config.max_packet_size);
        if let Some(protocol_id) = self.config.protocol_id {
            protocol_id.ser(&mut writer);
        }
        ser_ranged_int(
            i32::from(self.config.packet_type),
            0,
            i32::from((self.config.num_packet_types - 1).max(1)),
            &mut writer,
        );
        header.ser(&mut writer);

        // every channel writes at least an empty marker; each one's budget
        // excludes the marker space owed to the channels after it
        let marker_bits: Vec<u32> = self
            .channels
            .iter()
            .map(|channel| channel.empty_data_bits())
            .collect();
        for (index, channel) in self.channels.iter_mut().enumerate() {
            let reserved_bits: u32 = marker_bits[index + 1..].iter().sum();
            channel.write_data(&self.message_kinds, header.sequence, &mut writer, reserved_bits);
        }

        self.counters[ConnectionCounter::PacketsWritten as usize] += 1;
        writer.to_bytes()
    }

    /// Consumes an inbound packet. Fails silently: stale or duplicate
    /// sequences bump `PacketsDiscarded`, malformed input bumps
    /// `ReadPacketFailures`, and in either case no state changes.
    pub fn read_packet(&mut self, payload: &[u8]) {
        match self.try_read_packet(payload) {
            Ok(()) => {
                self.counters[ConnectionCounter::PacketsRead as usize] += 1;
            }
            Err(error) if error.is_discard() => {
                self.counters[ConnectionCounter::PacketsDiscarded as usize] += 1;
            }
            Err(error) => {
                warn!("packet read failure: {}", error);
                self.counters[ConnectionCounter::ReadPacketFailures as usize] += 1;
            }
        }
    }

    fn try_read_packet(&mut self, payload: &[u8]) -> Result<(), PacketReadError> {
        let mut reader = BitReader::new(payload);

        if let Some(protocol_id) = self.config.protocol_id {
            if u32::de(&mut reader)? != protocol_id {
                return Err(PacketReadError::ProtocolIdMismatch);
            }
        }

        let packet_type = de_ranged_int(
            &mut reader,
            0,
            i32::from((self.config.num_packet_types - 1).max(1)),
        )? as u16;
        if packet_type != self.config.packet_type {
            return Err(PacketReadError::UnknownPacketType { packet_type });
        }

        let header = StandardHeader::de(&mut reader)?;

        // parse every channel's data before applying anything, so a decode
        // failure discards the packet without side effects
        let mut channel_datas = Vec::with_capacity(self.channels.len());
        for channel in &self.channels {
            channel_datas.push(channel.read_data(&self.message_kinds, &mut reader)?);
        }

        let delivered = self
            .ack_manager
            .process_header(&header, self.time_base.time)?;
        self.counters[ConnectionCounter::PacketsAcked as usize] += delivered.len() as u64;
        for sequence in delivered {
            for channel in &mut self.channels {
                channel.notify_packet_delivered(sequence);
            }
        }

        for (channel, data) in self.channels.iter_mut().zip(channel_datas) {
            channel.process_data(data);
        }
        Ok(())
    }
}
