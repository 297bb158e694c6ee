use crate::{
    connection::{
        connection_config::ConnectionConfig, error::PacketReadError,
        standard_header::StandardHeader,
    },
    sequence_buffer::SequenceBuffer,
    types::PacketIndex,
    wrapping_number::{sequence_greater_than, sequence_less_than},
};

struct SentPacketData {
    time_sent: f64,
    acked: bool,
    dropped: bool,
}

struct ReceivedPacketData {
    time_received: f64,
}

// smoothing factor for the round-trip estimate
const RTT_GAIN: f64 = 0.1;

/// The sliding-window reliability core: assigns outbound sequences,
/// generates the cumulative-plus-bitfield ack state for each header, and
/// infers per-packet delivery from the headers the peer sends back.
pub struct AckManager {
    sequence: PacketIndex,
    /// Newest sequence received from the peer. Starts one before 0 so the
    /// pre-receipt header acks nothing.
    most_recent_received: PacketIndex,
    ack_window: u16,
    sent_packets: SequenceBuffer<SentPacketData>,
    received_packets: SequenceBuffer<ReceivedPacketData>,
    rtt: f64,
}

impl AckManager {
    pub fn new(config: &ConnectionConfig) -> Self {
        Self {
            sequence: 0,
            most_recent_received: u16::MAX,
            ack_window: config.ack_window,
            sent_packets: SequenceBuffer::with_capacity(config.sent_packets_buffer_size),
            received_packets: SequenceBuffer::with_capacity(config.received_packets_buffer_size),
            rtt: 0.0,
        }
    }

    /// Smoothed round-trip estimate in seconds, derived from ack timing.
    /// Zero until the first ack lands.
    pub fn rtt(&self) -> f64 {
        self.rtt
    }

    /// Clock time of the newest packet accepted from the peer, for host
    /// liveness decisions.
    pub fn time_last_received(&self) -> Option<f64> {
        self.received_packets
            .get(self.most_recent_received)
            .map(|entry| entry.time_received)
    }

    /// Produces the header for the next outbound packet. Exactly one
    /// sequence leaves the ack window per write; if it is still unacked it
    /// is returned as lost so the channels can requeue its contents.
    pub fn next_header(&mut self, now: f64) -> (StandardHeader, Option<PacketIndex>) {
        let lost = self.declare_lost();

        let sequence = self.sequence;
        self.sequence = self.sequence.wrapping_add(1);

        let (ack, ack_bits) = self.ack_state();
        self.sent_packets.insert(
            sequence,
            SentPacketData {
                time_sent: now,
                acked: false,
                dropped: false,
            },
        );

        (
            StandardHeader {
                sequence,
                ack,
                ack_bits,
            },
            lost,
        )
    }

    fn declare_lost(&mut self) -> Option<PacketIndex> {
        let lost_sequence = self.sequence.wrapping_sub(self.ack_window);
        match self.sent_packets.get_mut(lost_sequence) {
            Some(entry) if !entry.acked && !entry.dropped => {
                entry.dropped = true;
                Some(lost_sequence)
            }
            _ => None,
        }
    }

    fn ack_state(&self) -> (PacketIndex, u32) {
        let ack = self.most_recent_received;
        let mut ack_bits: u32 = 0;
        for k in 0..32u16 {
            if self.received_packets.exists(ack.wrapping_sub(k + 1)) {
                ack_bits |= 1 << k;
            }
        }
        (ack, ack_bits)
    }

    /// Applies an inbound header: records receipt of its sequence and
    /// returns the sent sequences it newly acknowledges, each reported at
    /// most once.
    pub fn process_header(
        &mut self,
        header: &StandardHeader,
        now: f64,
    ) -> Result<Vec<PacketIndex>, PacketReadError> {
        let window = self.received_packets.capacity() as u16;
        let oldest_tracked = self.most_recent_received.wrapping_sub(window - 1);
        if sequence_less_than(header.sequence, oldest_tracked) {
            return Err(PacketReadError::Stale {
                sequence: header.sequence,
            });
        }
        if self.received_packets.exists(header.sequence) {
            return Err(PacketReadError::Duplicate {
                sequence: header.sequence,
            });
        }

        self.received_packets.insert(
            header.sequence,
            ReceivedPacketData { time_received: now },
        );
        if sequence_greater_than(header.sequence, self.most_recent_received) {
            self.most_recent_received = header.sequence;
        }

        let mut delivered = Vec::new();
        self.try_ack(header.ack, now, &mut delivered);
        for k in 0..32u16 {
            if header.ack_bits & (1 << k) != 0 {
                self.try_ack(header.ack.wrapping_sub(k + 1), now, &mut delivered);
            }
        }
        Ok(delivered)
    }

    fn try_ack(&mut self, sequence: PacketIndex, now: f64, delivered: &mut Vec<PacketIndex>) {
        let Some(entry) = self.sent_packets.get_mut(sequence) else {
            return;
        };
        if entry.acked || entry.dropped {
            return;
        }

        entry.acked = true;
        let sample = (now - entry.time_sent).max(0.0);
        if self.rtt == 0.0 {
            self.rtt = sample;
        } else {
            self.rtt += (sample - self.rtt) * RTT_GAIN;
        }
        delivered.push(sequence);
    }
}
