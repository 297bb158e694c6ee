use rand::{rngs::StdRng, Rng, SeedableRng};

use tether_protocol::TimeBase;

/// Link conditions applied to every packet in flight.
#[derive(Clone, Debug)]
pub struct SimulatorConfig {
    /// Base one-way delay in seconds.
    pub latency: f64,
    /// Uniform random delay in `[-jitter, +jitter]` added per packet;
    /// enough jitter reorders packets.
    pub jitter: f64,
    /// Percent of packets dropped outright.
    pub packet_loss: f64,
    /// Percent of packets delivered twice, the copy with its own jitter.
    pub duplicate: f64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            latency: 0.0,
            jitter: 0.0,
            packet_loss: 0.0,
            duplicate: 0.0,
        }
    }
}

struct QueuedPacket {
    delivery_time: f64,
    payload: Vec<u8>,
}

/// Carries byte payloads across a simulated lossy link. Deterministic for
/// a given seed, so failures replay exactly.
pub struct NetworkSimulator {
    config: SimulatorConfig,
    rng: StdRng,
    queue: Vec<QueuedPacket>,
    time: f64,
}

impl NetworkSimulator {
    pub fn new(config: SimulatorConfig, seed: u64) -> Self {
        Self {
            config,
            rng: StdRng::seed_from_u64(seed),
            queue: Vec::new(),
            time: 0.0,
        }
    }

    pub fn send_packet(&mut self, payload: Vec<u8>) {
        if self.roll(self.config.packet_loss) {
            return;
        }

        let copies = if self.roll(self.config.duplicate) { 2 } else { 1 };
        for _ in 0..copies {
            let jitter = if self.config.jitter > 0.0 {
                self.rng.gen_range(-self.config.jitter..=self.config.jitter)
            } else {
                0.0
            };
            let delay = (self.config.latency + jitter).max(0.0);
            self.queue.push(QueuedPacket {
                delivery_time: self.time + delay,
                payload: payload.clone(),
            });
        }
    }

    pub fn update(&mut self, time_base: TimeBase) {
        self.time = time_base.time;
    }

    /// Pops one packet whose delivery time has arrived, if any.
    pub fn receive_packet(&mut self) -> Option<Vec<u8>> {
        let index = self
            .queue
            .iter()
            .position(|packet| packet.delivery_time <= self.time)?;
        Some(self.queue.remove(index).payload)
    }

    pub fn packets_in_flight(&self) -> usize {
        self.queue.len()
    }

    fn roll(&mut self, percent: f64) -> bool {
        percent > 0.0 && self.rng.gen_range(0.0..100.0) < percent
    }
}

#[cfg(test)]
mod tests {
    use super::{NetworkSimulator, SimulatorConfig};
    use tether_protocol::TimeBase;

    #[test]
    fn packets_arrive_after_latency() {
        let config = SimulatorConfig {
            latency: 0.05,
            ..Default::default()
        };
        let mut simulator = NetworkSimulator::new(config, 1);
        let mut time_base = TimeBase::new(0.01);

        simulator.send_packet(vec![1, 2, 3]);
        simulator.update(time_base);
        assert_eq!(simulator.receive_packet(), None);

        for _ in 0..5 {
            time_base.tick();
        }
        simulator.update(time_base);
        assert_eq!(simulator.receive_packet(), Some(vec![1, 2, 3]));
        assert_eq!(simulator.receive_packet(), None);
    }

    #[test]
    fn total_loss_drops_everything() {
        let config = SimulatorConfig {
            packet_loss: 100.0,
            ..Default::default()
        };
        let mut simulator = NetworkSimulator::new(config, 1);

        for _ in 0..100 {
            simulator.send_packet(vec![0]);
        }
        assert_eq!(simulator.packets_in_flight(), 0);
    }

    #[test]
    fn duplication_delivers_twice() {
        let config = SimulatorConfig {
            duplicate: 100.0,
            ..Default::default()
        };
        let mut simulator = NetworkSimulator::new(config, 1);
        let mut time_base = TimeBase::new(0.01);

        simulator.send_packet(vec![9]);
        time_base.tick();
        simulator.update(time_base);

        assert_eq!(simulator.receive_packet(), Some(vec![9]));
        assert_eq!(simulator.receive_packet(), Some(vec![9]));
        assert_eq!(simulator.receive_packet(), None);
    }
}
