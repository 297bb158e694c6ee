use tether_protocol::{
    Connection, ConnectionConfig, ConnectionCounter, ReliableChannelConfig,
};
use tether_test::{test_message_kinds, TestMessage};

fn connection_with(config: ConnectionConfig) -> Connection {
    Connection::new(
        config,
        &[ReliableChannelConfig::default()],
        test_message_kinds(),
    )
}

#[test]
fn malformed_input_is_counted_and_not_applied() {
    let mut connection = connection_with(ConnectionConfig::default());

    // nonsense bytes decode as a foreign packet type
    connection.read_packet(&[0xFF; 64]);
    assert_eq!(connection.counter(ConnectionCounter::ReadPacketFailures), 1);
    assert_eq!(connection.counter(ConnectionCounter::PacketsRead), 0);

    // a truncated packet fails mid-header
    let payload = connection.write_packet();
    connection.read_packet(&payload[..4]);
    assert_eq!(connection.counter(ConnectionCounter::ReadPacketFailures), 2);
    assert_eq!(connection.counter(ConnectionCounter::PacketsRead), 0);
    assert_eq!(connection.counter(ConnectionCounter::PacketsDiscarded), 0);
}

#[test]
fn protocol_id_gates_packets() {
    let mut sender = connection_with(ConnectionConfig {
        protocol_id: Some(0x1122_3344),
        ..Default::default()
    });
    let mut mismatched = connection_with(ConnectionConfig {
        protocol_id: Some(0x5566_7788),
        ..Default::default()
    });
    let mut matched = connection_with(ConnectionConfig {
        protocol_id: Some(0x1122_3344),
        ..Default::default()
    });

    sender
        .channel_mut(0)
        .unwrap()
        .send_message(Box::new(TestMessage::new(0)))
        .unwrap();
    let payload = sender.write_packet();

    mismatched.read_packet(&payload);
    assert_eq!(mismatched.counter(ConnectionCounter::ReadPacketFailures), 1);
    assert_eq!(mismatched.counter(ConnectionCounter::PacketsRead), 0);

    matched.read_packet(&payload);
    assert_eq!(matched.counter(ConnectionCounter::PacketsRead), 1);
    assert!(matched.channel_mut(0).unwrap().receive_message().is_some());
}

#[test]
fn duplicate_packets_are_discarded() {
    let mut sender = connection_with(ConnectionConfig::default());
    let mut receiver = connection_with(ConnectionConfig::default());

    let payload = sender.write_packet();
    receiver.read_packet(&payload);
    receiver.read_packet(&payload);

    assert_eq!(receiver.counter(ConnectionCounter::PacketsRead), 1);
    assert_eq!(receiver.counter(ConnectionCounter::PacketsDiscarded), 1);
    assert_eq!(receiver.counter(ConnectionCounter::ReadPacketFailures), 0);
}
