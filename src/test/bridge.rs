use std::future::pending;

use crate::prelude::*;
use crate::test::RecordingSink;

async fn bridge_on(
    sink: &RecordingSink,
    policy: WriteFailurePolicy,
) -> OutputBridge<RecordingSink> {
    OutputBridge::start(DeviceSession::new(sink.clone()), 0, policy)
        .await
        .expect("Must start")
}

#[tokio::test]
async fn configured_topic_drives_scaled_output() {
    let config = BridgeConfig::from_yaml("subscriber_topic: foo\n").expect("Must parse");
    let sink = RecordingSink::new(VoltageRange::new(0.0, 10.0).unwrap());
    let bridge = bridge_on(&sink, config.on_write_failure).await;

    let bus = TopicBus::new();
    let mut subscription = bus.subscribe(&config.subscriber_topic);
    bus.publish("analog_input", 0.9);
    bus.publish("foo", 0.5);
    bus.close("foo");

    let written = bridge
        .run(&mut subscription, pending::<()>())
        .await
        .expect("Must run");

    assert_eq!(written, 1);
    assert_eq!(sink.writes(), vec![(0, 5.0)]);
    assert_eq!(sink.releases(), 1);
}

#[tokio::test]
async fn default_topic_is_analog_input() {
    let config = BridgeConfig::from_yaml("channel: 0\n").expect("Must parse");
    let sink = RecordingSink::new(VoltageRange::UNIPOLAR_5V);
    let bridge = bridge_on(&sink, config.on_write_failure).await;

    let bus = TopicBus::new();
    let mut subscription = bus.subscribe(&config.subscriber_topic);
    bus.publish("analog_input", 0.25);
    bus.close("analog_input");

    bridge
        .run(&mut subscription, pending::<()>())
        .await
        .expect("Must run");

    assert_eq!(sink.volts(), vec![1.25]);
}

#[tokio::test]
async fn outputs_stay_in_range_and_follow_order() {
    let sink = RecordingSink::new(VoltageRange::new(-10.0, 10.0).unwrap());
    let bridge = bridge_on(&sink, WriteFailurePolicy::Terminate).await;

    let bus = TopicBus::new();
    let mut subscription = bus.subscribe("analog_input");
    let inputs = [0.0, 1.0, 0.5, -2.0, 7.0, f32::NAN, f32::INFINITY, 0.75];
    for value in inputs {
        bus.publish("analog_input", value);
    }
    bus.close("analog_input");

    let written = bridge
        .run(&mut subscription, pending::<()>())
        .await
        .expect("Must run");

    assert_eq!(written, inputs.len() as u64);
    assert_eq!(
        sink.volts(),
        vec![-10.0, 10.0, 0.0, -10.0, 10.0, -10.0, 10.0, 5.0]
    );
}

#[tokio::test]
async fn scaling_is_monotonic() {
    let sink = RecordingSink::new(VoltageRange::UNIPOLAR_5V);
    let mut bridge = bridge_on(&sink, WriteFailurePolicy::Terminate).await;

    let mut previous = f64::MIN;
    for step in -20..=120 {
        let voltage = bridge.handle(step as f32 / 100.0).await.expect("Must write");
        assert!(voltage >= previous, "{voltage} after {previous}");
        assert!(VoltageRange::UNIPOLAR_5V.contains(voltage));
        previous = voltage;
    }
}

#[tokio::test]
async fn terminate_policy_stops_and_releases() {
    let sink = RecordingSink::new(VoltageRange::UNIPOLAR_5V);
    let bridge = bridge_on(&sink, WriteFailurePolicy::Terminate).await;
    sink.fail_writes(true);

    let bus = TopicBus::new();
    let mut subscription = bus.subscribe("analog_input");
    bus.publish("analog_input", 0.5);
    bus.publish("analog_input", 0.6);

    let result = bridge.run(&mut subscription, pending::<()>()).await;

    assert!(matches!(result, Err(Error::Io(_))));
    assert_eq!(sink.releases(), 1);
}

#[tokio::test]
async fn skip_policy_keeps_going() {
    let sink = RecordingSink::new(VoltageRange::UNIPOLAR_5V);
    let mut bridge = bridge_on(&sink, WriteFailurePolicy::Skip).await;

    sink.fail_writes(true);
    bridge.handle(0.5).await.expect("Must skip");
    sink.fail_writes(false);

    let bus = TopicBus::new();
    let mut subscription = bus.subscribe("analog_input");
    bus.publish("analog_input", 0.25);
    bus.close("analog_input");

    let written = bridge
        .run(&mut subscription, pending::<()>())
        .await
        .expect("Must run");

    assert_eq!(written, 1);
    assert_eq!(sink.volts(), vec![1.25]);
    assert_eq!(sink.releases(), 1);
}

#[tokio::test]
async fn interrupt_releases_once() {
    let sink = RecordingSink::new(VoltageRange::UNIPOLAR_5V);
    let bridge = bridge_on(&sink, WriteFailurePolicy::Terminate).await;

    let bus = TopicBus::new();
    let mut subscription = bus.subscribe("analog_input");

    let written = bridge
        .run(&mut subscription, async {})
        .await
        .expect("Must stop");

    assert_eq!(written, 0);
    assert_eq!(sink.releases(), 1);
    drop(bus);
}

#[tokio::test(start_paused = true)]
async fn interrupt_abandons_stalled_write() {
    let sink = RecordingSink::new(VoltageRange::UNIPOLAR_5V);
    let bridge = bridge_on(&sink, WriteFailurePolicy::Terminate).await;
    sink.stall_writes(true);

    let bus = TopicBus::new();
    let mut subscription = bus.subscribe("analog_input");
    bus.publish("analog_input", 0.5);

    let written = bridge
        .run(
            &mut subscription,
            tokio::time::sleep(std::time::Duration::from_secs(1)),
        )
        .await
        .expect("Must stop");

    assert_eq!(written, 0);
    assert!(sink.writes().is_empty());
    assert_eq!(sink.releases(), 1);
}

#[tokio::test]
async fn dropped_session_releases_once() {
    let sink = RecordingSink::new(VoltageRange::UNIPOLAR_5V);
    let bridge = bridge_on(&sink, WriteFailurePolicy::Terminate).await;

    drop(bridge);
    assert_eq!(sink.releases(), 1);
}
