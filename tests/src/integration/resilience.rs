//! # Inbound Resilience
//!
//! Frames the client cannot understand cost exactly themselves: they are
//! dropped with a warning and every open stream carries on.

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use vernite_schema::Task;
    use vernite_telemetry::FRAMES_DROPPED;
    use vernite_transport::ChannelState;

    #[tokio::test]
    async fn test_unknown_type_does_not_disturb_streams() {
        let mut harness = Harness::new();
        let mut tasks = harness.transport.subscribe::<Task>(None).unwrap();
        let dropped_before = FRAMES_DROPPED.with_label_values(&["unknown_type"]).get();

        harness.push(&task(1, None));
        harness.push_raw(unknown_type_frame("vernite.Meeting"));
        harness.push_raw(unknown_type_frame("type.googleapis.com/vernite.Calendar"));
        harness.push(&task(2, None));

        assert_eq!(recv(&mut tasks).await.id, 1);
        assert_eq!(recv(&mut tasks).await.id, 2);
        assert!(tasks.try_recv().unwrap().is_none());

        assert!(FRAMES_DROPPED.with_label_values(&["unknown_type"]).get() >= dropped_before + 2.0);
        assert_eq!(harness.transport.channel_state(), ChannelState::Open);
    }

    #[tokio::test]
    async fn test_malformed_frames_are_dropped() {
        let mut harness = Harness::new();
        let mut tasks = harness.transport.subscribe::<Task>(None).unwrap();

        harness.push_raw(vec![0xff, 0xff, 0xff, 0xff]);
        harness.push(&task(1, None));
        // Valid envelope, payload truncated mid-string.
        harness.push_raw(
            prost::Message::encode_to_vec(&prost_types::Any {
                type_url: "vernite.Task".into(),
                value: vec![0x22, 0x40, b'x'],
            }),
        );
        harness.push_raw(Vec::new());
        harness.push(&task(2, None));

        assert_eq!(recv(&mut tasks).await.id, 1);
        assert_eq!(recv(&mut tasks).await.id, 2);

        harness.sync().await;
        assert!(tasks.try_recv().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_bad_frames_do_not_stop_liveness() {
        let mut harness = Harness::new();

        harness.push_raw(vec![0x0a, 0xff]);
        harness.push_raw(unknown_type_frame("vernite.Gone"));
        harness.sync().await;

        assert!(harness.transport.liveness().is_running());
        assert_eq!(harness.transport.liveness().echoed(), 1);
    }
}
