//! # Keep-Alive Echo
//!
//! Each inbound keep-alive produces exactly one outbound keep-alive envelope.

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use std::time::Duration;
    use vernite_schema::{BasicAction, KeepAlive};
    use vernite_transport::EnvelopeCodec;

    #[tokio::test]
    async fn test_one_keepalive_one_echo() {
        let mut harness = Harness::new();

        harness.push(&KeepAlive {});
        let echo = harness.next_outbound().await;

        assert_eq!(
            EnvelopeCodec::peek_type_name(&echo).unwrap(),
            "vernite.KeepAlive"
        );
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(harness.peer.try_recv_outbound().is_none());
        assert_eq!(harness.transport.liveness().echoed(), 1);
    }

    #[tokio::test]
    async fn test_burst_is_echoed_one_for_one() {
        let mut harness = Harness::new();

        for _ in 0..20 {
            harness.push(&KeepAlive {});
        }
        for _ in 0..20 {
            let echo = harness.next_outbound().await;
            assert!(harness.codec.unpack_as::<KeepAlive>(&echo).is_ok());
        }

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(harness.peer.try_recv_outbound().is_none());
        assert_eq!(harness.transport.liveness().echoed(), 20);
    }

    #[tokio::test]
    async fn test_other_messages_are_not_echoed() {
        let mut harness = Harness::new();

        harness.push(&task(1, Some(BasicAction::Added)));
        harness.push(&project(1, None));
        harness.sync().await;

        assert!(harness.peer.try_recv_outbound().is_none());
        assert_eq!(harness.transport.liveness().echoed(), 1);
    }

    #[tokio::test]
    async fn test_application_keepalive_subscriber_coexists() {
        let mut harness = Harness::new();
        let mut keepalives = harness.transport.subscribe::<KeepAlive>(None).unwrap();

        harness.push(&KeepAlive {});

        recv(&mut keepalives).await;
        harness.next_outbound().await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(harness.peer.try_recv_outbound().is_none());
    }
}
