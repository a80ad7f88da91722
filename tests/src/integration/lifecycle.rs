//! # Connection Lifecycle
//!
//! Outbound ordering, the `vernite.Task` round trip, and how streams end when
//! the connection fails or is shut down.

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use futures::StreamExt;
    use prost::Message;
    use tokio::time::timeout;
    use vernite_schema::{BasicAction, Project, Sprint, Task};
    use vernite_transport::{ChannelState, TransportError};

    #[tokio::test]
    async fn test_task_scenario() {
        let mut harness = Harness::new();
        let mut tasks = harness.transport.subscribe::<Task>(None).unwrap();
        let sent = Task {
            id: 12,
            project_id: 3,
            status_id: 4,
            name: "Review pull request".into(),
            description: "websocket reconnect".into(),
            deadline: Some(1_760_000_000_000),
            action: Some(BasicAction::Updated as i32),
        };

        harness.transport.next(&sent).unwrap();

        let frame = harness.next_outbound().await;
        let envelope = prost_types::Any::decode(frame.as_ref()).unwrap();
        assert_eq!(envelope.type_url, "vernite.Task");
        assert_eq!(Task::decode(envelope.value.as_slice()).unwrap(), sent);

        harness.push_raw(frame);
        assert_eq!(*recv(&mut tasks).await, sent);
    }

    #[tokio::test]
    async fn test_outbound_order_matches_call_order() {
        let mut harness = Harness::new();

        for id in 0..50 {
            if id % 7 == 0 {
                harness.transport.next(&project(id, None)).unwrap();
            } else {
                harness.transport.next(&task(id, None)).unwrap();
            }
        }

        for id in 0..50 {
            let frame = harness.next_outbound().await;
            let message = harness.codec.unpack(&frame).unwrap();
            let got = message
                .downcast_ref::<Task>()
                .map(|t| t.id)
                .or_else(|| message.downcast_ref::<Project>().map(|p| p.id));
            assert_eq!(got, Some(id));
        }
    }

    #[tokio::test]
    async fn test_connection_failure_terminates_every_stream() {
        let harness = Harness::new();
        let transport = &harness.transport;
        let mut tasks = transport.subscribe::<Task>(None).unwrap();
        let mut added = transport.subscribe::<Task>(Some(BasicAction::Added)).unwrap();
        let mut sprints = transport.subscribe_named("vernite.Sprint", None).unwrap();
        let mut projects = transport.subscribe::<Project>(None).unwrap().into_stream().boxed();

        harness.peer.fail("server restarted");

        let expected = TransportError::ConnectionFailure("server restarted".into());
        assert_eq!(timeout(WAIT, tasks.recv()).await.unwrap().err(), Some(expected.clone()));
        assert_eq!(timeout(WAIT, added.recv()).await.unwrap().err(), Some(expected.clone()));
        assert_eq!(timeout(WAIT, sprints.recv()).await.unwrap().err(), Some(expected.clone()));
        assert_eq!(
            timeout(WAIT, projects.next()).await.unwrap().unwrap().err(),
            Some(expected.clone())
        );
        assert!(timeout(WAIT, projects.next()).await.unwrap().is_none());

        assert_eq!(timeout(WAIT, transport.terminated()).await.unwrap(), expected);
        assert_eq!(
            transport.channel_state(),
            ChannelState::Terminated(expected.clone())
        );
        assert_eq!(transport.next(&Sprint::default()), Err(expected.clone()));
        assert!(matches!(
            transport.subscribe::<Task>(None),
            Err(TransportError::ConnectionFailure(_))
        ));

        timeout(WAIT, async {
            while transport.liveness().is_running() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("liveness driver still running");
    }

    #[tokio::test]
    async fn test_server_hangup_is_connection_failure() {
        let mut harness = Harness::new();
        let mut tasks = harness.transport.subscribe::<Task>(None).unwrap();

        harness.push(&task(1, None));
        harness.peer.close();

        assert_eq!(recv(&mut tasks).await.id, 1);
        assert!(matches!(
            timeout(WAIT, tasks.recv()).await.unwrap(),
            Err(TransportError::ConnectionFailure(_))
        ));
    }

    #[tokio::test]
    async fn test_shutdown_closes_streams() {
        let harness = Harness::new();
        let mut tasks = harness.transport.subscribe::<Task>(None).unwrap();

        harness.transport.shutdown();

        assert_eq!(
            timeout(WAIT, tasks.recv()).await.unwrap().err(),
            Some(TransportError::ChannelClosed)
        );
        assert_eq!(
            timeout(WAIT, harness.transport.terminated()).await.unwrap(),
            TransportError::ChannelClosed
        );
    }

    #[tokio::test]
    async fn test_refused_connection_terminates_transport() {
        let transport = vernite_transport::MessageTransport::with_connector(
            Default::default(),
            std::sync::Arc::new(vernite_transport::MemoryConnector::refusing("refused")),
        )
        .unwrap();

        assert_eq!(
            timeout(WAIT, transport.terminated()).await.unwrap(),
            TransportError::ConnectionFailure("refused".into())
        );
        assert!(transport.subscribe::<Task>(None).is_err());
    }
}
