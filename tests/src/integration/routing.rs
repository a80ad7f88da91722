//! # Routing
//!
//! Per-type streams filtered by action, shared between callers, torn down by
//! reference count, with no replay after a gap.

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use vernite_schema::{communicator_model, BasicAction, KeepAlive, Project, Task};
    use vernite_transport::RouteKey;

    #[tokio::test]
    async fn test_type_and_action_filter_with_interleaving() {
        let mut harness = Harness::new();
        let transport = &harness.transport;
        let mut all_tasks = transport.subscribe::<Task>(None).unwrap();
        let mut added_tasks = transport.subscribe::<Task>(Some(BasicAction::Added)).unwrap();
        let mut removed_projects = transport
            .subscribe::<Project>(Some(BasicAction::Removed))
            .unwrap();

        harness.push(&task(1, Some(BasicAction::Added)));
        harness.push(&project(10, Some(BasicAction::Added)));
        harness.push(&task(2, Some(BasicAction::Updated)));
        harness.push(&project(11, Some(BasicAction::Removed)));
        harness.push(&task(3, None));
        harness.push(&task(4, Some(BasicAction::Added)));
        harness.push(&project(12, None));
        harness.sync().await;

        let mut seen = Vec::new();
        while let Some(t) = all_tasks.try_recv().unwrap() {
            seen.push(t.id);
        }
        assert_eq!(seen, vec![1, 2, 3, 4]);

        let mut seen = Vec::new();
        while let Some(t) = added_tasks.try_recv().unwrap() {
            seen.push(t.id);
        }
        assert_eq!(seen, vec![1, 4]);

        assert_eq!(removed_projects.try_recv().unwrap().map(|p| p.id), Some(11));
        assert!(removed_projects.try_recv().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unspecified_action_delivers_every_task() {
        let mut harness = Harness::new();
        let mut tasks = harness
            .transport
            .subscribe::<Task>(Some(BasicAction::Unspecified))
            .unwrap();

        harness.push(&task(1, Some(BasicAction::Added)));
        harness.push(&task(2, None));
        harness.sync().await;

        let mut seen = Vec::new();
        while let Some(t) = tasks.try_recv().unwrap() {
            seen.push(t.id);
        }
        assert_eq!(seen, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_nested_types_route_separately() {
        let mut harness = Harness::new();
        let mut messages = harness
            .transport
            .subscribe::<communicator_model::Message>(None)
            .unwrap();
        let mut users = harness
            .transport
            .subscribe_named("vernite.CommunicatorModel.User", None)
            .unwrap();

        harness.push(&communicator_model::User {
            id: "U1".into(),
            name: "ada".into(),
            ..Default::default()
        });
        harness.push(&communicator_model::Message {
            id: "M1".into(),
            content: "standup in 5".into(),
            ..Default::default()
        });

        assert_eq!(recv(&mut messages).await.content, "standup in 5");
        let user = recv_named(&mut users).await;
        assert_eq!(
            user.downcast_ref::<communicator_model::User>().map(|u| u.id.as_str()),
            Some("U1")
        );
    }

    #[tokio::test]
    async fn test_subscribers_share_one_route() {
        let harness = Harness::new();
        let transport = &harness.transport;
        let demux = transport.demultiplexer();
        // keep-alive route belongs to the liveness driver
        let baseline = demux.route_count();

        let a = transport.subscribe::<Task>(None).unwrap();
        let b = transport.subscribe::<Task>(None).unwrap();
        let c = b.clone();
        let named = transport.subscribe_named("vernite.Task", None).unwrap();

        assert_eq!(demux.route_count(), baseline + 1);
        assert_eq!(demux.subscriber_count(&RouteKey::of::<Task>(None)), 4);
        assert_eq!(demux.subscriber_count(&RouteKey::of::<KeepAlive>(None)), 1);
    }

    #[tokio::test]
    async fn test_teardown_after_last_subscriber_without_replay() {
        let mut harness = Harness::new();
        let key = RouteKey::of::<Task>(None);
        let baseline = harness.transport.demultiplexer().route_count();

        let subscribers: Vec<_> = (0..3)
            .map(|_| harness.transport.subscribe::<Task>(None).unwrap())
            .collect();
        harness.push(&task(1, None));
        harness.sync().await;

        for (i, subscriber) in subscribers.into_iter().enumerate() {
            assert_eq!(
                harness.transport.demultiplexer().subscriber_count(&key),
                3 - i
            );
            drop(subscriber);
        }
        assert_eq!(harness.transport.demultiplexer().subscriber_count(&key), 0);
        assert_eq!(harness.transport.demultiplexer().route_count(), baseline);

        // Arrives while nobody listens.
        harness.push(&task(2, None));
        harness.sync().await;

        let mut late = harness.transport.subscribe::<Task>(None).unwrap();
        harness.push(&task(3, None));

        assert_eq!(recv(&mut late).await.id, 3);
        harness.sync().await;
        assert!(late.try_recv().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_dropping_one_route_leaves_others() {
        let mut harness = Harness::new();
        let added = harness
            .transport
            .subscribe::<Task>(Some(BasicAction::Added))
            .unwrap();
        let mut all = harness.transport.subscribe::<Task>(None).unwrap();

        drop(added);
        harness.push(&task(7, Some(BasicAction::Added)));

        assert_eq!(recv(&mut all).await.id, 7);
    }

    #[tokio::test]
    async fn test_slow_subscriber_lags_without_blocking_others() {
        let config = vernite_transport::TransportConfig {
            route_capacity: 4,
            ..Default::default()
        };
        let mut harness = Harness::with_config(config);
        let mut slow = harness.transport.subscribe::<Task>(None).unwrap();
        let mut projects = harness.transport.subscribe::<Project>(None).unwrap();

        for id in 0..10 {
            harness.push(&task(id, None));
        }
        harness.push(&project(1, None));
        harness.sync().await;

        assert_eq!(recv(&mut projects).await.id, 1);

        // Oldest tasks were overwritten; the newest four remain in order.
        let mut seen = Vec::new();
        while let Some(t) = slow.try_recv().unwrap() {
            seen.push(t.id);
        }
        assert_eq!(seen, vec![6, 7, 8, 9]);
    }
}
