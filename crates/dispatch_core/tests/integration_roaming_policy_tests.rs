mod support;

use dispatch_core::fleet::VehicleStatus;
use dispatch_core::protocol::{Assignment, InboundMessage, TravelTimeQuery, TravelTimeResponse};
use dispatch_core::test_helpers::grid_link;
use dispatch_core::{
    Dispatcher, DispatcherConfig, NoTravelTimes, PolicyKind, RequestId, RoamingConfig,
    TravelTimeSource, VehicleId,
};
use support::messages::{iteration, stops, StateBuilder};
use support::world::TestDispatcherBuilder;

/// Answers every query with a fixed travel time for one link.
struct FixedTravelTimes {
    queries: Vec<TravelTimeQuery>,
    response: TravelTimeResponse,
}

impl TravelTimeSource for FixedTravelTimes {
    fn query_travel_times(
        &mut self,
        query: TravelTimeQuery,
    ) -> dispatch_core::Result<TravelTimeResponse> {
        self.queries.push(query);
        Ok(self.response.clone())
    }
}

fn roaming_dispatcher(refresh_secs: f64) -> Dispatcher {
    let config = DispatcherConfig::default()
        .with_policy(PolicyKind::Roaming)
        .with_seed(3)
        .with_roaming(RoamingConfig {
            interval_secs: 300.0,
            travel_time_refresh_secs: refresh_secs,
        });
    TestDispatcherBuilder::new().with_config(config).build()
}

fn handle(dispatcher: &mut Dispatcher, message: InboundMessage) -> Assignment {
    dispatcher
        .handle(&message, &mut NoTravelTimes)
        .expect("handle")
        .expect("reply")
}

#[test]
fn vehicle_on_origin_link_is_matched_in_the_same_tick() {
    let mut dispatcher = roaming_dispatcher(0.0);
    let l1 = grid_link(1, 1, 2, 1);
    handle(&mut dispatcher, iteration(0, &[("v1", l1.clone())]));

    let reply = handle(
        &mut dispatcher,
        StateBuilder::at(17.0)
            .vehicle("v1", l1.clone(), VehicleStatus::Drive)
            .submit("r1", l1.clone(), grid_link(3, 3, 3, 2), 1e9)
            .build(),
    );

    let plan = stops(&reply, "v1");
    assert_eq!(plan.len(), 2);
    assert_eq!(plan[0].link, l1);
    assert_eq!(plan[0].pickup, vec![RequestId::from("r1")]);
    assert_eq!(plan[0].route, None);
    assert_eq!(plan[1].route, None);
    assert_eq!(
        dispatcher
            .fleet()
            .vehicle(&VehicleId::from("v1"))
            .and_then(|v| v.request()),
        Some(&RequestId::from("r1"))
    );
}

#[test]
fn vehicles_stay_inactive_until_first_reported() {
    let mut dispatcher = roaming_dispatcher(0.0);
    let l1 = grid_link(1, 1, 2, 1);
    let reply = handle(&mut dispatcher, iteration(0, &[("v1", l1.clone())]));
    assert!(reply.is_empty());

    let reply = handle(
        &mut dispatcher,
        StateBuilder::at(300.0)
            .submit("r1", l1, grid_link(3, 3, 3, 2), 1e9)
            .build(),
    );
    assert!(reply.stops_for(&VehicleId::from("v1")).is_none());
}

#[test]
fn idle_vehicles_are_diverted_along_connected_routes() {
    let mut dispatcher = roaming_dispatcher(0.0);
    let current = grid_link(0, 0, 1, 0);
    let diverge = grid_link(1, 0, 2, 0);
    handle(&mut dispatcher, iteration(0, &[("v1", current.clone())]));

    // Off the roaming interval: nothing to do.
    let reply = handle(
        &mut dispatcher,
        StateBuilder::at(150.0)
            .diverging("v1", current.clone(), diverge.clone())
            .build(),
    );
    assert!(reply.stops_for(&VehicleId::from("v1")).is_none());

    let reply = handle(
        &mut dispatcher,
        StateBuilder::at(300.0)
            .diverging("v1", current, diverge.clone())
            .build(),
    );
    let plan = stops(&reply, "v1");
    assert_eq!(plan.len(), 1);
    let route = plan[0].route.as_ref().expect("explicit route");
    assert_eq!(route.first(), Some(&diverge));
    assert_eq!(route.last(), Some(&plan[0].link));

    let network = dispatcher.network();
    for pair in route.windows(2) {
        let from = network.link(network.link_index(&pair[0]).expect("known"));
        let to = network.link(network.link_index(&pair[1]).expect("known"));
        assert_eq!(from.to, to.from, "route must be connected");
    }
}

#[test]
fn travel_times_are_refreshed_on_schedule() {
    let mut dispatcher = roaming_dispatcher(600.0);
    let slow = grid_link(0, 0, 1, 0);
    let mut source = FixedTravelTimes {
        queries: Vec::new(),
        response: TravelTimeResponse::default(),
    };
    source.response.travel_times.insert(slow.clone(), 250.0);

    let mut run = |dispatcher: &mut Dispatcher, message: InboundMessage| {
        dispatcher
            .handle(&message, &mut source)
            .expect("handle")
            .expect("reply");
    };
    run(&mut dispatcher, iteration(0, &[("v1", slow.clone())]));
    run(&mut dispatcher, StateBuilder::at(300.0).build());
    run(&mut dispatcher, StateBuilder::at(600.0).build());

    assert_eq!(source.queries.len(), 2);
    assert!(source.queries.iter().all(|q| q.links.is_empty()));
    let network = dispatcher.network();
    let index = network.link_index(&slow).expect("known");
    assert_eq!(network.link(index).travel_time_secs, 250.0);
}
