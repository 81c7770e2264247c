mod support;

use dispatch_core::fleet::VehicleStatus;
use dispatch_core::protocol::Assignment;
use dispatch_core::test_helpers::grid_link;
use dispatch_core::{Dispatcher, NoTravelTimes, RequestId, VehicleId};
use support::messages::{iteration, stops, StateBuilder};
use support::world::TestDispatcherBuilder;

fn step(dispatcher: &mut Dispatcher, message: dispatch_core::protocol::InboundMessage) -> Assignment {
    let reply = dispatcher
        .handle(&message, &mut NoTravelTimes)
        .expect("handle")
        .expect("reply");
    assert!(dispatcher.fleet().is_consistent());
    reply
}

#[test]
fn expired_unmatched_request_is_rejected_once() {
    let mut dispatcher = TestDispatcherBuilder::new().build();
    step(&mut dispatcher, iteration(0, &[]));

    // No vehicles, so the request stays unmatched.
    step(
        &mut dispatcher,
        StateBuilder::at(30.0)
            .submit("late", grid_link(0, 0, 1, 0), grid_link(1, 0, 2, 0), 45.0)
            .build(),
    );

    let reply = step(&mut dispatcher, StateBuilder::at(60.0).build());
    assert_eq!(reply.rejections, vec![RequestId::from("late")]);
    assert!(dispatcher.fleet().request(&RequestId::from("late")).is_none());
    assert_eq!(dispatcher.fleet().statistics().rejected, 1);

    let reply = step(&mut dispatcher, StateBuilder::at(90.0).build());
    assert!(reply.rejections.is_empty());
}

#[test]
fn expiring_assigned_request_releases_its_vehicle() {
    let mut dispatcher = TestDispatcherBuilder::new().build();
    step(&mut dispatcher, iteration(0, &[("v1", grid_link(0, 0, 1, 0))]));

    let reply = step(
        &mut dispatcher,
        StateBuilder::at(30.0)
            .submit("r1", grid_link(3, 3, 2, 3), grid_link(0, 3, 1, 3), 50.0)
            .build(),
    );
    assert_eq!(stops(&reply, "v1").len(), 2);

    // Still driving towards the pickup when the deadline passes.
    let reply = step(
        &mut dispatcher,
        StateBuilder::at(60.0)
            .vehicle("v1", grid_link(1, 0, 2, 0), VehicleStatus::Drive)
            .build(),
    );
    assert_eq!(reply.rejections, vec![RequestId::from("r1")]);
    assert!(stops(&reply, "v1").is_empty());
    assert!(dispatcher
        .fleet()
        .vehicle(&VehicleId::from("v1"))
        .is_some_and(|v| v.is_idle()));
}

#[test]
fn request_being_picked_up_is_not_rejected() {
    let mut dispatcher = TestDispatcherBuilder::new().build();
    step(&mut dispatcher, iteration(0, &[("v1", grid_link(0, 0, 1, 0))]));
    step(
        &mut dispatcher,
        StateBuilder::at(30.0)
            .submit("r1", grid_link(1, 0, 2, 0), grid_link(3, 0, 3, 1), 50.0)
            .build(),
    );

    let reply = step(
        &mut dispatcher,
        StateBuilder::at(60.0)
            .vehicle("v1", grid_link(1, 0, 2, 0), VehicleStatus::Stop)
            .build(),
    );
    assert!(reply.rejections.is_empty());
    // Neither side is up for matching while the stop is in progress.
    assert!(reply.stops_for(&VehicleId::from("v1")).is_none());
    assert!(dispatcher.fleet().request(&RequestId::from("r1")).is_some());
}

#[test]
fn full_trip_keeps_links_consistent_and_counts_completion() {
    let mut dispatcher = TestDispatcherBuilder::new().build();
    step(
        &mut dispatcher,
        iteration(
            0,
            &[("v1", grid_link(0, 0, 1, 0)), ("v2", grid_link(3, 3, 2, 3))],
        ),
    );

    step(
        &mut dispatcher,
        StateBuilder::at(30.0)
            .submit("r1", grid_link(1, 0, 2, 0), grid_link(3, 0, 3, 1), 1e9)
            .submit("r2", grid_link(2, 3, 1, 3), grid_link(0, 3, 0, 2), 1e9)
            .build(),
    );
    let fleet = dispatcher.fleet();
    assert_eq!(
        fleet.request(&RequestId::from("r1")).and_then(|r| r.vehicle()),
        Some(&VehicleId::from("v1"))
    );
    assert_eq!(
        fleet.request(&RequestId::from("r2")).and_then(|r| r.vehicle()),
        Some(&VehicleId::from("v2"))
    );

    step(
        &mut dispatcher,
        StateBuilder::at(45.0)
            .pickup("r1", "v1")
            .vehicle("v1", grid_link(1, 0, 2, 0), VehicleStatus::Stop)
            .build(),
    );
    let reply = step(
        &mut dispatcher,
        StateBuilder::at(60.0)
            .vehicle("v1", grid_link(2, 0, 3, 0), VehicleStatus::Drive)
            .build(),
    );
    // Occupied vehicles are never rescheduled.
    assert!(reply.stops_for(&VehicleId::from("v1")).is_none());

    step(
        &mut dispatcher,
        StateBuilder::at(75.0)
            .dropoff("r1", "v1")
            .vehicle("v1", grid_link(3, 0, 3, 1), VehicleStatus::Stay)
            .build(),
    );
    let fleet = dispatcher.fleet();
    assert!(fleet.request(&RequestId::from("r1")).is_none());
    assert!(fleet
        .vehicle(&VehicleId::from("v1"))
        .is_some_and(|v| v.is_idle() && !v.occupied));
    assert_eq!(fleet.statistics().done, 1);
}

#[test]
fn new_iteration_resets_requests_and_counters() {
    let mut dispatcher = TestDispatcherBuilder::new().build();
    step(&mut dispatcher, iteration(0, &[("v1", grid_link(0, 0, 1, 0))]));
    step(
        &mut dispatcher,
        StateBuilder::at(30.0)
            .submit("r1", grid_link(1, 0, 2, 0), grid_link(3, 0, 3, 1), 1e9)
            .build(),
    );

    step(&mut dispatcher, iteration(1, &[("v1", grid_link(0, 0, 1, 0))]));
    assert_eq!(dispatcher.fleet().request_count(), 0);
    assert_eq!(dispatcher.fleet().statistics().pending, 0);
    assert_eq!(dispatcher.iteration(), Some(1));
}
