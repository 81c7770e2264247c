//! Wire schema for the dispatcher session.
//!
//! Every message is a JSON object tagged by `"@message"`. Inbound and outbound
//! kinds are closed enums so anything the dispatcher does not understand is
//! rejected when decoding, before it reaches the fleet state.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::fleet::VehicleStatus;
use crate::ids::{LinkId, RequestId, VehicleId};

/// Messages sent by the simulator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "@message", rename_all = "snake_case")]
pub enum InboundMessage {
    Initialization,
    Iteration(IterationMessage),
    State(StateMessage),
    Finalization,
    TravelTimeResponse(TravelTimeResponse),
}

impl InboundMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Initialization => "initialization",
            Self::Iteration(_) => "iteration",
            Self::State(_) => "state",
            Self::Finalization => "finalization",
            Self::TravelTimeResponse(_) => "travel_time_response",
        }
    }
}

/// Messages sent by the dispatcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "@message", rename_all = "snake_case")]
pub enum OutboundMessage {
    Initialization,
    Assignment(Assignment),
    TravelTimeQuery(TravelTimeQuery),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterVehicle {
    pub id: VehicleId,
    pub start_link: LinkId,
    #[serde(default)]
    pub capacity: u32,
}

/// Start of a simulation iteration with the full fleet roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationMessage {
    #[serde(default)]
    pub iteration: u32,
    pub vehicles: Vec<RosterVehicle>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedRequest {
    pub id: RequestId,
    pub origin_link: LinkId,
    pub destination_link: LinkId,
    #[serde(default, with = "lenient_f64")]
    pub earliest_pickup_time: f64,
    #[serde(default = "positive_infinity", with = "lenient_f64")]
    pub latest_pickup_time: f64,
    #[serde(default = "positive_infinity", with = "lenient_f64")]
    pub latest_arrival_time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleSnapshot {
    pub id: VehicleId,
    pub current_link: LinkId,
    #[serde(default = "negative_infinity", with = "lenient_f64")]
    pub current_exit_time: f64,
    #[serde(default)]
    pub diverge_link: Option<LinkId>,
    #[serde(default = "negative_infinity", with = "lenient_f64")]
    pub diverge_time: f64,
    pub state: VehicleStatus,
}

/// Incremental update for one simulation step.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateMessage {
    pub time: f64,
    #[serde(default)]
    pub submitted: Vec<SubmittedRequest>,
    #[serde(default)]
    pub picked_up: BTreeMap<RequestId, VehicleId>,
    #[serde(default)]
    pub dropped_off: BTreeMap<RequestId, VehicleId>,
    #[serde(default)]
    pub vehicles: Vec<VehicleSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TravelTimeResponse {
    #[serde(default)]
    pub travel_times: BTreeMap<LinkId, f64>,
}

/// Side-channel request for live link travel times; empty `links` means all.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TravelTimeQuery {
    #[serde(default)]
    pub links: Vec<LinkId>,
}

/// One scheduled stop. A stop without `route` is routed by the simulator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stop {
    pub link: LinkId,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pickup: Vec<RequestId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dropoff: Vec<RequestId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<Vec<LinkId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_duration: Option<f64>,
}

impl Stop {
    pub fn pickup(link: LinkId, request: RequestId, stop_duration: f64) -> Self {
        Self {
            link,
            pickup: vec![request],
            dropoff: Vec::new(),
            route: None,
            stop_duration: Some(stop_duration),
        }
    }

    pub fn dropoff(link: LinkId, request: RequestId, stop_duration: f64) -> Self {
        Self {
            link,
            pickup: Vec::new(),
            dropoff: vec![request],
            route: None,
            stop_duration: Some(stop_duration),
        }
    }

    /// Wait at `link` without serving anyone.
    pub fn hold(link: LinkId, stop_duration: f64) -> Self {
        Self {
            link,
            pickup: Vec::new(),
            dropoff: Vec::new(),
            route: None,
            stop_duration: Some(stop_duration),
        }
    }

    /// Drive to `link` along an explicit route.
    pub fn routed(link: LinkId, route: Vec<LinkId>) -> Self {
        Self {
            link,
            pickup: Vec::new(),
            dropoff: Vec::new(),
            route: Some(route),
            stop_duration: None,
        }
    }
}

/// Pickup at the origin followed by dropoff at the destination.
pub fn trip_stops(
    request: &RequestId,
    origin: &LinkId,
    destination: &LinkId,
    stop_duration: f64,
) -> Vec<Stop> {
    vec![
        Stop::pickup(origin.clone(), request.clone(), stop_duration),
        Stop::dropoff(destination.clone(), request.clone(), stop_duration),
    ]
}

/// Reply to one simulator message.
///
/// A vehicle absent from `stops` keeps its schedule; a vehicle mapped to an
/// empty list has its schedule cleared.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Assignment {
    #[serde(default)]
    pub stops: BTreeMap<VehicleId, Vec<Stop>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rejections: Vec<RequestId>,
}

impl Assignment {
    pub fn set_stops(&mut self, vehicle: VehicleId, stops: Vec<Stop>) {
        self.stops.insert(vehicle, stops);
    }

    pub fn clear_schedule(&mut self, vehicle: VehicleId) {
        self.stops.insert(vehicle, Vec::new());
    }

    pub fn reject(&mut self, request: RequestId) {
        self.rejections.push(request);
    }

    pub fn stops_for(&self, vehicle: &VehicleId) -> Option<&[Stop]> {
        self.stops.get(vehicle).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty() && self.rejections.is_empty()
    }
}

fn positive_infinity() -> f64 {
    f64::INFINITY
}

fn negative_infinity() -> f64 {
    f64::NEG_INFINITY
}

/// The simulator writes non-finite doubles as the strings `"Infinity"`,
/// `"-Infinity"` and `"NaN"`; the same convention is used on the way out.
mod lenient_f64 {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(value: &f64, ser: S) -> Result<S::Ok, S::Error> {
        if value.is_nan() {
            ser.serialize_str("NaN")
        } else if value.is_infinite() && *value > 0.0 {
            ser.serialize_str("Infinity")
        } else if value.is_infinite() {
            ser.serialize_str("-Infinity")
        } else {
            ser.serialize_f64(*value)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<f64, D::Error> {
        match Raw::deserialize(de)? {
            Raw::Number(value) => Ok(value),
            Raw::Text(text) => match text.as_str() {
                "Infinity" => Ok(f64::INFINITY),
                "-Infinity" => Ok(f64::NEG_INFINITY),
                "NaN" => Ok(f64::NAN),
                other => Err(D::Error::custom(format!("expected a number, got `{other}`"))),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_state_message_from_simulator_json() {
        let raw = r#"{
            "@message": "state",
            "time": 60.0,
            "submitted": [{
                "id": "r1", "originLink": "l1", "destinationLink": "l2",
                "earliestPickupTime": 55.0, "latestPickupTime": 655.0,
                "latestArrivalTime": "Infinity", "size": 1
            }],
            "pickedUp": {"r0": "v1"},
            "droppedOff": {},
            "vehicles": [{
                "id": "v1", "currentLink": "l1", "currentExitTime": "Infinity",
                "divergeLink": null, "divergeTime": "-Infinity", "state": "stay"
            }]
        }"#;

        let message: InboundMessage = serde_json::from_str(raw).expect("decode");
        let InboundMessage::State(state) = message else {
            panic!("expected state message");
        };
        assert_eq!(state.time, 60.0);
        assert_eq!(state.submitted[0].latest_pickup_time, 655.0);
        assert!(state.submitted[0].latest_arrival_time.is_infinite());
        assert_eq!(
            state.picked_up.get(&RequestId::from("r0")),
            Some(&VehicleId::from("v1"))
        );
        assert_eq!(state.vehicles[0].diverge_link, None);
        assert_eq!(state.vehicles[0].state, VehicleStatus::Stay);
    }

    #[test]
    fn decodes_unit_messages() {
        let init: InboundMessage =
            serde_json::from_str(r#"{"@message":"initialization"}"#).expect("init");
        assert_eq!(init, InboundMessage::Initialization);
        let fin: InboundMessage =
            serde_json::from_str(r#"{"@message":"finalization"}"#).expect("fin");
        assert_eq!(fin.kind(), "finalization");
    }

    #[test]
    fn rejects_unknown_message_kind() {
        let result: Result<InboundMessage, _> =
            serde_json::from_str(r#"{"@message":"teleport","vehicles":[]}"#);
        assert!(result.is_err());
    }

    #[test]
    fn assignment_omits_absent_optional_fields() {
        let mut assignment = Assignment::default();
        assignment.set_stops(
            VehicleId::from("v1"),
            trip_stops(
                &RequestId::from("r1"),
                &LinkId::from("l1"),
                &LinkId::from("l2"),
                30.0,
            ),
        );
        assignment.clear_schedule(VehicleId::from("v2"));

        let json = serde_json::to_value(OutboundMessage::Assignment(assignment)).expect("encode");
        assert_eq!(json["@message"], "assignment");
        let pickup = &json["stops"]["v1"][0];
        assert_eq!(pickup["link"], "l1");
        assert_eq!(pickup["pickup"][0], "r1");
        assert_eq!(pickup["stopDuration"], 30.0);
        assert!(pickup.get("route").is_none());
        assert!(pickup.get("dropoff").is_none());
        assert_eq!(json["stops"]["v2"], serde_json::json!([]));
        assert!(json.get("rejections").is_none());
    }

    #[test]
    fn travel_time_query_encodes_with_empty_link_list() {
        let json = serde_json::to_string(&OutboundMessage::TravelTimeQuery(
            TravelTimeQuery::default(),
        ))
        .expect("encode");
        assert_eq!(json, r#"{"@message":"travel_time_query","links":[]}"#);
    }
}
