use super::geometry::{is_same_floor, Position2D};
use crate::common::{DomainError, DomainResult};
use crate::domains::schedule::ScheduleEntry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Static site description delivered once by the platform at init.
///
/// Points are kept in a `BTreeMap` so that role lookups ("first lobby on this
/// floor") resolve the same way on every run.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SiteMap {
    #[serde(default)]
    pub height: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub resolution: f64,
    #[serde(default)]
    pub points: BTreeMap<String, Point>,
    #[serde(default)]
    pub regions: BTreeMap<String, Region>,
    #[serde(default)]
    pub paths: BTreeMap<String, Path>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Point {
    pub coord: Position2D,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub waypoint: Option<Waypoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Waypoint {
    /// Final heading in degrees.
    #[serde(default)]
    pub theta: f64,
    #[serde(default)]
    pub home: Option<HomeRole>,
    #[serde(default)]
    pub charger: bool,
    #[serde(default)]
    pub elevator: Option<ElevatorNode>,
    #[serde(default)]
    pub delivery: Option<DeliveryRole>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HomeRole {
    #[serde(default)]
    pub schedule: Option<Vec<ScheduleEntry>>,
}

/// Elevator-related waypoint. A node is a lobby, a boarding zone for a car
/// (`boarding = Some(car)`) or the inside of a car (`car = Some(car)`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElevatorNode {
    pub integration_id: String,
    #[serde(default)]
    pub car: Option<String>,
    #[serde(default)]
    pub boarding: Option<String>,
    #[serde(default)]
    pub lobby: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DeliveryRole {
    #[serde(default)]
    pub destination: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    pub geometry: Vec<Position2D>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub floor: Option<serde_json::Value>,
    #[serde(default)]
    pub gate: Option<Gate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gate {
    pub integration_id: String,
    pub terminal: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Path {
    pub geometry: Vec<Position2D>,
    #[serde(default)]
    pub name: Option<String>,
}

impl Point {
    fn elevator(&self) -> Option<&ElevatorNode> {
        self.waypoint.as_ref().and_then(|w| w.elevator.as_ref())
    }
}

impl SiteMap {
    pub fn point(&self, id: &str) -> DomainResult<&Point> {
        self.points
            .get(id)
            .ok_or_else(|| DomainError::UnknownWaypoint { id: id.to_string() })
    }

    pub fn path_geometry(&self, id: &str) -> DomainResult<&[Position2D]> {
        self.paths
            .get(id)
            .map(|p| p.geometry.as_slice())
            .ok_or_else(|| DomainError::UnknownPath { id: id.to_string() })
    }

    pub fn region(&self, id: &str) -> Option<&Region> {
        self.regions.get(id)
    }

    /// Disinfection schedule configured on a home point. Empty when the point
    /// is unknown or carries no schedule.
    pub fn home_schedule(&self, home_id: &str) -> &[ScheduleEntry] {
        self.points
            .get(home_id)
            .and_then(|p| p.waypoint.as_ref())
            .and_then(|w| w.home.as_ref())
            .and_then(|h| h.schedule.as_deref())
            .unwrap_or(&[])
    }

    /// First elevator lobby inside the given floor bound box.
    pub fn elevator_lobby(&self, bound_box: &[Position2D]) -> Option<(&str, &ElevatorNode)> {
        self.points.iter().find_map(|(id, point)| {
            let node = point.elevator()?;
            (node.lobby && is_same_floor(point.coord, bound_box)).then_some((id.as_str(), node))
        })
    }

    /// Boarding (or alighting) zone in front of `car` on the given floor.
    pub fn boarding_zone(
        &self,
        integration_id: &str,
        car: &str,
        bound_box: &[Position2D],
    ) -> Option<&str> {
        self.find_elevator_node(bound_box, |node| {
            node.integration_id == integration_id && node.boarding.as_deref() == Some(car)
        })
    }

    /// Waypoint inside `car` as seen from the given floor.
    pub fn car_interior(
        &self,
        integration_id: &str,
        car: &str,
        bound_box: &[Position2D],
    ) -> Option<&str> {
        self.find_elevator_node(bound_box, |node| {
            node.integration_id == integration_id && node.car.as_deref() == Some(car)
        })
    }

    fn find_elevator_node(
        &self,
        bound_box: &[Position2D],
        matches: impl Fn(&ElevatorNode) -> bool,
    ) -> Option<&str> {
        self.points
            .iter()
            .find(|(_, point)| {
                point.elevator().is_some_and(&matches) && is_same_floor(point.coord, bound_box)
            })
            .map(|(id, _)| id.as_str())
    }
}
