//! Ticket model and booking payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use uuid::Uuid;

use super::flight::Flight;

/// Cabin class of a booking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TravelClass {
    #[default]
    Economy,
    Business,
    First,
}

impl TravelClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            TravelClass::Economy => "Economy",
            TravelClass::Business => "Business",
            TravelClass::First => "First",
        }
    }
}

impl fmt::Display for TravelClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TravelClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Economy" => Ok(TravelClass::Economy),
            "Business" => Ok(TravelClass::Business),
            "First" => Ok(TravelClass::First),
            other => Err(format!("unknown travel class: {}", other)),
        }
    }
}

/// Ticket entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub user: Uuid,
    pub flight: Uuid,
    pub seats_booked: i32,
    pub class: TravelClass,
    pub booking_date: DateTime<Utc>,
}

/// Ticket with its flight embedded, as listed to the owner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketWithFlight {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub user: Uuid,
    pub flight: Flight,
    pub seats_booked: i32,
    pub class: TravelClass,
    pub booking_date: DateTime<Utc>,
}

/// New ticket creation payload
#[derive(Debug, Clone)]
pub struct NewTicket {
    pub user_id: Uuid,
    pub flight_id: Uuid,
    pub seats_booked: i32,
    pub class: TravelClass,
}

/// Request body for booking a flight
#[derive(Debug, Clone, Deserialize)]
pub struct BookingRequest {
    #[serde(default = "default_seats")]
    pub seats: i64,
    #[serde(default)]
    pub class: TravelClass,
}

fn default_seats() -> i64 {
    1
}
