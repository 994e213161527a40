//! Flight catalog: public lookups and admin-only creation

use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    models::{CreateFlightRequest, Flight},
    repositories::{FLIGHTS_NUMBER_KEY, FlightStore},
    validation::validate_new_flight,
};

/// Parse a flight id from a path segment
pub fn parse_flight_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::InvalidId)
}

#[derive(Clone)]
pub struct FlightCatalog {
    flights: Arc<dyn FlightStore>,
}

impl FlightCatalog {
    pub fn new(flights: Arc<dyn FlightStore>) -> Self {
        Self { flights }
    }

    /// Flights whose origin contains `from` and destination contains `to`,
    /// ignoring case
    pub async fn search_flights(&self, from: &str, to: &str) -> ApiResult<Vec<Flight>> {
        let (from, to) = (from.trim(), to.trim());
        if from.is_empty() || to.is_empty() {
            return Err(ApiError::Validation(
                "Both origin and destination are required".to_string(),
            ));
        }

        let flights = self.flights.search(from, to).await?;
        if flights.is_empty() {
            return Err(ApiError::NoFlightsFound);
        }

        Ok(flights)
    }

    pub async fn get_flight(&self, raw_id: &str) -> ApiResult<Flight> {
        let id = parse_flight_id(raw_id)?;

        self.flights
            .find_by_id(id)
            .await?
            .ok_or(ApiError::NotFound("Flight not found"))
    }

    /// Store a new flight; the caller must already be authorized as admin
    pub async fn create_flight(&self, req: CreateFlightRequest) -> ApiResult<Flight> {
        let new_flight = validate_new_flight(req).map_err(ApiError::Validation)?;

        let flight = self.flights.create(&new_flight).await.map_err(|e| {
            if e.violates(FLIGHTS_NUMBER_KEY) {
                warn!("Flight number {} already exists", new_flight.flight_number);
                ApiError::DuplicateFlightNumber
            } else {
                e.into()
            }
        })?;

        info!("Flight {} ({}) created", flight.flight_number, flight.id);
        Ok(flight)
    }
}
