//! Repositories for database operations
//!
//! Each collection is reached through a store trait so the services can be
//! exercised against the in-memory store in tests. The PostgreSQL
//! repositories are the production implementations.

use async_trait::async_trait;
use common::error::DatabaseResult;
use uuid::Uuid;

use crate::models::{Flight, NewFlight, NewTicket, NewUser, Ticket, TicketWithFlight, User};

pub mod flight;
pub mod ticket;
pub mod user;

#[cfg(test)]
pub mod memory;

pub use flight::FlightRepository;
pub use ticket::TicketRepository;
pub use user::UserRepository;

/// Unique key on the normalised user email
pub const USERS_EMAIL_KEY: &str = "users_email_key";
/// Unique key on the flight number
pub const FLIGHTS_NUMBER_KEY: &str = "flights_flight_number_key";
/// Unique key enforcing one ticket per user and flight
pub const TICKETS_USER_FLIGHT_KEY: &str = "tickets_user_flight_key";

/// Access to the users collection
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user; a taken email fails with a violation of [`USERS_EMAIL_KEY`]
    async fn create(&self, new_user: &NewUser) -> DatabaseResult<User>;

    /// Find a user by normalised email
    async fn find_by_email(&self, email: &str) -> DatabaseResult<Option<User>>;

    /// Find a user by ID
    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<User>>;
}

/// Access to the flights collection
#[async_trait]
pub trait FlightStore: Send + Sync {
    /// Insert a flight; a taken number fails with a violation of [`FLIGHTS_NUMBER_KEY`]
    async fn create(&self, new_flight: &NewFlight) -> DatabaseResult<Flight>;

    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<Flight>>;

    /// Flights whose origin and destination contain the given text, ignoring case
    async fn search(&self, from: &str, to: &str) -> DatabaseResult<Vec<Flight>>;
}

/// Access to the tickets collection
#[async_trait]
pub trait TicketStore: Send + Sync {
    async fn find_for_user_and_flight(
        &self,
        user_id: Uuid,
        flight_id: Uuid,
    ) -> DatabaseResult<Option<Ticket>>;

    /// Atomically store the ticket, take the seats from the flight and link the
    /// ticket to its owner.
    ///
    /// Returns `Ok(None)` when the flight no longer has enough seats. A second
    /// ticket for the same user and flight fails with a violation of
    /// [`TICKETS_USER_FLIGHT_KEY`]. Nothing is written in either case.
    async fn create_booking(&self, new_ticket: &NewTicket) -> DatabaseResult<Option<Ticket>>;

    /// All tickets of a user with their flights, newest first
    async fn list_for_user(&self, user_id: Uuid) -> DatabaseResult<Vec<TicketWithFlight>>;
}
