//! In-memory store used by the unit tests
//!
//! Mirrors the constraints of the PostgreSQL schema: unique email, unique
//! flight number, one ticket per user and flight, guarded seat decrement.

use async_trait::async_trait;
use chrono::Utc;
use common::error::{DatabaseError, DatabaseResult};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{
    FLIGHTS_NUMBER_KEY, FlightStore, TICKETS_USER_FLIGHT_KEY, TicketStore, USERS_EMAIL_KEY,
    UserStore,
};
use crate::models::{Flight, NewFlight, NewTicket, NewUser, Ticket, TicketWithFlight, User};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    flights: Vec<Flight>,
    tickets: Vec<Ticket>,
}

/// Shared in-memory tables implementing every store trait
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove a user, leaving any tokens issued to it dangling
    pub async fn remove_user(&self, id: Uuid) {
        self.tables.lock().await.users.remove(&id);
    }

    pub async fn user(&self, id: Uuid) -> Option<User> {
        self.tables.lock().await.users.get(&id).cloned()
    }

    pub async fn ticket_count(&self) -> usize {
        self.tables.lock().await.tickets.len()
    }
}

fn violation(constraint: &str) -> DatabaseError {
    DatabaseError::UniqueViolation {
        constraint: constraint.to_string(),
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create(&self, new_user: &NewUser) -> DatabaseResult<User> {
        let mut tables = self.tables.lock().await;
        if tables.users.values().any(|u| u.email == new_user.email) {
            return Err(violation(USERS_EMAIL_KEY));
        }

        let user = User {
            id: Uuid::new_v4(),
            name: new_user.name.clone(),
            email: new_user.email.clone(),
            password_hash: new_user.password_hash.clone(),
            role: new_user.role,
            ticket_ids: Vec::new(),
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> DatabaseResult<Option<User>> {
        let tables = self.tables.lock().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<User>> {
        Ok(self.tables.lock().await.users.get(&id).cloned())
    }
}

#[async_trait]
impl FlightStore for MemoryStore {
    async fn create(&self, new_flight: &NewFlight) -> DatabaseResult<Flight> {
        let mut tables = self.tables.lock().await;
        if tables
            .flights
            .iter()
            .any(|f| f.flight_number == new_flight.flight_number)
        {
            return Err(violation(FLIGHTS_NUMBER_KEY));
        }

        let flight = Flight {
            id: Uuid::new_v4(),
            flight_number: new_flight.flight_number.clone(),
            airline: new_flight.airline.clone(),
            origin: new_flight.origin.clone(),
            destination: new_flight.destination.clone(),
            departure_time: new_flight.departure_time.clone(),
            arrival_time: new_flight.arrival_time.clone(),
            duration: new_flight.duration.clone(),
            seats_available: new_flight.seats_available,
            total_seats: new_flight.total_seats,
            price: new_flight.price,
            status: new_flight.status,
        };
        tables.flights.push(flight.clone());
        Ok(flight)
    }

    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<Flight>> {
        let tables = self.tables.lock().await;
        Ok(tables.flights.iter().find(|f| f.id == id).cloned())
    }

    async fn search(&self, from: &str, to: &str) -> DatabaseResult<Vec<Flight>> {
        let from = from.to_lowercase();
        let to = to.to_lowercase();
        let tables = self.tables.lock().await;
        Ok(tables
            .flights
            .iter()
            .filter(|f| {
                f.origin.to_lowercase().contains(&from) && f.destination.to_lowercase().contains(&to)
            })
            .cloned()
            .collect())
    }
}

#[async_trait]
impl TicketStore for MemoryStore {
    async fn find_for_user_and_flight(
        &self,
        user_id: Uuid,
        flight_id: Uuid,
    ) -> DatabaseResult<Option<Ticket>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .tickets
            .iter()
            .find(|t| t.user == user_id && t.flight == flight_id)
            .cloned())
    }

    async fn create_booking(&self, new_ticket: &NewTicket) -> DatabaseResult<Option<Ticket>> {
        let mut tables = self.tables.lock().await;

        if tables
            .tickets
            .iter()
            .any(|t| t.user == new_ticket.user_id && t.flight == new_ticket.flight_id)
        {
            return Err(violation(TICKETS_USER_FLIGHT_KEY));
        }

        let Some(flight) = tables
            .flights
            .iter_mut()
            .find(|f| f.id == new_ticket.flight_id)
        else {
            return Ok(None);
        };
        if flight.seats_available < new_ticket.seats_booked {
            return Ok(None);
        }
        flight.seats_available -= new_ticket.seats_booked;

        let ticket = Ticket {
            id: Uuid::new_v4(),
            user: new_ticket.user_id,
            flight: new_ticket.flight_id,
            seats_booked: new_ticket.seats_booked,
            class: new_ticket.class,
            booking_date: Utc::now(),
        };
        if let Some(user) = tables.users.get_mut(&new_ticket.user_id) {
            user.ticket_ids.push(ticket.id);
        }
        tables.tickets.push(ticket.clone());
        Ok(Some(ticket))
    }

    async fn list_for_user(&self, user_id: Uuid) -> DatabaseResult<Vec<TicketWithFlight>> {
        let tables = self.tables.lock().await;
        let mut listed: Vec<TicketWithFlight> = tables
            .tickets
            .iter()
            .filter(|t| t.user == user_id)
            .filter_map(|t| {
                let flight = tables.flights.iter().find(|f| f.id == t.flight)?;
                Some(TicketWithFlight {
                    id: t.id,
                    user: t.user,
                    flight: flight.clone(),
                    seats_booked: t.seats_booked,
                    class: t.class,
                    booking_date: t.booking_date,
                })
            })
            .collect();
        listed.sort_by(|a, b| b.booking_date.cmp(&a.booking_date));
        Ok(listed)
    }
}
