//! Booking engine: turns a seat request into a durable ticket
//!
//! At most one ticket exists per (user, flight). The existence check gives
//! a fast, friendly answer; the storage unique key is what actually holds
//! the invariant when two requests race.

use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    catalog::parse_flight_id,
    error::{ApiError, ApiResult},
    models::{BookingRequest, NewTicket, Ticket, TicketWithFlight},
    repositories::{FlightStore, TICKETS_USER_FLIGHT_KEY, TicketStore},
    validation::validate_seats,
};

#[derive(Clone)]
pub struct BookingEngine {
    flights: Arc<dyn FlightStore>,
    tickets: Arc<dyn TicketStore>,
}

impl BookingEngine {
    pub fn new(flights: Arc<dyn FlightStore>, tickets: Arc<dyn TicketStore>) -> Self {
        Self { flights, tickets }
    }

    /// Book seats on a flight for an authenticated user
    pub async fn book_flight(
        &self,
        user_id: Uuid,
        raw_flight_id: &str,
        req: BookingRequest,
    ) -> ApiResult<Ticket> {
        let seats = validate_seats(req.seats).map_err(ApiError::Validation)?;
        let flight_id = parse_flight_id(raw_flight_id)?;

        let flight = self
            .flights
            .find_by_id(flight_id)
            .await?
            .ok_or(ApiError::NotFound("Flight not found"))?;

        if self
            .tickets
            .find_for_user_and_flight(user_id, flight_id)
            .await?
            .is_some()
        {
            return Err(ApiError::AlreadyBooked);
        }

        if flight.seats_available < seats {
            return Err(ApiError::InsufficientSeats {
                available: flight.seats_available,
            });
        }

        let new_ticket = NewTicket {
            user_id,
            flight_id,
            seats_booked: seats,
            class: req.class,
        };

        match self.tickets.create_booking(&new_ticket).await {
            Ok(Some(ticket)) => {
                info!(
                    "User {} booked {} {} seat(s) on {}",
                    user_id, seats, ticket.class, flight.flight_number
                );
                Ok(ticket)
            }
            Ok(None) => {
                // Seats were taken between the read above and the write.
                let available = self
                    .flights
                    .find_by_id(flight_id)
                    .await?
                    .map_or(0, |f| f.seats_available);
                Err(ApiError::InsufficientSeats { available })
            }
            Err(e) if e.violates(TICKETS_USER_FLIGHT_KEY) => {
                warn!(
                    "Concurrent duplicate booking by user {} on flight {}",
                    user_id, flight_id
                );
                Err(ApiError::AlreadyBooked)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// All tickets of a user with their flights attached
    pub async fn list_tickets(&self, user_id: Uuid) -> ApiResult<Vec<TicketWithFlight>> {
        Ok(self.tickets.list_for_user(user_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        catalog::{FlightCatalog, tests::flight_form},
        models::{Flight, NewFlight, NewUser, Role, TravelClass, flight::FlightStatus},
        repositories::{UserStore, memory::MemoryStore},
    };
    use async_trait::async_trait;
    use common::error::DatabaseResult;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tokio_test::{assert_err, assert_ok};

    /// Ticket store that yields after the existence check, so concurrent
    /// bookings all read "no ticket" before any of them writes
    struct YieldingTickets {
        inner: MemoryStore,
        writes: AtomicUsize,
    }

    #[async_trait]
    impl TicketStore for YieldingTickets {
        async fn find_for_user_and_flight(
            &self,
            user_id: Uuid,
            flight_id: Uuid,
        ) -> DatabaseResult<Option<Ticket>> {
            let found = self.inner.find_for_user_and_flight(user_id, flight_id).await;
            tokio::task::yield_now().await;
            found
        }

        async fn create_booking(&self, new_ticket: &NewTicket) -> DatabaseResult<Option<Ticket>> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.inner.create_booking(new_ticket).await
        }

        async fn list_for_user(&self, user_id: Uuid) -> DatabaseResult<Vec<TicketWithFlight>> {
            self.inner.list_for_user(user_id).await
        }
    }

    /// Flight store whose first lookup returns a snapshot taken earlier
    struct StaleFirstRead {
        inner: MemoryStore,
        snapshot: Flight,
        served: AtomicBool,
    }

    #[async_trait]
    impl FlightStore for StaleFirstRead {
        async fn create(&self, new_flight: &NewFlight) -> DatabaseResult<Flight> {
            FlightStore::create(&self.inner, new_flight).await
        }

        async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<Flight>> {
            if !self.served.swap(true, Ordering::SeqCst) && id == self.snapshot.id {
                return Ok(Some(self.snapshot.clone()));
            }
            FlightStore::find_by_id(&self.inner, id).await
        }

        async fn search(&self, from: &str, to: &str) -> DatabaseResult<Vec<Flight>> {
            self.inner.search(from, to).await
        }
    }

    async fn add_user(store: &MemoryStore, email: &str) -> Uuid {
        UserStore::create(
            store,
            &NewUser {
                name: "Ravi".to_string(),
                email: email.to_string(),
                password_hash: "hash".to_string(),
                role: Role::User,
            },
        )
        .await
        .unwrap()
        .id
    }

    struct Fixture {
        store: MemoryStore,
        engine: BookingEngine,
        user_id: Uuid,
        flight: Flight,
    }

    async fn fixture() -> Fixture {
        let store = MemoryStore::new();
        let flight = FlightCatalog::new(Arc::new(store.clone()))
            .create_flight(flight_form("AI-101", "Delhi", "Mumbai"))
            .await
            .unwrap();
        let user = UserStore::create(
            &store,
            &NewUser {
                name: "Asha".to_string(),
                email: "a@x.com".to_string(),
                password_hash: "hash".to_string(),
                role: Role::User,
            },
        )
        .await
        .unwrap();

        Fixture {
            engine: BookingEngine::new(Arc::new(store.clone()), Arc::new(store.clone())),
            store,
            user_id: user.id,
            flight,
        }
    }

    fn request(seats: i64, class: TravelClass) -> BookingRequest {
        BookingRequest { seats, class }
    }

    #[tokio::test]
    async fn test_booking_creates_ticket_and_links_user() {
        let fx = fixture().await;

        let ticket = fx
            .engine
            .book_flight(fx.user_id, &fx.flight.id.to_string(), request(2, TravelClass::Business))
            .await
            .unwrap();

        assert_eq!(ticket.user, fx.user_id);
        assert_eq!(ticket.flight, fx.flight.id);
        assert_eq!(ticket.seats_booked, 2);
        assert_eq!(ticket.class, TravelClass::Business);

        let user = fx.store.user(fx.user_id).await.unwrap();
        assert_eq!(user.ticket_ids, vec![ticket.id]);

        let flight = FlightStore::find_by_id(&fx.store, fx.flight.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(flight.seats_available, fx.flight.seats_available - 2);
    }

    #[tokio::test]
    async fn test_second_booking_is_rejected() {
        let fx = fixture().await;
        let id = fx.flight.id.to_string();

        assert_ok!(
            fx.engine
                .book_flight(fx.user_id, &id, request(1, TravelClass::Economy))
                .await
        );
        let err = assert_err!(
            fx.engine
                .book_flight(fx.user_id, &id, request(1, TravelClass::Economy))
                .await
        );
        assert!(matches!(err, ApiError::AlreadyBooked));
        assert_eq!(fx.store.ticket_count().await, 1);
    }

    #[tokio::test]
    async fn test_concurrent_duplicate_bookings_admit_one_ticket() {
        let fx = fixture().await;
        let tickets = Arc::new(YieldingTickets {
            inner: fx.store.clone(),
            writes: AtomicUsize::new(0),
        });
        let engine = BookingEngine::new(Arc::new(fx.store.clone()), tickets.clone());
        let id = fx.flight.id.to_string();

        let (a, b) = tokio::join!(
            engine.book_flight(fx.user_id, &id, request(1, TravelClass::Economy)),
            engine.book_flight(fx.user_id, &id, request(1, TravelClass::Economy)),
        );

        // Both passed the existence check; the unique key settled the race.
        assert_eq!(tickets.writes.load(Ordering::SeqCst), 2);
        assert_eq!([a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(), 1);
        assert!(matches!(a.err().or(b.err()), Some(ApiError::AlreadyBooked)));
        assert_eq!(fx.store.ticket_count().await, 1);

        let flight = FlightStore::find_by_id(&fx.store, fx.flight.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(flight.seats_available, fx.flight.seats_available - 1);
    }

    #[tokio::test]
    async fn test_seats_taken_after_read_are_not_oversold() {
        let fx = fixture().await;
        let other = add_user(&fx.store, "b@x.com").await;
        let id = fx.flight.id.to_string();

        // Someone else takes 4 of the 5 seats after our engine read the flight.
        let stale = BookingEngine::new(
            Arc::new(StaleFirstRead {
                inner: fx.store.clone(),
                snapshot: fx.flight.clone(),
                served: AtomicBool::new(false),
            }),
            Arc::new(fx.store.clone()),
        );
        assert_ok!(
            fx.engine
                .book_flight(other, &id, request(4, TravelClass::Economy))
                .await
        );

        let err = assert_err!(
            stale
                .book_flight(fx.user_id, &id, request(3, TravelClass::Economy))
                .await
        );
        assert!(matches!(err, ApiError::InsufficientSeats { available: 1 }));
        assert_eq!(fx.store.ticket_count().await, 1);
        assert!(fx.store.user(fx.user_id).await.unwrap().ticket_ids.is_empty());
    }

    #[tokio::test]
    async fn test_booking_failures() {
        let fx = fixture().await;
        let id = fx.flight.id.to_string();

        assert!(matches!(
            fx.engine
                .book_flight(fx.user_id, &Uuid::new_v4().to_string(), request(1, TravelClass::First))
                .await
                .unwrap_err(),
            ApiError::NotFound(_)
        ));
        assert!(matches!(
            fx.engine
                .book_flight(fx.user_id, "F1", request(1, TravelClass::First))
                .await
                .unwrap_err(),
            ApiError::InvalidId
        ));
        assert!(matches!(
            fx.engine
                .book_flight(fx.user_id, &id, request(0, TravelClass::First))
                .await
                .unwrap_err(),
            ApiError::Validation(_)
        ));
        assert!(matches!(
            fx.engine
                .book_flight(fx.user_id, &id, request(6, TravelClass::First))
                .await
                .unwrap_err(),
            ApiError::InsufficientSeats { available: 5 }
        ));
        assert_eq!(fx.store.ticket_count().await, 0);
    }

    #[tokio::test]
    async fn test_list_tickets_embeds_flights() {
        let fx = fixture().await;
        assert!(fx.engine.list_tickets(fx.user_id).await.unwrap().is_empty());

        fx.engine
            .book_flight(fx.user_id, &fx.flight.id.to_string(), request(1, TravelClass::Economy))
            .await
            .unwrap();

        let tickets = fx.engine.list_tickets(fx.user_id).await.unwrap();
        assert_eq!(tickets.len(), 1);
        assert_eq!(tickets[0].flight.flight_number, "AI-101");
        assert_eq!(tickets[0].flight.status, FlightStatus::OnTime);
        assert!(fx.engine.list_tickets(Uuid::new_v4()).await.unwrap().is_empty());
    }
}
