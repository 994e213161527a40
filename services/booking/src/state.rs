//! Application state shared across handlers

use sqlx::PgPool;
use std::sync::Arc;

use crate::{
    booking::BookingEngine,
    catalog::FlightCatalog,
    config::AuthConfig,
    jwt::JwtService,
    repositories::{
        FlightRepository, FlightStore, TicketRepository, TicketStore, UserRepository, UserStore,
    },
    session::SessionManager,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionManager,
    pub catalog: FlightCatalog,
    pub bookings: BookingEngine,
}

impl AppState {
    /// Wire the services over the given stores
    pub fn new(
        users: Arc<dyn UserStore>,
        flights: Arc<dyn FlightStore>,
        tickets: Arc<dyn TicketStore>,
        auth: &AuthConfig,
    ) -> Self {
        Self {
            sessions: SessionManager::new(
                users,
                JwtService::from_config(auth),
                auth.cookie_name.clone(),
                auth.cookie_secure,
            ),
            catalog: FlightCatalog::new(flights.clone()),
            bookings: BookingEngine::new(flights, tickets),
        }
    }

    /// State backed by the PostgreSQL repositories
    pub fn with_pool(pool: PgPool, auth: &AuthConfig) -> Self {
        Self::new(
            Arc::new(UserRepository::new(pool.clone())),
            Arc::new(FlightRepository::new(pool.clone())),
            Arc::new(TicketRepository::new(pool)),
            auth,
        )
    }
}
