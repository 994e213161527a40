//! Booking service models

pub mod flight;
pub mod ticket;
pub mod user;

// Re-export for convenience
pub use flight::{CreateFlightRequest, Flight, NewFlight};
pub use ticket::{BookingRequest, NewTicket, Ticket, TicketWithFlight, TravelClass};
pub use user::{LoginRequest, NewUser, Role, RoleResponse, SignupRequest, User};
