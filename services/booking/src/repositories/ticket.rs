//! Ticket repository for database operations

use async_trait::async_trait;
use common::error::{DatabaseError, DatabaseResult};
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::{info, warn};
use uuid::Uuid;

use super::{TicketStore, flight::flight_from_row};
use crate::models::{NewTicket, Ticket, TicketWithFlight, TravelClass};

/// Ticket repository
#[derive(Clone)]
pub struct TicketRepository {
    pool: PgPool,
}

impl TicketRepository {
    /// Create a new ticket repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn class_from_row(row: &PgRow) -> DatabaseResult<TravelClass> {
    let class: String = row.try_get("class")?;
    class.parse().map_err(DatabaseError::Decode)
}

fn ticket_from_row(row: &PgRow) -> DatabaseResult<Ticket> {
    Ok(Ticket {
        id: row.try_get("id")?,
        user: row.try_get("user_id")?,
        flight: row.try_get("flight_id")?,
        seats_booked: row.try_get("seats_booked")?,
        class: class_from_row(row)?,
        booking_date: row.try_get("booking_date")?,
    })
}

#[async_trait]
impl TicketStore for TicketRepository {
    async fn find_for_user_and_flight(
        &self,
        user_id: Uuid,
        flight_id: Uuid,
    ) -> DatabaseResult<Option<Ticket>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, flight_id, seats_booked, class, booking_date
            FROM tickets
            WHERE user_id = $1 AND flight_id = $2
            "#,
        )
        .bind(user_id)
        .bind(flight_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(ticket_from_row).transpose()
    }

    async fn create_booking(&self, new_ticket: &NewTicket) -> DatabaseResult<Option<Ticket>> {
        let mut tx = self.pool.begin().await?;

        // The unique key on (user_id, flight_id) rejects a racing duplicate here.
        let row = sqlx::query(
            r#"
            INSERT INTO tickets (id, user_id, flight_id, seats_booked, class)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, flight_id, seats_booked, class, booking_date
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new_ticket.user_id)
        .bind(new_ticket.flight_id)
        .bind(new_ticket.seats_booked)
        .bind(new_ticket.class.as_str())
        .fetch_one(&mut *tx)
        .await?;

        let ticket = ticket_from_row(&row)?;

        let taken = sqlx::query(
            r#"
            UPDATE flights
            SET seats_available = seats_available - $1
            WHERE id = $2 AND seats_available >= $1
            "#,
        )
        .bind(new_ticket.seats_booked)
        .bind(new_ticket.flight_id)
        .execute(&mut *tx)
        .await?;

        if taken.rows_affected() == 0 {
            warn!(
                "Flight {} cannot seat {} more passengers",
                new_ticket.flight_id, new_ticket.seats_booked
            );
            tx.rollback().await?;
            return Ok(None);
        }

        sqlx::query(
            r#"
            UPDATE users
            SET ticket_ids = array_append(ticket_ids, $1), updated_at = NOW()
            WHERE id = $2
            "#,
        )
        .bind(ticket.id)
        .bind(new_ticket.user_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!("Stored ticket {} for user {}", ticket.id, ticket.user);
        Ok(Some(ticket))
    }

    async fn list_for_user(&self, user_id: Uuid) -> DatabaseResult<Vec<TicketWithFlight>> {
        let rows = sqlx::query(
            r#"
            SELECT t.id, t.user_id, t.seats_booked, t.class, t.booking_date,
                   f.id AS f_id, f.flight_number AS f_flight_number, f.airline AS f_airline,
                   f.origin AS f_origin, f.destination AS f_destination,
                   f.departure_time AS f_departure_time, f.arrival_time AS f_arrival_time,
                   f.duration AS f_duration, f.seats_available AS f_seats_available,
                   f.total_seats AS f_total_seats, f.price AS f_price, f.status AS f_status
            FROM tickets t
            JOIN flights f ON f.id = t.flight_id
            WHERE t.user_id = $1
            ORDER BY t.booking_date DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> DatabaseResult<TicketWithFlight> {
                Ok(TicketWithFlight {
                    id: row.try_get("id")?,
                    user: row.try_get("user_id")?,
                    flight: flight_from_row(row, "f_")?,
                    seats_booked: row.try_get("seats_booked")?,
                    class: class_from_row(row)?,
                    booking_date: row.try_get("booking_date")?,
                })
            })
            .collect()
    }
}
