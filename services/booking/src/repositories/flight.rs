//! Flight repository for database operations

use async_trait::async_trait;
use common::error::{DatabaseError, DatabaseResult};
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::info;
use uuid::Uuid;

use super::FlightStore;
use crate::models::{Flight, NewFlight};

/// Flight repository
#[derive(Clone)]
pub struct FlightRepository {
    pool: PgPool,
}

impl FlightRepository {
    /// Create a new flight repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Map a flight row; `prefix` selects aliased columns from a join.
pub(crate) fn flight_from_row(row: &PgRow, prefix: &str) -> DatabaseResult<Flight> {
    let col = |name: &str| format!("{}{}", prefix, name);
    let status: String = row.try_get(col("status").as_str())?;

    Ok(Flight {
        id: row.try_get(col("id").as_str())?,
        flight_number: row.try_get(col("flight_number").as_str())?,
        airline: row.try_get(col("airline").as_str())?,
        origin: row.try_get(col("origin").as_str())?,
        destination: row.try_get(col("destination").as_str())?,
        departure_time: row.try_get(col("departure_time").as_str())?,
        arrival_time: row.try_get(col("arrival_time").as_str())?,
        duration: row.try_get(col("duration").as_str())?,
        seats_available: row.try_get(col("seats_available").as_str())?,
        total_seats: row.try_get(col("total_seats").as_str())?,
        price: row.try_get(col("price").as_str())?,
        status: status.parse().map_err(DatabaseError::Decode)?,
    })
}

/// Escape LIKE wildcards so user input only ever matches literally
pub(crate) fn like_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[async_trait]
impl FlightStore for FlightRepository {
    async fn create(&self, new_flight: &NewFlight) -> DatabaseResult<Flight> {
        info!("Creating flight: {}", new_flight.flight_number);

        let row = sqlx::query(
            r#"
            INSERT INTO flights (
                id, flight_number, airline, origin, destination, departure_time,
                arrival_time, duration, seats_available, total_seats, price, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING id, flight_number, airline, origin, destination, departure_time,
                      arrival_time, duration, seats_available, total_seats, price, status
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new_flight.flight_number)
        .bind(&new_flight.airline)
        .bind(&new_flight.origin)
        .bind(&new_flight.destination)
        .bind(&new_flight.departure_time)
        .bind(&new_flight.arrival_time)
        .bind(&new_flight.duration)
        .bind(new_flight.seats_available)
        .bind(new_flight.total_seats)
        .bind(new_flight.price)
        .bind(new_flight.status.as_str())
        .fetch_one(&self.pool)
        .await?;

        flight_from_row(&row, "")
    }

    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<Flight>> {
        let row = sqlx::query(
            r#"
            SELECT id, flight_number, airline, origin, destination, departure_time,
                   arrival_time, duration, seats_available, total_seats, price, status
            FROM flights
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(|row| flight_from_row(row, "")).transpose()
    }

    async fn search(&self, from: &str, to: &str) -> DatabaseResult<Vec<Flight>> {
        let rows = sqlx::query(
            r#"
            SELECT id, flight_number, airline, origin, destination, departure_time,
                   arrival_time, duration, seats_available, total_seats, price, status
            FROM flights
            WHERE origin ILIKE $1 AND destination ILIKE $2
            ORDER BY created_at
            "#,
        )
        .bind(like_pattern(from))
        .bind(like_pattern(to))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(|row| flight_from_row(row, "")).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_wraps_and_escapes() {
        assert_eq!(like_pattern("Delhi"), "%Delhi%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }
}
