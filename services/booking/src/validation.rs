//! Input validation utilities

use regex::Regex;
use std::sync::OnceLock;

use crate::models::{CreateFlightRequest, NewFlight};

/// Canonical form of an email address, used for storage and lookup
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validate display name
pub fn validate_name(name: &str) -> Result<(), String> {
    let name = name.trim();
    if name.is_empty() {
        return Err("Name is required".to_string());
    }

    if name.chars().count() < 3 {
        return Err("Name must be at least 3 characters long".to_string());
    }

    if name.chars().count() > 64 {
        return Err("Name must be at most 64 characters long".to_string());
    }

    Ok(())
}

/// Validate email
pub fn validate_email(email: &str) -> Result<(), String> {
    let email = email.trim();
    if email.is_empty() {
        return Err("Email is required".to_string());
    }

    if email.len() > 254 {
        return Err("Email must be at most 254 characters long".to_string());
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"(?i)^[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}

/// Validate password
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password is required".to_string());
    }

    if password.chars().count() < 6 {
        return Err("Password must be at least 6 characters long".to_string());
    }

    if password.len() > 128 {
        return Err("Password must be at most 128 characters long".to_string());
    }

    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("Password must contain at least one digit".to_string());
    }

    if !password.chars().any(|c| !c.is_alphanumeric() && !c.is_whitespace()) {
        return Err("Password must contain at least one special character".to_string());
    }

    Ok(())
}

/// Validate a requested seat count and narrow it to the stored width
pub fn validate_seats(seats: i64) -> Result<i32, String> {
    if seats < 1 {
        return Err("At least one seat must be booked".to_string());
    }

    i32::try_from(seats).map_err(|_| "Too many seats requested".to_string())
}

fn required(field: &str, value: Option<String>) -> Result<String, String> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(format!("{} is required", field)),
    }
}

fn seat_count(field: &str, value: f64) -> Result<i32, String> {
    if value.fract() != 0.0 || value < 0.0 || value > i32::MAX as f64 {
        return Err(format!("{} must be a non-negative whole number", field));
    }
    Ok(value as i32)
}

/// Validate the admin flight form and build the record to store
pub fn validate_new_flight(req: CreateFlightRequest) -> Result<NewFlight, String> {
    let flight_number = required("flightNumber", req.flight_number)?;
    let airline = required("airline", req.airline)?;
    let origin = required("from", req.from)?;
    let destination = required("to", req.to)?;
    let departure_time = required("departureTime", req.departure_time)?;
    let arrival_time = required("arrivalTime", req.arrival_time)?;
    let duration = required("duration", req.duration)?;

    let total_seats = seat_count(
        "totalSeats",
        req.total_seats.ok_or("totalSeats is required")?,
    )?;
    let seats_available = match req.seats_available {
        Some(value) => seat_count("seatsAvailable", value)?,
        None => total_seats,
    };
    if seats_available > total_seats {
        return Err("seatsAvailable cannot exceed totalSeats".to_string());
    }

    let price = req.price.ok_or("price is required")?;
    if !price.is_finite() || price < 0.0 {
        return Err("price must be a non-negative number".to_string());
    }

    if origin.eq_ignore_ascii_case(&destination) {
        return Err("from and to must differ".to_string());
    }

    Ok(NewFlight {
        flight_number,
        airline,
        origin,
        destination,
        departure_time,
        arrival_time,
        duration,
        seats_available,
        total_seats,
        price,
        status: req.status.unwrap_or_default(),
    })
}
