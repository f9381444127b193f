pub mod crew;
pub mod reservation;
