//! Scheduling core for a small-business booking platform.
//!
//! Customers reserve timed service slots on a single shared calendar; staff
//! manage a catalog of products and services and move reservations through
//! their lifecycle. The crate owns the hard part (computing available slots
//! from day-of-week operating hours and rejecting double-bookings even under
//! concurrent create attempts) and exposes seams ([`catalog::Catalog`],
//! [`store::ReservationStore`], [`notify::Notifier`], [`clock::Clock`]) for
//! everything it treats as a collaborator.

pub mod catalog;
pub mod clock;
pub mod engine;
pub mod limits;
pub mod model;
pub mod notify;
pub mod observability;
pub mod policy;
pub mod store;
pub mod wal;
