//! # bookplay-gateway
//!
//! REST API and realtime gateway for the Book&Play futsal booking
//! marketplace.
//!
//! The gateway reads marketplace rows (users, venues, bookings, disputes,
//! messages, notifications) through a backend query interface, turns them
//! into admin analytics and monitoring views, and pushes row changes and
//! unread counters to WebSocket clients. All aggregation is pure and
//! synchronous; only the service layer touches the backend.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket)
//!     │
//!     ├── REST Handlers (api/)
//!     ├── WS Handler + UnreadWatcher (realtime/)
//!     │
//!     ├── Analytics / Dispute / VenueMonitor / Notification services (service/)
//!     │       ├── aggregate() (analytics/)
//!     │       └── dispute + venue classification (monitoring/)
//!     │
//!     ├── ChangeFeed (domain/)
//!     │
//!     └── Backend (backend/): in-memory or PostgreSQL
//! ```

pub mod analytics;
pub mod api;
pub mod app_state;
pub mod backend;
pub mod config;
pub mod domain;
pub mod error;
pub mod monitoring;
pub mod realtime;
pub mod service;
