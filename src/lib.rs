//! # Chat Realtime
//!
//! Realtime layer of a chat application:
//! - presence registry with last-write-wins connection ownership
//! - chat rooms for typing indicators
//! - direct message and receipt delivery
//! - stateless 1:1 call signaling relay
//! - a client-side session controller driving the call lifecycle
//!
//! ## Architecture
//!
//! - **Domain Layer**: identifiers, entities and wire events
//! - **Application Layer**: registry, rooms, router, signaling, client session
//! - **Infrastructure Layer**: metrics and the external message API client
//! - **Presentation Layer**: HTTP routes and WebSocket gateway
//!
//! ## Module Structure
//!
//! ```text
//! chat_realtime/
//! +-- config/         Configuration management
//! +-- domain/         Entities, value objects and events
//! +-- application/    Routing services and the client session
//! +-- infrastructure/ Metrics and HTTP call-log repository
//! +-- presentation/   HTTP routes and WebSocket handlers
//! +-- shared/         Error types
//! ```

// Configuration module
pub mod config;

// Domain layer - Core types
pub mod domain;

// Application layer - Routing and session services
pub mod application;

// Infrastructure layer - External implementations
pub mod infrastructure;

// Presentation layer - HTTP and WebSocket handlers
pub mod presentation;

// Shared utilities
pub mod shared;

// Application startup and state management
pub mod startup;

// Telemetry and observability
pub mod telemetry;
