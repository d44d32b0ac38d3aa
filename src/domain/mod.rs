//! Catalog domain: value objects, aggregates, sync events and services.
pub mod aggregates;
pub mod events;
pub mod services;
pub mod value_objects;
