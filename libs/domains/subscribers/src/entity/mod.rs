//! Sea-ORM entities for the `subscribers` and `delivery_logs` tables.

pub mod delivery_log;
pub mod subscriber;
