//! SeaORM entity definitions for PostgreSQL database.

pub mod waste_record;
