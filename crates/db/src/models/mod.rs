//! Row models for the Dentiq schema.

pub mod clinical;
pub mod communication;
