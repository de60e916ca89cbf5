//! Host-independent value types: radial slots, node references, errors.

pub mod errors;
pub mod layout;
pub mod model;
