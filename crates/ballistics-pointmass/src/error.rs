//! Re-exports the shared error taxonomy as this crate's public `Error`.

pub use ballistics_core::BallisticError as Error;
pub use ballistics_core::Result;
