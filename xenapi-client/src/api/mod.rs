//! Bindings for the classes this client knows about.
//!
//! Each class module declares its record and enum types and exposes one async
//! function per remote message. The session handle is passed implicitly as
//! the first wire parameter by [`Session`](crate::Session).

pub mod host;
pub mod session;
pub mod task;
pub mod vm;
