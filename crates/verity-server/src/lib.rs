//! Verity server library (gateway used by the `verity` binary and integration tests).

pub mod gateway;
