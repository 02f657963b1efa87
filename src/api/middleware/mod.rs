//! API middleware stack.
//!
//! A single layer: API key validation on every protected route.
//! `/health` stays outside it so load balancers can probe freely.

pub mod auth;
