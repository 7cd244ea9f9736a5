//! # Route Modules
//!
//! | Prefix                  | Module            |
//! |-------------------------|-------------------|
//! | `/v1/rides`             | [`rides`]         |
//! | `/v1/rides/:id/{op}`    | [`rides`]         |

pub mod rides;
