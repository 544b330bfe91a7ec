//! Reading spatial systems from disk and writing optimization results.
//!
//! Input documents are TOML ([`input`]), sphere geometry may live in separate
//! whitespace-separated `x y z radius` files ([`xyzr`]), and results are written as TOML
//! reports or CSV design-vector logs ([`report`]).

pub mod input;
pub mod report;
pub mod xyzr;
