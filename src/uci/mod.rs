//! # Universal Chess Interface
//! The client side of the protocol: commands sent to an external engine and the
//! messages it answers with.
//!
//! More details about the protocol can be found at
//! <https://backscattering.de/chess/uci/>.

pub mod commands;
pub mod endpoint;
pub mod options;
