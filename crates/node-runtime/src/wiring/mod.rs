//! # Node Wiring
//!
//! Connects the node to the network and to the round clock.
//!
//! ```text
//!   peers ──topic──→ interceptors ──→ data pools
//!                                        │
//!   round clock ──→ round driver ────────┘
//!                        │
//!                        └──→ broadcast queue ──→ peers
//! ```

pub mod interceptors;
pub mod round_driver;

pub use interceptors::{HeaderInterceptor, InterceptorWiring, MiniBlockInterceptor, Routed, TxInterceptor};
pub use round_driver::{run_round_loop, RoundDriver};
