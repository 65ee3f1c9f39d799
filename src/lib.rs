pub mod classify;
pub mod config;
pub mod core;
pub mod dom;
pub mod export;
pub mod fusion;
pub mod pipeline;
pub mod resolve;

pub use config::Settings;
pub use core::model::{AdRegion, FusedDecision, PageReport, ResolutionReport};
pub use dom::{PageSnapshot, RenderedTree};
pub use resolve::{Resolver, ResolverConfig};
