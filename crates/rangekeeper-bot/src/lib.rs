pub mod app;
pub mod chain_ops;
pub mod config;
pub mod constants;
pub mod context;
pub mod error;

pub use app::Application;
pub use chain_ops::RealChainOps;
pub use config::AppConfig;
pub use constants::{ContractAddresses, Network};
pub use error::{AppError, AppResult};
