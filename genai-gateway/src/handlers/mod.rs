pub mod generate;
pub mod health;
pub mod metrics;

pub use self::generate::generate;
pub use self::health::health_check;
pub use self::metrics::metrics;
