//! Page driver implementations.

pub mod browserless;

pub use browserless::BrowserlessDriver;
