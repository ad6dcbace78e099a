pub mod rates_function;

pub use rates_function::RatesFunctionProvider;
