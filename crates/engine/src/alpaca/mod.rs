pub mod rest;

pub use rest::AlpacaClient;
