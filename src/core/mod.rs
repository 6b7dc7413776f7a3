// Decision layer: contracts, converters, format policy, and buffer rental.
pub mod buffer_pool;
pub mod catalog;
pub mod contract;
pub mod converter;
pub mod decimal;
pub mod error;
pub mod format;
pub mod leaf;
pub mod member;
pub mod node;
pub mod type_key;
