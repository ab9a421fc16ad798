pub mod aggregate;
pub mod dataset;
pub mod duration;
pub mod export;
pub mod filter;
pub mod score;
pub mod source;
pub mod state;
pub mod view;
