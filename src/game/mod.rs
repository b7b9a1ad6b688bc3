pub mod score;
pub mod state;
