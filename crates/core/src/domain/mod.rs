pub mod contract;
pub mod player;
pub mod recommendation;
