pub mod bracket;
pub mod cascade;
pub mod leaderboard;
pub mod qualification;
pub mod rescoring;
pub mod scoring;
pub mod selection;
pub mod standings;

pub use bracket::*;
pub use rescoring::*;
pub use scoring::*;
pub use selection::*;
