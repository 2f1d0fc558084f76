pub mod chart;
pub mod coin;
pub mod favorite;
pub mod preferences;
pub mod settings;
