// Built-in and example plugins for Musubi

pub mod banner_plugin;
pub mod stats_plugin;

pub use banner_plugin::BannerPlugin;
pub use stats_plugin::StatsPlugin;
