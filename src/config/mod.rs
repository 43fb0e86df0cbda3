pub mod settings;

pub use settings::SensorConfig;
