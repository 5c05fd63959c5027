//! Config namespace: runtime settings loading.

mod settings;

pub use settings::{
    ParallelSettings, RuntimeSettings, load_runtime_settings, load_settings_layers,
    set_config_home_override,
};
