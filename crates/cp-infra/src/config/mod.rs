mod loader;

pub use loader::{default_config_path, load_config, load_config_or_default};
