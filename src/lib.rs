pub mod cli;
pub mod commands;
pub mod config;
pub mod driver;
pub mod error;
pub mod fixture;
pub mod mount;
pub mod oracle;
pub mod report;
pub mod scenarios;
pub mod testbed;

pub use config::get_config_path;
pub use config::load_config;
pub use config::save_config;
pub use config::Config;
pub use config::RunOptions;

pub use error::{MirrorcheckError, Result};

pub use driver::DescriptorPair;
pub use report::{RunReport, ScenarioReport};
pub use scenarios::Scenario;
pub use testbed::TestBed;
