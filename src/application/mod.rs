pub mod download_coordinator;
pub mod progress;
pub mod request_builder;
pub mod resolver;
pub mod sink;
pub mod validator;

pub use download_coordinator::DownloadCoordinator;
pub use progress::ProgressConfig;
pub use sink::{ArtifactSink, DialogSink, DirectorySink};
