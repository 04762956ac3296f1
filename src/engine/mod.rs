mod config;
#[allow(clippy::module_inception)]
mod engine;
mod latex;
mod progress;
mod report;

pub use config::{EngineConfig, ReportFormat};
pub use engine::Engine;
pub use latex::write_hall_of_fame_latex;
pub use progress::{ChannelProgress, NullProgress, ProgressMessage, ProgressSink};
pub use report::{
    format_generation, format_hall_of_fame, write_json_final, write_text_final, AttemptResult,
    FinalReport, GenerationReport, MAX_HALL_OF_FAME,
};
