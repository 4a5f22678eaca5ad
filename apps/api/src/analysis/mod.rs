// Resume analysis: document extraction, prompt synthesis, model evaluation
// and response normalization. Model calls go through llm_client only.

pub mod error;
pub mod extractor;
pub mod handlers;
pub mod models;
pub mod normalizer;
pub mod pipeline;
pub mod prompts;
pub mod skills;

pub use error::PipelineError;
pub use extractor::RawDocument;
pub use models::AnalysisResult;
pub use pipeline::AnalysisPipeline;
