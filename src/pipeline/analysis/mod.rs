//! Retrieval-augmented document analysis with company-consistency checking.

pub mod chunker;
pub mod consistency;
pub mod openai;
pub mod orchestrator;
pub mod prompt;
pub mod retrieval;
pub mod types;

pub use consistency::{parse_company_verdict, CompanyMatch, ConsistencyVerdict};
pub use openai::{OpenAiEmbedder, OpenAiGenerator};
pub use orchestrator::AnalysisPipeline;
pub use types::{
    AnalysisMetadata, AnalysisRequest, AnalysisResult, EmbeddingProvider, FormContent,
    TableContent, TextGenerator,
};
