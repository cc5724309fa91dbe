pub mod evidence;
pub mod extractor;
pub mod fact_checker;
pub mod inference;
pub mod ingest;
pub mod orchestrator;
pub mod propaganda;
pub mod prompts;

pub use evidence::EvidenceSearcher;
pub use extractor::ClaimExtractor;
pub use fact_checker::FactChecker;
pub use ingest::FeedIngestor;
pub use orchestrator::Orchestrator;
pub use propaganda::PropagandaDetector;
