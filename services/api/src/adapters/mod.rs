pub mod db;
pub mod narrative_llm;

pub use db::DbAdapter;
pub use narrative_llm::OpenAiNarrativeAdapter;
