pub mod answer_cache;
pub mod document_service;
pub mod gateway;
pub mod page_text;
pub mod question_service;
pub mod similarity;

pub use answer_cache::AnswerCache;
pub use document_service::DocumentService;
pub use gateway::ModelGateway;
pub use page_text::PageSource;
pub use question_service::QuestionService;
