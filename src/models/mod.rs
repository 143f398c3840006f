pub mod document;
pub mod question;

pub use document::{Document, FileType, UploadReceipt};
pub use question::{ChatMessage, ChatRole, Evaluation, QuestionRecord};
