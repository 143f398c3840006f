pub mod session;

pub use session::{
    AnswerOutcome, AnswerStep, AnswerTicket, AskOutcome, AskTicket, QuizOutcome, QuizTicket,
    StudySession,
};
