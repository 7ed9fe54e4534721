mod answer;
mod bookmark;
mod ids;
mod question;
mod question_bank;
mod score;
mod settings;

pub use ids::{ParseIdError, QuestionId};

pub use answer::UserAnswerRecord;
pub use bookmark::BookmarkedQuestion;
pub use question::{Difficulty, OptionKey, Question, QuestionDraft, QuestionError, MIN_OPTIONS};
pub use question_bank::{QuestionBank, QuestionBankError};
pub use score::{Score, ScoreError};
pub use settings::{QuizSettings, SettingsError};
