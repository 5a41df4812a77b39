use serde_derive::Deserialize;
use serde_derive::Serialize;

/// One question/answer pair. Only ever built from a successful answer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub question: String,
    pub answer: String,
}

impl ChatTurn {
    pub fn new(question: &str, answer: &str) -> ChatTurn {
        return ChatTurn {
            question: question.to_string(),
            answer: answer.to_string(),
        };
    }
}
