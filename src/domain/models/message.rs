#[cfg(test)]
#[path = "message_test.rs"]
mod tests;

use serde_derive::Deserialize;
use serde_derive::Serialize;

use super::Author;
use super::ChatTurn;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageType {
    Normal,
    Error,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    pub author: Author,
    pub text: String,
    mtype: MessageType,
}

impl Message {
    pub fn new(author: Author, text: &str) -> Message {
        return Message {
            author,
            text: text.to_string().replace('\t', "  "),
            mtype: MessageType::Normal,
        };
    }

    pub fn new_with_type(author: Author, mtype: MessageType, text: &str) -> Message {
        return Message {
            author,
            text: text.to_string().replace('\t', "  "),
            mtype,
        };
    }

    /// The pair of bubbles a completed turn is displayed as.
    pub fn from_turn(turn: &ChatTurn) -> [Message; 2] {
        return [
            Message::new(Author::User, &turn.question),
            Message::new(Author::Bot, &turn.answer),
        ];
    }

    pub fn message_type(&self) -> MessageType {
        return self.mtype;
    }
}
