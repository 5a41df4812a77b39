use std::fmt;

use serde_derive::Deserialize;
use serde_derive::Serialize;

use crate::configuration::Config;
use crate::configuration::ConfigKey;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Author {
    User,
    UploadiT,
    Bot,
}

impl fmt::Display for Author {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Author::User => return write!(f, "{}", Config::get(ConfigKey::Username)),
            Author::UploadiT => return write!(f, "UploadiT"),
            Author::Bot => return write!(f, "Bot"),
        }
    }
}
