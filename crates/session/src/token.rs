use std::fmt;
use std::str::FromStr;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const ADJECTIVES: &[&str] = &[
    "Happy", "Sunny", "Clever", "Brave", "Calm", "Eager", "Gentle", "Jolly", "Kind", "Lively",
    "Lucky", "Merry", "Nimble", "Proud", "Quick", "Quiet", "Swift", "Witty", "Bright", "Cosy",
    "Daring", "Fancy", "Mighty", "Zesty",
];

const ANIMALS: &[&str] = &[
    "Otter", "Panda", "Tiger", "Falcon", "Koala", "Dolphin", "Fox", "Lynx", "Owl", "Penguin",
    "Rabbit", "Seal", "Turtle", "Whale", "Zebra", "Badger", "Beaver", "Camel", "Gecko", "Heron",
    "Llama", "Moose", "Parrot", "Yak",
];

const MAX_TOKEN_LEN: usize = 64;

/// Human-readable session identifier, e.g. `SunnyOtter42`.
///
/// Tokens name the per-session upload folder, so only ASCII letters and
/// digits are accepted.
/// 工作階段代碼，同時作為上傳資料夾名稱，因此僅接受英數字元。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionToken(String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidSessionToken {
    #[error("session token is empty")]
    Empty,
    #[error("session token is longer than {MAX_TOKEN_LEN} characters")]
    TooLong,
    #[error("session token '{0}' may only contain ASCII letters and digits")]
    InvalidCharacters(String),
}

impl SessionToken {
    /// Generates a fresh token from the thread-local RNG.
    pub fn generate() -> Self {
        Self::generate_with(&mut rand::thread_rng())
    }

    /// Adjective + Animal + a two-digit number in `10..=99`.
    pub fn generate_with<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let adjective = ADJECTIVES.choose(rng).copied().unwrap_or("Happy");
        let animal = ANIMALS.choose(rng).copied().unwrap_or("Otter");
        let number: u8 = rng.gen_range(10..=99);
        Self(format!("{adjective}{animal}{number}"))
    }

    pub fn parse(value: &str) -> Result<Self, InvalidSessionToken> {
        let value = value.trim();
        if value.is_empty() {
            return Err(InvalidSessionToken::Empty);
        }
        if value.len() > MAX_TOKEN_LEN {
            return Err(InvalidSessionToken::TooLong);
        }
        if !value.chars().all(|ch| ch.is_ascii_alphanumeric()) {
            return Err(InvalidSessionToken::InvalidCharacters(value.to_string()));
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for SessionToken {
    type Err = InvalidSessionToken;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for SessionToken {
    type Error = InvalidSessionToken;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SessionToken> for String {
    fn from(token: SessionToken) -> Self {
        token.0
    }
}
