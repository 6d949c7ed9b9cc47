use crate::core::error::UnicodeError;
use crate::utils::hex::{parse_code_point, rgb_to_hex};

/// A pending unicode buffer is only resolved once it holds more than this many characters
pub const UNICODE_MIN_DIGITS: usize = 3;

pub const DEFAULT_CHANNEL: i64 = 255;

/// One visitor identity, keyed by the address it was last seen from
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub ip_address: String,
    /// Empty until finished; only finished users are listed
    pub username: String,
    pub username_unfinished: String,
    /// Hex digits of a code point still being typed
    pub unicode_string: String,
    /// `#rrggbb`, derived from the channels on demand
    pub color: String,
    pub color_red: i64,
    pub color_green: i64,
    pub color_blue: i64,
    /// Unix millis
    pub registration_time: i64,
    /// Unix millis
    pub last_seen: i64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Channel {
    Red,
    Green,
    Blue,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Red => "red",
            Channel::Green => "green",
            Channel::Blue => "blue",
        }
    }
}

impl User {
    /// A fresh, anonymous identity. `id` is assigned by the store on insert.
    pub fn anonymous(ip_address: impl Into<String>, now: i64) -> Self {
        Self {
            id: 0,
            ip_address: ip_address.into(),
            username: String::new(),
            username_unfinished: String::new(),
            unicode_string: String::new(),
            color: rgb_to_hex(DEFAULT_CHANNEL, DEFAULT_CHANNEL, DEFAULT_CHANNEL),
            color_red: DEFAULT_CHANNEL,
            color_green: DEFAULT_CHANNEL,
            color_blue: DEFAULT_CHANNEL,
            registration_time: now,
            last_seen: now,
        }
    }

    pub fn is_finished(&self) -> bool {
        !self.username.is_empty()
    }

    pub fn touch(&mut self, now: i64) {
        self.last_seen = now;
    }

    pub fn set_channel(&mut self, channel: Channel, value: i64) {
        match channel {
            Channel::Red => self.color_red = value,
            Channel::Green => self.color_green = value,
            Channel::Blue => self.color_blue = value,
        }
    }

    pub fn refresh_color(&mut self) {
        self.color = rgb_to_hex(self.color_red, self.color_green, self.color_blue);
    }

    /// Resolve the pending unicode buffer into the unfinished name.
    ///
    /// Returns `Ok(None)` when the buffer is still too short. On error both
    /// staging buffers are left untouched.
    pub fn flush_unicode(&mut self) -> Result<Option<char>, UnicodeError> {
        if self.unicode_string.chars().count() <= UNICODE_MIN_DIGITS {
            return Ok(None);
        }

        let ch = parse_code_point(&self.unicode_string)?;
        self.username_unfinished.push(ch);
        self.unicode_string.clear();

        Ok(Some(ch))
    }

    /// Replace the unicode buffer with a new seed. Does not flush.
    pub fn start_unicode(&mut self, seed: &str) {
        self.unicode_string = seed.to_string();
    }

    pub fn continue_unicode(&mut self, digits: &str) {
        self.unicode_string.push_str(digits);
    }

    pub fn push_letter(&mut self, letter: &str) {
        self.username_unfinished.push_str(letter);
    }

    /// Commit the unfinished name. Does not flush.
    pub fn finish(&mut self, now: i64) {
        self.username = std::mem::take(&mut self.username_unfinished);
        self.last_seen = now;
    }
}
