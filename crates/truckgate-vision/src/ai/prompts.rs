//! Instructions sent to the vision service

/// Asks for the plate text only; the recognizer tolerates extra words.
pub const PLATE_INSTRUCTION: &str = "Extract only the vehicle number from this image.";

/// Upper bound on completion length; a plate needs only a few tokens.
pub const PLATE_MAX_TOKENS: u32 = 50;
