//! MP3 synthesis through the public Google Translate TTS endpoint

use std::time::Duration;
use truckgate_types::AnnouncementError;

use crate::SpeechSynthesizer;

pub const DEFAULT_TTS_URL: &str = "https://translate.google.com/translate_tts";

/// The endpoint refuses longer `q` values.
const MAX_CHUNK_CHARS: usize = 100;

/// Synthesizes speech one chunk at a time and joins the MP3 segments.
pub struct GoogleTtsSynthesizer {
    endpoint: String,
    client: reqwest::blocking::Client,
}

impl GoogleTtsSynthesizer {
    pub fn new(endpoint: &str, timeout_secs: u64) -> Result<Self, AnnouncementError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| AnnouncementError::Synthesis(e.to_string()))?;

        Ok(Self {
            endpoint: endpoint.to_string(),
            client,
        })
    }

    fn fetch_chunk(
        &self,
        chunk: &str,
        lang: &str,
        idx: usize,
        total: usize,
    ) -> Result<Vec<u8>, AnnouncementError> {
        let idx = idx.to_string();
        let total = total.to_string();
        let textlen = chunk.chars().count().to_string();

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("ie", "UTF-8"),
                ("q", chunk),
                ("tl", lang),
                ("client", "tw-ob"),
                ("idx", idx.as_str()),
                ("total", total.as_str()),
                ("textlen", textlen.as_str()),
            ])
            .send()
            .map_err(|e| AnnouncementError::Synthesis(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AnnouncementError::Synthesis(format!(
                "TTS endpoint returned HTTP {}",
                status.as_u16()
            )));
        }

        let bytes = response
            .bytes()
            .map_err(|e| AnnouncementError::Synthesis(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

impl SpeechSynthesizer for GoogleTtsSynthesizer {
    fn synthesize(&self, text: &str, lang: &str) -> Result<Vec<u8>, AnnouncementError> {
        let chunks = split_text(text, MAX_CHUNK_CHARS);
        if chunks.is_empty() {
            return Err(AnnouncementError::Synthesis("nothing to synthesize".to_string()));
        }

        let mut audio = Vec::new();
        for (idx, chunk) in chunks.iter().enumerate() {
            audio.extend(self.fetch_chunk(chunk, lang, idx, chunks.len())?);
        }

        if audio.is_empty() {
            return Err(AnnouncementError::Synthesis("TTS endpoint returned no audio".to_string()));
        }
        Ok(audio)
    }
}

/// Pack whitespace-separated words into chunks of at most `max_chars`
/// characters. A single word longer than the limit is cut.
pub fn split_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();

        while word.len() > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let rest = word.split_off(max_chars);
            chunks.push(word.into_iter().collect());
            word = rest;
        }

        let needed = if current.is_empty() { word.len() } else { current_len + 1 + word.len() };
        if needed > max_chars {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if !current.is_empty() {
            current.push(' ');
            current_len += 1;
        }
        current_len += word.len();
        current.extend(word);
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_is_one_chunk() {
        assert_eq!(split_text("Truck number AB12CD3456", 100), vec!["Truck number AB12CD3456"]);
    }

    #[test]
    fn test_chunks_respect_limit_and_keep_words() {
        let text = "Truck number AB12CD3456 please come inside the gate. \
                    Truck number AB12CD3456 कृपया गेट के अंदर आइए।";
        let chunks = split_text(text, 40);

        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.chars().count() <= 40));
        assert_eq!(chunks.join(" "), text.split_whitespace().collect::<Vec<_>>().join(" "));
    }

    #[test]
    fn test_long_word_is_cut() {
        let chunks = split_text("abcdefghij xy", 4);
        assert_eq!(chunks, vec!["abcd", "efgh", "ij", "xy"]);
    }

    #[test]
    fn test_blank_text_has_no_chunks() {
        assert!(split_text("  \n ", 100).is_empty());
    }
}
