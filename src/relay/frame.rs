//! Wire encodings for a relay body: text fragments first, then at most one
//! audio section.
//!
//! `Sentinel` is what existing browser clients parse. Text that happens to
//! contain a marker literal will confuse those clients; nothing here escapes
//! it. `LengthPrefixed` frames every chunk as `tag (1 byte) | len (u32 BE) |
//! payload` and carries raw audio bytes, so it has no such collision.

use base64::{ engine::general_purpose::STANDARD as BASE64, Engine as _ };
use bytes::{ BufMut, Bytes, BytesMut };
use serde::Deserialize;
use thiserror::Error;

pub const AUDIO_START: &str = "\n<AUDIO_START>";
pub const AUDIO_END: &str = "\n<AUDIO_END>";

pub const TEXT_TAG: u8 = b'T';
pub const AUDIO_TAG: u8 = b'A';
const HEADER_LEN: usize = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Framing {
    #[default]
    Sentinel,
    LengthPrefixed,
}

impl Framing {
    pub fn content_type(&self) -> &'static str {
        match self {
            Framing::Sentinel => "text/event-stream",
            Framing::LengthPrefixed => "application/octet-stream",
        }
    }

    pub fn text(&self, fragment: &str) -> Bytes {
        match self {
            Framing::Sentinel => Bytes::copy_from_slice(fragment.as_bytes()),
            Framing::LengthPrefixed => encode_frame(TEXT_TAG, fragment.as_bytes()),
        }
    }

    /// Chunks that make up the audio section, in write order.
    pub fn audio(&self, audio: &[u8]) -> Vec<Bytes> {
        match self {
            Framing::Sentinel =>
                vec![
                    Bytes::from_static(AUDIO_START.as_bytes()),
                    Bytes::from(BASE64.encode(audio)),
                    Bytes::from_static(AUDIO_END.as_bytes())
                ],
            Framing::LengthPrefixed => vec![encode_frame(AUDIO_TAG, audio)],
        }
    }
}

fn encode_frame(tag: u8, payload: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(HEADER_LEN + payload.len());
    buf.put_u8(tag);
    buf.put_u32(payload.len() as u32);
    buf.put_slice(payload);
    buf.freeze()
}

/// Splits a sentinel-framed body into its text and base64 audio parts.
/// Returns `None` for the audio when the body has no audio section.
pub fn split_sentinel_body(body: &str) -> (&str, Option<&str>) {
    match body.split_once(AUDIO_START) {
        Some((text, rest)) => {
            let audio = rest.split_once(AUDIO_END).map_or(rest, |(audio, _)| audio);
            (text, Some(audio))
        }
        None => (body, None),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Audio(Bytes),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("unknown frame tag 0x{0:02x}")]
    UnknownTag(u8),
    #[error("text frame is not valid UTF-8")]
    InvalidText,
    #[error("text frame after audio frame")]
    TextAfterAudio,
}

/// Incremental decoder for `LengthPrefixed` bodies. Feed it chunks as they
/// arrive; partial frames are buffered.
#[derive(Default)]
pub struct FrameDecoder {
    buf: BytesMut,
    seen_audio: bool,
}

impl FrameDecoder {
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<Frame>, FrameError> {
        self.buf.extend_from_slice(chunk);
        let mut frames = Vec::new();

        while self.buf.len() >= HEADER_LEN {
            let tag = self.buf[0];
            let len = u32::from_be_bytes([self.buf[1], self.buf[2], self.buf[3], self.buf[4]]) as usize;
            if self.buf.len() < HEADER_LEN + len {
                break;
            }
            let _ = self.buf.split_to(HEADER_LEN);
            let payload = self.buf.split_to(len).freeze();

            match tag {
                TEXT_TAG => {
                    if self.seen_audio {
                        return Err(FrameError::TextAfterAudio);
                    }
                    let text = String::from_utf8(payload.to_vec()).map_err(|_| FrameError::InvalidText)?;
                    frames.push(Frame::Text(text));
                }
                AUDIO_TAG => {
                    self.seen_audio = true;
                    frames.push(Frame::Audio(payload));
                }
                other => {
                    return Err(FrameError::UnknownTag(other));
                }
            }
        }

        Ok(frames)
    }

    /// True when no partial frame is waiting for more bytes.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn framing_defaults_to_sentinel() {
        #[derive(Deserialize)]
        struct Holder {
            #[serde(default)]
            framing: Framing,
        }
        let h: Holder = serde_json::from_str("{}").unwrap();
        assert_eq!(h.framing, Framing::Sentinel);
        let h: Holder = serde_json::from_str(r#"{"framing":"length_prefixed"}"#).unwrap();
        assert_eq!(h.framing, Framing::LengthPrefixed);
    }

    #[test]
    fn sentinel_audio_section_layout() {
        let chunks = Framing::Sentinel.audio(b"abc");
        let joined: Vec<u8> = chunks.iter().flat_map(|c| c.to_vec()).collect();
        assert_eq!(String::from_utf8(joined).unwrap(), "\n<AUDIO_START>YWJj\n<AUDIO_END>");
    }

    #[test]
    fn split_sentinel_body_handles_missing_end() {
        assert_eq!(split_sentinel_body("hello"), ("hello", None));
        assert_eq!(split_sentinel_body("hi\n<AUDIO_START>QQ==\n<AUDIO_END>"), ("hi", Some("QQ==")));
        assert_eq!(split_sentinel_body("hi\n<AUDIO_START>QQ"), ("hi", Some("QQ")));
    }

    #[test]
    fn decoder_reassembles_split_frames() {
        let mut wire = Vec::new();
        wire.extend_from_slice(&Framing::LengthPrefixed.text("Hel"));
        wire.extend_from_slice(&Framing::LengthPrefixed.text("lo"));
        for chunk in Framing::LengthPrefixed.audio(&[0, 1, 2, 255]) {
            wire.extend_from_slice(&chunk);
        }

        let mut decoder = FrameDecoder::default();
        let mut frames = Vec::new();
        for byte_chunk in wire.chunks(3) {
            frames.extend(decoder.push(byte_chunk).unwrap());
        }

        assert!(decoder.is_empty());
        assert_eq!(
            frames,
            vec![
                Frame::Text("Hel".into()),
                Frame::Text("lo".into()),
                Frame::Audio(Bytes::from_static(&[0, 1, 2, 255]))
            ]
        );
    }

    #[test]
    fn decoder_rejects_text_after_audio_and_unknown_tags() {
        let mut decoder = FrameDecoder::default();
        decoder.push(&Framing::LengthPrefixed.audio(b"x")[0]).unwrap();
        assert_eq!(decoder.push(&Framing::LengthPrefixed.text("late")), Err(FrameError::TextAfterAudio));

        let mut decoder = FrameDecoder::default();
        assert_eq!(decoder.push(&[b'Z', 0, 0, 0, 0]), Err(FrameError::UnknownTag(b'Z')));
    }

    #[test]
    fn text_containing_marker_is_safe_when_length_prefixed() {
        let frame = Framing::LengthPrefixed.text(AUDIO_START);
        let frames = FrameDecoder::default().push(&frame).unwrap();
        assert_eq!(frames, vec![Frame::Text(AUDIO_START.to_string())]);
    }
}
