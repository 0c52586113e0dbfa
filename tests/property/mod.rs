//! Property-based tests for translation and codec guarantees

mod codec_roundtrip;
mod status_groups;
