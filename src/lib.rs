//! pack-narrator: narration audio for story packs.
//!
//! This crate turns text into audio files through interchangeable speech
//! backends (system voice, pico2wave, gtts-cli, coqui, OpenAI, Gemini),
//! normalises the result to a canonical WAV and caches it by content. External
//! tools are located and run natively or, on Windows, through WSL.

pub mod audio;
pub mod cache;
pub mod cli;
pub mod command;
pub mod config;
pub mod dispatch;
pub mod provider;
