//! # Mini-Beat Grid Module
//!
//! Turns a sparse beat-time array into a denser, evenly-subdivided mini-beat
//! grid by extrapolating linear interpolation over the beat index, clipped to
//! the audio duration. Mini-beats raise the temporal resolution of the
//! rhythmic grid handed to transcription.

pub mod interpolator;

pub use interpolator::subdivide;
