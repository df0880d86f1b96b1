//! Webcast bridge adapter - the production upstream live source.

mod frames;
mod source;

pub use source::WebcastSource;
