// Gavel: Review moderation pipeline
//
// This is the library root. Each module corresponds to a stage or a
// collaborator of the review pipeline.

pub mod blob;
pub mod config;
pub mod db;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod profanity;
pub mod review;
pub mod sentiment;
pub mod status;
pub mod text;
pub mod tracker;
