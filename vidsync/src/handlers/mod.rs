//! HTTP handlers

pub mod token;
pub mod videos;

pub use token::{issue_token, TokenResponse};
pub use videos::{
    delete_video, fetch_video, get_video, list_videos, DeleteResponse, FetchResponse,
};
