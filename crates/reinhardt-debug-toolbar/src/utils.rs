//! Helpers shared by panels, views and the response rewriter

pub mod gzip;
pub mod html;
pub mod sql_normalization;
