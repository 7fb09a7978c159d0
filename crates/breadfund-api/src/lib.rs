pub mod auth;
pub mod campaigns;
pub mod donations;
pub mod error;
pub mod extract;
pub mod feed_posts;
pub mod forms;
pub mod guards;
pub mod middleware;
pub mod presentation;
pub mod qr;
pub mod reactions;
pub mod routes;
