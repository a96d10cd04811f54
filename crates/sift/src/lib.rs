//! sift: search query inspection.
//!
//! sift shows how a search query string is understood before it reaches the search engine:
//! the cleaned query, the namespace header, keyword features, the boolean clause tree,
//! recovered syntax errors and the query classes assigned to the result. Parser behavior is
//! configured through `.sift.toml` files discovered from the working directory.

#![warn(missing_docs)]

pub mod cli;
