//! Grade exchange module.
//!
//! Teachers download a spreadsheet template pre-filled with their class
//! roster and curriculum objectives, enter scores offline, and upload it
//! back. The import validates every cell independently and upserts the
//! valid ones, so a single bad value never blocks the rest of the class.
//!
//! Pipeline: [`curriculum`] -> [`schema`] -> [`template`] on export;
//! [`parser`] -> [`cell`] -> [`store`] -> [`outcome`] on import.

pub mod cell;
pub mod controller;
pub mod curriculum;
pub mod filename;
pub mod model;
pub mod outcome;
pub mod parser;
pub mod router;
pub mod schema;
pub mod service;
pub mod store;
pub mod template;
