//! Item CRUD and batch commits on `ItemDb`.

mod read;
mod write;
