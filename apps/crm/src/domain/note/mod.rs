// Note domain module

#![allow(clippy::module_inception)]

pub mod note;

pub use note::Note;
