#![allow(dead_code)]

pub mod app;

pub use app::{TestApp, make_test_app};
