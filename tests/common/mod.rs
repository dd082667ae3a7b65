#![allow(dead_code)]

mod fakes;

pub use fakes::*;
