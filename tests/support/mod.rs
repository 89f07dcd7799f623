#![allow(dead_code)]

pub mod fixtures;
pub mod handsign_env;
