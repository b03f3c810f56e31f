#![allow(dead_code)]

pub mod fixture;
pub mod scripted_engine;
