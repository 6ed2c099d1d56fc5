//! Core of the frameshop project: the generic repository engine and the
//! shop domain model. Contains no I/O; store backends live in the
//! `frameshop` crate.

pub mod shop;
pub mod storage;
