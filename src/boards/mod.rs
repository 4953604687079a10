//! Board descriptions.
//!
//! Each board is a set of constants plus a [`BoardConfig`](crate::board::BoardConfig)
//! ready to hand to the engines at boot.
//!
//! # Supported Boards
//!
//! - Generic STM32F405 flight controller (gyro, OSD, flash, four UARTs)

pub mod generic_f405;
