// SPDX-License-Identifier: CEPL-1.0
#![deny(unsafe_op_in_unsafe_fn)]

mod pump;

pub use pump::{PumpEvent, PumpKey, PumpState};
pub use winit;
