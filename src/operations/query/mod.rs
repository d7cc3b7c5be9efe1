mod connected;
mod length;

pub use connected::{ConnectedSet, FindConnected};
pub use length::SplineLength;
