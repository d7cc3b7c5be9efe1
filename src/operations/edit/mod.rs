mod branch;
mod connect;

pub use branch::CreateBranch;
pub use connect::ConnectPoints;
