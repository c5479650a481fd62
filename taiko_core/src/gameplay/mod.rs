pub mod gauge;
pub mod judge;
pub mod session;
pub mod timing;
