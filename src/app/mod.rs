pub mod dispatch;
pub mod respond;
