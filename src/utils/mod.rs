pub mod client_ip;
pub mod hex;
pub mod time;
