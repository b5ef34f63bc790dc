pub mod db;
pub mod jobdb;
pub mod messagedb;
pub mod paymentdb;
pub mod userdb;
