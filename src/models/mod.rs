pub mod jobmodel;
pub mod messagemodel;
pub mod usermodel;
