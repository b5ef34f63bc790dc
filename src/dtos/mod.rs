pub mod jobdtos;
pub mod messagedtos;
pub mod userdtos;
