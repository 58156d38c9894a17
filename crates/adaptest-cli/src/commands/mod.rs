pub mod grade;
pub mod init;
pub mod retest;
pub mod validate;
