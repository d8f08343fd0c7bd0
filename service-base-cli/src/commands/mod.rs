pub mod clear;
pub mod count;
pub mod delete;
pub mod init;
pub mod list;
pub mod navigations;
pub mod page;
pub mod rename;
pub mod seed;
pub mod show;
