pub mod javbus;
