// SchoolAdmin-app lib.rs
//
// Console front end for the SchoolAdmin back office.
// The binary parses arguments with `cli` and runs them through `commands`.

// Public modules
pub mod cli;
pub mod commands;
