mod common;

mod build_tests;
mod develop_tests;
mod fmt_tests;
mod lock_tests;
