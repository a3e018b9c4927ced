mod common;
mod pipeline_tests;
mod result_tests;
mod update_tests;
