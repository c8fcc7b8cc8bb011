mod aggregate_tests;
mod harness_tests;
