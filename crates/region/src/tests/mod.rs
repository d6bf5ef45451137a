mod helpers;
mod split_tests;
mod store_tests;
